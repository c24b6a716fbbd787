//! Supervisor driver
//!
//! The driver owns the supervisor daemon's command-line footprint: starting it
//! and asking it to re-read and apply the generated program configurations.

pub mod supervisord;

pub use supervisord::SupervisordDriver;

use async_trait::async_trait;

use crate::error::Result;

/// Entry points of the external supervisor daemon
#[async_trait]
pub trait SupervisorDriver: Send + Sync {
    /// Start the supervisor daemon
    async fn run(&self) -> Result<()>;

    /// Make the running daemon re-read generated configurations and reconcile
    /// its child processes
    async fn reload_and_update(&self) -> Result<()>;
}
