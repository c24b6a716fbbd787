//! Program configuration rendering
//!
//! Turns [`ProgramFields`] into a persisted supervisord program section.

use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::{Result, SupervisorError};
use crate::generator::store::{ConfigStore, CONFIG_EXTENSION};
use crate::generator::ProgramFields;

/// Template id understood by [`ConfProgramRenderer`]
pub const PROGRAM_TEMPLATE_ID: &str = "program.conf";

/// Persists one program configuration per worker
pub trait ProgramRenderer: Send + Sync {
    /// Render `fields` with the template `template_id` and persist it under `name`
    fn generate_program_config(
        &self,
        name: &str,
        fields: &ProgramFields,
        template_id: &str,
    ) -> Result<()>;
}

/// Renders supervisord `[program:x]` sections into a [`ConfigStore`]
pub struct ConfProgramRenderer {
    store: Arc<dyn ConfigStore>,
}

impl ConfProgramRenderer {
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self { store }
    }

    /// File name a program configuration is stored under
    pub fn file_name(name: &str) -> String {
        format!("{}.{}", name, CONFIG_EXTENSION)
    }

    /// Render the program section for `fields`
    pub fn render(fields: &ProgramFields) -> String {
        let logs_dir = fields.logs_dir.display();
        let mut out = String::new();

        // Writing into a String cannot fail.
        let _ = writeln!(out, "[program:{}]", fields.name);
        let _ = writeln!(out, "command={}", fields.command);
        let _ = writeln!(out, "directory={}", fields.kernel_root_dir.display());
        let _ = writeln!(out, "process_name=%(program_name)s%(process_num)02d");
        let _ = writeln!(out, "numprocs={}", fields.numprocs);
        let _ = writeln!(out, "autostart=true");
        for (key, value) in &fields.options {
            let _ = writeln!(out, "{}={}", key, value);
        }
        let _ = writeln!(out, "stdout_logfile={}/{}.log", logs_dir, fields.name);
        let _ = writeln!(out, "stderr_logfile={}/{}.error.log", logs_dir, fields.name);
        out
    }
}

impl ProgramRenderer for ConfProgramRenderer {
    fn generate_program_config(
        &self,
        name: &str,
        fields: &ProgramFields,
        template_id: &str,
    ) -> Result<()> {
        if template_id != PROGRAM_TEMPLATE_ID {
            return Err(SupervisorError::Render(format!(
                "unknown template {:?}",
                template_id
            )));
        }
        self.store.write(&Self::file_name(name), &Self::render(fields))
    }
}
