//! Worker declarations
//!
//! Workers are the consumer daemons supervisord keeps alive. They are declared
//! once and never change for the lifetime of a controller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SupervisorError};

/// Characters supervisord gives meaning to in program names and sections
const FORBIDDEN_CHARS: &[char] = &['/', ']', '%', ':'];

/// How a worker consumes its queue(s)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    /// Consumes a single queue
    Single,
    /// Consumes several queues in one process
    Multiple,
}

/// A declared worker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerDescriptor {
    /// Worker name (unique identifier)
    pub name: String,
    /// Worker kind
    pub kind: WorkerKind,
}

/// Validated set of workers, keyed by name
///
/// Iteration yields single workers before multiple workers, each group in
/// name order, regardless of declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerSet {
    workers: BTreeMap<String, WorkerKind>,
}

impl WorkerSet {
    /// Create an empty worker set
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a worker set from single and multiple worker names
    pub fn from_names<S, M>(singles: S, multiples: M) -> Result<Self>
    where
        S: IntoIterator,
        S::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        let mut set = Self::new();
        for name in singles {
            set.insert(name, WorkerKind::Single)?;
        }
        for name in multiples {
            set.insert(name, WorkerKind::Multiple)?;
        }
        Ok(set)
    }

    /// Declare a worker
    ///
    /// Re-declaring a name with the same kind is accepted; declaring it with
    /// a different kind is rejected.
    pub fn insert(&mut self, name: impl Into<String>, kind: WorkerKind) -> Result<()> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(SupervisorError::InvalidWorker(
                "worker name must not be empty".to_string(),
            ));
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_whitespace() || FORBIDDEN_CHARS.contains(c))
        {
            return Err(SupervisorError::InvalidWorker(format!(
                "worker name {:?} contains {:?}",
                name, c
            )));
        }
        match self.workers.get(&name) {
            Some(existing) if *existing != kind => Err(SupervisorError::InvalidWorker(format!(
                "worker {:?} declared as both {:?} and {:?}",
                name, existing, kind
            ))),
            _ => {
                self.workers.insert(name, kind);
                Ok(())
            }
        }
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn kind_of(&self, name: &str) -> Option<WorkerKind> {
        self.workers.get(name).copied()
    }

    /// Names of workers of the given kind, in name order
    pub fn names(&self, kind: WorkerKind) -> impl Iterator<Item = &str> {
        self.workers
            .iter()
            .filter(move |(_, k)| **k == kind)
            .map(|(name, _)| name.as_str())
    }

    /// All workers, singles first, then multiples
    pub fn descriptors(&self) -> Vec<WorkerDescriptor> {
        [WorkerKind::Single, WorkerKind::Multiple]
            .into_iter()
            .flat_map(|kind| {
                self.names(kind).map(move |name| WorkerDescriptor {
                    name: name.to_string(),
                    kind,
                })
            })
            .collect()
    }
}
