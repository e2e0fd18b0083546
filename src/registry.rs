//! Named set of [`ManagedProcess`]es with uniqueness, lookup, and stable
//! insertion-order iteration. All mutation happens on the dispatcher task;
//! the sampler only reads the `log_cpu`/`log_mem` membership.

use std::collections::{HashMap, HashSet};

use crate::error::DaemonError;
use crate::process::ManagedProcess;

#[derive(Default)]
pub struct Registry {
    order: Vec<String>,
    processes: HashMap<String, ManagedProcess>,
    log_cpu_set: HashSet<String>,
    log_mem_set: HashSet<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects with [`DaemonError::Duplicate`] if `process`'s name is
    /// already registered; otherwise appends it and updates the log subsets.
    pub fn add(&mut self, process: ManagedProcess) -> Result<(), DaemonError> {
        let name = process.name().to_string();
        if self.processes.contains_key(&name) {
            return Err(DaemonError::Duplicate(name));
        }

        if process.log_cpu() {
            self.log_cpu_set.insert(name.clone());
        }
        if process.log_mem() {
            self.log_mem_set.insert(name.clone());
        }

        self.order.push(name.clone());
        self.processes.insert(name, process);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<ManagedProcess, DaemonError> {
        let process = self
            .processes
            .remove(name)
            .ok_or_else(|| DaemonError::NotFound(name.to_string()))?;
        self.order.retain(|n| n != name);
        self.log_cpu_set.remove(name);
        self.log_mem_set.remove(name);
        Ok(process)
    }

    pub fn find(&self, name: &str) -> Result<&ManagedProcess, DaemonError> {
        self.processes
            .get(name)
            .ok_or_else(|| DaemonError::NotFound(name.to_string()))
    }

    pub fn find_mut(&mut self, name: &str) -> Result<&mut ManagedProcess, DaemonError> {
        self.processes
            .get_mut(name)
            .ok_or_else(|| DaemonError::NotFound(name.to_string()))
    }

    /// Stable insertion-order iteration.
    pub fn list(&self) -> impl Iterator<Item = &ManagedProcess> {
        self.order.iter().filter_map(|name| self.processes.get(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn log_cpu_set(&self) -> &HashSet<String> {
        &self.log_cpu_set
    }

    pub fn log_mem_set(&self) -> &HashSet<String> {
        &self.log_mem_set
    }
}
