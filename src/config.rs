//! Simulation configuration.

use std::path::PathBuf;

use crate::error::{Result, VmError};
use crate::storage::page::{DEFAULT_DISK_PATH, PAGE_SIZE};
use crate::storage::pager::PolicyKind;
use crate::workload::Program;

/// Parameters of one simulation run, fixed before the first fault.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Number of virtual pages (and disk blocks).
    pub page_count: usize,
    /// Number of physical frames.
    pub frame_count: usize,
    /// Page replacement policy.
    pub policy: PolicyKind,
    /// Workload to run.
    pub program: Program,
    /// Seed for random eviction. None = seeded from the OS.
    pub seed: Option<u64>,
    /// Location of the disk file.
    pub disk_path: PathBuf,
}

impl SimConfig {
    /// Creates a configuration with the default disk path and no seed.
    #[must_use]
    pub fn new(page_count: usize, frame_count: usize, policy: PolicyKind, program: Program) -> Self {
        Self {
            page_count,
            frame_count,
            policy,
            program,
            seed: None,
            disk_path: PathBuf::from(DEFAULT_DISK_PATH),
        }
    }

    /// Sets the random eviction seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the disk file location.
    #[must_use]
    pub fn with_disk_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.disk_path = path.into();
        self
    }

    /// Checks the configuration before any memory is set up.
    ///
    /// # Errors
    ///
    /// Returns an error if the page or frame count is 0, or too large to
    /// address in bytes.
    pub fn validate(&self) -> Result<()> {
        if self.page_count == 0 {
            return Err(VmError::ConfigError(
                "Page count must be greater than 0".into(),
            ));
        }
        if self.frame_count == 0 {
            return Err(VmError::ConfigError(
                "Frame count must be greater than 0".into(),
            ));
        }
        if self.page_count.checked_mul(PAGE_SIZE).is_none() {
            return Err(VmError::ConfigError(format!(
                "{} pages do not fit in the address space",
                self.page_count
            )));
        }
        if self.frame_count.checked_mul(PAGE_SIZE).is_none() {
            return Err(VmError::ConfigError(format!(
                "{} frames do not fit in physical memory",
                self.frame_count
            )));
        }
        Ok(())
    }
}
