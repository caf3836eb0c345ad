//! vmsim - demand-paged virtual memory simulator
//!
//! A fixed pool of physical frames backs a larger virtual address space. Any
//! access the current page protection does not allow raises a fault that the
//! [`Pager`] resolves by loading the page from disk, evicting another page
//! when no frame is free.

pub mod config;
pub mod error;
pub mod storage;
pub mod workload;

pub use config::SimConfig;
pub use error::{Result, VmError};
pub use storage::{IoStats, Pager, PolicyKind};
pub use workload::{Program, WorkloadResult};

use log::info;

use storage::{Disk, PageTable, VirtualMemory};

/// One configured run: an address space with a pager installed.
pub struct Simulation {
    config: SimConfig,
    vm: VirtualMemory<Pager>,
}

impl Simulation {
    /// Validates `config`, creates the disk file and sets up the address space.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the disk cannot be created.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;

        let disk = Disk::open(&config.disk_path, config.page_count)?;
        let table = PageTable::new(config.page_count, config.frame_count)?;
        let pager = Pager::new(config.frame_count, config.policy, config.seed, disk);

        info!(
            "{} pages, {} frames, policy {}, disk {}",
            config.page_count,
            config.frame_count,
            config.policy,
            config.disk_path.display()
        );

        Ok(Self {
            vm: VirtualMemory::new(table, pager),
            config,
        })
    }

    /// Runs the configured program, checks the final frame mapping and syncs
    /// the disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the program fails, the mapping is inconsistent
    /// afterwards, or the disk cannot be synced.
    pub fn run(&mut self) -> Result<WorkloadResult> {
        let result = self.config.program.run(&mut self.vm)?;
        self.vm.handler().verify_mapping(self.vm.table())?;
        self.vm.handler_mut().disk_mut().sync()?;
        Ok(result)
    }

    /// Returns the I/O counters so far.
    #[must_use]
    pub fn stats(&self) -> IoStats {
        self.vm.handler().stats()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Returns the address space for direct access.
    pub fn memory(&mut self) -> &mut VirtualMemory<Pager> {
        &mut self.vm
    }
}
