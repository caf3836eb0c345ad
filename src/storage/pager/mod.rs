//! Demand pager: fault resolution and I/O accounting.
//!
//! The [`Pager`] is installed as the [`FaultHandler`] of a [`VirtualMemory`]
//! and resolves every fault in one of two ways:
//! - Protection upgrade: the page is already resident and was only
//!   write-protected, so it becomes `READ_WRITE` in place
//! - Miss: the page is loaded from disk into a frame chosen by the
//!   [`EvictionPolicy`], writing back the frame's previous page first if it
//!   was dirty
//!
//! # Example
//!
//! ```ignore
//! let table = PageTable::new(pages, frames)?;
//! let disk = Disk::open(path, pages)?;
//! let pager = Pager::new(frames, PolicyKind::Fifo, None, disk);
//! let mut vm = VirtualMemory::new(table, pager);
//! vm.write_byte(0, 42)?;
//! println!("{}", vm.handler().stats());
//! ```
//!
//! [`VirtualMemory`]: crate::storage::page_table::VirtualMemory

mod eviction;
mod fifo_queue;
mod frame_table;

pub use eviction::{EvictionPolicy, PolicyKind};
pub use fifo_queue::FifoQueue;
pub use frame_table::{FrameEntry, FrameTable};

use log::debug;

use crate::error::{Result, VmError};
use crate::storage::page::{Disk, FrameId, PageId};
use crate::storage::page_table::{FaultHandler, PageTable, Protection};

/// Fault handler owning the frame table, replacement policy and disk.
#[derive(Debug)]
pub struct Pager {
    /// Which page occupies each frame.
    frames: FrameTable,
    /// Victim selection and its bookkeeping.
    policy: EvictionPolicy,
    /// Backing store for page images.
    disk: Disk,
    /// Counters reported at the end of a run.
    stats: IoStats,
}

impl Pager {
    /// Creates a pager for `frame_count` frames backed by `disk`.
    ///
    /// The address space has one page per disk block. The replacement policy
    /// is sized from the same counts; `seed` only affects random eviction.
    #[must_use]
    pub fn new(frame_count: usize, kind: PolicyKind, seed: Option<u64>, disk: Disk) -> Self {
        let page_count = disk.block_count();
        Self {
            frames: FrameTable::new(frame_count, page_count),
            policy: EvictionPolicy::new(kind, frame_count, page_count, seed),
            disk,
            stats: IoStats::default(),
        }
    }

    /// Returns a snapshot of the I/O counters.
    #[must_use]
    pub fn stats(&self) -> IoStats {
        self.stats
    }

    /// Returns the frame table.
    #[must_use]
    pub fn frames(&self) -> &FrameTable {
        &self.frames
    }

    /// Returns the replacement policy.
    #[must_use]
    pub fn policy(&self) -> &EvictionPolicy {
        &self.policy
    }

    /// Returns the backing store.
    pub fn disk_mut(&mut self) -> &mut Disk {
        &mut self.disk
    }

    /// Checks that the frame table and `table` describe the same mapping.
    ///
    /// # Errors
    ///
    /// Returns [`VmError::InvariantViolation`] describing the first disagreement.
    pub fn verify_mapping(&self, table: &PageTable) -> Result<()> {
        for (frame, entry) in self.frames.iter() {
            let Some(page) = entry.occupant else {
                continue;
            };
            let mapped = table.entry(page)?;
            if mapped.protection == Protection::None || mapped.frame != frame {
                return Err(VmError::InvariantViolation(format!(
                    "{frame} holds {page} but the page table maps it to {} with {}",
                    mapped.frame, mapped.protection
                )));
            }
        }

        for (page, mapped) in table.resident_pages() {
            if self.frames.occupant_of(mapped.frame) != Some(page) {
                return Err(VmError::InvariantViolation(format!(
                    "{page} is resident in {} but the frame holds {:?}",
                    mapped.frame,
                    self.frames.occupant_of(mapped.frame)
                )));
            }
        }

        Ok(())
    }

    /// Evicts the page occupying `frame`, writing it back if dirty.
    fn evict(&mut self, table: &mut PageTable, frame: FrameId) -> Result<()> {
        let victim = self.frames.occupant_of(frame).ok_or_else(|| {
            VmError::InvariantViolation(format!("{frame} was filled but has no occupant"))
        })?;
        let entry = table.entry(victim)?;
        assert!(
            entry.frame == frame && entry.protection != Protection::None,
            "{frame} holds {victim} but the page table maps it to {} with {}",
            entry.frame,
            entry.protection
        );

        debug!("{} evicting {victim} from {frame}", self.policy.kind());
        if entry.protection.is_dirty() {
            self.disk.write_block(victim, table.frame_data(frame)?)?;
            self.stats.disk_writes += 1;
            debug!("wrote back dirty {victim}");
        }

        table.set_entry(victim, frame, Protection::None)?;
        self.stats.evictions += 1;
        Ok(())
    }

    /// Reads `page` from disk into `frame` and maps it read-only.
    fn load(&mut self, table: &mut PageTable, frame: FrameId, page: PageId) -> Result<()> {
        self.disk.read_block(page, table.frame_data_mut(frame)?)?;
        self.stats.disk_reads += 1;
        table.set_entry(page, frame, Protection::Read)?;
        self.frames.mark_occupied(frame, page);
        debug!("loaded {page} into {frame}");
        Ok(())
    }
}

impl FaultHandler for Pager {
    fn handle_fault(&mut self, table: &mut PageTable, page: PageId) -> Result<()> {
        if table.frame_count() != self.frames.frame_count() {
            return Err(VmError::ConfigError(format!(
                "Page table has {} frames but pager manages {}",
                table.frame_count(),
                self.frames.frame_count()
            )));
        }
        if table.page_count() != self.disk.block_count() {
            return Err(VmError::ConfigError(format!(
                "Page table has {} pages but the disk holds {} blocks",
                table.page_count(),
                self.disk.block_count()
            )));
        }

        debug!("page fault on {page}");
        self.stats.page_faults += 1;

        let entry = table.entry(page)?;
        self.policy.record_fault(page);

        if self.frames.occupant_of(entry.frame) == Some(page) {
            // Resident and read-only: the fault was a write.
            assert!(
                entry.protection == Protection::Read,
                "{page} faulted while resident in {} with {}",
                entry.frame,
                entry.protection
            );
            table.set_entry(page, entry.frame, Protection::ReadWrite)?;
            self.stats.protection_upgrades += 1;
            debug!("upgraded {page} in {} to READ_WRITE", entry.frame);
            return Ok(());
        }

        let frame = self.policy.select_victim_or_free_frame(&mut self.frames)?;
        if self.frames.was_filled(frame) {
            self.evict(table, frame)?;
        }
        self.load(table, frame, page)?;
        self.policy.record_assignment(frame);
        Ok(())
    }
}

/// I/O counters for one pager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IoStats {
    /// Fault notifications handled.
    pub page_faults: u64,
    /// Pages read from disk (one per miss).
    pub disk_reads: u64,
    /// Dirty pages written back to disk.
    pub disk_writes: u64,
    /// Faults resolved by upgrading a resident page to `READ_WRITE`.
    pub protection_upgrades: u64,
    /// Resident pages displaced from their frame.
    pub evictions: u64,
}

impl IoStats {
    /// Returns the number of faults that required a disk read.
    #[must_use]
    pub fn misses(&self) -> u64 {
        self.page_faults.saturating_sub(self.protection_upgrades)
    }
}

impl std::fmt::Display for IoStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "----SUMMARY----")?;
        writeln!(f, "Number of Page Faults = {}", self.page_faults)?;
        writeln!(f, "Number of Disk Reads = {}", self.disk_reads)?;
        write!(f, "Number of Disk Writes = {}", self.disk_writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::page::PAGE_SIZE;
    use crate::storage::page_table::VirtualMemory;
    use tempfile::TempDir;

    fn create_test_vm(
        pages: usize,
        frames: usize,
        kind: PolicyKind,
    ) -> (VirtualMemory<Pager>, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let disk = Disk::open(&temp_dir.path().join("disk.img"), pages).unwrap();
        let table = PageTable::new(pages, frames).unwrap();
        let vm = VirtualMemory::new(table, Pager::new(frames, kind, Some(7), disk));
        (vm, temp_dir)
    }

    fn fault(vm: &mut VirtualMemory<Pager>, page: usize) {
        vm.read_byte(page * PAGE_SIZE).unwrap();
    }

    #[test]
    fn test_first_touch_is_a_miss() {
        let (mut vm, _temp) = create_test_vm(4, 2, PolicyKind::Fifo);
        fault(&mut vm, 3);

        let stats = vm.handler().stats();
        assert_eq!(stats.page_faults, 1);
        assert_eq!(stats.disk_reads, 1);
        assert_eq!(stats.disk_writes, 0);

        let entry = vm.table().entry(PageId::new(3)).unwrap();
        assert_eq!(entry.frame, FrameId::new(0));
        assert_eq!(entry.protection, Protection::Read);
        assert_eq!(
            vm.handler().frames().occupant_of(FrameId::new(0)),
            Some(PageId::new(3))
        );
    }

    #[test]
    fn test_write_is_miss_then_upgrade() {
        let (mut vm, _temp) = create_test_vm(4, 2, PolicyKind::Fifo);
        vm.write_byte(5, 1).unwrap();

        let stats = vm.handler().stats();
        assert_eq!(stats.page_faults, 2);
        assert_eq!(stats.disk_reads, 1);
        assert_eq!(stats.protection_upgrades, 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(
            vm.table().entry(PageId::new(0)).unwrap().protection,
            Protection::ReadWrite
        );
    }

    #[test]
    fn test_clean_eviction_skips_write_back() {
        let (mut vm, _temp) = create_test_vm(4, 1, PolicyKind::Fifo);
        fault(&mut vm, 0);
        fault(&mut vm, 1);

        let stats = vm.handler().stats();
        assert_eq!(stats.disk_writes, 0);
        assert_eq!(stats.evictions, 1);
        assert_eq!(
            vm.table().entry(PageId::new(0)).unwrap().protection,
            Protection::None
        );
    }

    #[test]
    fn test_dirty_eviction_writes_back_contents() {
        let (mut vm, _temp) = create_test_vm(4, 1, PolicyKind::Fifo);
        vm.write_byte(10, 0x5A).unwrap();
        fault(&mut vm, 1);

        assert_eq!(vm.handler().stats().disk_writes, 1);

        let mut block = vec![0u8; PAGE_SIZE];
        vm.handler_mut()
            .disk_mut()
            .read_block(PageId::new(0), &mut block)
            .unwrap();
        assert_eq!(block[10], 0x5A);

        // Reloading the page brings the written value back
        assert_eq!(vm.read_byte(10).unwrap(), 0x5A);
    }

    #[test]
    fn test_verify_mapping_detects_disagreement() {
        let (mut vm, _temp) = create_test_vm(4, 2, PolicyKind::Random);
        fault(&mut vm, 0);
        fault(&mut vm, 1);

        let (mut table, pager) = vm.into_parts();
        pager.verify_mapping(&table).unwrap();

        table
            .set_entry(PageId::new(2), FrameId::new(1), Protection::Read)
            .unwrap();
        assert!(matches!(
            pager.verify_mapping(&table),
            Err(VmError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_mismatched_frame_count_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let disk = Disk::open(&temp_dir.path().join("disk.img"), 4).unwrap();
        let mut pager = Pager::new(2, PolicyKind::Fifo, None, disk);
        let mut table = PageTable::new(4, 3).unwrap();

        assert!(matches!(
            pager.handle_fault(&mut table, PageId::new(0)),
            Err(VmError::ConfigError(_))
        ));
        assert_eq!(pager.stats().page_faults, 0);
    }

    #[test]
    fn test_mismatched_page_count_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let disk = Disk::open(&temp_dir.path().join("disk.img"), 3).unwrap();
        let mut pager = Pager::new(2, PolicyKind::Frequency, None, disk);
        let mut table = PageTable::new(4, 2).unwrap();

        // Page 3 is valid for the table but has no disk block or fault counter
        assert!(matches!(
            pager.handle_fault(&mut table, PageId::new(3)),
            Err(VmError::ConfigError(_))
        ));
    }

    #[test]
    fn test_policy_sized_from_pager_geometry() {
        let temp_dir = TempDir::new().unwrap();
        let disk = Disk::open(&temp_dir.path().join("disk.img"), 4).unwrap();
        let pager = Pager::new(2, PolicyKind::Fifo, None, disk);
        let queue = pager.policy().fifo_queue().unwrap();
        assert_eq!(queue.capacity(), 2);
        assert_eq!(pager.frames().frame_count(), 2);
    }

    #[test]
    fn test_fifo_keeps_two_newest_pages() {
        let (mut vm, _temp) = create_test_vm(4, 2, PolicyKind::Fifo);
        for page in 0..4 {
            fault(&mut vm, page);
        }

        let resident: Vec<_> = vm.table().resident_pages().map(|(page, _)| page).collect();
        assert_eq!(resident, vec![PageId::new(2), PageId::new(3)]);
        vm.handler().verify_mapping(vm.table()).unwrap();
    }

    #[test]
    fn test_out_of_range_page_fails() {
        let (vm, _temp) = create_test_vm(4, 2, PolicyKind::Fifo);
        let (mut table, mut pager) = vm.into_parts();

        assert!(matches!(
            pager.handle_fault(&mut table, PageId::new(4)),
            Err(VmError::PageOutOfRange { page: 4, .. })
        ));
    }

    #[test]
    fn test_summary_format() {
        let stats = IoStats {
            page_faults: 3,
            disk_reads: 2,
            disk_writes: 1,
            protection_upgrades: 1,
            evictions: 0,
        };
        let text = stats.to_string();
        assert!(text.starts_with("----SUMMARY----"));
        assert!(text.contains("Number of Page Faults = 3"));
        assert!(text.contains("Number of Disk Reads = 2"));
        assert!(text.contains("Number of Disk Writes = 1"));
    }
}
