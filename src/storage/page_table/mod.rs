//! Simulated address space.
//!
//! The page table maps every virtual page to a frame and a protection, and
//! owns the physical memory those frames live in. [`VirtualMemory`] performs
//! byte accesses against it and hands any access the current protection does
//! not allow to a [`FaultHandler`].

mod protection;
mod virtual_memory;

pub use protection::{Access, Protection};
pub use virtual_memory::{FaultHandler, VirtualMemory};

use crate::error::{Result, VmError};
use crate::storage::page::{FrameId, PageId, PAGE_SIZE};

/// Mapping state of one virtual page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageEntry {
    /// Frame the page was last mapped to. Meaningless while `protection` is NONE.
    pub frame: FrameId,
    /// Current protection.
    pub protection: Protection,
}

impl Default for PageEntry {
    fn default() -> Self {
        Self {
            frame: FrameId::new(0),
            protection: Protection::None,
        }
    }
}

/// Page table plus the physical memory backing it.
pub struct PageTable {
    entries: Vec<PageEntry>,
    physmem: Vec<u8>,
    frame_count: usize,
}

impl PageTable {
    /// Creates a page table with every page unmapped.
    ///
    /// # Errors
    ///
    /// Returns an error if either count is 0 or too large to address in bytes.
    pub fn new(page_count: usize, frame_count: usize) -> Result<Self> {
        if page_count == 0 {
            return Err(VmError::ConfigError(
                "Page count must be greater than 0".into(),
            ));
        }
        if frame_count == 0 {
            return Err(VmError::ConfigError(
                "Frame count must be greater than 0".into(),
            ));
        }

        let (Some(_), Some(physmem_len)) = (
            page_count.checked_mul(PAGE_SIZE),
            frame_count.checked_mul(PAGE_SIZE),
        ) else {
            return Err(VmError::ConfigError(format!(
                "{page_count} pages of {frame_count} frames overflow the address space"
            )));
        };

        Ok(Self {
            entries: vec![PageEntry::default(); page_count],
            physmem: vec![0u8; physmem_len],
            frame_count,
        })
    }

    /// Returns the number of virtual pages.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.entries.len()
    }

    /// Returns the number of physical frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Returns the current entry for `page`.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` is out of range.
    pub fn entry(&self, page: PageId) -> Result<PageEntry> {
        self.entries
            .get(page.index())
            .copied()
            .ok_or(VmError::PageOutOfRange {
                page: page.index(),
                page_count: self.entries.len(),
            })
    }

    /// Maps `page` to `frame` with the given protection.
    ///
    /// # Errors
    ///
    /// Returns an error if `page` or `frame` is out of range.
    pub fn set_entry(&mut self, page: PageId, frame: FrameId, protection: Protection) -> Result<()> {
        self.check_frame(frame)?;
        let page_count = self.entries.len();
        let entry = self
            .entries
            .get_mut(page.index())
            .ok_or(VmError::PageOutOfRange {
                page: page.index(),
                page_count,
            })?;
        *entry = PageEntry { frame, protection };
        Ok(())
    }

    /// Returns the contents of `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if `frame` is out of range.
    pub fn frame_data(&self, frame: FrameId) -> Result<&[u8]> {
        self.check_frame(frame)?;
        Ok(&self.physmem[frame.byte_range()])
    }

    /// Returns the contents of `frame` for modification.
    ///
    /// # Errors
    ///
    /// Returns an error if `frame` is out of range.
    pub fn frame_data_mut(&mut self, frame: FrameId) -> Result<&mut [u8]> {
        self.check_frame(frame)?;
        Ok(&mut self.physmem[frame.byte_range()])
    }

    /// Returns every page whose protection is not NONE, with its entry.
    pub fn resident_pages(&self) -> impl Iterator<Item = (PageId, PageEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.protection != Protection::None)
            .map(|(idx, entry)| (PageId::new(idx), *entry))
    }

    fn check_frame(&self, frame: FrameId) -> Result<()> {
        if frame.index() >= self.frame_count {
            return Err(VmError::FrameOutOfRange {
                frame: frame.index(),
                frame_count: self.frame_count,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PageTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageTable")
            .field("page_count", &self.entries.len())
            .field("frame_count", &self.frame_count)
            .finish_non_exhaustive()
    }
}
