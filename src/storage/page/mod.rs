//! Page-level storage primitives.
//!
//! This module defines the core page abstractions:
//! - `PageId` / `FrameId`: Identifiers for virtual pages and physical frames
//! - `Disk`: File-backed block store holding one image per page

mod disk_manager;
mod page_id;

pub use disk_manager::{Disk, DEFAULT_DISK_PATH};
pub use page_id::{FrameId, PageId};

/// Page size in bytes (4KB).
pub const PAGE_SIZE: usize = 4096;

/// Page size as a power of 2 (2^12 = 4096).
pub const PAGE_SIZE_LOG2: u32 = 12;

/// Returns the offset of `addr` within its page.
#[must_use]
pub const fn page_offset(addr: usize) -> usize {
    addr & (PAGE_SIZE - 1)
}
