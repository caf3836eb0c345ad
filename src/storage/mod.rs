//! Storage layer of the simulator.
//!
//! This module provides:
//! - Page and frame identifiers plus the block-addressed disk ([`page`])
//! - The page table, protections and byte-level access ([`page_table`])
//! - The demand pager that resolves faults ([`pager`])

pub mod page;
pub mod page_table;
pub mod pager;

// Re-export commonly used types
pub use page::{Disk, FrameId, PageId, PAGE_SIZE};
pub use page_table::{Access, FaultHandler, PageEntry, PageTable, Protection, VirtualMemory};
pub use pager::{EvictionPolicy, FifoQueue, FrameTable, IoStats, Pager, PolicyKind};
