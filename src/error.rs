//! Error types for vmsim operations.

use thiserror::Error;

/// Result type alias using [`VmError`].
pub type Result<T> = std::result::Result<T, VmError>;

/// Error types for vmsim operations.
#[derive(Debug, Error)]
pub enum VmError {
    // ==================== Configuration Errors ====================
    /// Invalid simulation parameters (zero pages, zero frames, ...).
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Policy name not recognized.
    #[error("Unknown replacement policy: {0} (expected rand, fifo or custom)")]
    UnknownPolicy(String),

    /// Workload name not recognized.
    #[error("Unknown program: {0} (expected scan, sort, focus, mean_mode or count_sort)")]
    UnknownProgram(String),

    // ==================== Storage Errors ====================
    /// General backing store I/O error.
    #[error("Storage error: {0}")]
    StorageError(String),

    // ==================== Addressing Errors ====================
    /// Page number outside `[0, page_count)`.
    #[error("Page {page} out of range (page count is {page_count})")]
    PageOutOfRange { page: usize, page_count: usize },

    /// Frame number outside `[0, frame_count)`.
    #[error("Frame {frame} out of range (frame count is {frame_count})")]
    FrameOutOfRange { frame: usize, frame_count: usize },

    /// Virtual address past the end of the address space.
    #[error("Virtual address {addr:#x} out of range (address space is {len} bytes)")]
    AddressOutOfRange { addr: usize, len: usize },

    // ==================== Engine Errors ====================
    /// Internal bookkeeping reached a state the fault path cannot resolve.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// A workload's self-check failed.
    #[error("Workload check failed: {0}")]
    WorkloadCheck(String),
}
