//! Page and frame identifier types.

/// Identifier of a virtual page, also the block number of its disk image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(usize);

impl PageId {
    /// Creates a new page ID.
    #[must_use]
    pub const fn new(page_idx: usize) -> Self {
        Self(page_idx)
    }

    /// Returns the page number.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the page containing the given virtual address.
    #[must_use]
    pub const fn containing(addr: usize) -> Self {
        Self(addr >> super::PAGE_SIZE_LOG2)
    }

    /// Returns the byte offset of this page's block within the disk file.
    #[must_use]
    pub const fn offset(self) -> u64 {
        (self.0 as u64) * (super::PAGE_SIZE as u64)
    }
}

impl std::fmt::Display for PageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Page({})", self.0)
    }
}

/// Identifier of a physical frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameId(usize);

impl FrameId {
    /// Creates a new frame ID.
    #[must_use]
    pub const fn new(frame_idx: usize) -> Self {
        Self(frame_idx)
    }

    /// Returns the frame number.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }

    /// Returns the byte range this frame covers in physical memory.
    #[must_use]
    pub const fn byte_range(self) -> std::ops::Range<usize> {
        let start = self.0 * super::PAGE_SIZE;
        start..start + super::PAGE_SIZE
    }
}

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Frame({})", self.0)
    }
}
