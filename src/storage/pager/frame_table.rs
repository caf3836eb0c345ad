//! Inverted page table: which page occupies each physical frame.

use crate::storage::page::{FrameId, PageId};

/// Bookkeeping for a single physical frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameEntry {
    /// The page currently held by this frame, if any.
    pub occupant: Option<PageId>,
    /// Whether the frame has held a page at least once.
    pub ever_filled: bool,
}

/// Per-frame state, indexed by frame number.
///
/// Frames are handed out for first use in increasing index order; once every
/// frame has been handed out, new frames can only come from eviction.
#[derive(Debug)]
pub struct FrameTable {
    frames: Vec<FrameEntry>,
    /// Frame holding each page, indexed by page number.
    holders: Vec<Option<FrameId>>,
    /// Number of frames handed out for first use.
    allocated: usize,
}

impl FrameTable {
    /// Creates a table of `frame_count` empty frames for `page_count` pages.
    #[must_use]
    pub fn new(frame_count: usize, page_count: usize) -> Self {
        Self {
            frames: vec![FrameEntry::default(); frame_count],
            holders: vec![None; page_count],
            allocated: 0,
        }
    }

    /// Returns the number of frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Returns the number of frames handed out so far.
    #[must_use]
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    /// Returns whether `frame` currently holds a page.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is out of range.
    #[must_use]
    pub fn is_occupied(&self, frame: FrameId) -> bool {
        self.frames[frame.index()].occupant.is_some()
    }

    /// Returns the page held by `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is out of range.
    #[must_use]
    pub fn occupant_of(&self, frame: FrameId) -> Option<PageId> {
        self.frames[frame.index()].occupant
    }

    /// Returns whether `frame` has ever been filled.
    ///
    /// # Panics
    ///
    /// Panics if `frame` is out of range.
    #[must_use]
    pub fn was_filled(&self, frame: FrameId) -> bool {
        self.frames[frame.index()].ever_filled
    }

    /// Records `page` as the occupant of `frame`.
    ///
    /// # Panics
    ///
    /// Panics if `frame` or `page` is out of range, or `page` already
    /// occupies a different frame.
    pub fn mark_occupied(&mut self, frame: FrameId, page: PageId) {
        if let Some(other) = self.holders[page.index()] {
            if other != frame && self.frames[other.index()].occupant == Some(page) {
                panic!("{page} assigned to {frame} while still recorded in {other}");
            }
        }

        let entry = &mut self.frames[frame.index()];
        if let Some(previous) = entry.occupant.replace(page) {
            self.holders[previous.index()] = None;
        }
        entry.ever_filled = true;
        self.holders[page.index()] = Some(frame);
    }

    /// Returns whether every frame has been handed out at least once.
    #[must_use]
    pub fn all_frames_used(&self) -> bool {
        self.allocated >= self.frames.len()
    }

    /// Hands out the next never-used frame, or `None` once all are in use.
    pub fn allocate_fresh(&mut self) -> Option<FrameId> {
        if self.all_frames_used() {
            return None;
        }
        let frame = FrameId::new(self.allocated);
        self.allocated += 1;
        Some(frame)
    }

    /// Iterates over all frames in index order.
    pub fn iter(&self) -> impl Iterator<Item = (FrameId, &FrameEntry)> {
        self.frames
            .iter()
            .enumerate()
            .map(|(idx, entry)| (FrameId::new(idx), entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table() {
        let table = FrameTable::new(3, 10);
        assert_eq!(table.frame_count(), 3);
        assert_eq!(table.allocated(), 0);
        assert!(!table.all_frames_used());
        assert!(!table.is_occupied(FrameId::new(0)));
        assert!(!table.was_filled(FrameId::new(2)));
        assert_eq!(table.occupant_of(FrameId::new(1)), None);
    }

    #[test]
    fn test_allocate_fresh_in_order() {
        let mut table = FrameTable::new(3, 10);

        assert_eq!(table.allocate_fresh(), Some(FrameId::new(0)));
        assert_eq!(table.allocate_fresh(), Some(FrameId::new(1)));
        assert_eq!(table.allocate_fresh(), Some(FrameId::new(2)));
        assert!(table.all_frames_used());
        assert_eq!(table.allocate_fresh(), None);
        assert_eq!(table.allocated(), 3);
    }

    #[test]
    fn test_mark_occupied() {
        let mut table = FrameTable::new(2, 10);
        table.mark_occupied(FrameId::new(1), PageId::new(7));

        assert!(table.is_occupied(FrameId::new(1)));
        assert!(table.was_filled(FrameId::new(1)));
        assert_eq!(table.occupant_of(FrameId::new(1)), Some(PageId::new(7)));

        // Reassignment replaces the occupant
        table.mark_occupied(FrameId::new(1), PageId::new(3));
        assert_eq!(table.occupant_of(FrameId::new(1)), Some(PageId::new(3)));
    }

    #[test]
    fn test_mark_same_page_same_frame_is_allowed() {
        let mut table = FrameTable::new(2, 10);
        table.mark_occupied(FrameId::new(0), PageId::new(4));
        table.mark_occupied(FrameId::new(0), PageId::new(4));
        assert_eq!(table.occupant_of(FrameId::new(0)), Some(PageId::new(4)));
    }

    #[test]
    #[should_panic(expected = "still recorded in")]
    fn test_double_occupancy_panics() {
        let mut table = FrameTable::new(2, 10);
        table.mark_occupied(FrameId::new(0), PageId::new(4));
        table.mark_occupied(FrameId::new(1), PageId::new(4));
    }

    #[test]
    fn test_page_may_move_after_frame_reused() {
        let mut table = FrameTable::new(2, 10);
        table.mark_occupied(FrameId::new(0), PageId::new(4));
        table.mark_occupied(FrameId::new(0), PageId::new(5));

        // Page 4 no longer occupies frame 0, so it can land anywhere
        table.mark_occupied(FrameId::new(1), PageId::new(4));
        assert_eq!(table.occupant_of(FrameId::new(0)), Some(PageId::new(5)));
        assert_eq!(table.occupant_of(FrameId::new(1)), Some(PageId::new(4)));
    }

    #[test]
    fn test_iter() {
        let mut table = FrameTable::new(2, 10);
        table.mark_occupied(FrameId::new(1), PageId::new(9));

        let occupants: Vec<_> = table.iter().map(|(_, entry)| entry.occupant).collect();
        assert_eq!(occupants, vec![None, Some(PageId::new(9))]);
    }
}
