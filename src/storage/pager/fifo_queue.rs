//! Circular queue of frame assignments for FIFO eviction.
//!
//! The queue holds at most one slot per frame. While it has room, each
//! assignment is appended at the tail. Once full, every frame is already
//! tracked, so a new assignment overwrites the oldest slot and the head moves
//! past it.

use crate::storage::page::FrameId;

/// Fixed-capacity ring buffer of frame indices, oldest at `head`.
#[derive(Debug)]
pub struct FifoQueue {
    slots: Vec<FrameId>,
    /// Index of the oldest entry.
    head: usize,
    /// Index of the next free slot while not full.
    tail: usize,
    /// Number of live entries; disambiguates empty from full when `head == tail`.
    len: usize,
}

impl FifoQueue {
    /// Creates an empty queue with one slot per frame.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "FIFO queue needs at least one slot");
        Self {
            slots: vec![FrameId::new(0); capacity],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Records that `frame` was just assigned a page.
    pub fn push(&mut self, frame: FrameId) {
        let capacity = self.capacity();
        if self.len < capacity {
            self.slots[self.tail] = frame;
            self.tail = (self.tail + 1) % capacity;
            self.len += 1;
        } else {
            self.slots[self.head] = frame;
            self.head = (self.head + 1) % capacity;
            self.tail = self.head;
        }
    }

    /// Returns the frame assigned longest ago.
    #[must_use]
    pub fn oldest(&self) -> Option<FrameId> {
        if self.is_empty() {
            None
        } else {
            Some(self.slots[self.head])
        }
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns whether every slot is in use.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Returns the number of slots.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the head cursor.
    #[must_use]
    pub fn head(&self) -> usize {
        self.head
    }

    /// Returns the frames in assignment order (oldest first).
    pub fn iter(&self) -> impl Iterator<Item = FrameId> + '_ {
        (0..self.len).map(move |i| self.slots[(self.head + i) % self.capacity()])
    }
}
