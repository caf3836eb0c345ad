//! Page replacement policies.
//!
//! Every policy hands out never-used frames first, in increasing index order.
//! Only once all frames are in use does it pick a victim:
//! - `Random`: uniform over all frames
//! - `Fifo`: the frame assigned longest ago
//! - `Frequency`: the frame whose page has faulted least often, lowest index on ties
//!
//! Policies never look at dirty state and never clear a victim's occupancy;
//! write-back and remapping belong to the fault handler.

use std::str::FromStr;

use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::fifo_queue::FifoQueue;
use super::frame_table::FrameTable;
use crate::error::{Result, VmError};
use crate::storage::page::{FrameId, PageId};

/// Replacement policy selector, fixed for the lifetime of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Uniformly random victim.
    Random,
    /// First-in-first-out by frame assignment.
    Fifo,
    /// Least fault count of the occupying page.
    Frequency,
}

impl PolicyKind {
    /// Returns the command-line name of this policy.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            PolicyKind::Random => "rand",
            PolicyKind::Fifo => "fifo",
            PolicyKind::Frequency => "custom",
        }
    }
}

impl FromStr for PolicyKind {
    type Err = VmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "rand" | "random" => Ok(PolicyKind::Random),
            "fifo" => Ok(PolicyKind::Fifo),
            "custom" | "frequency" | "freq" => Ok(PolicyKind::Frequency),
            _ => Err(VmError::UnknownPolicy(s.to_string())),
        }
    }
}

impl std::fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A replacement policy together with the state it needs.
#[derive(Debug)]
pub enum EvictionPolicy {
    Random {
        rng: StdRng,
    },
    Fifo {
        queue: FifoQueue,
    },
    Frequency {
        /// Fault count per page.
        counts: Vec<u64>,
    },
}

impl EvictionPolicy {
    /// Creates the policy selected by `kind` for the given memory geometry.
    ///
    /// `seed` only affects `Random`; without one the generator is seeded from
    /// the operating system.
    #[must_use]
    pub(crate) fn new(
        kind: PolicyKind,
        frame_count: usize,
        page_count: usize,
        seed: Option<u64>,
    ) -> Self {
        match kind {
            PolicyKind::Random => EvictionPolicy::Random {
                rng: seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64),
            },
            PolicyKind::Fifo => EvictionPolicy::Fifo {
                queue: FifoQueue::new(frame_count),
            },
            PolicyKind::Frequency => EvictionPolicy::Frequency {
                counts: vec![0; page_count],
            },
        }
    }

    /// Returns which policy this is.
    #[must_use]
    pub fn kind(&self) -> PolicyKind {
        match self {
            EvictionPolicy::Random { .. } => PolicyKind::Random,
            EvictionPolicy::Fifo { .. } => PolicyKind::Fifo,
            EvictionPolicy::Frequency { .. } => PolicyKind::Frequency,
        }
    }

    /// Returns a never-used frame if one remains, otherwise a victim frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the policy's bookkeeping cannot name a victim even
    /// though every frame is in use.
    pub fn select_victim_or_free_frame(&mut self, frames: &mut FrameTable) -> Result<FrameId> {
        if let Some(frame) = frames.allocate_fresh() {
            debug!("assigning empty {frame}");
            return Ok(frame);
        }

        match self {
            EvictionPolicy::Random { rng } => {
                Ok(FrameId::new(rng.gen_range(0..frames.frame_count())))
            }
            EvictionPolicy::Fifo { queue } => queue.oldest().ok_or_else(|| {
                VmError::InvariantViolation("FIFO queue empty with all frames in use".into())
            }),
            EvictionPolicy::Frequency { counts } => {
                let mut best: Option<(FrameId, u64)> = None;
                for (frame, entry) in frames.iter() {
                    let page = entry.occupant.ok_or_else(|| {
                        VmError::InvariantViolation(format!(
                            "{frame} has no occupant with all frames in use"
                        ))
                    })?;
                    let count = counts[page.index()];
                    if best.map_or(true, |(_, lowest)| count < lowest) {
                        best = Some((frame, count));
                    }
                }
                best.map(|(frame, _)| frame).ok_or_else(|| {
                    VmError::InvariantViolation("no frames to choose a victim from".into())
                })
            }
        }
    }

    /// Records a fault on `page`, whether it ends in a reload or an upgrade.
    ///
    /// # Panics
    ///
    /// Panics if `page` is outside the page count the policy was built for.
    pub fn record_fault(&mut self, page: PageId) {
        if let EvictionPolicy::Frequency { counts } = self {
            counts[page.index()] += 1;
        }
    }

    /// Records that `frame` was just loaded with a new page.
    pub fn record_assignment(&mut self, frame: FrameId) {
        if let EvictionPolicy::Fifo { queue } = self {
            queue.push(frame);
        }
    }

    /// Returns the fault count of `page` under the frequency policy.
    #[must_use]
    pub fn fault_count(&self, page: PageId) -> Option<u64> {
        match self {
            EvictionPolicy::Frequency { counts } => counts.get(page.index()).copied(),
            _ => None,
        }
    }

    /// Returns the assignment queue under the FIFO policy.
    #[must_use]
    pub fn fifo_queue(&self) -> Option<&FifoQueue> {
        match self {
            EvictionPolicy::Fifo { queue } => Some(queue),
            _ => None,
        }
    }
}
