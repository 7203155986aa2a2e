//! Per-invocation bookkeeping for chain positions.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Lifecycle of one chain position during a single invocation.
///
/// Transitions only move forward: `NotStarted → Running → Settled | Failed`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum SlotState {
    NotStarted = 0,
    Running = 1,
    Settled = 2,
    Failed = 3,
}

impl SlotState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::NotStarted,
            1 => Self::Running,
            2 => Self::Settled,
            _ => Self::Failed,
        }
    }
}

/// One state cell per chain position plus the end-of-chain sentinel.
///
/// Atomics rather than `Cell` so the dispatch futures stay `Send`; an
/// invocation is still driven by a single task.
pub(crate) struct Slots {
    states: Box<[AtomicU8]>,
    /// Set on position `i` when its `next` was called more than once.
    reentered: Box<[AtomicBool]>,
}

impl Slots {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            states: (0..len).map(|_| AtomicU8::new(SlotState::NotStarted as u8)).collect(),
            reentered: (0..len).map(|_| AtomicBool::new(false)).collect(),
        }
    }

    pub(crate) fn state(&self, index: usize) -> SlotState {
        SlotState::from_u8(self.states[index].load(Ordering::Acquire))
    }

    /// Moves `index` from `NotStarted` to `Running`, or reports the state it
    /// was already in.
    pub(crate) fn begin(&self, index: usize) -> Result<(), SlotState> {
        self.states[index]
            .compare_exchange(
                SlotState::NotStarted as u8,
                SlotState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(|_| ())
            .map_err(SlotState::from_u8)
    }

    /// Moves a running slot to `Settled` or `Failed`.
    pub(crate) fn finish(&self, index: usize, state: SlotState) {
        debug_assert!(matches!(state, SlotState::Settled | SlotState::Failed));
        debug_assert_eq!(self.state(index), SlotState::Running);
        self.states[index].store(state as u8, Ordering::Release);
    }

    pub(crate) fn mark_reentered(&self, index: usize) {
        self.reentered[index].store(true, Ordering::Release);
    }

    pub(crate) fn reentered(&self, index: usize) -> bool {
        self.reentered[index].load(Ordering::Acquire)
    }
}
