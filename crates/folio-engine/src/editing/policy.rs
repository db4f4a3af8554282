use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::time::{Duration, Instant};

use super::UndoStackEntry;

/// Default window within which consecutive edits form one undo step.
pub const DEFAULT_MERGE_WINDOW: Duration = Duration::from_millis(750);

/// Decides whether a new entry may be offered to the top entry for merging.
pub trait MergePolicy: fmt::Debug {
    fn should_try_merge(&self, top: &UndoStackEntry, new: &UndoStackEntry) -> bool;
}

/// Merges edits that arrive within `window` of the top entry. A successful
/// merge refreshes the top entry's time, so a steady stream of typing keeps
/// extending the same step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardMergePolicy {
    window: Duration,
}

impl StandardMergePolicy {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }
}

impl Default for StandardMergePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MERGE_WINDOW)
    }
}

impl MergePolicy for StandardMergePolicy {
    fn should_try_merge(&self, top: &UndoStackEntry, new: &UndoStackEntry) -> bool {
        new.insert_time.saturating_sub(top.insert_time) <= self.window
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysMerge;

impl MergePolicy for AlwaysMerge {
    fn should_try_merge(&self, _top: &UndoStackEntry, _new: &UndoStackEntry) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverMerge;

impl MergePolicy for NeverMerge {
    fn should_try_merge(&self, _top: &UndoStackEntry, _new: &UndoStackEntry) -> bool {
        false
    }
}

/// Monotonic time source for entry timestamps.
pub trait Clock: fmt::Debug {
    /// Time elapsed since an arbitrary fixed origin.
    fn now(&self) -> Duration;
}

#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, now: Duration) {
        self.now.set(now);
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}
