use std::collections::VecDeque;
use std::fmt;
use std::time::Duration;

use log::debug;

use super::action::{ActionResult, UndoableAction};
use super::policy::{Clock, MergePolicy, StandardMergePolicy, SystemClock};
use crate::blocks::Document;

/// Default maximum number of undo steps.
pub const DEFAULT_CAPACITY: usize = 1000;

/// One undo step.
#[derive(Debug)]
pub struct UndoStackEntry {
    pub action: Box<dyn UndoableAction>,
    /// Clock time of the last action absorbed into this entry.
    pub insert_time: Duration,
}

impl UndoStackEntry {
    pub fn new(action: Box<dyn UndoableAction>, insert_time: Duration) -> Self {
        Self {
            action,
            insert_time,
        }
    }
}

/// Linear undo/redo history over one document.
///
/// The undo side is a bounded [`VecDeque`]; beyond `capacity` the oldest
/// step is dropped. Any new action clears the redo side.
pub struct ActionStack {
    undo: VecDeque<UndoStackEntry>,
    redo: Vec<UndoStackEntry>,
    policy: Box<dyn MergePolicy>,
    clock: Box<dyn Clock>,
    capacity: usize,
}

impl Default for ActionStack {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ActionStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionStack")
            .field("undo", &self.undo.len())
            .field("redo", &self.redo.len())
            .field("policy", &self.policy)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ActionStack {
    /// A stack with the standard merge window and the system clock.
    pub fn new() -> Self {
        Self {
            undo: VecDeque::new(),
            redo: Vec::new(),
            policy: Box::new(StandardMergePolicy::default()),
            clock: Box::new(SystemClock::new()),
            capacity: DEFAULT_CAPACITY,
        }
    }

    pub fn with_policy(mut self, policy: impl MergePolicy + 'static) -> Self {
        self.policy = Box::new(policy);
        self
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Caps the number of undo steps; at least one step is always kept.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Applies `action` and records it, merging it into the top step when
    /// the policy and the top action agree.
    ///
    /// A failing action is not recorded and the error is returned as is.
    pub fn do_action(
        &mut self,
        document: &mut Document,
        mut action: Box<dyn UndoableAction>,
    ) -> ActionResult {
        action.apply(document)?;
        self.redo.clear();

        let entry = UndoStackEntry::new(action, self.clock.now());
        if let Some(top) = self.undo.back_mut()
            && self.policy.should_try_merge(top, &entry)
            && top.action.try_merge(document, entry.action.as_ref())
        {
            debug!(
                "merged {} into {}",
                entry.action.name(),
                top.action.description()
            );
            top.insert_time = entry.insert_time;
            return Ok(());
        }

        debug!("do {}", entry.action.description());
        self.undo.push_back(entry);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        Ok(())
    }

    /// Undoes the most recent step. Returns `false` when there is nothing
    /// to undo. A step whose undo fails is dropped.
    pub fn undo(&mut self, document: &mut Document) -> ActionResult<bool> {
        let Some(mut entry) = self.undo.pop_back() else {
            return Ok(false);
        };
        debug!("undo {}", entry.action.description());
        entry.action.undo(document)?;
        self.redo.push(entry);
        Ok(true)
    }

    /// Re-applies the most recently undone step. Returns `false` when there
    /// is nothing to redo.
    pub fn redo(&mut self, document: &mut Document) -> ActionResult<bool> {
        let Some(mut entry) = self.redo.pop() else {
            return Ok(false);
        };
        debug!("redo {}", entry.action.description());
        entry.action.apply(document)?;
        self.undo.push_back(entry);
        if self.undo.len() > self.capacity {
            self.undo.pop_front();
        }
        Ok(true)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn peek_undo(&self) -> Option<&dyn UndoableAction> {
        self.undo.back().map(|entry| entry.action.as_ref())
    }

    pub fn peek_redo(&self) -> Option<&dyn UndoableAction> {
        self.redo.last().map(|entry| entry.action.as_ref())
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Descriptions of the undo steps, most recent first.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = String> + '_ {
        self.undo.iter().rev().map(|entry| entry.action.description())
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}
