//! Bounded buffer of invertible mutation batches.

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::StoreError;
use crate::mutation::Mutation;

/// One undo step: replaying `mutation` in order restores the state before
/// the edit described by `tagline`.
#[derive(Debug, Clone, PartialEq)]
pub struct UndoEntry {
    pub tagline: String,
    pub mutation: Vec<Mutation>,
}

/// Undo history, oldest entry first.
///
/// Consecutive pushes with the same tagline inside the coalescing window
/// collapse into one entry, so repeated small edits undo in one step.
#[derive(Debug, Clone)]
pub struct UndoBuffer {
    entries: VecDeque<UndoEntry>,
    capacity: usize,
    window: Duration,
    /// Time of the push the newest entry may coalesce with.
    last_push: Option<Duration>,
}

impl UndoBuffer {
    pub fn new(capacity: usize, window: Duration) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
            window,
            last_push: None,
        }
    }

    /// Records `batch` under `tagline` at time `now`.
    pub fn push(&mut self, tagline: &str, batch: Vec<Mutation>, now: Duration) {
        let coalesce = self
            .last_push
            .is_some_and(|at| now.saturating_sub(at) < self.window);
        match self.entries.back_mut() {
            Some(newest) if coalesce && newest.tagline == tagline => {
                // Later edits must be undone first.
                let older = std::mem::replace(&mut newest.mutation, batch);
                newest.mutation.extend(older);
            }
            _ => {
                self.entries.push_back(UndoEntry {
                    tagline: tagline.to_string(),
                    mutation: batch,
                });
                while self.entries.len() > self.capacity {
                    self.entries.pop_front();
                }
            }
        }
        self.last_push = Some(now);
    }

    /// Removes the newest entry and returns its batch.
    pub fn pop(&mut self) -> Result<Vec<Mutation>, StoreError> {
        self.pop_entry().map(|entry| entry.mutation)
    }

    pub(crate) fn pop_entry(&mut self) -> Result<UndoEntry, StoreError> {
        let entry = self.entries.pop_back().ok_or(StoreError::EmptyUndoBuffer)?;
        self.last_push = None;
        Ok(entry)
    }

    /// Puts back an entry whose replay failed.
    pub(crate) fn restore(&mut self, entry: UndoEntry) {
        self.entries.push_back(entry);
        self.last_push = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &UndoEntry> {
        self.entries.iter()
    }

    pub fn taglines(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tagline.as_str()).collect()
    }

    /// Tagline of the step `perform_undo` would revert, for an undo button.
    pub fn last_tagline(&self) -> Option<&str> {
        self.entries.back().map(|e| e.tagline.as_str())
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.last_push = None;
    }
}
