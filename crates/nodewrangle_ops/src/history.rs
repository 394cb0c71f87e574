// SPDX-License-Identifier: MIT OR Apache-2.0
//! Undo/redo history of operator runs.
//!
//! Each committed entry holds bincode snapshots of the whole graph taken
//! before and after one operator, so undo and redo are plain restores.

use nodewrangle_graph::Graph;
use std::collections::VecDeque;
use thiserror::Error;

/// Maximum undo history depth
const MAX_HISTORY: usize = 100;

/// History errors
#[derive(Debug, Error)]
pub enum HistoryError {
    /// Nothing to undo
    #[error("Nothing to undo")]
    NothingToUndo,

    /// Nothing to redo
    #[error("Nothing to redo")]
    NothingToRedo,

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),
}

/// Result type for history operations
pub type Result<T> = std::result::Result<T, HistoryError>;

/// Serialised graph state
#[derive(Debug, Clone)]
pub struct Snapshot {
    data: Vec<u8>,
}

impl Snapshot {
    /// Capture the current state of `graph`
    pub fn take(graph: &Graph) -> Result<Self> {
        Ok(Self {
            data: bincode::serialize(graph)?,
        })
    }

    /// Rebuild the captured graph
    pub fn restore(&self) -> Result<Graph> {
        Ok(bincode::deserialize(&self.data)?)
    }

    /// Size in bytes
    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// One undoable operator run
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// Name of the operator that ran
    pub operator: String,
    before: Snapshot,
    after: Snapshot,
}

impl HistoryEntry {
    fn memory_size(&self) -> usize {
        self.before.size() + self.after.size()
    }
}

/// Undo/redo history manager
#[derive(Debug)]
pub struct History {
    undo_stack: VecDeque<HistoryEntry>,
    redo_stack: VecDeque<HistoryEntry>,
    max_depth: usize,
    memory_used: usize,
}

impl History {
    /// Create a new history manager
    pub fn new() -> Self {
        Self::with_max_depth(MAX_HISTORY)
    }

    /// Create with custom maximum depth
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: VecDeque::new(),
            max_depth,
            memory_used: 0,
        }
    }

    /// Record that `operator` turned `before` into `after`.
    ///
    /// Clears the redo stack and drops the oldest entries past the depth
    /// limit.
    pub fn commit(&mut self, operator: &str, before: Snapshot, after: &Graph) -> Result<()> {
        let entry = HistoryEntry {
            operator: operator.to_string(),
            before,
            after: Snapshot::take(after)?,
        };

        self.redo_stack.clear();
        self.memory_used += entry.memory_size();
        self.undo_stack.push_back(entry);

        while self.undo_stack.len() > self.max_depth {
            if let Some(old) = self.undo_stack.pop_front() {
                self.memory_used = self.memory_used.saturating_sub(old.memory_size());
            }
        }

        tracing::debug!(operator, depth = self.undo_stack.len(), "history committed");
        Ok(())
    }

    /// Restore the state before the last operator, returning its name
    pub fn undo(&mut self, graph: &mut Graph) -> Result<String> {
        let entry = self.undo_stack.pop_back().ok_or(HistoryError::NothingToUndo)?;
        match entry.before.restore() {
            Ok(restored) => *graph = restored,
            Err(err) => {
                self.undo_stack.push_back(entry);
                return Err(err);
            }
        }

        self.memory_used = self.memory_used.saturating_sub(entry.memory_size());
        let operator = entry.operator.clone();
        self.redo_stack.push_back(entry);
        Ok(operator)
    }

    /// Reapply the last undone operator, returning its name
    pub fn redo(&mut self, graph: &mut Graph) -> Result<String> {
        let entry = self.redo_stack.pop_back().ok_or(HistoryError::NothingToRedo)?;
        match entry.after.restore() {
            Ok(restored) => *graph = restored,
            Err(err) => {
                self.redo_stack.push_back(entry);
                return Err(err);
            }
        }

        self.memory_used += entry.memory_size();
        let operator = entry.operator.clone();
        self.undo_stack.push_back(entry);
        Ok(operator)
    }

    /// Check if undo is available
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Check if redo is available
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Get undo stack depth
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }

    /// Get redo stack depth
    pub fn redo_depth(&self) -> usize {
        self.redo_stack.len()
    }

    /// Bytes held by undo snapshots
    pub fn memory_used(&self) -> usize {
        self.memory_used
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.memory_used = 0;
    }

    /// Operator the next undo reverts
    pub fn undo_description(&self) -> Option<&str> {
        self.undo_stack.back().map(|e| e.operator.as_str())
    }

    /// Operator the next redo reapplies
    pub fn redo_description(&self) -> Option<&str> {
        self.redo_stack.back().map(|e| e.operator.as_str())
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
