// SPDX-License-Identifier: MIT OR Apache-2.0
//! Evaluation state consulted and updated while walking a graph.

use crate::guid::Guid;
use indexmap::IndexMap;

/// Variables and fork flags of one playback session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluationState {
    booleans: IndexMap<String, bool>,
    integers: IndexMap<String, i32>,
    forks: IndexMap<Guid, bool>,
}

impl EvaluationState {
    /// Create an empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a boolean variable
    pub fn set_bool(&mut self, name: impl Into<String>, value: bool) {
        self.booleans.insert(name.into(), value);
    }

    /// Set an integer variable
    pub fn set_int(&mut self, name: impl Into<String>, value: i32) {
        self.integers.insert(name.into(), value);
    }

    /// Value of a boolean variable, `None` if it was never set
    pub fn bool_value(&self, name: &str) -> Option<bool> {
        self.booleans.get(name).copied()
    }

    /// Value of an integer variable, 0 if it was never set
    pub fn int_value(&self, name: &str) -> i32 {
        self.integers.get(name).copied().unwrap_or(0)
    }

    /// Whether an integer variable was ever set
    pub fn has_int(&self, name: &str) -> bool {
        self.integers.contains_key(name)
    }

    /// Whether a fork has been passed through
    pub fn is_fork_visited(&self, fork: Guid) -> bool {
        self.forks.contains_key(&fork)
    }

    /// Record that a fork has been passed through
    pub fn mark_fork_visited(&mut self, fork: Guid) {
        self.forks.insert(fork, true);
    }

    /// Boolean variables in insertion order
    pub fn booleans(&self) -> impl Iterator<Item = (&str, bool)> {
        self.booleans.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Integer variables in insertion order
    pub fn integers(&self) -> impl Iterator<Item = (&str, i32)> {
        self.integers.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Forget every variable and fork flag
    pub fn clear(&mut self) {
        self.booleans.clear();
        self.integers.clear();
        self.forks.clear();
    }
}
