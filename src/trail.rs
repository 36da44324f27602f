use std::fmt;

use vec_map::VecMap;

use crate::clause::ClauseId;
use crate::error::SolverError;
use crate::literal::{Literal, VariableName};

#[derive(Copy, Clone, Eq, PartialEq)]
pub struct TrailEntry {
    pub literal: Literal,
    pub level: usize,
    /// `None` marks a decision.
    pub reason: Option<ClauseId>,
}

impl fmt::Debug for TrailEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.reason {
            None => write!(f, "Decision({:?}@{})", self.literal, self.level),
            Some(reason) => write!(f, "Consequence({:?}@{} <- {})", self.literal, self.level, reason),
        }
    }
}

/// Chronological record of assignments. Per-variable value, level and
/// reason tables are kept in step with `entries` so lookups are O(1).
///
/// Entries from `head` onwards have not been propagated yet; the slice acts
/// as a FIFO propagation queue.
#[derive(Debug, Default)]
pub struct Trail {
    entries: Vec<TrailEntry>,
    assigns: VecMap<bool>,
    levels: VecMap<usize>,
    reasons: VecMap<ClauseId>,
    level: usize,
    head: usize,
}

impl Trail {
    pub fn new() -> Trail {
        Trail::default()
    }

    pub fn push(
        &mut self,
        literal: Literal,
        level: usize,
        reason: Option<ClauseId>,
    ) -> Result<(), SolverError> {
        if level > self.level {
            return Err(SolverError::Internal(format!(
                "cannot assign {:?} at level {} above the current level {}",
                literal, level, self.level
            )));
        }
        if let Some(last) = self.entries.last() {
            if last.level > level {
                return Err(SolverError::Internal(format!(
                    "assigning {:?} at level {} would break level order after {:?}",
                    literal, level, last
                )));
            }
        }
        let var = literal.var();
        if let Some(value) = self.assigns.get(var) {
            return Err(SolverError::Internal(format!(
                "variable {} is already assigned {} and cannot take {:?}",
                var, value, literal
            )));
        }
        self.assigns.insert(var, literal.sign());
        self.levels.insert(var, level);
        if let Some(reason) = reason {
            self.reasons.insert(var, reason);
        }
        self.entries.push(TrailEntry {
            literal,
            level,
            reason,
        });
        Ok(())
    }

    /// Opens a new decision level and assigns `literal` as its decision.
    pub fn decide(&mut self, literal: Literal) -> Result<(), SolverError> {
        self.level += 1;
        let level = self.level;
        self.push(literal, level, None)
    }

    /// Removes every entry above `level`, newest first, and returns the
    /// removed literals in removal order.
    pub fn pop_to(&mut self, level: usize) -> Vec<Literal> {
        let mut removed = Vec::new();
        while let Some(entry) = self.entries.last().cloned() {
            if entry.level <= level {
                break;
            }
            self.entries.pop();
            let var = entry.literal.var();
            self.assigns.remove(var);
            self.levels.remove(var);
            self.reasons.remove(var);
            removed.push(entry.literal);
        }
        if level < self.level {
            self.level = level;
        }
        if self.head > self.entries.len() {
            self.head = self.entries.len();
        }
        removed
    }

    /// Next assigned literal whose consequences have not been propagated.
    pub fn next_unpropagated(&mut self) -> Option<Literal> {
        let entry = self.entries.get(self.head)?;
        self.head += 1;
        Some(entry.literal)
    }

    pub fn is_propagated(&self) -> bool {
        self.head == self.entries.len()
    }

    pub fn level_of(&self, var: VariableName) -> Option<usize> {
        self.levels.get(var).cloned()
    }

    pub fn reason_of(&self, var: VariableName) -> Option<ClauseId> {
        self.reasons.get(var).cloned()
    }

    pub fn value(&self, var: VariableName) -> Option<bool> {
        self.assigns.get(var).cloned()
    }

    /// Truth value of `literal` under the current assignment.
    pub fn value_of(&self, literal: Literal) -> Option<bool> {
        self.value(literal.var()).map(|val| val == literal.sign())
    }

    pub fn assigns(&self) -> &VecMap<bool> {
        &self.assigns
    }

    pub fn entries(&self) -> &[TrailEntry] {
        &self.entries
    }

    pub fn decision_level(&self) -> usize {
        self.level
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
