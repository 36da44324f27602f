use std::fmt;

use crate::literal::{Literal, VariableName};

/// A total assignment of variables `1..=N`.
#[derive(Clone, Eq, PartialEq)]
pub struct Model(Vec<bool>);

impl Model {
    pub fn new(values: Vec<bool>) -> Model {
        Model(values)
    }

    /// Value of `var`; variables outside `1..=N` read as `false`.
    pub fn value(&self, var: VariableName) -> bool {
        var.checked_sub(1)
            .and_then(|idx| self.0.get(idx))
            .cloned()
            .unwrap_or(false)
    }

    pub fn num_vars(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> &[bool] {
        &self.0
    }

    /// Signed literals in variable order, e.g. `[1, -2, 3]`.
    pub fn literals(&self) -> Vec<i64> {
        self.0
            .iter()
            .enumerate()
            .map(|(idx, value)| Literal::from_var(idx + 1, *value).0)
            .collect()
    }

    pub fn satisfies(&self, clause: &[i64]) -> bool {
        clause
            .iter()
            .any(|num| *num != 0 && self.value(num.unsigned_abs() as usize) == (*num > 0))
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Model({:?})", self.literals())
    }
}

/// DIMACS solution line: `v 1 -2 3 0`.
impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "v")?;
        for literal in self.literals() {
            write!(f, " {}", literal)?;
        }
        write!(f, " 0")
    }
}
