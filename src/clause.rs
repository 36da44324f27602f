use vec_map::VecMap;

use crate::error::SolverError;
use crate::literal::{Literal, VariableName};

use self::WatchedUpdate::*;

pub type ClauseId = usize;

#[derive(Debug, Eq, PartialEq)]
pub enum WatchedUpdate {
    NowUnit(Literal),
    NewWatched(Literal),
    Conflict,
    NoChange,
}

/// A disjunction of literals. The literals at positions 0 and 1 are the
/// watched ones for every clause with at least two literals.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Clause(Vec<Literal>);

impl Clause {
    /// Validates an input clause: rejects 0, out-of-range variables and
    /// tautologies, and collapses duplicate literals.
    pub fn new(id: ClauseId, mut literals: Vec<i64>, num_vars: usize) -> Result<Clause, SolverError> {
        if literals.contains(&0) {
            return Err(SolverError::ZeroLiteral { clause: id });
        }
        if let Some(&literal) = literals
            .iter()
            .find(|num| num.unsigned_abs() > num_vars as u64)
        {
            return Err(SolverError::VariableOutOfRange { literal, num_vars });
        }
        literals.sort_unstable_by_key(|num| (num.unsigned_abs(), *num));
        literals.dedup();
        if let Some(pair) = literals
            .windows(2)
            .find(|pair| pair[0].unsigned_abs() == pair[1].unsigned_abs())
        {
            return Err(SolverError::Tautology {
                clause: id,
                variable: pair[0].unsigned_abs() as VariableName,
            });
        }
        Ok(Clause(literals.iter().map(Literal::new).collect()))
    }

    /// Builds a clause without validation, keeping the given literal order.
    pub fn from_literals(literals: Vec<Literal>) -> Clause {
        Clause(literals)
    }

    pub fn watched_literals(&self) -> Option<(Literal, Literal)> {
        if self.0.len() < 2 {
            None
        } else {
            Some((self.0[0], self.0[1]))
        }
    }

    pub fn literals(&self) -> &Vec<Literal> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_satisfied(&self, assigns: &VecMap<bool>) -> bool {
        self.0
            .iter()
            .any(|literal| literal.satisfied_by(assigns.get(literal.var()).cloned()))
    }

    /// Reacts to `falsified` (one of the two watched literals) becoming false.
    pub fn propagate(
        &mut self,
        falsified: Literal,
        assigns: &VecMap<bool>,
    ) -> Result<WatchedUpdate, SolverError> {
        if self.0.len() < 2 {
            return Err(SolverError::Internal(format!(
                "clause {:?} is too short to be watched",
                self.0
            )));
        }
        if self.0[0] == falsified {
            self.0.swap(0, 1);
        } else if self.0[1] != falsified {
            return Err(SolverError::Internal(format!(
                "clause {:?} does not watch {:?}",
                self.0, falsified
            )));
        }

        let other = self.0[0];
        let other_val = assigns.get(other.var()).cloned();
        if other.satisfied_by(other_val) {
            return Ok(NoChange);
        }

        // Skipping the watched pair, return the index of the first literal that is not falsified under the current assignment.
        let swap_with = self
            .0
            .iter()
            .enumerate()
            .skip(2)
            .find(|(_, literal)| !literal.falsified_by(assigns.get(literal.var()).cloned()))
            .map(|(idx, _)| idx);

        Ok(match swap_with {
            Some(swap_idx) => {
                self.0.swap(1, swap_idx);
                NewWatched(self.0[1])
            }
            None if other.falsified_by(other_val) => Conflict,
            None => NowUnit(other),
        })
    }
}

/// Owns every clause. Originals come first and are never touched again;
/// learned clauses are appended after them.
#[derive(Debug, Default)]
pub struct ClauseStore {
    clauses: Vec<Clause>,
    original_count: usize,
}

impl ClauseStore {
    pub fn new() -> ClauseStore {
        ClauseStore::default()
    }

    pub fn add(&mut self, clause: Clause) -> ClauseId {
        self.clauses.push(clause);
        self.original_count = self.clauses.len();
        self.clauses.len() - 1
    }

    pub fn add_learned(&mut self, clause: Clause) -> ClauseId {
        self.clauses.push(clause);
        self.clauses.len() - 1
    }

    pub fn get(&self, id: ClauseId) -> Option<&Clause> {
        self.clauses.get(id)
    }

    pub fn get_mut(&mut self, id: ClauseId) -> Option<&mut Clause> {
        self.clauses.get_mut(id)
    }

    pub fn count(&self) -> usize {
        self.clauses.len()
    }

    pub fn original_count(&self) -> usize {
        self.original_count
    }

    pub fn learned_count(&self) -> usize {
        self.clauses.len() - self.original_count
    }

    pub fn originals(&self) -> impl Iterator<Item = &Clause> {
        self.clauses[..self.original_count].iter()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ClauseId, &Clause)> {
        self.clauses.iter().enumerate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assigns(values: &[(usize, bool)]) -> VecMap<bool> {
        values.iter().cloned().collect()
    }

    #[test]
    fn watched_literals_none_for_unit() {
        let clause = Clause::new(0, vec![-78634], 78634).unwrap();
        assert_eq!(None, clause.watched_literals());
    }

    #[test]
    fn watched_literals_returns_first_two() {
        let clause = Clause::new(0, vec![-1, 3, 7], 7).unwrap();
        assert_eq!(Some((Literal(-1), Literal(3))), clause.watched_literals());
    }

    #[test]
    fn new_collapses_duplicates() {
        let clause = Clause::new(0, vec![2, -1, 2, -1], 2).unwrap();
        assert_eq!(&vec![Literal(-1), Literal(2)], clause.literals());
    }

    #[test]
    fn new_rejects_zero() {
        assert_eq!(
            Err(SolverError::ZeroLiteral { clause: 4 }),
            Clause::new(4, vec![1, 0, 2], 2)
        );
    }

    #[test]
    fn new_rejects_tautology() {
        assert_eq!(
            Err(SolverError::Tautology {
                clause: 1,
                variable: 3
            }),
            Clause::new(1, vec![3, 2, -3], 3)
        );
    }

    #[test]
    fn new_rejects_unknown_variable() {
        assert_eq!(
            Err(SolverError::VariableOutOfRange {
                literal: -9,
                num_vars: 4
            }),
            Clause::new(0, vec![1, -9], 4)
        );
    }

    #[test]
    fn propagate_swaps_literals_and_returns_new_watched() {
        let mut clause = Clause::from_literals(vec![Literal(-4), Literal(-2), Literal(1), Literal(3)]);
        let result = clause.propagate(Literal(-2), &assigns(&[(2, true)])).unwrap();
        assert_eq!(
            vec![Literal(-4), Literal(1), Literal(-2), Literal(3)],
            clause.0
        );
        assert_eq!(NewWatched(Literal(1)), result);
    }

    #[test]
    fn propagate_moves_falsified_watch_to_second_slot() {
        let mut clause = Clause::from_literals(vec![Literal(1), Literal(2), Literal(3)]);
        let result = clause.propagate(Literal(1), &assigns(&[(1, false)])).unwrap();
        assert_eq!(NewWatched(Literal(3)), result);
        assert_eq!(vec![Literal(2), Literal(3), Literal(1)], clause.0);
    }

    #[test]
    fn propagate_reports_unit() {
        let mut clause = Clause::from_literals(vec![Literal(1), Literal(2), Literal(3)]);
        let result = clause
            .propagate(Literal(2), &assigns(&[(2, false), (3, false)]))
            .unwrap();
        assert_eq!(NowUnit(Literal(1)), result);
    }

    #[test]
    fn propagate_skips_satisfied() {
        let mut clause = Clause::from_literals(vec![Literal(1), Literal(2)]);
        let result = clause
            .propagate(Literal(2), &assigns(&[(1, true), (2, false)]))
            .unwrap();
        assert_eq!(NoChange, result);
    }

    #[test]
    fn propagate_reports_conflict() {
        let mut clause = Clause::from_literals(vec![Literal(1), Literal(-2)]);
        let result = clause
            .propagate(Literal(-2), &assigns(&[(1, false), (2, true)]))
            .unwrap();
        assert_eq!(Conflict, result);
    }

    #[test]
    fn propagate_rejects_unwatched_literal() {
        let mut clause = Clause::from_literals(vec![Literal(1), Literal(2), Literal(3)]);
        assert!(clause.propagate(Literal(3), &assigns(&[(3, false)])).is_err());
    }

    #[test]
    fn store_separates_originals_and_learned() {
        let mut store = ClauseStore::new();
        let a = store.add(Clause::new(0, vec![1, 2], 2).unwrap());
        let b = store.add(Clause::new(1, vec![-1], 2).unwrap());
        let c = store.add_learned(Clause::from_literals(vec![Literal(2)]));
        assert_eq!((0, 1, 2), (a, b, c));
        assert_eq!(3, store.count());
        assert_eq!(2, store.original_count());
        assert_eq!(1, store.learned_count());
        assert_eq!(2, store.originals().count());
        assert!(store.get(3).is_none());
    }
}
