use vec_map::VecMap;

use crate::clause::ClauseId;
use crate::error::SolverError;
use crate::literal::Literal;

/// Two-watched-literal index: for each literal, the clauses currently
/// watching it. Keyed by `Literal::index`.
#[derive(Debug, Default)]
pub struct WatchIndex {
    watches: VecMap<Vec<ClauseId>>,
}

impl WatchIndex {
    pub fn new() -> WatchIndex {
        WatchIndex::default()
    }

    pub fn watchers_of(&self, literal: Literal) -> &[ClauseId] {
        self.watches
            .get(literal.index())
            .map(|watchers| watchers.as_slice())
            .unwrap_or(&[])
    }

    pub fn register(&mut self, clause: ClauseId, lit_a: Literal, lit_b: Literal) {
        self.watch(lit_a, clause);
        self.watch(lit_b, clause);
    }

    pub fn move_watch(
        &mut self,
        clause: ClauseId,
        from_lit: Literal,
        to_lit: Literal,
    ) -> Result<(), SolverError> {
        let removed = self
            .watches
            .get_mut(from_lit.index())
            .map_or(false, |watchers| vec_remove(watchers, &clause));
        if !removed {
            return Err(SolverError::Internal(format!(
                "clause {} is not watching {:?}",
                clause, from_lit
            )));
        }
        self.watch(to_lit, clause);
        Ok(())
    }

    pub fn is_watching(&self, clause: ClauseId, literal: Literal) -> bool {
        self.watchers_of(literal).contains(&clause)
    }

    /// Total number of (literal, clause) watch pairs.
    pub fn len(&self) -> usize {
        self.watches.values().map(|watchers| watchers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn watch(&mut self, literal: Literal, clause: ClauseId) {
        self.watches
            .entry(literal.index())
            .or_insert_with(Vec::new)
            .push(clause);
    }
}

fn vec_remove<T: PartialEq>(vec: &mut Vec<T>, item: &T) -> bool {
    if let Some(pos) = vec.iter().position(|x| *x == *item) {
        vec.swap_remove(pos);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_watches_both_literals() {
        let mut index = WatchIndex::new();
        index.register(3, Literal(1), Literal(-2));
        assert_eq!(&[3], index.watchers_of(Literal(1)));
        assert_eq!(&[3], index.watchers_of(Literal(-2)));
        assert!(index.watchers_of(Literal(-1)).is_empty());
        assert_eq!(2, index.len());
    }

    #[test]
    fn move_watch_transfers_clause() {
        let mut index = WatchIndex::new();
        index.register(0, Literal(1), Literal(2));
        index.register(1, Literal(1), Literal(3));
        index.move_watch(0, Literal(1), Literal(4)).unwrap();
        assert_eq!(&[1], index.watchers_of(Literal(1)));
        assert!(index.is_watching(0, Literal(4)));
        assert!(index.is_watching(0, Literal(2)));
        assert_eq!(4, index.len());
    }

    #[test]
    fn move_watch_rejects_stale_clause() {
        let mut index = WatchIndex::new();
        index.register(0, Literal(1), Literal(2));
        assert!(index.move_watch(7, Literal(1), Literal(3)).is_err());
        assert!(index.move_watch(0, Literal(5), Literal(3)).is_err());
    }
}
