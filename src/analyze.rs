use crate::clause::{ClauseId, ClauseStore};
use crate::error::SolverError;
use crate::literal::{Literal, VariableName};
use crate::trail::Trail;

#[derive(Debug, Eq, PartialEq)]
pub struct Analysis {
    /// Asserting literal first, then the literal with the highest remaining
    /// level (if any), so the clause can be watched on those two right away.
    pub learned: Vec<Literal>,
    pub backjump_level: usize,
    /// Every variable met while resolving, for the decision heuristic.
    pub involved: Vec<VariableName>,
}

/// First-UIP conflict analysis.
#[derive(Debug, Default)]
pub struct ConflictAnalyzer {
    seen: Vec<bool>,
}

impl ConflictAnalyzer {
    pub fn new(num_vars: usize) -> ConflictAnalyzer {
        ConflictAnalyzer {
            seen: vec![false; num_vars + 1],
        }
    }

    /// Resolves the conflicting clause against the reasons of current-level
    /// literals, newest first, until a single current-level literal is left.
    pub fn analyze(
        &mut self,
        conflict: ClauseId,
        store: &ClauseStore,
        trail: &Trail,
    ) -> Result<Analysis, SolverError> {
        let current = trail.decision_level();
        if current == 0 {
            return Err(SolverError::Internal(
                "conflict analysis at decision level 0".to_string(),
            ));
        }

        let mut learned = vec![Literal(0)];
        let mut involved = Vec::new();
        let mut pending = 0usize;
        let mut reason = conflict;
        let mut idx = trail.len();

        let uip = loop {
            let clause = store
                .get(reason)
                .ok_or_else(|| SolverError::Internal(format!("unknown clause {}", reason)))?;
            for &literal in clause.literals() {
                let var = literal.var();
                if self.seen[var] {
                    continue;
                }
                let level = trail.level_of(var).ok_or_else(|| {
                    SolverError::Internal(format!(
                        "literal {:?} of clause {} is unassigned during analysis",
                        literal, reason
                    ))
                })?;
                if level == 0 {
                    continue;
                }
                self.seen[var] = true;
                involved.push(var);
                if level == current {
                    pending += 1;
                } else {
                    learned.push(literal);
                }
            }

            if pending == 0 {
                self.clear(&involved);
                return Err(SolverError::Internal(format!(
                    "clause {} has no literal at the conflict level {}",
                    reason, current
                )));
            }

            // Latest trail entry taking part in the resolution.
            let entry = loop {
                if idx == 0 {
                    self.clear(&involved);
                    return Err(SolverError::Internal(
                        "trail exhausted during conflict analysis".to_string(),
                    ));
                }
                idx -= 1;
                let entry = trail.entries()[idx];
                if self.seen[entry.literal.var()] {
                    break entry;
                }
            };
            pending -= 1;
            if pending == 0 {
                break !entry.literal;
            }
            reason = match entry.reason {
                Some(reason) => reason,
                None => {
                    self.clear(&involved);
                    return Err(SolverError::Internal(format!(
                        "decision {:?} reached with {} literals left at level {}",
                        entry.literal, pending, current
                    )));
                }
            };
        };

        learned[0] = uip;
        self.clear(&involved);

        let mut backjump_level = 0;
        if learned.len() > 1 {
            let mut max_idx = 1;
            for (idx, literal) in learned.iter().enumerate().skip(1) {
                let level = trail.level_of(literal.var()).unwrap_or(0);
                if level > backjump_level {
                    backjump_level = level;
                    max_idx = idx;
                }
            }
            learned.swap(1, max_idx);
        }

        trace!("Analysis of {} learned {:?}, backjump to {}", conflict, learned, backjump_level);
        Ok(Analysis {
            learned,
            backjump_level,
            involved,
        })
    }

    fn clear(&mut self, vars: &[VariableName]) {
        for &var in vars {
            self.seen[var] = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clause::Clause;

    fn clause(literals: &[i64]) -> Clause {
        Clause::from_literals(literals.iter().map(Literal::new).collect())
    }

    #[test]
    fn learns_first_uip_across_levels() {
        // Decisions 1@1 and 2@2; 1 & 2 imply 3, 3 implies 4, 3 & 4 imply 5,
        // and clause 3 forbids 3 & 5.
        let mut store = ClauseStore::new();
        store.add(clause(&[3, -1, -2]));
        store.add(clause(&[4, -3]));
        store.add(clause(&[-4, -3, 5]));
        store.add(clause(&[-5, -3]));

        let mut trail = Trail::new();
        trail.decide(Literal(1)).unwrap();
        trail.decide(Literal(2)).unwrap();
        trail.push(Literal(3), 2, Some(0)).unwrap();
        trail.push(Literal(4), 2, Some(1)).unwrap();
        trail.push(Literal(5), 2, Some(2)).unwrap();

        let mut analyzer = ConflictAnalyzer::new(5);
        let analysis = analyzer.analyze(3, &store, &trail).unwrap();
        assert_eq!(vec![Literal(-3)], analysis.learned);
        assert_eq!(0, analysis.backjump_level);
        assert!(analyzer.seen.iter().all(|seen| !seen));
    }

    #[test]
    fn backjump_targets_second_highest_level() {
        // Decisions 1@1, 2@2, 3@3; 1 & 3 imply 4, and clause 1 forbids 1 & 4.
        let mut store = ClauseStore::new();
        store.add(clause(&[4, -3, -1]));
        store.add(clause(&[-4, -1]));

        let mut trail = Trail::new();
        trail.decide(Literal(1)).unwrap();
        trail.decide(Literal(2)).unwrap();
        trail.decide(Literal(3)).unwrap();
        trail.push(Literal(4), 3, Some(0)).unwrap();

        let mut analyzer = ConflictAnalyzer::new(4);
        let analysis = analyzer.analyze(1, &store, &trail).unwrap();
        assert_eq!(vec![Literal(-4), Literal(-1)], analysis.learned);
        assert_eq!(1, analysis.backjump_level);
    }

    #[test]
    fn uip_can_be_the_decision() {
        let mut store = ClauseStore::new();
        store.add(clause(&[2, -1]));
        store.add(clause(&[3, -1]));
        store.add(clause(&[-2, -3, -4]));

        let mut trail = Trail::new();
        trail.decide(Literal(4)).unwrap();
        trail.decide(Literal(1)).unwrap();
        trail.push(Literal(2), 2, Some(0)).unwrap();
        trail.push(Literal(3), 2, Some(1)).unwrap();

        let mut analyzer = ConflictAnalyzer::new(4);
        let analysis = analyzer.analyze(2, &store, &trail).unwrap();
        assert_eq!(vec![Literal(-1), Literal(-4)], analysis.learned);
        assert_eq!(1, analysis.backjump_level);
        let mut involved = analysis.involved.clone();
        involved.sort();
        assert_eq!(vec![1, 2, 3, 4], involved);
    }

    #[test]
    fn level_zero_literals_are_dropped() {
        let mut store = ClauseStore::new();
        store.add(clause(&[1]));
        store.add(clause(&[-1, -2, 3]));
        store.add(clause(&[-3, -1]));

        let mut trail = Trail::new();
        trail.push(Literal(1), 0, Some(0)).unwrap();
        trail.decide(Literal(2)).unwrap();
        trail.push(Literal(3), 1, Some(1)).unwrap();

        let mut analyzer = ConflictAnalyzer::new(3);
        let analysis = analyzer.analyze(2, &store, &trail).unwrap();
        assert_eq!(vec![Literal(-3)], analysis.learned);
        assert_eq!(0, analysis.backjump_level);
    }

    #[test]
    fn rejects_analysis_at_root() {
        let mut store = ClauseStore::new();
        store.add(clause(&[-1]));
        let mut trail = Trail::new();
        trail.push(Literal(1), 0, None).unwrap();
        let mut analyzer = ConflictAnalyzer::new(1);
        assert!(analyzer.analyze(0, &store, &trail).is_err());
    }
}
