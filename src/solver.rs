use std::time::Duration;
use std::time::Instant;

use crate::analyze::ConflictAnalyzer;
use crate::clause::{Clause, ClauseId, ClauseStore, WatchedUpdate};
use crate::decision_provider::DecisionProvider;
use crate::error::SolverError;
use crate::literal::{Literal, MAX_VARIABLE};
use crate::model::Model;
use crate::parser::Dimacs;
use crate::trail::Trail;
use crate::watch::WatchIndex;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SolverResult {
    Sat(Model),
    Unsat,
    /// The conflict budget ran out before a verdict was reached.
    Unknown,
}

impl SolverResult {
    pub fn is_sat(&self) -> bool {
        match self {
            SolverResult::Sat(_) => true,
            _ => false,
        }
    }

    pub fn model(&self) -> Option<&Model> {
        match self {
            SolverResult::Sat(model) => Some(model),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Stop with `Unknown` once this many conflicts have been analysed.
    pub conflict_limit: Option<u64>,
    /// VSIDS activity decay, in `(0, 1]`.
    pub var_decay: f64,
}

impl Default for SolverConfig {
    fn default() -> SolverConfig {
        SolverConfig {
            conflict_limit: None,
            var_decay: 0.95,
        }
    }
}

impl SolverConfig {
    pub fn conflict_limit(mut self, limit: u64) -> SolverConfig {
        self.conflict_limit = Some(limit);
        self
    }

    pub fn var_decay(mut self, decay: f64) -> SolverConfig {
        self.var_decay = decay;
        self
    }

    fn validate(&self) -> Result<(), SolverError> {
        // Also rejects NaN.
        if !(self.var_decay > 0.0 && self.var_decay <= 1.0) {
            return Err(SolverError::InvalidConfig(format!(
                "var_decay {} is outside (0, 1]",
                self.var_decay
            )));
        }
        Ok(())
    }
}

/// Variable count implied by the largest literal magnitude.
fn widest_variable(clauses: &[Vec<i64>]) -> Result<usize, SolverError> {
    let widest = clauses
        .iter()
        .flat_map(|clause| clause.iter())
        .max_by_key(|num| num.unsigned_abs());
    match widest {
        Some(&literal) if literal.unsigned_abs() > MAX_VARIABLE as u64 => {
            Err(SolverError::VariableOutOfRange {
                literal,
                num_vars: MAX_VARIABLE,
            })
        }
        Some(&literal) => Ok(literal.unsigned_abs() as usize),
        None => Ok(0),
    }
}

#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    pub clauses: u64,
    pub literals: u64,
    pub decisions: u64,
    pub propagations: u64,
    pub conflicts: u64,
    pub learned: u64,
    pub max_level: usize,
    pub init_time: Duration,
    pub solve_time: Duration,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
enum State {
    Decide,
    Propagate,
    Conflict(ClauseId),
}

#[derive(Debug)]
pub struct Solver {
    num_vars: usize,
    clauses: ClauseStore,
    watches: WatchIndex,
    trail: Trail,
    analyzer: ConflictAnalyzer,
    decisions: DecisionProvider,
    config: SolverConfig,
    trivially_unsat: bool,
    /// Set while a conflicting clause awaits analysis.
    in_conflict: bool,
    stats: SolverStats,
}

impl Solver {
    //
    // Initialisation
    //

    /// Builds a solver over the variables mentioned in `clauses`.
    pub fn new(clauses: Vec<Vec<i64>>) -> Result<Solver, SolverError> {
        Solver::build(None, clauses, SolverConfig::default())
    }

    pub fn with_variables(num_vars: usize, clauses: Vec<Vec<i64>>) -> Result<Solver, SolverError> {
        Solver::build(Some(num_vars), clauses, SolverConfig::default())
    }

    pub fn from_dimacs(dimacs: Dimacs) -> Result<Solver, SolverError> {
        Solver::build(dimacs.num_vars, dimacs.clauses, SolverConfig::default())
    }

    pub fn build(
        num_vars: Option<usize>,
        clauses: Vec<Vec<i64>>,
        config: SolverConfig,
    ) -> Result<Solver, SolverError> {
        let start = Instant::now();
        config.validate()?;
        let num_vars = match num_vars {
            Some(num_vars) if num_vars > MAX_VARIABLE => {
                return Err(SolverError::TooManyVariables {
                    num_vars,
                    max: MAX_VARIABLE,
                });
            }
            Some(num_vars) => num_vars,
            None => widest_variable(&clauses)?,
        };
        let mut solver = Solver {
            num_vars,
            clauses: ClauseStore::new(),
            watches: WatchIndex::new(),
            trail: Trail::new(),
            analyzer: ConflictAnalyzer::new(num_vars),
            decisions: DecisionProvider::new(num_vars, config.var_decay),
            config,
            trivially_unsat: false,
            in_conflict: false,
            stats: SolverStats::default(),
        };
        for literals in clauses {
            solver.add_clause(literals)?;
        }
        solver.stats.init_time += start.elapsed();
        Ok(solver)
    }

    /// Replaces the configuration. Meant to be called before `solve`, as it
    /// resets the decision heuristic.
    pub fn with_config(mut self, config: SolverConfig) -> Result<Solver, SolverError> {
        config.validate()?;
        self.decisions = DecisionProvider::new(self.num_vars, config.var_decay);
        for clause in self.clauses.originals() {
            self.decisions.new_clause(clause.literals());
        }
        self.config = config;
        Ok(self)
    }

    fn add_clause(&mut self, literals: Vec<i64>) -> Result<(), SolverError> {
        self.stats.clauses += 1;
        self.stats.literals += literals.len() as u64;
        let clause = Clause::new(self.clauses.count(), literals, self.num_vars)?;
        self.decisions.new_clause(clause.literals());
        let watched = clause.watched_literals();
        let unit = if clause.len() == 1 {
            Some(clause.literals()[0])
        } else {
            None
        };
        let empty = clause.is_empty();
        let id = self.clauses.add(clause);

        if empty {
            debug!("Clause {} is empty", id);
            self.trivially_unsat = true;
        } else if let Some(literal) = unit {
            self.check_initial_unit(id, literal)?;
        } else if let Some((lit_a, lit_b)) = watched {
            self.watches.register(id, lit_a, lit_b);
        }
        Ok(())
    }

    fn check_initial_unit(&mut self, id: ClauseId, literal: Literal) -> Result<(), SolverError> {
        match self.trail.value_of(literal) {
            Some(true) => Ok(()),
            Some(false) => {
                debug!("Unit clause {} contradicts an earlier unit", id);
                self.trivially_unsat = true;
                Ok(())
            }
            None => self.trail.push(literal, 0, Some(id)),
        }
    }

    //
    // Main loop
    //

    pub fn solve(&mut self) -> Result<SolverResult, SolverError> {
        let start = Instant::now();
        let result = self.internal_solve();
        self.stats.solve_time += start.elapsed();
        debug!("{:?}", self.stats);
        result
    }

    fn internal_solve(&mut self) -> Result<SolverResult, SolverError> {
        if self.trivially_unsat {
            debug!("Trivially unsat");
            return Ok(SolverResult::Unsat);
        }
        debug!("Start loop");
        let mut state = State::Propagate;
        loop {
            state = match state {
                State::Propagate => match self.unit_propagate()? {
                    None => State::Decide,
                    Some(conflict) => State::Conflict(conflict),
                },
                State::Decide => match self.decisions.get_next(&self.trail) {
                    None => {
                        debug!("Formula is sat");
                        return self.model().map(SolverResult::Sat);
                    }
                    Some(literal) => {
                        self.stats.decisions += 1;
                        self.trail.decide(literal)?;
                        if self.trail.decision_level() > self.stats.max_level {
                            self.stats.max_level = self.trail.decision_level();
                        }
                        debug!("Decide {:?} at level {}", literal, self.trail.decision_level());
                        State::Propagate
                    }
                },
                State::Conflict(conflict) => {
                    self.in_conflict = true;
                    if self.trail.decision_level() == 0 {
                        debug!("Conflict in clause {} at level 0", conflict);
                        self.trivially_unsat = true;
                        return Ok(SolverResult::Unsat);
                    }
                    self.stats.conflicts += 1;
                    if let Some(limit) = self.config.conflict_limit {
                        if self.stats.conflicts > limit {
                            debug!("Conflict limit {} reached", limit);
                            self.backtrack(0);
                            self.in_conflict = false;
                            return Ok(SolverResult::Unknown);
                        }
                    }
                    self.learn(conflict)?;
                    self.in_conflict = false;
                    State::Propagate
                }
            };
        }
    }

    fn model(&self) -> Result<Model, SolverError> {
        (1..=self.num_vars)
            .map(|var| {
                self.trail.value(var).ok_or_else(|| {
                    SolverError::Internal(format!("variable {} unassigned at sat", var))
                })
            })
            .collect::<Result<Vec<bool>, SolverError>>()
            .map(Model::new)
    }

    //
    // Conflict analysis and backjumping
    //

    fn learn(&mut self, conflict: ClauseId) -> Result<(), SolverError> {
        let analysis = self.analyzer.analyze(conflict, &self.clauses, &self.trail)?;
        for var in &analysis.involved {
            self.decisions.bump(*var);
        }
        self.decisions.decay();

        let level = analysis.backjump_level;
        debug!(
            "Conflict in clause {} at level {}: learned {:?}, backjump to {}",
            conflict,
            self.trail.decision_level(),
            analysis.learned,
            level
        );
        self.backtrack(level);

        let asserting = analysis.learned[0];
        let clause = Clause::from_literals(analysis.learned);
        let watched = clause.watched_literals();
        let id = self.clauses.add_learned(clause);
        if let Some((lit_a, lit_b)) = watched {
            self.watches.register(id, lit_a, lit_b);
        }
        self.stats.learned += 1;
        self.trail.push(asserting, level, Some(id))
    }

    /// Pops the trail down to `level`. Watches need no repair: a watched
    /// literal that becomes unassigned is live again.
    fn backtrack(&mut self, level: usize) {
        for literal in self.trail.pop_to(level) {
            self.decisions.unset(literal.var());
        }
    }

    //
    // Unit Propagation
    //

    /// Propagates queued trail literals, oldest first, and returns the first
    /// conflicting clause found.
    fn unit_propagate(&mut self) -> Result<Option<ClauseId>, SolverError> {
        trace!("BCP");
        while let Some(propagate) = self.trail.next_unpropagated() {
            self.stats.propagations += 1;
            let falsified = !propagate;
            for id in self.watches.watchers_of(falsified).to_vec() {
                let clause = self
                    .clauses
                    .get_mut(id)
                    .ok_or_else(|| SolverError::Internal(format!("stale watch on clause {}", id)))?;
                let update_result = clause.propagate(falsified, self.trail.assigns())?;
                trace!(
                    "propagate {:?} to {:?} yielded {:?}",
                    propagate,
                    clause,
                    update_result
                );
                match update_result {
                    WatchedUpdate::NoChange => {}
                    WatchedUpdate::Conflict => return Ok(Some(id)),
                    WatchedUpdate::NowUnit(literal) => {
                        let level = self.trail.decision_level();
                        self.trail.push(literal, level, Some(id))?;
                    }
                    WatchedUpdate::NewWatched(literal) => {
                        self.watches.move_watch(id, falsified, literal)?;
                    }
                }
            }
        }
        Ok(None)
    }

    //
    // Inspection
    //

    pub fn num_vars(&self) -> usize {
        self.num_vars
    }

    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    pub fn learned_clauses(&self) -> Vec<Vec<i64>> {
        self.clauses
            .iter()
            .skip(self.clauses.original_count())
            .map(|(_, clause)| clause.literals().iter().map(|literal| literal.0).collect())
            .collect()
    }

    /// Audits the trail and the watch index.
    pub fn check_invariants(&self) -> Result<(), SolverError> {
        let mut previous_level = 0;
        let mut assigned = vec![false; self.num_vars + 1];
        for entry in self.trail.entries() {
            let var = entry.literal.var();
            if entry.level < previous_level {
                return Err(SolverError::Internal(format!(
                    "trail level drops at {:?}",
                    entry
                )));
            }
            if entry.level > self.trail.decision_level() {
                return Err(SolverError::Internal(format!(
                    "{:?} lies above the current level {}",
                    entry,
                    self.trail.decision_level()
                )));
            }
            if var > self.num_vars || assigned[var] {
                return Err(SolverError::Internal(format!(
                    "variable {} assigned twice or out of range",
                    var
                )));
            }
            if self.trail.value_of(entry.literal) != Some(true) {
                return Err(SolverError::Internal(format!(
                    "{:?} disagrees with the assignment",
                    entry
                )));
            }
            assigned[var] = true;
            previous_level = entry.level;
        }

        let mut watched_clauses = 0;
        for (id, clause) in self.clauses.iter() {
            let (lit_a, lit_b) = match clause.watched_literals() {
                Some(pair) => pair,
                None => continue,
            };
            watched_clauses += 1;
            if !self.watches.is_watching(id, lit_a) || !self.watches.is_watching(id, lit_b) {
                return Err(SolverError::Internal(format!(
                    "clause {} {:?} is not watched on its first two literals",
                    id, clause
                )));
            }
            if self.trail.is_propagated()
                && !self.in_conflict
                && !clause.is_satisfied(self.trail.assigns()) {
                let live = |literal: Literal| self.trail.value_of(literal) != Some(false);
                if !live(lit_a) && !live(lit_b) {
                    return Err(SolverError::Internal(format!(
                        "clause {} {:?} has no live watch after propagation",
                        id, clause
                    )));
                }
            }
        }
        if self.watches.len() != 2 * watched_clauses {
            return Err(SolverError::Internal(format!(
                "{} watches for {} watched clauses",
                self.watches.len(),
                watched_clauses
            )));
        }
        Ok(())
    }

    #[cfg(test)]
    fn level_of(&self, var: usize) -> Option<usize> {
        self.trail.level_of(var)
    }
}
