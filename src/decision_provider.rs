use std::cmp::Ordering;
use std::fmt;

use priority_queue::PriorityQueue;
use vec_map::VecMap;

use crate::literal::{Literal, VariableName};
use crate::trail::Trail;

const RESCALE_LIMIT: f64 = 1e100;

/// Activity of a variable; ties go to the lower variable id.
#[derive(Debug, Copy, Clone, PartialEq)]
struct VariablePriority(f64, VariableName);

impl Eq for VariablePriority {}

impl PartialOrd for VariablePriority {
    fn partial_cmp(&self, other: &VariablePriority) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VariablePriority {
    fn cmp(&self, other: &VariablePriority) -> Ordering {
        self.0
            .partial_cmp(&other.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.1.cmp(&self.1))
    }
}

/// VSIDS decision heuristic. Unassigned variables are always in `queue`;
/// assigned ones are dropped lazily when they surface at the top.
pub struct DecisionProvider {
    queue: PriorityQueue<VariableName, VariablePriority>,
    activity: VecMap<f64>,
    /// Positive minus negative occurrences in the original clauses.
    polarity: VecMap<i64>,
    increment: f64,
    decay: f64,
}

impl fmt::Debug for DecisionProvider {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "DecisionProvider({} queued, increment {})",
            self.queue.len(),
            self.increment
        )
    }
}

impl DecisionProvider {
    pub fn new(num_vars: usize, decay: f64) -> DecisionProvider {
        let mut provider = DecisionProvider {
            queue: PriorityQueue::new(),
            activity: VecMap::with_capacity(num_vars + 1),
            polarity: VecMap::with_capacity(num_vars + 1),
            increment: 1.0,
            decay,
        };
        for var in 1..=num_vars {
            provider.activity.insert(var, 0.0);
            provider.polarity.insert(var, 0);
            provider.queue.push(var, VariablePriority(0.0, var));
        }
        provider
    }

    pub fn new_clause(&mut self, literals: &[Literal]) {
        for literal in literals {
            if let Some(count) = self.polarity.get_mut(literal.var()) {
                *count += if literal.sign() { 1 } else { -1 };
            }
        }
    }

    /// Pops variables until an unassigned one turns up and returns it with
    /// its preferred polarity.
    pub fn get_next(&mut self, trail: &Trail) -> Option<Literal> {
        while let Some((var, _)) = self.queue.pop() {
            if trail.value(var).is_none() {
                let positive = self.polarity.get(var).map_or(false, |count| *count > 0);
                return Some(Literal::from_var(var, positive));
            }
        }
        None
    }

    pub fn unset(&mut self, var: VariableName) {
        let priority = self.priority(var);
        self.queue.push(var, priority);
    }

    pub fn bump(&mut self, var: VariableName) {
        let rescale = match self.activity.get_mut(var) {
            Some(activity) => {
                *activity += self.increment;
                *activity > RESCALE_LIMIT
            }
            None => return,
        };
        if rescale {
            self.rescale();
        } else {
            let priority = self.priority(var);
            self.queue.change_priority(&var, priority);
        }
    }

    /// Called once per conflict; later bumps weigh more than earlier ones.
    pub fn decay(&mut self) {
        self.increment /= self.decay;
        if self.increment > RESCALE_LIMIT {
            self.rescale();
        }
    }

    pub fn activity(&self, var: VariableName) -> f64 {
        self.activity.get(var).cloned().unwrap_or(0.0)
    }

    fn priority(&self, var: VariableName) -> VariablePriority {
        VariablePriority(self.activity(var), var)
    }

    fn rescale(&mut self) {
        trace!("Rescaling variable activities");
        for (_, activity) in self.activity.iter_mut() {
            *activity /= RESCALE_LIMIT;
        }
        self.increment /= RESCALE_LIMIT;
        let vars: Vec<VariableName> = self.activity.keys().collect();
        for var in vars {
            let priority = self.priority(var);
            self.queue.change_priority(&var, priority);
        }
    }
}
