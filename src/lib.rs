#[macro_use]
extern crate log;
extern crate priority_queue;
extern crate thiserror;
extern crate vec_map;

pub mod analyze;
pub mod clause;
pub mod decision_provider;
pub mod error;
pub mod literal;
pub mod model;
pub mod parser;
pub mod solver;
pub mod trail;
pub mod watch;

pub use error::SolverError;
pub use model::Model;
pub use solver::{Solver, SolverConfig, SolverResult, SolverStats};
