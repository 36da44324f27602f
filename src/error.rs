use thiserror::Error;

/// Errors raised while building or running a solver.
///
/// Input problems are reported by the constructors; `Internal` is only ever
/// produced by a broken engine invariant and is never a verdict.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum SolverError {
    #[error("clause {clause} contains the literal 0")]
    ZeroLiteral { clause: usize },

    #[error("clause {clause} is a tautology on variable {variable}")]
    Tautology { clause: usize, variable: usize },

    #[error("literal {literal} is out of range for {num_vars} variables")]
    VariableOutOfRange { literal: i64, num_vars: usize },

    #[error("{num_vars} variables exceed the supported maximum of {max}")]
    TooManyVariables { num_vars: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal solver error: {0}")]
    Internal(String),
}
