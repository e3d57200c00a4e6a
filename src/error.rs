use thiserror::Error;

#[derive(Error, Debug)]
pub enum BjError {
    #[error("Probability mass invariant violated for upcard {upcard}: outcomes sum to {mass}")]
    ProbabilityMass { upcard: u8, mass: f64 },

    #[error("Value iteration did not converge after {sweeps} sweeps (delta {delta:.3e}, theta {theta:.3e})")]
    NotConverged { sweeps: usize, delta: f64, theta: f64 },

    #[error("Search node at depth {depth} is not terminal but has nothing to expand")]
    NoExpansion { depth: usize },

    #[error("Rollout did not terminate within {0} steps")]
    RolloutLimit(usize),

    #[error("Invalid composition row {row}: {reason}")]
    InvalidTable { row: usize, reason: String },

    #[error("Composition table must hold {expected} values, got {got}")]
    TableShape { expected: usize, got: usize },

    #[error("Temperature bucket {0} was never observed while sampling")]
    EmptyBucket(usize),

    #[error("Invalid card rank: {0}")]
    InvalidCard(u8),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Counting mode needs a deck composition table")]
    MissingTable,

    #[error("Cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type BjResult<T> = Result<T, BjError>;
