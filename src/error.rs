use thiserror::Error;

/// Enum with all errors in this crate.
#[derive(Error, Debug)]
pub enum PairCountError {
    /// A caller-supplied argument violated a documented precondition. No
    /// partial results have been written.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// A per-bin buffer could not be allocated. The results buffer is left
    /// in an unspecified state and must be discarded.
    #[error("Allocation failed: {0}")]
    Allocation(String),

    /// The distance metric produced unusable bounds (non-finite data or an
    /// overflowing accumulator).
    #[error("Metric fault: {0}")]
    Metric(String),
}

pub type Result<T> = std::result::Result<T, PairCountError>;
