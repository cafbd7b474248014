//! Error taxonomy for the encoding pipeline.
//!
//! Structural failures abort the run that raised them and leave the FSM
//! untouched — no state code is written unless the whole pipeline completed.
//! A negative steady-state entry is deliberately *not* in this enum: it is a
//! warning-level condition reported through
//! [`TransitionModel::non_physical`](crate::estimator::TransitionModel::non_physical)
//! and a `tracing` warning, and the run continues with the raw value.

use thiserror::Error;

/// Errors raised by the probability estimator, the linear-algebra kernel and
/// the two encoders.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The textual FSM description could not be parsed.
    #[error("parse error at line {line}: {reason}")]
    Parse {
        /// 1-based line number in the input text.
        line: usize,
        /// Human-readable description of what went wrong.
        reason: String,
    },

    /// A state has no outgoing transition, so its row of the conditional
    /// transition-probability matrix would sum to zero.
    #[error("state `{state}` has no outgoing transition")]
    DeadEndState {
        /// Name of the offending state.
        state: String,
    },

    /// A state has no incoming transition, so its column of the conditional
    /// transition-probability matrix sums to zero.
    #[error("state `{state}` is unreachable (no incoming transition)")]
    UnreachableState {
        /// Name of the offending state.
        state: String,
    },

    /// The linear system for the steady-state probabilities cannot be
    /// inverted: an entire pivot column went numerically to zero during
    /// LU elimination.
    #[error("singular matrix while solving the steady-state equations")]
    SingularMatrix,

    /// A kernel operation was called with incompatible matrix shapes.
    #[error("matrix dimension mismatch: {left_rows}x{left_cols} against {right_rows}x{right_cols}")]
    DimensionMismatch {
        /// Rows of the left operand.
        left_rows: usize,
        /// Columns of the left operand.
        left_cols: usize,
        /// Rows of the right operand.
        right_rows: usize,
        /// Columns of the right operand.
        right_cols: usize,
    },

    /// The exhaustive encoder refused to start: the number of candidate code
    /// assignments exceeds the configured limit.
    #[error("exhaustive search too large: {assignments} candidate assignments exceed the limit of {limit}")]
    SearchTooLarge {
        /// Number of injective code assignments the search would visit
        /// (`u128::MAX` when the true count overflows even a u128).
        assignments: u128,
        /// The configured ceiling.
        limit: u128,
    },
}
