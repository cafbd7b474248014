//! Markov-chain transition-probability estimation and switching activity.
//!
//! The estimator turns an FSM's raw transition list into a steady-state-
//! weighted probability model in three steps:
//!
//! ```text
//! Fsm ──► conditional matrix ──► steady-state vector ──► total matrix
//!         (row-stochastic,       (least-squares of the   total[i][j] =
//!          2^d weight per         Markov balance          cond[i][j] ·
//!          don't-care bit)        equations)              steady[i]
//! ```
//!
//! # Invariants
//!
//! - Every row of a successfully built conditional matrix sums to 1. An
//!   all-zero row (dead-end state) or all-zero column (unreachable state) is
//!   a build failure, detected before any normalisation — no partial matrix
//!   escapes.
//! - The steady-state vector sums to 1. Entries are *expected* non-negative,
//!   but a machine that violates the Markov model's irreducibility
//!   assumption can produce negative entries; those are reported through
//!   [`TransitionModel::non_physical`] and a `tracing` warning, never
//!   clamped or silently dropped.

use tracing::{debug, warn};

use crate::error::EncodeError;
use crate::fsm::Fsm;
use crate::matrix::Matrix;

/// Decimal digits used by [`probability_dump`].
const DUMP_DECIMALS: usize = 4;

// ─── TransitionModel ────────────────────────────────────────────────────────

/// The complete probability model for one machine.
#[derive(Clone, Debug)]
pub struct TransitionModel {
    /// Row-stochastic conditional transition probabilities.
    pub conditional: Matrix,
    /// Markov steady-state distribution, one entry per state.
    pub steady_state: Vec<f64>,
    /// Total transition probabilities:
    /// `total[i][j] = conditional[i][j] · steady_state[i]`.
    pub total: Matrix,
    /// Indices of states whose steady-state entry came out negative.
    ///
    /// Non-empty means the machine's transition structure is not
    /// irreducible and the Markov model's assumptions are violated; the
    /// computation continued with the raw values, so downstream results
    /// should be treated with suspicion.
    pub non_physical: Vec<usize>,
}

/// Build the conditional transition-probability matrix of a machine.
///
/// Each transition with `d` don't-care input bits contributes weight `2^d`
/// to `matrix[current][next]`; every row is then normalised by its sum.
///
/// Fails with [`EncodeError::UnreachableState`] when a column sums to zero
/// and [`EncodeError::DeadEndState`] when a row does — both checks run over
/// the raw weights, before normalisation.
pub fn conditional_matrix(fsm: &Fsm) -> Result<Matrix, EncodeError> {
    let n = fsm.num_states();
    let mut prob = Matrix::zeros(n, n);

    for t in fsm.transitions() {
        // Weight in f64 from the start: wide input patterns can carry far
        // more don't-care bits than any integer width holds.
        let dont_cares = t.input.chars().filter(|&c| c == '-').count();
        prob[(t.current, t.next)] += 2f64.powi(dont_cares as i32);
    }

    for j in 0..n {
        let col_sum: f64 = (0..n).map(|i| prob[(i, j)]).sum();
        if col_sum == 0.0 {
            return Err(EncodeError::UnreachableState {
                state: fsm.state(j).name.clone(),
            });
        }
    }

    for i in 0..n {
        let row_sum: f64 = (0..n).map(|j| prob[(i, j)]).sum();
        if row_sum == 0.0 {
            return Err(EncodeError::DeadEndState {
                state: fsm.state(i).name.clone(),
            });
        }
    }

    for i in 0..n {
        let row_sum: f64 = (0..n).map(|j| prob[(i, j)]).sum();
        for j in 0..n {
            prob[(i, j)] /= row_sum;
        }
    }

    Ok(prob)
}

/// Solve for the Markov steady-state distribution of a conditional matrix.
///
/// Forms `B = pad(conditional)` (shape `n × (n+1)`), computes `B · Bᵗ`,
/// inverts it, and back-projects a unit impulse through `Bᵗ` and the
/// inverse. This is the normal-equations solution of the homogeneous
/// balance equations `π(P − I) = 0` augmented with the normalisation
/// constraint `π · 1 = 1`.
///
/// The second element of the returned pair lists the indices of any
/// negative entries (see [`TransitionModel::non_physical`]).
pub fn steady_state(conditional: &Matrix) -> Result<(Vec<f64>, Vec<usize>), EncodeError> {
    let n = conditional.rows();
    let b = conditional.pad();
    let bt = b.transpose();
    let normal = b.multiply(&bt)?;
    let inverse = normal.invert()?;

    // Unit impulse on the constraint row, pushed back through Bᵗ.
    let mut impulse = vec![0.0; n + 1];
    impulse[n] = 1.0;
    let mut projected = vec![0.0; n];
    for i in 0..n {
        for (j, w) in impulse.iter().enumerate() {
            projected[i] += w * bt[(j, i)];
        }
    }

    let mut steady = vec![0.0; n];
    for i in 0..n {
        for j in 0..n {
            steady[i] += projected[j] * inverse[(j, i)];
        }
    }

    let mut non_physical = Vec::new();
    for (i, &p) in steady.iter().enumerate() {
        if p < 0.0 {
            warn!(state = i, probability = p, "negative steady-state probability; the machine is not irreducible");
            non_physical.push(i);
        }
    }

    Ok((steady, non_physical))
}

/// Build the full [`TransitionModel`] for a machine.
///
/// Propagates any failure from [`conditional_matrix`] or [`steady_state`]
/// unchanged.
pub fn transition_model(fsm: &Fsm) -> Result<TransitionModel, EncodeError> {
    let n = fsm.num_states();
    let conditional = conditional_matrix(fsm)?;
    let (steady, non_physical) = steady_state(&conditional)?;

    let mut total = Matrix::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            total[(i, j)] = conditional[(i, j)] * steady[i];
        }
    }

    debug!(states = n, "transition model built");
    Ok(TransitionModel {
        conditional,
        steady_state: steady,
        total,
        non_physical,
    })
}

// ─── Switching activity ─────────────────────────────────────────────────────

/// Total expected switching activity of a fully coded machine:
/// `Σ hamming(code_i, code_j) · total[i][j]` over all ordered state pairs.
///
/// Returns `None` unless every state carries a code. The Hamming width is
/// the machine's code length.
pub fn switching_activity(fsm: &Fsm, total: &Matrix) -> Option<f64> {
    let n = fsm.num_states();
    if !fsm.fully_coded() {
        return None;
    }
    let mut activity = 0.0;
    for i in 0..n {
        for j in 0..n {
            let dist = code_hamming(fsm.code(i)?, fsm.code(j)?);
            activity += dist as f64 * total[(i, j)];
        }
    }
    Some(activity)
}

/// Hamming distance between two code strings of equal length.
fn code_hamming(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).filter(|(x, y)| x != y).count()
}

/// Render the total transition-probability matrix as text: one line per
/// state, whitespace-separated probabilities rounded to four decimals.
pub fn probability_dump(total: &Matrix) -> String {
    let mut out = String::new();
    for i in 0..total.rows() {
        let line: Vec<String> = (0..total.cols())
            .map(|j| format!("{:.*}", DUMP_DECIMALS, total[(i, j)]))
            .collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

// ─── Tests ──────────────────────────────────────────────────────────────────
