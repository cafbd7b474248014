//! The POW3 greedy bit-assignment engine.
//!
//! POW3 assigns state codes one bit position at a time, working through the
//! state-transition graph's edges in decreasing weight order so that the
//! scarce "same bit value" budget goes to the most strongly coupled state
//! pairs first. The per-class capacity constraint guarantees that every
//! state can still be disambiguated within the remaining code bits.
//!
//! For each bit position ℓ:
//!
//! 1. Recompute the equivalence classes from the current partial codes.
//! 2. Walk edges by descending weight (stable ties: insertion order).
//!    - Both endpoints undecided at ℓ: give both the [`select_bit`]
//!      preference unless that (or either value) would overfill a class —
//!      then the safe value, or, when neither value is safe, the endpoints
//!      diverge.
//!    - One endpoint undecided: it gets the preferred value when its own
//!      class has room, otherwise the complement.
//! 3. Force-fill classes that hit capacity, then any stragglers.
//! 4. Rescale all weights by `hamming + 1`.
//!
//! After `code_length` rounds every state is fully coded and the codes are
//! committed to the FSM in one pass. Any estimator failure aborts before a
//! single code is written.

use tracing::debug;

use crate::error::EncodeError;
use crate::estimator;
use crate::fsm::Fsm;
use crate::stg::{Bit, Stg};

/// Encode a machine with the POW3 heuristic.
///
/// Builds the transition-probability model, runs `code_length` bit-assignment
/// rounds over the state-transition graph, and writes the finished code of
/// every state back into `fsm`. Structural estimator failures
/// ([`EncodeError::DeadEndState`], [`EncodeError::UnreachableState`],
/// [`EncodeError::SingularMatrix`]) propagate out before any code is
/// written.
pub fn encode(fsm: &mut Fsm) -> Result<(), EncodeError> {
    let model = estimator::transition_model(fsm)?;
    let code_length = fsm.code_length();
    let mut stg = Stg::from_total_probability(&model.total, code_length);
    debug!(
        nodes = stg.num_nodes(),
        edges = stg.num_edges(),
        code_length,
        "POW3 encoding started"
    );

    for pos in 0..code_length {
        stg.partition_classes();
        assign_position(&mut stg, pos);
        stg.rescale_weights_by_distance();
    }

    for i in 0..stg.num_nodes() {
        fsm.set_code(i, stg.code_string(i));
    }
    debug!("POW3 encoding finished");
    Ok(())
}

// ─── One bit round ──────────────────────────────────────────────────────────

/// Per-class capacity at bit position `pos`: the largest number of class
/// members that may share one value and still be told apart by the
/// remaining `code_length − pos − 1` bits.
fn class_capacity(code_length: usize, pos: usize) -> usize {
    1 << (code_length - pos - 1)
}

/// Run one full assignment round for bit position `pos`.
fn assign_position(stg: &mut Stg, pos: usize) {
    let order = stg.edges_by_weight();
    for e in order {
        let (u, v) = {
            let edge = stg.edges()[e];
            (edge.a, edge.b)
        };
        match (stg.bit(u, pos), stg.bit(v, pos)) {
            (Bit::Unassigned, Bit::Unassigned) => assign_pair(stg, u, v, pos),
            (Bit::Unassigned, _) => assign_single(stg, u, v, pos),
            (_, Bit::Unassigned) => assign_single(stg, v, u, pos),
            _ => {}
        }
    }
    fill_saturated_classes(stg, pos);
    fill_stragglers(stg, pos);
}

/// Both endpoints undecided: the four-outcome case analysis.
fn assign_pair(stg: &mut Stg, u: usize, v: usize, pos: usize) {
    if stg.class_of(u) != stg.class_of(v) {
        // The pair is already distinguished at an earlier position, so no
        // shared-value budget applies between them — each endpoint only
        // answers to its own class capacity. Decide them in sequence; both
        // still land on the select_bit preference when their classes have
        // room.
        assign_single(stg, u, v, pos);
        assign_single(stg, v, u, pos);
        return;
    }
    let preferred = select_bit(stg, u, v, pos);
    let zero_violates = shared_class_violation(stg, u, v, pos, Bit::Zero);
    let one_violates = shared_class_violation(stg, u, v, pos, Bit::One);
    match (zero_violates, one_violates) {
        (false, false) => {
            stg.set_bit(u, pos, preferred);
            stg.set_bit(v, pos, preferred);
        }
        (false, true) => {
            stg.set_bit(u, pos, Bit::Zero);
            stg.set_bit(v, pos, Bit::Zero);
        }
        (true, false) => {
            stg.set_bit(u, pos, Bit::One);
            stg.set_bit(v, pos, Bit::One);
        }
        (true, true) => {
            // The pair cannot share any value: it must diverge here.
            stg.set_bit(u, pos, preferred);
            stg.set_bit(v, pos, preferred.complement());
        }
    }
}

/// One endpoint (`undecided`) still open: assign the value that keeps its
/// own class within capacity, preferring the [`select_bit`] choice.
/// Divergence from the decided endpoint is allowed — the pair is (or will
/// be) distinguished at another position.
fn assign_single(stg: &mut Stg, undecided: usize, decided: usize, pos: usize) {
    let preferred = select_bit(stg, undecided, decided, pos);
    let value = if single_violation(stg, undecided, pos, preferred)
        && !single_violation(stg, undecided, pos, preferred.complement())
    {
        preferred.complement()
    } else {
        preferred
    };
    stg.set_bit(undecided, pos, value);
}

/// Would giving `value` to *both* `u` and `v` — members of the same class —
/// overfill that class?
fn shared_class_violation(stg: &Stg, u: usize, v: usize, pos: usize, value: Bit) -> bool {
    let cap = class_capacity(stg.code_length(), pos);
    let (zeros, ones) = stg.class_bit_counts(stg.class_of(u), pos, &[u, v]);
    match value {
        Bit::Zero => zeros + 2 > cap,
        Bit::One => ones + 2 > cap,
        Bit::Unassigned => false,
    }
}

/// Would giving `value` to `node` alone overfill its class?
fn single_violation(stg: &Stg, node: usize, pos: usize, value: Bit) -> bool {
    let cap = class_capacity(stg.code_length(), pos);
    let (zeros, ones) = stg.class_bit_counts(stg.class_of(node), pos, &[node]);
    match value {
        Bit::Zero => zeros + 1 > cap,
        Bit::One => ones + 1 > cap,
        Bit::Unassigned => false,
    }
}

/// The bit value preference for a pair: the value whose cost — the combined
/// edge weight toward third states already holding the *opposite* value at
/// `pos` — is lower, with ties going to 0.
fn select_bit(stg: &Stg, u: usize, v: usize, pos: usize) -> Bit {
    let mut weight_to_zero = 0.0;
    let mut weight_to_one = 0.0;
    for t in 0..stg.num_nodes() {
        if t == u || t == v {
            continue;
        }
        match stg.bit(t, pos) {
            Bit::Zero => weight_to_zero += stg.weight(u, t) + stg.weight(v, t),
            Bit::One => weight_to_one += stg.weight(u, t) + stg.weight(v, t),
            Bit::Unassigned => {}
        }
    }
    // Assigning 0 "violates" every third state holding 1, and vice versa.
    if weight_to_one <= weight_to_zero {
        Bit::Zero
    } else {
        Bit::One
    }
}

/// For every class already at capacity on one value, force the
/// complementary value onto all still-undecided members.
fn fill_saturated_classes(stg: &mut Stg, pos: usize) {
    let cap = class_capacity(stg.code_length(), pos);
    for class in 0..stg.num_classes() {
        let (zeros, ones) = stg.class_bit_counts(class, pos, &[]);
        let forced = if zeros >= cap {
            Bit::One
        } else if ones >= cap {
            Bit::Zero
        } else {
            continue;
        };
        for i in 0..stg.num_nodes() {
            if stg.class_of(i) == class && stg.bit(i, pos) == Bit::Unassigned {
                stg.set_bit(i, pos, forced);
            }
        }
    }
}

/// Decide any state the edge walk never reached (isolated nodes, or members
/// of classes below capacity on both values): in state-index order, give it
/// the value with remaining room, preferring 0. Keeps every class within
/// capacity and guarantees a fully assigned position.
fn fill_stragglers(stg: &mut Stg, pos: usize) {
    let cap = class_capacity(stg.code_length(), pos);
    for i in 0..stg.num_nodes() {
        if stg.bit(i, pos) != Bit::Unassigned {
            continue;
        }
        let (zeros, _ones) = stg.class_bit_counts(stg.class_of(i), pos, &[]);
        let value = if zeros < cap { Bit::Zero } else { Bit::One };
        stg.set_bit(i, pos, value);
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
