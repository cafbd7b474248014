//! The weighted state-transition graph and code-class partitioner.
//!
//! [`Stg`] is the working structure of the greedy encoder: a symmetric
//! pairwise weight matrix over states, an edge list in insertion order, one
//! partial code per state, and the equivalence classes of states that still
//! share an identical partial code.
//!
//! Nodes are state indices into the owning [`Fsm`](crate::fsm::Fsm)'s
//! arena; edges and class membership are stored as index pairs and index
//! lists, never as references into growing collections.
//!
//! # Invariants
//!
//! - An edge exists for every unordered state pair `(i, j)`, `i ≠ j`, with
//!   `total[i][j] + total[j][i] > 0`; its weight is that sum. No
//!   self-loop edges.
//! - The edge list stays in insertion order (ascending pair index) for the
//!   lifetime of the graph; weight-ordered traversal goes through
//!   [`Stg::edges_by_weight`], whose stable sort makes ties fall back to
//!   insertion order.
//! - Partial codes are only ever written left to right: once a bit position
//!   is set it is never reset within one encoding run.

use crate::matrix::Matrix;

// ─── Bit ────────────────────────────────────────────────────────────────────

/// One position of a partial state code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bit {
    /// Assigned 0.
    Zero,
    /// Assigned 1.
    One,
    /// Not yet assigned.
    Unassigned,
}

impl Bit {
    /// The opposite assigned value. Panics on [`Bit::Unassigned`] — callers
    /// only complement decided bits.
    pub fn complement(self) -> Bit {
        match self {
            Bit::Zero => Bit::One,
            Bit::One => Bit::Zero,
            Bit::Unassigned => unreachable!("complement of an unassigned bit"),
        }
    }

    /// Character form: `'0'`, `'1'`, or `'x'` while unassigned.
    pub fn to_char(self) -> char {
        match self {
            Bit::Zero => '0',
            Bit::One => '1',
            Bit::Unassigned => 'x',
        }
    }
}

/// Hamming distance between two partial codes.
///
/// Positions are compared as three-valued symbols: `Unassigned` equals
/// `Unassigned` and differs from both assigned values. Since the encoder
/// assigns bit positions in lockstep across all states, in practice either
/// both positions are decided or neither is.
pub fn partial_hamming(a: &[Bit], b: &[Bit]) -> usize {
    a.iter().zip(b.iter()).filter(|(x, y)| x != y).count()
}

// ─── Edge / Stg ─────────────────────────────────────────────────────────────

/// An undirected weighted edge between two state indices.
#[derive(Clone, Copy, Debug)]
pub struct Edge {
    /// Lower state index.
    pub a: usize,
    /// Higher state index.
    pub b: usize,
    /// Combined coupling weight, mutated as encoding progresses.
    pub weight: f64,
}

/// The state-transition graph worked on by the greedy encoder.
#[derive(Clone, Debug)]
pub struct Stg {
    num_nodes: usize,
    code_length: usize,
    /// Symmetric pairwise weights (diagonal unused by the encoder).
    weights: Matrix,
    /// Edges in insertion order: ascending `(a, b)`, `a < b`.
    edges: Vec<Edge>,
    /// Per-state partial code, `code_length` positions each.
    codes: Vec<Vec<Bit>>,
    /// Class id per state, rebuilt by [`Stg::partition_classes`].
    class_of: Vec<usize>,
    num_classes: usize,
}

impl Stg {
    /// Build the graph from a total transition-probability matrix.
    ///
    /// `total` must be `n × n`; the graph gets one node per state, all codes
    /// fully unassigned, and one edge per coupled unordered pair.
    pub fn from_total_probability(total: &Matrix, code_length: usize) -> Self {
        let n = total.rows();
        let mut weights = Matrix::zeros(n, n);
        for i in 0..n {
            for j in 0..n {
                let w = total[(i, j)] + total[(j, i)];
                if w > 0.0 {
                    weights[(i, j)] = w;
                }
            }
        }

        let mut edges = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                if weights[(i, j)] > 0.0 {
                    edges.push(Edge {
                        a: i,
                        b: j,
                        weight: weights[(i, j)],
                    });
                }
            }
        }

        Self {
            num_nodes: n,
            code_length,
            weights,
            edges,
            codes: vec![vec![Bit::Unassigned; code_length]; n],
            class_of: vec![0; n],
            num_classes: if n == 0 { 0 } else { 1 },
        }
    }

    /// Number of nodes (states).
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Target code length.
    pub fn code_length(&self) -> usize {
        self.code_length
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// The edge list in insertion order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Current pairwise weight between two states.
    pub fn weight(&self, i: usize, j: usize) -> f64 {
        self.weights[(i, j)]
    }

    /// The partial code of a state.
    pub fn code(&self, i: usize) -> &[Bit] {
        &self.codes[i]
    }

    /// Bit of state `i` at position `pos`.
    pub fn bit(&self, i: usize, pos: usize) -> Bit {
        self.codes[i][pos]
    }

    /// Assign one code position. Assigned positions are never overwritten.
    pub fn set_bit(&mut self, i: usize, pos: usize, value: Bit) {
        debug_assert_eq!(
            self.codes[i][pos],
            Bit::Unassigned,
            "bit positions are write-once per run"
        );
        self.codes[i][pos] = value;
    }

    /// The assigned code of a state as a `String` over `{'0', '1'}`.
    ///
    /// Call only after the final bit round, when every position is decided.
    pub fn code_string(&self, i: usize) -> String {
        self.codes[i].iter().map(|b| b.to_char()).collect()
    }

    // ── Classes ────────────────────────────────────────────────────────────

    /// Recompute equivalence classes from the current partial codes.
    ///
    /// For increasing state index, a state joins the class of the first
    /// earlier state with an identical partial code (Hamming distance 0),
    /// or starts a new class. Deterministic given the state ordering.
    pub fn partition_classes(&mut self) {
        self.num_classes = 0;
        for i in 0..self.num_nodes {
            let mut assigned = false;
            for j in 0..i {
                if partial_hamming(&self.codes[i], &self.codes[j]) == 0 {
                    self.class_of[i] = self.class_of[j];
                    assigned = true;
                    break;
                }
            }
            if !assigned {
                self.class_of[i] = self.num_classes;
                self.num_classes += 1;
            }
        }
    }

    /// Class id of a state, per the most recent partition.
    pub fn class_of(&self, i: usize) -> usize {
        self.class_of[i]
    }

    /// Number of classes in the most recent partition.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Count the members of `class` holding `Zero` / `One` at `pos`,
    /// skipping any state listed in `exclude`.
    pub fn class_bit_counts(
        &self,
        class: usize,
        pos: usize,
        exclude: &[usize],
    ) -> (usize, usize) {
        let mut zeros = 0;
        let mut ones = 0;
        for i in 0..self.num_nodes {
            if self.class_of[i] != class || exclude.contains(&i) {
                continue;
            }
            match self.codes[i][pos] {
                Bit::Zero => zeros += 1,
                Bit::One => ones += 1,
                Bit::Unassigned => {}
            }
        }
        (zeros, ones)
    }

    // ── Weight-ordered traversal and the decay rule ────────────────────────

    /// Edge indices sorted by weight, descending.
    ///
    /// The sort is stable, so equal-weight edges keep their insertion order
    /// (ascending state-pair index) — this is what makes repeated runs
    /// reproduce identical codes.
    pub fn edges_by_weight(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.edges.len()).collect();
        order.sort_by(|&x, &y| {
            self.edges[y]
                .weight
                .partial_cmp(&self.edges[x].weight)
                .unwrap_or(core::cmp::Ordering::Equal)
        });
        order
    }

    /// Rescale every pairwise weight and edge weight by
    /// `partial_hamming(code_i, code_j) + 1`.
    ///
    /// Applied after each bit round. Pairs that have already diverged have
    /// their coupling *amplified*, not damped — that is the heuristic's
    /// defined behaviour and is kept exactly as published.
    pub fn rescale_weights_by_distance(&mut self) {
        for i in 0..self.num_nodes {
            for j in 0..self.num_nodes {
                let factor = (partial_hamming(&self.codes[i], &self.codes[j]) + 1) as f64;
                self.weights[(i, j)] *= factor;
            }
        }
        for e in &mut self.edges {
            let factor = (partial_hamming(&self.codes[e.a], &self.codes[e.b]) + 1) as f64;
            e.weight *= factor;
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
