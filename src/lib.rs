//! # pow3-core
//!
//! Low-power state encoding for finite-state machines.
//!
//! ---
//!
//! ## One metric, two encoders
//!
//! A synchronous FSM spends dynamic power every time a state-register bit
//! flips. How much it flips depends entirely on *which* binary codes the
//! symbolic states receive — an assignment the logic designer is free to
//! choose. This crate estimates how often each transition is actually taken
//! and then chooses codes two different ways:
//!
//! **POW3** — a greedy heuristic after Benini et al. States are treated as
//! nodes of a weighted graph whose edge weights are steady-state transition
//! probabilities. Codes are built one bit position at a time, heaviest edge
//! first, so that strongly coupled states end up a short Hamming distance
//! apart. Runs in polynomial time and scales to real machines.
//!
//! **Exhaustive** — a brute-force baseline that enumerates every injective
//! assignment of states to codes and keeps the one minimising the peak
//! (worst-single-transition) switch count. Exact, exponential, and guarded
//! by a configurable size limit.
//!
//! The probability model treats the machine as a Markov chain: transition
//! input patterns are weighted by their don't-care multiplicity, the
//! steady-state distribution is recovered by a least-squares solve, and the
//! resulting total-probability matrix drives both the encoder weights and
//! the final expected-switching figure.
//!
//! ---
//!
//! ## The pipeline
//!
//! ```text
//! KISS2 text → Fsm → TransitionModel → Stg → POW3 codes → Fsm (coded)
//!      ↑               ↑                ↑                     ↓
//!    kiss         estimator            stg            switching_activity
//!                 (Matrix / LU)                        EncodingReport
//!
//! KISS2 text → Fsm → SwitchTable → exhaustive search → Fsm (coded)
//!                         ↑
//!                       brute
//! ```
//!
//! ## Module overview
//!
//! | Module | Key types | What it does |
//! |--------|-----------|--------------|
//! | [`fsm`] | [`Fsm`], [`fsm::State`], [`fsm::Transition`] | State arena and transition list; code-length derivation |
//! | [`kiss`] | — | KISS2-subset reader/writer, string based |
//! | [`matrix`] | [`matrix::Matrix`] | Row-major `f64` matrices; LU inversion with scaled partial pivoting |
//! | [`estimator`] | [`estimator::TransitionModel`] | Markov steady state and total transition probabilities |
//! | [`stg`] | [`stg::Stg`], [`stg::Bit`] | Weighted state-transition graph and partial codes |
//! | [`pow3`] | — | Greedy per-bit low-power code assignment |
//! | [`brute`] | [`brute::BruteForceEncoder`], [`brute::SwitchTable`] | Exhaustive minimum-peak-switch search |
//! | [`error`] | [`EncodeError`] | Failure taxonomy shared by every stage |
//! | [`report`] | [`report::EncodingReport`] | Serialisable run snapshot (requires `serde` feature) |
//!
//! ## Example
//!
//! ```rust,ignore
//! use pow3_core::{estimator, kiss, pow3};
//!
//! let mut fsm = kiss::parse(&text)?;
//! pow3::encode(&mut fsm)?;
//! let model = estimator::transition_model(&fsm)?;
//! let activity = estimator::switching_activity(&fsm, &model.total);
//! println!("{fsm}");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod brute;
pub mod error;
pub mod estimator;
pub mod fsm;
pub mod kiss;
pub mod matrix;
pub mod pow3;
pub mod stg;

#[cfg(feature = "serde")]
pub mod report;

pub use error::EncodeError;
pub use fsm::Fsm;
