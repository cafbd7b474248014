//! Serialisable snapshot of an encoding run.
//!
//! This module requires the `serde` feature. An [`EncodingReport`] captures
//! everything a downstream consumer needs to reproduce or audit an
//! assignment without re-running the encoder: the machine's shape, the
//! per-state codes, the steady-state distribution the codes were optimised
//! against, and the resulting expected switching activity.
//!
//! # Example
//!
//! ```rust,ignore
//! use pow3_core::report::EncodingReport;
//!
//! let report = EncodingReport::from_encoded(&fsm, &model);
//! let json = serde_json::to_string(&report).unwrap();
//! let restored: EncodingReport = serde_json::from_str(&json).unwrap();
//! ```

use crate::estimator::{switching_activity, TransitionModel};
use crate::fsm::Fsm;

/// Current report format version.
pub const REPORT_VERSION: u16 = 1;

/// A serialisable snapshot of one encoded machine.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct EncodingReport {
    /// Format version — always [`REPORT_VERSION`] for newly created reports.
    pub version: u16,
    /// Machine name from the description.
    pub name: String,
    /// Number of machine inputs.
    pub num_inputs: usize,
    /// Number of machine outputs.
    pub num_outputs: usize,
    /// Length of every assigned code.
    pub code_length: usize,
    /// Per-state name/code pairs, in arena order.
    pub states: Vec<StateRecord>,
    /// Steady-state probability per state, in arena order.
    pub steady_state: Vec<f64>,
    /// Expected bit switches per clock cycle under the assigned codes.
    /// `None` when any state is still uncoded.
    pub switching_activity: Option<f64>,
}

/// One state's assignment inside an [`EncodingReport`].
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, PartialEq)]
pub struct StateRecord {
    /// Symbolic state name.
    pub name: String,
    /// Assigned binary code, position `j` holding bit `2^j`. Empty for the
    /// degenerate single-state machine.
    pub code: Option<String>,
}

impl EncodingReport {
    /// Snapshot an encoded machine together with the probability model that
    /// drove the encoding.
    pub fn from_encoded(fsm: &Fsm, model: &TransitionModel) -> Self {
        Self {
            version: REPORT_VERSION,
            name: fsm.name().to_owned(),
            num_inputs: fsm.num_inputs(),
            num_outputs: fsm.num_outputs(),
            code_length: fsm.code_length(),
            states: fsm
                .states()
                .iter()
                .map(|s| StateRecord {
                    name: s.name.clone(),
                    code: s.code.clone(),
                })
                .collect(),
            steady_state: model.steady_state.clone(),
            switching_activity: switching_activity(fsm, &model.total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::transition_model;

    fn encoded_cycle() -> (Fsm, TransitionModel) {
        let mut fsm = Fsm::new("cycle3", 2, 1);
        let a = fsm.add_state("a");
        let b = fsm.add_state("b");
        let c = fsm.add_state("c");
        fsm.add_transition("0-", a, b, "1");
        fsm.add_transition("01", b, c, "0");
        fsm.add_transition("1-", c, a, "1");
        let model = transition_model(&fsm).unwrap();
        fsm.set_code(a, "00".to_owned());
        fsm.set_code(b, "01".to_owned());
        fsm.set_code(c, "10".to_owned());
        (fsm, model)
    }

    #[test]
    fn test_report_captures_codes_and_activity() {
        let (fsm, model) = encoded_cycle();
        let report = EncodingReport::from_encoded(&fsm, &model);
        assert_eq!(report.version, REPORT_VERSION);
        assert_eq!(report.name, "cycle3");
        assert_eq!(report.code_length, 2);
        assert_eq!(report.states.len(), 3);
        assert_eq!(report.states[1].code.as_deref(), Some("01"));
        let activity = report.switching_activity.unwrap();
        assert!((activity - 4.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_uncoded_machine_has_no_activity() {
        let (mut fsm, model) = encoded_cycle();
        fsm.clear_codes();
        let report = EncodingReport::from_encoded(&fsm, &model);
        assert_eq!(report.switching_activity, None);
        assert!(report.states.iter().all(|s| s.code.is_none()));
    }
}
