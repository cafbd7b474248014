//! JSON round-trip tests for the `serde`-gated encoding report.

#![cfg(feature = "serde")]

use pow3_core::estimator::transition_model;
use pow3_core::fsm::Fsm;
use pow3_core::pow3;
use pow3_core::report::{EncodingReport, REPORT_VERSION};

fn encoded_cycle() -> Fsm {
    let mut fsm = Fsm::new("cycle3", 2, 1);
    let a = fsm.add_state("a");
    let b = fsm.add_state("b");
    let c = fsm.add_state("c");
    fsm.add_transition("0-", a, b, "1");
    fsm.add_transition("01", b, c, "0");
    fsm.add_transition("1-", c, a, "1");
    pow3::encode(&mut fsm).unwrap();
    fsm
}

#[test]
fn report_round_trips_through_json() {
    let fsm = encoded_cycle();
    let model = transition_model(&fsm).unwrap();
    let report = EncodingReport::from_encoded(&fsm, &model);

    let json = serde_json::to_string(&report).unwrap();
    let restored: EncodingReport = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, report);
    assert_eq!(restored.version, REPORT_VERSION);
    assert_eq!(restored.states.len(), 3);
    assert!(restored.switching_activity.is_some());
}

#[test]
fn report_json_field_names_are_stable() {
    let fsm = encoded_cycle();
    let model = transition_model(&fsm).unwrap();
    let report = EncodingReport::from_encoded(&fsm, &model);

    let value: serde_json::Value = serde_json::to_value(&report).unwrap();
    for key in [
        "version",
        "name",
        "code_length",
        "states",
        "steady_state",
        "switching_activity",
    ] {
        assert!(value.get(key).is_some(), "missing field {key:?}");
    }
    assert_eq!(value["name"], "cycle3");
    assert_eq!(value["states"][0]["name"], "a");
}
