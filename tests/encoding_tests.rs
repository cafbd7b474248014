//! End-to-end tests driving both encoders through the public API.

use pow3_core::brute::{peak_switch, BruteForceConfig, BruteForceEncoder, SwitchTable};
use pow3_core::error::EncodeError;
use pow3_core::estimator::{switching_activity, transition_model};
use pow3_core::fsm::Fsm;
use pow3_core::{kiss, pow3};

const CYCLE3: &str = "\
.model cycle3
.start_kiss
.i 2
.o 1
.s 3
.p 3
.r a
0- a b 1
01 b c 0
1- c a 1
.end_kiss
.end
";

fn three_cycle() -> Fsm {
    kiss::parse(CYCLE3).unwrap()
}

fn four_ring() -> Fsm {
    let mut fsm = Fsm::new("ring4", 1, 1);
    let a = fsm.add_state("a");
    let b = fsm.add_state("b");
    let c = fsm.add_state("c");
    let d = fsm.add_state("d");
    fsm.add_transition("0", a, b, "0");
    fsm.add_transition("1", b, c, "0");
    fsm.add_transition("0", c, d, "0");
    fsm.add_transition("1", d, a, "0");
    fsm
}

#[test]
fn pow3_encodes_three_cycle() {
    let mut fsm = three_cycle();
    pow3::encode(&mut fsm).unwrap();
    assert!(fsm.fully_coded());

    let codes: Vec<&str> = (0..3).map(|i| fsm.code(i).unwrap()).collect();
    assert!(codes.iter().all(|c| c.len() == 2));
    let mut sorted = codes.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), 3, "codes must be pairwise distinct: {codes:?}");

    // A uniform 3-cycle admits an assignment where every code pair taken by
    // a transition differs in few bits; the expected switching per cycle for
    // this machine comes out at 4/3.
    let model = transition_model(&fsm).unwrap();
    let activity = switching_activity(&fsm, &model.total).unwrap();
    assert!((activity - 4.0 / 3.0).abs() < 1e-9, "activity = {activity}");
}

#[test]
fn pow3_is_deterministic() {
    let mut first = three_cycle();
    pow3::encode(&mut first).unwrap();
    let mut second = three_cycle();
    pow3::encode(&mut second).unwrap();
    for i in 0..3 {
        assert_eq!(first.code(i), second.code(i));
    }
}

#[test]
fn pow3_handles_wide_dont_care_inputs() {
    // 32 fully don't-care input bits give each transition a raw weight of
    // 2^32 — the whole pipeline must stay in floating point.
    let mut fsm = Fsm::new("wide", 32, 1);
    let a = fsm.add_state("a");
    let b = fsm.add_state("b");
    let dc = "-".repeat(32);
    fsm.add_transition(dc.clone(), a, b, "0");
    fsm.add_transition(dc, b, a, "0");
    pow3::encode(&mut fsm).unwrap();
    assert!(fsm.fully_coded());
    assert_ne!(fsm.code(a), fsm.code(b));
}

#[test]
fn pow3_reports_dead_end_state() {
    let mut fsm = three_cycle();
    let trap = fsm.add_state("trap");
    let a = fsm.find_state("a").unwrap();
    fsm.add_transition("11", a, trap, "0");
    let err = pow3::encode(&mut fsm).unwrap_err();
    assert_eq!(
        err,
        EncodeError::DeadEndState {
            state: "trap".to_owned()
        }
    );
    assert!(!fsm.fully_coded());
}

#[test]
fn pow3_reports_unreachable_state() {
    let mut fsm = three_cycle();
    let island = fsm.add_state("island");
    let a = fsm.find_state("a").unwrap();
    fsm.add_transition("11", island, a, "0");
    let err = pow3::encode(&mut fsm).unwrap_err();
    assert_eq!(
        err,
        EncodeError::UnreachableState {
            state: "island".to_owned()
        }
    );
}

#[test]
fn brute_force_never_loses_to_pow3_on_peak() {
    for mut fsm in [three_cycle(), four_ring()] {
        let mut heuristic = fsm.clone();
        pow3::encode(&mut heuristic).unwrap();

        let mut encoder = BruteForceEncoder::default();
        let outcome = encoder.encode(&mut fsm).unwrap();

        let table = SwitchTable::new(fsm.code_length());
        let pow3_peak = peak_switch(&heuristic, &table).unwrap();
        assert!(
            outcome.peak_switch <= pow3_peak,
            "exhaustive peak {} > POW3 peak {}",
            outcome.peak_switch,
            pow3_peak
        );
        assert_eq!(peak_switch(&fsm, &table), Some(outcome.peak_switch));
    }
}

#[test]
fn brute_force_size_guard_is_checked_before_mutation() {
    let mut fsm = four_ring();
    let mut encoder = BruteForceEncoder::new(BruteForceConfig { max_assignments: 10 });
    let err = encoder.encode(&mut fsm).unwrap_err();
    // 4 states over 4 codes: 4! = 24 assignments.
    assert_eq!(
        err,
        EncodeError::SearchTooLarge {
            assignments: 24,
            limit: 10
        }
    );
    assert!((0..4).all(|i| fsm.code(i).is_none()));
}

#[test]
fn kiss_round_trip_preserves_encoding() {
    let mut fsm = three_cycle();
    pow3::encode(&mut fsm).unwrap();

    let text = kiss::write(&fsm);
    let again = kiss::parse(&text).unwrap();
    assert_eq!(again.name(), fsm.name());
    assert_eq!(again.num_inputs(), fsm.num_inputs());
    assert_eq!(again.num_outputs(), fsm.num_outputs());
    assert_eq!(again.num_states(), fsm.num_states());
    assert_eq!(again.num_transitions(), fsm.num_transitions());
    for i in 0..fsm.num_states() {
        assert_eq!(again.state(i).name, fsm.state(i).name);
        assert_eq!(again.code(i), fsm.code(i));
    }
    // Same codes, same measured activity.
    let model = transition_model(&again).unwrap();
    let a = switching_activity(&again, &model.total).unwrap();
    let b = switching_activity(&fsm, &transition_model(&fsm).unwrap().total).unwrap();
    assert!((a - b).abs() < 1e-9);
}

#[test]
fn encoders_agree_on_code_length() {
    let mut fsm = four_ring();
    pow3::encode(&mut fsm).unwrap();
    assert!(fsm.states().iter().all(|s| {
        s.code.as_deref().map(str::len) == Some(fsm.code_length())
    }));

    let mut fsm = four_ring();
    BruteForceEncoder::default().encode(&mut fsm).unwrap();
    assert!(fsm.states().iter().all(|s| {
        s.code.as_deref().map(str::len) == Some(fsm.code_length())
    }));
}

#[test]
fn single_state_machine_gets_empty_code() {
    let mut fsm = Fsm::new("one", 1, 1);
    let only = fsm.add_state("only");
    fsm.add_transition("-", only, only, "1");
    pow3::encode(&mut fsm).unwrap();
    assert_eq!(fsm.code(only), Some(""));

    let mut fsm2 = fsm.clone();
    fsm2.clear_codes();
    let outcome = BruteForceEncoder::default().encode(&mut fsm2).unwrap();
    assert_eq!(outcome.peak_switch, 0);
    assert_eq!(fsm2.code(only), Some(""));
}
