//! Textual FSM reader/writer for the KISS2 subset used by the encoders.
//!
//! The dialect is line oriented:
//!
//! ```text
//! .model <name>          machine name
//! .start_kiss            ignored marker
//! .i <n>   .o <n>        input / output arities
//! .s <n>   .p <n>        declared state / transition counts
//! .r <state>             reset state (resolved once parsing finishes)
//! <input> <cur> <next> <output>   one transition per line
//! .end_kiss              ignored marker
//! .code <state> <code>   previously assigned state code
//! .end                   stop reading
//! ```
//!
//! Everything is string based: [`parse`] takes a `&str` and [`write`] /
//! [`write_by_index`] return `String`s, so file and network I/O stay with
//! the caller. Parse failures carry the 1-based line number and a reason.

use core::fmt::Write as _;

use crate::error::EncodeError;
use crate::fsm::Fsm;

// ─── Parsing ────────────────────────────────────────────────────────────────

fn parse_count(value: Option<&str>, line: usize, what: &str) -> Result<usize, EncodeError> {
    let text = value.ok_or_else(|| EncodeError::Parse {
        line,
        reason: format!("{what} directive is missing its value"),
    })?;
    text.parse().map_err(|_| EncodeError::Parse {
        line,
        reason: format!("{what} value {text:?} is not a non-negative integer"),
    })
}

fn check_pattern(
    pattern: &str,
    width: Option<usize>,
    line: usize,
    what: &str,
) -> Result<(), EncodeError> {
    if let Some(w) = width {
        if pattern.len() != w {
            return Err(EncodeError::Parse {
                line,
                reason: format!(
                    "{what} pattern {pattern:?} has {} characters, expected {w}",
                    pattern.len()
                ),
            });
        }
    }
    if let Some(c) = pattern.chars().find(|c| !matches!(c, '0' | '1' | '-')) {
        return Err(EncodeError::Parse {
            line,
            reason: format!("{what} pattern {pattern:?} contains {c:?}"),
        });
    }
    Ok(())
}

fn check_code(code: &str, line: usize) -> Result<(), EncodeError> {
    if let Some(c) = code.chars().find(|c| !matches!(c, '0' | '1')) {
        return Err(EncodeError::Parse {
            line,
            reason: format!("state code {code:?} contains {c:?}"),
        });
    }
    Ok(())
}

/// Parse a machine from KISS2-subset text.
///
/// Declared `.s`/`.p` counts are checked against what was actually read;
/// the `.r` reset state is resolved after all transitions are in, so it
/// may legally appear before the state it names.
pub fn parse(text: &str) -> Result<Fsm, EncodeError> {
    let mut fsm = Fsm::new("fsm", 0, 0);
    let mut num_inputs: Option<usize> = None;
    let mut num_outputs: Option<usize> = None;
    let mut declared_states: Option<(usize, usize)> = None;
    let mut declared_transitions: Option<(usize, usize)> = None;
    let mut reset: Option<(usize, String)> = None;
    let mut codes: Vec<(usize, String, String)> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let mut tokens = trimmed.split_whitespace();
        if trimmed.starts_with('.') {
            let tag = tokens.next().unwrap_or_default();
            match tag {
                ".start_kiss" | ".end_kiss" => {}
                ".model" => {
                    if let Some(name) = tokens.next() {
                        fsm.set_name(name);
                    }
                }
                ".i" => num_inputs = Some(parse_count(tokens.next(), line, ".i")?),
                ".o" => num_outputs = Some(parse_count(tokens.next(), line, ".o")?),
                ".s" => declared_states = Some((line, parse_count(tokens.next(), line, ".s")?)),
                ".p" => {
                    declared_transitions = Some((line, parse_count(tokens.next(), line, ".p")?))
                }
                ".r" => {
                    let name = tokens.next().ok_or_else(|| EncodeError::Parse {
                        line,
                        reason: ".r directive is missing its state".to_owned(),
                    })?;
                    reset = Some((line, name.to_owned()));
                }
                ".code" => {
                    let (state, code) = match (tokens.next(), tokens.next()) {
                        (Some(s), Some(c)) => (s, c),
                        _ => {
                            return Err(EncodeError::Parse {
                                line,
                                reason: ".code needs a state and a code".to_owned(),
                            })
                        }
                    };
                    check_code(code, line)?;
                    codes.push((line, state.to_owned(), code.to_owned()));
                }
                ".end" => break,
                other => {
                    return Err(EncodeError::Parse {
                        line,
                        reason: format!("unknown directive {other:?}"),
                    })
                }
            }
        } else {
            let fields: Vec<&str> = trimmed.split_whitespace().collect();
            let [input, current, next, output] = fields[..] else {
                return Err(EncodeError::Parse {
                    line,
                    reason: format!("expected 4 fields in transition line, found {}", fields.len()),
                });
            };
            check_pattern(input, num_inputs, line, "input")?;
            check_pattern(output, num_outputs, line, "output")?;
            let cur = fsm.add_state(current);
            let nxt = fsm.add_state(next);
            fsm.add_transition(input, cur, nxt, output);
        }
    }

    if let Some((line, declared)) = declared_states {
        if declared != fsm.num_states() {
            return Err(EncodeError::Parse {
                line,
                reason: format!(
                    ".s declared {declared} states but the transitions name {}",
                    fsm.num_states()
                ),
            });
        }
    }
    if let Some((line, declared)) = declared_transitions {
        if declared != fsm.num_transitions() {
            return Err(EncodeError::Parse {
                line,
                reason: format!(
                    ".p declared {declared} transitions but {} were read",
                    fsm.num_transitions()
                ),
            });
        }
    }
    for (line, state, code) in codes {
        let idx = fsm.find_state(&state).ok_or_else(|| EncodeError::Parse {
            line,
            reason: format!(".code names unknown state {state:?}"),
        })?;
        // Checked here rather than at the directive: the code length is
        // only known once every state has been seen.
        if code.len() != fsm.code_length() {
            return Err(EncodeError::Parse {
                line,
                reason: format!(
                    ".code {code:?} has {} bits, expected {}",
                    code.len(),
                    fsm.code_length()
                ),
            });
        }
        fsm.set_code(idx, code);
    }
    if let Some((line, name)) = reset {
        let idx = fsm.find_state(&name).ok_or_else(|| EncodeError::Parse {
            line,
            reason: format!(".r names unknown state {name:?}"),
        })?;
        fsm.set_reset_state(idx);
    }

    fsm.set_arities(num_inputs.unwrap_or(0), num_outputs.unwrap_or(0));
    Ok(fsm)
}

// ─── Writing ────────────────────────────────────────────────────────────────

fn write_with<F>(fsm: &Fsm, mut state_label: F) -> String
where
    F: FnMut(usize) -> String,
{
    let mut out = String::new();
    // Writes into a String cannot fail.
    let _ = writeln!(out, ".model {}", fsm.name());
    let _ = writeln!(out, ".start_kiss");
    let _ = writeln!(out, ".i {}", fsm.num_inputs());
    let _ = writeln!(out, ".o {}", fsm.num_outputs());
    let _ = writeln!(out, ".s {}", fsm.num_states());
    let _ = writeln!(out, ".p {}", fsm.num_transitions());
    if fsm.num_states() > 0 {
        let reset = fsm.reset_state().unwrap_or(0);
        let _ = writeln!(out, ".r {}", state_label(reset));
    }
    for t in fsm.transitions() {
        let _ = writeln!(
            out,
            "{} {} {} {}",
            t.input,
            state_label(t.current),
            state_label(t.next),
            t.output
        );
    }
    let _ = writeln!(out, ".end_kiss");
    for s in fsm.states() {
        if let Some(code) = &s.code {
            let _ = writeln!(out, ".code {} {}", state_label(s.index), code);
        }
    }
    let _ = writeln!(out, ".end");
    out
}

/// Render a machine with states keyed by name.
pub fn write(fsm: &Fsm) -> String {
    write_with(fsm, |idx| fsm.state(idx).name.clone())
}

/// Render a machine with states keyed by arena index.
pub fn write_by_index(fsm: &Fsm) -> String {
    write_with(fsm, |idx| idx.to_string())
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_parse_reads_structure() {
        let fsm = parse(CYCLE3).unwrap();
        assert_eq!(fsm.name(), "cycle3");
        assert_eq!(fsm.num_inputs(), 2);
        assert_eq!(fsm.num_outputs(), 1);
        assert_eq!(fsm.num_states(), 3);
        assert_eq!(fsm.num_transitions(), 3);
        assert_eq!(fsm.reset_state(), Some(0));
        assert_eq!(fsm.state(1).name, "b");
        assert_eq!(fsm.transitions()[2].input, "1-");
    }

    #[test]
    fn test_parse_reads_codes() {
        let text = format!("{}\n.code a 00\n.code b 01\n", CYCLE3.replace(".end\n", ""));
        let fsm = parse(&text).unwrap();
        assert_eq!(fsm.code(0), Some("00"));
        assert_eq!(fsm.code(1), Some("01"));
        assert_eq!(fsm.code(2), None);
    }

    #[test]
    fn test_nothing_after_end_is_read() {
        let text = format!("{}garbage line here that is not four\n", CYCLE3);
        let fsm = parse(&text).unwrap();
        assert_eq!(fsm.num_states(), 3);
    }

    #[test]
    fn test_declared_count_mismatch() {
        let text = CYCLE3.replace(".s 3", ".s 4");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EncodeError::Parse { line: 5, .. }), "{err}");
    }

    #[test]
    fn test_bad_input_pattern() {
        let text = CYCLE3.replace("01 b c 0", "0x b c 0");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EncodeError::Parse { line: 9, .. }), "{err}");

        let text = CYCLE3.replace("01 b c 0", "011 b c 0");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_bad_output_pattern() {
        let text = CYCLE3.replace("01 b c 0", "01 b c 00");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EncodeError::Parse { line: 9, .. }), "{err}");

        let text = CYCLE3.replace("01 b c 0", "01 b c x");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_code_of_wrong_length_rejected() {
        // 3 states derive a code length of 2; a 3-bit code cannot round
        // trip and must be refused.
        let text = format!("{}\n.code a 000\n", CYCLE3.replace(".end\n", ""));
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EncodeError::Parse { line: 13, .. }), "{err}");
    }

    #[test]
    fn test_unknown_directive() {
        let text = CYCLE3.replace(".start_kiss", ".frobnicate 3");
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, EncodeError::Parse { line: 2, .. }), "{err}");
    }

    #[test]
    fn test_reset_before_states_resolves() {
        // .r appears long before "a" is introduced by a transition.
        let fsm = parse(CYCLE3).unwrap();
        assert_eq!(fsm.reset_state(), Some(fsm.find_state("a").unwrap()));
    }

    #[test]
    fn test_unknown_reset_state() {
        let text = CYCLE3.replace(".r a", ".r zz");
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_round_trip_by_name() {
        let mut fsm = parse(CYCLE3).unwrap();
        fsm.set_code(0, "00".to_owned());
        fsm.set_code(1, "01".to_owned());
        fsm.set_code(2, "10".to_owned());
        let text = write(&fsm);
        let again = parse(&text).unwrap();
        assert_eq!(again.name(), fsm.name());
        assert_eq!(again.num_states(), fsm.num_states());
        assert_eq!(again.num_transitions(), fsm.num_transitions());
        for i in 0..3 {
            assert_eq!(again.state(i).name, fsm.state(i).name);
            assert_eq!(again.code(i), fsm.code(i));
        }
    }

    #[test]
    fn test_write_by_index_uses_indices() {
        let fsm = parse(CYCLE3).unwrap();
        let text = write_by_index(&fsm);
        assert!(text.contains("0- 0 1 1"));
        assert!(text.contains(".r 0"));
        let again = parse(&text).unwrap();
        assert_eq!(again.num_states(), 3);
        assert_eq!(again.state(0).name, "0");
    }
}
