//! The finite-state-machine container consumed by the encoders.
//!
//! States live in an arena and are addressed by their stable insertion
//! index; transitions store those indices rather than references, so the
//! collections can grow without invalidating anything. There is no
//! process-wide "current FSM" — every operation takes the machine it works
//! on explicitly.
//!
//! The per-state `code` field starts out unassigned and is written exactly
//! once, by whichever encoder completes: a `String` over `{'0', '1'}` of
//! length [`Fsm::code_length`], with string position `j` holding bit `2^j`
//! of the integer code (least-significant bit first).

use core::fmt;

use hashbrown::HashMap;

// ─── State / Transition ─────────────────────────────────────────────────────

/// A single FSM state.
#[derive(Clone, Debug)]
pub struct State {
    /// Stable arena index of this state.
    pub index: usize,
    /// Symbolic state name from the description.
    pub name: String,
    /// Assigned binary code, `None` until an encoder has run.
    pub code: Option<String>,
}

/// A single FSM transition.
///
/// The input pattern is a string over `{'0', '1', '-'}` where `'-'` marks a
/// don't-care position: each such position doubles the number of concrete
/// input combinations the transition represents.
#[derive(Clone, Debug)]
pub struct Transition {
    /// Input pattern, one character per machine input.
    pub input: String,
    /// Output pattern, one character per machine output.
    pub output: String,
    /// Arena index of the originating state.
    pub current: usize,
    /// Arena index of the destination state.
    pub next: usize,
}

// ─── Fsm ────────────────────────────────────────────────────────────────────

/// A finite-state machine: state arena plus transition list.
#[derive(Clone, Debug, Default)]
pub struct Fsm {
    name: String,
    num_inputs: usize,
    num_outputs: usize,
    states: Vec<State>,
    transitions: Vec<Transition>,
    reset_state: Option<usize>,
    index_by_name: HashMap<String, usize>,
}

impl Fsm {
    /// Create an empty machine with the given name and input/output arities.
    pub fn new(name: impl Into<String>, num_inputs: usize, num_outputs: usize) -> Self {
        Self {
            name: name.into(),
            num_inputs,
            num_outputs,
            ..Self::default()
        }
    }

    /// Machine name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename the machine.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the input/output arities (widths of the transition patterns).
    pub fn set_arities(&mut self, num_inputs: usize, num_outputs: usize) {
        self.num_inputs = num_inputs;
        self.num_outputs = num_outputs;
    }

    /// Number of machine inputs (width of every transition input pattern).
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Number of machine outputs.
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Number of states.
    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    /// Number of transitions.
    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    /// Required code length: `⌈log2(num_states)⌉`, and 0 for a machine of
    /// one state (or none).
    pub fn code_length(&self) -> usize {
        let n = self.states.len();
        if n <= 1 {
            0
        } else {
            (usize::BITS - (n - 1).leading_zeros()) as usize
        }
    }

    /// Look up a state index by name, adding a fresh state when unseen.
    pub fn add_state(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index_by_name.get(name) {
            return idx;
        }
        let idx = self.states.len();
        self.states.push(State {
            index: idx,
            name: name.to_owned(),
            code: None,
        });
        self.index_by_name.insert(name.to_owned(), idx);
        idx
    }

    /// Look up a state index by name.
    pub fn find_state(&self, name: &str) -> Option<usize> {
        self.index_by_name.get(name).copied()
    }

    /// Append a transition between two existing states.
    ///
    /// Both indices must come from [`Fsm::add_state`].
    pub fn add_transition(
        &mut self,
        input: impl Into<String>,
        current: usize,
        next: usize,
        output: impl Into<String>,
    ) {
        assert!(current < self.states.len(), "bad current-state index");
        assert!(next < self.states.len(), "bad next-state index");
        self.transitions.push(Transition {
            input: input.into(),
            output: output.into(),
            current,
            next,
        });
    }

    /// All states, in arena order.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// All transitions, in insertion order.
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// A single state by arena index.
    pub fn state(&self, idx: usize) -> &State {
        &self.states[idx]
    }

    /// The assigned code of a state, if an encoder has run.
    pub fn code(&self, idx: usize) -> Option<&str> {
        self.states[idx].code.as_deref()
    }

    /// Write the code for a single state.
    pub fn set_code(&mut self, idx: usize, code: String) {
        self.states[idx].code = Some(code);
    }

    /// Clear every assigned code (e.g. before re-encoding).
    pub fn clear_codes(&mut self) {
        for s in &mut self.states {
            s.code = None;
        }
    }

    /// `true` once every state carries a code.
    pub fn fully_coded(&self) -> bool {
        self.states.iter().all(|s| s.code.is_some())
    }

    /// Mark the reset (initial) state.
    pub fn set_reset_state(&mut self, idx: usize) {
        assert!(idx < self.states.len(), "bad reset-state index");
        self.reset_state = Some(idx);
    }

    /// The reset state, if one was declared.
    pub fn reset_state(&self) -> Option<usize> {
        self.reset_state
    }
}

impl fmt::Display for Fsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Number of state:         {}", self.num_states())?;
        writeln!(f, "Number of input:         {}", self.num_inputs)?;
        writeln!(f, "Number of output:        {}", self.num_outputs)?;
        writeln!(f, "Number of transition:    {}", self.num_transitions())?;
        writeln!(f, "----------------------------------------------")?;
        writeln!(f, "Input    Current State    Next State    Output")?;
        writeln!(f, "----------------------------------------------")?;
        for t in &self.transitions {
            writeln!(
                f,
                "{:<8} {:<16} {:<13} {}",
                t.input, self.states[t.current].name, self.states[t.next].name, t.output
            )?;
        }
        writeln!(f, "----------------------------------------------")?;
        writeln!(f, "State Table")?;
        writeln!(f, "----------------------------------------------")?;
        for s in &self.states {
            writeln!(f, "{:<16} {}", s.name, s.code.as_deref().unwrap_or("-"))?;
        }
        Ok(())
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
