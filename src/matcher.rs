//! Stepping a compiled table over input.
//!
//! The matcher is a pure function of `(table, state, rune)`: it scans the
//! current state's transitions in order and takes the first one whose value
//! matches the rune. It allocates nothing and holds no state of its own;
//! [`Stepper`] is the minimal stateful driver layered on top.

use crate::lexer::FRAME_ACCEPT_RUNE;
use crate::region::RegionTag;
use crate::table::{StepTable, TransValue};

/// Outcome of feeding one rune to the matcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// The state after the step. Unchanged when nothing matched.
    pub next: u32,
    /// Region of the operand that consumed the rune; `RegionTag::NONE` on a
    /// failed step. Equal to [`RegionTag::ACCEPT`] exactly when the accept
    /// sentinel was consumed.
    pub region: RegionTag,
    /// Whether any transition consumed the rune.
    pub matched: bool,
}

impl StepTable {
    /// Feed one rune to the matcher at `state`.
    ///
    /// Transitions are tested in table order and the first match wins. When
    /// no transition matches (the pattern cannot consume this rune here),
    /// the state is left unchanged and `matched` is false; the caller decides
    /// whether that is fatal.
    pub fn step(&self, state: u32, rune: char) -> Step {
        for t in self.transitions_of(state) {
            let hit = match t.value {
                TransValue::Single(span) => span.matches(rune),
                TransValue::Class {
                    negated,
                    first,
                    len,
                } => {
                    let any = self
                        .class_elements(first, len)
                        .iter()
                        .any(|e| e.matches(rune));
                    negated != any
                }
            };
            if hit {
                return Step {
                    next: t.jump,
                    region: t.region,
                    matched: true,
                };
            }
        }
        Step {
            next: state,
            region: RegionTag::NONE,
            matched: false,
        }
    }
}

/// A streaming driver over a compiled table.
///
/// Starts at state 0 (the synthetic start operand's state). Feed one rune at
/// a time with [`step`](Self::step); call [`finish`](Self::finish) to feed
/// the accept sentinel and learn whether the pattern accepts the input
/// consumed so far.
pub struct Stepper<'a> {
    table: &'a StepTable,
    state: u32,
}

impl<'a> Stepper<'a> {
    pub fn new(table: &'a StepTable) -> Self {
        Self { table, state: 0 }
    }

    /// The current state index.
    pub fn state(&self) -> u32 {
        self.state
    }

    /// Feed one rune, advancing on a match.
    pub fn step(&mut self, rune: char) -> Step {
        let step = self.table.step(self.state, rune);
        self.state = step.next;
        step
    }

    /// Feed the accept sentinel. True exactly when the input consumed so far
    /// is a complete match.
    pub fn finish(&mut self) -> bool {
        self.step(FRAME_ACCEPT_RUNE).region == RegionTag::ACCEPT
    }
}
