//! The compiled step table.
//!
//! A table is three contiguous buffers carved to exact size by a prepass:
//! one entry per state, all transitions in per-state runs, and a pool holding
//! every class element so each class is a contiguous slice. Entries and
//! classes reference the shared buffers by index range, so the table owns its
//! storage outright and the parse arena can be dropped wholesale after the
//! build.
//!
//! `entry[i]` is the state reached after matching operand `i`; its
//! transitions are the operand's followpos set, in order. State 0 belongs to
//! the synthetic start operand, so it is the entry point for matching.

use std::fmt;

use crate::classes::{CharSpan, CharValue};
use crate::compile::parser::{NodeArena, NodeId};
use crate::lexer::Token;
use crate::region::RegionTag;

/// A compiled pattern: a dense state table stepped one rune at a time.
///
/// Immutable once built; safe to share by reference across threads.
#[derive(Clone)]
pub struct StepTable {
    entries: Vec<Entry>,
    transitions: Vec<Transition>,
    class_pool: Vec<CharSpan>,
}

/// Per-state run of transitions, as a range into the transition buffer.
#[derive(Clone, Copy)]
struct Entry {
    first: u32,
    len: u32,
}

/// One outgoing edge of a state.
#[derive(Clone)]
pub(crate) struct Transition {
    pub value: TransValue,
    /// Destination state.
    pub jump: u32,
    /// Region of the operand this edge consumes.
    pub region: RegionTag,
}

/// The matchable payload of a transition. Classes live in the table's shared
/// pool rather than owning their elements.
#[derive(Clone, Copy)]
pub(crate) enum TransValue {
    Single(CharSpan),
    Class { negated: bool, first: u32, len: u32 },
}

impl StepTable {
    /// Number of states. Equals the number of operand tokens, the two
    /// synthetic framing operands included.
    pub fn state_count(&self) -> usize {
        self.entries.len()
    }

    /// Total number of transitions across all states.
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }

    #[inline]
    pub(crate) fn transitions_of(&self, state: u32) -> &[Transition] {
        let entry = self.entries[state as usize];
        &self.transitions[entry.first as usize..(entry.first + entry.len) as usize]
    }

    #[inline]
    pub(crate) fn class_elements(&self, first: u32, len: u32) -> &[CharSpan] {
        &self.class_pool[first as usize..(first + len) as usize]
    }
}

impl fmt::Debug for StepTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepTable")
            .field("states", &self.entries.len())
            .field("transitions", &self.transitions.len())
            .field("class_elements", &self.class_pool.len())
            .finish()
    }
}

/// Build the table from the evaluated arena. `operands` is the leaf list in
/// position order; `tokens` supplies each leaf's matchable value and region.
pub(crate) fn build(arena: &NodeArena, operands: &[NodeId], tokens: &[Token]) -> StepTable {
    // Prepass: exact sizes for the three buffers.
    let mut transition_count = 0usize;
    let mut class_count = 0usize;
    for &leaf in operands {
        for &dest in &arena[leaf].follow_pos {
            transition_count += 1;
            if let CharValue::Class(class) = &tokens[arena[dest].token as usize].value {
                class_count += class.elements.len();
            }
        }
    }

    let mut entries = Vec::with_capacity(operands.len());
    let mut transitions = Vec::with_capacity(transition_count);
    let mut class_pool = Vec::with_capacity(class_count);

    for &leaf in operands {
        let first = transitions.len() as u32;
        for &dest in &arena[leaf].follow_pos {
            let dest_node = &arena[dest];
            let token = &tokens[dest_node.token as usize];
            let value = match &token.value {
                CharValue::Single(span) => TransValue::Single(*span),
                CharValue::Class(class) => {
                    let start = class_pool.len() as u32;
                    class_pool.extend_from_slice(&class.elements);
                    TransValue::Class {
                        negated: class.negated,
                        first: start,
                        len: class.elements.len() as u32,
                    }
                }
            };
            transitions.push(Transition {
                value,
                jump: dest_node.position,
                region: token.region,
            });
        }
        entries.push(Entry {
            first,
            len: transitions.len() as u32 - first,
        });
    }

    StepTable {
        entries,
        transitions,
        class_pool,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile;

    #[test]
    fn test_state_count_equals_operand_count() {
        // S a b c # = 5 operands.
        let table = compile("abc").unwrap();
        assert_eq!(table.state_count(), 5);
        // S a b # = 4: the operators contribute no states.
        let table = compile("a|b").unwrap();
        assert_eq!(table.state_count(), 4);
    }

    #[test]
    fn test_jumps_are_in_bounds() {
        for pattern in ["abc", "a*b+c?", "(a|b)*c", "[a-z]+[0-9]*", "{r:a.}b"] {
            let table = compile(pattern).unwrap();
            for state in 0..table.state_count() as u32 {
                for t in table.transitions_of(state) {
                    assert!(
                        (t.jump as usize) < table.state_count(),
                        "{}: jump {} out of {} states",
                        pattern,
                        t.jump,
                        table.state_count()
                    );
                }
            }
        }
    }

    #[test]
    fn test_transitions_follow_position_order() {
        // a*b from state 0: the loop first, then b, mirroring followpos order.
        let table = compile("a*b").unwrap();
        let start = table.transitions_of(0);
        assert_eq!(start.len(), 2);
        assert_eq!(start[0].jump, 1);
        assert_eq!(start[1].jump, 2);
    }

    #[test]
    fn test_accept_state_is_unique_sink() {
        for pattern in ["abc", "a|b", "(ab)+c?", "[xy]z*"] {
            let table = compile(pattern).unwrap();
            let mut accept_jumps = Vec::new();
            for state in 0..table.state_count() as u32 {
                for t in table.transitions_of(state) {
                    if t.region == RegionTag::ACCEPT {
                        accept_jumps.push(t.jump);
                    }
                }
            }
            assert!(!accept_jumps.is_empty(), "{}: no accept edge", pattern);
            let sink = accept_jumps[0];
            assert!(
                accept_jumps.iter().all(|&j| j == sink),
                "{}: accept edges disagree on the sink state",
                pattern
            );
            // Nothing else reaches the accept sink.
            for state in 0..table.state_count() as u32 {
                for t in table.transitions_of(state) {
                    if t.jump == sink {
                        assert_eq!(t.region, RegionTag::ACCEPT);
                    }
                }
            }
            // And the sink itself is terminal.
            assert!(table.transitions_of(sink).is_empty());
        }
    }

    #[test]
    fn test_classes_are_deep_copied_per_transition() {
        // The class is the target of both the loop and the initial edge, so
        // its elements land in the pool once per transition referencing it.
        let table = compile("[ab]+").unwrap();
        let mut class_transitions = 0;
        for state in 0..table.state_count() as u32 {
            for t in table.transitions_of(state) {
                if let TransValue::Class { len, .. } = t.value {
                    assert_eq!(len, 2);
                    class_transitions += 1;
                }
            }
        }
        assert_eq!(class_transitions, 2);
    }

    #[test]
    fn test_debug_summary() {
        let table = compile("ab").unwrap();
        let s = format!("{:?}", table);
        assert!(s.contains("states"), "unexpected debug output: {}", s);
    }
}
