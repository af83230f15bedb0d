//! taggex: an ahead-of-time regex compiler whose transitions carry named
//! region tags.
//!
//! A pattern is compiled once into a dense table of states driven one input
//! rune at a time. On top of the usual vocabulary (grouping, alternation,
//! `*` `?` `+`, character classes, shorthand predicates), patterns may open
//! nested named regions with `{name:...}`, and every transition in the
//! compiled table remembers the innermost region of the operand it consumes.
//! Streaming consumers can therefore classify each accepted rune as it
//! arrives, without submatch extraction or a second pass.
//!
//! ```
//! use taggex::{compile, RegionTag, Stepper};
//!
//! let table = compile(r"{user:[a-z]+}@{host:[a-z]+\.[a-z]+}").unwrap();
//! let mut stepper = Stepper::new(&table);
//! for rune in "nell@example.com".chars() {
//!     let step = stepper.step(rune);
//!     assert!(step.matched);
//!     if rune == 'n' {
//!         assert_eq!(step.region, RegionTag::encode("user"));
//!     }
//! }
//! assert!(stepper.finish());
//! ```
//!
//! Pattern surface:
//! - `(` `)` group; they do not capture
//! - `|` alternation, lowest precedence; concatenation is implicit
//! - `*` `?` `+` postfix repetition
//! - `.` any rune that is not vertical whitespace
//! - `\d \D \l \L \u \U \w \W \s \S \v \V \h \H` shorthand predicates;
//!   `\a \b \t \r \f \n \e` control characters; any other `\c` is `c`
//! - `[...]` classes with ranges, shorthands, and leading `^` negation
//! - `{name:...}` opens a named region; regions nest, innermost wins; names
//!   are lowercase `[a-z_]` identifiers of at most 25 characters (`start`
//!   and `accept` are reserved for the framing sentinels)
//!
//! Compilation builds the DFA directly from followpos sets, so there is no
//! backtracking and each input rune costs one scan of the current state's
//! transitions. Not supported: anchors, lookaround, backreferences, counted
//! repetition `{m,n}`, and Unicode properties beyond the shorthand set.

use std::fmt;

mod classes;
mod compile;
mod lexer;
mod live;
mod matcher;
mod region;
mod table;

pub use compile::compile;
pub use live::LivePattern;
pub use matcher::{Step, Stepper};
pub use region::RegionTag;
pub use table::StepTable;

/// Error raised while compiling a pattern.
///
/// `offset` is the byte offset into the pattern where the problem was
/// detected; errors found at end of input point one past the last byte, and
/// postfix-evaluation errors, which have no source position, report 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub offset: usize,
}

/// The distinct structural errors a pattern can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    /// `}` with no region open.
    UnmatchedRegionClose,
    /// Input ended between `{` and `:`.
    UnterminatedRegionName,
    /// `]` outside any class.
    StrayClassClose,
    /// `[` inside a class.
    NestedClass,
    /// Input ended inside `[...]`.
    UnterminatedClass,
    /// `-` with nothing to its left.
    RangeMissingStart,
    /// Input ended after `-`.
    RangeMissingEnd,
    /// The element left of `-` is not a literal rune.
    RangeStartNotLiteral,
    /// A shorthand predicate right of `-`.
    RangeEndShorthand,
    /// `.` right of `-`.
    RangeEndDot,
    /// Input ended after `\`.
    UnterminatedEscape,
    /// More `(` than `)`, or the reverse.
    UnbalancedParens,
    /// An operator found fewer operands than its arity requires.
    ImbalancedExpression,
}

impl CompileError {
    pub(crate) fn at(kind: CompileErrorKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            CompileErrorKind::UnmatchedRegionClose => "'}' without matching '{'",
            CompileErrorKind::UnterminatedRegionName => "input ended inside a region name",
            CompileErrorKind::StrayClassClose => "']' outside a character class",
            CompileErrorKind::NestedClass => "'[' inside a character class",
            CompileErrorKind::UnterminatedClass => "unterminated character class",
            CompileErrorKind::RangeMissingStart => "range '-' without a left endpoint",
            CompileErrorKind::RangeMissingEnd => "range '-' without a right endpoint",
            CompileErrorKind::RangeStartNotLiteral => "range must start from a literal character",
            CompileErrorKind::RangeEndShorthand => "shorthand class cannot end a range",
            CompileErrorKind::RangeEndDot => "'.' cannot end a range",
            CompileErrorKind::UnterminatedEscape => "input ended after '\\'",
            CompileErrorKind::UnbalancedParens => "imbalanced parentheses",
            CompileErrorKind::ImbalancedExpression => "imbalanced expression",
        };
        write!(f, "{} at offset {}", what, self.offset)
    }
}

impl std::error::Error for CompileError {}
