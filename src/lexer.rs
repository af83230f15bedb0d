//! Pattern lexing.
//!
//! The lexer walks the pattern once with a small state machine and produces a
//! flat token vector. Each token is either a structural marker (parens,
//! alternation, the postfix operators) or an operand (a literal rune, a
//! shorthand predicate, or a bracketed class), and every token carries the
//! tag of the innermost `{name:...}` region open where it was produced.
//!
//! Before scanning, the stream is framed as `S(` and after scanning as `)#`:
//! the `S` operand (region `start`) pins the start state to position 0 and
//! the `#` operand (region `accept`) gives every pattern a single accepting
//! operand. The framing turns a user pattern `p` into the equivalent of
//! `S(p)#`.

use crate::classes::{control_rune, shorthand_kind, CharClass, CharKind, CharSpan, CharValue};
use crate::region::RegionTag;
use crate::{CompileError, CompileErrorKind};

/// Rune of the synthetic operand that opens every pattern.
pub(crate) const FRAME_START_RUNE: char = 'S';

/// Rune of the synthetic operand whose consumption signals acceptance.
pub(crate) const FRAME_ACCEPT_RUNE: char = '#';

/// One lexed unit of the pattern.
///
/// The token's index in the lexer output is its durable identity; the parser
/// and the table builder refer back to tokens by that index.
#[derive(Clone, Debug)]
pub(crate) struct Token {
    pub value: CharValue,
    /// Innermost region open where this token was produced.
    pub region: RegionTag,
}

/// Lexer states. `Normal` is both initial and the only legal terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LexState {
    Normal,
    /// Between `{` and the `:` that closes a region name.
    Naming,
    /// After `\` outside a class.
    Escape,
    /// Just after `[`, where `^` and a leading `]` are special.
    ClassStart,
    /// Inside `[...]`.
    ClassBody,
    /// After `-` inside a class, waiting for the upper bound.
    ClassRange,
    /// After `\` where the escape will become a range upper bound.
    ClassRangeEscape,
    /// After `\` inside a class.
    ClassEscape,
}

struct Lexer {
    state: LexState,
    tokens: Vec<Token>,
    /// Region scopes, innermost last. Seeded with the implicit outermost
    /// "no region" so the stack is never empty.
    regions: Vec<RegionTag>,
    /// Bytes of the region name currently being read.
    name_buf: String,
    /// The bracketed class currently being built.
    class: CharClass,
    /// Open-paren balance across the whole stream, framing included.
    fence_balance: i32,
}

/// Lex `pattern` into the framed token stream.
pub(crate) fn tokenize(pattern: &str) -> Result<Vec<Token>, CompileError> {
    let mut lx = Lexer {
        state: LexState::Normal,
        tokens: Vec::with_capacity(pattern.len() + 4),
        regions: vec![RegionTag::NONE],
        name_buf: String::new(),
        class: CharClass::default(),
        fence_balance: 0,
    };

    lx.tokens.push(Token {
        value: CharValue::Single(CharSpan::exact(FRAME_START_RUNE)),
        region: RegionTag::START,
    });
    lx.emit_marker('(');

    for (offset, rune) in pattern.char_indices() {
        lx.feed(offset, rune)?;
    }
    lx.finish(pattern.len())
}

impl Lexer {
    fn region(&self) -> RegionTag {
        self.regions.last().copied().unwrap_or(RegionTag::NONE)
    }

    fn emit_operand(&mut self, span: CharSpan) {
        self.tokens.push(Token {
            value: CharValue::Single(span),
            region: self.region(),
        });
    }

    fn emit_marker(&mut self, rune: char) {
        match rune {
            '(' => self.fence_balance += 1,
            ')' => self.fence_balance -= 1,
            _ => {}
        }
        self.tokens.push(Token {
            value: CharValue::Single(CharSpan::marker(rune)),
            region: self.region(),
        });
    }

    fn emit_class(&mut self) {
        let class = std::mem::take(&mut self.class);
        self.tokens.push(Token {
            value: CharValue::Class(class),
            region: self.region(),
        });
        self.state = LexState::Normal;
    }

    /// The escape vocabulary shared by `Escape` and `ClassEscape`: shorthand
    /// predicates, control characters, and literal fallback.
    fn escape_span(rune: char) -> CharSpan {
        if let Some(kind) = shorthand_kind(rune) {
            CharSpan::shorthand(kind, rune)
        } else if let Some(ctrl) = control_rune(rune) {
            CharSpan::exact(ctrl)
        } else {
            CharSpan::exact(rune)
        }
    }

    fn feed(&mut self, offset: usize, rune: char) -> Result<(), CompileError> {
        match self.state {
            LexState::Normal => self.feed_normal(offset, rune),
            LexState::Naming => {
                if rune == ':' {
                    let tag = RegionTag::encode(&self.name_buf);
                    self.regions.push(tag);
                    self.state = LexState::Normal;
                } else {
                    self.name_buf.push(rune);
                }
                Ok(())
            }
            LexState::Escape => {
                self.emit_operand(Self::escape_span(rune));
                self.state = LexState::Normal;
                Ok(())
            }
            LexState::ClassStart => self.feed_class_start(offset, rune),
            LexState::ClassBody => self.feed_class_body(offset, rune),
            LexState::ClassEscape => {
                self.class.elements.push(Self::escape_span(rune));
                self.state = LexState::ClassBody;
                Ok(())
            }
            LexState::ClassRange => match rune {
                '.' => Err(CompileError::at(CompileErrorKind::RangeEndDot, offset)),
                '\\' => {
                    self.state = LexState::ClassRangeEscape;
                    Ok(())
                }
                _ => self.close_range(offset, rune),
            },
            LexState::ClassRangeEscape => {
                if shorthand_kind(rune).is_some() {
                    return Err(CompileError::at(CompileErrorKind::RangeEndShorthand, offset));
                }
                let hi = control_rune(rune).unwrap_or(rune);
                self.close_range(offset, hi)
            }
        }
    }

    fn feed_normal(&mut self, offset: usize, rune: char) -> Result<(), CompileError> {
        match rune {
            '{' => {
                self.name_buf.clear();
                self.state = LexState::Naming;
            }
            '}' => {
                if self.regions.len() <= 1 {
                    return Err(CompileError::at(
                        CompileErrorKind::UnmatchedRegionClose,
                        offset,
                    ));
                }
                self.regions.pop();
            }
            '\\' => self.state = LexState::Escape,
            '[' => {
                self.class = CharClass::default();
                self.state = LexState::ClassStart;
            }
            ']' => return Err(CompileError::at(CompileErrorKind::StrayClassClose, offset)),
            '(' | ')' => self.emit_marker(rune),
            '|' | '*' | '?' | '+' => self.emit_marker(rune),
            '.' => self.emit_operand(CharSpan::shorthand(CharKind::NotVerticalSpace, '.')),
            _ => self.emit_operand(CharSpan::exact(rune)),
        }
        Ok(())
    }

    fn feed_class_start(&mut self, offset: usize, rune: char) -> Result<(), CompileError> {
        match rune {
            '^' => {
                self.class.negated = true;
                self.state = LexState::ClassBody;
            }
            '-' => {
                return Err(CompileError::at(CompileErrorKind::RangeMissingStart, offset));
            }
            ']' => self.emit_class(),
            '\\' => self.state = LexState::ClassEscape,
            '[' => return Err(CompileError::at(CompileErrorKind::NestedClass, offset)),
            // A leading dot is taken literally; only a dot later in the class
            // body is the any-but-vertical shorthand.
            _ => {
                self.class.elements.push(CharSpan::exact(rune));
                self.state = LexState::ClassBody;
            }
        }
        Ok(())
    }

    fn feed_class_body(&mut self, offset: usize, rune: char) -> Result<(), CompileError> {
        match rune {
            '-' => match self.class.elements.last() {
                None => {
                    return Err(CompileError::at(CompileErrorKind::RangeMissingStart, offset))
                }
                Some(top) if top.kind != CharKind::Exact => {
                    return Err(CompileError::at(
                        CompileErrorKind::RangeStartNotLiteral,
                        offset,
                    ))
                }
                Some(_) => self.state = LexState::ClassRange,
            },
            ']' => self.emit_class(),
            '\\' => self.state = LexState::ClassEscape,
            '[' => return Err(CompileError::at(CompileErrorKind::NestedClass, offset)),
            '.' => self
                .class
                .elements
                .push(CharSpan::shorthand(CharKind::NotVerticalSpace, '.')),
            _ => self.class.elements.push(CharSpan::exact(rune)),
        }
        Ok(())
    }

    /// Promote the top class element from an exact rune to a range ending at
    /// `hi`. The top is guaranteed `Exact` by the `-` transition.
    fn close_range(&mut self, offset: usize, hi: char) -> Result<(), CompileError> {
        match self.class.elements.last_mut() {
            Some(top) => {
                *top = CharSpan::range(top.lo, hi);
                self.state = LexState::ClassBody;
                Ok(())
            }
            None => Err(CompileError::at(CompileErrorKind::RangeMissingStart, offset)),
        }
    }

    fn finish(mut self, end: usize) -> Result<Vec<Token>, CompileError> {
        match self.state {
            LexState::Normal => {}
            LexState::Naming => {
                return Err(CompileError::at(
                    CompileErrorKind::UnterminatedRegionName,
                    end,
                ))
            }
            LexState::Escape => {
                return Err(CompileError::at(CompileErrorKind::UnterminatedEscape, end))
            }
            LexState::ClassStart | LexState::ClassBody | LexState::ClassEscape => {
                return Err(CompileError::at(CompileErrorKind::UnterminatedClass, end))
            }
            LexState::ClassRange | LexState::ClassRangeEscape => {
                return Err(CompileError::at(CompileErrorKind::RangeMissingEnd, end))
            }
        }

        self.emit_marker(')');
        self.tokens.push(Token {
            value: CharValue::Single(CharSpan::exact(FRAME_ACCEPT_RUNE)),
            region: RegionTag::ACCEPT,
        });

        if self.fence_balance != 0 {
            return Err(CompileError::at(CompileErrorKind::UnbalancedParens, end));
        }
        Ok(self.tokens)
    }
}
