//! Pattern compilation.
//!
//! The pipeline runs in four stages over one shared naming scheme, the token
//! insertion order:
//!
//! 1. `lexer::tokenize`: pattern string → framed token vector
//! 2. `parser::to_postfix`: tokens → postfix node sequence over an arena
//! 3. `eval::evaluate`: nullable / firstpos / lastpos / followpos, assigning
//!    each operand leaf its state number
//! 4. `table::build`: followpos sets → contiguous step table
//!
//! Tokens, nodes, and the position sets are all transient; only the table
//! survives. Any structural problem surfaces as a `CompileError` and no
//! partial table escapes.

mod eval;
pub(crate) mod parser;

use crate::lexer;
use crate::table::{self, StepTable};
use crate::CompileError;

/// Compile `pattern` into a step table.
pub fn compile(pattern: &str) -> Result<StepTable, CompileError> {
    let tokens = lexer::tokenize(pattern)?;
    let mut arena = parser::NodeArena::with_capacity(tokens.len() * 2);
    let rpn = parser::to_postfix(&tokens, &mut arena);
    let operands = eval::evaluate(&rpn, &mut arena)?;
    Ok(table::build(&arena, &operands, &tokens))
}
