//! Symbolic evaluation of the postfix form.
//!
//! One left-to-right pass over the postfix sequence computes `nullable`,
//! `first_pos`, and `last_pos` for every node and accumulates `follow_pos` on
//! the operand leaves, per the textbook followpos rules. Each operand leaf is
//! assigned its position (the DFA state index) as it is first visited, so
//! the construction emits state numbers in their final form with no separate
//! numbering pass.

use crate::compile::parser::{NodeArena, NodeId, Op, PosSet};
use crate::{CompileError, CompileErrorKind};

/// Evaluate `rpn`, mutating the arena in place. Returns the operand leaves in
/// position order; their index in the returned vector is their state number.
pub(crate) fn evaluate(
    rpn: &[NodeId],
    arena: &mut NodeArena,
) -> Result<Vec<NodeId>, CompileError> {
    let mut stack: Vec<NodeId> = Vec::new();
    let mut operands: Vec<NodeId> = Vec::new();

    for &id in rpn {
        match arena[id].op {
            // Operand leaf: it starts and ends itself, and becomes a state.
            None => {
                let position = operands.len() as u32;
                let node = &mut arena[id];
                node.nullable = false;
                node.first_pos.push(id);
                node.last_pos.push(id);
                node.position = position;
                operands.push(id);
                stack.push(id);
            }
            Some(Op::Star) => {
                let x = pop(&mut stack)?;
                let first = arena[x].first_pos.clone();
                let last = arena[x].last_pos.clone();
                append_follow(arena, &last, &first);
                let node = &mut arena[id];
                node.nullable = true;
                node.first_pos = first;
                node.last_pos = last;
                stack.push(id);
            }
            Some(Op::Opt) => {
                let x = pop(&mut stack)?;
                let first = arena[x].first_pos.clone();
                let last = arena[x].last_pos.clone();
                let node = &mut arena[id];
                node.nullable = true;
                node.first_pos = first;
                node.last_pos = last;
                stack.push(id);
            }
            Some(Op::Plus) => {
                let x = pop(&mut stack)?;
                let nullable = arena[x].nullable;
                let first = arena[x].first_pos.clone();
                let last = arena[x].last_pos.clone();
                append_follow(arena, &last, &first);
                let node = &mut arena[id];
                node.nullable = nullable;
                node.first_pos = first;
                node.last_pos = last;
                stack.push(id);
            }
            Some(Op::Alt) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                let nullable = arena[left].nullable || arena[right].nullable;
                let mut first = arena[left].first_pos.clone();
                first.extend(arena[right].first_pos.iter().copied());
                let mut last = arena[left].last_pos.clone();
                last.extend(arena[right].last_pos.iter().copied());
                let node = &mut arena[id];
                node.nullable = nullable;
                node.first_pos = first;
                node.last_pos = last;
                stack.push(id);
            }
            Some(Op::Concat) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;
                let l_nullable = arena[left].nullable;
                let r_nullable = arena[right].nullable;
                let r_first = arena[right].first_pos.clone();
                let l_last = arena[left].last_pos.clone();

                append_follow(arena, &l_last, &r_first);

                let mut first = arena[left].first_pos.clone();
                if l_nullable {
                    first.extend(r_first.iter().copied());
                }
                let mut last = arena[right].last_pos.clone();
                if r_nullable {
                    last.extend(l_last.iter().copied());
                }
                let node = &mut arena[id];
                node.nullable = l_nullable && r_nullable;
                node.first_pos = first;
                node.last_pos = last;
                stack.push(id);
            }
        }
    }

    if stack.len() != 1 {
        return Err(CompileError::at(CompileErrorKind::ImbalancedExpression, 0));
    }
    Ok(operands)
}

fn pop(stack: &mut Vec<NodeId>) -> Result<NodeId, CompileError> {
    stack
        .pop()
        .ok_or_else(|| CompileError::at(CompileErrorKind::ImbalancedExpression, 0))
}

/// Append `first` to the followpos of every leaf in `last`.
fn append_follow(arena: &mut NodeArena, last: &PosSet, first: &PosSet) {
    for &leaf in last {
        arena[leaf].follow_pos.extend(first.iter().copied());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::parser::to_postfix;
    use crate::lexer::tokenize;

    fn eval_pattern(pattern: &str) -> (NodeArena, Vec<NodeId>) {
        let tokens = tokenize(pattern).unwrap();
        let mut arena = NodeArena::default();
        let rpn = to_postfix(&tokens, &mut arena);
        let operands = evaluate(&rpn, &mut arena).unwrap();
        (arena, operands)
    }

    /// followpos of the operand at `position`, as positions.
    fn follow(arena: &NodeArena, operands: &[NodeId], position: usize) -> Vec<u32> {
        arena[operands[position]]
            .follow_pos
            .iter()
            .map(|&id| arena[id].position)
            .collect()
    }

    #[test]
    fn test_positions_are_dense_and_ordered() {
        // S a b c #
        let (arena, operands) = eval_pattern("abc");
        assert_eq!(operands.len(), 5);
        for (i, &id) in operands.iter().enumerate() {
            assert_eq!(arena[id].position, i as u32);
        }
    }

    #[test]
    fn test_literal_chain_follow() {
        // S=0 a=1 b=2 c=3 #=4: each leaf is followed by the next.
        let (arena, operands) = eval_pattern("abc");
        assert_eq!(follow(&arena, &operands, 0), vec![1]);
        assert_eq!(follow(&arena, &operands, 1), vec![2]);
        assert_eq!(follow(&arena, &operands, 2), vec![3]);
        assert_eq!(follow(&arena, &operands, 3), vec![4]);
        assert_eq!(follow(&arena, &operands, 4), Vec::<u32>::new());
    }

    #[test]
    fn test_star_loops_and_skips() {
        // a*b: S=0 a=1 b=2 #=3.
        let (arena, operands) = eval_pattern("a*b");
        // After S, either the loop or straight to b.
        assert_eq!(follow(&arena, &operands, 0), vec![1, 2]);
        // The loop feeds itself, then b.
        assert_eq!(follow(&arena, &operands, 1), vec![1, 2]);
        assert_eq!(follow(&arena, &operands, 2), vec![3]);
    }

    #[test]
    fn test_plus_keeps_loop_but_not_skip() {
        // a+b: S=0 a=1 b=2 #=3.
        let (arena, operands) = eval_pattern("a+b");
        assert_eq!(follow(&arena, &operands, 0), vec![1]);
        assert_eq!(follow(&arena, &operands, 1), vec![1, 2]);
    }

    #[test]
    fn test_opt_skips_without_loop() {
        // a?b: S=0 a=1 b=2 #=3.
        let (arena, operands) = eval_pattern("a?b");
        assert_eq!(follow(&arena, &operands, 0), vec![1, 2]);
        assert_eq!(follow(&arena, &operands, 1), vec![2]);
    }

    #[test]
    fn test_alternation_fans_out() {
        // a|b: S=0 a=1 b=2 #=3.
        let (arena, operands) = eval_pattern("a|b");
        assert_eq!(follow(&arena, &operands, 0), vec![1, 2]);
        assert_eq!(follow(&arena, &operands, 1), vec![3]);
        assert_eq!(follow(&arena, &operands, 2), vec![3]);
    }

    #[test]
    fn test_nullable_group_concat() {
        // (a?)(b?)c: both groups nullable, so S can reach a, b, or c.
        let (arena, operands) = eval_pattern("(a?)(b?)c");
        assert_eq!(follow(&arena, &operands, 0), vec![1, 2, 3]);
    }

    #[test]
    fn test_imbalanced_expression() {
        let tokens = tokenize("*a").unwrap();
        let mut arena = NodeArena::default();
        let rpn = to_postfix(&tokens, &mut arena);
        let err = evaluate(&rpn, &mut arena).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::ImbalancedExpression);
    }

    #[test]
    fn test_empty_pattern_is_imbalanced() {
        // The framing reduces "" to S()#, which leaves concatenation with a
        // missing operand.
        let tokens = tokenize("").unwrap();
        let mut arena = NodeArena::default();
        let rpn = to_postfix(&tokens, &mut arena);
        let err = evaluate(&rpn, &mut arena).unwrap_err();
        assert_eq!(err.kind, CompileErrorKind::ImbalancedExpression);
    }
}
