//! Structural equality of expression DAGs.

use std::collections::HashSet;

use crate::context::{ExprContext, ExprKind};
use crate::refs::ExprRef;

/// Whether the DAGs rooted at `lhs` and `rhs` have the same structure.
///
/// Calls compare by operator, attributes and arguments; constants by literal.
/// Variables are free, so they are equal only when they are the same node.
/// Types are compared when both sides carry one.
pub fn structural_eq(ctx: &ExprContext, lhs: ExprRef, rhs: ExprRef) -> bool {
    let mut seen: HashSet<(ExprRef, ExprRef)> = HashSet::new();
    let mut stack = vec![(lhs, rhs)];

    while let Some((a, b)) = stack.pop() {
        if a == b || !seen.insert((a, b)) {
            continue;
        }
        if let (Some(ta), Some(tb)) = (ctx.ty(a), ctx.ty(b)) {
            if ta != tb {
                return false;
            }
        }
        match (ctx.kind(a), ctx.kind(b)) {
            (ExprKind::Constant(la), ExprKind::Constant(lb)) if la == lb => {}
            (
                ExprKind::Call {
                    op: op_a,
                    args: args_a,
                    attrs: attrs_a,
                },
                ExprKind::Call {
                    op: op_b,
                    args: args_b,
                    attrs: attrs_b,
                },
            ) if op_a == op_b && attrs_a == attrs_b && args_a.len() == args_b.len() => {
                stack.extend(args_a.iter().copied().zip(args_b.iter().copied()));
            }
            _ => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops;
    use crate::symbol::Symbol;
    use crate::types::{DType, TensorType};

    fn ty(shape: &[i64]) -> TensorType {
        TensorType::from_static(shape, DType::float(32))
    }

    #[test]
    fn separately_built_trees_are_equal() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty(&[2, 3]));
        let a = ops::transpose(&mut ctx, x, Some(&[1, 0]), ty(&[3, 2]));
        let b = ops::transpose(&mut ctx, x, Some(&[1, 0]), ty(&[3, 2]));
        assert_ne!(a, b);
        assert!(structural_eq(&ctx, a, b));
    }

    #[test]
    fn attributes_and_free_vars_matter() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty(&[2, 2]));
        let y = ctx.var(Symbol::new("x"), ty(&[2, 2]));
        let a = ops::transpose(&mut ctx, x, Some(&[1, 0]), ty(&[2, 2]));
        let b = ops::transpose(&mut ctx, x, Some(&[0, 1]), ty(&[2, 2]));
        let c = ops::transpose(&mut ctx, y, Some(&[1, 0]), ty(&[2, 2]));
        assert!(!structural_eq(&ctx, a, b));
        assert!(!structural_eq(&ctx, a, c));
        assert!(!structural_eq(&ctx, x, y));
    }
}
