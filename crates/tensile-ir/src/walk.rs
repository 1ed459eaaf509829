//! Traversal utilities for the expression DAG.

use cranelift_entity::EntitySet;

use crate::context::ExprContext;
use crate::refs::ExprRef;

/// Every node reachable from `root`, children before parents.
///
/// Shared subexpressions appear once. The traversal keeps an explicit stack,
/// so deep chains do not grow the call stack.
pub fn post_order(ctx: &ExprContext, root: ExprRef) -> Vec<ExprRef> {
    let mut visited = EntitySet::<ExprRef>::new();
    let mut order = Vec::new();
    // (node, children already pushed)
    let mut stack = vec![(root, false)];

    while let Some((expr, expanded)) = stack.pop() {
        if expanded {
            order.push(expr);
            continue;
        }
        if visited.contains(expr) {
            continue;
        }
        visited.insert(expr);
        stack.push((expr, true));
        for &arg in ctx.args(expr).iter().rev() {
            if !visited.contains(arg) {
                stack.push((arg, false));
            }
        }
    }
    order
}
