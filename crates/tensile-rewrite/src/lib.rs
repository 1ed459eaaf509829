//! Tensile rewrite crate.
//!
//! Dataflow patterns over the expression DAG, a bottom-up rewrite driver and
//! the built-in expression simplification rules.

pub mod driver;
pub mod errors;
pub mod matcher;
pub mod pattern;
pub mod rules;

pub use driver::{PatternRewriter, RewriteCallback, RewriteConfig};
pub use errors::{RewriteError, RewriteResult};
pub use matcher::{Bindings, match_pattern};
pub use pattern::{PatternContext, PatternNode, PatternRef};

use tensile_ir::{ExprContext, ExprRef, post_order};

/// Rewriter with the built-in rules, in the order they are tried:
/// reshape folding, permutation folding, fill absorption.
pub fn builtin_rewriter() -> PatternRewriter {
    let mut p = PatternContext::new();
    let reshape = rules::SimplifyReshape::new(&mut p);
    let transpose = rules::SimplifyTranspose::new(&mut p);
    let full = rules::FullElementwise::new(&mut p);
    PatternRewriter::new(p)
        .add_callback(reshape)
        .add_callback(transpose)
        .add_callback(full)
}

/// Simplify the expression rooted at `root` and return the new root.
///
/// Every reachable node must carry a checked type. Nodes are never modified;
/// the result shares every unchanged sub-graph with the input.
pub fn simplify_expr(ctx: &mut ExprContext, root: ExprRef) -> RewriteResult<ExprRef> {
    simplify_expr_with(ctx, root, RewriteConfig::default())
}

/// [`simplify_expr`] with an explicit driver configuration.
pub fn simplify_expr_with(
    ctx: &mut ExprContext,
    root: ExprRef,
    config: RewriteConfig,
) -> RewriteResult<ExprRef> {
    if let Some(untyped) = post_order(ctx, root)
        .into_iter()
        .find(|&expr| ctx.ty(expr).is_none())
    {
        return Err(RewriteError::MissingType(untyped));
    }
    let result = builtin_rewriter()
        .with_config(config)
        .rewrite(ctx, root)?;
    tracing::debug!(%root, %result, "simplified expression");
    Ok(result)
}
