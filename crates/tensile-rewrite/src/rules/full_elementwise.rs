//! Replace a materialized fill operand of a broadcasting op with a scalar.

use tensile_ir::registry::ATTR_OP_PATTERN;
use tensile_ir::{
    CallBuilder, ExprContext, ExprRef, OpPatternKind, is_scalar_constant, make_scalar_constant,
    ops,
};

use crate::driver::RewriteCallback;
use crate::errors::{RewriteError, RewriteResult};
use crate::matcher::Bindings;
use crate::pattern::{PatternContext, PatternRef};

/// `op(full(c), x)` -> `op(c, x)` for broadcasting `op`, either operand order.
///
/// `ones`/`zeros` and their `_like` forms become the scalar `1`/`0`. The
/// rewrite only fires when `x` alone already has the result type, so the
/// dropped fill never contributed to the broadcast shape.
pub struct FullElementwise {
    pattern: PatternRef,
    x: PatternRef,
    value: PatternRef,
    full: PatternRef,
    ones: PatternRef,
    zeros: PatternRef,
}

impl FullElementwise {
    pub fn new(p: &mut PatternContext) -> Self {
        let x = p.wildcard();
        let data = p.wildcard();
        let value = p.is_constant();

        let full = p.call_op(ops::FULL(), [value]);
        let full_like = p.call_op(ops::FULL_LIKE(), [data, value]);
        let full = p.or(full, full_like);
        let ones = p.call_op(ops::ONES(), []);
        let ones_like = p.call_op(ops::ONES_LIKE(), [data]);
        let ones = p.or(ones, ones_like);
        let zeros = p.call_op(ops::ZEROS(), []);
        let zeros_like = p.call_op(ops::ZEROS_LIKE(), [data]);
        let zeros = p.or(zeros, zeros_like);
        let fill = p.alt([full, ones, zeros]);

        let any_op = p.wildcard();
        let op = p.has_attr(
            any_op,
            ATTR_OP_PATTERN(),
            OpPatternKind::Broadcast.as_attribute(),
        );
        let fill_first = p.call(op, [fill, x]);
        let fill_second = p.call(op, [x, fill]);
        let pattern = p.or(fill_first, fill_second);

        Self {
            pattern,
            x,
            value,
            full,
            ones,
            zeros,
        }
    }
}

impl RewriteCallback for FullElementwise {
    fn pattern(&self) -> PatternRef {
        self.pattern
    }

    fn rewrite(
        &self,
        ctx: &mut ExprContext,
        pre: ExprRef,
        post: ExprRef,
        bindings: &Bindings,
    ) -> RewriteResult<ExprRef> {
        let Some(x) = bindings.get(self.x) else {
            return Ok(post);
        };
        let pre_ty = ctx.checked_type(pre)?.clone();
        let fill_on_left = ctx.args(post).get(1) == Some(&x);
        let x_pre = match (ctx.args(pre), fill_on_left) {
            ([_, rhs], true) => *rhs,
            ([lhs, _], false) => *lhs,
            _ => return Ok(post),
        };
        if *ctx.checked_type(x_pre)? != pre_ty {
            return Ok(post);
        }

        let value = if bindings.contains(self.full) {
            let Some(value) = bindings.get(self.value) else {
                return Ok(post);
            };
            if !is_scalar_constant(ctx, value) {
                return Err(RewriteError::NonScalarFill(value));
            }
            value
        } else if bindings.contains(self.ones) {
            make_scalar_constant(ctx, pre_ty.dtype, 1)
        } else if bindings.contains(self.zeros) {
            make_scalar_constant(ctx, pre_ty.dtype, 0)
        } else {
            return Ok(post);
        };

        let Some(op) = ctx.call_op(pre) else {
            return Ok(post);
        };
        let attrs = ctx.attrs(pre).cloned().unwrap_or_default();
        let args = if fill_on_left { [value, x] } else { [x, value] };
        Ok(CallBuilder::new(op)
            .args(args)
            .attrs(attrs)
            .ty(pre_ty)
            .build(ctx))
    }

    fn name(&self) -> &'static str {
        "FullElementwise"
    }
}
