//! Fold back-to-back reshapes into one.

use tensile_ir::{ExprContext, ExprRef, ops};

use crate::driver::RewriteCallback;
use crate::errors::RewriteResult;
use crate::matcher::Bindings;
use crate::pattern::{PatternContext, PatternRef};

/// `reshape(reshape(x))` -> `reshape(x)` with the outer result shape.
///
/// Either reshape may be a `contrib_reverse_reshape`. Only fires when the
/// outer result shape is fully static.
pub struct SimplifyReshape {
    pattern: PatternRef,
    x: PatternRef,
}

impl SimplifyReshape {
    pub fn new(p: &mut PatternContext) -> Self {
        let x = p.wildcard();
        let inner_op = p.is_any_op([ops::RESHAPE(), ops::REVERSE_RESHAPE()]);
        let inner = p.call(inner_op, [x]);
        let outer_op = p.is_any_op([ops::RESHAPE(), ops::REVERSE_RESHAPE()]);
        let pattern = p.call(outer_op, [inner]);
        Self { pattern, x }
    }
}

impl RewriteCallback for SimplifyReshape {
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
        let ty = ctx.checked_type(pre)?.clone();
        let Some(newshape) = ty.static_shape() else {
            return Ok(post);
        };
        Ok(ops::reshape(ctx, x, &newshape, ty))
    }

    fn name(&self) -> &'static str {
        "SimplifyReshape"
    }
}
