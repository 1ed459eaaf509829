//! Constant utilities used by rewrites that materialize scalars.

use crate::context::{ExprContext, Literal, ScalarValue};
use crate::refs::ExprRef;
use crate::types::DType;

/// Whether `expr` is a rank-0 constant.
pub fn is_scalar_constant(ctx: &ExprContext, expr: ExprRef) -> bool {
    ctx.literal(expr).is_some_and(Literal::is_scalar)
}

/// Scalar constant holding the integer `value` converted to `dtype`.
pub fn make_scalar_constant(ctx: &mut ExprContext, dtype: DType, value: i64) -> ExprRef {
    ctx.constant(Literal::scalar(dtype, ScalarValue::from_i64(dtype, value)))
}
