//! Operator names, attribute keys and constructors for the tensor operators
//! the optimizer rewrites.
//!
//! Constructors take the result type explicitly: they are used both by
//! front ends (which know the type from inference) and by type-preserving
//! rewrites (which reuse the type of the node being replaced).

use crate::attrs::Attribute;
use crate::context::{CallBuilder, ExprContext, Literal, ScalarValue};
use crate::refs::ExprRef;
use crate::symbol::Symbol;
use crate::types::{DType, TensorType};

crate::symbols! {
    ADD => "add",
    SUBTRACT => "subtract",
    MULTIPLY => "multiply",
    DIVIDE => "divide",
    MAXIMUM => "maximum",
    MINIMUM => "minimum",
    POWER => "power",
    RELU => "nn.relu",
    NEGATIVE => "negative",
    EXP => "exp",
    SUM => "sum",
    CONV2D => "nn.conv2d",
    RESHAPE => "reshape",
    REVERSE_RESHAPE => "contrib_reverse_reshape",
    TRANSPOSE => "transpose",
    LAYOUT_TRANSFORM => "layout_transform",
    FULL => "full",
    FULL_LIKE => "full_like",
    ONES => "ones",
    ONES_LIKE => "ones_like",
    ZEROS => "zeros",
    ZEROS_LIKE => "zeros_like",
}

crate::symbols! {
    ATTR_NEWSHAPE => "newshape",
    ATTR_AXES => "axes",
    ATTR_SRC_LAYOUT => "src_layout",
    ATTR_DST_LAYOUT => "dst_layout",
    ATTR_SHAPE => "shape",
    ATTR_DTYPE => "dtype",
}

/// `reshape(data, newshape)`.
pub fn reshape(ctx: &mut ExprContext, data: ExprRef, newshape: &[i64], ty: TensorType) -> ExprRef {
    CallBuilder::new(RESHAPE())
        .arg(data)
        .attr(ATTR_NEWSHAPE(), Attribute::int_list(newshape.iter().copied()))
        .ty(ty)
        .build(ctx)
}

/// `contrib_reverse_reshape(data, newshape)`: `newshape` is read right to left.
pub fn reverse_reshape(
    ctx: &mut ExprContext,
    data: ExprRef,
    newshape: &[i64],
    ty: TensorType,
) -> ExprRef {
    CallBuilder::new(REVERSE_RESHAPE())
        .arg(data)
        .attr(ATTR_NEWSHAPE(), Attribute::int_list(newshape.iter().copied()))
        .ty(ty)
        .build(ctx)
}

/// `transpose(data, axes)`. Without axes the dimensions are reversed.
pub fn transpose(
    ctx: &mut ExprContext,
    data: ExprRef,
    axes: Option<&[i64]>,
    ty: TensorType,
) -> ExprRef {
    let mut builder = CallBuilder::new(TRANSPOSE()).arg(data).ty(ty);
    if let Some(axes) = axes {
        builder = builder.attr(ATTR_AXES(), Attribute::int_list(axes.iter().copied()));
    }
    builder.build(ctx)
}

/// `layout_transform(data, src_layout, dst_layout)`.
pub fn layout_transform(
    ctx: &mut ExprContext,
    data: ExprRef,
    src_layout: &str,
    dst_layout: &str,
    ty: TensorType,
) -> ExprRef {
    CallBuilder::new(LAYOUT_TRANSFORM())
        .arg(data)
        .attr(ATTR_SRC_LAYOUT(), src_layout)
        .attr(ATTR_DST_LAYOUT(), dst_layout)
        .ty(ty)
        .build(ctx)
}

/// Binary operator call, e.g. `add(lhs, rhs)`.
pub fn binary(
    ctx: &mut ExprContext,
    op: Symbol,
    lhs: ExprRef,
    rhs: ExprRef,
    ty: TensorType,
) -> ExprRef {
    CallBuilder::new(op).arg(lhs).arg(rhs).ty(ty).build(ctx)
}

/// Scalar constant of `dtype`.
pub fn scalar(ctx: &mut ExprContext, dtype: DType, value: ScalarValue) -> ExprRef {
    ctx.constant(Literal::scalar(dtype, value))
}

/// `full(fill_value)` materialized to a static `shape`.
pub fn full(ctx: &mut ExprContext, fill_value: ExprRef, shape: &[i64], dtype: DType) -> ExprRef {
    CallBuilder::new(FULL())
        .arg(fill_value)
        .attr(ATTR_SHAPE(), Attribute::int_list(shape.iter().copied()))
        .attr(ATTR_DTYPE(), dtype)
        .ty(TensorType::from_static(shape, dtype))
        .build(ctx)
}

/// `full_like(data, fill_value)`, typed like `data`.
pub fn full_like(ctx: &mut ExprContext, data: ExprRef, fill_value: ExprRef) -> ExprRef {
    let ty = ctx.ty(data).cloned();
    CallBuilder::new(FULL_LIKE())
        .arg(data)
        .arg(fill_value)
        .maybe_ty(ty)
        .build(ctx)
}

/// `ones(shape)` or `zeros(shape)` style constructor with no arguments.
fn filled(ctx: &mut ExprContext, op: Symbol, shape: &[i64], dtype: DType) -> ExprRef {
    CallBuilder::new(op)
        .attr(ATTR_SHAPE(), Attribute::int_list(shape.iter().copied()))
        .attr(ATTR_DTYPE(), dtype)
        .ty(TensorType::from_static(shape, dtype))
        .build(ctx)
}

/// `ones_like(data)` or `zeros_like(data)` style constructor.
fn filled_like(ctx: &mut ExprContext, op: Symbol, data: ExprRef) -> ExprRef {
    let ty = ctx.ty(data).cloned();
    CallBuilder::new(op).arg(data).maybe_ty(ty).build(ctx)
}

pub fn ones(ctx: &mut ExprContext, shape: &[i64], dtype: DType) -> ExprRef {
    filled(ctx, ONES(), shape, dtype)
}

pub fn zeros(ctx: &mut ExprContext, shape: &[i64], dtype: DType) -> ExprRef {
    filled(ctx, ZEROS(), shape, dtype)
}

pub fn ones_like(ctx: &mut ExprContext, data: ExprRef) -> ExprRef {
    filled_like(ctx, ONES_LIKE(), data)
}

pub fn zeros_like(ctx: &mut ExprContext, data: ExprRef) -> ExprRef {
    filled_like(ctx, ZEROS_LIKE(), data)
}
