//! Fold chains of axis permutations.
//!
//! `transpose` and `layout_transform` both reorder axes. Two of them in a row
//! collapse into one `transpose`, or into one `layout_transform` when either
//! side changes the rank (`NCHW` to `NCHW4c` and back).

use smallvec::SmallVec;
use tensile_ir::{ExprContext, ExprRef, Layout, Symbol, TensorType, ops};

use crate::driver::RewriteCallback;
use crate::errors::{RewriteError, RewriteResult};
use crate::matcher::Bindings;
use crate::pattern::{PatternContext, PatternRef};

type AxisOrder = SmallVec<[usize; 6]>;

pub struct SimplifyTranspose {
    pattern: PatternRef,
}

impl SimplifyTranspose {
    pub fn new(p: &mut PatternContext) -> Self {
        let x = p.wildcard();
        let inner_op = p.is_any_op([ops::TRANSPOSE(), ops::LAYOUT_TRANSFORM()]);
        let inner = p.call(inner_op, [x]);
        let outer_op = p.is_any_op([ops::TRANSPOSE(), ops::LAYOUT_TRANSFORM()]);
        let pattern = p.call(outer_op, [inner]);
        Self { pattern }
    }
}

impl RewriteCallback for SimplifyTranspose {
    fn pattern(&self) -> PatternRef {
        self.pattern
    }

    fn rewrite(
        &self,
        ctx: &mut ExprContext,
        pre: ExprRef,
        post: ExprRef,
        _bindings: &Bindings,
    ) -> RewriteResult<ExprRef> {
        let Some(&inner) = ctx.args(post).first() else {
            return Ok(post);
        };
        // The inner permutation may already have been folded away.
        if !is_axis_permuting(ctx, inner) {
            return Ok(post);
        }
        let Some(&data) = ctx.args(inner).first() else {
            return Ok(post);
        };
        let ty = ctx.checked_type(pre)?.clone();

        if ctx.is_call_to(post, ops::LAYOUT_TRANSFORM())
            && ctx.is_call_to(inner, ops::LAYOUT_TRANSFORM())
        {
            let expected = layout_attr(ctx, post, ops::ATTR_SRC_LAYOUT())?;
            let found = layout_attr(ctx, inner, ops::ATTR_DST_LAYOUT())?;
            if expected != found {
                return Err(RewriteError::LayoutMismatch {
                    expected: expected.name().to_owned(),
                    found: found.name().to_owned(),
                });
            }
            if rank_changing_layouts(ctx, post)?.is_some()
                || rank_changing_layouts(ctx, inner)?.is_some()
            {
                let src = layout_attr(ctx, inner, ops::ATTR_SRC_LAYOUT())?;
                let dst = layout_attr(ctx, post, ops::ATTR_DST_LAYOUT())?;
                return Ok(fused_layout_transform(ctx, data, src, dst, ty));
            }
        } else if let Some(change) = RankChange::find(ctx, post, inner)? {
            let (src, dst) = change.fold(ctx)?;
            return Ok(fused_layout_transform(ctx, data, src, dst, ty));
        }

        let ndim = ty.rank();
        let mut axes: AxisOrder = (0..ndim).collect();
        for call in [inner, post] {
            let order = axis_order(ctx, call, ndim)?;
            axes = order.iter().map(|&i| axes[i]).collect();
        }

        if axes.iter().enumerate().all(|(i, &axis)| i == axis) {
            return Ok(data);
        }
        let axes: SmallVec<[i64; 6]> = axes.iter().map(|&axis| axis as i64).collect();
        Ok(ops::transpose(ctx, data, Some(axes.as_slice()), ty))
    }

    fn name(&self) -> &'static str {
        "SimplifyTranspose"
    }
}

/// A rank-changing layout transform next to a transpose.
struct RankChange {
    src: Layout,
    dst: Layout,
    transpose: ExprRef,
    /// The transpose feeds the layout transform rather than consuming it.
    transpose_first: bool,
}

impl RankChange {
    fn find(ctx: &ExprContext, outer: ExprRef, inner: ExprRef) -> RewriteResult<Option<Self>> {
        if let Some((src, dst)) = rank_changing_layouts(ctx, outer)? {
            return Ok(Some(RankChange {
                src,
                dst,
                transpose: inner,
                transpose_first: true,
            }));
        }
        if let Some((src, dst)) = rank_changing_layouts(ctx, inner)? {
            return Ok(Some(RankChange {
                src,
                dst,
                transpose: outer,
                transpose_first: false,
            }));
        }
        Ok(None)
    }

    /// Source and destination layouts of the fused transform.
    ///
    /// A leading transpose is absorbed into the source layout, a trailing one
    /// into the destination layout.
    fn fold(self, ctx: &ExprContext) -> RewriteResult<(Layout, Layout)> {
        if self.transpose_first {
            let order = axis_order(ctx, self.transpose, self.src.ndim())?;
            let mut inverse: AxisOrder = SmallVec::from_elem(0, order.len());
            for (i, &axis) in order.iter().enumerate() {
                inverse[axis] = i;
            }
            Ok((self.src.permute(&inverse)?, self.dst))
        } else {
            let order = axis_order(ctx, self.transpose, self.dst.ndim())?;
            Ok((self.src, self.dst.permute(&order)?))
        }
    }
}

fn fused_layout_transform(
    ctx: &mut ExprContext,
    data: ExprRef,
    src: Layout,
    dst: Layout,
    ty: TensorType,
) -> ExprRef {
    if src == dst {
        return data;
    }
    ops::layout_transform(ctx, data, src.name(), dst.name(), ty)
}

fn is_axis_permuting(ctx: &ExprContext, expr: ExprRef) -> bool {
    ctx.is_call_to(expr, ops::TRANSPOSE()) || ctx.is_call_to(expr, ops::LAYOUT_TRANSFORM())
}

fn layout_attr(ctx: &ExprContext, call: ExprRef, key: Symbol) -> RewriteResult<Layout> {
    let op = ctx.call_op(call).unwrap_or(ops::LAYOUT_TRANSFORM());
    let text = ctx
        .attr(call, key)
        .and_then(|attr| attr.as_str())
        .ok_or(RewriteError::MissingAttr { op, attr: key })?;
    Ok(Layout::parse(&text)?)
}

/// Layouts of a layout transform whose layout strings differ in length.
fn rank_changing_layouts(
    ctx: &ExprContext,
    call: ExprRef,
) -> RewriteResult<Option<(Layout, Layout)>> {
    if !ctx.is_call_to(call, ops::LAYOUT_TRANSFORM()) {
        return Ok(None);
    }
    let src = layout_attr(ctx, call, ops::ATTR_SRC_LAYOUT())?;
    let dst = layout_attr(ctx, call, ops::ATTR_DST_LAYOUT())?;
    if src.name().len() == dst.name().len() {
        return Ok(None);
    }
    Ok(Some((src, dst)))
}

/// Axis `i` of the result of `call` is axis `order[i]` of its input.
fn axis_order(ctx: &ExprContext, call: ExprRef, ndim: usize) -> RewriteResult<AxisOrder> {
    let op = ctx.call_op(call).ok_or(RewriteError::NotAxisPermuting(call))?;
    let invalid = |reason: String| RewriteError::InvalidAxes { op, reason };

    if op == ops::TRANSPOSE() {
        let axes = ctx
            .attr(call, ops::ATTR_AXES())
            .and_then(|attr| attr.as_int_list())
            .unwrap_or_default();
        if axes.is_empty() {
            return Ok((0..ndim).rev().collect());
        }
        let mut order = AxisOrder::new();
        for i in 0..ndim {
            let &axis = axes
                .get(i)
                .ok_or_else(|| invalid(format!("expected {ndim} axes, found {}", axes.len())))?;
            let normalized = if axis < 0 { axis + ndim as i64 } else { axis };
            if !(0..ndim as i64).contains(&normalized) {
                return Err(invalid(format!("axis {axis} out of range for rank {ndim}")));
            }
            let normalized = normalized as usize;
            if order.contains(&normalized) {
                return Err(invalid(format!("axis {axis} repeated")));
            }
            order.push(normalized);
        }
        Ok(order)
    } else if op == ops::LAYOUT_TRANSFORM() {
        let src = layout_attr(ctx, call, ops::ATTR_SRC_LAYOUT())?;
        let dst = layout_attr(ctx, call, ops::ATTR_DST_LAYOUT())?;
        (0..ndim)
            .map(|i| {
                dst.axes()
                    .get(i)
                    .and_then(|axis| src.index_of(axis))
                    .ok_or_else(|| invalid(format!("`{dst}` axis {i} has no source in `{src}`")))
            })
            .collect()
    } else {
        Err(RewriteError::NotAxisPermuting(call))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::PatternRewriter;
    use tensile_ir::{DType, TensorType, print_expr};

    fn rewriter() -> PatternRewriter {
        let mut p = PatternContext::new();
        let rule = SimplifyTranspose::new(&mut p);
        PatternRewriter::new(p).add_callback(rule)
    }

    fn f32_ty(shape: &[i64]) -> TensorType {
        TensorType::from_static(shape, DType::float(32))
    }

    #[test]
    fn transposes_compose() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 2, 3, 4]));
        let a = ops::transpose(&mut ctx, x, Some(&[0, 2, 3, 1]), f32_ty(&[1, 3, 4, 2]));
        let b = ops::transpose(&mut ctx, a, Some(&[0, 2, 1, 3]), f32_ty(&[1, 4, 3, 2]));

        let result = rewriter().rewrite(&mut ctx, b).unwrap();
        insta::assert_snapshot!(print_expr(&ctx, result), @r"
        %0 = var @x : tensor<1x2x3x4xfloat32>
        %1 = transpose(%0) {axes = [0, 3, 2, 1]} : tensor<1x4x3x2xfloat32>
        ");
    }

    #[test]
    fn inverse_transposes_cancel() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 2, 3]));
        let a = ops::transpose(&mut ctx, x, Some(&[0, 2, 1]), f32_ty(&[1, 3, 2]));
        let b = ops::transpose(&mut ctx, a, Some(&[0, -1, -2]), f32_ty(&[1, 2, 3]));

        assert_eq!(rewriter().rewrite(&mut ctx, b).unwrap(), x);
    }

    #[test]
    fn missing_axes_reverse() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 2, 3]));
        let a = ops::transpose(&mut ctx, x, None, f32_ty(&[3, 2, 1]));
        let b = ops::transpose(&mut ctx, a, None, f32_ty(&[1, 2, 3]));

        assert_eq!(rewriter().rewrite(&mut ctx, b).unwrap(), x);
    }

    #[test]
    fn layout_round_trip_is_elided() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 3, 8, 8]));
        let a = ops::layout_transform(&mut ctx, x, "NCHW", "NHWC", f32_ty(&[1, 8, 8, 3]));
        let b = ops::layout_transform(&mut ctx, a, "NHWC", "NCHW", f32_ty(&[1, 3, 8, 8]));

        assert_eq!(rewriter().rewrite(&mut ctx, b).unwrap(), x);
    }

    #[test]
    fn transpose_then_packing_becomes_one_layout_transform() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 8, 8, 16]));
        let a = ops::transpose(&mut ctx, x, Some(&[0, 3, 1, 2]), f32_ty(&[1, 16, 8, 8]));
        let b = ops::layout_transform(&mut ctx, a, "NCHW", "NCHW4c", f32_ty(&[1, 4, 8, 8, 4]));

        let result = rewriter().rewrite(&mut ctx, b).unwrap();
        insta::assert_snapshot!(print_expr(&ctx, result), @r#"
        %0 = var @x : tensor<1x8x8x16xfloat32>
        %1 = layout_transform(%0) {dst_layout = "NCHW4c", src_layout = "NHWC"} : tensor<1x4x8x8x4xfloat32>
        "#);
    }

    #[test]
    fn unpacking_then_transpose_becomes_one_layout_transform() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 4, 8, 8, 4]));
        let a = ops::layout_transform(&mut ctx, x, "NCHW4c", "NCHW", f32_ty(&[1, 16, 8, 8]));
        let b = ops::transpose(&mut ctx, a, Some(&[0, 2, 3, 1]), f32_ty(&[1, 8, 8, 16]));

        let result = rewriter().rewrite(&mut ctx, b).unwrap();
        insta::assert_snapshot!(print_expr(&ctx, result), @r#"
        %0 = var @x : tensor<1x4x8x8x4xfloat32>
        %1 = layout_transform(%0) {dst_layout = "NHWC", src_layout = "NCHW4c"} : tensor<1x8x8x16xfloat32>
        "#);
    }

    #[test]
    fn transpose_before_unpacking_moves_source_axes() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 4, 8, 6, 4]));
        let a = ops::transpose(&mut ctx, x, Some(&[0, 1, 3, 2, 4]), f32_ty(&[1, 4, 6, 8, 4]));
        let b = ops::layout_transform(&mut ctx, a, "NCHW4c", "NCHW", f32_ty(&[1, 16, 6, 8]));

        let result = rewriter().rewrite(&mut ctx, b).unwrap();
        insta::assert_snapshot!(print_expr(&ctx, result), @r#"
        %0 = var @x : tensor<1x4x8x6x4xfloat32>
        %1 = layout_transform(%0) {dst_layout = "NCHW", src_layout = "NCWH4c"} : tensor<1x16x6x8xfloat32>
        "#);
    }

    #[test]
    fn packing_round_trip_is_elided() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 4, 8, 8, 4]));
        let a = ops::layout_transform(&mut ctx, x, "NCHW4c", "NCHW", f32_ty(&[1, 16, 8, 8]));
        let b = ops::layout_transform(&mut ctx, a, "NCHW", "NCHW4c", f32_ty(&[1, 4, 8, 8, 4]));

        assert_eq!(rewriter().rewrite(&mut ctx, b).unwrap(), x);
    }

    #[test]
    fn mismatched_intermediate_layout_is_an_error() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 4, 8, 8, 4]));
        let a = ops::layout_transform(&mut ctx, x, "NCHW4c", "NCHW", f32_ty(&[1, 16, 8, 8]));
        let b = ops::layout_transform(&mut ctx, a, "NHWC", "NHWC4c", f32_ty(&[1, 2, 8, 16, 4]));

        let err = rewriter().rewrite(&mut ctx, b).unwrap_err();
        assert_eq!(
            err,
            RewriteError::LayoutMismatch {
                expected: "NHWC".to_owned(),
                found: "NCHW".to_owned(),
            }
        );
    }

    #[test]
    fn axis_order_of_layout_transform() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), f32_ty(&[1, 3, 8, 8]));
        let lt = ops::layout_transform(&mut ctx, x, "NCHW", "NHWC", f32_ty(&[1, 8, 8, 3]));
        assert_eq!(axis_order(&ctx, lt, 4).unwrap().as_slice(), &[0, 2, 3, 1]);

        let add = ops::binary(&mut ctx, ops::ADD(), x, x, f32_ty(&[1, 3, 8, 8]));
        assert_eq!(
            axis_order(&ctx, add, 4).unwrap_err(),
            RewriteError::NotAxisPermuting(add)
        );
    }
}
