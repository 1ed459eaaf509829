//! Pre-simplification applied before mul/mod cancellation.

use crate::expr::{IndexExpr, IndexKind};
use crate::fold;

/// Rewrites an index expression into an equivalent canonical form.
///
/// `normalize` runs the simplifier first and only then looks for mul/mod
/// cancellations, so a stronger simplifier exposes more of them.
pub trait Simplifier {
    fn simplify(&self, expr: &IndexExpr) -> IndexExpr;
}

/// Bottom-up rebuild through the folding constructors.
///
/// Applying it twice gives the same result as applying it once.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstFold;

impl Simplifier for ConstFold {
    fn simplify(&self, expr: &IndexExpr) -> IndexExpr {
        match expr.kind() {
            IndexKind::Int(_) | IndexKind::Var(_) => expr.clone(),
            IndexKind::Add(a, b) => fold::add(self.simplify(a), self.simplify(b)),
            IndexKind::Sub(a, b) => fold::sub(self.simplify(a), self.simplify(b)),
            IndexKind::Mul(a, b) => fold::mul(self.simplify(a), self.simplify(b)),
            IndexKind::FloorDiv(a, b) => fold::floordiv(self.simplify(a), self.simplify(b)),
            IndexKind::FloorMod(a, b) => fold::floormod(self.simplify(a), self.simplify(b)),
            IndexKind::Ramp {
                base,
                stride,
                lanes,
            } => fold::ramp(self.simplify(base), self.simplify(stride), *lanes),
        }
    }
}

impl<S: Simplifier + ?Sized> Simplifier for &S {
    fn simplify(&self, expr: &IndexExpr) -> IndexExpr {
        (**self).simplify(expr)
    }
}
