//! Constant-folding constructors.
//!
//! Every index expression produced by the simplifier goes through these
//! builders, which fold integer operands and drop identity operations
//! (`x * 1`, `x + 0`, `floordiv(x, 1)`). They never reassociate.

use std::ops::{Add, Mul, Sub};

use crate::expr::{IndexExpr, IndexKind};

/// `a / b` rounded toward negative infinity; `None` on division by zero or overflow.
pub fn floor_div_i64(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder of floor division, taking the sign of `b`.
pub fn floor_mod_i64(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        r.checked_add(b)
    } else {
        Some(r)
    }
}

pub fn add(a: IndexExpr, b: IndexExpr) -> IndexExpr {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if let Some(v) = x.checked_add(y) {
                return IndexExpr::int(v);
            }
        }
        (Some(0), None) => return b,
        (None, Some(0)) => return a,
        _ => {}
    }
    IndexExpr::new(IndexKind::Add(a, b))
}

pub fn sub(a: IndexExpr, b: IndexExpr) -> IndexExpr {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if let Some(v) = x.checked_sub(y) {
                return IndexExpr::int(v);
            }
        }
        (None, Some(0)) => return a,
        _ => {}
    }
    if a == b {
        return IndexExpr::int(0);
    }
    IndexExpr::new(IndexKind::Sub(a, b))
}

pub fn mul(a: IndexExpr, b: IndexExpr) -> IndexExpr {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if let Some(v) = x.checked_mul(y) {
                return IndexExpr::int(v);
            }
        }
        (Some(1), None) => return b,
        (Some(0), None) => return a,
        (None, Some(1)) => return a,
        (None, Some(0)) => return b,
        _ => {}
    }
    IndexExpr::new(IndexKind::Mul(a, b))
}

/// Floor division. A zero divisor is left unfolded for evaluation to report.
pub fn floordiv(a: IndexExpr, b: IndexExpr) -> IndexExpr {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if let Some(v) = floor_div_i64(x, y) {
                return IndexExpr::int(v);
            }
        }
        (Some(0), None) => return a,
        (None, Some(1)) => return a,
        _ => {}
    }
    IndexExpr::new(IndexKind::FloorDiv(a, b))
}

pub fn floormod(a: IndexExpr, b: IndexExpr) -> IndexExpr {
    match (a.as_int(), b.as_int()) {
        (Some(x), Some(y)) => {
            if let Some(v) = floor_mod_i64(x, y) {
                return IndexExpr::int(v);
            }
        }
        (Some(0), None) => return a,
        (None, Some(1)) => return IndexExpr::int(0),
        _ => {}
    }
    IndexExpr::new(IndexKind::FloorMod(a, b))
}

/// `lanes` consecutive indices starting at `base`. A single lane is just `base`.
pub fn ramp(base: IndexExpr, stride: IndexExpr, lanes: u16) -> IndexExpr {
    if lanes == 1 {
        return base;
    }
    IndexExpr::new(IndexKind::Ramp {
        base,
        stride,
        lanes,
    })
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $builder:ident) => {
        impl $trait for IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: IndexExpr) -> IndexExpr {
                $builder(self, rhs)
            }
        }

        impl $trait<&IndexExpr> for &IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: &IndexExpr) -> IndexExpr {
                $builder(self.clone(), rhs.clone())
            }
        }

        impl $trait<i64> for IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: i64) -> IndexExpr {
                $builder(self, IndexExpr::int(rhs))
            }
        }

        impl $trait<i64> for &IndexExpr {
            type Output = IndexExpr;

            fn $method(self, rhs: i64) -> IndexExpr {
                $builder(self.clone(), IndexExpr::int(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, add);
impl_binary_op!(Sub, sub, sub);
impl_binary_op!(Mul, mul, mul);
