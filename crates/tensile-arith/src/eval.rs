//! Evaluation of index expressions under a variable assignment.

use std::collections::HashMap;

use smallvec::SmallVec;
use tensile_ir::Symbol;

use crate::errors::{ArithError, ArithResult};
use crate::expr::{IndexExpr, IndexKind};
use crate::fold::{floor_div_i64, floor_mod_i64};

/// Variable assignment.
pub type Env = HashMap<Symbol, i64>;

/// Value of a scalar expression. Ramps are rejected with `NotScalar`.
pub fn eval(expr: &IndexExpr, env: &Env) -> ArithResult<i64> {
    let overflow = || ArithError::Overflow(expr.clone());
    Ok(match expr.kind() {
        IndexKind::Int(v) => *v,
        IndexKind::Var(name) => *env.get(name).ok_or(ArithError::UnboundVariable(*name))?,
        IndexKind::Add(a, b) => eval(a, env)?
            .checked_add(eval(b, env)?)
            .ok_or_else(overflow)?,
        IndexKind::Sub(a, b) => eval(a, env)?
            .checked_sub(eval(b, env)?)
            .ok_or_else(overflow)?,
        IndexKind::Mul(a, b) => eval(a, env)?
            .checked_mul(eval(b, env)?)
            .ok_or_else(overflow)?,
        IndexKind::FloorDiv(a, b) | IndexKind::FloorMod(a, b) => {
            let (x, y) = (eval(a, env)?, eval(b, env)?);
            if y == 0 {
                return Err(ArithError::DivisionByZero(expr.clone()));
            }
            let result = if matches!(expr.kind(), IndexKind::FloorDiv(..)) {
                floor_div_i64(x, y)
            } else {
                floor_mod_i64(x, y)
            };
            result.ok_or_else(overflow)?
        }
        IndexKind::Ramp { .. } => return Err(ArithError::NotScalar(expr.clone())),
    })
}

/// Per-lane values; a scalar expression has one lane.
pub fn eval_lanes(expr: &IndexExpr, env: &Env) -> ArithResult<SmallVec<[i64; 4]>> {
    match expr.kind() {
        IndexKind::Ramp {
            base,
            stride,
            lanes,
        } => {
            let base = eval(base, env)?;
            let stride = eval(stride, env)?;
            (0..i64::from(*lanes))
                .map(|lane| {
                    lane.checked_mul(stride)
                        .and_then(|step| base.checked_add(step))
                        .ok_or_else(|| ArithError::Overflow(expr.clone()))
                })
                .collect()
        }
        _ => Ok(smallvec::smallvec![eval(expr, env)?]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::{floordiv, floormod, ramp};

    fn env(pairs: &[(&'static str, i64)]) -> Env {
        pairs
            .iter()
            .map(|&(name, value)| (Symbol::new(name), value))
            .collect()
    }

    #[test]
    fn floor_division_identity() {
        let c = IndexExpr::var("c");
        let k = IndexExpr::int(4);
        let expr = floordiv(c.clone(), k.clone()) * 4 + floormod(c, k);
        for value in [-9, -4, -1, 0, 3, 17] {
            assert_eq!(eval(&expr, &env(&[("c", value)])).unwrap(), value);
        }
    }

    #[test]
    fn errors_are_reported() {
        let x = IndexExpr::var("x");
        assert_eq!(
            eval(&x, &Env::new()),
            Err(ArithError::UnboundVariable(Symbol::new("x")))
        );
        let div = floordiv(x.clone(), IndexExpr::var("y"));
        assert!(matches!(
            eval(&div, &env(&[("x", 1), ("y", 0)])),
            Err(ArithError::DivisionByZero(_))
        ));
        let vector = ramp(x, IndexExpr::int(1), 4);
        assert!(matches!(
            eval(&vector, &env(&[("x", 1)])),
            Err(ArithError::NotScalar(_))
        ));
    }

    #[test]
    fn ramp_lanes() {
        let vector = ramp(IndexExpr::var("x") * 4, IndexExpr::int(1), 4);
        let lanes = eval_lanes(&vector, &env(&[("x", 2)])).unwrap();
        assert_eq!(lanes.as_slice(), &[8, 9, 10, 11]);
    }
}
