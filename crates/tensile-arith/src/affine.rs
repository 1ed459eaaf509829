//! Mul/mod cancellation over additive terms.
//!
//! Recognizes
//!
//! ```text
//! (a1 + ... + aj + c // (k1 * ... * ki) * k1 * ... * k(t-1)) * kt * ... * ki
//!     + c % (k1 * ... * ki)
//! ```
//!
//! and rewrites it to `(a1 + ... + aj) * kt * ... * ki + c`. This is the shape
//! buffer offsets take when an index that was split with `//` and `%` is
//! multiplied back out. The search walks each product term along one path
//! only; it does not try other groupings of sums and products.

use tracing::trace;

use crate::expr::IndexExpr;
use crate::fold;
use crate::simplify::Simplifier;

/// Top-level addends of `expr`, left to right.
pub fn split_addition(expr: &IndexExpr) -> Vec<IndexExpr> {
    let mut terms = Vec::new();
    let mut stack = vec![expr.clone()];
    while let Some(top) = stack.pop() {
        match top.as_add() {
            Some((a, b)) => {
                stack.push(b.clone());
                stack.push(a.clone());
            }
            None => terms.push(top),
        }
    }
    terms
}

fn accumulate(sum: Option<IndexExpr>, term: IndexExpr) -> IndexExpr {
    match sum {
        Some(sum) => fold::add(sum, term),
        None => term,
    }
}

/// Additive terms sorted into products, `(dividend, divisor)` mod pairs and
/// the sum of everything else.
#[derive(Default)]
struct TermSet {
    products: Vec<IndexExpr>,
    mods: Vec<(IndexExpr, IndexExpr)>,
    rest: Option<IndexExpr>,
}

impl TermSet {
    /// Classify `terms`, returning whether any product was added.
    fn insert(&mut self, terms: Vec<IndexExpr>) -> bool {
        let mut has_product = false;
        for term in terms {
            if let Some((a, b)) = term.as_floormod() {
                self.mods.push((a.clone(), b.clone()));
            } else if term.as_mul().is_some() {
                has_product = true;
                self.products.push(term);
            } else {
                self.rest = Some(accumulate(self.rest.take(), term));
            }
        }
        has_product
    }

    fn into_sum(self) -> IndexExpr {
        let mut sum = self.rest;
        for product in self.products {
            sum = Some(accumulate(sum, product));
        }
        for (dividend, divisor) in self.mods {
            sum = Some(accumulate(sum, fold::floormod(dividend, divisor)));
        }
        sum.unwrap_or_else(|| IndexExpr::int(0))
    }
}

/// Try to cancel `product` against `dividend % divisor`.
fn merge_mul_mod(
    product: &IndexExpr,
    dividend: &IndexExpr,
    divisor: &IndexExpr,
) -> Option<IndexExpr> {
    let (mut inner, factor) = product.as_mul()?;

    // Multiplier applied outside the innermost non-product operand.
    let mut mult_outer = factor.clone();
    while let Some((a, b)) = inner.as_mul() {
        mult_outer = fold::mul(b.clone(), mult_outer);
        inner = a;
    }

    let mut search = inner;
    let mut mult_inner: Option<IndexExpr> = None;
    let mut no_opt_sum: Option<IndexExpr> = None;
    loop {
        if let Some((div_a, div_b)) = search.as_floordiv() {
            let overall = match &mult_inner {
                Some(inner_factor) => fold::mul(inner_factor.clone(), mult_outer.clone()),
                None => mult_outer.clone(),
            };
            if overall != *div_b || overall != *divisor || div_a != dividend {
                return None;
            }
            return Some(match no_opt_sum {
                Some(sum) => fold::add(fold::mul(sum, mult_outer), dividend.clone()),
                None => dividend.clone(),
            });
        } else if let Some((a, b)) = search.as_mul() {
            mult_inner = Some(match mult_inner {
                Some(inner_factor) => fold::mul(b.clone(), inner_factor),
                None => b.clone(),
            });
            search = a;
        } else if let Some((a, b)) = search.as_add() {
            // A sum below a partial factor would need distributing it.
            if mult_inner.is_some() {
                return None;
            }
            no_opt_sum = Some(accumulate(no_opt_sum, a.clone()));
            search = b;
        } else {
            return None;
        }
    }
}

/// Simplify `expr` with `analyzer`, then cancel every mul/mod pair found.
///
/// Merged results are split back into terms and searched again until no
/// pair cancels. When nothing cancels the pre-simplified expression is
/// returned as is.
pub fn normalize(analyzer: &impl Simplifier, expr: &IndexExpr) -> IndexExpr {
    let simplified = analyzer.simplify(expr);
    let mut terms = TermSet::default();
    terms.insert(split_addition(&simplified));

    let mut merged_any = false;
    let mut cursor = 0;
    while cursor < terms.mods.len() {
        let (dividend, divisor) = terms.mods[cursor].clone();
        let hit = terms.products.iter().enumerate().find_map(|(i, product)| {
            merge_mul_mod(product, &dividend, &divisor).map(|merged| (i, merged))
        });
        let Some((product_index, merged)) = hit else {
            cursor += 1;
            continue;
        };

        trace!(
            product = %terms.products[product_index],
            %dividend,
            %divisor,
            %merged,
            "cancel mul/mod"
        );
        merged_any = true;
        terms.mods.remove(cursor);
        terms.products.remove(product_index);
        // `cursor` now points at the next mod term; new mod terms are appended
        // after it and get visited in order.
        if terms.insert(split_addition(&merged)) {
            // A new product may cancel a mod term that was already skipped.
            cursor = 0;
        }
    }

    if !merged_any {
        return simplified;
    }
    terms.into_sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::IndexKind;
    use crate::fold::{floordiv, floormod};
    use crate::simplify::ConstFold;

    fn v(name: &'static str) -> IndexExpr {
        IndexExpr::var(name)
    }

    fn k(value: i64) -> IndexExpr {
        IndexExpr::int(value)
    }

    fn norm(expr: &IndexExpr) -> IndexExpr {
        normalize(&ConstFold, expr)
    }

    #[test]
    fn split_is_left_to_right() {
        let expr = (v("a") + v("b")) + (v("c") + v("d"));
        let names: Vec<String> = split_addition(&expr)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(names, ["a", "b", "c", "d"]);
    }

    #[test]
    fn cancels_for_several_divisors() {
        for divisor in [2, 3, 4, 8, 16] {
            let (a, c) = (v("a"), v("c"));
            let expr =
                (a + floordiv(c.clone(), k(divisor))) * divisor + floormod(c, k(divisor));
            assert_eq!(norm(&expr).to_string(), format!("c + a * {divisor}"));
        }
    }

    #[test]
    fn keeps_remaining_product() {
        let (a, c) = (v("a"), v("c"));
        let expr = (a * 4 + floordiv(c.clone(), k(4))) * 4 + floormod(c, k(4));
        insta::assert_snapshot!(norm(&expr), @"c + a * 4 * 4");
    }

    #[test]
    fn outer_factors_multiply_together() {
        let (a, c) = (v("a"), v("c"));
        let expr = (a + floordiv(c.clone(), k(16))) * 4 * 4 + floormod(c, k(16));
        insta::assert_snapshot!(norm(&expr), @"c + a * 16");
    }

    #[test]
    fn inner_factor_after_sum() {
        // (a + c // 8 * 2) * 4 + c % 8
        let (a, c) = (v("a"), v("c"));
        let expr = (a + floordiv(c.clone(), k(8)) * 2) * 4 + floormod(c, k(8));
        insta::assert_snapshot!(norm(&expr), @"c + a * 4");
    }

    #[test]
    fn bare_division_times_divisor() {
        let i = v("i");
        let expr = floordiv(i.clone(), k(4)) * 4 + floormod(i.clone(), k(4));
        assert_eq!(norm(&expr), i);
    }

    #[test]
    fn merged_result_cancels_again() {
        // C = (q + e // 3) * 3
        // (a + C // 4) * 4 + C % 4 + e % 3  ==>  e + a * 4 + q * 3
        let (a, q, e) = (v("a"), v("q"), v("e"));
        let big_c = (q + floordiv(e.clone(), k(3))) * 3;
        let expr = (a + floordiv(big_c.clone(), k(4))) * 4
            + floormod(big_c, k(4))
            + floormod(e, k(3));
        let result = norm(&expr);
        insta::assert_snapshot!(result, @"e + a * 4 + q * 3");
        assert_eq!(norm(&result), result);
    }

    #[test]
    fn every_mod_from_a_merge_is_visited() {
        // C = x % 3 + y % 5
        // C // 4 * 4 + C % 4 + (b + x // 3) * 3  ==>  x + b * 3 + y % 5
        let (b, x, y) = (v("b"), v("x"), v("y"));
        let big_c = floormod(x.clone(), k(3)) + floormod(y, k(5));
        let expr = floordiv(big_c.clone(), k(4)) * 4
            + floormod(big_c, k(4))
            + (b + floordiv(x, k(3))) * 3;
        let result = norm(&expr);
        insta::assert_snapshot!(result, @"x + b * 3 + floormod(y, 5)");
        assert_eq!(norm(&result), result);
    }

    #[test]
    fn mismatched_divisor_is_left_alone() {
        let (a, c) = (v("a"), v("c"));
        let expr = (a + floordiv(c.clone(), k(4))) * 4 + floormod(c, k(8));
        assert_eq!(norm(&expr), ConstFold.simplify(&expr));
    }

    #[test]
    fn mismatched_dividend_is_left_alone() {
        let (a, c, d) = (v("a"), v("c"), v("d"));
        let expr = (a + floordiv(c, k(4))) * 4 + floormod(d, k(4));
        assert_eq!(norm(&expr), expr);
    }

    #[test]
    fn sum_below_partial_factor_is_not_distributed() {
        // (b + (c // 4 + a) * 2) * 2 + c % 4
        let (a, c) = (v("a"), v("c"));
        let inner = IndexExpr::new(IndexKind::Mul(
            floordiv(c.clone(), k(4)) + a,
            k(2),
        ));
        let expr = IndexExpr::new(IndexKind::Add(
            IndexExpr::new(IndexKind::Mul(
                IndexExpr::new(IndexKind::Add(v("b"), inner)),
                k(2),
            )),
            floormod(c, k(4)),
        ));
        assert_eq!(norm(&expr), expr);
    }

    #[test]
    fn pre_simplification_is_returned_without_merge() {
        let x = v("x");
        let expr = IndexExpr::new(IndexKind::Mul(x.clone(), k(1)))
            + IndexExpr::new(IndexKind::Add(k(2), k(3)));
        insta::assert_snapshot!(norm(&expr), @"x + 5");
    }

    #[test]
    fn idempotent_on_results() {
        let (a, c) = (v("a"), v("c"));
        let exprs = [
            (a.clone() + floordiv(c.clone(), k(4))) * 4 + floormod(c.clone(), k(4)),
            a.clone() * 3 + floormod(c.clone(), k(5)),
            floordiv(a.clone() + c.clone(), k(2)),
        ];
        for expr in exprs {
            let once = norm(&expr);
            assert_eq!(norm(&once), once, "{expr}");
        }
    }
}
