use proptest::prelude::*;
use tensile_arith::{ConstFold, Env, IndexExpr, eval, floordiv, floormod, normalize};
use tensile_ir::Symbol;

const VARS: [&str; 3] = ["a", "b", "c"];

fn arb_leaf() -> impl Strategy<Value = IndexExpr> {
    prop_oneof![
        prop::sample::select(VARS.to_vec()).prop_map(IndexExpr::var),
        (-8i64..=8).prop_map(IndexExpr::int),
    ]
}

fn arb_divisor() -> impl Strategy<Value = i64> {
    prop_oneof![1i64..=8, -8i64..=-1]
}

// Arbitrary index arithmetic with constant, nonzero divisors.
fn arb_expr() -> impl Strategy<Value = IndexExpr> {
    arb_leaf().prop_recursive(3, 24, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a + b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a - b),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| a * b),
            (inner.clone(), arb_divisor()).prop_map(|(a, k)| floordiv(a, IndexExpr::int(k))),
            (inner, arb_divisor()).prop_map(|(a, k)| floormod(a, IndexExpr::int(k))),
        ]
    })
}

// (rest + c // (k1 * k2) * k1) * k2 + c % (k1 * k2) + extra
fn arb_cancellable() -> impl Strategy<Value = IndexExpr> {
    (arb_expr(), arb_expr(), arb_expr(), 1i64..=4, 1i64..=4).prop_map(
        |(rest, c, extra, k1, k2)| {
            let divisor = IndexExpr::int(k1 * k2);
            let product = (rest + floordiv(c.clone(), divisor.clone()) * k1) * k2;
            product + floormod(c, divisor) + extra
        },
    )
}

fn arb_env() -> impl Strategy<Value = Env> {
    prop::array::uniform3(-50i64..=50).prop_map(|values| {
        VARS.iter()
            .zip(values)
            .map(|(&name, value)| (Symbol::new(name), value))
            .collect()
    })
}

proptest! {
    #[test]
    fn prop_normalize_preserves_value(expr in arb_expr(), env in arb_env()) {
        let expected = eval(&expr, &env);
        prop_assume!(expected.is_ok());
        let normalized = normalize(&ConstFold, &expr);
        prop_assert_eq!(eval(&normalized, &env), expected);
    }

    #[test]
    fn prop_cancellation_preserves_value(expr in arb_cancellable(), env in arb_env()) {
        let expected = eval(&expr, &env);
        prop_assume!(expected.is_ok());
        let normalized = normalize(&ConstFold, &expr);
        prop_assert_eq!(eval(&normalized, &env), expected);
    }

    #[test]
    fn prop_normalize_is_idempotent(expr in arb_expr()) {
        let once = normalize(&ConstFold, &expr);
        prop_assert_eq!(normalize(&ConstFold, &once), once);
    }

    #[test]
    fn prop_cancelled_form_is_idempotent(expr in arb_cancellable()) {
        let once = normalize(&ConstFold, &expr);
        prop_assert_eq!(normalize(&ConstFold, &once), once);
    }

    #[test]
    fn prop_simple_cancellation_removes_division(k in 2i64..=32) {
        let (a, c) = (IndexExpr::var("a"), IndexExpr::var("c"));
        let expr = (a.clone() + floordiv(c.clone(), IndexExpr::int(k))) * k
            + floormod(c.clone(), IndexExpr::int(k));
        prop_assert_eq!(normalize(&ConstFold, &expr), c + a * k);
    }
}

#[test]
fn normalized_form_is_stable() {
    let (a, b, c) = (IndexExpr::var("a"), IndexExpr::var("b"), IndexExpr::var("c"));
    let cases = [
        (a.clone() * 4 + floordiv(c.clone(), IndexExpr::int(4))) * 4
            + floormod(c.clone(), IndexExpr::int(4)),
        b.clone() + (a.clone() + floordiv(c.clone(), IndexExpr::int(6))) * 6
            + floormod(c.clone(), IndexExpr::int(6)),
        floordiv(a.clone() * 2 + b.clone(), IndexExpr::int(3)),
    ];
    for expr in cases {
        let once = normalize(&ConstFold, &expr);
        assert_eq!(normalize(&ConstFold, &once), once, "{expr}");
    }
}
