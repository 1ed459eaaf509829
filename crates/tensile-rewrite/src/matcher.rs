//! Structural matching of patterns against expressions.

use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;
use tensile_ir::{Attrs, ExprContext, ExprKind, ExprRef, Symbol};

use crate::pattern::{PatternContext, PatternNode, PatternRef};

/// Expressions matched by each pattern node, in match order.
///
/// Every pattern node that took part in a successful match records the
/// expression it matched, so a callback can tell which alternative fired.
/// Operator-position patterns match symbols and record nothing.
#[derive(Clone, Default)]
pub struct Bindings {
    map: SecondaryMap<PatternRef, SmallVec<[ExprRef; 1]>>,
    /// Push order, for rollback.
    log: Vec<PatternRef>,
}

impl Bindings {
    /// First expression bound to `pattern`.
    pub fn get(&self, pattern: PatternRef) -> Option<ExprRef> {
        self.map[pattern].first().copied()
    }

    /// Every expression bound to `pattern`.
    pub fn all(&self, pattern: PatternRef) -> &[ExprRef] {
        &self.map[pattern]
    }

    pub fn contains(&self, pattern: PatternRef) -> bool {
        !self.map[pattern].is_empty()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Same bindings with every expression passed through `f`.
    pub fn map_exprs(&self, mut f: impl FnMut(ExprRef) -> ExprRef) -> Bindings {
        let mut mapped = Bindings::default();
        for (pattern, exprs) in self.map.iter() {
            if !exprs.is_empty() {
                mapped.map[pattern] = exprs.iter().map(|&e| f(e)).collect();
            }
        }
        mapped.log = self.log.clone();
        mapped
    }

    fn push(&mut self, pattern: PatternRef, expr: ExprRef) {
        self.map[pattern].push(expr);
        self.log.push(pattern);
    }

    fn mark(&self) -> usize {
        self.log.len()
    }

    fn rollback(&mut self, mark: usize) {
        while self.log.len() > mark {
            if let Some(pattern) = self.log.pop() {
                self.map[pattern].pop();
            }
        }
    }
}

/// Match `pattern` against the sub-graph rooted at `expr`.
///
/// Never consults node types.
pub fn match_pattern(
    patterns: &PatternContext,
    ctx: &ExprContext,
    pattern: PatternRef,
    expr: ExprRef,
) -> Option<Bindings> {
    let mut matcher = Matcher {
        patterns,
        ctx,
        bindings: Bindings::default(),
    };
    if matcher.match_expr(pattern, expr) {
        Some(matcher.bindings)
    } else {
        None
    }
}

struct Matcher<'a> {
    patterns: &'a PatternContext,
    ctx: &'a ExprContext,
    bindings: Bindings,
}

impl Matcher<'_> {
    fn match_expr(&mut self, pattern: PatternRef, expr: ExprRef) -> bool {
        let patterns = self.patterns;
        let ctx = self.ctx;
        let mark = self.bindings.mark();

        let matched = match patterns.node(pattern) {
            PatternNode::Wildcard => true,
            PatternNode::Op(name) => ctx.call_op(expr) == Some(*name),
            // Alternatives roll back their own bindings when they fail.
            PatternNode::Alt(alternatives) => {
                alternatives.iter().any(|&alt| self.match_expr(alt, expr))
            }
            PatternNode::Call { op, args } => match ctx.kind(expr) {
                ExprKind::Call {
                    op: callee,
                    args: actual,
                    ..
                } => {
                    args.len() == actual.len()
                        && self.match_op(*op, *callee)
                        && args
                            .iter()
                            .zip(actual.iter())
                            .all(|(&p, &e)| self.match_expr(p, e))
                }
                _ => false,
            },
            PatternNode::Attr { base, expected } => {
                self.match_expr(*base, expr)
                    && match ctx.attrs(expr) {
                        Some(attrs) => attrs_contain(attrs, expected),
                        None => expected.is_empty(),
                    }
            }
            PatternNode::Constant => matches!(ctx.kind(expr), ExprKind::Constant(_)),
        };

        if matched {
            self.bindings.push(pattern, expr);
        } else {
            self.bindings.rollback(mark);
        }
        tracing::trace!(%pattern, %expr, matched, "match attempt");
        matched
    }

    fn match_op(&self, pattern: PatternRef, op: Symbol) -> bool {
        match self.patterns.node(pattern) {
            PatternNode::Wildcard => true,
            PatternNode::Op(name) => *name == op,
            PatternNode::Alt(alternatives) => {
                alternatives.iter().any(|&alt| self.match_op(alt, op))
            }
            PatternNode::Attr { base, expected } => {
                self.match_op(*base, op) && attrs_contain(self.ctx.registry.attrs(op), expected)
            }
            PatternNode::Call { .. } | PatternNode::Constant => false,
        }
    }
}

fn attrs_contain(actual: &Attrs, expected: &Attrs) -> bool {
    expected
        .iter()
        .all(|(key, value)| actual.get(key) == Some(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tensile_ir::registry::ATTR_OP_PATTERN;
    use tensile_ir::{Attribute, DType, OpPatternKind, TensorType, ops};

    fn ty() -> TensorType {
        TensorType::from_static(&[2, 2], DType::float(32))
    }

    #[test]
    fn call_pattern_binds_every_node() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty());
        let inner = ops::transpose(&mut ctx, x, Some(&[1, 0]), ty());
        let outer = ops::reshape(&mut ctx, inner, &[4], ty());

        let mut p = PatternContext::new();
        let wild = p.wildcard();
        let transpose = p.call_op(ops::TRANSPOSE(), [wild]);
        let reshape_op = p.is_op(ops::RESHAPE());
        let root = p.call(reshape_op, [transpose]);

        let bindings = match_pattern(&p, &ctx, root, outer).unwrap();
        assert_eq!(bindings.get(wild), Some(x));
        assert_eq!(bindings.get(transpose), Some(inner));
        assert_eq!(bindings.get(root), Some(outer));
        assert!(!bindings.contains(reshape_op));

        assert!(match_pattern(&p, &ctx, root, inner).is_none());
    }

    #[test]
    fn arity_must_match() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty());
        let y = ctx.var(Symbol::new("y"), ty());
        let add = ops::binary(&mut ctx, ops::ADD(), x, y, ty());

        let mut p = PatternContext::new();
        let wild = p.wildcard();
        let unary = p.call_op(ops::ADD(), [wild]);
        assert!(match_pattern(&p, &ctx, unary, add).is_none());
    }

    #[test]
    fn alternation_takes_first_success_and_rolls_back() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty());
        let c = ctx.constant(tensile_ir::Literal::scalar(
            DType::float(32),
            tensile_ir::ScalarValue::float(1.0),
        ));
        let add = ops::binary(&mut ctx, ops::ADD(), x, c, ty());

        let mut p = PatternContext::new();
        let const_pat = p.is_constant();
        let wild = p.wildcard();
        let const_first = p.call_op(ops::ADD(), [const_pat, wild]);
        let const_second = p.call_op(ops::ADD(), [wild, const_pat]);
        let either = p.or(const_first, const_second);

        let bindings = match_pattern(&p, &ctx, either, add).unwrap();
        assert!(!bindings.contains(const_first));
        assert_eq!(bindings.get(const_second), Some(add));
        assert_eq!(bindings.all(wild), &[x]);
        assert_eq!(bindings.get(const_pat), Some(c));
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn repeated_wildcard_records_each_occurrence() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty());
        let y = ctx.var(Symbol::new("y"), ty());
        let add = ops::binary(&mut ctx, ops::ADD(), x, y, ty());

        let mut p = PatternContext::new();
        let wild = p.wildcard();
        let both = p.call_op(ops::ADD(), [wild, wild]);

        let bindings = match_pattern(&p, &ctx, both, add).unwrap();
        assert_eq!(bindings.all(wild), &[x, y]);
        assert_eq!(bindings.get(wild), Some(x));
    }

    #[test]
    fn attribute_predicates() {
        let mut ctx = ExprContext::new();
        let x = ctx.var(Symbol::new("x"), ty());
        let t = ops::transpose(&mut ctx, x, Some(&[1, 0]), ty());
        let add = ops::binary(&mut ctx, ops::ADD(), x, x, ty());
        let relu = tensile_ir::CallBuilder::new(ops::RELU())
            .arg(x)
            .ty(ty())
            .build(&mut ctx);

        let mut p = PatternContext::new();
        let wild = p.wildcard();

        // On the call's own attributes.
        let transpose = p.call_op(ops::TRANSPOSE(), [wild]);
        let swapped = p.has_attr(transpose, ops::ATTR_AXES(), Attribute::int_list([1, 0]));
        let identity = p.has_attr(transpose, ops::ATTR_AXES(), Attribute::int_list([0, 1]));
        assert!(match_pattern(&p, &ctx, swapped, t).is_some());
        assert!(match_pattern(&p, &ctx, identity, t).is_none());

        // On the registry entry of the operator.
        let any_op = p.wildcard();
        let broadcast = p.has_attr(
            any_op,
            ATTR_OP_PATTERN(),
            OpPatternKind::Broadcast.as_attribute(),
        );
        let binary = p.call(broadcast, [wild, wild]);
        let unary = p.call(broadcast, [wild]);
        assert!(match_pattern(&p, &ctx, binary, add).is_some());
        assert!(match_pattern(&p, &ctx, unary, relu).is_none());
    }
}
