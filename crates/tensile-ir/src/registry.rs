//! Operator registry: per-operator metadata consulted by rewrite patterns.

use std::collections::HashMap;

use crate::attrs::{Attribute, Attrs};
use crate::ops;
use crate::symbol::Symbol;

crate::symbols! {
    /// Registry key holding an operator's fusion classification.
    ATTR_OP_PATTERN => "TOpPattern",
}

/// Fusion classification of an operator.
///
/// The discriminants are the values stored under `TOpPattern`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpPatternKind {
    /// Elementwise operation, e.g. `nn.relu`.
    ElemWise = 0,
    /// Broadcasting binary operation, e.g. `add`.
    Broadcast = 1,
    /// Injective mapping of indices, e.g. `reshape`.
    Injective = 2,
    /// Commutative reduction, e.g. `sum`.
    CommReduce = 3,
    /// Complex op whose output can absorb elementwise consumers, e.g. `nn.conv2d`.
    OutEWiseFusable = 4,
    Tuple = 7,
    Opaque = 8,
}

impl OpPatternKind {
    pub fn as_attribute(self) -> Attribute {
        Attribute::Int(self as i64)
    }

    pub fn from_attribute(attr: &Attribute) -> Option<Self> {
        Some(match attr.as_int()? {
            0 => OpPatternKind::ElemWise,
            1 => OpPatternKind::Broadcast,
            2 => OpPatternKind::Injective,
            3 => OpPatternKind::CommReduce,
            4 => OpPatternKind::OutEWiseFusable,
            7 => OpPatternKind::Tuple,
            8 => OpPatternKind::Opaque,
            _ => return None,
        })
    }
}

/// Per-operator attribute bags.
#[derive(Default)]
pub struct OpRegistry {
    ops: HashMap<Symbol, Attrs>,
    empty: Attrs,
}

impl OpRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry pre-populated with the operators the built-in rules reason about.
    pub fn with_builtin_ops() -> Self {
        use OpPatternKind::*;

        let mut registry = Self::new();
        for op in [
            ops::ADD(),
            ops::SUBTRACT(),
            ops::MULTIPLY(),
            ops::DIVIDE(),
            ops::MAXIMUM(),
            ops::MINIMUM(),
            ops::POWER(),
        ] {
            registry.register(op, Broadcast);
        }
        for op in [
            ops::RELU(),
            ops::NEGATIVE(),
            ops::EXP(),
            ops::FULL(),
            ops::FULL_LIKE(),
            ops::ONES(),
            ops::ONES_LIKE(),
            ops::ZEROS(),
            ops::ZEROS_LIKE(),
        ] {
            registry.register(op, ElemWise);
        }
        for op in [
            ops::RESHAPE(),
            ops::REVERSE_RESHAPE(),
            ops::TRANSPOSE(),
            ops::LAYOUT_TRANSFORM(),
        ] {
            registry.register(op, Injective);
        }
        registry.register(ops::SUM(), CommReduce);
        registry.register(ops::CONV2D(), OutEWiseFusable);
        registry
    }

    /// Register `op` with its fusion classification.
    pub fn register(&mut self, op: Symbol, pattern: OpPatternKind) -> &mut Self {
        self.set_attr(op, ATTR_OP_PATTERN(), pattern.as_attribute())
    }

    pub fn set_attr(&mut self, op: Symbol, key: Symbol, value: Attribute) -> &mut Self {
        self.ops.entry(op).or_default().insert(key, value);
        self
    }

    /// Attributes of `op`; unknown operators have an empty bag.
    pub fn attrs(&self, op: Symbol) -> &Attrs {
        self.ops.get(&op).unwrap_or(&self.empty)
    }

    pub fn op_pattern(&self, op: Symbol) -> Option<OpPatternKind> {
        self.attrs(op)
            .get(&ATTR_OP_PATTERN())
            .and_then(OpPatternKind::from_attribute)
    }

    pub fn contains(&self, op: Symbol) -> bool {
        self.ops.contains_key(&op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_classification() {
        let registry = OpRegistry::with_builtin_ops();
        assert_eq!(
            registry.op_pattern(ops::ADD()),
            Some(OpPatternKind::Broadcast)
        );
        assert_eq!(
            registry.op_pattern(ops::TRANSPOSE()),
            Some(OpPatternKind::Injective)
        );
        assert_eq!(registry.op_pattern(Symbol::new("my.custom")), None);
        assert!(registry.attrs(Symbol::new("my.custom")).is_empty());
    }

    #[test]
    fn registering_overrides_classification() {
        let mut registry = OpRegistry::new();
        registry
            .register(Symbol::new("my.add"), OpPatternKind::Broadcast)
            .register(Symbol::new("my.add"), OpPatternKind::Opaque);
        assert_eq!(
            registry.op_pattern(Symbol::new("my.add")),
            Some(OpPatternKind::Opaque)
        );
    }
}
