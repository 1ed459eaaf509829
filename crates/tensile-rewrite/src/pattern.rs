//! Dataflow patterns.
//!
//! Patterns are arena nodes referenced by `PatternRef`, so a rule can keep
//! handles to the sub-patterns whose bindings its callback reads.

use cranelift_entity::{PrimaryMap, entity_impl};
use smallvec::SmallVec;
use tensile_ir::{Attribute, Attrs, Symbol};

/// Reference to a pattern node.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatternRef(u32);
entity_impl!(PatternRef, "p");

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PatternNode {
    /// Matches anything.
    Wildcard,
    /// Matches a call to `name`; in operator position, the operator itself.
    Op(Symbol),
    /// First alternative that matches, left to right.
    Alt(SmallVec<[PatternRef; 4]>),
    /// Call whose operator matches `op` and whose arguments match `args` pairwise.
    Call {
        op: PatternRef,
        args: SmallVec<[PatternRef; 4]>,
    },
    /// `base` matches and every expected attribute is present with an equal value.
    ///
    /// On an expression the attributes are the call's own; in operator
    /// position they are the operator registry's.
    Attr { base: PatternRef, expected: Attrs },
    /// Matches constant nodes.
    Constant,
}

/// Arena of pattern nodes shared by the rules of one rewriter.
#[derive(Default)]
pub struct PatternContext {
    nodes: PrimaryMap<PatternRef, PatternNode>,
}

impl PatternContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, node: PatternNode) -> PatternRef {
        self.nodes.push(node)
    }

    pub fn node(&self, pattern: PatternRef) -> &PatternNode {
        &self.nodes[pattern]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Builders
    // ========================================================================

    pub fn wildcard(&mut self) -> PatternRef {
        self.create(PatternNode::Wildcard)
    }

    pub fn is_op(&mut self, name: Symbol) -> PatternRef {
        self.create(PatternNode::Op(name))
    }

    pub fn is_constant(&mut self) -> PatternRef {
        self.create(PatternNode::Constant)
    }

    pub fn alt(&mut self, alternatives: impl IntoIterator<Item = PatternRef>) -> PatternRef {
        self.create(PatternNode::Alt(alternatives.into_iter().collect()))
    }

    /// `lhs | rhs`.
    pub fn or(&mut self, lhs: PatternRef, rhs: PatternRef) -> PatternRef {
        self.alt([lhs, rhs])
    }

    /// `ops[0] | ops[1] | ...` as operator patterns.
    pub fn is_any_op(&mut self, ops: impl IntoIterator<Item = Symbol>) -> PatternRef {
        let alternatives: SmallVec<[PatternRef; 4]> =
            ops.into_iter().map(|op| self.is_op(op)).collect();
        self.create(PatternNode::Alt(alternatives))
    }

    pub fn call(
        &mut self,
        op: PatternRef,
        args: impl IntoIterator<Item = PatternRef>,
    ) -> PatternRef {
        self.create(PatternNode::Call {
            op,
            args: args.into_iter().collect(),
        })
    }

    /// Call to the operator `name` with `args`.
    pub fn call_op(
        &mut self,
        name: Symbol,
        args: impl IntoIterator<Item = PatternRef>,
    ) -> PatternRef {
        let op = self.is_op(name);
        self.call(op, args)
    }

    pub fn has_attrs(&mut self, base: PatternRef, expected: Attrs) -> PatternRef {
        self.create(PatternNode::Attr { base, expected })
    }

    pub fn has_attr(
        &mut self,
        base: PatternRef,
        key: impl Into<Symbol>,
        value: impl Into<Attribute>,
    ) -> PatternRef {
        let mut expected = Attrs::new();
        expected.insert(key.into(), value.into());
        self.has_attrs(base, expected)
    }
}
