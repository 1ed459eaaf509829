//! ExprContext: arena storage for the expression DAG.
//!
//! Nodes are stored in a `PrimaryMap` owned by `ExprContext` and referenced
//! by `ExprRef`. Nodes are never mutated after creation apart from the one-time
//! type annotation performed by type inference; rewrites allocate new nodes,
//! so every `ExprRef` handed out stays valid for the life of the context.

use std::fmt;

use cranelift_entity::PrimaryMap;
use smallvec::SmallVec;

use crate::attrs::{Attribute, Attrs};
use crate::errors::{IrError, IrResult};
use crate::refs::ExprRef;
use crate::registry::OpRegistry;
use crate::symbol::Symbol;
use crate::types::{DType, ScalarKind, TensorType};

// ============================================================================
// Literals
// ============================================================================

/// A single element of a constant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarValue {
    Int(i64),
    /// Float stored as raw bits so literals stay `Eq + Hash`.
    FloatBits(u64),
    Bool(bool),
}

impl ScalarValue {
    pub fn float(value: f64) -> Self {
        ScalarValue::FloatBits(value.to_bits())
    }

    /// The integer `value` expressed in the element kind of `dtype`.
    pub fn from_i64(dtype: DType, value: i64) -> Self {
        match dtype.kind {
            ScalarKind::Float => ScalarValue::float(value as f64),
            ScalarKind::Bool => ScalarValue::Bool(value != 0),
            ScalarKind::Int | ScalarKind::UInt => ScalarValue::Int(value),
        }
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::Int(v) => write!(f, "{v}"),
            ScalarValue::FloatBits(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            ScalarValue::Bool(b) => write!(f, "{b}"),
        }
    }
}

/// Scalar or tensor literal. A literal with an empty shape is a scalar.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Literal {
    pub dtype: DType,
    pub shape: SmallVec<[i64; 4]>,
    /// Elements in row-major order.
    pub values: Vec<ScalarValue>,
}

impl Literal {
    pub fn scalar(dtype: DType, value: ScalarValue) -> Self {
        Self {
            dtype,
            shape: SmallVec::new(),
            values: vec![value],
        }
    }

    pub fn tensor(dtype: DType, shape: &[i64], values: Vec<ScalarValue>) -> Self {
        Self {
            dtype,
            shape: shape.into(),
            values,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.shape.is_empty()
    }

    /// The type a literal checks to.
    pub fn tensor_type(&self) -> TensorType {
        TensorType::from_static(&self.shape, self.dtype)
    }
}

// ============================================================================
// Nodes
// ============================================================================

/// The variant part of an expression node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExprKind {
    /// Named free variable (function parameter).
    Var { name: Symbol },
    Constant(Literal),
    /// Operator call.
    Call {
        op: Symbol,
        args: SmallVec<[ExprRef; 4]>,
        attrs: Attrs,
    },
}

/// Data for a single expression node in the arena.
#[derive(Clone, Debug)]
pub struct ExprNode {
    pub kind: ExprKind,
    /// Checked type, filled in by type inference.
    pub ty: Option<TensorType>,
}

/// Builder for call nodes, mirroring how passes assemble replacement calls.
pub struct CallBuilder {
    op: Symbol,
    args: SmallVec<[ExprRef; 4]>,
    attrs: Attrs,
    ty: Option<TensorType>,
}

impl CallBuilder {
    pub fn new(op: Symbol) -> Self {
        Self {
            op,
            args: SmallVec::new(),
            attrs: Attrs::new(),
            ty: None,
        }
    }

    pub fn arg(mut self, arg: ExprRef) -> Self {
        self.args.push(arg);
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = ExprRef>) -> Self {
        self.args.extend(args);
        self
    }

    pub fn attr(mut self, key: impl Into<Symbol>, value: impl Into<Attribute>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Replace the whole attribute bag (used when cloning a call with new args).
    pub fn attrs(mut self, attrs: Attrs) -> Self {
        self.attrs = attrs;
        self
    }

    pub fn ty(mut self, ty: TensorType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn maybe_ty(mut self, ty: Option<TensorType>) -> Self {
        self.ty = ty;
        self
    }

    pub fn build(self, ctx: &mut ExprContext) -> ExprRef {
        ctx.create(ExprNode {
            kind: ExprKind::Call {
                op: self.op,
                args: self.args,
                attrs: self.attrs,
            },
            ty: self.ty,
        })
    }
}

// ============================================================================
// ExprContext
// ============================================================================

/// Arena-backed module context: owns every expression node and the operator
/// registry that rewrites consult.
pub struct ExprContext {
    nodes: PrimaryMap<ExprRef, ExprNode>,
    pub registry: OpRegistry,
}

impl Default for ExprContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExprContext {
    /// Create an empty context with the built-in operator registry.
    pub fn new() -> Self {
        Self::with_registry(OpRegistry::with_builtin_ops())
    }

    pub fn with_registry(registry: OpRegistry) -> Self {
        Self {
            nodes: PrimaryMap::new(),
            registry,
        }
    }

    /// Allocate a new node.
    pub fn create(&mut self, node: ExprNode) -> ExprRef {
        self.nodes.push(node)
    }

    /// Typed variable.
    pub fn var(&mut self, name: Symbol, ty: TensorType) -> ExprRef {
        self.create(ExprNode {
            kind: ExprKind::Var { name },
            ty: Some(ty),
        })
    }

    /// Constant node; literals are typed from their own dtype and shape.
    pub fn constant(&mut self, literal: Literal) -> ExprRef {
        let ty = literal.tensor_type();
        self.create(ExprNode {
            kind: ExprKind::Constant(literal),
            ty: Some(ty),
        })
    }

    /// Number of nodes ever allocated.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn node(&self, expr: ExprRef) -> &ExprNode {
        &self.nodes[expr]
    }

    pub fn kind(&self, expr: ExprRef) -> &ExprKind {
        &self.nodes[expr].kind
    }

    /// Cached type, if type inference has annotated the node.
    pub fn ty(&self, expr: ExprRef) -> Option<&TensorType> {
        self.nodes[expr].ty.as_ref()
    }

    /// Cached type, or an error if the node was never annotated.
    pub fn checked_type(&self, expr: ExprRef) -> IrResult<&TensorType> {
        self.ty(expr).ok_or(IrError::MissingType(expr))
    }

    /// Operator of a call node.
    pub fn call_op(&self, expr: ExprRef) -> Option<Symbol> {
        match self.kind(expr) {
            ExprKind::Call { op, .. } => Some(*op),
            _ => None,
        }
    }

    /// Arguments of a call node; empty for leaves.
    pub fn args(&self, expr: ExprRef) -> &[ExprRef] {
        match self.kind(expr) {
            ExprKind::Call { args, .. } => args,
            _ => &[],
        }
    }

    /// Attribute bag of a call node.
    pub fn attrs(&self, expr: ExprRef) -> Option<&Attrs> {
        match self.kind(expr) {
            ExprKind::Call { attrs, .. } => Some(attrs),
            _ => None,
        }
    }

    pub fn attr(&self, expr: ExprRef, key: Symbol) -> Option<&Attribute> {
        self.attrs(expr).and_then(|attrs| attrs.get(&key))
    }

    pub fn is_call_to(&self, expr: ExprRef, op: Symbol) -> bool {
        self.call_op(expr) == Some(op)
    }

    pub fn literal(&self, expr: ExprRef) -> Option<&Literal> {
        match self.kind(expr) {
            ExprKind::Constant(lit) => Some(lit),
            _ => None,
        }
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Annotate a node with its checked type.
    ///
    /// A node keeps the first type it is given; re-annotating with an equal
    /// type is a no-op and a different type is an error.
    pub fn assign_type(&mut self, expr: ExprRef, ty: TensorType) -> IrResult<()> {
        let node = &mut self.nodes[expr];
        if let Some(existing) = &node.ty {
            if *existing == ty {
                return Ok(());
            }
            return Err(IrError::TypeConflict {
                expr,
                existing: existing.clone(),
                new: ty,
            });
        }
        tracing::trace!(%expr, %ty, "assign type");
        node.ty = Some(ty);
        Ok(())
    }

    /// Copy of `call` with `args` substituted, keeping operator, attributes and type.
    pub fn with_args(&mut self, call: ExprRef, args: SmallVec<[ExprRef; 4]>) -> ExprRef {
        let node = self.nodes[call].clone();
        let kind = match node.kind {
            ExprKind::Call { op, attrs, .. } => ExprKind::Call { op, args, attrs },
            other => other,
        };
        self.create(ExprNode { kind, ty: node.ty })
    }
}
