//! Scalar index expressions.
//!
//! `IndexExpr` is a cheaply clonable handle to an immutable tree. Equality is
//! structural, so two separately built `floordiv(c, 4)` nodes compare equal.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use tensile_ir::Symbol;

/// The variant part of an index expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IndexKind {
    Int(i64),
    Var(Symbol),
    Add(IndexExpr, IndexExpr),
    Sub(IndexExpr, IndexExpr),
    Mul(IndexExpr, IndexExpr),
    /// Division rounding toward negative infinity.
    FloorDiv(IndexExpr, IndexExpr),
    /// Remainder with the sign of the divisor.
    FloorMod(IndexExpr, IndexExpr),
    /// `lanes` consecutive values `base, base + stride, ...`.
    Ramp {
        base: IndexExpr,
        stride: IndexExpr,
        lanes: u16,
    },
}

#[derive(Clone, Debug, Eq)]
pub struct IndexExpr(Rc<IndexKind>);

impl PartialEq for IndexExpr {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0) || self.0 == other.0
    }
}

impl Hash for IndexExpr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl IndexExpr {
    pub fn new(kind: IndexKind) -> Self {
        IndexExpr(Rc::new(kind))
    }

    pub fn int(value: i64) -> Self {
        Self::new(IndexKind::Int(value))
    }

    pub fn var(name: impl Into<Symbol>) -> Self {
        Self::new(IndexKind::Var(name.into()))
    }

    pub fn kind(&self) -> &IndexKind {
        &self.0
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.kind() {
            IndexKind::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_const(&self, value: i64) -> bool {
        self.as_int() == Some(value)
    }

    /// Operands of an `Add` node.
    pub fn as_add(&self) -> Option<(&IndexExpr, &IndexExpr)> {
        match self.kind() {
            IndexKind::Add(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Operands of a `Mul` node.
    pub fn as_mul(&self) -> Option<(&IndexExpr, &IndexExpr)> {
        match self.kind() {
            IndexKind::Mul(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Operands of a `FloorDiv` node.
    pub fn as_floordiv(&self) -> Option<(&IndexExpr, &IndexExpr)> {
        match self.kind() {
            IndexKind::FloorDiv(a, b) => Some((a, b)),
            _ => None,
        }
    }

    /// Operands of a `FloorMod` node.
    pub fn as_floormod(&self) -> Option<(&IndexExpr, &IndexExpr)> {
        match self.kind() {
            IndexKind::FloorMod(a, b) => Some((a, b)),
            _ => None,
        }
    }

    fn precedence(&self) -> u8 {
        match self.kind() {
            IndexKind::Add(..) | IndexKind::Sub(..) => 1,
            IndexKind::Mul(..) => 2,
            _ => 3,
        }
    }
}

impl From<i64> for IndexExpr {
    fn from(value: i64) -> Self {
        IndexExpr::int(value)
    }
}

impl From<Symbol> for IndexExpr {
    fn from(name: Symbol) -> Self {
        IndexExpr::var(name)
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expr: &IndexExpr, min_prec: u8) -> fmt::Result {
    if expr.precedence() < min_prec {
        write!(f, "({expr})")
    } else {
        write!(f, "{expr}")
    }
}

impl fmt::Display for IndexExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind() {
            IndexKind::Int(v) => write!(f, "{v}"),
            IndexKind::Var(name) => write!(f, "{name}"),
            IndexKind::Add(a, b) => {
                write_operand(f, a, 1)?;
                f.write_str(" + ")?;
                write_operand(f, b, 2)
            }
            IndexKind::Sub(a, b) => {
                write_operand(f, a, 1)?;
                f.write_str(" - ")?;
                write_operand(f, b, 2)
            }
            IndexKind::Mul(a, b) => {
                write_operand(f, a, 2)?;
                f.write_str(" * ")?;
                write_operand(f, b, 3)
            }
            IndexKind::FloorDiv(a, b) => write!(f, "floordiv({a}, {b})"),
            IndexKind::FloorMod(a, b) => write!(f, "floormod({a}, {b})"),
            IndexKind::Ramp {
                base,
                stride,
                lanes,
            } => write!(f, "ramp({base}, {stride}, {lanes})"),
        }
    }
}
