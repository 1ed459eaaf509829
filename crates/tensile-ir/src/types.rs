//! Tensor types attached to expression nodes by type inference.

use std::fmt;

use smallvec::SmallVec;

use crate::symbol::Symbol;

// ============================================================================
// DType
// ============================================================================

/// Element kind of a scalar or vector dtype.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    UInt,
    Float,
    Bool,
}

/// Element type: kind, bit width and vector lanes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DType {
    pub kind: ScalarKind,
    pub bits: u8,
    pub lanes: u16,
}

impl DType {
    pub const fn int(bits: u8) -> Self {
        Self {
            kind: ScalarKind::Int,
            bits,
            lanes: 1,
        }
    }

    pub const fn uint(bits: u8) -> Self {
        Self {
            kind: ScalarKind::UInt,
            bits,
            lanes: 1,
        }
    }

    pub const fn float(bits: u8) -> Self {
        Self {
            kind: ScalarKind::Float,
            bits,
            lanes: 1,
        }
    }

    pub const fn bool() -> Self {
        Self {
            kind: ScalarKind::Bool,
            bits: 1,
            lanes: 1,
        }
    }

    /// Same element type with `lanes` vector lanes.
    pub const fn with_lanes(self, lanes: u16) -> Self {
        Self { lanes, ..self }
    }

    pub const fn is_vector(&self) -> bool {
        self.lanes > 1
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ScalarKind::Bool => write!(f, "bool")?,
            ScalarKind::Int => write!(f, "int{}", self.bits)?,
            ScalarKind::UInt => write!(f, "uint{}", self.bits)?,
            ScalarKind::Float => write!(f, "float{}", self.bits)?,
        }
        if self.lanes > 1 {
            write!(f, "x{}", self.lanes)?;
        }
        Ok(())
    }
}

// ============================================================================
// Shape
// ============================================================================

/// One dimension of a tensor shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Statically known extent.
    Static(i64),
    /// Extent only known at run time (e.g. a batch size variable).
    Symbolic(Symbol),
}

impl Dim {
    pub fn as_static(&self) -> Option<i64> {
        match self {
            Dim::Static(n) => Some(*n),
            Dim::Symbolic(_) => None,
        }
    }
}

impl From<i64> for Dim {
    fn from(value: i64) -> Self {
        Dim::Static(value)
    }
}

impl From<Symbol> for Dim {
    fn from(value: Symbol) -> Self {
        Dim::Symbolic(value)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Static(n) => write!(f, "{n}"),
            Dim::Symbolic(s) => write!(f, "{s}"),
        }
    }
}

/// Checked type of an expression: shape plus element dtype.
///
/// Equality is structural, which is what rewrite preconditions compare.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TensorType {
    pub shape: SmallVec<[Dim; 4]>,
    pub dtype: DType,
}

impl TensorType {
    pub fn new(shape: impl IntoIterator<Item = Dim>, dtype: DType) -> Self {
        Self {
            shape: shape.into_iter().collect(),
            dtype,
        }
    }

    /// Type with a fully static shape.
    pub fn from_static(shape: &[i64], dtype: DType) -> Self {
        Self::new(shape.iter().copied().map(Dim::Static), dtype)
    }

    /// Rank-0 tensor type.
    pub fn scalar(dtype: DType) -> Self {
        Self {
            shape: SmallVec::new(),
            dtype,
        }
    }

    pub fn rank(&self) -> usize {
        self.shape.len()
    }

    /// The shape as integers, or `None` if any dimension is symbolic.
    pub fn static_shape(&self) -> Option<SmallVec<[i64; 4]>> {
        self.shape.iter().map(Dim::as_static).collect()
    }
}

impl fmt::Display for TensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tensor<")?;
        for dim in &self.shape {
            write!(f, "{dim}x")?;
        }
        write!(f, "{}>", self.dtype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dtype_display_names_kind_bits_and_lanes() {
        let cases = [
            (DType::bool(), "bool"),
            (DType::int(32), "int32"),
            (DType::uint(8), "uint8"),
            (DType::float(32).with_lanes(4), "float32x4"),
        ];
        for (dtype, text) in cases {
            assert_eq!(dtype.to_string(), text);
        }
    }

    #[test]
    fn static_shape_requires_every_dim() {
        let ty = TensorType::from_static(&[6, 4], DType::float(32));
        assert_eq!(ty.static_shape().unwrap().as_slice(), &[6, 4]);

        let symbolic = TensorType::new(
            [Dim::Symbolic(Symbol::new("b")), Dim::Static(16)],
            DType::float(32),
        );
        assert_eq!(symbolic.static_shape(), None);
        assert_eq!(symbolic.to_string(), "tensor<bx16xfloat32>");
    }

    #[test]
    fn scalar_type_display() {
        assert_eq!(TensorType::scalar(DType::int(32)).to_string(), "tensor<int32>");
    }
}
