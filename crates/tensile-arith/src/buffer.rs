//! Linear offsets of multi-dimensional buffer accesses.

use tensile_ir::{DType, Symbol};

use crate::affine::normalize;
use crate::errors::{ArithError, ArithResult};
use crate::expr::IndexExpr;
use crate::fold;
use crate::simplify::Simplifier;

/// A region of memory viewed as a multi-dimensional array.
///
/// Without `strides` the buffer is dense and row-major. `elem_offset` is
/// counted in elements of `dtype`, not in lanes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    pub name: Symbol,
    pub dtype: DType,
    pub shape: Vec<IndexExpr>,
    pub strides: Vec<IndexExpr>,
    pub elem_offset: IndexExpr,
}

impl Buffer {
    /// Dense buffer starting at element zero.
    pub fn dense(name: impl Into<Symbol>, dtype: DType, shape: Vec<IndexExpr>) -> Self {
        Self {
            name: name.into(),
            dtype,
            shape,
            strides: Vec::new(),
            elem_offset: IndexExpr::int(0),
        }
    }

    pub fn with_strides(mut self, strides: Vec<IndexExpr>) -> Self {
        self.strides = strides;
        self
    }

    pub fn with_elem_offset(mut self, elem_offset: IndexExpr) -> Self {
        self.elem_offset = elem_offset;
        self
    }

    fn arity_error(&self, expected: usize, found: usize) -> ArithError {
        ArithError::IndexArity {
            buffer: self.name,
            expected,
            found,
        }
    }

    /// Offset of `indices` in elements, simplified one dimension at a time.
    pub fn elem_offset(
        &self,
        analyzer: &impl Simplifier,
        indices: &[IndexExpr],
    ) -> ArithResult<IndexExpr> {
        let base = self.elem_offset.clone();

        if self.strides.is_empty() {
            if self.shape.is_empty() && indices.len() == 1 {
                let index = &indices[0];
                if !index.is_const(0) {
                    return Err(ArithError::ScalarIndex {
                        buffer: self.name,
                        index: index.clone(),
                    });
                }
                return Ok(fold::add(base, index.clone()));
            }
            if self.shape.len() != indices.len() {
                return Err(self.arity_error(self.shape.len(), indices.len()));
            }
            let Some((first, rest)) = indices.split_first() else {
                return Ok(base);
            };
            let mut offset = first.clone();
            for (index, extent) in rest.iter().zip(&self.shape[1..]) {
                offset = normalize(analyzer, &(offset * extent.clone() + index.clone()));
            }
            return Ok(fold::add(base, offset));
        }

        if self.strides.len() != indices.len() {
            return Err(self.arity_error(self.strides.len(), indices.len()));
        }
        let mut pairs = indices.iter().zip(&self.strides);
        let Some((first, stride)) = pairs.next() else {
            return Ok(base);
        };
        let head = first.clone() * stride.clone();
        let mut offset = if base.is_const(0) {
            normalize(analyzer, &head)
        } else {
            normalize(analyzer, &(base + head))
        };
        for (index, stride) in pairs {
            offset = normalize(analyzer, &(offset + index.clone() * stride.clone()));
        }
        Ok(offset)
    }

    /// Offset of an access of `access` type: scaled by the buffer's lanes
    /// when the buffer holds vectors, and a ramp for a vector access.
    pub fn buffer_offset(
        &self,
        analyzer: &impl Simplifier,
        indices: &[IndexExpr],
        access: DType,
    ) -> ArithResult<IndexExpr> {
        let mut offset = self.elem_offset(analyzer, indices)?;
        if self.dtype.is_vector() {
            offset = offset * i64::from(access.lanes);
        }
        if access.is_vector() {
            return Ok(fold::ramp(offset, IndexExpr::int(1), access.lanes));
        }
        Ok(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fold::{floordiv, floormod};
    use crate::simplify::ConstFold;

    fn v(name: &'static str) -> IndexExpr {
        IndexExpr::var(name)
    }

    fn k(value: i64) -> IndexExpr {
        IndexExpr::int(value)
    }

    #[test]
    fn dense_offset_cancels_split_index() {
        let buffer = Buffer::dense("A", DType::float(32), vec![v("n"), k(4)]);
        let i = v("i");
        let offset = buffer
            .elem_offset(&ConstFold, &[floordiv(i.clone(), k(4)), floormod(i.clone(), k(4))])
            .unwrap();
        assert_eq!(offset, i);
    }

    #[test]
    fn dense_offset_row_major() {
        let buffer = Buffer::dense("A", DType::float(32), vec![v("n"), k(3), k(4)]);
        let offset = buffer
            .elem_offset(&ConstFold, &[v("i"), v("j"), v("l")])
            .unwrap();
        insta::assert_snapshot!(offset, @"(i * 3 + j) * 4 + l");
    }

    #[test]
    fn scalar_buffer_accepts_only_zero() {
        let buffer = Buffer::dense("s", DType::int(32), Vec::new()).with_elem_offset(v("base"));
        assert_eq!(buffer.elem_offset(&ConstFold, &[k(0)]).unwrap(), v("base"));
        assert!(matches!(
            buffer.elem_offset(&ConstFold, &[k(1)]),
            Err(ArithError::ScalarIndex { .. })
        ));
        assert_eq!(buffer.elem_offset(&ConstFold, &[]).unwrap(), v("base"));
    }

    #[test]
    fn arity_is_checked() {
        let buffer = Buffer::dense("A", DType::float(32), vec![k(2), k(2)]);
        assert_eq!(
            buffer.elem_offset(&ConstFold, &[v("i")]),
            Err(ArithError::IndexArity {
                buffer: Symbol::new("A"),
                expected: 2,
                found: 1,
            })
        );
        let strided = buffer.with_strides(vec![k(8), k(1)]);
        assert!(strided.elem_offset(&ConstFold, &[v("i")]).is_err());
    }

    #[test]
    fn strided_offset_includes_elem_offset() {
        let buffer = Buffer::dense("A", DType::float(32), vec![v("n"), k(4)])
            .with_strides(vec![k(4), k(1)])
            .with_elem_offset(v("base"));
        let i = v("i");
        let offset = buffer
            .elem_offset(&ConstFold, &[floordiv(i.clone(), k(4)), floormod(i.clone(), k(4))])
            .unwrap();
        insta::assert_snapshot!(offset, @"base + i");
    }

    #[test]
    fn strided_offset_from_zero() {
        let buffer = Buffer::dense("A", DType::float(32), vec![v("n"), k(4)])
            .with_strides(vec![k(4), k(1)]);
        let offset = buffer
            .elem_offset(&ConstFold, &[v("i"), v("j")])
            .unwrap();
        insta::assert_snapshot!(offset, @"i * 4 + j");
    }

    #[test]
    fn vector_access_is_a_ramp() {
        let buffer = Buffer::dense("A", DType::float(32), vec![v("n"), k(4)]);
        let offset = buffer
            .buffer_offset(&ConstFold, &[v("i"), k(0)], DType::float(32).with_lanes(4))
            .unwrap();
        insta::assert_snapshot!(offset, @"ramp(i * 4, 1, 4)");

        let vectorized = Buffer::dense("B", DType::float(32).with_lanes(4), vec![v("n")]);
        let offset = vectorized
            .buffer_offset(&ConstFold, &[v("i")], DType::float(32).with_lanes(4))
            .unwrap();
        insta::assert_snapshot!(offset, @"ramp(i * 4, 1, 4)");

        let scalar = vectorized
            .buffer_offset(&ConstFold, &[v("i")], DType::float(32))
            .unwrap();
        assert_eq!(scalar, v("i"));
    }
}
