//! Error types for index arithmetic.

use derive_more::{Display, Error};
use tensile_ir::Symbol;

use crate::expr::IndexExpr;

pub type ArithResult<T> = Result<T, ArithError>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ArithError {
    #[display("division by zero in `{_0}`")]
    DivisionByZero(#[error(not(source))] IndexExpr),

    #[display("integer overflow evaluating `{_0}`")]
    Overflow(#[error(not(source))] IndexExpr),

    #[display("variable `{_0}` has no value")]
    UnboundVariable(#[error(not(source))] Symbol),

    /// A scalar was required but the expression has several lanes.
    #[display("expected a scalar index, found vector expression `{_0}`")]
    NotScalar(#[error(not(source))] IndexExpr),

    /// Number of indices does not match the buffer's rank or stride count.
    #[display("buffer `{buffer}` expects {expected} indices, got {found}")]
    IndexArity {
        buffer: Symbol,
        expected: usize,
        found: usize,
    },

    /// A rank-0 buffer may only be addressed with the constant index `0`.
    #[display("scalar buffer `{buffer}` indexed with `{index}`, expected 0")]
    ScalarIndex { buffer: Symbol, index: IndexExpr },
}
