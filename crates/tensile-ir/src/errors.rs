//! Error types for the expression IR.

use derive_more::{Display, Error};

use crate::refs::ExprRef;
use crate::types::TensorType;

pub type IrResult<T> = Result<T, IrError>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum IrError {
    /// A pass needed the checked type of a node that type inference never annotated.
    #[display("expression {_0} has no checked type; type inference must run first")]
    MissingType(#[error(not(source))] ExprRef),

    /// Type inference tried to re-annotate a node with a different type.
    #[display("expression {expr} is already typed {existing}, refusing to retype it as {new}")]
    TypeConflict {
        expr: ExprRef,
        existing: TensorType,
        new: TensorType,
    },

    #[display("invalid layout `{layout}`: {reason}")]
    InvalidLayout { layout: String, reason: String },
}
