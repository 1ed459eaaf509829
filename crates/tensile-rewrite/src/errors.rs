//! Error types for expression rewriting.

use derive_more::{Display, Error, From};
use tensile_ir::{ExprRef, IrError, Symbol};

pub type RewriteResult<T> = Result<T, RewriteError>;

/// A rule found the graph in a state it cannot handle.
///
/// These abort the whole rewrite; a rule that merely does not apply returns
/// its input instead.
#[derive(Debug, Display, Error, From, Clone, PartialEq, Eq)]
pub enum RewriteError {
    #[display("expression {_0} has no checked type; run type inference before simplifying")]
    MissingType(#[error(not(source))] ExprRef),

    /// Two chained layout transforms disagree on the layout between them.
    #[display("layout transform expects `{expected}` but its input is laid out as `{found}`")]
    LayoutMismatch { expected: String, found: String },

    /// Axis order requested from an expression that does not permute axes.
    #[display("expression {_0} is not a transpose or layout transform")]
    NotAxisPermuting(#[error(not(source))] ExprRef),

    #[display("invalid axes for `{op}`: {reason}")]
    InvalidAxes { op: Symbol, reason: String },

    #[display("`{op}` is missing attribute `{attr}`")]
    MissingAttr { op: Symbol, attr: Symbol },

    /// The fill value of `full`/`full_like` is not a scalar constant.
    #[display("fill value {_0} is not a scalar constant")]
    NonScalarFill(#[error(not(source))] ExprRef),

    #[display("{_0}")]
    #[from]
    Ir(IrError),
}
