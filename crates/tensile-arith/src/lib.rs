//! Tensile index arithmetic.
//!
//! Scalar index expressions with floor division, the mul/mod cancellation
//! used to keep buffer offsets affine, and the offset computation itself.

pub mod affine;
pub mod buffer;
pub mod errors;
pub mod eval;
pub mod expr;
pub mod fold;
pub mod simplify;

pub use affine::{normalize, split_addition};
pub use buffer::Buffer;
pub use errors::{ArithError, ArithResult};
pub use eval::{Env, eval, eval_lanes};
pub use expr::{IndexExpr, IndexKind};
pub use fold::{floordiv, floormod, ramp};
pub use simplify::{ConstFold, Simplifier};
