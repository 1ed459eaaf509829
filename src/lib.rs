//! Tensile: expression simplification for tensor programs.
//!
//! The work is split across the workspace crates:
//!
//! - [`ir`]: the expression DAG, tensor types and the operator registry
//! - [`rewrite`]: pattern matching, the rewrite driver and the built-in rules
//! - [`arith`]: affine index simplification and buffer offsets
//!
//! This crate wraps them into passes that can be sequenced with their
//! requirements (see [`pipeline`]).

pub mod pipeline;

pub use tensile_arith as arith;
pub use tensile_ir as ir;
pub use tensile_rewrite as rewrite;

pub use pipeline::{
    Pass, PassContext, PassError, PassInfo, PassResult, Sequential, SimplifyExprPass,
};
pub use tensile_rewrite::simplify_expr;
