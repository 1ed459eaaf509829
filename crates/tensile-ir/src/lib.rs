//! Tensile IR crate.
//!
//! Arena-backed expression DAG for tensor programs: call, constant and
//! variable nodes referenced by `ExprRef`, their tensor types, attribute bags,
//! the operator registry and the layout descriptors used by layout rewrites.

// === Core storage ===
pub mod context;
pub mod refs;
pub mod symbol;

// === Types and metadata ===
pub mod attrs;
pub mod layout;
pub mod registry;
pub mod types;

// === Utilities ===
pub mod constant;
pub mod errors;
pub mod ops;
pub mod printer;
pub mod structural;
pub mod walk;

// Re-export smallvec for crates that build argument lists
pub use smallvec;

pub use attrs::{Attribute, Attrs};
pub use constant::{is_scalar_constant, make_scalar_constant};
pub use context::{CallBuilder, ExprContext, ExprKind, ExprNode, Literal, ScalarValue};
pub use errors::{IrError, IrResult};
pub use layout::{Layout, LayoutAxis};
pub use printer::print_expr;
pub use refs::ExprRef;
pub use registry::{OpPatternKind, OpRegistry};
pub use structural::structural_eq;
pub use symbol::Symbol;
pub use types::{DType, Dim, ScalarKind, TensorType};
pub use walk::post_order;
