//! Built-in simplification rules.
//!
//! Each rule allocates its pattern in a shared `PatternContext` and keeps
//! handles to the sub-patterns its callback reads back from the bindings.

mod full_elementwise;
mod reshape;
mod transpose;

pub use full_elementwise::FullElementwise;
pub use reshape::SimplifyReshape;
pub use transpose::SimplifyTranspose;
