//! Entity references into the expression arena.
//!
//! Each ref type is a thin `u32` wrapper providing type-safe indexing
//! into `PrimaryMap` storage in `ExprContext`.

use cranelift_entity::entity_impl;

/// Reference to an expression node in the arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprRef(u32);
entity_impl!(ExprRef, "e");
