//! Pass pipeline.
//!
//! A pass maps a typed expression DAG to a new root in the same context.
//! `Sequential` runs passes in order, scheduling each pass's requirements
//! immediately before it:
//!
//! ```text
//! root
//!   │
//!   ▼
//! InferType (host-provided, required by SimplifyExpr)
//!   │
//!   ▼
//! SimplifyExpr ─► root' (all nodes still typed)
//! ```
//!
//! Type inference is not part of this crate. Hosts register their own pass
//! named `InferType` with [`Sequential::provide`].

use std::collections::BTreeSet;

use derive_more::{Display, Error, From};
use tensile_ir::{ExprContext, ExprRef, IrError, post_order};
use tensile_rewrite::{RewriteConfig, RewriteError, simplify_expr_with};
use tracing::debug;

pub type PassResult<T> = Result<T, PassError>;

#[derive(Debug, Display, Error, From)]
pub enum PassError {
    #[display("{_0}")]
    #[from]
    Rewrite(RewriteError),

    #[display("{_0}")]
    #[from]
    Ir(IrError),

    /// A pass requires another pass that nobody provided.
    #[display("pass `{required_by}` requires `{name}`, which is not available")]
    UnknownPass {
        name: &'static str,
        required_by: &'static str,
    },

    /// A pass that depends on type information left a node untyped.
    #[display("pass `{pass}` left expression {expr} without a type")]
    Untyped { pass: &'static str, expr: ExprRef },

    /// Failure reported by a host-provided pass.
    #[display("pass `{pass}` failed: {message}")]
    Host { pass: &'static str, message: String },
}

/// Static description of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PassInfo {
    pub name: &'static str,
    /// Minimum `PassContext::opt_level` at which the pass runs.
    pub opt_level: u8,
    /// Passes run immediately before this one.
    pub required: &'static [&'static str],
}

pub trait Pass {
    fn info(&self) -> PassInfo;

    /// Transform the DAG rooted at `root` and return the new root.
    fn run(&self, ctx: &mut ExprContext, root: ExprRef) -> PassResult<ExprRef>;
}

/// Options shared by every pass of a pipeline run.
#[derive(Clone, Debug)]
pub struct PassContext {
    /// Passes with a higher `opt_level` are skipped. Default: 2.
    pub opt_level: u8,
    /// Passes skipped by name regardless of level.
    pub disabled: BTreeSet<String>,
}

impl Default for PassContext {
    fn default() -> Self {
        Self {
            opt_level: 2,
            disabled: BTreeSet::new(),
        }
    }
}

impl PassContext {
    pub fn with_opt_level(mut self, opt_level: u8) -> Self {
        self.opt_level = opt_level;
        self
    }

    pub fn disable(mut self, name: impl Into<String>) -> Self {
        self.disabled.insert(name.into());
        self
    }

    fn is_enabled(&self, info: &PassInfo) -> bool {
        info.opt_level <= self.opt_level && !self.disabled.contains(info.name)
    }
}

// =============================================================================
// SimplifyExpr
// =============================================================================

/// Pattern-based expression simplification as a pass.
#[derive(Clone, Debug, Default)]
pub struct SimplifyExprPass {
    config: RewriteConfig,
}

impl SimplifyExprPass {
    pub const NAME: &'static str = "SimplifyExpr";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RewriteConfig) -> Self {
        Self { config }
    }
}

impl Pass for SimplifyExprPass {
    fn info(&self) -> PassInfo {
        PassInfo {
            name: Self::NAME,
            opt_level: 0,
            required: &["InferType"],
        }
    }

    fn run(&self, ctx: &mut ExprContext, root: ExprRef) -> PassResult<ExprRef> {
        Ok(simplify_expr_with(ctx, root, self.config.clone())?)
    }
}

// =============================================================================
// Sequential
// =============================================================================

/// Ordered list of passes.
#[derive(Default)]
pub struct Sequential {
    passes: Vec<Box<dyn Pass>>,
    /// Passes available to satisfy requirements, looked up by name.
    provided: Vec<Box<dyn Pass>>,
}

impl Sequential {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pass to the pipeline.
    pub fn add(mut self, pass: impl Pass + 'static) -> Self {
        self.passes.push(Box::new(pass));
        self
    }

    /// Make a pass available to satisfy other passes' requirements.
    pub fn provide(mut self, pass: impl Pass + 'static) -> Self {
        self.provided.push(Box::new(pass));
        self
    }

    fn lookup(&self, name: &str) -> Option<&dyn Pass> {
        self.provided
            .iter()
            .chain(&self.passes)
            .find(|pass| pass.info().name == name)
            .map(|pass| pass.as_ref())
    }

    pub fn run(
        &self,
        pass_ctx: &PassContext,
        ctx: &mut ExprContext,
        mut root: ExprRef,
    ) -> PassResult<ExprRef> {
        for pass in &self.passes {
            let info = pass.info();
            if !pass_ctx.is_enabled(&info) {
                debug!(pass = info.name, opt_level = info.opt_level, "skipping pass");
                continue;
            }
            for &name in info.required {
                let required = self.lookup(name).ok_or(PassError::UnknownPass {
                    name,
                    required_by: info.name,
                })?;
                debug!(pass = name, required_by = info.name, "running required pass");
                root = required.run(ctx, root)?;
            }

            debug!(pass = info.name, %root, "running pass");
            root = pass.run(ctx, root)?;
            debug!(pass = info.name, %root, "pass finished");

            if info.required.contains(&"InferType") {
                check_typed(ctx, root, info.name)?;
            }
        }
        Ok(root)
    }
}

fn check_typed(ctx: &ExprContext, root: ExprRef, pass: &'static str) -> PassResult<()> {
    match post_order(ctx, root).into_iter().find(|&e| ctx.ty(e).is_none()) {
        Some(expr) => Err(PassError::Untyped { pass, expr }),
        None => Ok(()),
    }
}
