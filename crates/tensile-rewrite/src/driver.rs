//! Bottom-up rewrite driver.
//!
//! Visits every node reachable from the root once, children first. Each node
//! is rebuilt over its rewritten arguments (`post`), then the rules are tried
//! against the original node (`pre`) in registration order and the first
//! match decides the replacement. Existing nodes are never modified.

use cranelift_entity::packed_option::PackedOption;
use cranelift_entity::SecondaryMap;
use smallvec::SmallVec;
use tensile_ir::{ExprContext, ExprRef};
use tracing::{debug, trace, warn};

use crate::errors::RewriteResult;
use crate::matcher::{Bindings, match_pattern};
use crate::pattern::{PatternContext, PatternRef};

/// A pattern and the rewrite applied where it matches.
pub trait RewriteCallback {
    /// Root pattern, allocated in the rewriter's `PatternContext`.
    fn pattern(&self) -> PatternRef;

    /// Replacement for `pre`.
    ///
    /// `post` is `pre` over already rewritten arguments, and `bindings` refer
    /// to rewritten expressions. Returning `post` declines the rewrite.
    fn rewrite(
        &self,
        ctx: &mut ExprContext,
        pre: ExprRef,
        post: ExprRef,
        bindings: &Bindings,
    ) -> RewriteResult<ExprRef>;

    /// Whether a changed result is fed back through the rules.
    fn recursive(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Configuration for the rewrite driver.
#[derive(Clone, Debug)]
pub struct RewriteConfig {
    /// How many times a single node's replacement is re-examined by
    /// recursive rules. Default: 32.
    pub max_reexamine: usize,
}

impl Default for RewriteConfig {
    fn default() -> Self {
        Self { max_reexamine: 32 }
    }
}

/// Ordered rule set applied by one post-order traversal.
pub struct PatternRewriter {
    patterns: PatternContext,
    callbacks: Vec<Box<dyn RewriteCallback>>,
    config: RewriteConfig,
}

impl PatternRewriter {
    /// Rewriter over `patterns`, which must hold every callback's pattern.
    pub fn new(patterns: PatternContext) -> Self {
        Self {
            patterns,
            callbacks: Vec::new(),
            config: RewriteConfig::default(),
        }
    }

    /// Add a rule. Rules are tried in the order they were added.
    pub fn add_callback(mut self, callback: impl RewriteCallback + 'static) -> Self {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn with_config(mut self, config: RewriteConfig) -> Self {
        self.config = config;
        self
    }

    pub fn patterns(&self) -> &PatternContext {
        &self.patterns
    }

    /// Rewrite the DAG rooted at `root` and return the new root.
    pub fn rewrite(&self, ctx: &mut ExprContext, root: ExprRef) -> RewriteResult<ExprRef> {
        let mut memo: SecondaryMap<ExprRef, PackedOption<ExprRef>> = SecondaryMap::new();
        // (node, arguments already scheduled)
        let mut stack = vec![(root, false)];

        while let Some((pre, expanded)) = stack.pop() {
            if memo[pre].is_some() {
                continue;
            }
            if !expanded {
                stack.push((pre, true));
                for &arg in ctx.args(pre).iter().rev() {
                    if memo[arg].is_none() {
                        stack.push((arg, false));
                    }
                }
                continue;
            }

            let post = rebuild(ctx, pre, &memo);
            let replacement = self.visit(ctx, pre, post, &memo)?;
            memo[pre] = replacement.into();
        }

        Ok(memo[root].expand().unwrap_or(root))
    }

    fn visit(
        &self,
        ctx: &mut ExprContext,
        pre: ExprRef,
        post: ExprRef,
        memo: &SecondaryMap<ExprRef, PackedOption<ExprRef>>,
    ) -> RewriteResult<ExprRef> {
        let lookup = |e: ExprRef| {
            if e == pre {
                post
            } else {
                memo[e].expand().unwrap_or(e)
            }
        };
        let Some((result, recursive)) = self.apply_first(ctx, pre, post, lookup)? else {
            return Ok(post);
        };
        if !recursive || result == post {
            return Ok(result);
        }

        // The replacement is a new graph: match it as is, without the memo.
        let mut current = result;
        for _ in 0..self.config.max_reexamine {
            match self.apply_first(ctx, current, current, |e| e)? {
                Some((next, _)) if next != current => current = next,
                _ => return Ok(current),
            }
        }
        warn!(
            %pre,
            limit = self.config.max_reexamine,
            "rewrite did not settle; keeping the last replacement"
        );
        Ok(current)
    }

    /// Run the first rule whose pattern matches `pre`.
    fn apply_first(
        &self,
        ctx: &mut ExprContext,
        pre: ExprRef,
        post: ExprRef,
        lookup: impl Fn(ExprRef) -> ExprRef,
    ) -> RewriteResult<Option<(ExprRef, bool)>> {
        for callback in &self.callbacks {
            let Some(bindings) = match_pattern(&self.patterns, ctx, callback.pattern(), pre)
            else {
                trace!(rule = callback.name(), %pre, "no match");
                continue;
            };
            let bindings = bindings.map_exprs(&lookup);
            let result = callback.rewrite(ctx, pre, post, &bindings)?;
            debug!(rule = callback.name(), %pre, %post, %result, "rule fired");
            return Ok(Some((result, callback.recursive())));
        }
        Ok(None)
    }
}

/// `pre` over the rewritten arguments, or `pre` itself when none changed.
fn rebuild(
    ctx: &mut ExprContext,
    pre: ExprRef,
    memo: &SecondaryMap<ExprRef, PackedOption<ExprRef>>,
) -> ExprRef {
    let args = ctx.args(pre);
    let new_args: SmallVec<[ExprRef; 4]> = args
        .iter()
        .map(|&arg| memo[arg].expand().unwrap_or(arg))
        .collect();
    if new_args.as_slice() == args {
        return pre;
    }
    ctx.with_args(pre, new_args)
}
