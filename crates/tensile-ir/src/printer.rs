//! Text format printer for expression DAGs.
//!
//! Each reachable node is printed once, children first:
//!
//! ```text
//! %0 = var @x : tensor<1x2xfloat32>
//! %1 = const 1.0 : tensor<float32>
//! %2 = multiply(%0, %1) : tensor<1x2xfloat32>
//! ```

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write;

use crate::context::{ExprContext, ExprKind, Literal};
use crate::refs::ExprRef;
use crate::walk::post_order;

/// Print the DAG rooted at `root` as IR text. Values are numbered in print order.
pub fn print_expr(ctx: &ExprContext, root: ExprRef) -> String {
    let mut out = String::new();
    write_expr(ctx, &mut out, root).expect("fmt::Write to String never fails");
    out
}

fn write_expr(ctx: &ExprContext, f: &mut impl Write, root: ExprRef) -> fmt::Result {
    let mut names: HashMap<ExprRef, usize> = HashMap::new();
    for expr in post_order(ctx, root) {
        let num = names.len();
        names.insert(expr, num);
        write!(f, "%{num} = ")?;
        match ctx.kind(expr) {
            ExprKind::Var { name } => write!(f, "var @{name}")?,
            ExprKind::Constant(lit) => {
                f.write_str("const ")?;
                write_literal(f, lit)?;
            }
            ExprKind::Call { op, args, attrs } => {
                write!(f, "{op}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    match names.get(arg) {
                        Some(n) => write!(f, "%{n}")?,
                        None => f.write_str("%?")?,
                    }
                }
                f.write_char(')')?;
                if !attrs.is_empty() {
                    // Symbol order follows interning order; sort by text for stable output.
                    let mut entries: Vec<(String, String)> = attrs
                        .iter()
                        .map(|(key, value)| (key.to_string(), value.to_string()))
                        .collect();
                    entries.sort();
                    f.write_str(" {")?;
                    for (i, (key, value)) in entries.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{key} = {value}")?;
                    }
                    f.write_char('}')?;
                }
            }
        }
        match ctx.ty(expr) {
            Some(ty) => writeln!(f, " : {ty}")?,
            None => writeln!(f, " : ?")?,
        }
    }
    Ok(())
}

fn write_literal(f: &mut impl Write, lit: &Literal) -> fmt::Result {
    if lit.is_scalar() {
        if let Some(value) = lit.values.first() {
            return write!(f, "{value}");
        }
    }
    f.write_char('[')?;
    for (i, value) in lit.values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{value}")?;
    }
    f.write_char(']')
}
