//! Turning expression nodes back into Python source text.
//!
//! Two renderers implement [`NodeRenderer`]:
//!
//! - [`SourceRenderer`] slices the node's span out of the original source, so
//!   the output keeps the author's spacing (`range (0, 10)` stays as is).
//!   A generator passed as a call's only argument (`f(x for x in y)`) has no
//!   parentheses of its own and gets them added.
//! - [`Unparser`] rebuilds the text from the node's fields with canonical
//!   spacing, adding parentheses only where operator precedence needs them.
//!   It handles synthetic nodes that have no source text.

use crate::ast::{Arg, CompClause, CompKind, DictItem, Expr, ExprKind};

/// Anything that can render an expression node as Python source.
pub trait NodeRenderer {
    /// Render `node`.  `source` is the text the node's span points into; it
    /// may be ignored by renderers that do not need it.
    fn render(&self, source: &str, node: &Expr<'_>) -> String;
}

/// Lossless renderer: the exact source slice a node was parsed from.
///
/// Nodes with an empty span (or a span that does not fit `source`) fall back
/// to [`Unparser`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceRenderer;

impl NodeRenderer for SourceRenderer {
    fn render(&self, source: &str, node: &Expr<'_>) -> String {
        if !node.span.is_empty()
            && let Some(text) = node.span.slice(source)
        {
            if is_bare_generator(node) {
                return format!("({text})");
            }
            return text.to_string();
        }
        Unparser.render(source, node)
    }
}

/// A generator expression whose span starts at its element, i.e. one
/// borrowing the parentheses of the call around it.
fn is_bare_generator(node: &Expr<'_>) -> bool {
    matches!(
        &node.kind,
        ExprKind::Comprehension {
            kind: CompKind::Generator,
            element,
            ..
        } if element.span.start == node.span.start
    )
}

/// Whether `expr` needs parentheses as the iterable of a comprehension
/// clause, which only takes an `or`-level expression (`for i in a, b:` is
/// fine in a loop header but not inside `[…]`).
pub fn needs_parens_as_iterable(expr: &Expr<'_>) -> bool {
    precedence(expr) < PREC_OR
}

/// Whether `expr` needs parentheses as the element of a list comprehension.
pub fn needs_parens_as_element(expr: &Expr<'_>) -> bool {
    matches!(
        expr.kind,
        ExprKind::Tuple {
            parenthesized: false,
            ..
        } | ExprKind::Yield { .. }
    )
}

/// Structural renderer with canonical spacing.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unparser;

impl NodeRenderer for Unparser {
    fn render(&self, _source: &str, node: &Expr<'_>) -> String {
        let mut out = String::new();
        unparse(node, &mut out);
        out
    }
}

// ── Precedence ────────────────────────────────────────────────────────────────

// Binding strength of each expression form, loosest first.
const PREC_TUPLE: u8 = 0;
const PREC_LAMBDA: u8 = 1;
const PREC_IFEXP: u8 = 2;
const PREC_OR: u8 = 3;
const PREC_AND: u8 = 4;
const PREC_NOT: u8 = 5;
const PREC_CMP: u8 = 6;
const PREC_BOR: u8 = 7;
const PREC_UNARY: u8 = 13;
const PREC_POWER: u8 = 14;
const PREC_AWAIT: u8 = 15;
const PREC_ATOM: u8 = 16;

fn binop_precedence(op: &str) -> u8 {
    match op {
        "|" => PREC_BOR,
        "^" => 8,
        "&" => 9,
        "<<" | ">>" => 10,
        "+" | "-" => 11,
        "*" | "/" | "//" | "%" | "@" => 12,
        "**" => PREC_POWER,
        _ => PREC_ATOM,
    }
}

fn precedence(expr: &Expr<'_>) -> u8 {
    match &expr.kind {
        ExprKind::Tuple {
            parenthesized: false,
            ..
        }
        | ExprKind::NamedExpr { .. }
        | ExprKind::Yield { .. } => PREC_TUPLE,
        ExprKind::Lambda { .. } => PREC_LAMBDA,
        ExprKind::IfExp { .. } => PREC_IFEXP,
        ExprKind::BoolOp { op, .. } if *op == "or" => PREC_OR,
        ExprKind::BoolOp { .. } => PREC_AND,
        ExprKind::UnaryOp { op, .. } if *op == "not" => PREC_NOT,
        ExprKind::UnaryOp { .. } => PREC_UNARY,
        ExprKind::Compare { .. } => PREC_CMP,
        ExprKind::BinOp { op, .. } => binop_precedence(op),
        ExprKind::Await(_) => PREC_AWAIT,
        _ => PREC_ATOM,
    }
}

/// Render `expr`, parenthesised if it binds looser than `min`.
fn unparse_at(expr: &Expr<'_>, min: u8, out: &mut String) {
    if precedence(expr) < min {
        out.push('(');
        unparse(expr, out);
        out.push(')');
    } else {
        unparse(expr, out);
    }
}

// ── Unparsing ─────────────────────────────────────────────────────────────────

fn unparse(expr: &Expr<'_>, out: &mut String) {
    match &expr.kind {
        ExprKind::Name(s) | ExprKind::Number(s) => out.push_str(s),
        ExprKind::Str(parts) => out.push_str(&parts.join(" ")),
        ExprKind::Bool(true) => out.push_str("True"),
        ExprKind::Bool(false) => out.push_str("False"),
        ExprKind::None => out.push_str("None"),
        ExprKind::Ellipsis => out.push_str("..."),
        ExprKind::Attribute { value, attr } => {
            unparse_at(value, PREC_ATOM, out);
            // `1 .real`: a bare integer needs a space before the dot.
            if matches!(value.kind, ExprKind::Number(n) if n.bytes().all(|b| b.is_ascii_digit()))
            {
                out.push(' ');
            }
            out.push('.');
            out.push_str(attr);
        }
        ExprKind::Call { func, args } => {
            unparse_at(func, PREC_ATOM, out);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match arg {
                    Arg::Positional(e) => unparse_at(e, PREC_TUPLE + 1, out),
                    Arg::Keyword { name, value } => {
                        out.push_str(name);
                        out.push('=');
                        unparse_at(value, PREC_LAMBDA, out);
                    }
                    Arg::Unpack(e) => {
                        out.push_str("**");
                        unparse_at(e, PREC_BOR, out);
                    }
                }
            }
            out.push(')');
        }
        ExprKind::Subscript { value, index } => {
            unparse_at(value, PREC_ATOM, out);
            out.push('[');
            match &index.kind {
                ExprKind::Tuple {
                    elts,
                    parenthesized: false,
                } if !elts.is_empty() => unparse_seq(elts, out),
                _ => unparse(index, out),
            }
            out.push(']');
        }
        ExprKind::Slice { lower, upper, step } => {
            if let Some(lower) = lower {
                unparse_at(lower, PREC_LAMBDA, out);
            }
            out.push(':');
            if let Some(upper) = upper {
                unparse_at(upper, PREC_LAMBDA, out);
            }
            if let Some(step) = step {
                out.push(':');
                unparse_at(step, PREC_LAMBDA, out);
            }
        }
        ExprKind::UnaryOp { op, operand } => {
            out.push_str(op);
            if *op == "not" {
                out.push(' ');
                unparse_at(operand, PREC_NOT, out);
            } else {
                unparse_at(operand, PREC_UNARY, out);
            }
        }
        ExprKind::BinOp { left, op, right } => {
            let prec = binop_precedence(op);
            // `**` is right-associative; everything else associates left.
            let (lmin, rmin) = if prec == PREC_POWER {
                (PREC_AWAIT, PREC_UNARY)
            } else {
                (prec, prec + 1)
            };
            unparse_at(left, lmin, out);
            out.push(' ');
            out.push_str(op);
            out.push(' ');
            unparse_at(right, rmin, out);
        }
        ExprKind::BoolOp { op, values } => {
            let prec = if *op == "or" { PREC_OR } else { PREC_AND };
            for (i, value) in values.iter().enumerate() {
                if i > 0 {
                    out.push(' ');
                    out.push_str(op);
                    out.push(' ');
                }
                unparse_at(value, prec + 1, out);
            }
        }
        ExprKind::Compare { left, comparisons } => {
            unparse_at(left, PREC_CMP + 1, out);
            for (op, right) in comparisons {
                out.push(' ');
                out.push_str(op);
                out.push(' ');
                unparse_at(right, PREC_CMP + 1, out);
            }
        }
        ExprKind::IfExp { body, test, orelse } => {
            unparse_at(body, PREC_IFEXP + 1, out);
            out.push_str(" if ");
            unparse_at(test, PREC_IFEXP + 1, out);
            out.push_str(" else ");
            unparse_at(orelse, PREC_IFEXP, out);
        }
        ExprKind::Lambda { params, body } => {
            out.push_str("lambda");
            if !params.trim().is_empty() {
                out.push(' ');
                out.push_str(params.trim());
            }
            out.push_str(": ");
            unparse_at(body, PREC_LAMBDA, out);
        }
        ExprKind::NamedExpr { target, value } => {
            unparse(target, out);
            out.push_str(" := ");
            unparse_at(value, PREC_LAMBDA, out);
        }
        ExprKind::Starred(inner) => {
            out.push('*');
            unparse_at(inner, PREC_BOR, out);
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            unparse(inner, out);
            out.push(')');
        }
        ExprKind::Tuple {
            elts,
            parenthesized,
        } => {
            if *parenthesized || elts.is_empty() {
                out.push('(');
            }
            unparse_seq(elts, out);
            if elts.len() == 1 {
                out.push(',');
            }
            if *parenthesized || elts.is_empty() {
                out.push(')');
            }
        }
        ExprKind::List(elts) => {
            out.push('[');
            unparse_seq(elts, out);
            out.push(']');
        }
        ExprKind::Set(elts) if elts.is_empty() => out.push_str("set()"),
        ExprKind::Set(elts) => {
            out.push('{');
            unparse_seq(elts, out);
            out.push('}');
        }
        ExprKind::Dict(items) => {
            out.push('{');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match item {
                    DictItem::Pair { key, value } => {
                        unparse_at(key, PREC_LAMBDA, out);
                        out.push_str(": ");
                        unparse_at(value, PREC_LAMBDA, out);
                    }
                    DictItem::Unpack(e) => {
                        out.push_str("**");
                        unparse_at(e, PREC_BOR, out);
                    }
                }
            }
            out.push('}');
        }
        ExprKind::Comprehension {
            kind,
            element,
            value,
            clauses,
        } => {
            let (open, close) = match kind {
                CompKind::List => ('[', ']'),
                CompKind::Set | CompKind::Dict => ('{', '}'),
                CompKind::Generator => ('(', ')'),
            };
            out.push(open);
            unparse_at(element, PREC_TUPLE + 1, out);
            if let Some(value) = value {
                out.push_str(": ");
                unparse_at(value, PREC_LAMBDA, out);
            }
            for clause in clauses {
                match clause {
                    CompClause::For {
                        target,
                        iter,
                        is_async,
                    } => {
                        out.push_str(if *is_async { " async for " } else { " for " });
                        unparse(target, out);
                        out.push_str(" in ");
                        unparse_at(iter, PREC_OR, out);
                    }
                    CompClause::If(cond) => {
                        out.push_str(" if ");
                        unparse_at(cond, PREC_OR, out);
                    }
                }
            }
            out.push(close);
        }
        ExprKind::Await(inner) => {
            out.push_str("await ");
            unparse_at(inner, PREC_ATOM, out);
        }
        ExprKind::Yield { value, is_from } => {
            out.push_str("yield");
            if let Some(value) = value {
                out.push_str(if *is_from { " from " } else { " " });
                unparse(value, out);
            }
        }
    }
}

/// Comma-separated elements, each parenthesised if it is itself a bare tuple.
fn unparse_seq(elts: &[Expr<'_>], out: &mut String) {
    for (i, e) in elts.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        unparse_at(e, PREC_TUPLE + 1, out);
    }
}
