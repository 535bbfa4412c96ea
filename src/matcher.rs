//! Locating the accumulator idiom in a parsed module.
//!
//! ```python
//! acc = []
//! for i in items:
//!     acc.append(i * 2)
//! ```
//!
//! Every lookup takes the first node of the wanted kind among the module's
//! top-level statements, in document order.  The matcher only reads the tree;
//! the pieces it returns borrow from it.

use crate::ast::{Arg, Expr, ExprKind, NodeKind, Stmt, StmtKind, SyntaxTree};
use crate::error::MatchError;

/// Borrowed view of a `for` statement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForLoop<'a, 'src> {
    /// The loop variable (or target list).
    pub iterator: &'a Expr<'src>,
    /// The iterated expression.
    pub iterable: &'a Expr<'src>,
    pub body: &'a [Stmt<'src>],
}

/// The four fragments a comprehension is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdiomMatch<'a, 'src> {
    pub target: &'a Expr<'src>,
    pub iterable: &'a Expr<'src>,
    pub loop_var: &'a Expr<'src>,
    pub element: &'a Expr<'src>,
}

/// First statement of `kind`, in document order.
pub fn first_of_kind<'a, 'src>(stmts: &'a [Stmt<'src>], kind: NodeKind) -> Option<&'a Stmt<'src>> {
    stmts.iter().find(|s| s.kind.node_kind() == kind)
}

/// First target of the first top-level assignment.
pub fn find_assignment_target<'a, 'src>(tree: &'a SyntaxTree<'src>) -> Option<&'a Expr<'src>> {
    match &first_of_kind(tree.body(), NodeKind::Assignment)?.kind {
        StmtKind::Assign { targets, .. } => targets.first(),
        _ => None,
    }
}

pub fn find_for_loop<'a, 'src>(tree: &'a SyntaxTree<'src>) -> Result<ForLoop<'a, 'src>, MatchError> {
    match first_of_kind(tree.body(), NodeKind::ForLoop).map(|s| &s.kind) {
        Some(StmtKind::For {
            iterator,
            iterable,
            body,
            ..
        }) => Ok(ForLoop {
            iterator,
            iterable,
            body,
        }),
        _ => Err(MatchError::MissingForLoop),
    }
}

pub fn find_iterable_expression<'a, 'src>(for_loop: &ForLoop<'a, 'src>) -> &'a Expr<'src> {
    for_loop.iterable
}

pub fn find_loop_variable<'a, 'src>(for_loop: &ForLoop<'a, 'src>) -> &'a Expr<'src> {
    for_loop.iterator
}

/// The single argument of the first `name.attr(arg)` call statement in the
/// loop body.
///
/// The attribute name is not checked, nor is the receiver compared with the
/// assignment target.  The call must pass exactly one argument, and it must
/// be a plain positional one rather than `*args`, a keyword or `**kwargs`.
pub fn find_append_argument<'a, 'src>(
    for_loop: &ForLoop<'a, 'src>,
) -> Result<&'a Expr<'src>, MatchError> {
    let call = for_loop
        .body
        .iter()
        .find_map(|stmt| match &stmt.kind {
            StmtKind::Expr(expr) => expr.as_chained_call(),
            _ => None,
        })
        .ok_or(MatchError::MissingAppendCall)?;

    let [arg] = call.args else {
        return Err(MatchError::AppendArity {
            found: call.args.len(),
        });
    };
    let kind = match arg {
        Arg::Positional(Expr {
            kind: ExprKind::Starred(_),
            ..
        }) => "`*` unpacking",
        Arg::Positional(arg) => return Ok(arg),
        Arg::Keyword { .. } => "a keyword argument",
        Arg::Unpack(_) => "`**` unpacking",
    };
    Err(MatchError::AppendArgumentKind { kind })
}

/// Run every lookup, checking for the assignment target first.
pub fn match_idiom<'a, 'src>(tree: &'a SyntaxTree<'src>) -> Result<IdiomMatch<'a, 'src>, MatchError> {
    let target = find_assignment_target(tree).ok_or(MatchError::MissingAssignment)?;
    let for_loop = find_for_loop(tree)?;
    let element = find_append_argument(&for_loop)?;
    Ok(IdiomMatch {
        target,
        iterable: find_iterable_expression(&for_loop),
        loop_var: find_loop_variable(&for_loop),
        element,
    })
}
