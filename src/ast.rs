//! Span-annotated syntax tree produced by the fast parser.
//!
//! Design goals:
//! - Zero-copy: identifiers, numbers and string literals borrow `&'src str`
//!   slices from the source buffer.
//! - Lossless: every [`Stmt`] and [`Expr`] records the exact byte [`Span`] it
//!   was parsed from, so any sub-node can be rendered back to its original
//!   text (including inner whitespace such as `range (0, 10)`).
//! - Tagged variants: statements expose an explicit [`NodeKind`] so matchers
//!   can ask for "the first node of kind X" without guessing at shapes.
//! - Compact: only the statement forms a module-level accumulator loop lives
//!   among are modelled structurally; other statements keep their span and
//!   keyword (and, for compound statements, their nested suites).

// ── Location ─────────────────────────────────────────────────────────────────

/// Byte offset into the source file (0-indexed).
/// Using `u32` keeps nodes small; files >4 GB are not realistic.
pub type Offset = u32;

/// Half-open byte range `[start, end)` into the source text.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub start: Offset,
    pub end: Offset,
}

impl Span {
    pub const fn new(start: Offset, end: Offset) -> Self {
        Self { start, end }
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start) as usize
    }

    /// Synthetic nodes (built in code rather than parsed) carry an empty span.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The text this span covers, or `None` if it does not fit `source`.
    pub fn slice<'s>(&self, source: &'s str) -> Option<&'s str> {
        source.get(self.start as usize..self.end as usize)
    }
}

// ── Syntax tree ───────────────────────────────────────────────────────────────

/// A parsed module: the source it came from plus its top-level statements.
#[derive(Debug, Clone)]
pub struct SyntaxTree<'src> {
    source: &'src str,
    body: Vec<Stmt<'src>>,
}

impl<'src> SyntaxTree<'src> {
    pub fn new(source: &'src str, body: Vec<Stmt<'src>>) -> Self {
        Self { source, body }
    }

    /// The source text every span in this tree points into.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Top-level statements in document order.
    pub fn body(&self) -> &[Stmt<'src>] {
        &self.body
    }
}

// ── Statements ────────────────────────────────────────────────────────────────

/// Discriminant of a [`StmtKind`], for kind-based lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Assignment,
    AugmentedAssignment,
    AnnotatedAssignment,
    ForLoop,
    Expression,
    Compound,
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt<'src> {
    /// From the first token of the statement (or its first decorator) to the
    /// last token of its last clause.
    pub span: Span,
    pub kind: StmtKind<'src>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind<'src> {
    /// `a = b = expr` (at least one target)
    Assign {
        targets: Vec<Expr<'src>>,
        value: Expr<'src>,
    },
    /// `a += expr`
    AugAssign {
        target: Expr<'src>,
        op: &'src str,
        value: Expr<'src>,
    },
    /// `a: int` / `a: int = expr`
    AnnAssign {
        target: Expr<'src>,
        annotation: Expr<'src>,
        value: Option<Expr<'src>>,
    },
    /// `for iterator in iterable: body [else: orelse]`
    For {
        iterator: Expr<'src>,
        iterable: Expr<'src>,
        body: Vec<Stmt<'src>>,
        orelse: Vec<Stmt<'src>>,
        is_async: bool,
    },
    /// A bare expression statement, e.g. `result.append(i)` or `print(x)`.
    Expr(Expr<'src>),
    /// `if`, `while`, `def`, `class`, `with`, `try`, `match`, `case`.
    /// The header is kept as a span; each clause body is parsed.
    Compound {
        keyword: &'static str,
        decorators: Vec<Expr<'src>>,
        header: Span,
        clauses: Vec<Vec<Stmt<'src>>>,
        is_async: bool,
    },
    /// `pass`, `import …`, `return …` and other keyword-led simple statements.
    Simple { keyword: &'static str },
}

impl StmtKind<'_> {
    pub fn node_kind(&self) -> NodeKind {
        match self {
            StmtKind::Assign { .. } => NodeKind::Assignment,
            StmtKind::AugAssign { .. } => NodeKind::AugmentedAssignment,
            StmtKind::AnnAssign { .. } => NodeKind::AnnotatedAssignment,
            StmtKind::For { .. } => NodeKind::ForLoop,
            StmtKind::Expr(_) => NodeKind::Expression,
            StmtKind::Compound { .. } => NodeKind::Compound,
            StmtKind::Simple { .. } => NodeKind::Simple,
        }
    }
}

// ── Expressions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Expr<'src> {
    pub span: Span,
    pub kind: ExprKind<'src>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind<'src> {
    Name(&'src str),
    /// Raw numeric literal text.
    Number(&'src str),
    /// One or more adjacent string literals, each as raw source text.
    Str(Vec<&'src str>),
    Bool(bool),
    None,
    Ellipsis,
    /// `value.attr`
    Attribute {
        value: Box<Expr<'src>>,
        attr: &'src str,
    },
    /// `func(args)`
    Call {
        func: Box<Expr<'src>>,
        args: Vec<Arg<'src>>,
    },
    /// `value[index]`
    Subscript {
        value: Box<Expr<'src>>,
        index: Box<Expr<'src>>,
    },
    /// `lower:upper:step` inside a subscript.
    Slice {
        lower: Option<Box<Expr<'src>>>,
        upper: Option<Box<Expr<'src>>>,
        step: Option<Box<Expr<'src>>>,
    },
    /// `-x`, `+x`, `~x`, `not x`
    UnaryOp {
        op: &'src str,
        operand: Box<Expr<'src>>,
    },
    /// Arithmetic and bitwise operators, including `**`.
    BinOp {
        left: Box<Expr<'src>>,
        op: &'src str,
        right: Box<Expr<'src>>,
    },
    /// `a and b and c` / `a or b`
    BoolOp {
        op: &'src str,
        values: Vec<Expr<'src>>,
    },
    /// `a < b <= c`, `x not in y`, `x is not None`
    Compare {
        left: Box<Expr<'src>>,
        comparisons: Vec<(&'src str, Expr<'src>)>,
    },
    /// `body if test else orelse`
    IfExp {
        body: Box<Expr<'src>>,
        test: Box<Expr<'src>>,
        orelse: Box<Expr<'src>>,
    },
    /// `lambda params: body`; parameters are kept as their source text.
    Lambda {
        params: &'src str,
        body: Box<Expr<'src>>,
    },
    /// `target := value`
    NamedExpr {
        target: Box<Expr<'src>>,
        value: Box<Expr<'src>>,
    },
    /// `*value` in a display, call or target list.
    Starred(Box<Expr<'src>>),
    /// `(inner)`, kept so regenerated text preserves explicit grouping.
    Paren(Box<Expr<'src>>),
    Tuple {
        elts: Vec<Expr<'src>>,
        parenthesized: bool,
    },
    List(Vec<Expr<'src>>),
    Set(Vec<Expr<'src>>),
    Dict(Vec<DictItem<'src>>),
    /// List/set/dict comprehensions and generator expressions.
    Comprehension {
        kind: CompKind,
        element: Box<Expr<'src>>,
        /// Value expression of a dict comprehension (`element` is the key).
        value: Option<Box<Expr<'src>>>,
        clauses: Vec<CompClause<'src>>,
    },
    Await(Box<Expr<'src>>),
    Yield {
        value: Option<Box<Expr<'src>>>,
        is_from: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompKind {
    List,
    Set,
    Dict,
    Generator,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CompClause<'src> {
    For {
        target: Expr<'src>,
        iter: Expr<'src>,
        is_async: bool,
    },
    If(Expr<'src>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum DictItem<'src> {
    Pair { key: Expr<'src>, value: Expr<'src> },
    /// `**mapping`
    Unpack(Expr<'src>),
}

/// One argument of a call.  `*args` is a `Positional` holding a `Starred`.
#[derive(Debug, Clone, PartialEq)]
pub enum Arg<'src> {
    Positional(Expr<'src>),
    Keyword { name: &'src str, value: Expr<'src> },
    /// `**kwargs`
    Unpack(Expr<'src>),
}

/// Named view of a chained-access call `base.attr(args)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainedCall<'a, 'src> {
    pub base: &'src str,
    pub attr: &'src str,
    pub args: &'a [Arg<'src>],
}

impl<'src> Expr<'src> {
    pub fn new(span: Span, kind: ExprKind<'src>) -> Self {
        Self { span, kind }
    }

    /// A node built in code rather than parsed; it has no source text.
    pub fn synthetic(kind: ExprKind<'src>) -> Self {
        Self::new(Span::default(), kind)
    }

    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    /// The identifier, if this is a bare name.
    pub fn as_name(&self) -> Option<&'src str> {
        match self.kind {
            ExprKind::Name(n) => Some(n),
            _ => None,
        }
    }

    /// Decompose `base.attr(args)` into its named parts.
    pub fn as_chained_call(&self) -> Option<ChainedCall<'_, 'src>> {
        let ExprKind::Call { func, args } = &self.kind else {
            return None;
        };
        let ExprKind::Attribute { value, attr } = &func.kind else {
            return None;
        };
        Some(ChainedCall {
            base: value.as_name()?,
            attr: *attr,
            args,
        })
    }

    /// Whether this expression may appear on the left of `=` or after `for`.
    pub fn is_assignable(&self) -> bool {
        match &self.kind {
            ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. } => true,
            ExprKind::Starred(inner) | ExprKind::Paren(inner) => inner.is_assignable(),
            ExprKind::Tuple { elts, .. } | ExprKind::List(elts) => {
                elts.iter().all(Expr::is_assignable)
            }
            _ => false,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn name(n: &str) -> Expr<'_> {
        Expr::synthetic(ExprKind::Name(n))
    }

    #[test]
    fn test_span_slice_and_cover() {
        let src = "result = []";
        let a = Span::new(0, 6);
        assert_eq!(a.slice(src), Some("result"));
        assert_eq!(a.cover(Span::new(9, 11)), Span::new(0, 11));
        assert_eq!(Span::new(5, 40).slice(src), None);
    }

    #[test]
    fn test_chained_call_view() {
        let call = Expr::synthetic(ExprKind::Call {
            func: Expr::synthetic(ExprKind::Attribute {
                value: name("acc").boxed(),
                attr: "append",
            })
            .boxed(),
            args: vec![Arg::Positional(name("i"))],
        });
        let view = call.as_chained_call().expect("chained call");
        assert_eq!(view.base, "acc");
        assert_eq!(view.attr, "append");
        assert_eq!(view.args.len(), 1);
    }

    #[test]
    fn test_plain_call_is_not_chained() {
        let call = Expr::synthetic(ExprKind::Call {
            func: name("print").boxed(),
            args: vec![],
        });
        assert!(call.as_chained_call().is_none());
    }

    #[test]
    fn test_assignable_targets() {
        assert!(name("x").is_assignable());
        let tuple = Expr::synthetic(ExprKind::Tuple {
            elts: vec![name("a"), name("b")],
            parenthesized: false,
        });
        assert!(tuple.is_assignable());
        assert!(!Expr::synthetic(ExprKind::Number("1")).is_assignable());
    }

    #[test]
    fn test_node_kind() {
        let stmt = StmtKind::Expr(name("x"));
        assert_eq!(stmt.node_kind(), NodeKind::Expression);
        let simple = StmtKind::Simple { keyword: "pass" };
        assert_eq!(simple.node_kind(), NodeKind::Simple);
    }
}
