//! Recursive-descent Python parser.
//!
//! Produces a `Vec<Stmt<'src>>` from a source string using the zero-copy
//! [`Lexer`].  Assignments, `for` loops and expression statements are parsed
//! into full trees; expressions use precedence climbing over the usual
//! Python operator table.  Other compound statements (`if`, `def`, `class`,
//! `with`, `try`, `match`, …) keep their header as a span and have each of
//! their clause bodies parsed recursively.  Keyword-led simple statements
//! (`import`, `return`, `pass`, …) are checked for balanced brackets and kept
//! as a span.
//!
//! There is no error recovery: the first unexpected
//! token aborts the parse with a located [`ParseError`].

use crate::ast::{
    Arg, CompClause, CompKind, DictItem, Expr, ExprKind, Offset, Span, Stmt, StmtKind,
};
use crate::error::ParseError;
use crate::fast_parser::lexer::{Lexer, Token, TokenWithOffset};

type PResult<T> = Result<T, ParseError>;

/// Deepest expression or block nesting accepted.  Deeper input is a
/// `ParseError` rather than a stack overflow.
const MAX_NESTING: u32 = 100;

const TOO_DEEP: &str = "too many nested parentheses";

// ── Public entry point ────────────────────────────────────────────────────────

/// Parse a Python source string into a list of top-level statements.
pub fn parse(src: &str) -> Result<Vec<Stmt<'_>>, ParseError> {
    let mut p = Parser::new(src);
    p.parse_module()
}

// ── Parser ────────────────────────────────────────────────────────────────────

struct Parser<'src> {
    lex: Lexer<'src>,
    /// End offset of the last non-structural token consumed.  Node spans end
    /// here, so trailing newlines and dedents never leak into them.
    last_end: Offset,
    /// Set when the last simple statement ended with `;`.
    more_on_line: bool,
    /// Current expression/block nesting, bounded by [`MAX_NESTING`].
    depth: u32,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            lex: Lexer::new(src),
            last_end: 0,
            more_on_line: false,
            depth: 0,
        }
    }

    // ── Module ────────────────────────────────────────────────────────────────

    fn parse_module(&mut self) -> PResult<Vec<Stmt<'src>>> {
        let mut stmts = Vec::new();
        self.skip_newlines();
        while !matches!(self.peek(), Token::Eof) {
            stmts.push(self.parse_stmt()?);
            self.skip_newlines();
        }
        Ok(stmts)
    }

    // ── Statement dispatch ────────────────────────────────────────────────────

    fn parse_stmt(&mut self) -> PResult<Stmt<'src>> {
        let start = self.lex.peek_offset();

        match self.peek().clone() {
            Token::KwFor => self.parse_for(start, false),
            Token::KwAsync => {
                self.bump();
                match self.peek() {
                    Token::KwFor => self.parse_for(start, true),
                    Token::KwDef | Token::KwWith => self.parse_compound(start, Vec::new(), true),
                    _ => Err(self.unexpected()),
                }
            }
            Token::KwIf
            | Token::KwWhile
            | Token::KwDef
            | Token::KwClass
            | Token::KwWith
            | Token::KwTry => self.parse_compound(start, Vec::new(), false),
            Token::KwMatch if self.soft_keyword_starts_block("match") => {
                self.parse_compound(start, Vec::new(), false)
            }
            Token::KwCase if self.soft_keyword_starts_block("case") => {
                self.parse_compound(start, Vec::new(), false)
            }
            Token::Name("type") if self.type_alias_follows() => self.parse_type_alias(start),
            Token::At => self.parse_decorated(start),
            Token::KwPass
            | Token::KwBreak
            | Token::KwContinue
            | Token::KwImport
            | Token::KwFrom
            | Token::KwGlobal
            | Token::KwNonlocal
            | Token::KwDel
            | Token::KwAssert
            | Token::KwRaise
            | Token::KwReturn => self.parse_simple(start),
            Token::Indent => Err(self.error_here("unexpected indent")),
            // Everything else is an expression statement or assignment.
            _ => self.parse_expr_stmt(start),
        }
    }

    // ── for ───────────────────────────────────────────────────────────────────

    fn parse_for(&mut self, start: Offset, is_async: bool) -> PResult<Stmt<'src>> {
        self.bump(); // consume `for`
        let iterator = self.parse_target_list()?;
        self.expect(&Token::KwIn, "`in`")?;
        let iterable = self.parse_star_expressions()?;
        self.expect(&Token::Colon, "`:`")?;
        let body = self.parse_suite()?;
        let orelse = if matches!(self.peek(), Token::KwElse) {
            self.bump();
            self.expect(&Token::Colon, "`:`")?;
            self.parse_suite()?
        } else {
            vec![]
        };
        Ok(Stmt {
            span: self.span_from(start),
            kind: StmtKind::For {
                iterator,
                iterable,
                body,
                orelse,
                is_async,
            },
        })
    }

    // ── other compound statements ─────────────────────────────────────────────

    /// `match` and `case` are soft keywords: they open a block only when the
    /// line reads as a block header rather than as an expression using them
    /// as a name.
    fn soft_keyword_starts_block(&mut self, keyword: &str) -> bool {
        let rest = &self.lex.source_str()[self.lex.peek_offset() as usize..];
        let line = rest.lines().next().unwrap_or("");
        let after_kw = line.get(keyword.len()..).unwrap_or("").trim_start();
        let used_as_name = after_kw.is_empty()
            || after_kw.starts_with(['=', '.', ':', ')', ',', ';'])
            || after_kw.starts_with("+=");
        !used_as_name && line_header_ends_with_colon(line)
    }

    fn parse_compound(
        &mut self,
        start: Offset,
        decorators: Vec<Expr<'src>>,
        is_async: bool,
    ) -> PResult<Stmt<'src>> {
        let tok = self.bump();
        let keyword = tok.token.keyword().unwrap_or("");
        let header = self.skip_header()?;
        self.expect(&Token::Colon, "`:`")?;
        let mut clauses = vec![self.parse_suite()?];

        // Continuation clauses: `elif`/`else` after `if` and `while`,
        // `except`/`else`/`finally` after `try`.
        loop {
            let continues = match (keyword, self.peek()) {
                ("if", Token::KwElif | Token::KwElse) => true,
                ("while", Token::KwElse) => true,
                ("try", Token::KwExcept | Token::KwElse | Token::KwFinally) => true,
                _ => false,
            };
            if !continues {
                break;
            }
            self.bump();
            self.skip_header()?;
            self.expect(&Token::Colon, "`:`")?;
            clauses.push(self.parse_suite()?);
        }

        Ok(Stmt {
            span: self.span_from(start),
            kind: StmtKind::Compound {
                keyword,
                decorators,
                header,
                clauses,
                is_async,
            },
        })
    }

    /// Consume a compound-statement header up to (not including) its `:`.
    fn skip_header(&mut self) -> PResult<Span> {
        let start = self.lex.peek_offset();
        let mut end = start;
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Colon if depth == 0 => break,
                Token::Newline | Token::Semicolon | Token::Eof | Token::Dedent | Token::Indent
                    if depth == 0 =>
                {
                    return Err(self.error_here("expected `:`"));
                }
                Token::Eof | Token::Invalid(_) => return Err(self.unexpected()),
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 {
                        return Err(self.unexpected());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            end = self.bump().end;
        }
        Ok(Span::new(start, end))
    }

    fn parse_decorated(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let mut decorators = Vec::new();
        while matches!(self.peek(), Token::At) {
            self.bump(); // consume '@'
            decorators.push(self.parse_named_expression()?);
            self.expect(&Token::Newline, "newline after decorator")?;
        }
        let is_async = if matches!(self.peek(), Token::KwAsync) {
            self.bump();
            true
        } else {
            false
        };
        match self.peek() {
            Token::KwDef => self.parse_compound(start, decorators, is_async),
            Token::KwClass if !is_async => self.parse_compound(start, decorators, false),
            _ => Err(self.error_here("expected `def` or `class` after decorator")),
        }
    }

    // ── keyword-led simple statements ─────────────────────────────────────────

    /// `type` is a soft keyword too: `type X = …` and `type X[T] = …` are
    /// alias statements, `type(x)` and `type = …` are not.
    fn type_alias_follows(&mut self) -> bool {
        let rest = &self.lex.source_str()[self.lex.peek_offset() as usize..];
        let Some(after_kw) = rest.strip_prefix("type") else {
            return false;
        };
        if !after_kw.starts_with([' ', '\t']) {
            return false;
        }
        let after_kw = after_kw.trim_start_matches([' ', '\t']);
        let name_len = after_kw
            .find(|c: char| !(c.is_alphanumeric() || c == '_'))
            .unwrap_or(after_kw.len());
        if name_len == 0 {
            return false;
        }
        let tail = after_kw[name_len..].trim_start_matches([' ', '\t']);
        tail.starts_with('[') || (tail.starts_with('=') && !tail.starts_with("=="))
    }

    fn parse_type_alias(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        self.bump(); // consume `type`
        self.skip_to_end_of_line()?;
        let span = self.span_from(start);
        self.end_simple_stmt()?;
        Ok(Stmt {
            span,
            kind: StmtKind::Simple { keyword: "type" },
        })
    }

    fn parse_simple(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let tok = self.bump();
        let keyword = tok.token.keyword().unwrap_or("");
        self.skip_to_end_of_line()?;
        let span = self.span_from(start);
        self.end_simple_stmt()?;
        Ok(Stmt {
            span,
            kind: StmtKind::Simple { keyword },
        })
    }

    /// Skip the rest of a logical line, checking that brackets balance.
    fn skip_to_end_of_line(&mut self) -> PResult<()> {
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Newline | Token::Semicolon | Token::Dedent if depth == 0 => break,
                Token::Eof if depth == 0 => break,
                Token::Eof | Token::Invalid(_) | Token::Indent => return Err(self.unexpected()),
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 {
                        return Err(self.unexpected());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.bump();
        }
        Ok(())
    }

    // ── expression statement / assignment ─────────────────────────────────────

    fn parse_expr_stmt(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let first = self.parse_star_expressions_or_yield()?;

        let kind = match self.peek().clone() {
            // Regular assignment, possibly chained: `a = b = expr`
            Token::Eq => {
                let mut targets = vec![first];
                loop {
                    self.bump(); // consume '='
                    let next = self.parse_star_expressions_or_yield()?;
                    if matches!(self.peek(), Token::Eq) {
                        targets.push(next);
                    } else {
                        for target in &targets {
                            self.check_assignable(target)?;
                        }
                        break StmtKind::Assign {
                            targets,
                            value: next,
                        };
                    }
                }
            }
            // Augmented assignment: `x += expr`
            Token::AugAssign(op) => {
                if !matches!(
                    first.kind,
                    ExprKind::Name(_) | ExprKind::Attribute { .. } | ExprKind::Subscript { .. }
                ) {
                    return Err(self.error_at(
                        "illegal expression for augmented assignment",
                        first.span.start,
                    ));
                }
                self.bump();
                let value = self.parse_star_expressions_or_yield()?;
                StmtKind::AugAssign {
                    target: first,
                    op,
                    value,
                }
            }
            // Annotated assignment: `a: T` or `a: T = expr`
            Token::Colon => {
                self.check_assignable(&first)?;
                self.bump();
                let annotation = self.parse_expression()?;
                let value = if matches!(self.peek(), Token::Eq) {
                    self.bump();
                    Some(self.parse_star_expressions_or_yield()?)
                } else {
                    None
                };
                StmtKind::AnnAssign {
                    target: first,
                    annotation,
                    value,
                }
            }
            _ => StmtKind::Expr(first),
        };

        let span = self.span_from(start);
        self.end_simple_stmt()?;
        Ok(Stmt { span, kind })
    }

    fn check_assignable(&self, target: &Expr<'src>) -> PResult<()> {
        if target.is_assignable() {
            Ok(())
        } else {
            Err(self.error_at("cannot assign to expression", target.span.start))
        }
    }

    /// Consume the terminator of a simple statement, recording in
    /// `more_on_line` whether it was a `;`.
    fn end_simple_stmt(&mut self) -> PResult<()> {
        self.more_on_line = matches!(self.peek(), Token::Semicolon);
        match self.peek() {
            Token::Newline | Token::Semicolon => {
                self.bump();
                Ok(())
            }
            Token::Eof | Token::Dedent => Ok(()),
            _ => Err(self.error_here_expected("end of statement")),
        }
    }

    // ── suite (indented block) ────────────────────────────────────────────────

    fn parse_suite(&mut self) -> PResult<Vec<Stmt<'src>>> {
        // Inline suite: `for x in y: a.append(x); b = 1`
        if !matches!(self.peek(), Token::Newline) {
            let mut stmts = Vec::new();
            loop {
                if matches!(
                    self.peek(),
                    Token::KwFor
                        | Token::KwIf
                        | Token::KwWhile
                        | Token::KwDef
                        | Token::KwClass
                        | Token::KwWith
                        | Token::KwTry
                        | Token::KwAsync
                        | Token::At
                ) {
                    return Err(self.error_here("compound statement after `:` on the same line"));
                }
                let start = self.lex.peek_offset();
                let stmt = match self.peek() {
                    Token::KwPass
                    | Token::KwBreak
                    | Token::KwContinue
                    | Token::KwImport
                    | Token::KwFrom
                    | Token::KwGlobal
                    | Token::KwNonlocal
                    | Token::KwDel
                    | Token::KwAssert
                    | Token::KwRaise
                    | Token::KwReturn => self.parse_simple(start)?,
                    Token::Eof | Token::Dedent | Token::Indent => {
                        return Err(self.error_here("expected an indented block"));
                    }
                    _ => self.parse_expr_stmt(start)?,
                };
                stmts.push(stmt);
                // The statement consumed its own terminator; only a `;`
                // lets another one follow on the same line.
                if !self.more_on_line {
                    break;
                }
                match self.peek() {
                    Token::Newline => {
                        self.bump();
                        break;
                    }
                    Token::Eof | Token::Dedent => break,
                    _ => {}
                }
            }
            return Ok(stmts);
        }

        self.nested("too many levels of indentation", Self::parse_block)
    }

    /// Block suite: NEWLINE INDENT stmts+ DEDENT
    fn parse_block(&mut self) -> PResult<Vec<Stmt<'src>>> {
        self.bump(); // consume NEWLINE
        self.skip_newlines();
        if !matches!(self.peek(), Token::Indent) {
            return Err(self.error_here("expected an indented block"));
        }
        self.bump(); // consume INDENT
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines();
            match self.peek() {
                Token::Dedent => {
                    self.bump();
                    break;
                }
                Token::Eof => break,
                _ => stmts.push(self.parse_stmt()?),
            }
        }
        Ok(stmts)
    }

    // ── Target lists ──────────────────────────────────────────────────────────

    /// Parse a `for` target: `x`, `a, b`, `(a, *rest)`.  Stops before `in`.
    fn parse_target_list(&mut self) -> PResult<Expr<'src>> {
        let start = self.lex.peek_offset();
        let first = self.parse_target_item()?;
        if !matches!(self.peek(), Token::Comma) {
            self.check_assignable(&first)?;
            return Ok(first);
        }
        let mut elts = vec![first];
        while matches!(self.peek(), Token::Comma) {
            self.bump();
            if matches!(self.peek(), Token::KwIn) {
                break;
            }
            elts.push(self.parse_target_item()?);
        }
        let target = Expr::new(
            self.span_from(start),
            ExprKind::Tuple {
                elts,
                parenthesized: false,
            },
        );
        self.check_assignable(&target)?;
        Ok(target)
    }

    fn parse_target_item(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::Star) {
            let start = self.bump().offset;
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::Starred(inner.boxed()),
            ));
        }
        self.parse_bitwise_or()
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    fn parse_star_expressions_or_yield(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::KwYield) {
            return self.parse_yield();
        }
        self.parse_star_expressions()
    }

    /// `expr, *expr, …`: an unparenthesised tuple when a comma is present.
    fn parse_star_expressions(&mut self) -> PResult<Expr<'src>> {
        let start = self.lex.peek_offset();
        let first = self.parse_star_expression()?;
        if !matches!(self.peek(), Token::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while matches!(self.peek(), Token::Comma) {
            self.bump();
            if !self.starts_expression() {
                break;
            }
            elts.push(self.parse_star_expression()?);
        }
        Ok(Expr::new(
            self.span_from(start),
            ExprKind::Tuple {
                elts,
                parenthesized: false,
            },
        ))
    }

    fn parse_star_expression(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::Star) {
            let start = self.bump().offset;
            let inner = self.parse_bitwise_or()?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::Starred(inner.boxed()),
            ));
        }
        self.parse_expression()
    }

    /// Element of a display or call: `*x`, `x := y` or a plain expression.
    fn parse_star_named_expression(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::Star) {
            return self.parse_star_expression();
        }
        self.parse_named_expression()
    }

    fn parse_named_expression(&mut self) -> PResult<Expr<'src>> {
        let expr = self.parse_expression()?;
        if !matches!(self.peek(), Token::Walrus) {
            return Ok(expr);
        }
        if expr.as_name().is_none() {
            return Err(self.error_at("cannot use assignment expression here", expr.span.start));
        }
        self.bump();
        let value = self.parse_expression()?;
        Ok(Expr::new(
            expr.span.cover(value.span),
            ExprKind::NamedExpr {
                target: expr.boxed(),
                value: value.boxed(),
            },
        ))
    }

    /// `lambda` or a conditional expression.
    fn parse_expression(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::KwLambda) {
            return self.parse_lambda();
        }
        let body = self.parse_disjunction()?;
        if !matches!(self.peek(), Token::KwIf) {
            return Ok(body);
        }
        self.bump();
        let test = self.parse_disjunction()?;
        self.expect(&Token::KwElse, "`else`")?;
        let orelse = self.parse_expression()?;
        Ok(Expr::new(
            body.span.cover(orelse.span),
            ExprKind::IfExp {
                body: body.boxed(),
                test: test.boxed(),
                orelse: orelse.boxed(),
            },
        ))
    }

    fn parse_lambda(&mut self) -> PResult<Expr<'src>> {
        let start = self.bump().offset; // consume `lambda`
        let params_start = self.lex.peek_offset();
        let mut params_end = params_start;
        let mut depth = 0i32;
        loop {
            match self.peek() {
                Token::Colon if depth == 0 => break,
                Token::Newline | Token::Semicolon | Token::Eof | Token::Invalid(_) => {
                    return Err(self.unexpected());
                }
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    if depth == 0 {
                        return Err(self.unexpected());
                    }
                    depth -= 1;
                }
                _ => {}
            }
            params_end = self.bump().end;
        }
        self.bump(); // consume ':'
        let params = &self.lex.source_str()[params_start as usize..params_end as usize];
        let body = self.parse_expression()?;
        Ok(Expr::new(
            self.span_from(start),
            ExprKind::Lambda {
                params,
                body: body.boxed(),
            },
        ))
    }

    fn parse_disjunction(&mut self) -> PResult<Expr<'src>> {
        let first = self.parse_conjunction()?;
        if !matches!(self.peek(), Token::KwOr) {
            return Ok(first);
        }
        let mut values = vec![first];
        while matches!(self.peek(), Token::KwOr) {
            self.bump();
            values.push(self.parse_conjunction()?);
        }
        Ok(bool_op("or", values))
    }

    fn parse_conjunction(&mut self) -> PResult<Expr<'src>> {
        let first = self.parse_inversion()?;
        if !matches!(self.peek(), Token::KwAnd) {
            return Ok(first);
        }
        let mut values = vec![first];
        while matches!(self.peek(), Token::KwAnd) {
            self.bump();
            values.push(self.parse_inversion()?);
        }
        Ok(bool_op("and", values))
    }

    fn parse_inversion(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::KwNot) {
            let start = self.bump().offset;
            let operand = self.nested(TOO_DEEP, Self::parse_inversion)?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::UnaryOp {
                    op: "not",
                    operand: operand.boxed(),
                },
            ));
        }
        self.nested(TOO_DEEP, Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> PResult<Expr<'src>> {
        let left = self.parse_bitwise_or()?;
        let mut comparisons = Vec::new();
        loop {
            let op: &'src str = match self.peek() {
                Token::Op(op @ ("==" | "!=" | "<" | ">" | "<=" | ">=")) => {
                    let op = *op;
                    self.bump();
                    op
                }
                Token::KwIn => {
                    self.bump();
                    "in"
                }
                Token::KwNot => {
                    self.bump();
                    self.expect(&Token::KwIn, "`in` after `not`")?;
                    "not in"
                }
                Token::KwIs => {
                    self.bump();
                    if matches!(self.peek(), Token::KwNot) {
                        self.bump();
                        "is not"
                    } else {
                        "is"
                    }
                }
                _ => break,
            };
            comparisons.push((op, self.parse_bitwise_or()?));
        }
        if comparisons.is_empty() {
            return Ok(left);
        }
        let span = left.span.start;
        Ok(Expr::new(
            self.span_from(span),
            ExprKind::Compare {
                left: left.boxed(),
                comparisons,
            },
        ))
    }

    fn parse_bitwise_or(&mut self) -> PResult<Expr<'src>> {
        self.parse_binary(1)
    }

    /// Precedence climbing over the left-associative binary operators.
    fn parse_binary(&mut self, min_prec: u8) -> PResult<Expr<'src>> {
        let mut left = self.parse_factor()?;
        while let Some((prec, op)) = binary_op(self.peek()) {
            if prec < min_prec {
                break;
            }
            self.bump();
            let right = self.parse_binary(prec + 1)?;
            left = Expr::new(
                left.span.cover(right.span),
                ExprKind::BinOp {
                    left: left.boxed(),
                    op,
                    right: right.boxed(),
                },
            );
        }
        Ok(left)
    }

    /// Unary `+`, `-`, `~`.
    fn parse_factor(&mut self) -> PResult<Expr<'src>> {
        if let Token::Op(op @ ("+" | "-" | "~")) = self.peek() {
            let op = *op;
            let start = self.bump().offset;
            let operand = self.nested(TOO_DEEP, Self::parse_factor)?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::UnaryOp {
                    op,
                    operand: operand.boxed(),
                },
            ));
        }
        self.parse_power()
    }

    /// `**` binds tighter than unary minus on its left, looser on its right.
    fn parse_power(&mut self) -> PResult<Expr<'src>> {
        let base = self.parse_await_primary()?;
        if !matches!(self.peek(), Token::DblStar) {
            return Ok(base);
        }
        self.bump();
        let exponent = self.parse_factor()?;
        Ok(Expr::new(
            base.span.cover(exponent.span),
            ExprKind::BinOp {
                left: base.boxed(),
                op: "**",
                right: exponent.boxed(),
            },
        ))
    }

    fn parse_await_primary(&mut self) -> PResult<Expr<'src>> {
        if matches!(self.peek(), Token::KwAwait) {
            let start = self.bump().offset;
            let inner = self.parse_primary()?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::Await(inner.boxed()),
            ));
        }
        self.parse_primary()
    }

    /// An atom followed by any number of `.attr`, `(args)` and `[index]`.
    fn parse_primary(&mut self) -> PResult<Expr<'src>> {
        let mut expr = self.parse_atom()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.bump();
                    let Some(attr) = self.expect_name() else {
                        return Err(self.error_here_expected("attribute name"));
                    };
                    expr = Expr::new(
                        self.span_from(expr.span.start),
                        ExprKind::Attribute {
                            value: expr.boxed(),
                            attr,
                        },
                    );
                }
                Token::LParen => {
                    self.bump();
                    let args = self.parse_call_args()?;
                    self.expect(&Token::RParen, "`)`")?;
                    expr = Expr::new(
                        self.span_from(expr.span.start),
                        ExprKind::Call {
                            func: expr.boxed(),
                            args,
                        },
                    );
                }
                Token::LBracket => {
                    self.bump();
                    let index = self.parse_subscript()?;
                    self.expect(&Token::RBracket, "`]`")?;
                    expr = Expr::new(
                        self.span_from(expr.span.start),
                        ExprKind::Subscript {
                            value: expr.boxed(),
                            index: index.boxed(),
                        },
                    );
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_call_args(&mut self) -> PResult<Vec<Arg<'src>>> {
        let mut args = Vec::new();
        while !matches!(self.peek(), Token::RParen) {
            let arg = match self.peek() {
                Token::DblStar => {
                    self.bump();
                    Arg::Unpack(self.parse_expression()?)
                }
                Token::Star => Arg::Positional(self.parse_star_expression()?),
                _ => {
                    let expr = self.parse_named_expression()?;
                    match (self.peek(), expr.as_name()) {
                        (Token::Eq, Some(name)) => {
                            self.bump();
                            Arg::Keyword {
                                name,
                                value: self.parse_expression()?,
                            }
                        }
                        (Token::KwFor | Token::KwAsync, _) => {
                            // Bare generator argument: `sum(x for x in xs)`.
                            let clauses = self.parse_comp_clauses()?;
                            Arg::Positional(Expr::new(
                                self.span_from(expr.span.start),
                                ExprKind::Comprehension {
                                    kind: CompKind::Generator,
                                    element: expr.boxed(),
                                    value: None,
                                    clauses,
                                },
                            ))
                        }
                        _ => Arg::Positional(expr),
                    }
                }
            };
            args.push(arg);
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump();
        }
        Ok(args)
    }

    /// Subscript contents: a single index, a slice, or a tuple of them.
    fn parse_subscript(&mut self) -> PResult<Expr<'src>> {
        let start = self.lex.peek_offset();
        let first = self.parse_slice_item()?;
        if !matches!(self.peek(), Token::Comma) {
            return Ok(first);
        }
        let mut elts = vec![first];
        while matches!(self.peek(), Token::Comma) {
            self.bump();
            if matches!(self.peek(), Token::RBracket) {
                break;
            }
            elts.push(self.parse_slice_item()?);
        }
        Ok(Expr::new(
            self.span_from(start),
            ExprKind::Tuple {
                elts,
                parenthesized: false,
            },
        ))
    }

    fn parse_slice_item(&mut self) -> PResult<Expr<'src>> {
        let start = self.lex.peek_offset();
        let lower = if matches!(self.peek(), Token::Colon) {
            None
        } else {
            let item = self.parse_star_named_expression()?;
            if !matches!(self.peek(), Token::Colon) {
                return Ok(item);
            }
            Some(item.boxed())
        };
        self.bump(); // consume ':'
        let upper = if self.slice_part_follows() {
            Some(self.parse_expression()?.boxed())
        } else {
            None
        };
        let step = if matches!(self.peek(), Token::Colon) {
            self.bump();
            if self.slice_part_follows() {
                Some(self.parse_expression()?.boxed())
            } else {
                None
            }
        } else {
            None
        };
        Ok(Expr::new(
            self.span_from(start),
            ExprKind::Slice { lower, upper, step },
        ))
    }

    fn slice_part_follows(&mut self) -> bool {
        !matches!(self.peek(), Token::Colon | Token::Comma | Token::RBracket)
    }

    fn parse_atom(&mut self) -> PResult<Expr<'src>> {
        let tok = self.lex.peek_offset();
        let kind = match self.peek().clone() {
            Token::Name(n) => {
                self.bump();
                ExprKind::Name(n)
            }
            Token::KwMatch | Token::KwCase => {
                let name = self.bump().token.keyword().unwrap_or("");
                ExprKind::Name(name)
            }
            Token::Number(n) => {
                self.bump();
                ExprKind::Number(n)
            }
            Token::Str(_) | Token::FStr(_) => {
                let mut parts = Vec::new();
                while let Token::Str(raw) | Token::FStr(raw) = self.peek().clone() {
                    self.bump();
                    parts.push(raw);
                }
                ExprKind::Str(parts)
            }
            Token::KwTrue => {
                self.bump();
                ExprKind::Bool(true)
            }
            Token::KwFalse => {
                self.bump();
                ExprKind::Bool(false)
            }
            Token::KwNone => {
                self.bump();
                ExprKind::None
            }
            Token::Ellipsis => {
                self.bump();
                ExprKind::Ellipsis
            }
            Token::LParen => return self.parse_paren(tok),
            Token::LBracket => return self.parse_list(tok),
            Token::LBrace => return self.parse_brace(tok),
            _ => return Err(self.unexpected()),
        };
        Ok(Expr::new(self.span_from(tok), kind))
    }

    /// `()`, `(x)`, `(x,)`, `(a, b)`, `(x for x in y)`, `(yield x)`.
    fn parse_paren(&mut self, start: Offset) -> PResult<Expr<'src>> {
        self.bump(); // consume '('
        if matches!(self.peek(), Token::RParen) {
            self.bump();
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::Tuple {
                    elts: vec![],
                    parenthesized: true,
                },
            ));
        }
        if matches!(self.peek(), Token::KwYield) {
            let inner = self.parse_yield()?;
            self.expect(&Token::RParen, "`)`")?;
            return Ok(Expr::new(
                self.span_from(start),
                ExprKind::Paren(inner.boxed()),
            ));
        }
        let first = self.parse_star_named_expression()?;
        let kind = match self.peek() {
            Token::KwFor | Token::KwAsync => ExprKind::Comprehension {
                kind: CompKind::Generator,
                element: first.boxed(),
                value: None,
                clauses: self.parse_comp_clauses()?,
            },
            Token::Comma => ExprKind::Tuple {
                elts: self.parse_display_tail(first, &Token::RParen)?,
                parenthesized: true,
            },
            _ => ExprKind::Paren(first.boxed()),
        };
        self.expect(&Token::RParen, "`)`")?;
        Ok(Expr::new(self.span_from(start), kind))
    }

    /// `[]`, `[a, b]`, `[x for x in y]`.
    fn parse_list(&mut self, start: Offset) -> PResult<Expr<'src>> {
        self.bump(); // consume '['
        let kind = if matches!(self.peek(), Token::RBracket) {
            ExprKind::List(vec![])
        } else {
            let first = self.parse_star_named_expression()?;
            if matches!(self.peek(), Token::KwFor | Token::KwAsync) {
                ExprKind::Comprehension {
                    kind: CompKind::List,
                    element: first.boxed(),
                    value: None,
                    clauses: self.parse_comp_clauses()?,
                }
            } else {
                ExprKind::List(self.parse_display_tail(first, &Token::RBracket)?)
            }
        };
        self.expect(&Token::RBracket, "`]`")?;
        Ok(Expr::new(self.span_from(start), kind))
    }

    /// `{}`, `{k: v, **m}`, `{a, b}` and the dict/set comprehensions.
    fn parse_brace(&mut self, start: Offset) -> PResult<Expr<'src>> {
        self.bump(); // consume '{'
        let kind = if matches!(self.peek(), Token::RBrace) {
            ExprKind::Dict(vec![])
        } else if matches!(self.peek(), Token::DblStar) {
            self.bump();
            let first = DictItem::Unpack(self.parse_bitwise_or()?);
            ExprKind::Dict(self.parse_dict_tail(first)?)
        } else {
            let first = self.parse_star_named_expression()?;
            if matches!(self.peek(), Token::Colon) {
                self.bump();
                let value = self.parse_expression()?;
                if matches!(self.peek(), Token::KwFor | Token::KwAsync) {
                    ExprKind::Comprehension {
                        kind: CompKind::Dict,
                        element: first.boxed(),
                        value: Some(value.boxed()),
                        clauses: self.parse_comp_clauses()?,
                    }
                } else {
                    let first = DictItem::Pair { key: first, value };
                    ExprKind::Dict(self.parse_dict_tail(first)?)
                }
            } else if matches!(self.peek(), Token::KwFor | Token::KwAsync) {
                ExprKind::Comprehension {
                    kind: CompKind::Set,
                    element: first.boxed(),
                    value: None,
                    clauses: self.parse_comp_clauses()?,
                }
            } else {
                ExprKind::Set(self.parse_display_tail(first, &Token::RBrace)?)
            }
        };
        self.expect(&Token::RBrace, "`}`")?;
        Ok(Expr::new(self.span_from(start), kind))
    }

    /// Remaining comma-separated elements of a display after `first`.
    fn parse_display_tail(
        &mut self,
        first: Expr<'src>,
        close: &Token<'src>,
    ) -> PResult<Vec<Expr<'src>>> {
        let mut elts = vec![first];
        while matches!(self.peek(), Token::Comma) {
            self.bump();
            if self.peek() == close {
                break;
            }
            elts.push(self.parse_star_named_expression()?);
        }
        Ok(elts)
    }

    fn parse_dict_tail(&mut self, first: DictItem<'src>) -> PResult<Vec<DictItem<'src>>> {
        let mut items = vec![first];
        while matches!(self.peek(), Token::Comma) {
            self.bump();
            match self.peek() {
                Token::RBrace => break,
                Token::DblStar => {
                    self.bump();
                    items.push(DictItem::Unpack(self.parse_bitwise_or()?));
                }
                _ => {
                    let key = self.parse_expression()?;
                    self.expect(&Token::Colon, "`:`")?;
                    let value = self.parse_expression()?;
                    items.push(DictItem::Pair { key, value });
                }
            }
        }
        Ok(items)
    }

    /// `for target in iter [if cond]* …` clauses of a comprehension.
    fn parse_comp_clauses(&mut self) -> PResult<Vec<CompClause<'src>>> {
        let mut clauses = Vec::new();
        loop {
            match self.peek() {
                Token::KwAsync | Token::KwFor => {
                    let is_async = matches!(self.peek(), Token::KwAsync);
                    if is_async {
                        self.bump();
                    }
                    self.expect(&Token::KwFor, "`for`")?;
                    let target = self.parse_target_list()?;
                    self.expect(&Token::KwIn, "`in`")?;
                    let iter = self.parse_disjunction()?;
                    clauses.push(CompClause::For {
                        target,
                        iter,
                        is_async,
                    });
                }
                Token::KwIf => {
                    self.bump();
                    clauses.push(CompClause::If(self.parse_disjunction()?));
                }
                _ => return Ok(clauses),
            }
        }
    }

    fn parse_yield(&mut self) -> PResult<Expr<'src>> {
        let start = self.bump().offset; // consume `yield`
        let (value, is_from) = if matches!(self.peek(), Token::KwFrom) {
            self.bump();
            (Some(self.parse_expression()?.boxed()), true)
        } else if self.starts_expression() {
            (Some(self.parse_star_expressions()?.boxed()), false)
        } else {
            (None, false)
        };
        Ok(Expr::new(
            self.span_from(start),
            ExprKind::Yield { value, is_from },
        ))
    }

    // ── Helper utilities ──────────────────────────────────────────────────────

    fn peek(&mut self) -> &Token<'src> {
        self.lex.peek()
    }

    fn bump(&mut self) -> TokenWithOffset<'src> {
        let tok = self.lex.consume();
        if !matches!(
            tok.token,
            Token::Newline | Token::Semicolon | Token::Indent | Token::Dedent | Token::Eof
        ) {
            self.last_end = tok.end;
        }
        tok
    }

    fn span_from(&self, start: Offset) -> Span {
        Span::new(start, self.last_end.max(start))
    }

    fn expect(&mut self, expected: &Token<'src>, what: &str) -> PResult<TokenWithOffset<'src>> {
        if self.peek() == expected {
            Ok(self.bump())
        } else {
            Err(self.error_here_expected(what))
        }
    }

    fn error_here_expected(&mut self, what: &str) -> ParseError {
        if let Token::Invalid(reason) = self.peek() {
            let reason = *reason;
            return self.error_here(reason);
        }
        let found = self.peek().describe();
        self.error_here(&format!("expected {what}, found {found}"))
    }

    fn expect_name(&mut self) -> Option<&'src str> {
        match self.peek().clone() {
            Token::Name(n) => {
                self.bump();
                Some(n)
            }
            // Soft keywords are valid identifiers in attribute position.
            Token::KwMatch | Token::KwCase => self.bump().token.keyword(),
            _ => None,
        }
    }

    /// Whether the next token can begin an expression.
    fn starts_expression(&mut self) -> bool {
        match self.peek() {
            Token::Name(_)
            | Token::Number(_)
            | Token::Str(_)
            | Token::FStr(_)
            | Token::KwTrue
            | Token::KwFalse
            | Token::KwNone
            | Token::KwNot
            | Token::KwLambda
            | Token::KwAwait
            | Token::KwMatch
            | Token::KwCase
            | Token::Ellipsis
            | Token::LParen
            | Token::LBracket
            | Token::LBrace
            | Token::Star => true,
            Token::Op(op) => matches!(*op, "+" | "-" | "~"),
            _ => false,
        }
    }

    fn skip_newlines(&mut self) {
        while matches!(self.peek(), Token::Newline | Token::Semicolon) {
            self.bump();
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        message: &str,
        parse: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here(message));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn error_at(&self, message: &str, offset: Offset) -> ParseError {
        ParseError::at(message, offset as usize, self.lex.source_str())
    }

    fn error_here(&mut self, message: &str) -> ParseError {
        let offset = self.lex.peek_offset();
        self.error_at(message, offset)
    }

    fn unexpected(&mut self) -> ParseError {
        let message = match self.peek() {
            Token::Invalid(reason) => (*reason).to_string(),
            Token::Eof => "unexpected end of input".to_string(),
            other => format!("unexpected {}", other.describe()),
        };
        self.error_here(&message)
    }
}

// ── Free helpers ──────────────────────────────────────────────────────────────

/// Binding power and spelling of a binary operator token.
fn binary_op<'src>(tok: &Token<'src>) -> Option<(u8, &'src str)> {
    let entry = match tok {
        Token::Op(op) => match *op {
            "|" => (1, *op),
            "^" => (2, *op),
            "&" => (3, *op),
            "<<" | ">>" => (4, *op),
            "+" | "-" => (5, *op),
            "/" | "//" | "%" => (6, *op),
            _ => return None,
        },
        Token::Star => (6, "*"),
        Token::At => (6, "@"),
        _ => return None,
    };
    Some(entry)
}

fn bool_op<'src>(op: &'src str, values: Vec<Expr<'src>>) -> Expr<'src> {
    let span = match (values.first(), values.last()) {
        (Some(first), Some(last)) => first.span.cover(last.span),
        _ => Span::default(),
    };
    Expr::new(span, ExprKind::BoolOp { op, values })
}

/// Whether a physical line, read as a block header, ends with `:` once
/// trailing comments and whitespace are stripped.
fn line_header_ends_with_colon(line: &str) -> bool {
    let code = match line.find('#') {
        Some(i) => &line[..i],
        None => line,
    };
    code.trim_end().ends_with(':')
}

// ── Tests ─────────────────────────────────────────────────────────────────────
