//! Zero-copy Python lexer.
//!
//! Produces [`Token`] variants that borrow `&'src str` slices directly from
//! the source buffer, with no heap allocation for identifiers, numbers, operators
//! or string content.  Every token carries its `[offset, end)` byte range so
//! the parser can attach exact source spans to the nodes it builds.
//!
//! Handles:
//! - All keyword tokens (`match` / `case` as soft keywords)
//! - INDENT / DEDENT via an indentation stack
//! - Implicit line continuation inside `(`, `[`, `{`
//! - Explicit line continuation via trailing `\`
//! - All string literal forms: single/triple-quoted, raw, bytes, f-strings
//! - Comments (skipped)
//! - Semicolons as statement separators
//!
//! Malformed input (unterminated strings, stray characters, inconsistent
//! dedents) is reported as [`Token::Invalid`] so the parser can turn it into
//! a located syntax error.

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Literals
    Name(&'src str),
    /// Any numeric literal, as the raw source slice.
    Number(&'src str),
    /// A non-f-string literal.  The `&str` is the *raw source* slice
    /// including delimiters and prefix.
    Str(&'src str),
    /// An f-string, as the raw source slice.
    FStr(&'src str),

    // Structural
    Newline,
    Indent,
    Dedent,

    // Punctuation the parser needs to distinguish
    Eq,        // =
    Walrus,    // :=
    Colon,     // :
    Comma,     // ,
    Dot,       // .
    Ellipsis,  // ...
    Semicolon, // ;
    Arrow,     // ->

    /// Augmented-assignment operator, e.g. `+=` or `//=`.
    AugAssign(&'src str),

    // Bracket pairs
    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    /// Any other operator; the slice is its spelling (`+`, `<=`, `!=`, …).
    Op(&'src str),

    // Star / double-star (unpacking, multiplication, power)
    Star,    // *
    DblStar, // **

    // At-sign (decorator / matrix multiplication)
    At, // @

    // Keywords
    KwFalse,
    KwNone,
    KwTrue,
    KwAnd,
    KwAs,
    KwAssert,
    KwAsync,
    KwAwait,
    KwBreak,
    KwClass,
    KwContinue,
    KwDef,
    KwDel,
    KwElif,
    KwElse,
    KwExcept,
    KwFinally,
    KwFor,
    KwFrom,
    KwGlobal,
    KwIf,
    KwImport,
    KwIn,
    KwIs,
    KwLambda,
    KwMatch, // soft keyword; a name outside `match` statements
    KwCase,  // soft keyword
    KwNonlocal,
    KwNot,
    KwOr,
    KwPass,
    KwRaise,
    KwReturn,
    KwTry,
    KwWhile,
    KwWith,
    KwYield,

    /// Something the lexer could not tokenise; the payload says why.
    Invalid(&'static str),

    Eof,
}

impl Token<'_> {
    /// Source spelling of a keyword token, `None` for everything else.
    pub fn keyword(&self) -> Option<&'static str> {
        let kw = match self {
            Token::KwFalse => "False",
            Token::KwNone => "None",
            Token::KwTrue => "True",
            Token::KwAnd => "and",
            Token::KwAs => "as",
            Token::KwAssert => "assert",
            Token::KwAsync => "async",
            Token::KwAwait => "await",
            Token::KwBreak => "break",
            Token::KwClass => "class",
            Token::KwContinue => "continue",
            Token::KwDef => "def",
            Token::KwDel => "del",
            Token::KwElif => "elif",
            Token::KwElse => "else",
            Token::KwExcept => "except",
            Token::KwFinally => "finally",
            Token::KwFor => "for",
            Token::KwFrom => "from",
            Token::KwGlobal => "global",
            Token::KwIf => "if",
            Token::KwImport => "import",
            Token::KwIn => "in",
            Token::KwIs => "is",
            Token::KwLambda => "lambda",
            Token::KwMatch => "match",
            Token::KwCase => "case",
            Token::KwNonlocal => "nonlocal",
            Token::KwNot => "not",
            Token::KwOr => "or",
            Token::KwPass => "pass",
            Token::KwRaise => "raise",
            Token::KwReturn => "return",
            Token::KwTry => "try",
            Token::KwWhile => "while",
            Token::KwWith => "with",
            Token::KwYield => "yield",
            _ => return None,
        };
        Some(kw)
    }

    /// Human-readable description used in syntax error messages.
    pub fn describe(&self) -> String {
        if let Some(kw) = self.keyword() {
            return format!("keyword `{kw}`");
        }
        match self {
            Token::Name(n) => format!("name `{n}`"),
            Token::Number(n) => format!("number `{n}`"),
            Token::Str(_) | Token::FStr(_) => "string literal".to_string(),
            Token::Newline | Token::Semicolon => "end of statement".to_string(),
            Token::Indent => "indent".to_string(),
            Token::Dedent => "dedent".to_string(),
            Token::Eq => "`=`".to_string(),
            Token::Walrus => "`:=`".to_string(),
            Token::Colon => "`:`".to_string(),
            Token::Comma => "`,`".to_string(),
            Token::Dot => "`.`".to_string(),
            Token::Ellipsis => "`...`".to_string(),
            Token::Arrow => "`->`".to_string(),
            Token::AugAssign(op) | Token::Op(op) => format!("`{op}`"),
            Token::LParen => "`(`".to_string(),
            Token::RParen => "`)`".to_string(),
            Token::LBracket => "`[`".to_string(),
            Token::RBracket => "`]`".to_string(),
            Token::LBrace => "`{`".to_string(),
            Token::RBrace => "`}`".to_string(),
            Token::Star => "`*`".to_string(),
            Token::DblStar => "`**`".to_string(),
            Token::At => "`@`".to_string(),
            Token::Invalid(reason) => (*reason).to_string(),
            Token::Eof => "end of input".to_string(),
            _ => "token".to_string(),
        }
    }
}

// ── TokenWithOffset ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TokenWithOffset<'src> {
    pub token: Token<'src>,
    /// Byte offset of the first byte of the token.
    pub offset: u32,
    /// Byte offset one past the last byte of the token.  Structural tokens
    /// (INDENT, DEDENT, EOF) are zero-width.
    pub end: u32,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

pub struct Lexer<'src> {
    pub(crate) src: &'src [u8],
    /// The same source as a `&str`, used for safe UTF-8 slicing without `unsafe`.
    pub(crate) src_str: &'src str,
    /// Current byte position.
    pos: usize,
    /// Indentation stack; always starts with [0].
    indent_stack: Vec<usize>,
    /// How many DEDENT tokens remain to be emitted.
    pending_dedents: usize,
    /// Set when the pending dedents land on a column that is not on the stack.
    pending_bad_dedent: bool,
    /// Whether the next logical line should trigger indent/dedent analysis.
    at_line_start: bool,
    /// Nesting depth of `()`, `[]`, `{}`.  When > 0 newlines are ignored.
    bracket_depth: i32,
    /// One-token lookahead buffer.
    peeked: Option<TokenWithOffset<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src: src.as_bytes(),
            src_str: src,
            pos: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            pending_bad_dedent: false,
            at_line_start: true,
            bracket_depth: 0,
            peeked: None,
        }
    }

    // ── public interface ──────────────────────────────────────────────────────

    /// Return (but do not consume) the next token.
    pub fn peek(&mut self) -> &Token<'src> {
        &self.peek_full().token
    }

    /// Return (but do not consume) the next token's byte offset.
    pub fn peek_offset(&mut self) -> u32 {
        self.peek_full().offset
    }

    fn peek_full(&mut self) -> &TokenWithOffset<'src> {
        let t = match self.peeked.take() {
            Some(t) => t,
            None => self.next_inner(),
        };
        self.peeked.insert(t)
    }

    /// Consume and return the next token with its offsets.
    pub fn consume(&mut self) -> TokenWithOffset<'src> {
        match self.peeked.take() {
            Some(t) => t,
            None => self.next_inner(),
        }
    }

    /// Consume the next token and return just the token (discards offsets).
    pub fn bump(&mut self) -> Token<'src> {
        self.consume().token
    }

    /// The full source buffer this lexer reads from.
    pub fn source_str(&self) -> &'src str {
        self.src_str
    }

    // ── internal tokenisation ────────────────────────────────────────────────

    fn structural(&self, token: Token<'src>) -> TokenWithOffset<'src> {
        TokenWithOffset {
            token,
            offset: self.pos as u32,
            end: self.pos as u32,
        }
    }

    fn next_pending_dedent(&mut self) -> TokenWithOffset<'src> {
        self.pending_dedents -= 1;
        if self.pending_dedents == 0 && self.pending_bad_dedent {
            self.pending_bad_dedent = false;
            return self.structural(Token::Invalid(
                "unindent does not match any outer indentation level",
            ));
        }
        self.structural(Token::Dedent)
    }

    fn next_inner(&mut self) -> TokenWithOffset<'src> {
        // Emit pending DEDENT tokens before reading more source.
        if self.pending_dedents > 0 {
            return self.next_pending_dedent();
        }

        loop {
            // At the start of a logical line (not inside brackets), handle
            // indentation.
            if self.at_line_start && self.bracket_depth == 0 {
                self.at_line_start = false;
                if let Some(tok) = self.handle_indent() {
                    return tok;
                }
            }

            if self.pos >= self.src.len() {
                // Flush remaining DEDENT tokens before EOF.
                if self.indent_stack.len() > 1 {
                    self.pending_dedents = self.indent_stack.len() - 1;
                    self.indent_stack.truncate(1);
                    return self.next_pending_dedent();
                }
                return self.structural(Token::Eof);
            }

            let start = self.pos;
            let b = self.src[self.pos];

            // ── Skip whitespace (not newlines) ────────────────────────────
            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\x0c' {
                self.pos += 1;
                continue;
            }

            // ── Newline ───────────────────────────────────────────────────
            if b == b'\n' {
                self.pos += 1;
                if self.bracket_depth > 0 {
                    // Inside brackets: implicit continuation, ignore newline.
                    continue;
                }
                self.at_line_start = true;
                return TokenWithOffset {
                    token: Token::Newline,
                    offset: start as u32,
                    end: self.pos as u32,
                };
            }

            // ── Explicit line continuation ────────────────────────────────
            if b == b'\\' {
                self.pos += 1;
                if self.src.get(self.pos) == Some(&b'\r') {
                    self.pos += 1;
                }
                if self.src.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                    continue;
                }
                return self.finish(start, Token::Invalid("unexpected character after line continuation"));
            }

            // ── Comment ───────────────────────────────────────────────────
            if b == b'#' {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            // ── String literals ───────────────────────────────────────────
            if self.is_string_start() {
                return self.lex_string(start);
            }

            // ── Numbers ───────────────────────────────────────────────────
            if b.is_ascii_digit()
                || (b == b'.'
                    && self
                        .src
                        .get(self.pos + 1)
                        .copied()
                        .is_some_and(|c| c.is_ascii_digit()))
            {
                self.lex_number();
                let tok = Token::Number(&self.src_str[start..self.pos]);
                return self.finish(start, tok);
            }

            // ── Identifiers and keywords ──────────────────────────────────
            if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 {
                return self.lex_name(start);
            }

            // ── Operators and punctuation ─────────────────────────────────
            self.pos += 1;
            let tok = match b {
                b'(' => {
                    self.bracket_depth += 1;
                    Token::LParen
                }
                b')' => {
                    self.bracket_depth = (self.bracket_depth - 1).max(0);
                    Token::RParen
                }
                b'[' => {
                    self.bracket_depth += 1;
                    Token::LBracket
                }
                b']' => {
                    self.bracket_depth = (self.bracket_depth - 1).max(0);
                    Token::RBracket
                }
                b'{' => {
                    self.bracket_depth += 1;
                    Token::LBrace
                }
                b'}' => {
                    self.bracket_depth = (self.bracket_depth - 1).max(0);
                    Token::RBrace
                }
                b',' => Token::Comma,
                b';' => Token::Semicolon,
                b'~' => Token::Op("~"),
                b'@' => {
                    if self.eat_byte(b'=') {
                        Token::AugAssign("@=")
                    } else {
                        Token::At
                    }
                }
                b'=' => {
                    if self.eat_byte(b'=') {
                        Token::Op("==")
                    } else {
                        Token::Eq
                    }
                }
                b'!' => {
                    if self.eat_byte(b'=') {
                        Token::Op("!=")
                    } else {
                        Token::Invalid("unexpected character `!`")
                    }
                }
                b':' => {
                    if self.eat_byte(b'=') {
                        Token::Walrus
                    } else {
                        Token::Colon
                    }
                }
                b'.' => {
                    if self.src.get(self.pos) == Some(&b'.')
                        && self.src.get(self.pos + 1) == Some(&b'.')
                    {
                        self.pos += 2;
                        Token::Ellipsis
                    } else {
                        Token::Dot
                    }
                }
                b'*' => {
                    if self.eat_byte(b'*') {
                        if self.eat_byte(b'=') {
                            Token::AugAssign("**=")
                        } else {
                            Token::DblStar
                        }
                    } else if self.eat_byte(b'=') {
                        Token::AugAssign("*=")
                    } else {
                        Token::Star
                    }
                }
                b'-' => {
                    if self.eat_byte(b'>') {
                        Token::Arrow
                    } else {
                        self.operator(start, 1)
                    }
                }
                b'/' | b'<' | b'>' => {
                    // `//`, `<<`, `>>` and their augmented forms.
                    let doubled = self.eat_byte(b);
                    if !doubled && b != b'/' && self.eat_byte(b'=') {
                        // `<=` / `>=` are comparisons, not augmented assignments.
                        Token::Op(&self.src_str[start..self.pos])
                    } else {
                        self.operator(start, if doubled { 2 } else { 1 })
                    }
                }
                b'+' | b'%' | b'^' | b'&' | b'|' => self.operator(start, 1),
                _ => {
                    // Skip the rest of a multi-byte character so the next
                    // token starts on a char boundary.
                    while self.pos < self.src.len() && (self.src[self.pos] & 0xC0) == 0x80 {
                        self.pos += 1;
                    }
                    Token::Invalid("unexpected character")
                }
            };

            return self.finish(start, tok);
        }
    }

    fn finish(&self, start: usize, token: Token<'src>) -> TokenWithOffset<'src> {
        TokenWithOffset {
            token,
            offset: start as u32,
            end: self.pos as u32,
        }
    }

    fn eat_byte(&mut self, b: u8) -> bool {
        if self.src.get(self.pos) == Some(&b) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Finish an arithmetic/bitwise operator of `len` bytes, turning it into
    /// an augmented assignment when followed by `=`.
    fn operator(&mut self, start: usize, len: usize) -> Token<'src> {
        debug_assert_eq!(self.pos, start + len);
        if self.eat_byte(b'=') {
            Token::AugAssign(&self.src_str[start..self.pos])
        } else {
            Token::Op(&self.src_str[start..self.pos])
        }
    }

    // ── Indentation handling ──────────────────────────────────────────────────

    /// Called when `at_line_start` is true.  Scans leading whitespace of the
    /// next non-blank, non-comment line and emits INDENT/DEDENT/nothing.
    ///
    /// Returns `Some(token)` if an INDENT or DEDENT should be emitted.
    /// Returns `None` if the indentation is unchanged or the input ended.
    fn handle_indent(&mut self) -> Option<TokenWithOffset<'src>> {
        loop {
            let mut col = 0usize;
            while self.pos < self.src.len() {
                match self.src[self.pos] {
                    b' ' => {
                        col += 1;
                        self.pos += 1;
                    }
                    b'\t' => {
                        col = (col + 8) & !7;
                        self.pos += 1;
                    } // tab stop at 8
                    b'\x0c' => {
                        col = 0;
                        self.pos += 1;
                    }
                    _ => break,
                }
            }

            if self.pos >= self.src.len() {
                // EOF after whitespace-only content.
                return None;
            }
            match self.src[self.pos] {
                b'\n' => {
                    // blank line: don't generate indent/dedent
                    self.pos += 1;
                    continue;
                }
                b'\r' => {
                    self.pos += 1;
                    if self.src.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    continue;
                }
                b'#' => {
                    while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    if self.pos < self.src.len() {
                        self.pos += 1; // consume '\n'
                    }
                    continue;
                }
                _ => {}
            }

            // We have real content at column `col`.
            let top = *self.indent_stack.last().unwrap_or(&0);

            if col > top {
                self.indent_stack.push(col);
                return Some(self.structural(Token::Indent));
            } else if col < top {
                let mut dedent_count = 0usize;
                while self.indent_stack.len() > 1
                    && self.indent_stack.last().is_some_and(|&level| level > col)
                {
                    self.indent_stack.pop();
                    dedent_count += 1;
                }
                // A dedent has to land exactly on an enclosing level.
                if self.indent_stack.last().copied() != Some(col) {
                    self.pending_bad_dedent = true;
                }
                self.pending_dedents = dedent_count;
                return Some(self.next_pending_dedent());
            } else {
                return None;
            }
        }
    }

    // ── Identifier / keyword lexing ───────────────────────────────────────────

    fn lex_name(&mut self, start: usize) -> TokenWithOffset<'src> {
        // Identifiers may contain non-ASCII letters; the loop only stops on an
        // ASCII byte, so `start..pos` always falls on a char boundary.
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        let s = &self.src_str[start..self.pos];
        let tok = match s {
            "False" => Token::KwFalse,
            "None" => Token::KwNone,
            "True" => Token::KwTrue,
            "and" => Token::KwAnd,
            "as" => Token::KwAs,
            "assert" => Token::KwAssert,
            "async" => Token::KwAsync,
            "await" => Token::KwAwait,
            "break" => Token::KwBreak,
            "class" => Token::KwClass,
            "continue" => Token::KwContinue,
            "def" => Token::KwDef,
            "del" => Token::KwDel,
            "elif" => Token::KwElif,
            "else" => Token::KwElse,
            "except" => Token::KwExcept,
            "finally" => Token::KwFinally,
            "for" => Token::KwFor,
            "from" => Token::KwFrom,
            "global" => Token::KwGlobal,
            "if" => Token::KwIf,
            "import" => Token::KwImport,
            "in" => Token::KwIn,
            "is" => Token::KwIs,
            "lambda" => Token::KwLambda,
            "match" => Token::KwMatch,
            "case" => Token::KwCase,
            "nonlocal" => Token::KwNonlocal,
            "not" => Token::KwNot,
            "or" => Token::KwOr,
            "pass" => Token::KwPass,
            "raise" => Token::KwRaise,
            "return" => Token::KwReturn,
            "try" => Token::KwTry,
            "while" => Token::KwWhile,
            "with" => Token::KwWith,
            "yield" => Token::KwYield,
            other => Token::Name(other),
        };
        self.finish(start, tok)
    }

    // ── Number lexing ─────────────────────────────────────────────────────────

    fn lex_number(&mut self) {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else if (b == b'+' || b == b'-')
                && self.pos > 0
                && (self.src[self.pos - 1] == b'e' || self.src[self.pos - 1] == b'E')
                && !self.number_is_hex()
            {
                // Exponent sign in float literal.
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// `0xE+1` is `0xE + 1`, not an exponent.
    fn number_is_hex(&self) -> bool {
        let mut i = self.pos;
        while i > 0 && (self.src[i - 1].is_ascii_alphanumeric() || self.src[i - 1] == b'_') {
            i -= 1;
        }
        matches!(self.src.get(i + 1), Some(b'x' | b'X')) && self.src.get(i) == Some(&b'0')
    }

    // ── String literal detection ──────────────────────────────────────────────

    fn is_string_start(&self) -> bool {
        let b = self.src[self.pos];
        match b {
            b'"' | b'\'' => true,
            b'r' | b'R' | b'b' | b'B' | b'u' | b'U' | b'f' | b'F' => {
                let next = self.src.get(self.pos + 1).copied().unwrap_or(0);
                match next {
                    b'"' | b'\'' => true,
                    b'r' | b'R' | b'b' | b'B' | b'f' | b'F' => {
                        // Two-char prefix like rb, br, rf, fr
                        let nn = self.src.get(self.pos + 2).copied().unwrap_or(0);
                        nn == b'"' || nn == b'\''
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn lex_string(&mut self, start: usize) -> TokenWithOffset<'src> {
        let mut is_fstring = false;

        while let Some(&p) = self.src.get(self.pos) {
            match p {
                b'r' | b'R' | b'b' | b'B' | b'u' | b'U' => self.pos += 1,
                b'f' | b'F' => {
                    is_fstring = true;
                    self.pos += 1;
                }
                _ => break,
            }
        }

        let q = self.src[self.pos];
        let triple =
            self.src.get(self.pos + 1) == Some(&q) && self.src.get(self.pos + 2) == Some(&q);
        self.pos += if triple { 3 } else { 1 };

        let mut terminated = false;
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b == b'\\' {
                self.pos = (self.pos + 2).min(self.src.len());
                continue;
            }
            if triple {
                if b == q
                    && self.src.get(self.pos + 1) == Some(&q)
                    && self.src.get(self.pos + 2) == Some(&q)
                {
                    self.pos += 3;
                    terminated = true;
                    break;
                }
            } else if b == q {
                self.pos += 1;
                terminated = true;
                break;
            } else if b == b'\n' {
                break;
            }
            self.pos += 1;
        }

        // An escaped multi-byte char can leave `pos` mid-character; move to
        // the next boundary before slicing.
        while !self.src_str.is_char_boundary(self.pos) {
            self.pos += 1;
        }

        if !terminated {
            return self.finish(start, Token::Invalid("unterminated string literal"));
        }

        let raw = &self.src_str[start..self.pos];
        let tok = if is_fstring {
            Token::FStr(raw)
        } else {
            Token::Str(raw)
        };
        self.finish(start, tok)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token<'_>> {
        let mut lex = Lexer::new(src);
        let mut out = Vec::new();
        loop {
            let t = lex.bump();
            if t == Token::Eof {
                out.push(t);
                break;
            }
            out.push(t);
        }
        out
    }

    #[test]
    fn test_simple_name() {
        let toks = tokens("hello");
        assert_eq!(toks[0], Token::Name("hello"));
    }

    #[test]
    fn test_keyword_for_in() {
        let toks = tokens("for i in x");
        assert_eq!(toks[0], Token::KwFor);
        assert_eq!(toks[1], Token::Name("i"));
        assert_eq!(toks[2], Token::KwIn);
    }

    #[test]
    fn test_walrus() {
        let toks = tokens("n := 1");
        assert_eq!(toks[0], Token::Name("n"));
        assert_eq!(toks[1], Token::Walrus);
        assert_eq!(toks[2], Token::Number("1"));
    }

    #[test]
    fn test_indent_dedent() {
        let src = "for i in x:\n    y = 1\n";
        let toks = tokens(src);
        assert!(toks.iter().any(|t| *t == Token::Indent));
        assert!(toks.iter().any(|t| *t == Token::Dedent));
    }

    #[test]
    fn test_blank_and_comment_lines_do_not_dedent() {
        let src = "for i in x:\n  a = 1\n\n  # note\n  b = 2\n";
        let toks = tokens(src);
        let dedents = toks.iter().filter(|t| **t == Token::Dedent).count();
        assert_eq!(dedents, 1);
    }

    #[test]
    fn test_bad_dedent_is_invalid() {
        let src = "if x:\n    a = 1\n  b = 2\n";
        let toks = tokens(src);
        assert!(toks.iter().any(|t| matches!(t, Token::Invalid(_))));
    }

    #[test]
    fn test_operators_keep_spelling() {
        let toks = tokens("a*2+5 <= b != c // d");
        assert_eq!(toks[1], Token::Star);
        assert_eq!(toks[3], Token::Op("+"));
        assert_eq!(toks[5], Token::Op("<="));
        assert_eq!(toks[7], Token::Op("!="));
        assert_eq!(toks[9], Token::Op("//"));
    }

    #[test]
    fn test_augassign() {
        let toks = tokens("x //= 1");
        assert_eq!(toks[1], Token::AugAssign("//="));
        let toks = tokens("x <<= 1");
        assert_eq!(toks[1], Token::AugAssign("<<="));
    }

    #[test]
    fn test_ellipsis_and_arrow() {
        assert_eq!(tokens("...")[0], Token::Ellipsis);
        assert_eq!(tokens("->")[0], Token::Arrow);
    }

    #[test]
    fn test_string_tokens() {
        assert_eq!(tokens("'hello'")[0], Token::Str("'hello'"));
        assert_eq!(tokens("rb\"x\"")[0], Token::Str("rb\"x\""));
        assert!(matches!(tokens("f'hi {name}'")[0], Token::FStr(_)));
    }

    #[test]
    fn test_unterminated_string_is_invalid() {
        assert!(matches!(tokens("'abc\n")[0], Token::Invalid(_)));
    }

    #[test]
    fn test_token_spans() {
        let mut lex = Lexer::new("abc  = [1]");
        let t = lex.consume();
        assert_eq!((t.offset, t.end), (0, 3));
        let t = lex.consume();
        assert_eq!((t.offset, t.end), (5, 6));
        let t = lex.consume();
        assert_eq!((t.offset, t.end), (7, 8));
    }

    #[test]
    fn test_newline_ignored_inside_brackets() {
        let toks = tokens("x = [1,\n  2]\n");
        let newlines = toks.iter().filter(|t| **t == Token::Newline).count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn test_hex_literal_is_not_an_exponent() {
        let toks = tokens("0xE+1");
        assert_eq!(toks[0], Token::Number("0xE"));
        assert_eq!(toks[1], Token::Op("+"));
    }
}
