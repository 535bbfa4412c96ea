//! Error types.
//!
//! [`ParseError`] is raised by parsers and always reaches the caller as an
//! `Err`.  [`MatchError`] describes why a parsed module does not contain the
//! accumulator idiom; the orchestrator turns it into a failed
//! [`RefactorResult`](crate::types::RefactorResult) using its `Display` text.

use crate::location::offset_to_line_col;
use thiserror::Error;

/// Message reported when the module has no top-level assignment to rewrite.
pub const TARGET_OUT_OF_SCOPE: &str = "for loop target out of scope";

/// A syntax error, located by byte offset and 1-indexed line/column.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}:{col}: {message}")]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseError {
    pub fn at(message: impl Into<String>, offset: usize, source: &str) -> Self {
        let (line, col) = offset_to_line_col(offset, source);
        Self {
            message: message.into(),
            offset,
            line,
            col,
        }
    }
}

/// Ways a module can fail to match the accumulator idiom.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchError {
    #[error("{}", TARGET_OUT_OF_SCOPE)]
    MissingAssignment,

    #[error("no top-level for loop found")]
    MissingForLoop,

    #[error("for loop body has no append call")]
    MissingAppendCall,

    #[error("append call must take exactly one positional argument (found {found} argument(s))")]
    AppendArity { found: usize },

    /// The one argument is `*xs`, `name=value` or `**kw`.
    #[error("append call must take a plain positional argument, not {kind}")]
    AppendArgumentKind { kind: &'static str },
}
