//! Python source parser seam.
//!
//! The refactorer only needs "source text in, syntax tree out", so parsing
//! sits behind [`SourceParser`].  [`FastParser`] is the built-in zero-copy
//! implementation.

use crate::ast::SyntaxTree;
use crate::error::ParseError;

/// Anything that can turn Python source into a [`SyntaxTree`].
pub trait SourceParser {
    fn parse<'src>(&self, source: &'src str) -> Result<SyntaxTree<'src>, ParseError>;
}

/// The crate's own recursive-descent parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct FastParser;

impl SourceParser for FastParser {
    fn parse<'src>(&self, source: &'src str) -> Result<SyntaxTree<'src>, ParseError> {
        let body = crate::fast_parser::parse(source)?;
        Ok(SyntaxTree::new(source, body))
    }
}

/// Parse a Python source string with [`FastParser`].
///
/// `filename` is only used for logging.
pub fn parse_python<'src>(source: &'src str, filename: &str) -> Result<SyntaxTree<'src>, ParseError> {
    let tree = FastParser.parse(source);
    if let Err(e) = &tree {
        tracing::debug!(file = filename, error = %e, "parse failed");
    }
    tree
}
