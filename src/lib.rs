//! Rewrite the Python accumulator loop
//!
//! ```python
//! result = []
//! for i in range (0, 10):
//!   result.append(i)
//! ```
//!
//! as the equivalent list comprehension `result = [i for i in range (0, 10)]`.
//!
//! The pipeline is parse ([`parser::SourceParser`]) → match
//! ([`matcher::match_idiom`]) → generate ([`generator::generate`]), wired
//! together by [`refactor_for_loop`] and [`Refactorer`].

pub mod ast;
pub mod batch;
pub mod discovery;
pub mod error;
pub mod fast_parser;
pub mod generator;
pub mod location;
pub mod matcher;
pub mod parser;
pub mod refactor;
pub mod render;
pub mod types;

pub use error::{MatchError, ParseError};
pub use refactor::{Refactorer, refactor_for_loop, refactor_tree};
pub use types::RefactorResult;
