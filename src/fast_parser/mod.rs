//! Fast custom Python parser module.
//!
//! Produces a `Vec<Stmt<'src>>` borrowing zero-copy `&'src str` slices from
//! the source buffer, with a byte span on every node.
//!
//! # Usage
//! ```
//! use listcomp::fast_parser::parse;
//! let stmts = parse("acc = []\n").unwrap();
//! assert_eq!(stmts.len(), 1);
//! ```

pub mod lexer;
pub mod parser;

pub use parser::parse;
