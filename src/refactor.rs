//! The refactoring pipeline: parse, match, generate.

use crate::ast::SyntaxTree;
use crate::error::ParseError;
use crate::generator::generate;
use crate::matcher::match_idiom;
use crate::parser::{FastParser, SourceParser};
use crate::render::{NodeRenderer, SourceRenderer};
use crate::types::RefactorResult;

/// Rewrite the accumulator loop in `source` as a list comprehension.
///
/// Syntax errors are returned as `Err`.  A module that parses but does not
/// contain the idiom gives `Ok` with a failed [`RefactorResult`].
///
/// ```
/// use listcomp::refactor_for_loop;
///
/// let src = "acc = []\nfor i in range (0, 10):\n  acc.append(i)\n";
/// let result = refactor_for_loop(src).unwrap();
/// assert_eq!(result.source_code(), Some("acc = [i for i in range (0, 10)]\n"));
/// ```
pub fn refactor_for_loop(source: &str) -> Result<RefactorResult, ParseError> {
    Refactorer::new(FastParser, SourceRenderer).refactor(source)
}

/// Run matching and generation over an already-built tree.
pub fn refactor_tree<R: NodeRenderer + ?Sized>(
    tree: &SyntaxTree<'_>,
    renderer: &R,
) -> RefactorResult {
    match match_idiom(tree) {
        Ok(idiom) => generate(renderer, tree.source(), &idiom),
        Err(e) => {
            tracing::debug!(reason = %e, "no accumulator loop to rewrite");
            RefactorResult::failure(e.to_string())
        }
    }
}

/// A refactoring pipeline with its parser and renderer chosen by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct Refactorer<P, R> {
    parser: P,
    renderer: R,
}

impl<P: SourceParser, R: NodeRenderer> Refactorer<P, R> {
    pub fn new(parser: P, renderer: R) -> Self {
        Self { parser, renderer }
    }

    pub fn refactor(&self, source: &str) -> Result<RefactorResult, ParseError> {
        let tree = self.parser.parse(source)?;
        Ok(refactor_tree(&tree, &self.renderer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, ExprKind, Span, Stmt, StmtKind};
    use crate::error::TARGET_OUT_OF_SCOPE;
    use crate::render::Unparser;

    fn rewrite(src: &str) -> String {
        let result = refactor_for_loop(src).unwrap();
        match result.source_code() {
            Some(code) => code.to_string(),
            None => panic!("expected success, got {result:?}"),
        }
    }

    #[test]
    fn test_result_loop_with_trailing_print() {
        let src = "result = []\nfor i in range (0, 10):\n  result.append(i)\n\nprint(result)\n";
        assert_eq!(
            refactor_for_loop(src).unwrap(),
            RefactorResult::success("result = [i for i in range (0, 10)]\n")
        );
    }

    #[test]
    fn test_acc_loop() {
        let src = "acc = []\nfor i in range (0, 10):\n  acc.append(i)\n";
        assert_eq!(rewrite(src), "acc = [i for i in range (0, 10)]\n");
    }

    #[test]
    fn test_append_argument_text_is_verbatim() {
        let src = "acc = []\nfor i in range (0, 10):\n  acc.append(i*2+5)\n";
        assert_eq!(rewrite(src), "acc = [i*2+5 for i in range (0, 10)]\n");
    }

    #[test]
    fn test_no_assignment() {
        let src = "for x in range (0, 10):\n  result.append(x)\n";
        assert_eq!(
            refactor_for_loop(src).unwrap(),
            RefactorResult::failure(TARGET_OUT_OF_SCOPE)
        );
    }

    #[test]
    fn test_literal_list_iterable() {
        let src = "acc = []\nfor i in [1, 2, 3]:\n  acc.append(i)\n";
        assert_eq!(rewrite(src), "acc = [i for i in [1, 2, 3]]\n");
    }

    #[test]
    fn test_no_assignment_wins_over_other_content() {
        for src in [
            "",
            "print(1)\n",
            "import os\ndef f():\n    x = []\n",
            "x += 1\ny: int = 2\n",
        ] {
            assert_eq!(
                refactor_for_loop(src).unwrap(),
                RefactorResult::failure(TARGET_OUT_OF_SCOPE),
                "for {src:?}"
            );
        }
    }

    #[test]
    fn test_first_assignment_and_loop_are_used() {
        let src = "\
first = []
second = []
for a in xs:
    first.append(a)
for b in ys:
    second.append(b)
";
        assert_eq!(rewrite(src), "first = [a for a in xs]\n");
    }

    #[test]
    fn test_match_failures_become_failed_results() {
        let r = refactor_for_loop("acc = []\n").unwrap();
        assert_eq!(r.error_message(), Some("no top-level for loop found"));

        let r = refactor_for_loop("acc = []\nfor i in x:\n    pass\n").unwrap();
        assert_eq!(r.error_message(), Some("for loop body has no append call"));

        let r = refactor_for_loop("acc = []\nfor i in x:\n    acc.append(i, 1)\n").unwrap();
        assert!(!r.succeeded());
    }

    #[test]
    fn test_syntax_error_is_err() {
        let err = refactor_for_loop("acc = [\nfor i in x:\n").unwrap_err();
        assert!(err.line >= 1);
    }

    #[test]
    fn test_refactor_synthetic_tree_with_unparser() {
        // acc = []
        // for i in xs:
        //     acc.append(-i)
        let name = |n| Expr::synthetic(ExprKind::Name(n));
        let append = Expr::synthetic(ExprKind::Call {
            func: Expr::synthetic(ExprKind::Attribute {
                value: name("acc").boxed(),
                attr: "append",
            })
            .boxed(),
            args: vec![crate::ast::Arg::Positional(Expr::synthetic(
                ExprKind::UnaryOp {
                    op: "-",
                    operand: name("i").boxed(),
                },
            ))],
        });
        let body = vec![
            Stmt {
                span: Span::default(),
                kind: StmtKind::Assign {
                    targets: vec![name("acc")],
                    value: Expr::synthetic(ExprKind::List(vec![])),
                },
            },
            Stmt {
                span: Span::default(),
                kind: StmtKind::For {
                    iterator: name("i"),
                    iterable: name("xs"),
                    body: vec![Stmt {
                        span: Span::default(),
                        kind: StmtKind::Expr(append),
                    }],
                    orelse: vec![],
                    is_async: false,
                },
            },
        ];
        let tree = SyntaxTree::new("", body);
        assert_eq!(
            refactor_tree(&tree, &Unparser),
            RefactorResult::success("acc = [-i for i in xs]\n")
        );
    }

    #[test]
    fn test_injected_refactorer() {
        let r = Refactorer::new(FastParser, Unparser);
        let src = "acc = []\nfor i in range (0,10):\n  acc.append(i*2)\n";
        assert_eq!(
            r.refactor(src).unwrap(),
            RefactorResult::success("acc = [i * 2 for i in range(0, 10)]\n")
        );
    }
}
