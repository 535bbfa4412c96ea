//! Building the list-comprehension assignment from matched fragments.

use crate::ast::Expr;
use crate::matcher::IdiomMatch;
use crate::render::{NodeRenderer, needs_parens_as_element, needs_parens_as_iterable};
use crate::types::RefactorResult;

pub fn render_expression<R: NodeRenderer + ?Sized>(
    renderer: &R,
    source: &str,
    node: &Expr<'_>,
) -> String {
    renderer.render(source, node)
}

/// `"{target} = [{element} for {loop_var} in {iterable}]\n"`, verbatim.
pub fn build_comprehension(target: &str, iterable: &str, loop_var: &str, element: &str) -> String {
    format!("{target} = [{element} for {loop_var} in {iterable}]\n")
}

/// Render every fragment of `idiom` and wrap the assembled line in a
/// successful [`RefactorResult`].
///
/// An iterable looser than `or` (`a, b`, `x if c else y`) and a bare tuple
/// element are parenthesised so the comprehension keeps its meaning.
pub fn generate<R: NodeRenderer + ?Sized>(
    renderer: &R,
    source: &str,
    idiom: &IdiomMatch<'_, '_>,
) -> RefactorResult {
    let target = render_expression(renderer, source, idiom.target);
    let iterable = render_expression(renderer, source, idiom.iterable);
    let iterable = parenthesize_if(iterable, needs_parens_as_iterable(idiom.iterable));
    let loop_var = render_expression(renderer, source, idiom.loop_var);
    let element = render_expression(renderer, source, idiom.element);
    let element = parenthesize_if(element, needs_parens_as_element(idiom.element));
    RefactorResult::success(build_comprehension(&target, &iterable, &loop_var, &element))
}

fn parenthesize_if(text: String, wrap: bool) -> String {
    if wrap { format!("({text})") } else { text }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ExprKind;
    use crate::render::{SourceRenderer, Unparser};

    #[test]
    fn test_build_comprehension_template() {
        assert_eq!(
            build_comprehension("result", "range (0, 10)", "i", "i"),
            "result = [i for i in range (0, 10)]\n"
        );
    }

    #[test]
    fn test_build_comprehension_does_not_touch_fragments() {
        assert_eq!(
            build_comprehension(" t", "xs ", "v", "  a+b"),
            " t = [  a+b for v in xs ]\n"
        );
    }

    #[test]
    fn test_generate_from_synthetic_fragments() {
        let target = Expr::synthetic(ExprKind::Name("out"));
        let iterable = Expr::synthetic(ExprKind::List(vec![
            Expr::synthetic(ExprKind::Number("1")),
            Expr::synthetic(ExprKind::Number("2")),
        ]));
        let loop_var = Expr::synthetic(ExprKind::Name("n"));
        let element = Expr::synthetic(ExprKind::BinOp {
            left: Expr::synthetic(ExprKind::Name("n")).boxed(),
            op: "*",
            right: Expr::synthetic(ExprKind::Number("2")).boxed(),
        });
        let idiom = IdiomMatch {
            target: &target,
            iterable: &iterable,
            loop_var: &loop_var,
            element: &element,
        };
        let expected = RefactorResult::success("out = [n * 2 for n in [1, 2]]\n");
        assert_eq!(generate(&Unparser, "", &idiom), expected);
        assert_eq!(generate(&SourceRenderer, "", &idiom), expected);
    }

    #[test]
    fn test_generate_wraps_synthetic_tuple_fragments() {
        let pair = || {
            Expr::synthetic(ExprKind::Tuple {
                elts: vec![
                    Expr::synthetic(ExprKind::Name("a")),
                    Expr::synthetic(ExprKind::Name("b")),
                ],
                parenthesized: false,
            })
        };
        let target = Expr::synthetic(ExprKind::Name("out"));
        let loop_var = Expr::synthetic(ExprKind::Name("n"));
        let iterable = pair();
        let element = pair();
        let idiom = IdiomMatch {
            target: &target,
            iterable: &iterable,
            loop_var: &loop_var,
            element: &element,
        };
        assert_eq!(
            generate(&Unparser, "", &idiom),
            RefactorResult::success("out = [(a, b) for n in (a, b)]\n")
        );
    }
}
