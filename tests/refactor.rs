use listcomp::error::TARGET_OUT_OF_SCOPE;
use listcomp::parser::FastParser;
use listcomp::render::Unparser;
use listcomp::{RefactorResult, Refactorer, refactor_for_loop};
use proptest::prelude::*;

// ── fixed inputs ─────────────────────────────────────────────────────────────

#[test]
fn test_result_loop_followed_by_print() {
    let src = "result = []\nfor i in range (0, 10):\n  result.append(i)\n\nprint(result)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap(),
        RefactorResult::success("result = [i for i in range (0, 10)]\n")
    );
}

#[test]
fn test_acc_loop() {
    let src = "acc = []\nfor i in range (0, 10):\n  acc.append(i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap(),
        RefactorResult::success("acc = [i for i in range (0, 10)]\n")
    );
}

#[test]
fn test_arithmetic_argument_kept_verbatim() {
    let src = "acc = []\nfor i in range (0, 10):\n  acc.append(i*2+5)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [i*2+5 for i in range (0, 10)]\n")
    );
}

#[test]
fn test_loop_without_assignment() {
    let src = "for x in range (0, 10):\n  result.append(x)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap(),
        RefactorResult::failure("for loop target out of scope")
    );
}

#[test]
fn test_literal_list_iterable() {
    let src = "acc = []\nfor i in [1, 2, 3]:\n  acc.append(i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [i for i in [1, 2, 3]]\n")
    );
}

#[test]
fn test_result_serialises_like_the_cli() {
    let src = "acc = []\nfor i in x:\n  acc.append(i)\n";
    let json = refactor_for_loop(src).unwrap().to_json();
    assert_eq!(json["succeeded"], true);
    assert_eq!(json["source_code"], "acc = [i for i in x]\n");
}

#[test]
fn test_structural_renderer_normalises_spacing() {
    let r = Refactorer::new(FastParser, Unparser);
    let src = "acc = []\nfor i in range (0,10):\n  acc.append(i*2+5)\n";
    assert_eq!(
        r.refactor(src).unwrap().source_code(),
        Some("acc = [i * 2 + 5 for i in range(0, 10)]\n")
    );
}

#[test]
fn test_bare_tuple_iterable_is_parenthesised() {
    let src = "acc = []\nfor i in a, b:\n    acc.append(i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [i for i in (a, b)]\n")
    );
}

#[test]
fn test_conditional_iterable_is_parenthesised() {
    let src = "acc = []\nfor i in xs if flag else ys:\n    acc.append(i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [i for i in (xs if flag else ys)]\n")
    );
}

#[test]
fn test_generator_argument_stays_one_element() {
    let src = "acc = []\nfor i in xs:\n    acc.append(j for j in i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [(j for j in i) for i in xs]\n")
    );

    let src = "acc = []\nfor i in xs:\n    acc.append((j for j in i))\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [(j for j in i) for i in xs]\n")
    );
}

#[test]
fn test_keyword_append_argument_is_reported() {
    let src = "acc = []\nfor i in xs:\n    acc.append(x=i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap(),
        RefactorResult::failure(
            "append call must take a plain positional argument, not a keyword argument"
        )
    );
}

#[test]
fn test_module_with_type_alias_is_rewritten() {
    let src = "type Row = list[int]\nacc = []\nfor i in xs:\n    acc.append(i)\n";
    assert_eq!(
        refactor_for_loop(src).unwrap().source_code(),
        Some("acc = [i for i in xs]\n")
    );
}

#[test]
fn test_deeply_nested_argument_is_a_syntax_error() {
    let src = format!(
        "acc = []\nfor i in xs:\n    acc.append({}i{})\n",
        "(".repeat(500),
        ")".repeat(500)
    );
    let err = refactor_for_loop(&src).unwrap_err();
    assert_eq!(err.line, 3);
}

// ── properties ───────────────────────────────────────────────────────────────

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "case", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "match", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

fn identifier() -> impl Strategy<Value = String> {
    "[a-z_][a-z0-9_]{0,7}".prop_filter("keyword", |s| !KEYWORDS.contains(&s.as_str()))
}

fn number() -> impl Strategy<Value = String> {
    "[1-9][0-9]{0,2}"
}

/// Arithmetic expressions with irregular spacing, parentheses and calls.
fn expression() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![identifier(), number()];
    leaf.prop_recursive(4, 24, 2, |inner| {
        prop_oneof![
            (
                inner.clone(),
                prop::sample::select(vec!["+", "-", "*", "//", "%", "**"]),
                prop::sample::select(vec!["", " "]),
                inner.clone(),
            )
                .prop_map(|(l, op, sp, r)| format!("{l}{sp}{op}{sp}{r}")),
            inner.clone().prop_map(|e| format!("({e})")),
            (identifier(), inner).prop_map(|(f, e)| format!("{f}({e})")),
        ]
    })
}

fn iterable() -> impl Strategy<Value = String> {
    prop_oneof![
        identifier(),
        number().prop_map(|n| format!("range (0, {n})")),
        prop::collection::vec(number(), 1..4).prop_map(|ns| format!("[{}]", ns.join(", "))),
        expression().prop_map(|e| format!("f({e})")),
    ]
}

proptest! {
    #[test]
    fn prop_output_follows_template(
        target in identifier(),
        loop_var in identifier(),
        iter in iterable(),
        element in expression(),
    ) {
        let src = format!("{target} = []\nfor {loop_var} in {iter}:\n    {target}.append({element})\n");
        let result = refactor_for_loop(&src).unwrap();
        prop_assert_eq!(
            result,
            RefactorResult::success(format!("{target} = [{element} for {loop_var} in {iter}]\n"))
        );
    }

    #[test]
    fn prop_append_argument_text_round_trips(element in expression()) {
        let src = format!("acc = []\nfor i in xs:\n  acc.append({element})\n\nprint(acc)\n");
        let expected = format!("acc = [{element} for i in xs]\n");
        let result = refactor_for_loop(&src).unwrap();
        prop_assert_eq!(result.source_code(), Some(expected.as_str()));
    }

    #[test]
    fn prop_no_assignment_always_out_of_scope(
        stmts in prop::collection::vec(
            prop_oneof![
                expression().prop_map(|e| format!("print({e})")),
                (identifier(), expression()).prop_map(|(n, e)| format!("{n} += {e}")),
                (identifier(), identifier()).prop_map(|(v, it)| format!("for {v} in {it}:\n    out.append({v})")),
                Just("import os".to_string()),
                Just("def f():\n    x = []\n    return x".to_string()),
            ],
            0..6,
        )
    ) {
        let src = stmts.join("\n") + "\n";
        prop_assert_eq!(
            refactor_for_loop(&src).unwrap(),
            RefactorResult::failure(TARGET_OUT_OF_SCOPE)
        );
    }
}
