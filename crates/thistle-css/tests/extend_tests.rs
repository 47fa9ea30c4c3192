//! Integration tests for the `@extend` engine, end to end through
//! `compile`.

use thistle_css::{compile, CompileError, OutputStyle};

fn css(source: &str) -> String {
    compile(source, OutputStyle::Nested).unwrap()
}

#[test]
fn test_extend_appends_extender() {
    let output = css(".b { color: red; }\n.a { @extend .b; }");
    assert_eq!(output, ".b, .a {\n  color: red; }\n\n");
}

#[test]
fn test_extend_in_descendant_context() {
    let output = css(".x .b { color: red; }\n.a { @extend .b; }");
    assert_eq!(output, ".x .b, .x .a {\n  color: red; }\n\n");
}

#[test]
fn test_extend_unifies_with_sibling_members() {
    let output = css(".x.b { color: red; }\n.a { @extend .b; }");
    assert_eq!(output, ".x.b, .x.a {\n  color: red; }\n\n");
}

#[test]
fn test_extend_by_complex_selector() {
    let output = css(".c { color: red; }\n.a .b { @extend .c; }");
    assert_eq!(output, ".c, .a .b {\n  color: red; }\n\n");
}

#[test]
fn test_extend_weaves_both_contexts() {
    let output = css(".x .c { color: red; }\n.a .b { @extend .c; }");
    assert_eq!(
        output,
        ".x .c, .x .a .b, .a .x .b {\n  color: red; }\n\n"
    );
}

#[test]
fn test_mutual_extension_terminates() {
    let output = css(
        ".a, .b { color: red; }\n.a { @extend .b; }\n.b { @extend .a; }",
    );
    // Both originals survive and the recursion guard prevents blowup.
    let selector_line = output.lines().next().unwrap();
    assert!(selector_line.contains(".a"));
    assert!(selector_line.contains(".b"));
}

#[test]
fn test_extend_compound_target() {
    let output = css(".a.b.x { color: red; }\n.y { @extend .a.b; }");
    assert_eq!(output, ".a.b.x, .x.y {\n  color: red; }\n\n");
}

#[test]
fn test_extend_chain() {
    // .c extends .b which extends .a: the chain is followed through the
    // recursion.
    let output = css(
        ".a { color: red; }\n.b { @extend .a; }\n.c { @extend .b; }",
    );
    assert_eq!(output, ".a, .b, .c {\n  color: red; }\n\n");
}

#[test]
fn test_extend_placeholder() {
    let output = css("%base { color: red; }\n.btn { @extend %base; }");
    assert_eq!(output, ".btn {\n  color: red; }\n\n");
}

#[test]
fn test_unextended_placeholder_emits_nothing() {
    let output = css("%base { color: red; }\n.btn { color: blue; }");
    assert_eq!(output, ".btn {\n  color: blue; }\n\n");
}

#[test]
fn test_extend_from_nested_rule() {
    let output = css(".a { color: red; .b { margin: 0; } }\n.c { @extend .b; }");
    assert_eq!(
        output,
        ".a {\n  color: red; }\n\n.a .b, .a .c {\n  margin: 0; }\n\n"
    );
}

#[test]
fn test_extend_type_unification_failure_is_silent() {
    // span and div cannot unify; the candidate is dropped, not reported.
    let output = css("div.b { color: red; }\nspan.a { @extend .b; }");
    assert_eq!(output, "div.b {\n  color: red; }\n\n");
}

#[test]
fn test_optional_extend_may_fail() {
    let output = css(".a { color: red; @extend .missing !optional; }");
    assert_eq!(output, ".a {\n  color: red; }\n\n");
}

#[test]
fn test_unsatisfied_extend_is_fatal() {
    let error = compile(
        ".a { color: red; @extend .missing; }",
        OutputStyle::Nested,
    )
    .unwrap_err();
    match &error {
        CompileError::UnsatisfiedExtend { extender, target } => {
            assert_eq!(extender, ".a");
            assert_eq!(target, ".missing");
        }
        other => panic!("expected an unsatisfied-extend error, got {other}"),
    }
    let message = error.to_string();
    assert!(message.contains("\".a\" failed to @extend \".missing\""));
    assert!(message.contains("The selector \".missing\" was not found"));
    assert!(message.contains("!optional"));
}

#[test]
fn test_cross_media_extend_is_fatal() {
    let error = compile(
        ".a { color: red; }\n@media screen { .b { margin: 0; @extend .a; } }",
        OutputStyle::Nested,
    )
    .unwrap_err();
    assert!(matches!(error, CompileError::CrossMediaExtend { .. }));
    assert!(error
        .to_string()
        .contains("You may not @extend an outer selector from within @media."));
}

#[test]
fn test_same_media_extend_succeeds() {
    let output = css("@media screen { .a { color: red; } .b { @extend .a; } }");
    assert_eq!(
        output,
        "@media screen {\n  .a, .b {\n    color: red; } }\n\n"
    );
}

#[test]
fn test_extend_applies_across_all_rules() {
    let output = css(
        ".b { color: red; }\n.b .c { margin: 0; }\n.a { @extend .b; }",
    );
    assert_eq!(
        output,
        ".b, .a {\n  color: red; }\n\n.b .c, .a .c {\n  margin: 0; }\n\n"
    );
}

#[test]
fn test_extend_inside_wrapped_selector() {
    let output = css(":not(.a) { color: red; }\n.b { @extend .a; }");
    assert_eq!(output, ":not(.a):not(.b) {\n  color: red; }\n\n");
}

#[test]
fn test_extendee_used_twice() {
    let output = css(
        ".b { color: red; }\n.a { @extend .b; }\n.c { @extend .b; }",
    );
    assert_eq!(output, ".b, .a, .c {\n  color: red; }\n\n");
}

#[test]
fn test_output_is_deterministic() {
    let source = ".x .c { color: red; }\n.a .b { @extend .c; }\n.d { @extend .c; }";
    let first = css(source);
    let second = css(source);
    assert_eq!(first, second);
}
