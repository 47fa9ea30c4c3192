//! Integration tests for selector parsing, display and algebra.

use thistle_css::{parse_selector_list, ComplexMember, SimpleSelector, Specificity};

fn complex(input: &str) -> thistle_css::ComplexSelector {
    let mut list = parse_selector_list(input, 1).unwrap();
    assert_eq!(list.members.len(), 1);
    list.members.remove(0)
}

#[test]
fn test_parse_type_selector() {
    let selector = complex("body");
    assert_eq!(selector.members.len(), 1);
    let Some(ComplexMember::Compound(compound)) = selector.members.first() else {
        panic!("expected a compound");
    };
    assert!(matches!(
        &compound.simple_selectors[0],
        SimpleSelector::Type(name) if name == "body"
    ));
    assert_eq!(selector.specificity(), Specificity(1));
}

#[test]
fn test_parse_class_and_id() {
    assert_eq!(complex(".highlight").specificity(), Specificity(100));
    assert_eq!(complex("#main-content").specificity(), Specificity(10_000));
}

#[test]
fn test_parse_universal() {
    assert_eq!(complex("*").specificity(), Specificity(0));
    assert_eq!(complex("*").to_string(), "*");
}

#[test]
fn test_complex_specificity_sums_compounds() {
    // "div p" = two type selectors.
    assert_eq!(complex("div p").specificity(), Specificity(2));
    // "#main .content p" = id + class + type.
    assert_eq!(complex("#main .content p").specificity(), Specificity(10_101));
    // "div.class#id > ul.nav li" = 1 id, 2 classes, 3 types.
    assert_eq!(
        complex("div.class#id > ul.nav li").specificity(),
        Specificity(10_203)
    );
}

#[test]
fn test_display_normalizes_whitespace() {
    assert_eq!(complex("div   >p").to_string(), "div > p");
    assert_eq!(complex("a  b\tc").to_string(), "a b c");
}

#[test]
fn test_parse_selector_list_members() {
    let list = parse_selector_list("h1, h2, .title", 1).unwrap();
    assert_eq!(list.members.len(), 3);
    assert_eq!(list.to_string(), "h1, h2, .title");
}

#[test]
fn test_parse_wrapped_keeps_inner_list() {
    let selector = complex(":not(.a, .b)");
    let Some(ComplexMember::Compound(compound)) = selector.members.first() else {
        panic!("expected a compound");
    };
    let SimpleSelector::Wrapped { name, selectors } = &compound.simple_selectors[0] else {
        panic!("expected a wrapped selector");
    };
    assert_eq!(name, "not");
    assert_eq!(selectors.members.len(), 2);
}

#[test]
fn test_superselector_reflexivity() {
    for input in [
        "div",
        ".a.b",
        ".a > .b",
        ".a .b ~ .c",
        "#x .y:hover",
        ":not(.a)",
    ] {
        let selector = complex(input);
        assert!(
            selector.is_superselector_of(&selector),
            "{input} should be a superselector of itself"
        );
    }
}

#[test]
fn test_superselector_cross_checks() {
    assert!(complex(".a").is_superselector_of(&complex(".a.b")));
    assert!(complex(".b").is_superselector_of(&complex(".a .b")));
    assert!(complex(".a .b").is_superselector_of(&complex(".a > .b")));
    assert!(!complex(".a > .b").is_superselector_of(&complex(".a .b")));
    assert!(!complex(".a").is_superselector_of(&complex(".b")));
}

#[test]
fn test_placeholder_display() {
    assert_eq!(complex("%button-base").to_string(), "%button-base");
}

#[test]
fn test_equality_ignores_member_order() {
    let one = complex(".a.b");
    let two = complex(".b.a");
    assert_eq!(one, two);
    assert!(!one.eq_members(&two, true));
}
