use sable_ast::NodeKind;
use sable_parse::parse_source;

fn top(src: &str) -> Vec<sable_ast::Node> {
    match parse_source(src).expect("parse").kind {
        NodeKind::TopLevel(items) => items,
        other => panic!("expected top level, got {other:?}"),
    }
}

#[test]
fn statements_need_no_separator() {
    let items = top("5+6 7+8");
    assert_eq!(items.len(), 2);
    let items = top("5+6+7+8; x=6; 7+9;;");
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].to_string(), "(= x 6)");
}

#[test]
fn proof_chain_with_annotations_and_verbatim() {
    let src = r#"
FooA() {
    new (x=1) {
        bar(z) {
            x
        }
    }
}
FooB(x) {
    new () {
        bar(z) {
            x
        }
    }
}
FooA() ~ [Default()] {{{ assert true; }}} FooB(1) ~ FooB(1)
"#;
    let items = top(src);
    assert_eq!(items.len(), 3);
    let NodeKind::Proof {
        terms,
        hints,
        verbatims,
    } = &items[2].kind
    else {
        panic!("expected proof, got {}", items[2]);
    };
    assert_eq!(terms.len(), 3);
    assert_eq!(hints.len(), 3);
    assert_eq!(verbatims.len(), 3);
    assert_eq!(
        hints[0].as_ref().map(|h| h.to_string()).as_deref(),
        Some("(call nil Default)")
    );
    assert!(hints[1].is_none() && hints[2].is_none());
    assert_eq!(verbatims[0], " assert true; ");
    assert!(verbatims[2].is_empty());
}

#[test]
fn invariant_method_annotation() {
    let items = top("a() ~ [invariant(v) { _lhs.x == v }] b()");
    let NodeKind::Proof { hints, .. } = &items[0].kind else {
        panic!("expected proof");
    };
    let hint = hints[0].as_ref().expect("hint");
    assert!(matches!(hint.kind, NodeKind::Method { ref name, .. } if name == "invariant"));
}

#[test]
fn assert_and_assume() {
    let items = top("assert x == 1\nassume a() ~ b()\nx");
    assert_eq!(items[0].to_string(), "(assert (call nil == x 1))");
    assert_eq!(
        items[1].to_string(),
        "(assume (proof (call nil a) ~ (call nil b)))"
    );
    assert_eq!(items.len(), 3);
}

#[test]
fn assume_of_three_terms_is_rejected() {
    let err = parse_source("assume a ~ b ~ c").expect_err("expected parse error");
    assert!(err.to_string().contains("exactly two terms"), "{err}");
}

#[test]
fn parenthesized_assumption_is_rejected() {
    let err = parse_source("assume (a ~ b)").expect_err("expected parse error");
    assert!(err.to_string().contains("expected `)`, found `~`"), "{err}");
    let items = top("assume a ~ b");
    assert_eq!(items[0].to_string(), "(assume (proof a ~ b))");
}

#[test]
fn comments_are_ignored() {
    let items = top("// outer comment\nnew() {\n    // within\n    foo(x) {\n        x\n    }\n}");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].to_string(), "(new [] (method foo [x] x))");
}

#[test]
fn bad_assignment_target_is_rejected() {
    let err = parse_source("a + b = c").expect_err("expected parse error");
    assert!(err.to_string().contains("left side of `=`"), "{err}");
}

#[test]
fn chained_comparisons_are_rejected() {
    let err = parse_source("a < b < c").expect_err("expected parse error");
    assert!(err.to_string().contains("chained comparisons"), "{err}");
}

#[test]
fn unexpected_token_names_what_was_found() {
    let err = parse_source("new(x=) {}").expect_err("expected parse error");
    assert!(err.to_string().contains("found `)`"), "{err}");
}
