use std::collections::HashSet;
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use templar_compiler::codegen::names::short_name;
use templar_compiler::ir::{AllocValue, Literal, Op};
use templar_compiler::{
    analyze_ir, build_ir, compile, compile_with_options, print_ir, CompileError, CompileOptions,
    StructuralError, SyntaxError,
};

fn declared_names(code: &str) -> Vec<&str> {
    code.split("const ")
        .skip(1)
        .filter_map(|rest| rest.split(' ').next())
        .collect()
}

#[test]
fn div_with_attribute_and_expression() {
    let ir = build_ir(r#"<div id="x">{msg}</div>"#).unwrap();
    let ops = ir.instructions();
    assert_eq!(ops.len(), 5);

    let element = match &ops[0].op {
        Op::CreateElement{tag, ..} => {
            assert_eq!(tag, "div");
            ops[0].dest.as_deref().unwrap()
        }
        other => panic!("expected create_element, got {}", other),
    };

    match &ops[1].op {
        Op::Alloc{value: AllocValue::Literal(Literal::Str(x)), is_static: true} => assert_eq!(x, "x"),
        other => panic!("expected static alloc, got {}", other),
    }
    match &ops[2].op {
        Op::SetProp{element: target, key, value} => {
            assert_eq!(target, element);
            assert_eq!(key, "id");
            assert_eq!(Some(ir.resolve(value)), ops[1].dest.as_deref());
        }
        other => panic!("expected set_prop, got {}", other),
    }
    match &ops[3].op {
        Op::Load{expr} => assert_eq!(expr, "msg"),
        other => panic!("expected load, got {}", other),
    }
    assert_eq!(ops[3].op.is_static(), Some(false));
    match &ops[4].op {
        Op::AppendChild{parent, child} => {
            assert_eq!(parent, element);
            assert_eq!(Some(child.as_str()), ops[3].dest.as_deref());
        }
        other => panic!("expected append_child, got {}", other),
    }

    let stats = analyze_ir(&ir);
    assert_eq!(stats.instruction_count, 5);
    assert_eq!(stats.block_count, 1);
    assert!(print_ir(&ir).contains("load {msg} dynamic"));
}

#[test]
fn syntax_errors_abort() {
    assert!(matches!(
        compile("<div>{oops</div>"),
        Err(CompileError::Syntax(SyntaxError::UnterminatedExpression(_)))
    ));
    assert!(matches!(
        compile("<div class=\"a\""),
        Err(CompileError::Syntax(SyntaxError::UnterminatedTag(_)))
    ));
}

#[test]
fn structural_errors_abort() {
    assert!(matches!(
        compile("<p><>x</></p>"),
        Err(CompileError::Structural(StructuralError::MissingTagName{..}))
    ));
}

#[test]
fn error_messages_carry_locations() {
    let err = compile("<p>\n  {x").unwrap_err();
    assert_eq!(err.to_string(), "syntax error: unterminated expression starting at 2:3");
}

#[test]
fn deep_nesting_is_an_error_not_a_crash() {
    let err = compile(&"<a>".repeat(20_000)).unwrap_err();
    assert!(matches!(err, CompileError::Syntax(SyntaxError::NestingTooDeep{limit: 256, ..})));
    assert!(compile(&"<a>".repeat(200)).is_ok());
}

#[test]
fn component_names_with_dashes_are_rejected() {
    assert!(matches!(
        compile("<My-Widget/>"),
        Err(CompileError::Structural(StructuralError::InvalidComponentName{..}))
    ));
}

#[test]
fn readable_names_never_shadow_expressions() {
    let code = compile_with_options("<p>{expr0}</p>", &CompileOptions::default()).unwrap();
    assert!(code.contains("const expr0_ = (expr0);"), "{}", code);
    assert!(!code.contains("const expr0 ="), "{}", code);
}

#[test]
fn static_and_dynamic_twins_are_duplicates() {
    let ir = build_ir("<p><div>a</div><div>{x}</div></p>").unwrap();
    assert_eq!(ir.duplicates.get("el2").map(String::as_str), Some("el1"));
}

#[test]
fn minified_names_follow_first_use() {
    let options = CompileOptions {minify: true, ..CompileOptions::default()};
    let code = compile_with_options(r#"<ul><li>a</li><li class="x">b</li></ul>"#, &options).unwrap();
    let names = declared_names(&code);
    let expected: Vec<String> = (0..names.len()).map(short_name).collect();
    assert_eq!(names, expected);
    assert!(!code.contains('\n'));
}

#[test]
fn default_compile_is_fully_optimized() {
    let source = r#"<section><h1 class="t">Title</h1><p class="t">{body}</p></section>"#;
    let code = compile(source).unwrap();
    assert_eq!(code, compile_with_options(source, &CompileOptions::optimized()).unwrap());
    assert!(code.contains("__cached(\"h1\")"));
    assert!(!code.contains('\n'));
    assert_eq!(code.matches("= \"t\";").count(), 1);
}

fn template() -> impl Strategy<Value = String> {
    let piece = prop_oneof![
        Just("<div>"),
        Just("</div>"),
        Just("<br/>"),
        Just("<p id=\"a\" hidden>"),
        Just("</p>"),
        Just("<Card title={t} n=\"1\"/>"),
        Just("<List>"),
        Just("</List>"),
        Just("hello "),
        Just("{msg}"),
        Just("{a.b(c)}"),
    ];
    proptest::collection::vec(piece, 0..24).prop_map(|xs| xs.concat())
}

proptest! {
    #[test]
    fn compilation_is_deterministic(source in template()) {
        let first = compile(&source).unwrap();
        let second = compile(&source).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn minified_names_are_unique(source in template()) {
        let options = CompileOptions {minify: true, ..CompileOptions::default()};
        let code = compile_with_options(&source, &options).unwrap();
        let names = declared_names(&code);
        let unique: HashSet<&str> = names.iter().cloned().collect();
        prop_assert_eq!(unique.len(), names.len());
    }
}
