mod common;

use common::{integer, run, run_error, run_inspect, run_session};
use monkey::interpreter::{define_macros, expand_macros, parse, parse_and_run, Environment, MacroError};
use monkey::object::ObjectType;

const UNLESS: &str = "
    let unless = macro(condition, consequence, alternative) {
        quote(if (!(unquote(condition))) {
            unquote(consequence);
        } else {
            unquote(alternative);
        });
    };";

// ============================================================================
// quote / unquote
// ============================================================================

#[test]
fn test_quote_inspect() {
    assert_eq!(run_inspect("quote(1 + x)"), "QUOTE((1 + x))");
    assert_eq!(run_inspect("quote(fn(a) { a })"), "QUOTE(fn(a) { a })");
}

#[test]
fn test_quote_does_not_evaluate() {
    assert_eq!(run_inspect("quote(missing(1, 2))"), "QUOTE(missing(1, 2))");
}

#[test]
fn test_unquote_splices_values() {
    assert_eq!(run_inspect("let n = 3; quote(n * unquote(n + 1))"), "QUOTE((n * 4))");
    assert_eq!(run_inspect(r#"quote(unquote("a") + unquote(false))"#), r#"QUOTE(("a" + false))"#);
}

#[test]
fn test_unquote_splices_quoted_code() {
    let source = "let body = quote(x * x); quote(fn(x) { unquote(body) })";
    assert_eq!(run_inspect(source), "QUOTE(fn(x) { (x * x) })");
}

#[test]
fn test_unquote_inside_collections() {
    assert_eq!(run_inspect("quote([unquote(1 + 1), {unquote(2): unquote(3)}])"), "QUOTE([ 2, {2:3} ])");
}

#[test]
fn test_unquote_without_literal_form() {
    assert_eq!(run_inspect("quote(unquote(fn() { 1 }))"), "QUOTE(unquote(fn() { 1 }))");
}

#[test]
fn test_quote_arity() {
    assert_eq!(run_error("quote()"), "wrong number of arguments. got=0, want=1");
}

// ============================================================================
// Macro expansion
// ============================================================================

#[test]
fn test_unless_macro() {
    let source = format!("{} unless(10 > 5, \"not greater\", \"greater\");", UNLESS);
    assert_eq!(run_inspect(&source), "greater");
}

#[test]
fn test_macro_arguments_are_not_evaluated() {
    let source = format!("{} unless(true, missing, 1);", UNLESS);
    assert_eq!(integer(&source), 1);
}

#[test]
fn test_macro_definitions_are_removed() {
    let env = Environment::new();
    let mut program = parse(&format!("{} let x = 1; x", UNLESS)).program;
    define_macros(&mut program, &env);
    assert_eq!(program.statements.len(), 2);
    assert!(env.get("unless").is_some());
}

#[test]
fn test_later_definition_wins() {
    let source = "
        let m = macro() { quote(1) };
        let m = macro() { quote(2) };
        m();";
    assert_eq!(integer(source), 2);
}

#[test]
fn test_macros_are_not_runtime_values() {
    assert_eq!(run_error("let m = macro() { quote(1) }; m"), "identifier not found: m");
}

#[test]
fn test_macro_building_a_function() {
    let source = "
        let defn = macro(params, body) { quote(fn(x) { unquote(body) }) };
        let square = defn(x, x * x);
        square(9);";
    assert_eq!(integer(source), 81);
}

#[test]
fn test_expansion_happens_before_evaluation() {
    let source = "
        let swap = macro(a, b) { quote(unquote(b) - unquote(a)) };
        let x = 10;
        swap(x, 100);";
    assert_eq!(integer(source), 90);
}

#[test]
fn test_macro_can_call_functions_defined_in_macro_body() {
    let source = "
        let twice = macro(e) {
            let wrap = fn(node) { quote(unquote(node) + unquote(node)) };
            wrap(e)
        };
        twice(21);";
    assert_eq!(integer(source), 42);
}

#[test]
fn test_macro_returning_non_quote() {
    let error = parse_and_run("let m = macro() { 5 }; m();").unwrap_err();
    assert_eq!(error, "macro `m` must return a quoted AST node, got INTEGER");
}

#[test]
fn test_macro_error_halts_expansion() {
    let env = Environment::new();
    let mut program = parse("let bad = macro() { true }; bad(); bad();").program;
    define_macros(&mut program, &env);
    assert_eq!(
        expand_macros(program, &env),
        Err(MacroError::NotQuote {
            name: "bad".to_string(),
            got: ObjectType::Boolean,
        })
    );
}

#[test]
fn test_macro_arity_error() {
    let error = parse_and_run("let m = macro(a, b) { a }; m(1);").unwrap_err();
    assert_eq!(error, "macro `m`: wrong number of arguments. got=1, want=2");
}

#[test]
fn test_macros_persist_across_session_lines() {
    let last = run_session(&[
        "let inc = macro(e) { quote(unquote(e) + 1) };",
        "let y = inc(41);",
        "y",
    ]);
    assert_eq!(last.as_deref(), Some("42"));
}

#[test]
fn test_runtime_macro_literal_is_a_value() {
    assert_eq!(run("macro(x) { x }").kind(), ObjectType::Macro);
}
