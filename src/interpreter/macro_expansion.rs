use crate::ast::{modify, Expression, Program, Statement};
use crate::object::{Macro, Object};
use super::environment::Environment;
use super::error::MacroError;
use super::evaluator::{bind_arguments, eval_block};
use std::rc::Rc;

/// Moves every top-level `let <name> = macro(...) {...};` out of `program`
/// and binds it in `env`. Other statements keep their order.
///
/// Macro definitions nested in blocks or functions are left alone.
pub fn define_macros(program: &mut Program, env: &Environment) {
    let statements = std::mem::take(&mut program.statements);
    for statement in statements {
        match statement {
            Statement::Let {
                name,
                value: Expression::Macro { parameters, body },
            } => {
                let definition = Macro {
                    parameters,
                    body,
                    env: env.clone(),
                };
                env.set(name, Object::Macro(Rc::new(definition)));
            }
            other => program.statements.push(other),
        }
    }
}

/// Replaces every call to a macro bound in `env` with the code the macro
/// returns.
///
/// Arguments reach the macro unevaluated, as quoted nodes. Expansion stops
/// at the first failing call and no partially expanded program is returned.
pub fn expand_macros(program: Program, env: &Environment) -> Result<Program, MacroError> {
    let mut failure = None;
    let expanded = modify(program, &mut |expression: Expression| {
        if failure.is_some() {
            return expression;
        }
        let Some((name, definition)) = macro_call(&expression, env) else {
            return expression;
        };
        let Expression::Call { arguments, .. } = &expression else {
            return expression;
        };
        match expand_call(&name, &definition, arguments) {
            Ok(node) => node,
            Err(error) => {
                failure = Some(error);
                expression
            }
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(expanded),
    }
}

// The callee must be a plain identifier that resolves to a macro.
fn macro_call(expression: &Expression, env: &Environment) -> Option<(String, Rc<Macro>)> {
    let Expression::Call { function, .. } = expression else {
        return None;
    };
    let Expression::Identifier(name) = function.as_ref() else {
        return None;
    };
    match env.get(name)? {
        Object::Macro(definition) => Some((name.clone(), definition)),
        _ => None,
    }
}

fn expand_call(name: &str, definition: &Macro, arguments: &[Expression]) -> Result<Expression, MacroError> {
    let quoted = arguments
        .iter()
        .map(|argument| Object::Quote(Rc::new(argument.clone())))
        .collect();
    let env = bind_arguments(&definition.parameters, quoted, &definition.env).map_err(|_| {
        MacroError::WrongArgumentCount {
            name: name.to_string(),
            got: arguments.len(),
            want: definition.parameters.len(),
        }
    })?;
    let result = eval_block(&definition.body, &env).map_err(|source| MacroError::Evaluation {
        name: name.to_string(),
        source,
    })?;
    match result {
        Object::ReturnValue(value) => into_node(name, *value),
        value => into_node(name, value),
    }
}

fn into_node(name: &str, value: Object) -> Result<Expression, MacroError> {
    match value {
        Object::Quote(node) => Ok(Rc::try_unwrap(node).unwrap_or_else(|node| (*node).clone())),
        other => Err(MacroError::NotQuote {
            name: name.to_string(),
            got: other.kind(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::error::EvalError;
    use crate::interpreter::parser::parse;
    use crate::object::ObjectType;

    fn parse_program(source: &str) -> Program {
        let result = parse(source);
        assert!(result.is_ok(), "parser errors: {:?}", result.error_messages());
        result.program
    }

    fn expand(source: &str) -> Result<Program, MacroError> {
        let env = Environment::new();
        let mut program = parse_program(source);
        define_macros(&mut program, &env);
        expand_macros(program, &env)
    }

    #[test]
    fn test_define_macros() {
        let source = "
            let number = 1;
            let function = fn(x, y) { x + y };
            let mymacro = macro(x, y) { x + y; };";
        let env = Environment::new();
        let mut program = parse_program(source);
        define_macros(&mut program, &env);

        assert_eq!(program.statements.len(), 2);
        assert_eq!(env.get("number"), None);
        assert_eq!(env.get("function"), None);

        match env.get("mymacro") {
            Some(Object::Macro(definition)) => {
                assert_eq!(definition.parameters, vec!["x", "y"]);
                assert_eq!(definition.body.to_string(), "{ (x + y) }");
            }
            other => panic!("expected macro, got {:?}", other),
        }
    }

    #[test]
    fn test_nested_macro_definitions_stay_in_place() {
        let env = Environment::new();
        let mut program = parse_program("if (true) { let m = macro() { quote(1) }; }");
        define_macros(&mut program, &env);
        assert_eq!(program.statements.len(), 1);
        assert_eq!(env.get("m"), None);
    }

    #[test]
    fn test_expand_macros() {
        let cases = [
            (
                "let infixExpression = macro() { quote(1 + 2); };
                 infixExpression();",
                "(1 + 2)",
            ),
            (
                "let reverse = macro(a, b) { quote(unquote(b) - unquote(a)); };
                 reverse(2 + 2, 10 - 5);",
                "(10 - 5) - (2 + 2)",
            ),
            (
                r#"let unless = macro(condition, consequence, alternative) {
                     quote(if (!(unquote(condition))) {
                         unquote(consequence);
                     } else {
                         unquote(alternative);
                     });
                 };
                 unless(10 > 5, puts("not greater"), puts("greater"));"#,
                r#"if (!(10 > 5)) { puts("not greater") } else { puts("greater") }"#,
            ),
        ];
        for (source, expected) in cases {
            let expanded = expand(source).expect("expansion succeeds");
            let expected = parse_program(expected);
            assert_eq!(expanded.to_string(), expected.to_string(), "source {:?}", source);
        }
    }

    #[test]
    fn test_expansion_inside_nested_calls() {
        let expanded = expand("let one = macro() { quote(1) }; [one(), f(one())]").unwrap();
        assert_eq!(expanded.to_string(), "[ 1, f(1) ]");
    }

    #[test]
    fn test_macro_must_return_quote() {
        let error = expand("let bad = macro() { 1 }; bad();").unwrap_err();
        assert_eq!(
            error,
            MacroError::NotQuote {
                name: "bad".to_string(),
                got: ObjectType::Integer,
            }
        );
    }

    #[test]
    fn test_macro_arity_mismatch() {
        let error = expand("let m = macro(a) { a }; m();").unwrap_err();
        assert_eq!(
            error,
            MacroError::WrongArgumentCount {
                name: "m".to_string(),
                got: 0,
                want: 1,
            }
        );
    }

    #[test]
    fn test_macro_body_error() {
        let error = expand("let m = macro() { missing }; m();").unwrap_err();
        assert_eq!(
            error,
            MacroError::Evaluation {
                name: "m".to_string(),
                source: EvalError::identifier_not_found("missing"),
            }
        );
    }

    #[test]
    fn test_return_in_macro_body() {
        let expanded = expand("let m = macro(x) { return quote(unquote(x) * 2); }; m(3)").unwrap();
        assert_eq!(expanded.to_string(), "(3 * 2)");
    }

    #[test]
    fn test_non_macro_calls_untouched() {
        let expanded = expand("let f = fn(x) { x }; f(1)").unwrap();
        assert_eq!(expanded.to_string(), "let f = fn(x) { x };f(1)");
    }
}
