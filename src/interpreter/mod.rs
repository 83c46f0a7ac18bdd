pub mod parser;
pub mod environment;
pub mod error;
pub mod builtins;
pub mod evaluator;
pub mod macro_expansion;

pub use environment::Environment;
pub use error::{EvalError, MacroError};
pub use evaluator::{eval, eval_program};
pub use macro_expansion::{define_macros, expand_macros};
pub use parser::{parse, ParseError, ParseResult, Parser};

use crate::diagnostic::Diagnostic;
use crate::object::Object;
use std::fmt;

/// Why a chunk of source never reached evaluation.
#[derive(Debug, Clone)]
pub enum RunError {
    Parse(Vec<ParseError>),
    Macro(MacroError),
}

impl RunError {
    pub fn to_diagnostics(&self) -> Vec<Diagnostic> {
        match self {
            RunError::Parse(errors) => errors.iter().map(ParseError::to_diagnostic).collect(),
            RunError::Macro(error) => vec![error.to_diagnostic()],
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Parse(errors) => {
                let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
                write!(f, "parser errors: {}", messages.join("; "))
            }
            RunError::Macro(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for RunError {}

/// Parse, macro expansion and evaluation over environments that outlive a
/// single chunk of source, so later lines see earlier bindings and macros.
pub struct Interpreter {
    env: Environment,
    macro_env: Environment,
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            macro_env: Environment::new(),
        }
    }

    /// Runs one chunk of source. Runtime errors come back as `ERROR`
    /// objects; `None` means the chunk produced no value.
    pub fn run(&mut self, source: &str) -> Result<Option<Object>, RunError> {
        let ParseResult { mut program, errors } = parse(source);
        if !errors.is_empty() {
            return Err(RunError::Parse(errors));
        }
        // New definitions only become visible to later runs if expansion succeeds.
        let definitions = Environment::enclosed(&self.macro_env);
        define_macros(&mut program, &definitions);
        let expanded = expand_macros(program, &definitions).map_err(RunError::Macro)?;
        for name in definitions.local_names() {
            if let Some(definition) = definitions.get(&name) {
                self.macro_env.set(name, definition);
            }
        }
        Ok(eval_program(&expanded, &self.env))
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_and_run(source: &str) -> Result<Option<Object>, String> {
    Interpreter::new().run(source).map_err(|e| e.to_string())
}

pub fn parse_and_run_with_diagnostics(source: &str) -> Result<Option<Object>, Vec<Diagnostic>> {
    Interpreter::new()
        .run(source)
        .map_err(|e| e.to_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_persist_across_runs() {
        let mut interpreter = Interpreter::new();
        assert_eq!(interpreter.run("let x = 5;").unwrap(), None);
        assert_eq!(interpreter.run("x * 2").unwrap(), Some(Object::Integer(10)));
    }

    #[test]
    fn test_macros_persist_across_runs() {
        let mut interpreter = Interpreter::new();
        interpreter
            .run("let twice = macro(x) { quote(unquote(x) + unquote(x)) };")
            .unwrap();
        assert_eq!(interpreter.run("twice(21)").unwrap(), Some(Object::Integer(42)));
        assert_eq!(interpreter.env().get("twice"), None);
    }

    #[test]
    fn test_failed_expansion_discards_definitions() {
        let mut interpreter = Interpreter::new();
        interpreter.run("let ok = macro() { quote(1) };").unwrap();

        let failed = interpreter.run("let m = macro() { 1 }; let ok = macro() { quote(2) }; m()");
        assert!(matches!(failed, Err(RunError::Macro(_))));

        assert_eq!(
            interpreter.run("m()").unwrap(),
            Some(Object::Error("identifier not found: m".to_string()))
        );
        assert_eq!(interpreter.run("ok()").unwrap(), Some(Object::Integer(1)));
    }

    #[test]
    fn test_parse_errors_stop_evaluation() {
        let mut interpreter = Interpreter::new();
        match interpreter.run("let x = 1; let = 2;") {
            Err(RunError::Parse(errors)) => assert!(!errors.is_empty()),
            other => panic!("expected parse errors, got {:?}", other),
        }
        assert_eq!(interpreter.env().get("x"), None);
    }

    #[test]
    fn test_runtime_error_is_a_value() {
        let result = parse_and_run("1 + true").unwrap();
        assert_eq!(
            result,
            Some(Object::Error("type mismatch: INTEGER + BOOLEAN".to_string()))
        );
    }

    #[test]
    fn test_macro_failure_is_reported() {
        let diagnostics = parse_and_run_with_diagnostics("let m = macro() { 1 }; m()").unwrap_err();
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].code.as_deref(), Some("E0301"));
    }

    #[test]
    fn test_parse_error_diagnostics() {
        let diagnostics = parse_and_run_with_diagnostics("let x 5;").unwrap_err();
        assert_eq!(diagnostics[0].code.as_deref(), Some("E0101"));
        assert_eq!(diagnostics[0].labels.len(), 1);
    }
}
