use crate::diagnostic::Diagnostic;
use crate::object::ObjectType;

/// Failure while evaluating an expression.
///
/// Surfaces to programs as an `ERROR` object carrying the `Display` text.
#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    TypeMismatch {
        left: ObjectType,
        operator: String,
        right: ObjectType,
    },
    UnknownPrefixOperator {
        operator: String,
        right: ObjectType,
    },
    UnknownInfixOperator {
        left: ObjectType,
        operator: String,
        right: ObjectType,
    },
    IdentifierNotFound {
        name: String,
    },
    NotAFunction {
        kind: ObjectType,
    },
    IndexNotSupported {
        kind: ObjectType,
    },
    UnusableAsHashKey {
        kind: ObjectType,
    },
    WrongArgumentCount {
        got: usize,
        want: usize,
    },
    UnsupportedArgument {
        builtin: &'static str,
        got: ObjectType,
    },
    ArgumentMustBe {
        builtin: &'static str,
        expected: ObjectType,
        got: ObjectType,
    },
    DivisionByZero {
        left: i64,
    },
    IntegerOverflow {
        expression: String,
    },
}

impl EvalError {
    pub fn type_mismatch(left: ObjectType, operator: impl ToString, right: ObjectType) -> Self {
        Self::TypeMismatch {
            left,
            operator: operator.to_string(),
            right,
        }
    }

    pub fn unknown_prefix_operator(operator: impl ToString, right: ObjectType) -> Self {
        Self::UnknownPrefixOperator {
            operator: operator.to_string(),
            right,
        }
    }

    pub fn unknown_infix_operator(left: ObjectType, operator: impl ToString, right: ObjectType) -> Self {
        Self::UnknownInfixOperator {
            left,
            operator: operator.to_string(),
            right,
        }
    }

    pub fn identifier_not_found(name: impl Into<String>) -> Self {
        Self::IdentifierNotFound { name: name.into() }
    }

    pub fn not_a_function(kind: ObjectType) -> Self {
        Self::NotAFunction { kind }
    }

    pub fn index_not_supported(kind: ObjectType) -> Self {
        Self::IndexNotSupported { kind }
    }

    pub fn unusable_as_hash_key(kind: ObjectType) -> Self {
        Self::UnusableAsHashKey { kind }
    }

    pub fn wrong_argument_count(got: usize, want: usize) -> Self {
        Self::WrongArgumentCount { got, want }
    }

    pub fn unsupported_argument(builtin: &'static str, got: ObjectType) -> Self {
        Self::UnsupportedArgument { builtin, got }
    }

    pub fn argument_must_be(builtin: &'static str, expected: ObjectType, got: ObjectType) -> Self {
        Self::ArgumentMustBe {
            builtin,
            expected,
            got,
        }
    }

    pub fn division_by_zero(left: i64) -> Self {
        Self::DivisionByZero { left }
    }

    pub fn integer_overflow(expression: impl Into<String>) -> Self {
        Self::IntegerOverflow {
            expression: expression.into(),
        }
    }
}

impl std::fmt::Display for EvalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EvalError::TypeMismatch {
                left,
                operator,
                right,
            } => write!(f, "type mismatch: {} {} {}", left, operator, right),
            EvalError::UnknownPrefixOperator { operator, right } => {
                write!(f, "unknown operator: {}{}", operator, right)
            }
            EvalError::UnknownInfixOperator {
                left,
                operator,
                right,
            } => write!(f, "unknown operator: {} {} {}", left, operator, right),
            EvalError::IdentifierNotFound { name } => write!(f, "identifier not found: {}", name),
            EvalError::NotAFunction { kind } => write!(f, "not a function: {}", kind),
            EvalError::IndexNotSupported { kind } => {
                write!(f, "index operator not supported: {}", kind)
            }
            EvalError::UnusableAsHashKey { kind } => write!(f, "unusable as hash key: {}", kind),
            EvalError::WrongArgumentCount { got, want } => {
                write!(f, "wrong number of arguments. got={}, want={}", got, want)
            }
            EvalError::UnsupportedArgument { builtin, got } => {
                write!(f, "argument to `{}` not supported, got {}", builtin, got)
            }
            EvalError::ArgumentMustBe {
                builtin,
                expected,
                got,
            } => write!(f, "argument to `{}` must be {}, got {}", builtin, expected, got),
            EvalError::DivisionByZero { left } => write!(f, "division by zero: {} / 0", left),
            EvalError::IntegerOverflow { expression } => {
                write!(f, "integer overflow: {}", expression)
            }
        }
    }
}

impl std::error::Error for EvalError {}

/// Failure while expanding a macro call. Expansion stops at the first one.
#[derive(Debug, Clone, PartialEq)]
pub enum MacroError {
    NotQuote { name: String, got: ObjectType },
    WrongArgumentCount { name: String, got: usize, want: usize },
    Evaluation { name: String, source: EvalError },
}

impl MacroError {
    pub fn name(&self) -> &str {
        match self {
            MacroError::NotQuote { name, .. }
            | MacroError::WrongArgumentCount { name, .. }
            | MacroError::Evaluation { name, .. } => name,
        }
    }

    /// Macro errors carry no source span, so the failing call is named in a note.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = match self {
            MacroError::NotQuote { .. } => Diagnostic::error(self.to_string())
                .with_code("E0301")
                .with_help("return a quote(...) expression from the macro body"),
            MacroError::WrongArgumentCount { .. } => {
                Diagnostic::error(self.to_string()).with_code("E0302")
            }
            MacroError::Evaluation { .. } => Diagnostic::error(self.to_string())
                .with_code("E0303")
                .with_note("the macro body is evaluated before the program runs"),
        };
        diagnostic.with_note(format!("in the expansion of `{}(...)`", self.name()))
    }
}

impl std::fmt::Display for MacroError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MacroError::NotQuote { name, got } => write!(
                f,
                "macro `{}` must return a quoted AST node, got {}",
                name, got
            ),
            MacroError::WrongArgumentCount { name, got, want } => write!(
                f,
                "macro `{}`: wrong number of arguments. got={}, want={}",
                name, got, want
            ),
            MacroError::Evaluation { name, source } => {
                write!(f, "macro `{}` failed: {}", name, source)
            }
        }
    }
}

impl std::error::Error for MacroError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MacroError::Evaluation { source, .. } => Some(source),
            _ => None,
        }
    }
}
