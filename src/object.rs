use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::{BlockStatement, Expression};
use crate::interpreter::environment::Environment;
use crate::interpreter::error::EvalError;

pub const TRUE: Object = Object::Boolean(true);
pub const FALSE: Object = Object::Boolean(false);
pub const NULL: Object = Object::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectType {
    Integer,
    Boolean,
    Null,
    String,
    Array,
    Hash,
    Function,
    Builtin,
    ReturnValue,
    Error,
    Quote,
    Macro,
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectType::Integer => "INTEGER",
            ObjectType::Boolean => "BOOLEAN",
            ObjectType::Null => "NULL",
            ObjectType::String => "STRING",
            ObjectType::Array => "ARRAY",
            ObjectType::Hash => "HASH",
            ObjectType::Function => "FUNCTION",
            ObjectType::Builtin => "BUILTIN",
            ObjectType::ReturnValue => "RETURN_VALUE",
            ObjectType::Error => "ERROR",
            ObjectType::Quote => "QUOTE",
            ObjectType::Macro => "MACRO",
        };
        f.write_str(name)
    }
}

pub type BuiltinFunction = fn(&[Object]) -> Result<Object, EvalError>;

#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub function: BuiltinFunction,
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// A user function together with the environment it was defined in.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Environment,
}

pub struct Macro {
    pub parameters: Vec<String>,
    pub body: BlockStatement,
    pub env: Environment,
}

// The captured environment usually contains the function itself.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function(fn({}))", self.parameters.join(", "))
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Macro(macro({}))", self.parameters.join(", "))
    }
}

/// Key under which a hashable object is stored in a `Hash`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Object,
    pub value: Object,
}

#[derive(Debug, Clone)]
pub enum Object {
    Integer(i64),
    Boolean(bool),
    Null,
    String(Rc<str>),
    Array(Rc<Vec<Object>>),
    Hash(Rc<IndexMap<HashKey, HashPair>>),
    Function(Rc<Function>),
    Builtin(Builtin),
    ReturnValue(Box<Object>),
    Error(String),
    Quote(Rc<Expression>),
    Macro(Rc<Macro>),
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Object::Integer(left), Object::Integer(right)) => left == right,
            (Object::Boolean(left), Object::Boolean(right)) => left == right,
            (Object::Null, Object::Null) => true,
            (Object::String(left), Object::String(right)) => left == right,
            (Object::Array(left), Object::Array(right)) => left == right,
            (Object::Hash(left), Object::Hash(right)) => left == right,
            (Object::Function(left), Object::Function(right)) => Rc::ptr_eq(left, right),
            (Object::Builtin(left), Object::Builtin(right)) => left.name == right.name,
            (Object::ReturnValue(left), Object::ReturnValue(right)) => left == right,
            (Object::Error(left), Object::Error(right)) => left == right,
            (Object::Quote(left), Object::Quote(right)) => left == right,
            (Object::Macro(left), Object::Macro(right)) => Rc::ptr_eq(left, right),
            _ => false,
        }
    }
}

impl Object {
    /// Maps a native bool onto the canonical `TRUE`/`FALSE`.
    pub fn native_bool(value: bool) -> Object {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    pub fn string(value: &str) -> Object {
        Object::String(Rc::from(value))
    }

    pub fn array(elements: Vec<Object>) -> Object {
        Object::Array(Rc::new(elements))
    }

    pub fn kind(&self) -> ObjectType {
        match self {
            Object::Integer(_) => ObjectType::Integer,
            Object::Boolean(_) => ObjectType::Boolean,
            Object::Null => ObjectType::Null,
            Object::String(_) => ObjectType::String,
            Object::Array(_) => ObjectType::Array,
            Object::Hash(_) => ObjectType::Hash,
            Object::Function(_) => ObjectType::Function,
            Object::Builtin(_) => ObjectType::Builtin,
            Object::ReturnValue(_) => ObjectType::ReturnValue,
            Object::Error(_) => ObjectType::Error,
            Object::Quote(_) => ObjectType::Quote,
            Object::Macro(_) => ObjectType::Macro,
        }
    }

    /// Everything except `NULL` and `FALSE` is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Object::Null | Object::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Object::Error(_))
    }

    /// `None` for objects that cannot be used as hash keys.
    pub fn hash_key(&self) -> Option<HashKey> {
        match self {
            Object::Integer(value) => Some(HashKey::Integer(*value)),
            Object::Boolean(value) => Some(HashKey::Boolean(*value)),
            Object::String(value) => Some(HashKey::String(value.clone())),
            _ => None,
        }
    }

    pub fn inspect(&self) -> String {
        self.to_string()
    }
}

fn write_body(f: &mut fmt::Formatter<'_>, body: &BlockStatement) -> fmt::Result {
    f.write_str(" {\n")?;
    for statement in &body.statements {
        write!(f, "{}", statement)?;
    }
    f.write_str("\n}")
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Integer(value) => write!(f, "{}", value),
            Object::Boolean(value) => write!(f, "{}", value),
            Object::Null => f.write_str("null"),
            Object::String(value) => f.write_str(value),
            Object::Array(elements) => {
                let elements: Vec<String> = elements.iter().map(Object::inspect).collect();
                write!(f, "[{}]", elements.join(", "))
            }
            Object::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .values()
                    .map(|pair| format!("{}: {}", pair.key, pair.value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Object::Function(function) => {
                write!(f, "fn({})", function.parameters.join(", "))?;
                write_body(f, &function.body)
            }
            Object::Builtin(_) => f.write_str("builtin function"),
            Object::ReturnValue(value) => write!(f, "{}", value),
            Object::Error(message) => write!(f, "ERROR: {}", message),
            Object::Quote(node) => write!(f, "QUOTE({})", node),
            Object::Macro(definition) => {
                write!(f, "macro({})", definition.parameters.join(", "))?;
                write_body(f, &definition.body)
            }
        }
    }
}

impl From<EvalError> for Object {
    fn from(error: EvalError) -> Self {
        Object::Error(error.to_string())
    }
}
