//! Built-in functions available to every program.
//!
//! Functions are organized into categories:
//! - **Array**: element access and non-mutating updates (first, last, rest, push)
//! - **Misc**: size queries (len)
//! - **IO**: output (puts)
//!
//! Builtins check their own arity and argument types and report violations
//! as [`EvalError`]s, which reach programs as `ERROR` objects.

mod array;
mod io;
mod misc;

pub use array::*;
pub use io::*;
pub use misc::*;

use crate::object::{Builtin, BuiltinFunction};

const BUILTINS: &[(&str, BuiltinFunction)] = &[
    ("len", builtin_len),
    ("first", builtin_first),
    ("last", builtin_last),
    ("rest", builtin_rest),
    ("push", builtin_push),
    ("puts", builtin_puts),
];

/// Looks up a builtin by the name programs call it with.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(builtin_name, _)| *builtin_name == name)
        .map(|&(name, function)| Builtin { name, function })
}

pub fn names() -> impl Iterator<Item = &'static str> {
    BUILTINS.iter().map(|(name, _)| *name)
}

macro_rules! require_args {
    ($args:expr, $n:expr) => {
        if $args.len() != $n {
            return Err(EvalError::wrong_argument_count($args.len(), $n));
        }
    };
}

macro_rules! with_array {
    ($args:expr, $name:expr, $body:expr) => {
        match &$args[0] {
            Object::Array(elements) => $body(elements),
            other => Err(EvalError::argument_must_be(
                $name,
                ObjectType::Array,
                other.kind(),
            )),
        }
    };
}

pub(crate) use require_args;
pub(crate) use with_array;
