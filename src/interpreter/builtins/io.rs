//! Input/output built-in functions.

use crate::object::{Object, NULL};
use super::super::error::EvalError;
use std::io::{self, Write};

/// Prints each argument's inspect form on its own line.
pub fn builtin_puts(args: &[Object]) -> Result<Object, EvalError> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for arg in args {
        writeln!(out, "{}", arg.inspect()).ok();
    }
    out.flush().ok();
    Ok(NULL)
}
