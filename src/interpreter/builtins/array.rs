//! Array built-in functions. None of them mutate their argument.

use crate::object::{Object, ObjectType, NULL};
use super::super::error::EvalError;
use super::{require_args, with_array};
use std::rc::Rc;

pub fn builtin_first(args: &[Object]) -> Result<Object, EvalError> {
    require_args!(args, 1);
    with_array!(args, "first", |elements: &Rc<Vec<Object>>| {
        Ok(elements.first().cloned().unwrap_or(NULL))
    })
}

pub fn builtin_last(args: &[Object]) -> Result<Object, EvalError> {
    require_args!(args, 1);
    with_array!(args, "last", |elements: &Rc<Vec<Object>>| {
        Ok(elements.last().cloned().unwrap_or(NULL))
    })
}

/// Every element but the first, as a new array; `NULL` for an empty array.
pub fn builtin_rest(args: &[Object]) -> Result<Object, EvalError> {
    require_args!(args, 1);
    with_array!(args, "rest", |elements: &Rc<Vec<Object>>| {
        if elements.is_empty() {
            Ok(NULL)
        } else {
            Ok(Object::array(elements[1..].to_vec()))
        }
    })
}

pub fn builtin_push(args: &[Object]) -> Result<Object, EvalError> {
    require_args!(args, 2);
    with_array!(args, "push", |elements: &Rc<Vec<Object>>| {
        let mut pushed = Vec::with_capacity(elements.len() + 1);
        pushed.extend(elements.iter().cloned());
        pushed.push(args[1].clone());
        Ok(Object::array(pushed))
    })
}
