//! Miscellaneous built-in functions.

use crate::object::Object;
use super::super::error::EvalError;
use super::require_args;

/// Byte length of a string or element count of an array.
pub fn builtin_len(args: &[Object]) -> Result<Object, EvalError> {
    require_args!(args, 1);
    match &args[0] {
        Object::String(value) => Ok(Object::Integer(value.len() as i64)),
        Object::Array(elements) => Ok(Object::Integer(elements.len() as i64)),
        other => Err(EvalError::unsupported_argument("len", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_len() {
        assert_eq!(builtin_len(&[Object::string("")]), Ok(Object::Integer(0)));
        assert_eq!(builtin_len(&[Object::string("four")]), Ok(Object::Integer(4)));
        assert_eq!(builtin_len(&[Object::string("héllo")]), Ok(Object::Integer(6)));
        assert_eq!(
            builtin_len(&[Object::array(vec![Object::Null, Object::Null])]),
            Ok(Object::Integer(2))
        );
    }

    #[test]
    fn test_len_errors() {
        assert_eq!(
            builtin_len(&[Object::Integer(1)]).unwrap_err().to_string(),
            "argument to `len` not supported, got INTEGER"
        );
        assert_eq!(
            builtin_len(&[Object::string("one"), Object::string("two")])
                .unwrap_err()
                .to_string(),
            "wrong number of arguments. got=2, want=1"
        );
    }
}
