use crate::ast::{
    modify, BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement,
};
use crate::object::{Function, HashPair, Macro, Object, NULL};
use super::builtins;
use super::environment::Environment;
use super::error::EvalError;
use indexmap::IndexMap;
use std::rc::Rc;

/// Callee name the evaluator treats as the quoting form.
pub const QUOTE: &str = "quote";

/// Callee name that splices a value back into quoted code.
pub const UNQUOTE: &str = "unquote";

pub type EvalResult = Result<Object, EvalError>;

/// Evaluates a program and returns its value, with errors as `ERROR` objects.
///
/// A program whose last statement binds a name produces no value and
/// evaluates to `NULL`.
pub fn eval(program: &Program, env: &Environment) -> Object {
    eval_program(program, env).unwrap_or(NULL)
}

/// Like [`eval`], but `None` when the program produced no value.
pub fn eval_program(program: &Program, env: &Environment) -> Option<Object> {
    match eval_statements(&program.statements, env) {
        Ok(Some(Object::ReturnValue(value))) => Some(*value),
        Ok(result) => result,
        Err(error) => Some(error.into()),
    }
}

// Stops at the first `return`, leaving the value wrapped for the caller.
fn eval_statements(statements: &[Statement], env: &Environment) -> Result<Option<Object>, EvalError> {
    let mut result = None;
    for statement in statements {
        result = eval_statement(statement, env)?;
        if let Some(Object::ReturnValue(_)) = result {
            break;
        }
    }
    Ok(result)
}

pub fn eval_block(block: &BlockStatement, env: &Environment) -> EvalResult {
    Ok(eval_statements(&block.statements, env)?.unwrap_or(NULL))
}

fn eval_statement(statement: &Statement, env: &Environment) -> Result<Option<Object>, EvalError> {
    match statement {
        Statement::Let { name, value } => {
            let value = eval_expression(value, env)?;
            env.set(name.clone(), value);
            Ok(None)
        }
        Statement::Return(value) => {
            let value = eval_expression(value, env)?;
            Ok(Some(Object::ReturnValue(Box::new(value))))
        }
        Statement::Expression(expression) => eval_expression(expression, env).map(Some),
        Statement::Block(block) => eval_block(block, env).map(Some),
    }
}

pub fn eval_expression(expression: &Expression, env: &Environment) -> EvalResult {
    match expression {
        Expression::Integer(value) => Ok(Object::Integer(*value)),
        Expression::Boolean(value) => Ok(Object::native_bool(*value)),
        Expression::String(value) => Ok(Object::string(value)),
        Expression::Identifier(name) => eval_identifier(name, env),
        Expression::Prefix { operator, right } => {
            let right = eval_expression(right, env)?;
            eval_prefix_expression(*operator, right)
        }
        Expression::Infix {
            left,
            operator,
            right,
        } => {
            let left = eval_expression(left, env)?;
            let right = eval_expression(right, env)?;
            eval_infix_expression(*operator, left, right)
        }
        Expression::If {
            condition,
            consequence,
            alternative,
        } => {
            let condition = eval_expression(condition, env)?;
            if condition.is_truthy() {
                eval_block(consequence, env)
            } else if let Some(alternative) = alternative {
                eval_block(alternative, env)
            } else {
                Ok(NULL)
            }
        }
        Expression::Function { parameters, body } => Ok(Object::Function(Rc::new(Function {
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        }))),
        Expression::Macro { parameters, body } => Ok(Object::Macro(Rc::new(Macro {
            parameters: parameters.clone(),
            body: body.clone(),
            env: env.clone(),
        }))),
        Expression::Call {
            function,
            arguments,
        } => {
            if matches!(function.as_ref(), Expression::Identifier(name) if name == QUOTE) {
                return eval_quote(arguments, env);
            }
            let function = eval_expression(function, env)?;
            let arguments = eval_expressions(arguments, env)?;
            apply_function(&function, arguments)
        }
        Expression::Array(elements) => Ok(Object::array(eval_expressions(elements, env)?)),
        Expression::Index { left, index } => {
            let left = eval_expression(left, env)?;
            let index = eval_expression(index, env)?;
            eval_index_expression(&left, &index)
        }
        Expression::Hash(pairs) => eval_hash_literal(pairs, env),
    }
}

fn eval_expressions(expressions: &[Expression], env: &Environment) -> Result<Vec<Object>, EvalError> {
    expressions
        .iter()
        .map(|expression| eval_expression(expression, env))
        .collect()
}

fn eval_identifier(name: &str, env: &Environment) -> EvalResult {
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    builtins::lookup(name)
        .map(Object::Builtin)
        .ok_or_else(|| EvalError::identifier_not_found(name))
}

fn eval_prefix_expression(operator: PrefixOperator, right: Object) -> EvalResult {
    match operator {
        PrefixOperator::Bang => Ok(Object::native_bool(!right.is_truthy())),
        PrefixOperator::Minus => match right {
            Object::Integer(value) => value
                .checked_neg()
                .map(Object::Integer)
                .ok_or_else(|| EvalError::integer_overflow(format!("-{}", value))),
            other => Err(EvalError::unknown_prefix_operator(operator, other.kind())),
        },
    }
}

fn eval_infix_expression(operator: InfixOperator, left: Object, right: Object) -> EvalResult {
    match (&left, &right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix_expression(operator, *l, *r),
        (Object::String(l), Object::String(r)) => match operator {
            InfixOperator::Plus => Ok(Object::string(&format!("{}{}", l, r))),
            _ => Err(EvalError::unknown_infix_operator(left.kind(), operator, right.kind())),
        },
        _ => match operator {
            InfixOperator::Eq => Ok(Object::native_bool(identical(&left, &right))),
            InfixOperator::NotEq => Ok(Object::native_bool(!identical(&left, &right))),
            _ if left.kind() != right.kind() => {
                Err(EvalError::type_mismatch(left.kind(), operator, right.kind()))
            }
            _ => Err(EvalError::unknown_infix_operator(left.kind(), operator, right.kind())),
        },
    }
}

fn eval_integer_infix_expression(operator: InfixOperator, left: i64, right: i64) -> EvalResult {
    let overflow = || EvalError::integer_overflow(format!("{} {} {}", left, operator, right));
    match operator {
        InfixOperator::Plus => left.checked_add(right).map(Object::Integer).ok_or_else(overflow),
        InfixOperator::Minus => left.checked_sub(right).map(Object::Integer).ok_or_else(overflow),
        InfixOperator::Asterisk => left.checked_mul(right).map(Object::Integer).ok_or_else(overflow),
        InfixOperator::Slash => {
            if right == 0 {
                return Err(EvalError::division_by_zero(left));
            }
            floor_div(left, right).map(Object::Integer).ok_or_else(overflow)
        }
        InfixOperator::Lt => Ok(Object::native_bool(left < right)),
        InfixOperator::Gt => Ok(Object::native_bool(left > right)),
        InfixOperator::Eq => Ok(Object::native_bool(left == right)),
        InfixOperator::NotEq => Ok(Object::native_bool(left != right)),
    }
}

/// Division rounding toward negative infinity.
fn floor_div(left: i64, right: i64) -> Option<i64> {
    let quotient = left.checked_div(right)?;
    if left % right != 0 && (left < 0) != (right < 0) {
        Some(quotient - 1)
    } else {
        Some(quotient)
    }
}

/// Identity for operands that are not both integers or both strings:
/// booleans and null by value, heap objects by reference.
fn identical(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        (Object::Array(l), Object::Array(r)) => Rc::ptr_eq(l, r),
        (Object::Hash(l), Object::Hash(r)) => Rc::ptr_eq(l, r),
        (Object::Function(l), Object::Function(r)) => Rc::ptr_eq(l, r),
        (Object::Builtin(l), Object::Builtin(r)) => l.name == r.name,
        (Object::Quote(l), Object::Quote(r)) => Rc::ptr_eq(l, r),
        (Object::Macro(l), Object::Macro(r)) => Rc::ptr_eq(l, r),
        _ => false,
    }
}

fn eval_index_expression(left: &Object, index: &Object) -> EvalResult {
    match (left, index) {
        (Object::Array(elements), Object::Integer(position)) => Ok(usize::try_from(*position)
            .ok()
            .and_then(|position| elements.get(position))
            .cloned()
            .unwrap_or(NULL)),
        (Object::Hash(pairs), _) => {
            let key = index
                .hash_key()
                .ok_or_else(|| EvalError::unusable_as_hash_key(index.kind()))?;
            Ok(pairs.get(&key).map(|pair| pair.value.clone()).unwrap_or(NULL))
        }
        _ => Err(EvalError::index_not_supported(left.kind())),
    }
}

fn eval_hash_literal(pairs: &[(Expression, Expression)], env: &Environment) -> EvalResult {
    let mut evaluated = IndexMap::with_capacity(pairs.len());
    for (key_node, value_node) in pairs {
        let key = eval_expression(key_node, env)?;
        let hash_key = key
            .hash_key()
            .ok_or_else(|| EvalError::unusable_as_hash_key(key.kind()))?;
        let value = eval_expression(value_node, env)?;
        evaluated.insert(hash_key, HashPair { key, value });
    }
    Ok(Object::Hash(Rc::new(evaluated)))
}

/// Calls a function or builtin with already-evaluated arguments.
pub fn apply_function(function: &Object, arguments: Vec<Object>) -> EvalResult {
    match function {
        Object::Function(function) => {
            let env = bind_arguments(&function.parameters, arguments, &function.env)?;
            match eval_block(&function.body, &env)? {
                Object::ReturnValue(value) => Ok(*value),
                value => Ok(value),
            }
        }
        Object::Builtin(builtin) => (builtin.function)(&arguments),
        other => Err(EvalError::not_a_function(other.kind())),
    }
}

/// Creates the scope for one call: a child of `outer` with each parameter
/// bound to its argument.
pub(crate) fn bind_arguments(
    parameters: &[String],
    arguments: Vec<Object>,
    outer: &Environment,
) -> Result<Environment, EvalError> {
    if parameters.len() != arguments.len() {
        return Err(EvalError::wrong_argument_count(arguments.len(), parameters.len()));
    }
    let env = Environment::enclosed(outer);
    for (parameter, argument) in parameters.iter().zip(arguments) {
        env.set(parameter.clone(), argument);
    }
    Ok(env)
}

fn eval_quote(arguments: &[Expression], env: &Environment) -> EvalResult {
    let [node] = arguments else {
        return Err(EvalError::wrong_argument_count(arguments.len(), 1));
    };
    let node = eval_unquote_calls(node.clone(), env)?;
    Ok(Object::Quote(Rc::new(node)))
}

/// Replaces every `unquote(x)` inside `quoted` with the literal form of `x`'s value.
fn eval_unquote_calls(quoted: Expression, env: &Environment) -> Result<Expression, EvalError> {
    let mut failure = None;
    let node = modify(quoted, &mut |expression: Expression| {
        if failure.is_some() {
            return expression;
        }
        let argument = match &expression {
            Expression::Call {
                function,
                arguments,
            } if arguments.len() == 1
                && matches!(function.as_ref(), Expression::Identifier(name) if name == UNQUOTE) =>
            {
                &arguments[0]
            }
            _ => return expression,
        };
        match eval_expression(argument, env) {
            Ok(value) => object_to_node(value).unwrap_or(expression),
            Err(error) => {
                failure = Some(error);
                expression
            }
        }
    });
    match failure {
        Some(error) => Err(error),
        None => Ok(node),
    }
}

/// Literal syntax for a value, if it has one.
fn object_to_node(object: Object) -> Option<Expression> {
    match object {
        Object::Integer(value) => Some(Expression::Integer(value)),
        Object::Boolean(value) => Some(Expression::Boolean(value)),
        Object::String(value) => Some(Expression::String(value.to_string())),
        Object::Quote(node) => Some(Rc::try_unwrap(node).unwrap_or_else(|node| (*node).clone())),
        _ => None,
    }
}
