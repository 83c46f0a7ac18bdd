use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOperator {
    Bang,
    Minus,
}

impl fmt::Display for PrefixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrefixOperator::Bang => f.write_str("!"),
            PrefixOperator::Minus => f.write_str("-"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOperator {
    Plus,
    Minus,
    Asterisk,
    Slash,
    Lt,
    Gt,
    Eq,
    NotEq,
}

impl fmt::Display for InfixOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self {
            InfixOperator::Plus => "+",
            InfixOperator::Minus => "-",
            InfixOperator::Asterisk => "*",
            InfixOperator::Slash => "/",
            InfixOperator::Lt => "<",
            InfixOperator::Gt => ">",
            InfixOperator::Eq => "==",
            InfixOperator::NotEq => "!=",
        };
        f.write_str(op)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Let { name: String, value: Expression },
    Return(Expression),
    Expression(Expression),
    Block(BlockStatement),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct BlockStatement {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Identifier(String),
    Integer(i64),
    Boolean(bool),
    String(String),
    Prefix {
        operator: PrefixOperator,
        right: Box<Expression>,
    },
    Infix {
        left: Box<Expression>,
        operator: InfixOperator,
        right: Box<Expression>,
    },
    If {
        condition: Box<Expression>,
        consequence: BlockStatement,
        alternative: Option<BlockStatement>,
    },
    Function {
        parameters: Vec<String>,
        body: BlockStatement,
    },
    Call {
        function: Box<Expression>,
        arguments: Vec<Expression>,
    },
    Array(Vec<Expression>),
    Index {
        left: Box<Expression>,
        index: Box<Expression>,
    },
    /// Pairs in source order. Keys are distinct by position, not by value.
    Hash(Vec<(Expression, Expression)>),
    Macro {
        parameters: Vec<String>,
        body: BlockStatement,
    },
}

impl Statement {
    /// Literal of the token the statement starts with.
    pub fn token_literal(&self) -> String {
        match self {
            Statement::Let { .. } => "let".to_string(),
            Statement::Return(_) => "return".to_string(),
            Statement::Expression(expression) => expression.token_literal(),
            Statement::Block(_) => "{".to_string(),
        }
    }
}

impl Expression {
    /// Literal of the token the expression was parsed from.
    pub fn token_literal(&self) -> String {
        match self {
            Expression::Identifier(name) => name.clone(),
            Expression::Integer(value) => value.to_string(),
            Expression::Boolean(value) => value.to_string(),
            Expression::String(value) => value.clone(),
            Expression::Prefix { operator, .. } => operator.to_string(),
            Expression::Infix { operator, .. } => operator.to_string(),
            Expression::If { .. } => "if".to_string(),
            Expression::Function { .. } => "fn".to_string(),
            Expression::Call { .. } => "(".to_string(),
            Expression::Array(_) | Expression::Index { .. } => "[".to_string(),
            Expression::Hash(_) => "{".to_string(),
            Expression::Macro { .. } => "macro".to_string(),
        }
    }
}

fn join<T: fmt::Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Let { name, value } => write!(f, "let {} = {};", name, value),
            Statement::Return(value) => write!(f, "return {};", value),
            Statement::Expression(expression) => write!(f, "{}", expression),
            Statement::Block(block) => write!(f, "{}", block),
        }
    }
}

impl fmt::Display for BlockStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{ ")?;
        for statement in &self.statements {
            write!(f, "{}", statement)?;
        }
        f.write_str(" }")
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Identifier(name) => f.write_str(name),
            Expression::Integer(value) => write!(f, "{}", value),
            Expression::Boolean(value) => write!(f, "{}", value),
            Expression::String(value) => write!(f, "\"{}\"", value),
            Expression::Prefix { operator, right } => write!(f, "({}{})", operator, right),
            Expression::Infix {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", left, operator, right),
            Expression::If {
                condition,
                consequence,
                alternative,
            } => {
                write!(f, "if {} {}", condition, consequence)?;
                if let Some(alternative) = alternative {
                    write!(f, " else {}", alternative)?;
                }
                Ok(())
            }
            Expression::Function { parameters, body } => {
                write!(f, "fn({}) {}", parameters.join(", "), body)
            }
            Expression::Call {
                function,
                arguments,
            } => write!(f, "{}({})", function, join(arguments, ", ")),
            Expression::Array(elements) => write!(f, "[ {} ]", join(elements, ", ")),
            Expression::Index { left, index } => write!(f, "({}[{}])", left, index),
            Expression::Hash(pairs) => {
                let pairs: Vec<String> = pairs
                    .iter()
                    .map(|(key, value)| format!("{}:{}", key, value))
                    .collect();
                write!(f, "{{{}}}", pairs.join(", "))
            }
            Expression::Macro { parameters, body } => {
                write!(f, "macro({}) {}", parameters.join(", "), body)
            }
        }
    }
}

/// Node rewrites applied by [`modify`].
///
/// Every hook receives a node whose children have already been rewritten.
/// Any `FnMut(Expression) -> Expression` closure is a rewriter that leaves
/// statements untouched.
pub trait Rewriter {
    fn rewrite_expression(&mut self, expression: Expression) -> Expression {
        expression
    }

    fn rewrite_statement(&mut self, statement: Statement) -> Statement {
        statement
    }
}

impl<F> Rewriter for F
where
    F: FnMut(Expression) -> Expression,
{
    fn rewrite_expression(&mut self, expression: Expression) -> Expression {
        self(expression)
    }
}

/// A node family that [`modify`] can traverse.
pub trait Modify: Sized {
    fn modify_with<R: Rewriter + ?Sized>(self, rewriter: &mut R) -> Self;
}

/// Rebuilds `node` bottom-up: every child is rewritten before its parent is
/// handed to the rewriter.
pub fn modify<N: Modify, R: Rewriter + ?Sized>(node: N, rewriter: &mut R) -> N {
    node.modify_with(rewriter)
}

fn modify_all<N: Modify, R: Rewriter + ?Sized>(nodes: Vec<N>, rewriter: &mut R) -> Vec<N> {
    nodes
        .into_iter()
        .map(|node| node.modify_with(rewriter))
        .collect()
}

fn modify_boxed<R: Rewriter + ?Sized>(node: Box<Expression>, rewriter: &mut R) -> Box<Expression> {
    Box::new((*node).modify_with(rewriter))
}

// A parameter survives the rewrite only if it is still an identifier.
fn modify_parameters<R: Rewriter + ?Sized>(parameters: Vec<String>, rewriter: &mut R) -> Vec<String> {
    parameters
        .into_iter()
        .map(
            |name| match rewriter.rewrite_expression(Expression::Identifier(name.clone())) {
                Expression::Identifier(rewritten) => rewritten,
                _ => name,
            },
        )
        .collect()
}

impl Modify for Program {
    fn modify_with<R: Rewriter + ?Sized>(self, rewriter: &mut R) -> Self {
        Program {
            statements: modify_all(self.statements, rewriter),
        }
    }
}

impl Modify for BlockStatement {
    fn modify_with<R: Rewriter + ?Sized>(self, rewriter: &mut R) -> Self {
        BlockStatement {
            statements: modify_all(self.statements, rewriter),
        }
    }
}

impl Modify for Statement {
    fn modify_with<R: Rewriter + ?Sized>(self, rewriter: &mut R) -> Self {
        let statement = match self {
            Statement::Let { name, value } => Statement::Let {
                name,
                value: value.modify_with(rewriter),
            },
            Statement::Return(value) => Statement::Return(value.modify_with(rewriter)),
            Statement::Expression(expression) => {
                Statement::Expression(expression.modify_with(rewriter))
            }
            Statement::Block(block) => Statement::Block(block.modify_with(rewriter)),
        };
        rewriter.rewrite_statement(statement)
    }
}

impl Modify for Expression {
    fn modify_with<R: Rewriter + ?Sized>(self, rewriter: &mut R) -> Self {
        let expression = match self {
            leaf @ (Expression::Identifier(_)
            | Expression::Integer(_)
            | Expression::Boolean(_)
            | Expression::String(_)) => leaf,
            Expression::Prefix { operator, right } => Expression::Prefix {
                operator,
                right: modify_boxed(right, rewriter),
            },
            Expression::Infix {
                left,
                operator,
                right,
            } => Expression::Infix {
                left: modify_boxed(left, rewriter),
                operator,
                right: modify_boxed(right, rewriter),
            },
            Expression::If {
                condition,
                consequence,
                alternative,
            } => Expression::If {
                condition: modify_boxed(condition, rewriter),
                consequence: consequence.modify_with(rewriter),
                alternative: alternative.map(|block| block.modify_with(rewriter)),
            },
            Expression::Function { parameters, body } => Expression::Function {
                parameters: modify_parameters(parameters, rewriter),
                body: body.modify_with(rewriter),
            },
            Expression::Call {
                function,
                arguments,
            } => Expression::Call {
                function: modify_boxed(function, rewriter),
                arguments: modify_all(arguments, rewriter),
            },
            Expression::Array(elements) => Expression::Array(modify_all(elements, rewriter)),
            Expression::Index { left, index } => Expression::Index {
                left: modify_boxed(left, rewriter),
                index: modify_boxed(index, rewriter),
            },
            Expression::Hash(pairs) => Expression::Hash(
                pairs
                    .into_iter()
                    .map(|(key, value)| (key.modify_with(rewriter), value.modify_with(rewriter)))
                    .collect(),
            ),
            Expression::Macro { parameters, body } => Expression::Macro {
                parameters: modify_parameters(parameters, rewriter),
                body: body.modify_with(rewriter),
            },
        };
        rewriter.rewrite_expression(expression)
    }
}
