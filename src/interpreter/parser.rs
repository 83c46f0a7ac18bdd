use crate::ast::{BlockStatement, Expression, InfixOperator, PrefixOperator, Program, Statement};
use crate::diagnostic::{Diagnostic, Label, Span};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

/// Binding power of an operator token, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    fn of(kind: TokenKind) -> Self {
        match kind {
            TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
            TokenKind::Lt | TokenKind::Gt => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Asterisk | TokenKind::Slash => Precedence::Product,
            TokenKind::LParen => Precedence::Call,
            TokenKind::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    pub span: Span,
    pub expected: Option<TokenKind>,
    pub found: Option<TokenKind>,
    /// Where the unclosed delimiter was opened, for unterminated blocks.
    pub opened_at: Option<Span>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            expected: None,
            found: None,
            opened_at: None,
        }
    }

    pub fn with_expected(mut self, expected: TokenKind) -> Self {
        self.expected = Some(expected);
        self
    }

    pub fn with_found(mut self, found: TokenKind) -> Self {
        self.found = Some(found);
        self
    }

    pub fn with_opened_at(mut self, opened_at: Span) -> Self {
        self.opened_at = Some(opened_at);
        self
    }

    pub fn unexpected_token(expected: TokenKind, found: TokenKind, span: Span) -> Self {
        Self::new(
            format!("expected next token to be {}, got {} instead", expected, found),
            span,
        )
        .with_expected(expected)
        .with_found(found)
    }

    pub fn no_prefix_parse_fn(found: TokenKind, span: Span) -> Self {
        Self::new(format!("no prefix parse function for {} found", found), span).with_found(found)
    }

    pub fn invalid_integer(literal: &str, span: Span) -> Self {
        Self::new(format!("could not parse {} as integer", literal), span)
    }

    pub fn to_diagnostic(&self) -> Diagnostic {
        match (self.expected, self.found) {
            (Some(expected), _) => {
                let diagnostic = Diagnostic::error(&self.message)
                    .with_code("E0101")
                    .with_label(Label::primary(self.span, format!("expected `{}` here", expected)));
                match self.opened_at {
                    Some(opened_at) => diagnostic.with_label(Label::secondary(opened_at, "unclosed block starts here")),
                    None => diagnostic,
                }
            }
            (None, Some(_)) => Diagnostic::error(&self.message)
                .with_code("E0102")
                .with_label(Label::primary(self.span, "cannot start an expression")),
            (None, None) => Diagnostic::error(&self.message)
                .with_code("E0103")
                .with_label(Label::primary(self.span, "out of range for a 64-bit integer")),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

#[derive(Debug)]
pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<ParseError>,
}

impl ParseResult {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(ToString::to_string).collect()
    }
}

type PrefixParseFn = fn(&mut Parser) -> Option<Expression>;
type InfixParseFn = fn(&mut Parser, Expression) -> Option<Expression>;

/// Parses a whole source text. Evaluation must not proceed unless
/// `errors` is empty.
pub fn parse(source: &str) -> ParseResult {
    let mut parser = Parser::new(Lexer::new(source));
    let program = parser.parse_program();
    ParseResult {
        program,
        errors: parser.errors,
    }
}

/// Pratt parser over a [`Lexer`].
///
/// A failed sub-parse records an error and yields `None`; the caller drops
/// the enclosing node and parsing resumes at the next token.
pub struct Parser {
    lexer: Lexer,
    current: SpannedToken,
    peek: SpannedToken,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let (token, span) = lexer.next_spanned();
        let current = SpannedToken { token, span };
        let (token, span) = lexer.next_spanned();
        let peek = SpannedToken { token, span };
        Self {
            lexer,
            current,
            peek,
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn next_token(&mut self) {
        let (token, span) = self.lexer.next_spanned();
        self.current = std::mem::replace(&mut self.peek, SpannedToken { token, span });
    }

    fn current_is(&self, kind: TokenKind) -> bool {
        self.current.token.is(kind)
    }

    fn peek_is(&self, kind: TokenKind) -> bool {
        self.peek.token.is(kind)
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek_is(kind) {
            self.next_token();
            true
        } else {
            self.errors.push(ParseError::unexpected_token(
                kind,
                self.peek.token.kind,
                self.peek.span,
            ));
            false
        }
    }

    fn peek_precedence(&self) -> Precedence {
        Precedence::of(self.peek.token.kind)
    }

    fn current_precedence(&self) -> Precedence {
        Precedence::of(self.current.token.kind)
    }

    pub fn parse_program(&mut self) -> Program {
        let mut program = Program::default();
        while !self.current_is(TokenKind::Eof) {
            if let Some(statement) = self.parse_statement() {
                program.statements.push(statement);
            }
            self.next_token();
        }
        program
    }

    fn parse_statement(&mut self) -> Option<Statement> {
        match self.current.token.kind {
            TokenKind::Let => self.parse_let_statement(),
            TokenKind::Return => self.parse_return_statement(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_let_statement(&mut self) -> Option<Statement> {
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.current.token.literal.clone();

        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Let { name, value })
    }

    fn parse_return_statement(&mut self) -> Option<Statement> {
        self.next_token();

        let value = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Return(value))
    }

    fn parse_expression_statement(&mut self) -> Option<Statement> {
        let expression = self.parse_expression(Precedence::Lowest)?;
        if self.peek_is(TokenKind::Semicolon) {
            self.next_token();
        }
        Some(Statement::Expression(expression))
    }

    fn prefix_parse_fn(kind: TokenKind) -> Option<PrefixParseFn> {
        let parse: PrefixParseFn = match kind {
            TokenKind::Ident => Parser::parse_identifier,
            TokenKind::Int => Parser::parse_integer_literal,
            TokenKind::String => Parser::parse_string_literal,
            TokenKind::Bang | TokenKind::Minus => Parser::parse_prefix_expression,
            TokenKind::True | TokenKind::False => Parser::parse_boolean,
            TokenKind::LParen => Parser::parse_grouped_expression,
            TokenKind::If => Parser::parse_if_expression,
            TokenKind::Function => Parser::parse_function_literal,
            TokenKind::LBracket => Parser::parse_array_literal,
            TokenKind::LBrace => Parser::parse_hash_literal,
            TokenKind::Macro => Parser::parse_macro_literal,
            _ => return None,
        };
        Some(parse)
    }

    fn infix_parse_fn(kind: TokenKind) -> Option<InfixParseFn> {
        let parse: InfixParseFn = match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Asterisk
            | TokenKind::Slash
            | TokenKind::Eq
            | TokenKind::NotEq
            | TokenKind::Lt
            | TokenKind::Gt => Parser::parse_infix_expression,
            TokenKind::LParen => Parser::parse_call_expression,
            TokenKind::LBracket => Parser::parse_index_expression,
            _ => return None,
        };
        Some(parse)
    }

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expression> {
        let Some(prefix) = Self::prefix_parse_fn(self.current.token.kind) else {
            self.errors.push(ParseError::no_prefix_parse_fn(
                self.current.token.kind,
                self.current.span,
            ));
            return None;
        };
        let mut left = prefix(self)?;

        while !self.peek_is(TokenKind::Semicolon) && precedence < self.peek_precedence() {
            let Some(infix) = Self::infix_parse_fn(self.peek.token.kind) else {
                return Some(left);
            };
            self.next_token();
            left = infix(self, left)?;
        }
        Some(left)
    }

    fn parse_identifier(&mut self) -> Option<Expression> {
        Some(Expression::Identifier(self.current.token.literal.clone()))
    }

    fn parse_integer_literal(&mut self) -> Option<Expression> {
        match self.current.token.literal.parse::<i64>() {
            Ok(value) => Some(Expression::Integer(value)),
            Err(_) => {
                self.errors.push(ParseError::invalid_integer(
                    &self.current.token.literal,
                    self.current.span,
                ));
                None
            }
        }
    }

    fn parse_string_literal(&mut self) -> Option<Expression> {
        Some(Expression::String(self.current.token.literal.clone()))
    }

    fn parse_boolean(&mut self) -> Option<Expression> {
        Some(Expression::Boolean(self.current_is(TokenKind::True)))
    }

    fn parse_prefix_expression(&mut self) -> Option<Expression> {
        let operator = match self.current.token.kind {
            TokenKind::Bang => PrefixOperator::Bang,
            _ => PrefixOperator::Minus,
        };
        self.next_token();

        let right = self.parse_expression(Precedence::Prefix)?;
        Some(Expression::Prefix {
            operator,
            right: Box::new(right),
        })
    }

    fn parse_infix_expression(&mut self, left: Expression) -> Option<Expression> {
        let operator = match self.current.token.kind {
            TokenKind::Plus => InfixOperator::Plus,
            TokenKind::Minus => InfixOperator::Minus,
            TokenKind::Asterisk => InfixOperator::Asterisk,
            TokenKind::Slash => InfixOperator::Slash,
            TokenKind::Lt => InfixOperator::Lt,
            TokenKind::Gt => InfixOperator::Gt,
            TokenKind::Eq => InfixOperator::Eq,
            _ => InfixOperator::NotEq,
        };
        let precedence = self.current_precedence();
        self.next_token();

        let right = self.parse_expression(precedence)?;
        Some(Expression::Infix {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        })
    }

    fn parse_grouped_expression(&mut self) -> Option<Expression> {
        self.next_token();

        let expression = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(expression)
    }

    fn parse_if_expression(&mut self) -> Option<Expression> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.next_token();
        let condition = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RParen) || !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_statement()?;

        let alternative = if self.peek_is(TokenKind::Else) {
            self.next_token();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_statement()?)
        } else {
            None
        };

        Some(Expression::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    /// Parses from the current `{` through its matching `}`.
    fn parse_block_statement(&mut self) -> Option<BlockStatement> {
        let mut block = BlockStatement::default();
        let opened_at = self.current.span;
        self.next_token();

        while !self.current_is(TokenKind::RBrace) {
            if self.current_is(TokenKind::Eof) {
                self.errors.push(
                    ParseError::unexpected_token(TokenKind::RBrace, TokenKind::Eof, self.current.span)
                        .with_opened_at(opened_at),
                );
                return None;
            }
            if let Some(statement) = self.parse_statement() {
                block.statements.push(statement);
            }
            self.next_token();
        }
        Some(block)
    }

    fn parse_function_literal(&mut self) -> Option<Expression> {
        let (parameters, body) = self.parse_parameters_and_body()?;
        Some(Expression::Function { parameters, body })
    }

    fn parse_macro_literal(&mut self) -> Option<Expression> {
        let (parameters, body) = self.parse_parameters_and_body()?;
        Some(Expression::Macro { parameters, body })
    }

    fn parse_parameters_and_body(&mut self) -> Option<(Vec<String>, BlockStatement)> {
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let parameters = self.parse_function_parameters()?;

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_statement()?;
        Some((parameters, body))
    }

    fn parse_function_parameters(&mut self) -> Option<Vec<String>> {
        let mut parameters = Vec::new();
        if self.peek_is(TokenKind::RParen) {
            self.next_token();
            return Some(parameters);
        }

        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        parameters.push(self.current.token.literal.clone());

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            parameters.push(self.current.token.literal.clone());
        }

        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        Some(parameters)
    }

    fn parse_call_expression(&mut self, function: Expression) -> Option<Expression> {
        let arguments = self.parse_expression_list(TokenKind::RParen)?;
        Some(Expression::Call {
            function: Box::new(function),
            arguments,
        })
    }

    fn parse_array_literal(&mut self) -> Option<Expression> {
        let elements = self.parse_expression_list(TokenKind::RBracket)?;
        Some(Expression::Array(elements))
    }

    /// Comma-separated expressions up to `end`; the current token is the opener.
    fn parse_expression_list(&mut self, end: TokenKind) -> Option<Vec<Expression>> {
        let mut list = Vec::new();
        if self.peek_is(end) {
            self.next_token();
            return Some(list);
        }

        self.next_token();
        list.push(self.parse_expression(Precedence::Lowest)?);

        while self.peek_is(TokenKind::Comma) {
            self.next_token();
            self.next_token();
            list.push(self.parse_expression(Precedence::Lowest)?);
        }

        if !self.expect_peek(end) {
            return None;
        }
        Some(list)
    }

    fn parse_index_expression(&mut self, left: Expression) -> Option<Expression> {
        self.next_token();
        let index = self.parse_expression(Precedence::Lowest)?;

        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        Some(Expression::Index {
            left: Box::new(left),
            index: Box::new(index),
        })
    }

    fn parse_hash_literal(&mut self) -> Option<Expression> {
        let mut pairs = Vec::new();

        while !self.peek_is(TokenKind::RBrace) {
            self.next_token();
            let key = self.parse_expression(Precedence::Lowest)?;

            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.next_token();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if !self.peek_is(TokenKind::RBrace) && !self.expect_peek(TokenKind::Comma) {
                return None;
            }
        }

        if !self.expect_peek(TokenKind::RBrace) {
            return None;
        }
        Some(Expression::Hash(pairs))
    }
}
