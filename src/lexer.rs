use crate::diagnostic::Span;
use crate::token::{lookup_ident, Token, TokenKind};
use chumsky::prelude::*;

fn whitespace<'a>() -> impl Parser<'a, &'a str, (), extra::Err<Simple<'a, char>>> + Clone {
    one_of(" \t\r\n").repeated()
}

/// Scans a whole source text into spanned tokens.
///
/// The scanner is total: a character that starts no other token becomes an
/// `ILLEGAL` token, so the result is always `Some`.
pub fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<(Token, SimpleSpan)>, extra::Err<Simple<'a, char>>> {
    let integer = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(|s: &str| Token::new(TokenKind::Int, s));

    // No escapes; an unterminated string runs to the end of input.
    let string = just('"')
        .ignore_then(none_of("\"").repeated().to_slice())
        .then_ignore(just('"').or_not())
        .map(|s: &str| Token::new(TokenKind::String, s));

    let ident = any()
        .filter(|c: &char| c.is_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_alphabetic() || c.is_ascii_digit() || *c == '_')
                .repeated(),
        )
        .to_slice()
        .map(|s: &str| Token::new(lookup_ident(s), s));

    let operator = choice((
        just("==").to(TokenKind::Eq),
        just("!=").to(TokenKind::NotEq),
        just('=').to(TokenKind::Assign),
        just('+').to(TokenKind::Plus),
        just('-').to(TokenKind::Minus),
        just('!').to(TokenKind::Bang),
        just('*').to(TokenKind::Asterisk),
        just('/').to(TokenKind::Slash),
        just('<').to(TokenKind::Lt),
        just('>').to(TokenKind::Gt),
        just(',').to(TokenKind::Comma),
        just(';').to(TokenKind::Semicolon),
        just(':').to(TokenKind::Colon),
        just('(').to(TokenKind::LParen),
        just(')').to(TokenKind::RParen),
        just('{').to(TokenKind::LBrace),
        just('}').to(TokenKind::RBrace),
        just('[').to(TokenKind::LBracket),
        just(']').to(TokenKind::RBracket),
    ))
    .map(|kind: TokenKind| Token::new(kind, kind.to_string()));

    let illegal = any().map(|c: char| Token::new(TokenKind::Illegal, c.to_string()));

    let token = choice((integer, string, ident, operator, illegal));

    whitespace()
        .ignore_then(
            token
                .map_with(|tok, e| (tok, e.span()))
                .then_ignore(whitespace())
                .repeated()
                .collect(),
        )
        .then_ignore(end())
}

/// Token cursor over a source text.
///
/// Once the input is exhausted every further call to [`Lexer::next_token`]
/// yields an `EOF` token.
pub struct Lexer {
    tokens: std::vec::IntoIter<(Token, SimpleSpan)>,
    input_len: usize,
    exhausted: bool,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let tokens = lexer().parse(input).into_output().unwrap_or_default();
        Self {
            tokens: tokens.into_iter(),
            input_len: input.len(),
            exhausted: false,
        }
    }

    pub fn next_token(&mut self) -> Token {
        self.next_spanned().0
    }

    /// Like [`Lexer::next_token`], but also returns the byte span of the token.
    pub fn next_spanned(&mut self) -> (Token, Span) {
        match self.tokens.next() {
            Some((token, span)) => (token, Span::new(span.start, span.end)),
            None => (Token::eof(), Span::new(self.input_len, self.input_len)),
        }
    }
}

/// Yields every token up to and including the first `EOF`.
impl Iterator for Lexer {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.exhausted {
            return None;
        }
        let token = self.next_token();
        if token.is(TokenKind::Eof) {
            self.exhausted = true;
        }
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::{
        Asterisk, Bang, Colon, Comma, Else, Eof, Eq, False, Function, Gt, Ident, If, Illegal, Int,
        LBrace, LBracket, LParen, Let, Lt, Macro, Minus, NotEq, Plus, RBrace, RBracket, RParen,
        Return, Semicolon, Slash, True, Assign,
    };

    fn lex(source: &str) -> Vec<(TokenKind, String)> {
        Lexer::new(source)
            .map(|token| (token.kind, token.literal))
            .collect()
    }

    fn expect_tokens(source: &str, expected: &[(TokenKind, &str)]) {
        let actual = lex(source);
        let expected: Vec<(TokenKind, String)> = expected
            .iter()
            .map(|(kind, literal)| (*kind, literal.to_string()))
            .collect();
        assert_eq!(actual, expected, "tokens for {:?}", source);
    }

    #[test]
    fn test_punctuation() {
        expect_tokens(
            "=+(){},;",
            &[
                (Assign, "="),
                (Plus, "+"),
                (LParen, "("),
                (RParen, ")"),
                (LBrace, "{"),
                (RBrace, "}"),
                (Comma, ","),
                (Semicolon, ";"),
                (Eof, ""),
            ],
        );
    }

    #[test]
    fn test_full_program() {
        let source = "let five = 5;
let ten = 10;

let add = fn(x, y) {
  x + y;
};

let result = add(five, ten);
!-/*5;
5 < 10 > 5;

if (5 < 10) {
\treturn true;
} else {
\treturn false;
}
";
        expect_tokens(
            source,
            &[
                (Let, "let"),
                (Ident, "five"),
                (Assign, "="),
                (Int, "5"),
                (Semicolon, ";"),
                (Let, "let"),
                (Ident, "ten"),
                (Assign, "="),
                (Int, "10"),
                (Semicolon, ";"),
                (Let, "let"),
                (Ident, "add"),
                (Assign, "="),
                (Function, "fn"),
                (LParen, "("),
                (Ident, "x"),
                (Comma, ","),
                (Ident, "y"),
                (RParen, ")"),
                (LBrace, "{"),
                (Ident, "x"),
                (Plus, "+"),
                (Ident, "y"),
                (Semicolon, ";"),
                (RBrace, "}"),
                (Semicolon, ";"),
                (Let, "let"),
                (Ident, "result"),
                (Assign, "="),
                (Ident, "add"),
                (LParen, "("),
                (Ident, "five"),
                (Comma, ","),
                (Ident, "ten"),
                (RParen, ")"),
                (Semicolon, ";"),
                (Bang, "!"),
                (Minus, "-"),
                (Slash, "/"),
                (Asterisk, "*"),
                (Int, "5"),
                (Semicolon, ";"),
                (Int, "5"),
                (Lt, "<"),
                (Int, "10"),
                (Gt, ">"),
                (Int, "5"),
                (Semicolon, ";"),
                (If, "if"),
                (LParen, "("),
                (Int, "5"),
                (Lt, "<"),
                (Int, "10"),
                (RParen, ")"),
                (LBrace, "{"),
                (Return, "return"),
                (True, "true"),
                (Semicolon, ";"),
                (RBrace, "}"),
                (Else, "else"),
                (LBrace, "{"),
                (Return, "return"),
                (False, "false"),
                (Semicolon, ";"),
                (RBrace, "}"),
                (Eof, ""),
            ],
        );
    }

    #[test]
    fn test_two_character_operators_and_macro_keyword() {
        expect_tokens(
            "10 == 5; 3 != 8; [1, 2]; macro(x, y) { x + y };",
            &[
                (Int, "10"),
                (Eq, "=="),
                (Int, "5"),
                (Semicolon, ";"),
                (Int, "3"),
                (NotEq, "!="),
                (Int, "8"),
                (Semicolon, ";"),
                (LBracket, "["),
                (Int, "1"),
                (Comma, ","),
                (Int, "2"),
                (RBracket, "]"),
                (Semicolon, ";"),
                (Macro, "macro"),
                (LParen, "("),
                (Ident, "x"),
                (Comma, ","),
                (Ident, "y"),
                (RParen, ")"),
                (LBrace, "{"),
                (Ident, "x"),
                (Plus, "+"),
                (Ident, "y"),
                (RBrace, "}"),
                (Semicolon, ";"),
                (Eof, ""),
            ],
        );
    }

    #[test]
    fn test_strings_and_hash_punctuation() {
        expect_tokens(
            r#""foobar" "foo bar" {"A": "B"}"#,
            &[
                (TokenKind::String, "foobar"),
                (TokenKind::String, "foo bar"),
                (LBrace, "{"),
                (TokenKind::String, "A"),
                (Colon, ":"),
                (TokenKind::String, "B"),
                (RBrace, "}"),
                (Eof, ""),
            ],
        );
    }

    #[test]
    fn test_unterminated_string_runs_to_end() {
        expect_tokens(r#"let s = "abc"#, &[(Let, "let"), (Ident, "s"), (Assign, "="), (TokenKind::String, "abc"), (Eof, "")]);
    }

    #[test]
    fn test_illegal_characters() {
        expect_tokens("5 @ #", &[(Int, "5"), (Illegal, "@"), (Illegal, "#"), (Eof, "")]);
    }

    #[test]
    fn test_identifiers_with_digits_and_underscores() {
        expect_tokens(
            "_tmp x1 9lives",
            &[(Ident, "_tmp"), (Ident, "x1"), (Int, "9"), (Ident, "lives"), (Eof, "")],
        );
    }

    #[test]
    fn test_eof_is_idempotent() {
        let mut lexer = Lexer::new("x");
        assert_eq!(lexer.next_token(), Token::new(Ident, "x"));
        for _ in 0..3 {
            assert_eq!(lexer.next_token(), Token::eof());
        }
    }

    #[test]
    fn test_empty_and_whitespace_only_input() {
        expect_tokens("", &[(Eof, "")]);
        expect_tokens(" \t\r\n ", &[(Eof, "")]);
    }

    #[test]
    fn test_spans() {
        let mut lexer = Lexer::new("let  x");
        assert_eq!(lexer.next_spanned().1, Span::new(0, 3));
        assert_eq!(lexer.next_spanned().1, Span::new(5, 6));
        assert_eq!(lexer.next_spanned().1, Span::new(6, 6));
    }
}
