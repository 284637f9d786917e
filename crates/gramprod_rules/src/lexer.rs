//! Lexer for the rule mini-language.
//!
//! The lexer converts rule text into a stream of tokens.

use crate::token::{Span, Token, TokenKind};

/// Lexer for rule text.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '<' => self.single(TokenKind::LAngle),
            '>' => self.single(TokenKind::RAngle),
            '|' => self.single(TokenKind::Pipe),
            '*' => self.single(TokenKind::Star),
            '-' => {
                self.advance();
                match self.peek_char() {
                    Some('>') => {
                        self.advance();
                        TokenKind::Arrow
                    }
                    Some(d) if d.is_ascii_digit() => self.scan_int(start),
                    _ => TokenKind::Error("expected '>' after '-'".into()),
                }
            }
            '\'' | '"' => self.scan_literal(c),
            c if c.is_ascii_digit() => self.scan_int(start),
            c if is_symbol_start(c) => self.scan_symbol(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens, ending with `Eof`.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans a quoted literal. Either quote character may delimit it.
    fn scan_literal(&mut self, quote: char) -> TokenKind {
        self.advance();
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some(c) if c == quote => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    match self.peek_char() {
                        Some('n') => text.push('\n'),
                        Some('t') => text.push('\t'),
                        Some(c @ ('\\' | '\'' | '"')) => text.push(c),
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => return TokenKind::Error("unterminated literal".into()),
                    }
                    self.advance();
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated literal".into()),
            }
        }
        TokenKind::Literal(text)
    }

    /// Scans an integer; `start` is where any leading sign began.
    fn scan_int(&mut self, start: usize) -> TokenKind {
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        let text = &self.source[start..self.position];
        match text.parse::<i64>() {
            Ok(n) => TokenKind::Int(n),
            Err(e) => TokenKind::Error(format!("invalid integer: {e}")),
        }
    }

    fn scan_symbol(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_symbol_char) {
            self.advance();
        }
        TokenKind::Symbol(self.source[start..self.position].to_string())
    }
}

fn is_symbol_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_symbol_char(c: char) -> bool {
    is_symbol_start(c) || c.is_ascii_digit()
}
