//! Parser for the rule mini-language.
//!
//! The parser turns rule text into a [`RuleAst`]: a top-level alternation of
//! item sequences, where parenthesized groups may nest further alternations.
//!
//! ```text
//! rule      := sequence ('|' sequence)*
//! sequence  := item*
//! item      := LITERAL slot? | SYMBOL slot? | '<' SYMBOL* '>' slot?
//!            | '*' | '(' rule ')' | '[' SYMBOL INT ']'
//! slot      := '->' SYMBOL
//! ```

use gramprod_foundation::{Error, Result};

use crate::lexer::Lexer;
use crate::token::{Span, Token, TokenKind};

/// A parsed rule: the branches of the top-level alternation.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleAst {
    /// Top-level branches, in source order.
    pub branches: Vec<Sequence>,
}

/// A run of items matched one after another.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Sequence {
    /// Items in source order.
    pub items: Vec<Item>,
}

/// One item of a sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct Item {
    /// What the item is.
    pub kind: ItemKind,
    /// `->slot` binding, if any.
    pub slot: Option<Name>,
    /// Source location of the item.
    pub span: Span,
}

/// A name with its source location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Name {
    /// The name as written.
    pub text: String,
    /// Where it was written.
    pub span: Span,
}

/// Item kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ItemKind {
    /// Quoted literal word.
    Literal(String),
    /// Bare name: production, part of speech, or token type.
    Symbol(String),
    /// `<a b c>` part-of-speech list.
    PartsOfSpeech(Vec<Name>),
    /// `*`
    Star,
    /// `( a | b )` group, expanded into separate alternatives.
    Group(Vec<Sequence>),
    /// `[name value]` qualifier.
    Qualifier(Qualifier, i64),
}

/// Recognized qualifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Qualifier {
    /// `[badness N]`
    Badness,
    /// `[score N]`
    Score,
}

/// Parser for rule text.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parses the whole rule.
    ///
    /// # Errors
    /// Returns the first syntax error found.
    pub fn parse(&mut self) -> Result<RuleAst> {
        let branches = self.parse_alternation()?;
        match &self.current.kind {
            TokenKind::Eof => Ok(RuleAst { branches }),
            TokenKind::RParen => Err(self.error("unbalanced ')'")),
            other => Err(self.error(&format!("unexpected {}", other.name()))),
        }
    }

    fn parse_alternation(&mut self) -> Result<Vec<Sequence>> {
        let mut branches = vec![self.parse_sequence()?];
        while self.current.kind == TokenKind::Pipe {
            self.advance();
            branches.push(self.parse_sequence()?);
        }
        Ok(branches)
    }

    fn parse_sequence(&mut self) -> Result<Sequence> {
        let mut items = Vec::new();
        loop {
            let span = self.current.span;
            let kind = match &self.current.kind {
                TokenKind::Pipe | TokenKind::RParen | TokenKind::Eof => {
                    return Ok(Sequence { items });
                }
                TokenKind::Literal(text) => {
                    let kind = ItemKind::Literal(text.clone());
                    self.advance();
                    kind
                }
                TokenKind::Symbol(name) => {
                    let kind = ItemKind::Symbol(name.clone());
                    self.advance();
                    kind
                }
                TokenKind::LAngle => self.parse_parts_of_speech()?,
                TokenKind::Star => {
                    self.advance();
                    items.push(Item {
                        kind: ItemKind::Star,
                        slot: None,
                        span,
                    });
                    continue;
                }
                TokenKind::LParen => {
                    items.push(self.parse_group()?);
                    continue;
                }
                TokenKind::LBracket => {
                    items.push(self.parse_qualifier()?);
                    continue;
                }
                TokenKind::Error(message) => return Err(self.error(&message.clone())),
                other => return Err(self.error(&format!("unexpected {}", other.name()))),
            };
            let slot = self.parse_slot()?;
            items.push(Item { kind, slot, span });
        }
    }

    /// Parses `<a b c>`; the current token is `<`.
    fn parse_parts_of_speech(&mut self) -> Result<ItemKind> {
        self.advance();
        let mut names = Vec::new();
        loop {
            match &self.current.kind {
                TokenKind::Symbol(text) => {
                    names.push(Name {
                        text: text.clone(),
                        span: self.current.span,
                    });
                    self.advance();
                }
                TokenKind::RAngle => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => return Err(self.error("unclosed part-of-speech list")),
                _ => return Err(self.error("part-of-speech list requires property names")),
            }
        }
        if names.is_empty() {
            return Err(self.error("empty part-of-speech list"));
        }
        Ok(ItemKind::PartsOfSpeech(names))
    }

    /// Parses `( ... )`; the current token is `(`.
    fn parse_group(&mut self) -> Result<Item> {
        let span = self.current.span;
        self.advance();
        let branches = self.parse_alternation()?;
        self.expect(&TokenKind::RParen)?;
        if self.current.kind == TokenKind::Arrow {
            return Err(self.error("a parenthesized group cannot be bound to a slot"));
        }
        Ok(Item {
            kind: ItemKind::Group(branches),
            slot: None,
            span,
        })
    }

    /// Parses `[name value]`; the current token is `[`.
    fn parse_qualifier(&mut self) -> Result<Item> {
        let span = self.current.span;
        self.advance();
        let qualifier = match &self.current.kind {
            TokenKind::Symbol(name) if name == "badness" => Qualifier::Badness,
            TokenKind::Symbol(name) if name == "score" => Qualifier::Score,
            TokenKind::Symbol(name) => {
                return Err(self.error(&format!("unknown qualifier '{name}'")));
            }
            _ => return Err(self.error("qualifier requires a name")),
        };
        self.advance();
        let TokenKind::Int(value) = self.current.kind else {
            return Err(self.error("qualifier requires an integer value"));
        };
        self.advance();
        self.expect(&TokenKind::RBracket)?;
        Ok(Item {
            kind: ItemKind::Qualifier(qualifier, value),
            slot: None,
            span,
        })
    }

    fn parse_slot(&mut self) -> Result<Option<Name>> {
        if self.current.kind != TokenKind::Arrow {
            return Ok(None);
        }
        self.advance();
        let TokenKind::Symbol(text) = &self.current.kind else {
            return Err(self.error("'->' must be followed by a property name"));
        };
        let name = Name {
            text: text.clone(),
            span: self.current.span,
        };
        self.advance();
        Ok(Some(name))
    }

    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if &self.current.kind == expected {
            self.advance();
            Ok(())
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                expected.name(),
                self.current.kind.name()
            )))
        }
    }

    fn error(&self, message: &str) -> Error {
        error_at(self.current.span, message)
    }
}

/// Creates a syntax error at a specific span.
pub(crate) fn error_at(span: Span, message: &str) -> Error {
    Error::syntax(message, span.line, span.column)
}

/// Parses rule text into an AST.
///
/// # Errors
/// Returns the first syntax error found.
pub fn parse(source: &str) -> Result<RuleAst> {
    Parser::new(source).parse()
}
