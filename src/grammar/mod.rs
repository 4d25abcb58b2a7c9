use crate::ast::Program;
use crate::error::*;

mod block;
mod control;
mod expr;
pub mod lexer;
mod program;
mod statement;

use lexer::*;
use thiserror::Error;

/// Recursive descent over an already lexed [`TokenStream`]. Tokens are consumed from the
/// front; decisions look at most two tokens ahead.
pub struct Parser<'m, 'source> {
    tokens: TokenStream<'source>,
    metadata: &'m SourceMetadata<'source>,
    warnings: Vec<Warning<'source>>,
}

impl<'m, 'source> Parser<'m, 'source> {
    pub fn new(tokens: TokenStream<'source>, metadata: &'m SourceMetadata<'source>) -> Self {
        Self {
            tokens,
            metadata,
            warnings: Vec::new(),
        }
    }
    pub fn from_source(metadata: &'m SourceMetadata<'source>) -> ParseRes<Self> {
        let tokens = tokenize(metadata).map_err(|e| e.map_kind(ParseErrorKind::LexError))?;
        tracing::debug!(target: "parser", "lexed {} tokens", tokens.len());
        Ok(Self::new(tokens, metadata))
    }
    pub fn peek_token(&self) -> Option<TokenKind> {
        self.peek_nth(0)
    }
    pub fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(n).map(|tok| tok.kind)
    }
    pub fn peek_value(&self) -> Option<TokenValue<'source>> {
        self.tokens.front().map(|tok| tok.value)
    }
    /// Span of the current token, or an empty span at the end of the input.
    pub fn current_token_span(&self) -> Span {
        self.tokens.front().map_or_else(
            || Span {
                offset: self.metadata.input().len(),
                len: 0,
            },
            Token::span,
        )
    }
    pub fn accept_current(&mut self) -> Option<Token<'source>> {
        let token = self.tokens.pop_front();
        if let Some(token) = &token {
            tracing::trace!(
                target: "parser",
                "accepted {:?} {:?}",
                token.kind,
                token.source.source
            );
        }
        token
    }
    pub fn next_token(&mut self) -> ParseRes<Token<'source>> {
        let span = self.current_token_span();
        self.accept_current().map_or_else(
            || self.emit_error_at(span, ParseErrorKind::UnexpectedEOF { wanted: None }),
            Ok,
        )
    }
    pub fn emit_error_at<T>(&self, span: Span, kind: ParseErrorKind) -> ParseRes<T> {
        Err(ParseError::new(kind).with_source(span, self.metadata))
    }
    pub fn expect_a_token(&self, wanted: WantedSpec<TokenKind>) -> ParseRes<TokenKind> {
        self.peek_token().map_or_else(
            || {
                self.emit_error_at(
                    self.current_token_span(),
                    ParseErrorKind::UnexpectedEOF {
                        wanted: Some(wanted),
                    },
                )
            },
            Ok,
        )
    }
    pub fn reject_current_token<T>(&self, reason: ParseErrorKind) -> ParseRes<T> {
        self.emit_error_at(self.current_token_span(), reason)
    }
    /// Fails with the full set of kinds that would have been accepted here.
    pub fn unexpected<T>(&self, wanted: &[TokenKind]) -> ParseRes<T> {
        let wanted = WantedSpec::OneOf(wanted.to_vec());
        match self.peek_token() {
            Some(found) => self.reject_current_token(ParseErrorKind::Expected { wanted, found }),
            None => self.reject_current_token(ParseErrorKind::UnexpectedEOF {
                wanted: Some(wanted),
            }),
        }
    }
    /// Consumes the current token if it is of the given kind.
    pub fn expect_token(&mut self, kind: TokenKind) -> ParseRes<Token<'source>> {
        let found = self.expect_a_token(WantedSpec::Specific(kind))?;
        if found != kind {
            return self.reject_current_token(ParseErrorKind::Expected {
                wanted: WantedSpec::Specific(kind),
                found,
            });
        }
        self.next_token()
    }
    pub fn parse<T>(&mut self) -> ParseRes<T>
    where
        T: Parse<'source>,
    {
        T::parse(self)
    }
    pub fn with_context<F, T>(&mut self, context: &'static str, mut cont: F) -> ParseRes<T>
    where
        F: FnMut(&mut Self) -> ParseRes<T>,
    {
        cont(self).map_err(|x| x.add_context(context))
    }
    pub fn warn(&mut self, warning: Warning<'source>) {
        tracing::warn!(target: "parser", "{warning}");
        self.warnings.push(warning);
    }
    pub fn warnings(&self) -> &[Warning<'source>] {
        &self.warnings
    }
    pub fn into_warnings(self) -> Vec<Warning<'source>> {
        self.warnings
    }
}

pub type ParseRes<T> = Result<T, ParseError>;
pub type ParseError = Error<ParseErrorKind>;

#[derive(Debug, Clone)]
pub enum ParseErrorKind {
    LexError(LexErrorKind),
    Expected {
        wanted: WantedSpec<TokenKind>,
        found: TokenKind,
    },
    UnexpectedEOF {
        wanted: Option<WantedSpec<TokenKind>>,
    },
    Illegal(IllegalConstruct),
}

/// Well-formed token sequences the language still refuses.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IllegalConstruct {
    #[error("the initializer of a for loop cannot be a const declaration")]
    ConstForInitializer,
    #[error("a variable declaration cannot be the body of {construct} unless it is wrapped in braces")]
    UnwrappedDeclaration { construct: &'static str },
}

/// Reported while parsing; the parse carries on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Warning<'source> {
    #[error("const `{name}` is declared without an initializer")]
    ConstWithoutInitializer { name: &'source str, span: Span },
}

pub trait Parse<'source>: Sized {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self>;
}

#[derive(Debug)]
pub struct Parsed<'source> {
    pub program: Program<'source>,
    pub warnings: Vec<Warning<'source>>,
}

pub fn parse_source<'source>(source: &SourceMetadata<'source>) -> ParseRes<Parsed<'source>> {
    let mut parser = Parser::from_source(source)?;
    let program = parser.parse()?;
    Ok(Parsed {
        program,
        warnings: parser.into_warnings(),
    })
}

use std::error;
impl error::Error for ParseErrorKind {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::LexError(err) => Some(err),
            Self::Illegal(err) => Some(err),
            _ => None,
        }
    }
}

use std::fmt;
impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::LexError(err) => write!(f, "error while lexing source: {}", err),
            Self::UnexpectedEOF { wanted } => {
                write!(f, "unexpected end of input")?;
                if let Some(wanted) = wanted {
                    write!(f, ", expected {}", wanted)
                } else {
                    Ok(())
                }
            }
            Self::Expected { wanted, found } => {
                write!(f, "expected {}, but found instead {}", wanted, found)
            }
            Self::Illegal(construct) => write!(f, "illegal construct: {}", construct),
        }
    }
}
