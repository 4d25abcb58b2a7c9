use crate::error::{self, SourceMetadata, Span};
use std::collections::VecDeque;
use std::error::Error;
use std::fmt;

impl Error for LexErrorKind {}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.matcher() {
            Matcher::Reserved(word) => write!(f, "keyword `{}`", word),
            Matcher::Literal(text) => match self {
                Self::OpenParen => write!(f, "opening parentheses '('"),
                Self::CloseParen => write!(f, "closing parentheses ')'"),
                Self::OpenBrace => write!(f, "opening brace '{{'"),
                Self::CloseBrace => write!(f, "closing brace '}}'"),
                Self::Semicolon => write!(f, "semicolon ';'"),
                Self::Comma => write!(f, "comma ','"),
                Self::Assign => write!(f, "assignment '='"),
                _ => write!(f, "operator `{}`", text),
            },
            Matcher::Pattern(_) => f.write_str(match self {
                Self::Float => "float",
                Self::Integer => "integer",
                _ => "identifier",
            }),
        }
    }
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::UnexpectedChar(ch) => write!(f, "unexpected {:?}", ch),
            Self::IntegerOutOfRange(lexeme) => {
                write!(f, "integer literal {} does not fit in 32 bits", lexeme)
            }
            Self::InvalidFloat(lexeme) => write!(f, "invalid float literal {}", lexeme),
        }
    }
}

pub struct LexerIter<'m, 'a> {
    lexer: Lexer<'m, 'a>,
    eof: bool,
}

pub type LexError = error::Error<LexErrorKind>;

impl<'m, 'a> Iterator for LexerIter<'m, 'a> {
    type Item = Result<Token<'a>, LexError>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.eof {
            None
        } else {
            let next = self.lexer.next_token();
            if matches!(next, Ok(None) | Err(_)) {
                self.eof = true;
            }
            next.transpose()
        }
    }
}

impl std::iter::FusedIterator for LexerIter<'_, '_> {}

impl<'m, 'a> IntoIterator for Lexer<'m, 'a> {
    type IntoIter = LexerIter<'m, 'a>;
    type Item = <Self::IntoIter as Iterator>::Item;
    fn into_iter(self) -> Self::IntoIter {
        LexerIter {
            lexer: self,
            eof: false,
        }
    }
}

/// Tokens in source order. The parser pops from the front and never pushes back.
pub type TokenStream<'source> = VecDeque<Token<'source>>;

pub fn tokenize<'source>(
    source: &SourceMetadata<'source>,
) -> Result<TokenStream<'source>, LexError> {
    Lexer::new(source).into_iter().collect()
}

/// Tokens compare by kind and value only; where they came from doesn't matter.
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub value: TokenValue<'a>,
    pub source: Source<'a>,
}

impl PartialEq for Token<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.value == other.value
    }
}

impl<'a> Token<'a> {
    pub const fn new(kind: TokenKind, value: TokenValue<'a>, source: Source<'a>) -> Self {
        Self {
            kind,
            value,
            source,
        }
    }
    pub const fn precedence(&self) -> Option<u8> {
        self.kind.precedence()
    }
    pub const fn span(&self) -> Span {
        self.source.span
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue<'a> {
    Integer(i32),
    Float(f64),
    Boolean(bool),
    /// `undefined`
    Absent,
    Text(&'a str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Var,
    Const,
    For,
    While,
    If,
    Else,
    Undefined,
    True,
    False,
    Equal,
    LessEqual,
    Less,
    GreaterEqual,
    Greater,
    Plus,
    Minus,
    Star,
    Slash,
    Assign,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Semicolon,
    Comma,
    Float,
    Integer,
    Identifier,
}

/// How a table entry recognises its lexeme at the start of the remaining input.
#[derive(Clone, Copy)]
pub enum Matcher {
    /// exact word, not followed by an identifier character
    Reserved(&'static str),
    /// exact text
    Literal(&'static str),
    /// returns the byte length of the match, 0 when there is none
    Pattern(fn(&str) -> usize),
}

impl TokenKind {
    /// Matchers are tried in this order and the first hit wins. Keywords sit before
    /// `Identifier`, and every operator sits before the operators that are a prefix of it.
    pub const TABLE: [TokenKind; 28] = [
        Self::Var,
        Self::Const,
        Self::For,
        Self::While,
        Self::If,
        Self::Else,
        Self::Undefined,
        Self::True,
        Self::False,
        Self::Equal,
        Self::LessEqual,
        Self::Less,
        Self::GreaterEqual,
        Self::Greater,
        Self::Plus,
        Self::Minus,
        Self::Star,
        Self::Slash,
        Self::Assign,
        Self::OpenParen,
        Self::CloseParen,
        Self::OpenBrace,
        Self::CloseBrace,
        Self::Semicolon,
        Self::Comma,
        Self::Float,
        Self::Integer,
        Self::Identifier,
    ];

    pub fn matcher(self) -> Matcher {
        match self {
            Self::Var => Matcher::Reserved("var"),
            Self::Const => Matcher::Reserved("const"),
            Self::For => Matcher::Reserved("for"),
            Self::While => Matcher::Reserved("while"),
            Self::If => Matcher::Reserved("if"),
            Self::Else => Matcher::Reserved("else"),
            Self::Undefined => Matcher::Reserved("undefined"),
            Self::True => Matcher::Reserved("true"),
            Self::False => Matcher::Reserved("false"),
            Self::Equal => Matcher::Literal("=="),
            Self::LessEqual => Matcher::Literal("<="),
            Self::Less => Matcher::Literal("<"),
            Self::GreaterEqual => Matcher::Literal(">="),
            Self::Greater => Matcher::Literal(">"),
            Self::Plus => Matcher::Literal("+"),
            Self::Minus => Matcher::Literal("-"),
            Self::Star => Matcher::Literal("*"),
            Self::Slash => Matcher::Literal("/"),
            Self::Assign => Matcher::Literal("="),
            Self::OpenParen => Matcher::Literal("("),
            Self::CloseParen => Matcher::Literal(")"),
            Self::OpenBrace => Matcher::Literal("{"),
            Self::CloseBrace => Matcher::Literal("}"),
            Self::Semicolon => Matcher::Literal(";"),
            Self::Comma => Matcher::Literal(","),
            Self::Float => Matcher::Pattern(float_len),
            Self::Integer => Matcher::Pattern(integer_len),
            Self::Identifier => Matcher::Pattern(identifier_len),
        }
    }

    /// Binding power of the binary operators; `None` for everything else.
    pub const fn precedence(self) -> Option<u8> {
        Some(match self {
            Self::Star | Self::Slash => 14,
            Self::Plus | Self::Minus => 13,
            Self::Less | Self::LessEqual | Self::Greater | Self::GreaterEqual => 11,
            Self::Equal => 10,
            _ => return None,
        })
    }

    pub fn match_len(self, input: &str) -> Option<usize> {
        let len = match self.matcher() {
            Matcher::Reserved(word) => match input.strip_prefix(word) {
                Some(after) if !after.chars().next().map_or(false, is_identifier_char) => {
                    word.len()
                }
                _ => 0,
            },
            Matcher::Literal(text) => {
                if input.starts_with(text) {
                    text.len()
                } else {
                    0
                }
            }
            Matcher::Pattern(pattern) => pattern(input),
        };
        (len != 0).then_some(len)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Source<'source> {
    pub span: Span,
    pub source: &'source str,
}

pub struct Lexer<'m, 'source> {
    offset: usize,
    metadata: &'m SourceMetadata<'source>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    UnexpectedChar(char),
    IntegerOutOfRange(String),
    InvalidFloat(String),
}

impl<'m, 'source> Lexer<'m, 'source> {
    pub fn new(input: &'m SourceMetadata<'source>) -> Self {
        Self {
            offset: 0,
            metadata: input,
        }
    }

    pub fn next_token(&mut self) -> Result<Option<Token<'source>>, LexError> {
        self.skip_whitespace();
        let rest = self.rest();
        let first = match rest.chars().next() {
            Some(ch) => ch,
            None => return Ok(None),
        };
        let (kind, len) = match TokenKind::TABLE
            .iter()
            .find_map(|kind| kind.match_len(rest).map(|len| (*kind, len)))
        {
            Some(found) => found,
            None => {
                return Err(self.error(self.offset, LexErrorKind::UnexpectedChar(first)));
            }
        };
        let source = self.source_from_len(self.offset, len);
        let value = self.convert(kind, source)?;
        tracing::trace!(target: "lexer", "{kind:?} {:?} at {}", source.source, self.offset);
        self.offset += len;
        Ok(Some(Token::new(kind, value, source)))
    }

    fn convert(
        &self,
        kind: TokenKind,
        src: Source<'source>,
    ) -> Result<TokenValue<'source>, LexError> {
        let lexeme = src.source;
        Ok(match kind {
            TokenKind::Integer => TokenValue::Integer(lexeme.parse().map_err(|_| {
                self.error(
                    src.span.offset,
                    LexErrorKind::IntegerOutOfRange(lexeme.to_string()),
                )
            })?),
            TokenKind::Float => TokenValue::Float(lexeme.parse().map_err(|_| {
                self.error(
                    src.span.offset,
                    LexErrorKind::InvalidFloat(lexeme.to_string()),
                )
            })?),
            TokenKind::True => TokenValue::Boolean(true),
            TokenKind::False => TokenValue::Boolean(false),
            TokenKind::Undefined => TokenValue::Absent,
            _ => TokenValue::Text(lexeme),
        })
    }

    fn rest(&self) -> &'source str {
        &self.metadata.input()[self.offset..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        let trimmed = rest.trim_start_matches(|ch| matches!(ch, ' ' | '\t' | '\n' | '\r'));
        self.offset += rest.len() - trimmed.len();
    }

    fn source_from(&self, start: usize, end: usize) -> Source<'source> {
        Source {
            span: Span {
                offset: start,
                len: end - start,
            },
            source: &self.metadata.input()[start..end],
        }
    }

    fn source_from_len(&self, start: usize, len: usize) -> Source<'source> {
        self.source_from(start, start + len)
    }

    fn error(&self, position: usize, kind: LexErrorKind) -> LexError {
        LexError::new(kind).with_source(Span::new(position), self.metadata)
    }
}

#[inline]
fn is_identifier_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

fn digits_len(input: &str) -> usize {
    input.bytes().take_while(u8::is_ascii_digit).count()
}

fn integer_len(input: &str) -> usize {
    digits_len(input)
}

// [0-9]*\.[0-9]+ | [0-9]+\.[0-9]*
fn float_len(input: &str) -> usize {
    let whole = digits_len(input);
    if !input[whole..].starts_with('.') {
        return 0;
    }
    let fraction = digits_len(&input[whole + 1..]);
    if whole == 0 && fraction == 0 {
        0
    } else {
        whole + 1 + fraction
    }
}

fn identifier_len(input: &str) -> usize {
    match input.chars().next() {
        Some(ch) if ch.is_ascii_alphabetic() || ch == '_' => {
            input
                .chars()
                .take_while(|ch| is_identifier_char(*ch))
                .count()
        }
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(TokenKind, TokenValue)> {
        let meta = SourceMetadata::new(input);
        tokenize(&meta)
            .unwrap()
            .into_iter()
            .map(|tok| (tok.kind, tok.value))
            .collect()
    }

    fn kinds(input: &str) -> Vec<TokenKind> {
        lex(input).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn expression_tokens() {
        assert_eq!(
            lex(" 5+ 34 * 2"),
            vec![
                (TokenKind::Integer, TokenValue::Integer(5)),
                (TokenKind::Plus, TokenValue::Text("+")),
                (TokenKind::Integer, TokenValue::Integer(34)),
                (TokenKind::Star, TokenValue::Text("*")),
                (TokenKind::Integer, TokenValue::Integer(2)),
            ]
        );
    }

    #[test]
    fn reserved_word_needs_a_boundary() {
        assert_eq!(
            lex("for(), foreach"),
            vec![
                (TokenKind::For, TokenValue::Text("for")),
                (TokenKind::OpenParen, TokenValue::Text("(")),
                (TokenKind::CloseParen, TokenValue::Text(")")),
                (TokenKind::Comma, TokenValue::Text(",")),
                (TokenKind::Identifier, TokenValue::Text("foreach")),
            ]
        );
    }

    #[test]
    fn double_equals_is_one_token() {
        assert_eq!(
            lex("== = 2 2.3"),
            vec![
                (TokenKind::Equal, TokenValue::Text("==")),
                (TokenKind::Assign, TokenValue::Text("=")),
                (TokenKind::Integer, TokenValue::Integer(2)),
                (TokenKind::Float, TokenValue::Float(2.3)),
            ]
        );
    }

    #[test]
    fn comparison_operators() {
        assert_eq!(
            kinds("< <= > >="),
            vec![
                TokenKind::Less,
                TokenKind::LessEqual,
                TokenKind::Greater,
                TokenKind::GreaterEqual,
            ]
        );
    }

    #[test]
    fn declaration_tokens() {
        assert_eq!(
            lex("const myVar = 2;"),
            vec![
                (TokenKind::Const, TokenValue::Text("const")),
                (TokenKind::Identifier, TokenValue::Text("myVar")),
                (TokenKind::Assign, TokenValue::Text("=")),
                (TokenKind::Integer, TokenValue::Integer(2)),
                (TokenKind::Semicolon, TokenValue::Text(";")),
            ]
        );
    }

    #[test]
    fn typed_values() {
        assert_eq!(
            lex("true false undefined .5 7."),
            vec![
                (TokenKind::True, TokenValue::Boolean(true)),
                (TokenKind::False, TokenValue::Boolean(false)),
                (TokenKind::Undefined, TokenValue::Absent),
                (TokenKind::Float, TokenValue::Float(0.5)),
                (TokenKind::Float, TokenValue::Float(7.0)),
            ]
        );
    }

    #[test]
    fn keyword_prefixed_identifiers() {
        assert_eq!(
            kinds("iffy variable _if else1 true_"),
            vec![TokenKind::Identifier; 5]
        );
    }

    #[test]
    fn table_order_invariants() {
        let position = |kind| TokenKind::TABLE.iter().position(|k| *k == kind).unwrap();
        for kind in TokenKind::TABLE {
            if let Matcher::Reserved(_) = kind.matcher() {
                assert!(position(kind) < position(TokenKind::Identifier), "{kind:?}");
            }
        }
        for (longer, shorter) in [
            (TokenKind::Equal, TokenKind::Assign),
            (TokenKind::LessEqual, TokenKind::Less),
            (TokenKind::GreaterEqual, TokenKind::Greater),
            (TokenKind::Float, TokenKind::Integer),
        ] {
            assert!(position(longer) < position(shorter), "{longer:?}");
        }
    }

    #[test]
    fn precedences() {
        assert_eq!(TokenKind::Star.precedence(), Some(14));
        assert_eq!(TokenKind::Slash.precedence(), Some(14));
        assert_eq!(TokenKind::Plus.precedence(), Some(13));
        assert_eq!(TokenKind::Minus.precedence(), Some(13));
        assert_eq!(TokenKind::Assign.precedence(), None);
        assert_eq!(TokenKind::Identifier.precedence(), None);
    }

    #[test]
    fn equality_ignores_position() {
        let meta = SourceMetadata::new("x x");
        let tokens = tokenize(&meta).unwrap();
        assert_eq!(tokens[0], tokens[1]);
        assert_ne!(tokens[0].span(), tokens[1].span());
    }

    #[test]
    fn unmatched_input_is_an_error() {
        let meta = SourceMetadata::new("1 + $");
        let err = tokenize(&meta).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedChar('$'));
        assert_eq!(err.position().map(|p| p.col), Some(4));
    }

    #[test]
    fn integer_overflow_is_an_error() {
        let meta = SourceMetadata::new("99999999999");
        let err = tokenize(&meta).unwrap_err();
        assert!(matches!(err.kind, LexErrorKind::IntegerOutOfRange(_)));
    }

    #[test]
    fn empty_and_blank_input() {
        assert!(lex("").is_empty());
        assert!(lex(" \t\r\n ").is_empty());
    }

    #[test]
    fn spans_cover_lexemes() {
        let meta = SourceMetadata::new("  print(10);");
        let tokens = tokenize(&meta).unwrap();
        assert_eq!(tokens[0].span(), Span { offset: 2, len: 5 });
        assert_eq!(tokens[2].span(), Span { offset: 8, len: 2 });
    }
}
