use super::lexer::{TokenKind, TokenValue};
use super::{Parse, ParseRes, Parser};
use crate::ast::{BinaryExpression, BinaryOperator, Call, Expression};

const PRIMARY_START: [TokenKind; 4] = [
    TokenKind::Integer,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Identifier,
];

impl<'source> Parse<'source> for Expression<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing expression", |parser| {
            parse_binary_expression(parser, 0)
        })
    }
}

/// Literal or call.
fn parse_primary<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Expression<'source>> {
    match (parser.peek_token(), parser.peek_value()) {
        (Some(TokenKind::Integer), Some(TokenValue::Integer(value))) => {
            parser.accept_current();
            Ok(Expression::Integer(value))
        }
        (Some(TokenKind::True | TokenKind::False), Some(TokenValue::Boolean(value))) => {
            parser.accept_current();
            Ok(Expression::Boolean(value))
        }
        (Some(TokenKind::Identifier), _) => parser.parse().map(Expression::Call),
        _ => parser.unexpected(&PRIMARY_START),
    }
}

impl<'source> Parse<'source> for Call<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing call", |parser| {
            let id = parser.expect_token(TokenKind::Identifier)?.source.source;
            parser.expect_token(TokenKind::OpenParen)?;
            let mut arguments = Vec::new();
            if parser.peek_token() == Some(TokenKind::CloseParen) {
                parser.accept_current();
                return Ok(Self { id, arguments });
            }
            loop {
                arguments.push(parser.parse()?);
                match parser.peek_token() {
                    Some(TokenKind::Comma) => {
                        parser.accept_current();
                    }
                    Some(TokenKind::CloseParen) => {
                        parser.accept_current();
                        break;
                    }
                    _ => return parser.unexpected(&[TokenKind::Comma, TokenKind::CloseParen]),
                }
            }
            Ok(Self { id, arguments })
        })
    }
}

/// Consumes the next token if it is a binary operator binding tighter than `min_precedence`.
fn next_binary_op(parser: &mut Parser, min_precedence: u8) -> Option<(BinaryOperator, u8)> {
    let kind = parser.peek_token()?;
    let precedence = kind.precedence().filter(|&p| p > min_precedence)?;
    let operator = BinaryOperator::from_token_kind(kind)?;
    parser.accept_current();
    Some((operator, precedence))
}

// Precedence climbing. The strict comparison makes equal precedences associate to the left.
fn parse_binary_expression<'source>(
    parser: &mut Parser<'_, 'source>,
    min_precedence: u8,
) -> ParseRes<Expression<'source>> {
    let mut lhs = parse_primary(parser)?;
    while let Some((operator, precedence)) = next_binary_op(parser, min_precedence) {
        let rhs = parse_binary_expression(parser, precedence)?;
        lhs = BinaryExpression::new(lhs, operator, rhs).into();
    }
    Ok(lhs)
}
