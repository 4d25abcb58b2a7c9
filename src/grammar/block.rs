use super::{lexer::TokenKind, Parse, ParseRes, Parser};
use crate::ast::Block;

impl<'source> Parse<'source> for Block<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing statement block", |parser| {
            parser.expect_token(TokenKind::OpenBrace)?;

            let mut statements = Vec::new();

            while parser
                .peek_token()
                .map_or(false, |kind| kind != TokenKind::CloseBrace)
            {
                statements.push(parser.parse()?);
            }

            parser.expect_token(TokenKind::CloseBrace)?;

            Ok(Self { statements })
        })
    }
}
