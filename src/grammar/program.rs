use super::{Parse, ParseRes, Parser};
use crate::ast::Program;

impl<'source> Parse<'source> for Program<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        let mut body = Vec::new();
        while parser.peek_token().is_some() {
            body.push(parser.parse()?);
        }
        tracing::debug!(target: "parser", "parsed {} top-level statements", body.len());
        Ok(Program { body })
    }
}
