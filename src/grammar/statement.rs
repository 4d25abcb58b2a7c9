use super::{
    lexer::TokenKind, IllegalConstruct, Parse, ParseErrorKind, ParseRes, Parser, Warning,
};
use crate::ast::{Assignment, Expression, Statement, VariableDeclaration};

/// Everything a statement may start with.
const STATEMENT_START: [TokenKind; 10] = [
    TokenKind::If,
    TokenKind::For,
    TokenKind::While,
    TokenKind::OpenBrace,
    TokenKind::Var,
    TokenKind::Const,
    TokenKind::Identifier,
    TokenKind::Integer,
    TokenKind::True,
    TokenKind::False,
];

impl<'source> Parse<'source> for Statement<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing statement", |parser| {
            Ok(match parser.peek_token() {
                Some(TokenKind::If) => Statement::If(parser.parse()?),
                Some(TokenKind::For) => Statement::For(parser.parse()?),
                Some(TokenKind::While) => Statement::While(parser.parse()?),
                Some(TokenKind::OpenBrace) => Statement::Block(parser.parse()?),
                Some(TokenKind::Var | TokenKind::Const) => {
                    Statement::VariableDeclaration(parser.parse()?)
                }
                // `Id '='` is the only place the second token decides
                Some(TokenKind::Identifier) if parser.peek_nth(1) == Some(TokenKind::Assign) => {
                    let assignment = parser.parse()?;
                    parser.expect_token(TokenKind::Semicolon)?;
                    Statement::Assignment(assignment)
                }
                Some(
                    TokenKind::Identifier | TokenKind::Integer | TokenKind::True | TokenKind::False,
                ) => single_expr(parser)?,
                _ => parser.unexpected(&STATEMENT_START)?,
            })
        })
    }
}

fn single_expr<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Statement<'source>> {
    let expr: Expression = parser.parse()?;
    parser.expect_token(TokenKind::Semicolon)?;
    Ok(Statement::Expression(expr))
}

impl<'source> Parse<'source> for VariableDeclaration<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing variable declaration", |parser| {
            let is_const = match parser.peek_token() {
                Some(TokenKind::Var) => false,
                Some(TokenKind::Const) => true,
                _ => return parser.unexpected(&[TokenKind::Var, TokenKind::Const]),
            };
            parser.accept_current();
            let name = parser.expect_token(TokenKind::Identifier)?;

            let mut init = None;
            if parser.peek_token() == Some(TokenKind::Assign) {
                parser.accept_current();
                if parser.peek_token() != Some(TokenKind::Semicolon) {
                    init = Some(parser.parse()?);
                }
            }
            parser.expect_token(TokenKind::Semicolon)?;

            if is_const && init.is_none() {
                parser.warn(Warning::ConstWithoutInitializer {
                    name: name.source.source,
                    span: name.span(),
                });
            }
            Ok(Self {
                id: name.source.source,
                is_const,
                init,
            })
        })
    }
}

/// `Id '=' Expression`, without the semicolon: a for loop's update has none.
impl<'source> Parse<'source> for Assignment<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing assignment", |parser| {
            let name = parser.expect_token(TokenKind::Identifier)?;
            parser.expect_token(TokenKind::Assign)?;
            let value = parser.parse()?;
            Ok(Self {
                id: name.source.source,
                value,
            })
        })
    }
}

/// The body of a control construct: any statement but a bare declaration.
pub(super) fn parse_body<'source>(
    parser: &mut Parser<'_, 'source>,
    construct: &'static str,
) -> ParseRes<Box<Statement<'source>>> {
    let span = parser.current_token_span();
    let body: Statement = parser.parse()?;
    if body.is_declaration() {
        return parser.emit_error_at(
            span,
            ParseErrorKind::Illegal(IllegalConstruct::UnwrappedDeclaration { construct }),
        );
    }
    Ok(Box::new(body))
}
