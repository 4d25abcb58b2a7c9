use super::{
    lexer::TokenKind, statement::parse_body, IllegalConstruct, Parse, ParseErrorKind, ParseRes,
    Parser,
};
use crate::ast::{Alternate, Else, Expression, For, If, Statement, VariableDeclaration, While};

/// `'(' Expression ')'`
fn parse_test<'source>(parser: &mut Parser<'_, 'source>) -> ParseRes<Expression<'source>> {
    parser.expect_token(TokenKind::OpenParen)?;
    let test = parser.parse()?;
    parser.expect_token(TokenKind::CloseParen)?;
    Ok(test)
}

impl<'source> Parse<'source> for For<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing for loop", |parser| {
            parser.expect_token(TokenKind::For)?;
            parser.expect_token(TokenKind::OpenParen)?;

            // the initializer carries its own semicolon
            let init_span = parser.current_token_span();
            let init: Statement = parser.parse()?;
            if let Statement::VariableDeclaration(VariableDeclaration { is_const: true, .. }) =
                init
            {
                return parser.emit_error_at(
                    init_span,
                    ParseErrorKind::Illegal(IllegalConstruct::ConstForInitializer),
                );
            }

            let test = parser.parse()?;
            parser.expect_token(TokenKind::Semicolon)?;
            let update = parser.parse()?;
            parser.expect_token(TokenKind::CloseParen)?;
            let body = parse_body(parser, "a for loop")?;
            Ok(Self {
                init: Box::new(init),
                test,
                update,
                body,
            })
        })
    }
}

impl<'source> Parse<'source> for While<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing while loop", |parser| {
            parser.expect_token(TokenKind::While)?;
            let test = parse_test(parser)?;
            let body = parse_body(parser, "a while loop")?;
            Ok(Self { test, body })
        })
    }
}

impl<'source> Parse<'source> for If<'source> {
    fn parse(parser: &mut Parser<'_, 'source>) -> ParseRes<Self> {
        parser.with_context("parsing if statement", |parser| {
            parser.expect_token(TokenKind::If)?;
            let test = parse_test(parser)?;
            let consequent = parse_body(parser, "an if statement")?;
            let alternate = match (parser.peek_token(), parser.peek_nth(1)) {
                (Some(TokenKind::Else), Some(TokenKind::If)) => {
                    parser.accept_current();
                    Some(Alternate::ElseIf(Box::new(parser.parse()?)))
                }
                (Some(TokenKind::Else), _) => {
                    parser.accept_current();
                    Some(Alternate::Else(Else {
                        body: parse_body(parser, "an else branch")?,
                    }))
                }
                _ => None,
            };
            Ok(Self {
                test,
                consequent,
                alternate,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::*;
    use crate::error::{SourceMetadata, WantedSpec};
    use crate::grammar::lexer::TokenKind;
    use crate::grammar::{parse_source, IllegalConstruct, ParseErrorKind};

    fn parse_one(source: &str) -> Statement {
        let mut program = parse_source(&SourceMetadata::new(source)).unwrap().program;
        assert_eq!(program.body.len(), 1);
        program.body.remove(0)
    }

    fn call(id: &str, arg: i32) -> Statement {
        Statement::Expression(
            Call {
                id,
                arguments: vec![arg.into()],
            }
            .into(),
        )
    }

    #[test]
    fn for_loop() {
        let stmt = parse_one("for (var i = 0; i() < 10; i = 1) { print(1); }");
        assert_eq!(
            stmt,
            Statement::For(For {
                init: Box::new(Statement::VariableDeclaration(VariableDeclaration {
                    id: "i",
                    is_const: false,
                    init: Some(0.into()),
                })),
                test: BinaryExpression::new(
                    Call {
                        id: "i",
                        arguments: vec![]
                    }
                    .into(),
                    BinaryOperator::Less,
                    10.into()
                )
                .into(),
                update: Assignment {
                    id: "i",
                    value: 1.into()
                },
                body: Box::new(Statement::Block(Block {
                    statements: vec![call("print", 1)]
                })),
            })
        );
    }

    #[test]
    fn for_loop_with_assignment_initializer() {
        let stmt = parse_one("for (i = 0; true; i = 1) f(0);");
        match stmt {
            Statement::For(For { init, .. }) => {
                assert!(matches!(*init, Statement::Assignment(Assignment { id: "i", .. })))
            }
            other => panic!("not a for loop: {other:?}"),
        }
    }

    #[test]
    fn const_for_initializer_is_illegal() {
        let err = parse_source(&SourceMetadata::new("for (const i = 0; true; i = 1) {}"))
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Illegal(IllegalConstruct::ConstForInitializer)
        ));
        assert_eq!(err.position().map(|pos| pos.col), Some(5));
        assert!(err.contexts().contains(&"parsing for loop"));
    }

    #[test]
    fn for_update_has_no_semicolon() {
        let err = parse_source(&SourceMetadata::new("for (var i = 0; true; i = 1;) {}"))
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                found: TokenKind::Semicolon,
                ..
            }
        ));
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            parse_one("while (false) f(2);"),
            Statement::While(While {
                test: false.into(),
                body: Box::new(call("f", 2)),
            })
        );
    }

    #[test]
    fn if_else_if_else_chain() {
        let stmt = parse_one("if (1) f(1); else if (2) f(2); else if (3) { } else f(4);");
        let expected = Statement::If(If {
            test: 1.into(),
            consequent: Box::new(call("f", 1)),
            alternate: Some(Alternate::ElseIf(Box::new(If {
                test: 2.into(),
                consequent: Box::new(call("f", 2)),
                alternate: Some(Alternate::ElseIf(Box::new(If {
                    test: 3.into(),
                    consequent: Box::new(Statement::Block(Block::default())),
                    alternate: Some(Alternate::Else(Else {
                        body: Box::new(call("f", 4)),
                    })),
                }))),
            }))),
        });
        assert_eq!(stmt, expected);
    }

    #[test]
    fn dangling_else_binds_to_the_nearest_if() {
        let stmt = parse_one("if (1) if (2) f(2); else f(3);");
        match stmt {
            Statement::If(If {
                consequent,
                alternate: None,
                ..
            }) => assert!(matches!(
                *consequent,
                Statement::If(If {
                    alternate: Some(Alternate::Else(_)),
                    ..
                })
            )),
            other => panic!("unexpected shape: {other:?}"),
        }
    }

    #[test]
    fn if_requires_parentheses() {
        let err = parse_source(&SourceMetadata::new("if true { }")).unwrap_err();
        assert!(matches!(
            err.kind,
            ParseErrorKind::Expected {
                wanted: WantedSpec::Specific(TokenKind::OpenParen),
                found: TokenKind::True,
            }
        ));
    }

    #[test]
    fn else_body_cannot_be_a_declaration() {
        let err = parse_source(&SourceMetadata::new("if (1) { } else const x = 1;")).unwrap_err();
        assert_eq!(
            err.kind.to_string(),
            "illegal construct: a variable declaration cannot be the body of an else branch \
             unless it is wrapped in braces"
        );
    }
}
