//! Internal representation of the AST without source information
use crate::grammar::lexer::TokenKind;

use std::fmt;

pub mod visit;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program<'source> {
    pub body: Vec<Statement<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement<'source> {
    Expression(Expression<'source>),
    VariableDeclaration(VariableDeclaration<'source>),
    Assignment(Assignment<'source>),
    Block(Block<'source>),
    For(For<'source>),
    While(While<'source>),
    If(If<'source>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableDeclaration<'source> {
    pub id: &'source str,
    pub is_const: bool,
    pub init: Option<Expression<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment<'source> {
    pub id: &'source str,
    pub value: Expression<'source>,
}

#[derive(Clone, PartialEq, Default)]
pub struct Block<'source> {
    pub statements: Vec<Statement<'source>>,
}

impl fmt::Debug for Block<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut dbg_struct = f.debug_struct("Block");
        for (i, stmt) in self.statements.iter().enumerate() {
            dbg_struct.field(&i.to_string(), stmt);
        }
        dbg_struct.finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct For<'source> {
    pub init: Box<Statement<'source>>,
    pub test: Expression<'source>,
    pub update: Assignment<'source>,
    pub body: Box<Statement<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While<'source> {
    pub test: Expression<'source>,
    pub body: Box<Statement<'source>>,
}

/// Used both for `if` and for the `else if` links hanging off it.
#[derive(Debug, Clone, PartialEq)]
pub struct If<'source> {
    pub test: Expression<'source>,
    pub consequent: Box<Statement<'source>>,
    pub alternate: Option<Alternate<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alternate<'source> {
    Else(Else<'source>),
    ElseIf(Box<If<'source>>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Else<'source> {
    pub body: Box<Statement<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression<'source> {
    Integer(i32),
    Boolean(bool),
    Call(Call<'source>),
    Binary(BinaryExpression<'source>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Call<'source> {
    pub id: &'source str,
    pub arguments: Vec<Expression<'source>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpression<'source> {
    pub left: Box<Expression<'source>>,
    pub right: Box<Expression<'source>>,
    pub operator: BinaryOperator,
}

impl<'source> BinaryExpression<'source> {
    pub fn new(
        left: Expression<'source>,
        operator: BinaryOperator,
        right: Expression<'source>,
    ) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
            operator,
        }
    }
}

/// Includes any kind of operator that needs two values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    /// `+` operator
    Add,
    /// `-` (binary) operator
    Subtract,
    /// `*` operator
    Multiply,
    /// `/` operator, unsigned
    Divide,
    Equal,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
}

impl BinaryOperator {
    pub const fn from_token_kind(kind: TokenKind) -> Option<Self> {
        Some(match kind {
            TokenKind::Plus => Self::Add,
            TokenKind::Minus => Self::Subtract,
            TokenKind::Star => Self::Multiply,
            TokenKind::Slash => Self::Divide,
            TokenKind::Equal => Self::Equal,
            TokenKind::Less => Self::Less,
            TokenKind::LessEqual => Self::LessEqual,
            TokenKind::Greater => Self::Greater,
            TokenKind::GreaterEqual => Self::GreaterEqual,
            _ => return None,
        })
    }

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Subtract => "-",
            Self::Multiply => "*",
            Self::Divide => "/",
            Self::Equal => "==",
            Self::Less => "<",
            Self::LessEqual => "<=",
            Self::Greater => ">",
            Self::GreaterEqual => ">=",
        }
    }

    pub const fn is_comparison(self) -> bool {
        !matches!(
            self,
            Self::Add | Self::Subtract | Self::Multiply | Self::Divide
        )
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl<'source> From<BinaryExpression<'source>> for Expression<'source> {
    fn from(binary: BinaryExpression<'source>) -> Self {
        Self::Binary(binary)
    }
}

impl<'source> From<Call<'source>> for Expression<'source> {
    fn from(call: Call<'source>) -> Self {
        Self::Call(call)
    }
}

impl From<i32> for Expression<'_> {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Expression<'_> {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl Statement<'_> {
    pub const fn is_declaration(&self) -> bool {
        matches!(self, Self::VariableDeclaration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operators_round_trip_through_token_kinds() {
        for kind in TokenKind::TABLE {
            if let Some(op) = BinaryOperator::from_token_kind(kind) {
                assert!(kind.precedence().is_some(), "{kind:?} has no precedence");
                assert_eq!(kind.to_string(), format!("operator `{}`", op.symbol()));
            } else {
                assert!(kind.precedence().is_none(), "{kind:?} should not bind");
            }
        }
    }

    #[test]
    fn structural_equality() {
        let make = || {
            Expression::from(BinaryExpression::new(
                1.into(),
                BinaryOperator::Add,
                Call {
                    id: "print",
                    arguments: vec![true.into()],
                }
                .into(),
            ))
        };
        assert_eq!(make(), make());
        assert_ne!(make(), Expression::Integer(1));
    }
}
