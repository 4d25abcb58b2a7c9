//! Double-dispatch traversal over the AST.
//!
//! Every node hands itself to the matching `visit_*` method through `accept`. The provided
//! methods recurse into the children of composite nodes (through the `walk_*` functions) and do
//! nothing for literals, so a pass only overrides the nodes it cares about. An override that
//! still wants the children visited calls the corresponding `walk_*` function itself.
use super::*;

pub trait Visitor<'source>: Sized {
    type Error;

    fn visit_program(&mut self, program: &Program<'source>) -> Result<(), Self::Error> {
        walk_program(self, program)
    }
    fn visit_block(&mut self, block: &Block<'source>) -> Result<(), Self::Error> {
        walk_block(self, block)
    }
    fn visit_expression_statement(
        &mut self,
        expr: &Expression<'source>,
    ) -> Result<(), Self::Error> {
        expr.accept(self)
    }
    fn visit_variable_declaration(
        &mut self,
        declaration: &VariableDeclaration<'source>,
    ) -> Result<(), Self::Error> {
        walk_variable_declaration(self, declaration)
    }
    fn visit_assignment(&mut self, assignment: &Assignment<'source>) -> Result<(), Self::Error> {
        assignment.value.accept(self)
    }
    fn visit_for(&mut self, for_loop: &For<'source>) -> Result<(), Self::Error> {
        walk_for(self, for_loop)
    }
    fn visit_while(&mut self, while_loop: &While<'source>) -> Result<(), Self::Error> {
        walk_while(self, while_loop)
    }
    fn visit_if(&mut self, if_stmt: &If<'source>) -> Result<(), Self::Error> {
        walk_if(self, if_stmt)
    }
    fn visit_else_if(&mut self, else_if: &If<'source>) -> Result<(), Self::Error> {
        walk_if(self, else_if)
    }
    fn visit_else(&mut self, else_stmt: &Else<'source>) -> Result<(), Self::Error> {
        else_stmt.body.accept(self)
    }
    fn visit_integer_literal(&mut self, _value: i32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_boolean_literal(&mut self, _value: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn visit_call(&mut self, call: &Call<'source>) -> Result<(), Self::Error> {
        walk_call(self, call)
    }
    fn visit_binary_expression(
        &mut self,
        binary: &BinaryExpression<'source>,
    ) -> Result<(), Self::Error> {
        walk_binary_expression(self, binary)
    }
}

impl<'source> Program<'source> {
    pub fn accept<V: Visitor<'source>>(&self, visitor: &mut V) -> Result<(), V::Error> {
        visitor.visit_program(self)
    }
}

impl<'source> Statement<'source> {
    pub fn accept<V: Visitor<'source>>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Self::Expression(expr) => visitor.visit_expression_statement(expr),
            Self::VariableDeclaration(declaration) => {
                visitor.visit_variable_declaration(declaration)
            }
            Self::Assignment(assignment) => visitor.visit_assignment(assignment),
            Self::Block(block) => visitor.visit_block(block),
            Self::For(for_loop) => visitor.visit_for(for_loop),
            Self::While(while_loop) => visitor.visit_while(while_loop),
            Self::If(if_stmt) => visitor.visit_if(if_stmt),
        }
    }
}

impl<'source> Alternate<'source> {
    pub fn accept<V: Visitor<'source>>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Self::Else(else_stmt) => visitor.visit_else(else_stmt),
            Self::ElseIf(else_if) => visitor.visit_else_if(else_if),
        }
    }
}

impl<'source> Expression<'source> {
    pub fn accept<V: Visitor<'source>>(&self, visitor: &mut V) -> Result<(), V::Error> {
        match self {
            Self::Integer(value) => visitor.visit_integer_literal(*value),
            Self::Boolean(value) => visitor.visit_boolean_literal(*value),
            Self::Call(call) => visitor.visit_call(call),
            Self::Binary(binary) => visitor.visit_binary_expression(binary),
        }
    }
}

pub fn walk_program<'source, V: Visitor<'source>>(
    visitor: &mut V,
    program: &Program<'source>,
) -> Result<(), V::Error> {
    program
        .body
        .iter()
        .try_for_each(|statement| statement.accept(visitor))
}

pub fn walk_block<'source, V: Visitor<'source>>(
    visitor: &mut V,
    block: &Block<'source>,
) -> Result<(), V::Error> {
    block
        .statements
        .iter()
        .try_for_each(|statement| statement.accept(visitor))
}

pub fn walk_variable_declaration<'source, V: Visitor<'source>>(
    visitor: &mut V,
    declaration: &VariableDeclaration<'source>,
) -> Result<(), V::Error> {
    match &declaration.init {
        Some(init) => init.accept(visitor),
        None => Ok(()),
    }
}

pub fn walk_for<'source, V: Visitor<'source>>(
    visitor: &mut V,
    for_loop: &For<'source>,
) -> Result<(), V::Error> {
    for_loop.init.accept(visitor)?;
    for_loop.test.accept(visitor)?;
    visitor.visit_assignment(&for_loop.update)?;
    for_loop.body.accept(visitor)
}

pub fn walk_while<'source, V: Visitor<'source>>(
    visitor: &mut V,
    while_loop: &While<'source>,
) -> Result<(), V::Error> {
    while_loop.test.accept(visitor)?;
    while_loop.body.accept(visitor)
}

pub fn walk_if<'source, V: Visitor<'source>>(
    visitor: &mut V,
    if_stmt: &If<'source>,
) -> Result<(), V::Error> {
    if_stmt.test.accept(visitor)?;
    if_stmt.consequent.accept(visitor)?;
    match &if_stmt.alternate {
        Some(alternate) => alternate.accept(visitor),
        None => Ok(()),
    }
}

pub fn walk_call<'source, V: Visitor<'source>>(
    visitor: &mut V,
    call: &Call<'source>,
) -> Result<(), V::Error> {
    call.arguments
        .iter()
        .try_for_each(|argument| argument.accept(visitor))
}

pub fn walk_binary_expression<'source, V: Visitor<'source>>(
    visitor: &mut V,
    binary: &BinaryExpression<'source>,
) -> Result<(), V::Error> {
    binary.left.accept(visitor)?;
    binary.right.accept(visitor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceMetadata;
    use std::convert::Infallible;

    fn parse(source: &str) -> Program {
        crate::grammar::parse_source(&SourceMetadata::new(source))
            .unwrap()
            .program
    }

    #[derive(Default)]
    struct Literals(Vec<i32>);

    impl<'source> Visitor<'source> for Literals {
        type Error = Infallible;
        fn visit_integer_literal(&mut self, value: i32) -> Result<(), Infallible> {
            self.0.push(value);
            Ok(())
        }
    }

    #[derive(Default)]
    struct Operators {
        seen: Vec<BinaryOperator>,
        literals: usize,
    }

    // does not recurse into the operands
    impl<'source> Visitor<'source> for Operators {
        type Error = Infallible;
        fn visit_binary_expression(
            &mut self,
            binary: &BinaryExpression<'source>,
        ) -> Result<(), Infallible> {
            self.seen.push(binary.operator);
            Ok(())
        }
        fn visit_integer_literal(&mut self, _: i32) -> Result<(), Infallible> {
            self.literals += 1;
            Ok(())
        }
    }

    #[derive(Default)]
    struct Calls<'source>(Vec<&'source str>);

    impl<'source> Visitor<'source> for Calls<'source> {
        type Error = &'static str;
        fn visit_call(&mut self, call: &Call<'source>) -> Result<(), Self::Error> {
            if call.id == "abort" {
                return Err("abort called");
            }
            self.0.push(call.id);
            walk_call(self, call)
        }
    }

    #[test]
    fn default_traversal_reaches_every_literal_in_order() {
        let program = parse(
            "var a = 1; a = 2; { 3; } \
             for (var i = 4; 5; i = 6) 7; \
             while (8) { 9; } \
             if (10) 11; else if (12) 13; else 14; \
             print(15 + 16 * 17);",
        );
        let mut literals = Literals::default();
        program.accept(&mut literals).unwrap();
        assert_eq!(literals.0, (1..=17).collect::<Vec<_>>());
    }

    #[test]
    fn override_replaces_the_recursion() {
        let program = parse("2 * 3 + 1; 4;");
        let mut ops = Operators::default();
        program.accept(&mut ops).unwrap();
        assert_eq!(ops.seen, vec![BinaryOperator::Add]);
        assert_eq!(ops.literals, 1);
    }

    #[test]
    fn errors_stop_the_traversal() {
        let program = parse("first(second(1)); abort(); third();");
        let mut calls = Calls::default();
        assert_eq!(program.accept(&mut calls), Err("abort called"));
        assert_eq!(calls.0, vec!["first", "second"]);
    }
}
