//! Lowering of the AST into [`Instruction`]s.
//!
//! Every literal and every intermediate result gets its own stack slot: the value is stored
//! right after being computed and loaded again by whoever consumes it. Conditions are loaded
//! and compared against zero before branching.
use super::module::{Module, TargetConfig};
use super::{
    ArithmeticOp, CodeGenContext, CodegenError, Condition, Instruction, Label, Operand, Register,
};
use crate::ast::visit::{self, Visitor};
use crate::ast::{
    Assignment, BinaryExpression, BinaryOperator, Call, Expression, For, If, Program, Statement,
    While,
};

/// The only call target the language knows about.
pub const PRINT: &str = "print";

pub struct CodeGenerator {
    ctx: CodeGenContext,
    /// Slot holding the value of the last lowered expression.
    value: Option<Register>,
}

impl CodeGenerator {
    pub fn new(ctx: CodeGenContext) -> Self {
        Self { ctx, value: None }
    }

    pub fn into_context(self) -> CodeGenContext {
        self.ctx
    }

    fn materialize(&mut self, value: Operand) -> Register {
        let slot = self.ctx.next_register();
        self.ctx.push(Instruction::Alloca { slot });
        self.ctx.push(Instruction::Store { value, slot });
        slot
    }

    /// Lowers `expr` and returns the slot holding its value.
    fn lower(&mut self, expr: &Expression) -> Result<Register, CodegenError> {
        expr.accept(self)?;
        self.value.take().ok_or(CodegenError::MissingValue)
    }

    fn load(&mut self, slot: Register) -> Register {
        let target = self.ctx.next_register();
        self.ctx.push(Instruction::Load { target, slot });
        target
    }

    /// `i1` flag that is set when `test` is not zero.
    fn condition(&mut self, test: &Expression) -> Result<Register, CodegenError> {
        let slot = self.lower(test)?;
        let value = self.load(slot);
        let flag = self.ctx.next_register();
        self.ctx.push(Instruction::Compare {
            target: flag,
            condition: Condition::NotEqual,
            lhs: value,
            rhs: Operand::Constant(0),
        });
        Ok(flag)
    }

    fn start_block(&mut self, label: Label) {
        self.ctx.push(Instruction::Block(label));
    }

    /// Ends the current block.
    fn jump(&mut self, to: Label) {
        self.ctx.push(Instruction::Jump(to));
    }

    /// Loop skeleton shared by `while` and `for`: `cond` tests, `body` runs, `step` (if any)
    /// runs after the body on every iteration.
    fn lower_loop<'source>(
        &mut self,
        name: LoopLabels,
        test: &Expression<'source>,
        body: &Statement<'source>,
        step: Option<&Assignment<'source>>,
    ) -> Result<(), CodegenError> {
        let cond = self.ctx.new_label(name.cond);
        let body_label = self.ctx.new_label(name.body);
        let step_label = step.map(|_| self.ctx.new_label(name.step));
        let end = self.ctx.new_label(name.end);

        self.jump(cond);
        self.start_block(cond);
        let flag = self.condition(test)?;
        self.ctx.push(Instruction::Branch {
            flag,
            on_true: body_label,
            on_false: end,
        });

        self.start_block(body_label);
        body.accept(self)?;
        if let (Some(step), Some(step_label)) = (step, step_label) {
            self.jump(step_label);
            self.start_block(step_label);
            self.visit_assignment(step)?;
        }
        self.jump(cond);
        self.start_block(end);
        Ok(())
    }
}

struct LoopLabels {
    cond: &'static str,
    body: &'static str,
    step: &'static str,
    end: &'static str,
}

const WHILE_LABELS: LoopLabels = LoopLabels {
    cond: "while.cond",
    body: "while.body",
    step: "while.step",
    end: "while.end",
};

const FOR_LABELS: LoopLabels = LoopLabels {
    cond: "for.cond",
    body: "for.body",
    step: "for.inc",
    end: "for.end",
};

const fn arithmetic(op: BinaryOperator) -> Result<ArithmeticOp, Condition> {
    match op {
        BinaryOperator::Add => Ok(ArithmeticOp::Add),
        BinaryOperator::Subtract => Ok(ArithmeticOp::Subtract),
        BinaryOperator::Multiply => Ok(ArithmeticOp::Multiply),
        BinaryOperator::Divide => Ok(ArithmeticOp::UnsignedDivide),
        BinaryOperator::Equal => Err(Condition::Equal),
        BinaryOperator::Less => Err(Condition::SignedLess),
        BinaryOperator::LessEqual => Err(Condition::SignedLessEqual),
        BinaryOperator::Greater => Err(Condition::SignedGreater),
        BinaryOperator::GreaterEqual => Err(Condition::SignedGreaterEqual),
    }
}

impl<'source> Visitor<'source> for CodeGenerator {
    type Error = CodegenError;

    fn visit_expression_statement(
        &mut self,
        expr: &Expression<'source>,
    ) -> Result<(), Self::Error> {
        self.lower(expr).map(drop)
    }

    fn visit_integer_literal(&mut self, value: i32) -> Result<(), Self::Error> {
        self.value = Some(self.materialize(Operand::Constant(value)));
        Ok(())
    }

    fn visit_boolean_literal(&mut self, value: bool) -> Result<(), Self::Error> {
        self.value = Some(self.materialize(Operand::Constant(value as i32)));
        Ok(())
    }

    fn visit_binary_expression(
        &mut self,
        binary: &BinaryExpression<'source>,
    ) -> Result<(), Self::Error> {
        let left = self.lower(&binary.left)?;
        let right = self.lower(&binary.right)?;
        let lhs = self.load(left);
        let rhs = self.load(right);
        let result = self.ctx.next_register();
        let result = match arithmetic(binary.operator) {
            Ok(op) => {
                self.ctx.push(Instruction::Arithmetic {
                    target: result,
                    op,
                    lhs,
                    rhs,
                });
                result
            }
            Err(condition) => {
                self.ctx.push(Instruction::Compare {
                    target: result,
                    condition,
                    lhs,
                    rhs: Operand::Register(rhs),
                });
                let widened = self.ctx.next_register();
                self.ctx.push(Instruction::ZeroExtend {
                    target: widened,
                    value: result,
                });
                widened
            }
        };
        self.value = Some(self.materialize(Operand::Register(result)));
        Ok(())
    }

    fn visit_call(&mut self, call: &Call<'source>) -> Result<(), Self::Error> {
        if call.id != PRINT {
            return Err(CodegenError::UnknownFunction(call.id.to_string()));
        }
        let argument = match call.arguments.as_slice() {
            [argument] => argument,
            arguments => {
                return Err(CodegenError::PrintArity {
                    found: arguments.len(),
                })
            }
        };
        let format = self.ctx.print_support();
        let slot = self.lower(argument)?;
        let argument = self.load(slot);
        let target = self.ctx.next_register();
        self.ctx.push(Instruction::CallPrintf {
            target,
            format,
            argument,
        });
        self.value = Some(self.materialize(Operand::Register(target)));
        Ok(())
    }

    fn visit_if(&mut self, if_stmt: &If<'source>) -> Result<(), Self::Error> {
        let flag = self.condition(&if_stmt.test)?;
        let then = self.ctx.new_label("if.then");
        let otherwise = if_stmt
            .alternate
            .as_ref()
            .map(|_| self.ctx.new_label("if.else"));
        let end = self.ctx.new_label("if.end");

        self.ctx.push(Instruction::Branch {
            flag,
            on_true: then,
            on_false: otherwise.unwrap_or(end),
        });
        self.start_block(then);
        if_stmt.consequent.accept(self)?;
        self.jump(end);

        if let (Some(alternate), Some(otherwise)) = (&if_stmt.alternate, otherwise) {
            self.start_block(otherwise);
            alternate.accept(self)?;
            self.jump(end);
        }
        self.start_block(end);
        Ok(())
    }

    fn visit_else_if(&mut self, else_if: &If<'source>) -> Result<(), Self::Error> {
        self.visit_if(else_if)
    }

    fn visit_while(&mut self, while_loop: &While<'source>) -> Result<(), Self::Error> {
        self.lower_loop(WHILE_LABELS, &while_loop.test, &while_loop.body, None)
    }

    fn visit_for(&mut self, for_loop: &For<'source>) -> Result<(), Self::Error> {
        for_loop.init.accept(self)?;
        self.lower_loop(
            FOR_LABELS,
            &for_loop.test,
            &for_loop.body,
            Some(&for_loop.update),
        )
    }

    fn visit_program(&mut self, program: &Program<'source>) -> Result<(), Self::Error> {
        tracing::debug!(target: "irgen", "generating {} top level statements", program.body.len());
        visit::walk_program(self, program)
    }
}

/// Generates the body of `program` into `ctx`, returning the context with everything the body
/// registered.
pub fn generate(program: &Program, ctx: CodeGenContext) -> Result<CodeGenContext, CodegenError> {
    let mut generator = CodeGenerator::new(ctx);
    program.accept(&mut generator)?;
    Ok(generator.into_context())
}

/// Generates and renders a whole module for `program`.
pub fn compile_program(
    program: &Program,
    name: &str,
    target: &TargetConfig,
) -> Result<String, CodegenError> {
    let ctx = generate(program, CodeGenContext::new())?;
    Module::from_context(name, target.clone(), ctx).render()
}
