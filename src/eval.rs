//! Direct evaluation of a program, mirroring what the generated code computes: 32-bit
//! wrapping integers, unsigned division, signed comparisons yielding 0 or 1.
use thiserror::Error;

use crate::ast::visit::Visitor;
use crate::ast::{BinaryExpression, BinaryOperator, Call, Expression, For, If, While};
use crate::ir::generate::PRINT;

pub const DEFAULT_LOOP_LIMIT: usize = 1_000_000;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("unknown function: {0:?}")]
    UnknownFunction(String),
    #[error("`print` takes exactly one argument, but {found} were given")]
    PrintArity { found: usize },
    #[error("loop did not finish after {0} iterations")]
    LoopLimit(usize),
}

#[derive(Debug)]
pub struct Interpreter {
    /// Value of every expression statement executed, in order.
    results: Vec<i32>,
    /// One entry per `print` call.
    output: Vec<String>,
    loop_limit: usize,
    value: i32,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_loop_limit(DEFAULT_LOOP_LIMIT)
    }
    pub fn with_loop_limit(loop_limit: usize) -> Self {
        Self {
            results: Vec::new(),
            output: Vec::new(),
            loop_limit,
            value: 0,
        }
    }
    pub fn results(&self) -> &[i32] {
        &self.results
    }
    pub fn output(&self) -> &[String] {
        &self.output
    }

    fn evaluate(&mut self, expr: &Expression) -> Result<i32, EvalError> {
        expr.accept(self)?;
        Ok(self.value)
    }

    fn truthy(&mut self, test: &Expression) -> Result<bool, EvalError> {
        self.evaluate(test).map(|value| value != 0)
    }

    /// Runs `step` until `test` is false, bounded by the loop limit.
    fn run_loop<F>(&mut self, test: &Expression, mut step: F) -> Result<(), EvalError>
    where
        F: FnMut(&mut Self) -> Result<(), EvalError>,
    {
        let mut iterations = 0;
        while self.truthy(test)? {
            if iterations == self.loop_limit {
                return Err(EvalError::LoopLimit(self.loop_limit));
            }
            iterations += 1;
            step(self)?;
        }
        tracing::trace!(target: "eval", "loop finished after {iterations} iterations");
        Ok(())
    }
}

fn apply(operator: BinaryOperator, lhs: i32, rhs: i32) -> Result<i32, EvalError> {
    Ok(match operator {
        BinaryOperator::Add => lhs.wrapping_add(rhs),
        BinaryOperator::Subtract => lhs.wrapping_sub(rhs),
        BinaryOperator::Multiply => lhs.wrapping_mul(rhs),
        BinaryOperator::Divide => (lhs as u32)
            .checked_div(rhs as u32)
            .ok_or(EvalError::DivisionByZero)? as i32,
        BinaryOperator::Equal => (lhs == rhs) as i32,
        BinaryOperator::Less => (lhs < rhs) as i32,
        BinaryOperator::LessEqual => (lhs <= rhs) as i32,
        BinaryOperator::Greater => (lhs > rhs) as i32,
        BinaryOperator::GreaterEqual => (lhs >= rhs) as i32,
    })
}

impl<'source> Visitor<'source> for Interpreter {
    type Error = EvalError;

    fn visit_expression_statement(&mut self, expr: &Expression<'source>) -> Result<(), EvalError> {
        let value = self.evaluate(expr)?;
        tracing::debug!(target: "eval", "expression statement = {value}");
        self.results.push(value);
        Ok(())
    }

    fn visit_integer_literal(&mut self, value: i32) -> Result<(), EvalError> {
        self.value = value;
        Ok(())
    }

    fn visit_boolean_literal(&mut self, value: bool) -> Result<(), EvalError> {
        self.value = value as i32;
        Ok(())
    }

    fn visit_binary_expression(
        &mut self,
        binary: &BinaryExpression<'source>,
    ) -> Result<(), EvalError> {
        let lhs = self.evaluate(&binary.left)?;
        let rhs = self.evaluate(&binary.right)?;
        self.value = apply(binary.operator, lhs, rhs)?;
        Ok(())
    }

    fn visit_call(&mut self, call: &Call<'source>) -> Result<(), EvalError> {
        if call.id != PRINT {
            return Err(EvalError::UnknownFunction(call.id.to_string()));
        }
        let [argument] = call.arguments.as_slice() else {
            return Err(EvalError::PrintArity {
                found: call.arguments.len(),
            });
        };
        let line = self.evaluate(argument)?.to_string();
        // printf's result: bytes written, newline included
        self.value = line.len() as i32 + 1;
        self.output.push(line);
        Ok(())
    }

    fn visit_if(&mut self, if_stmt: &If<'source>) -> Result<(), EvalError> {
        if self.truthy(&if_stmt.test)? {
            if_stmt.consequent.accept(self)
        } else if let Some(alternate) = &if_stmt.alternate {
            alternate.accept(self)
        } else {
            Ok(())
        }
    }

    fn visit_else_if(&mut self, else_if: &If<'source>) -> Result<(), EvalError> {
        self.visit_if(else_if)
    }

    fn visit_while(&mut self, while_loop: &While<'source>) -> Result<(), EvalError> {
        self.run_loop(&while_loop.test, |this| while_loop.body.accept(this))
    }

    fn visit_for(&mut self, for_loop: &For<'source>) -> Result<(), EvalError> {
        for_loop.init.accept(self)?;
        self.run_loop(&for_loop.test, |this| {
            for_loop.body.accept(this)?;
            this.visit_assignment(&for_loop.update)
        })
    }
}
