use std::io::{self, Write};

use tracing::{debug, trace};

use crate::{
    ast::{BinaryOp, Expr, Literal, Stmt, UnaryOp, VarDecl},
    env::{Environment, Globals},
    value::Value,
};

/// How deeply expressions may nest before evaluation gives up.
pub const MAX_DEPTH: usize = 512;

/// The kind of session statements are executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Running a whole program. Only `print` produces output.
    Script,

    /// A prompt. The value of every expression statement is echoed back as well.
    Interactive,
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Operand of \"{op}\" must be a number, got {operand} @ line {line}.")]
    InvalidOperand {
        op: UnaryOp,
        operand: Value,
        line: u32,
    },

    #[error("Operands of \"{op}\" must be {expected}, got {left} and {right} @ line {line}.")]
    InvalidOperands {
        op: BinaryOp,
        left: Value,
        right: Value,
        expected: &'static str,
        line: u32,
    },

    #[error("Undefined variable \"{name}\" @ line {line}.")]
    UndefinedVariable { name: String, line: u32 },

    #[error("Expression nested deeper than {limit} levels.")]
    NestingTooDeep { limit: usize },

    #[error("Failed to write program output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn line(&self) -> Option<u32> {
        match self {
            Self::InvalidOperand { line, .. }
            | Self::InvalidOperands { line, .. }
            | Self::UndefinedVariable { line, .. } => Some(*line),
            Self::NestingTooDeep { .. } | Self::Output(_) => None,
        }
    }
}

type Evaluation = Result<Value, RuntimeError>;

/// Our tree-walk interpreter.
///
/// One walker is one session: globals defined by a call to [`TreeWalker::execute`] stay visible to
/// every later call.
#[derive(Debug)]
pub struct TreeWalker<W: Write> {
    environment: Globals,
    output: W,
    mode: Mode,
    depth: usize,
    max_depth: usize,
}

impl<W: Write> TreeWalker<W> {
    pub fn new(output: W, mode: Mode) -> Self {
        Self {
            environment: Globals::new(),
            output,
            mode,
            depth: 0,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Makes a host value visible to programs under `name`.
    pub fn define_global(&mut self, name: &str, value: impl Into<Value>) {
        self.environment.define(name, value.into());
    }

    pub fn get_global(&self, name: &str) -> Option<&Value> {
        self.environment.get(name)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Executes the statements in order and returns the value of the last one.
    ///
    /// The first runtime error stops execution and is returned. Bindings made by the statements
    /// before it are kept, the failing statement binds nothing.
    pub fn execute(&mut self, statements: &[Stmt<'_>]) -> Result<Option<Value>, RuntimeError> {
        let mut last_value = None;
        for statement in statements {
            last_value = Some(self.execute_statement(statement)?);
        }
        Ok(last_value)
    }

    fn execute_statement(&mut self, statement: &Stmt<'_>) -> Evaluation {
        trace!(%statement, "executing");
        match statement {
            Stmt::Expr(expr) => self.execute_expression(expr),
            Stmt::VarDecl(var_decl) => self.execute_var_decl(var_decl),
            Stmt::Print(expr) => self.execute_print(expr),
        }
    }

    fn execute_expression(&mut self, expr: &Expr<'_>) -> Evaluation {
        let value = self.evaluate_expression(expr)?;
        if self.mode == Mode::Interactive {
            writeln!(self.output, "{value}")?;
        }
        Ok(value)
    }

    fn execute_var_decl(&mut self, var_decl: &VarDecl<'_>) -> Evaluation {
        let value = var_decl
            .expr
            .as_ref()
            .map(|expr| self.evaluate_expression(expr))
            .transpose()?
            .unwrap_or(Value::Nil);

        debug!(name = var_decl.identifier, %value, "defining variable");
        self.environment.define(var_decl.identifier, value.clone());

        Ok(value)
    }

    fn execute_print(&mut self, expr: &Expr<'_>) -> Evaluation {
        let value = self.evaluate_expression(expr)?;
        writeln!(self.output, "{value}")?;
        Ok(value)
    }

    fn evaluate_expression(&mut self, expr: &Expr<'_>) -> Evaluation {
        if self.depth >= self.max_depth {
            return Err(RuntimeError::NestingTooDeep {
                limit: self.max_depth,
            });
        }

        self.depth += 1;
        let result = match expr {
            Expr::Literal(literal) => Ok(self.evaluate_literal(literal)),
            Expr::Variable { identifier, line } => self.evaluate_variable(identifier, *line),
            Expr::Assign {
                identifier, expr, ..
            } => self.evaluate_assignment(identifier, expr),
            Expr::Binary {
                left,
                op,
                right,
                line,
            } => self.evaluate_binary(left, *op, right, *line),
            Expr::Unary { op, expr, line } => self.evaluate_unary(*op, expr, *line),
        };
        self.depth -= 1;

        result
    }

    fn evaluate_literal(&self, literal: &Literal<'_>) -> Value {
        match literal {
            Literal::Nil => Value::Nil,
            Literal::False => Value::Bool(false),
            Literal::True => Value::Bool(true),
            Literal::Number(n) => Value::Number(*n),
            Literal::String(s) => Value::String(s.to_string()),
        }
    }

    fn evaluate_variable(&self, identifier: &str, line: u32) -> Evaluation {
        self.environment
            .get(identifier)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable {
                name: identifier.to_owned(),
                line,
            })
    }

    fn evaluate_assignment(&mut self, identifier: &str, expr: &Expr<'_>) -> Evaluation {
        let value = self.evaluate_expression(expr)?;
        debug!(name = identifier, %value, "assigning variable");
        self.environment.assign(identifier, value.clone());
        Ok(value)
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr<'_>,
        op: BinaryOp,
        right: &Expr<'_>,
        line: u32,
    ) -> Evaluation {
        let left = self.evaluate_expression(left)?;
        let right = self.evaluate_expression(right)?;

        let result = match op {
            // Relational
            BinaryOp::Equal => Some(Value::Bool(left.equals(&right))),
            BinaryOp::NotEqual => Some(Value::Bool(!left.equals(&right))),
            BinaryOp::GreaterThan => left.greater_than(&right).map(Value::Bool),
            BinaryOp::GreaterThanEqual => left.greater_than_equal(&right).map(Value::Bool),
            BinaryOp::LessThan => left.less_than(&right).map(Value::Bool),
            BinaryOp::LessThanEqual => left.less_than_equal(&right).map(Value::Bool),

            // Arithmetic
            BinaryOp::Add => left.add(&right),
            BinaryOp::Sub => left.sub(&right),
            BinaryOp::Mul => left.mul(&right),
            BinaryOp::Div => left.div(&right),
        };

        result.ok_or_else(|| RuntimeError::InvalidOperands {
            op,
            expected: Self::expected_operands(op),
            left,
            right,
            line,
        })
    }

    fn evaluate_unary(&mut self, op: UnaryOp, expr: &Expr<'_>, line: u32) -> Evaluation {
        let operand = self.evaluate_expression(expr)?;
        match op {
            UnaryOp::Minus => operand
                .negate()
                .ok_or(RuntimeError::InvalidOperand { op, operand, line }),
            UnaryOp::LogicalNot => Ok(Value::Bool(!operand.is_truthy())),
        }
    }

    fn expected_operands(op: BinaryOp) -> &'static str {
        match op {
            BinaryOp::Add => "two numbers or two strings",
            _ => "numbers",
        }
    }
}
