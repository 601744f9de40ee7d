use std::fmt::{self, Display};

use crate::{lex::Token, LoxNumber};

/// A literal value in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Literal<'a> {
    Number(LoxNumber),
    String(&'a str),
    True,
    False,
    Nil,
}

/// The unary operators in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    LogicalNot,
}

impl<'a> From<&Token<'a>> for UnaryOp {
    /// Constructs a `UnaryOp` from it's equivalent `Token` counterpart.
    /// Panics if the token is not a valid unary operator.
    fn from(token: &Token<'a>) -> Self {
        match token {
            Token::Minus => UnaryOp::Minus,
            Token::Bang => UnaryOp::LogicalNot,
            _ => unreachable!("Invalid token for unary operator"),
        }
    }
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnaryOp::Minus => write!(f, "-"),
            UnaryOp::LogicalNot => write!(f, "!"),
        }
    }
}

/// The binary operators in the Lox language.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BinaryOp {
    // Relational
    Equal,
    NotEqual,
    GreaterThan,
    GreaterThanEqual,
    LessThan,
    LessThanEqual,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
}

impl<'a> From<&Token<'a>> for BinaryOp {
    /// Constructs a `BinaryOp` from it's equivalent `Token` counterpart.
    /// Panics if the token is not a valid binary operator.
    fn from(token: &Token<'a>) -> Self {
        match token {
            Token::BangEqual => BinaryOp::NotEqual,
            Token::EqualEqual => BinaryOp::Equal,
            Token::Greater => BinaryOp::GreaterThan,
            Token::GreaterEqual => BinaryOp::GreaterThanEqual,
            Token::Less => BinaryOp::LessThan,
            Token::LessEqual => BinaryOp::LessThanEqual,
            Token::Plus => BinaryOp::Add,
            Token::Minus => BinaryOp::Sub,
            Token::Star => BinaryOp::Mul,
            Token::Slash => BinaryOp::Div,
            _ => unreachable!("Invalid token for binary operator"),
        }
    }
}

impl Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::GreaterThan => ">",
            BinaryOp::GreaterThanEqual => ">=",
            BinaryOp::LessThan => "<",
            BinaryOp::LessThanEqual => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        };
        write!(f, "{symbol}")
    }
}

/// An expression in the Lox language.
///
/// Operator and name nodes remember the line of the token they were built from so runtime
/// errors can point back at the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr<'a> {
    /// A literal value.
    Literal(Literal<'a>),

    /// An identifier referring to a global variable.
    Variable { identifier: &'a str, line: u32 },

    /// An assignment to a variable, evaluating to the assigned value.
    Assign {
        identifier: &'a str,
        expr: Box<Expr<'a>>,
        line: u32,
    },

    /// A binary operation. Includes relational and arithmetic operations.
    Binary {
        left: Box<Expr<'a>>,
        op: BinaryOp,
        right: Box<Expr<'a>>,
        line: u32,
    },

    /// A unary operation. Includes negation and logical NOT.
    Unary {
        op: UnaryOp,
        expr: Box<Expr<'a>>,
        line: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDecl<'a> {
    pub identifier: &'a str,
    pub expr: Option<Expr<'a>>,
    pub line: u32,
}

/// A statement in the Lox language.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// An expression statement.
    /// Its value is echoed back when running an interactive session.
    Expr(Expr<'a>),

    /// The `var`iable declaration statement.
    /// Binds a global with an optional initial value, `nil` when absent. Redeclaring overwrites.
    VarDecl(VarDecl<'a>),

    /// The `print` statement.
    /// Writes the textual representation of the expression to the interpreter's output.
    Print(Expr<'a>),
}

// Fully parenthesized prefix notation, mostly for logs and tests.

impl Display for Literal<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{n}"),
            Literal::String(s) => write!(f, "{s:?}"),
            Literal::True => write!(f, "true"),
            Literal::False => write!(f, "false"),
            Literal::Nil => write!(f, "nil"),
        }
    }
}

impl Display for Expr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Variable { identifier, .. } => write!(f, "{identifier}"),
            Expr::Assign {
                identifier, expr, ..
            } => write!(f, "(= {identifier} {expr})"),
            Expr::Binary {
                left, op, right, ..
            } => write!(f, "({op} {left} {right})"),
            Expr::Unary { op, expr, .. } => write!(f, "({op} {expr})"),
        }
    }
}

impl Display for Stmt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Expr(expr) => write!(f, "(expr {expr})"),
            Stmt::Print(expr) => write!(f, "(print {expr})"),
            Stmt::VarDecl(VarDecl {
                identifier,
                expr: Some(expr),
                ..
            }) => write!(f, "(var {identifier} {expr})"),
            Stmt::VarDecl(VarDecl {
                identifier,
                expr: None,
                ..
            }) => write!(f, "(var {identifier})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: LoxNumber) -> Box<Expr<'static>> {
        Box::new(Expr::Literal(Literal::Number(n)))
    }

    #[test]
    fn expressions_print_in_prefix_form() {
        let expr = Expr::Binary {
            left: number(1.0),
            op: BinaryOp::Add,
            right: Box::new(Expr::Binary {
                left: number(2.5),
                op: BinaryOp::Mul,
                right: Box::new(Expr::Unary {
                    op: UnaryOp::Minus,
                    expr: Box::new(Expr::Variable {
                        identifier: "x",
                        line: 1,
                    }),
                    line: 1,
                }),
                line: 1,
            }),
            line: 1,
        };

        assert_eq!(expr.to_string(), "(+ 1 (* 2.5 (- x)))");
    }

    #[test]
    fn statements_print_in_prefix_form() {
        let declaration = Stmt::VarDecl(VarDecl {
            identifier: "greeting",
            expr: Some(Expr::Literal(Literal::String("hi"))),
            line: 1,
        });
        let empty = Stmt::VarDecl(VarDecl {
            identifier: "x",
            expr: None,
            line: 2,
        });
        let assignment = Stmt::Expr(Expr::Assign {
            identifier: "x",
            expr: Box::new(Expr::Literal(Literal::Nil)),
            line: 3,
        });
        let print = Stmt::Print(Expr::Unary {
            op: UnaryOp::LogicalNot,
            expr: Box::new(Expr::Literal(Literal::True)),
            line: 4,
        });

        assert_eq!(declaration.to_string(), "(var greeting \"hi\")");
        assert_eq!(empty.to_string(), "(var x)");
        assert_eq!(assignment.to_string(), "(expr (= x nil))");
        assert_eq!(print.to_string(), "(print (! true))");
    }

    #[test]
    fn operators_convert_from_tokens() {
        assert_eq!(BinaryOp::from(&Token::LessEqual), BinaryOp::LessThanEqual);
        assert_eq!(BinaryOp::from(&Token::Slash), BinaryOp::Div);
        assert_eq!(UnaryOp::from(&Token::Bang), UnaryOp::LogicalNot);
    }
}
