use core::slice::Iter;
use std::{fmt::Display, iter::Peekable};

use tracing::{debug, trace};

use crate::{
    ast::{BinaryOp, Expr, Literal, Stmt, UnaryOp, VarDecl},
    lex::{Token, TokenInfo},
};

/// How deeply expressions may nest before the parser gives up.
pub const MAX_DEPTH: usize = 256;

/// Stands in for the end of the stream if the caller's tokens lack the sentinel.
static END_OF_INPUT: TokenInfo<'static> = TokenInfo {
    token: Token::EndOfFile,
    lexeme: "",
    line: 0,
};

/// The token a parse error was raised at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorToken {
    pub lexeme: String,
    pub line: u32,
}

impl From<&TokenInfo<'_>> for ErrorToken {
    fn from(info: &TokenInfo<'_>) -> Self {
        let lexeme = if let Token::EndOfFile = info.token {
            "EOF"
        } else {
            info.lexeme
        };

        ErrorToken {
            lexeme: lexeme.to_owned(),
            line: info.line,
        }
    }
}

impl Display for ErrorToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "\"{}\" @ line {}", self.lexeme, self.line)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Expected ')' after expression instead of {0}.")]
    UnmatchedParens(ErrorToken),

    #[error("Expected a semicolon instead of {0}.")]
    MissingSemicolon(ErrorToken),

    #[error("Expected a variable name instead of {0}.")]
    ExpectedIdentifier(ErrorToken),

    #[error("Expected an expression instead of {0}.")]
    ExpectedExpression(ErrorToken),

    #[error("Invalid assignment target before {0}.")]
    InvalidAssignmentTarget(ErrorToken),

    #[error("Keyword {0} is reserved and not supported yet.")]
    ReservedKeyword(ErrorToken),

    #[error("Expression nested deeper than {limit} levels at {at}.")]
    NestingTooDeep { limit: usize, at: ErrorToken },
}

impl ParseError {
    pub fn line(&self) -> u32 {
        match self {
            Self::UnmatchedParens(found)
            | Self::MissingSemicolon(found)
            | Self::ExpectedIdentifier(found)
            | Self::ExpectedExpression(found)
            | Self::InvalidAssignmentTarget(found)
            | Self::ReservedKeyword(found)
            | Self::NestingTooDeep { at: found, .. } => found.line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Parser<'a> {
    tokens: Peekable<Iter<'a, TokenInfo<'a>>>,
    depth: usize,
    max_depth: usize,
}

/// Takes a token stream and a pattern, consuming and returning the next token if it matches the
/// pattern, otherwise returns a peek of the next token.
macro_rules! chase {
    ($tokens:expr, $pattern:pat $(if $guard:expr)? $(,)?) => {{
        if let Some(info) = $tokens.next_if(|next| match &next.token {
                $pattern $(if $guard)? => true,
                _ => false,
            }) {
            Found(info)
        } else {
            NotFound($tokens.peek().copied().unwrap_or(&END_OF_INPUT))
        }
    }};
}

/// The type returned by the `chase!` macro.
enum Chased<'a> {
    Found(&'a TokenInfo<'a>),
    NotFound(&'a TokenInfo<'a>),
}
use Chased::*;

type ParseStmt<'a> = Result<Stmt<'a>, ParseError>;
type ParseExpr<'a> = Result<Expr<'a>, ParseError>;

impl<'a> Parser<'a> {
    /// Expects the tokens as produced by the lexer, terminated by [`Token::EndOfFile`].
    pub fn new(tokens: &'a [TokenInfo<'a>]) -> Self {
        Parser {
            tokens: tokens.iter().peekable(),
            depth: 0,
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses a whole program.
    ///
    /// A malformed declaration is recorded and skipped, so the returned statements are the ones
    /// that did parse and the errors cover the whole token stream.
    pub fn parse(self) -> (Vec<Stmt<'a>>, Vec<ParseError>) {
        self.parse_program()
    }

    fn parse_program(mut self) -> (Vec<Stmt<'a>>, Vec<ParseError>) {
        let mut statements = Vec::new();
        let mut errors = Vec::new();

        while !self.at_end() {
            match self.parse_declaration() {
                Ok(statement) => {
                    trace!(%statement, "parsed statement");
                    statements.push(statement);
                }
                Err(error) => {
                    debug!(%error, "recovering from parse error");
                    errors.push(error);
                    self.synchronize();
                }
            }
        }

        (statements, errors)
    }

    fn parse_declaration(&mut self) -> ParseStmt<'a> {
        match chase!(self.tokens, Token::Var) {
            Found(_) => self.parse_var_decl(),
            NotFound(_) => self.parse_statement(),
        }
    }

    fn parse_statement(&mut self) -> ParseStmt<'a> {
        match chase!(self.tokens, Token::Print) {
            Found(_) => self.parse_print(),
            NotFound(_) => self.parse_expr(),
        }
    }

    fn parse_var_decl(&mut self) -> ParseStmt<'a> {
        let (identifier, line) = match chase!(self.tokens, Token::Identifier(_)) {
            Found(&TokenInfo {
                token: Token::Identifier(identifier),
                line,
                ..
            }) => (identifier, line),
            NotFound(info) => return Err(ParseError::ExpectedIdentifier(info.into())),
            _ => unreachable!(),
        };

        let expr = if let Found(_) = chase!(self.tokens, Token::Equal) {
            Some(self.parse_expression()?)
        } else {
            None
        };

        match chase!(self.tokens, Token::Semicolon) {
            Found(_) => Ok(Stmt::VarDecl(VarDecl {
                identifier,
                expr,
                line,
            })),
            NotFound(info) => Err(ParseError::MissingSemicolon(info.into())),
        }
    }

    fn parse_print(&mut self) -> ParseStmt<'a> {
        let expr = self.parse_expression()?;

        match chase!(self.tokens, Token::Semicolon) {
            Found(_) => Ok(Stmt::Print(expr)),
            NotFound(info) => Err(ParseError::MissingSemicolon(info.into())),
        }
    }

    fn parse_expr(&mut self) -> ParseStmt<'a> {
        let expr = self.parse_expression()?;

        match chase!(self.tokens, Token::Semicolon) {
            Found(_) => Ok(Stmt::Expr(expr)),
            NotFound(info) => Err(ParseError::MissingSemicolon(info.into())),
        }
    }

    fn parse_expression(&mut self) -> ParseExpr<'a> {
        self.nested(Self::parse_assignment)
    }

    fn parse_assignment(&mut self) -> ParseExpr<'a> {
        if let Some((identifier, line)) = self.assignment_target() {
            // Step over the identifier and the `=`
            self.tokens.next();
            self.tokens.next();

            let value = self.nested(Self::parse_assignment)?;
            return Ok(Expr::Assign {
                identifier,
                expr: Box::new(value),
                line,
            });
        }

        let expr = self.parse_equality()?;

        match chase!(self.tokens, Token::Equal) {
            Found(info) => Err(ParseError::InvalidAssignmentTarget(info.into())),
            NotFound(_) => Ok(expr),
        }
    }

    /// Looks two tokens ahead for an `IDENTIFIER "="` pair.
    fn assignment_target(&self) -> Option<(&'a str, u32)> {
        let mut ahead = self.tokens.clone();

        match (ahead.next(), ahead.next()) {
            (
                Some(&TokenInfo {
                    token: Token::Identifier(identifier),
                    line,
                    ..
                }),
                Some(TokenInfo {
                    token: Token::Equal,
                    ..
                }),
            ) => Some((identifier, line)),
            _ => None,
        }
    }

    fn parse_equality(&mut self) -> ParseExpr<'a> {
        self.folded(|parser| {
            let mut expr = parser.parse_comparison()?;

            while let Found(info) = chase!(parser.tokens, Token::BangEqual | Token::EqualEqual) {
                parser.deepen(info)?;
                let right = parser.parse_comparison()?;
                expr = Self::binary(expr, info, right);
            }

            Ok(expr)
        })
    }

    fn parse_comparison(&mut self) -> ParseExpr<'a> {
        self.folded(|parser| {
            let mut expr = parser.parse_term()?;

            while let Found(info) = chase!(
                parser.tokens,
                Token::Greater | Token::GreaterEqual | Token::Less | Token::LessEqual
            ) {
                parser.deepen(info)?;
                let right = parser.parse_term()?;
                expr = Self::binary(expr, info, right);
            }

            Ok(expr)
        })
    }

    fn parse_term(&mut self) -> ParseExpr<'a> {
        self.folded(|parser| {
            let mut expr = parser.parse_factor()?;

            while let Found(info) = chase!(parser.tokens, Token::Minus | Token::Plus) {
                parser.deepen(info)?;
                let right = parser.parse_factor()?;
                expr = Self::binary(expr, info, right);
            }

            Ok(expr)
        })
    }

    fn parse_factor(&mut self) -> ParseExpr<'a> {
        self.folded(|parser| {
            let mut expr = parser.parse_unary()?;

            while let Found(info) = chase!(parser.tokens, Token::Slash | Token::Star) {
                parser.deepen(info)?;
                let right = parser.parse_unary()?;
                expr = Self::binary(expr, info, right);
            }

            Ok(expr)
        })
    }

    fn parse_unary(&mut self) -> ParseExpr<'a> {
        if let Found(info) = chase!(self.tokens, Token::Bang | Token::Minus) {
            let op = UnaryOp::from(&info.token);
            let right = self.nested(Self::parse_unary)?;
            return Ok(Expr::Unary {
                op,
                expr: Box::new(right),
                line: info.line,
            });
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> ParseExpr<'a> {
        match chase!(
            self.tokens,
            Token::Number(_)
                | Token::String(_)
                | Token::Identifier(_)
                | Token::True
                | Token::False
                | Token::Nil
                | Token::LeftParen
        ) {
            Found(info) => match info.token {
                Token::Number(num) => Ok(Expr::Literal(Literal::Number(num))),
                Token::String(str) => Ok(Expr::Literal(Literal::String(str))),
                Token::Identifier(identifier) => Ok(Expr::Variable {
                    identifier,
                    line: info.line,
                }),
                Token::True => Ok(Expr::Literal(Literal::True)),
                Token::False => Ok(Expr::Literal(Literal::False)),
                Token::Nil => Ok(Expr::Literal(Literal::Nil)),
                Token::LeftParen => {
                    let expr = self.parse_expression()?;
                    match chase!(self.tokens, Token::RightParen) {
                        Found(_) => Ok(expr),
                        NotFound(info) => Err(ParseError::UnmatchedParens(info.into())),
                    }
                }
                _ => unreachable!(),
            },
            NotFound(info) if info.token.is_reserved() => {
                Err(ParseError::ReservedKeyword(info.into()))
            }
            NotFound(info) => Err(ParseError::ExpectedExpression(info.into())),
        }
    }

    fn binary(left: Expr<'a>, info: &TokenInfo<'a>, right: Expr<'a>) -> Expr<'a> {
        Expr::Binary {
            left: Box::new(left),
            op: BinaryOp::from(&info.token),
            right: Box::new(right),
            line: info.line,
        }
    }

    /// Runs `parse` one nesting level deeper, failing once the depth limit is hit.
    fn nested(&mut self, parse: impl FnOnce(&mut Self) -> ParseExpr<'a>) -> ParseExpr<'a> {
        let at = self.tokens.peek().copied().unwrap_or(&END_OF_INPUT);
        self.deepen(at)?;
        let result = parse(self);
        self.depth -= 1;

        result
    }

    /// Runs a loop of binary folds, giving back the depth they took on once it is done.
    ///
    /// Every fold puts the expression built so far one level further down the tree, so a long
    /// operator chain counts against the limit just like nested parentheses do.
    fn folded(&mut self, parse: impl FnOnce(&mut Self) -> ParseExpr<'a>) -> ParseExpr<'a> {
        let depth = self.depth;
        let result = parse(self);
        self.depth = depth;

        result
    }

    fn deepen(&mut self, at: &TokenInfo<'_>) -> Result<(), ParseError> {
        if self.depth >= self.max_depth {
            return Err(ParseError::NestingTooDeep {
                limit: self.max_depth,
                at: at.into(),
            });
        }

        self.depth += 1;
        Ok(())
    }

    fn at_end(&mut self) -> bool {
        self.tokens
            .peek()
            .map_or(true, |info| info.token == Token::EndOfFile)
    }

    fn synchronize(&mut self) {
        // Discard tokens until the end of the broken statement or the start of the next one
        while let Some(info) = self.tokens.peek() {
            match info.token {
                Token::EndOfFile | Token::Var | Token::Print => return,
                Token::Semicolon => {
                    self.tokens.next();
                    return;
                }
                _ => {
                    self.tokens.next();
                }
            }
        }
    }
}
