//! A tree-walk interpreter for a small subset of Lox: globals, `print` and expressions over
//! numbers, strings, booleans and `nil`.
//!
//! Source goes through [`lex::Lexer`], [`syntax::Parser`] and finally [`rt::TreeWalker`]; [`run`]
//! chains the three.
//!
//! ```
//! use treelox::rt::{Mode, TreeWalker};
//!
//! let mut walker = TreeWalker::new(Vec::new(), Mode::Script);
//! treelox::run("var x = 5; print x + 1;", &mut walker)?;
//! assert_eq!(walker.output(), b"6\n");
//! # Ok::<(), treelox::LoxError>(())
//! ```

use std::{fmt::Display, io::Write};

pub mod ast;
pub mod env;
pub mod lex;
pub mod rt;
pub mod syntax;
pub mod value;

/// The representation used by all Lox numbers and their arithmetic operations.
pub type LoxNumber = f64;

/// The representation of integral values handed in by a host.
pub type LoxInteger = i64;

/// Everything wrong with a source text before it runs.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub lex_errors: Vec<lex::LexError>,
    pub parse_errors: Vec<syntax::ParseError>,
}

impl Diagnostics {
    pub fn is_empty(&self) -> bool {
        self.lex_errors.is_empty() && self.parse_errors.is_empty()
    }
}

impl Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.lex_errors.is_empty() {
            writeln!(f, "Lexing errors:")?;
            for error in &self.lex_errors {
                writeln!(f, "- {error}")?;
            }
        }

        if !self.parse_errors.is_empty() {
            writeln!(f, "Parsing errors:")?;
            for error in &self.parse_errors {
                writeln!(f, "- {error}")?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoxError {
    #[error("{0}")]
    Syntax(Diagnostics),

    #[error("[RUNTIME ERROR] {0}")]
    Runtime(#[from] rt::RuntimeError),
}

impl LoxError {
    /// The process exit status for this error, following the sysexits convention.
    pub fn exit_code(&self) -> u8 {
        match self {
            // EX_DATAERR
            LoxError::Syntax(_) => 65,
            // EX_SOFTWARE
            LoxError::Runtime(_) => 70,
        }
    }
}

/// Lexes, parses and executes `source` in the walker's session.
///
/// Nothing runs unless the whole source lexes and parses cleanly, in which case every problem found
/// is reported at once.
pub fn run<W: Write>(
    source: &str,
    walker: &mut rt::TreeWalker<W>,
) -> Result<Option<value::Value>, LoxError> {
    let (tokens, lex_errors) = lex::Lexer::new(source).lex();
    let (statements, parse_errors) = syntax::Parser::new(&tokens).parse();

    let diagnostics = Diagnostics {
        lex_errors,
        parse_errors,
    };
    if !diagnostics.is_empty() {
        return Err(LoxError::Syntax(diagnostics));
    }

    Ok(walker.execute(&statements)?)
}
