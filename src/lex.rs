use std::{fmt::Display, iter::Peekable, str::CharIndices};

use tracing::trace;

use crate::LoxNumber;

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    source_data: &'src str,
    source: Peekable<CharIndices<'src>>,
    line: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Lexer {
            source_data: source,
            source: source.char_indices().peekable(),
            line: 1,
        }
    }

    /// Scans the whole source.
    ///
    /// Lexical errors don't stop the scan, the offending input is skipped and every error is
    /// collected. The token stream always ends with a single [`Token::EndOfFile`].
    pub fn lex(mut self) -> (Vec<TokenInfo<'src>>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        while let Some((start, c)) = self.source.next() {
            // `process_char` may advance the line counter (strings), a token belongs to the line
            // it starts on
            let line = self.line;

            match self.process_char(start, c) {
                Ok(Some(token)) => {
                    let lexeme = self.lexeme_from(start);
                    tokens.push(TokenInfo {
                        token,
                        lexeme,
                        line,
                    });
                }
                Ok(None) => {}
                Err(error) => {
                    errors.push(error);
                }
            }
        }

        tokens.push(TokenInfo {
            token: Token::EndOfFile,
            lexeme: "",
            line: self.line,
        });

        trace!(tokens = tokens.len(), errors = errors.len(), "lexed source");

        (tokens, errors)
    }

    fn process_char(&mut self, start: usize, c: char) -> Result<Option<Token<'src>>, LexError> {
        match c {
            // Single characters
            '(' => Ok(Some(Token::LeftParen)),
            ')' => Ok(Some(Token::RightParen)),
            '{' => Ok(Some(Token::LeftBrace)),
            '}' => Ok(Some(Token::RightBrace)),
            ',' => Ok(Some(Token::Comma)),
            '.' => Ok(Some(Token::Dot)),
            '-' => Ok(Some(Token::Minus)),
            '+' => Ok(Some(Token::Plus)),
            ';' => Ok(Some(Token::Semicolon)),
            '*' => Ok(Some(Token::Star)),

            // One to two characters
            '!' if self.chase('=') => Ok(Some(Token::BangEqual)),
            '!' => Ok(Some(Token::Bang)),

            '=' if self.chase('=') => Ok(Some(Token::EqualEqual)),
            '=' => Ok(Some(Token::Equal)),

            '<' if self.chase('=') => Ok(Some(Token::LessEqual)),
            '<' => Ok(Some(Token::Less)),

            '>' if self.chase('=') => Ok(Some(Token::GreaterEqual)),
            '>' => Ok(Some(Token::Greater)),

            // Single-line comment
            '/' if self.chase('/') => {
                self.consume_until_delimiter('\n');
                Ok(None)
            }
            '/' => Ok(Some(Token::Slash)),

            // String literals
            '"' => {
                let line = self.line;

                // Consume until we find the closing quote
                while let Some((_, c)) = self.source.next_if(|(_, c)| *c != '"') {
                    // Allow multilined strings
                    if c == '\n' {
                        self.line += 1;
                    }
                }

                if let Some((end, _)) = self.source.next() {
                    Ok(Some(Token::String(&self.source_data[start + 1..end])))
                } else {
                    Err(LexError::UnterminatedString { line })
                }
            }

            // Numeric literals
            c if c.is_ascii_digit() => {
                self.consume_while(char::is_ascii_digit);

                if self.fraction_follows() {
                    // Consume the dot
                    self.source.next();
                    self.consume_while(char::is_ascii_digit);
                }

                let number = self.lexeme_from(start);
                number
                    .parse::<LoxNumber>()
                    .map(|number| Some(Token::Number(number)))
                    .map_err(|_| LexError::InvalidNumber {
                        lexeme: number.to_owned(),
                        line: self.line,
                    })
            }

            // Newlines
            '\n' => {
                self.line += 1;
                Ok(None)
            }

            // Whitespace
            ' ' | '\r' | '\t' => Ok(None),

            // Identifiers | Keywords
            c if c.is_ascii_alphabetic() || c == '_' => {
                self.consume_while(Self::is_valid_for_identifier);
                let identifier = self.lexeme_from(start);

                Ok(Self::as_keyword(identifier).or(Some(Token::Identifier(identifier))))
            }

            // Unknown character
            character => Err(LexError::UnexpectedCharacter {
                character,
                line: self.line,
            }),
        }
    }

    fn chase(&mut self, expected: char) -> bool {
        self.source.next_if(|(_, c)| *c == expected).is_some()
    }

    fn consume_until_delimiter(&mut self, delimiter: char) {
        while self.source.next_if(|(_, c)| *c != delimiter).is_some() {}
    }

    fn consume_while(&mut self, f: impl Fn(&char) -> bool) {
        while self.source.next_if(|(_, c)| f(c)).is_some() {}
    }

    /// Whether the cursor sits on a `.` that is directly followed by a digit.
    fn fraction_follows(&mut self) -> bool {
        match self.source.peek() {
            // A dot is a single byte so the next character starts right after it
            Some(&(dot, '.')) => {
                self.source_data[dot + 1..].starts_with(|c: char| c.is_ascii_digit())
            }
            _ => false,
        }
    }

    /// The source text from `start` up to the cursor.
    fn lexeme_from(&mut self, start: usize) -> &'src str {
        let end = self
            .source
            .peek()
            .map_or(self.source_data.len(), |(end, _)| *end);

        &self.source_data[start..end]
    }

    fn as_keyword(text: &str) -> Option<Token<'static>> {
        match text {
            "and" => Some(Token::And),
            "class" => Some(Token::Class),
            "else" => Some(Token::Else),
            "false" => Some(Token::False),
            "for" => Some(Token::For),
            "fun" => Some(Token::Fun),
            "if" => Some(Token::If),
            "nil" => Some(Token::Nil),
            "or" => Some(Token::Or),
            "print" => Some(Token::Print),
            "return" => Some(Token::Return),
            "super" => Some(Token::Super),
            "this" => Some(Token::This),
            "true" => Some(Token::True),
            "var" => Some(Token::Var),
            "while" => Some(Token::While),
            _ => None,
        }
    }

    fn is_valid_for_identifier(c: &char) -> bool {
        c.is_ascii_alphanumeric() || *c == '_'
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Token<'src> {
    // One character
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,
    Bang,
    Equal,
    Greater,
    Less,
    // Two characters
    BangEqual,
    EqualEqual,
    GreaterEqual,
    LessEqual,
    // Literals
    Identifier(&'src str),
    String(&'src str),
    Number(LoxNumber),
    // Keywords
    And,
    Class,
    Else,
    False,
    Fun,
    For,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,
    EndOfFile,
}

impl Token<'_> {
    /// Keywords the language reserves for constructs it doesn't support yet.
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Token::And
                | Token::Class
                | Token::Else
                | Token::Fun
                | Token::For
                | Token::If
                | Token::Or
                | Token::Return
                | Token::Super
                | Token::This
                | Token::While
        )
    }
}

/// A token along with where it came from.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TokenInfo<'src> {
    pub token: Token<'src>,
    pub lexeme: &'src str,
    pub line: u32,
}

impl<'src> Display for TokenInfo<'src> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lexeme = if let Token::EndOfFile = self.token {
            "EOF"
        } else {
            self.lexeme
        };

        write!(f, "\"{}\" @ line {}", lexeme, self.line)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LexError {
    #[error("Unexpected character {character:?} @ line {line}.")]
    UnexpectedCharacter { character: char, line: u32 },

    #[error("Unterminated string literal starting @ line {line}.")]
    UnterminatedString { line: u32 },

    #[error("Number literal \"{lexeme}\" @ line {line} failed to parse.")]
    InvalidNumber { lexeme: String, line: u32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token<'_>> {
        let (tokens, errors) = Lexer::new(source).lex();
        assert!(errors.is_empty(), "unexpected lexing errors: {errors:?}");
        tokens.into_iter().map(|info| info.token).collect()
    }

    #[test]
    fn single_and_double_character_operators() {
        assert_eq!(
            tokens("(){},.-+;*/ ! != = == < <= > >="),
            vec![
                Token::LeftParen,
                Token::RightParen,
                Token::LeftBrace,
                Token::RightBrace,
                Token::Comma,
                Token::Dot,
                Token::Minus,
                Token::Plus,
                Token::Semicolon,
                Token::Star,
                Token::Slash,
                Token::Bang,
                Token::BangEqual,
                Token::Equal,
                Token::EqualEqual,
                Token::Less,
                Token::LessEqual,
                Token::Greater,
                Token::GreaterEqual,
                Token::EndOfFile,
            ]
        );
    }

    #[test]
    fn maximal_munch_without_spaces() {
        assert_eq!(
            tokens("!==="),
            vec![Token::BangEqual, Token::EqualEqual, Token::EndOfFile]
        );
    }

    #[test]
    fn numbers_decode_to_floats() {
        for (source, expected) in [("0", 0.0), ("42", 42.0), ("3.25", 3.25), ("007.50", 7.5)] {
            assert_eq!(
                tokens(source),
                vec![Token::Number(expected), Token::EndOfFile],
                "{source}"
            );
        }
    }

    #[test]
    fn trailing_dot_is_not_part_of_the_number() {
        assert_eq!(
            tokens("12."),
            vec![Token::Number(12.0), Token::Dot, Token::EndOfFile]
        );
        assert_eq!(
            tokens("1.foo"),
            vec![
                Token::Number(1.0),
                Token::Dot,
                Token::Identifier("foo"),
                Token::EndOfFile
            ]
        );
    }

    #[test]
    fn strings_exclude_their_quotes() {
        assert_eq!(
            tokens("\"hello world\" \"\""),
            vec![
                Token::String("hello world"),
                Token::String(""),
                Token::EndOfFile
            ]
        );
    }

    #[test]
    fn every_keyword_is_recognized() {
        let keywords = [
            ("and", Token::And),
            ("class", Token::Class),
            ("else", Token::Else),
            ("false", Token::False),
            ("fun", Token::Fun),
            ("for", Token::For),
            ("if", Token::If),
            ("nil", Token::Nil),
            ("or", Token::Or),
            ("print", Token::Print),
            ("return", Token::Return),
            ("super", Token::Super),
            ("this", Token::This),
            ("true", Token::True),
            ("var", Token::Var),
            ("while", Token::While),
        ];

        for (text, keyword) in keywords {
            assert_eq!(tokens(text), vec![keyword, Token::EndOfFile]);
        }
    }

    #[test]
    fn identifiers_are_maximal_runs() {
        assert_eq!(
            tokens("variable _tmp x1_y printer"),
            vec![
                Token::Identifier("variable"),
                Token::Identifier("_tmp"),
                Token::Identifier("x1_y"),
                Token::Identifier("printer"),
                Token::EndOfFile
            ]
        );
    }

    #[test]
    fn line_comments_are_skipped() {
        assert_eq!(
            tokens("1 // ignored ; \"\n2"),
            vec![Token::Number(1.0), Token::Number(2.0), Token::EndOfFile]
        );
        assert_eq!(
            tokens("4 /= 2"),
            vec![
                Token::Number(4.0),
                Token::Slash,
                Token::Equal,
                Token::Number(2.0),
                Token::EndOfFile
            ]
        );
    }

    #[test]
    fn lexemes_and_lines_are_tracked() {
        let (tokens, _) = Lexer::new("var x = 1.5;\n\"a\nb\"\nprint").lex();
        let summary: Vec<(&str, u32)> = tokens.iter().map(|t| (t.lexeme, t.line)).collect();
        assert_eq!(
            summary,
            vec![
                ("var", 1),
                ("x", 1),
                ("=", 1),
                ("1.5", 1),
                (";", 1),
                ("\"a\nb\"", 2),
                ("print", 4),
                ("", 4),
            ]
        );
    }

    #[test]
    fn errors_do_not_stop_the_scan() {
        let (tokens, errors) = Lexer::new("1 @\n# 2").lex();
        assert_eq!(
            errors,
            vec![
                LexError::UnexpectedCharacter {
                    character: '@',
                    line: 1
                },
                LexError::UnexpectedCharacter {
                    character: '#',
                    line: 2
                },
            ]
        );
        let tokens: Vec<_> = tokens.into_iter().map(|t| t.token).collect();
        assert_eq!(
            tokens,
            vec![Token::Number(1.0), Token::Number(2.0), Token::EndOfFile]
        );
    }

    #[test]
    fn unterminated_string_reports_its_starting_line() {
        let (tokens, errors) = Lexer::new("print\n\"abc\ndef").lex();
        assert_eq!(errors, vec![LexError::UnterminatedString { line: 2 }]);
        assert_eq!(tokens.last().map(|t| t.token), Some(Token::EndOfFile));
        assert_eq!(tokens.len(), 2);
    }

    #[test]
    fn empty_source_is_just_the_sentinel() {
        assert_eq!(tokens(""), vec![Token::EndOfFile]);
        assert_eq!(tokens("  \t\r\n"), vec![Token::EndOfFile]);
    }
}
