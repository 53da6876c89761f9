//! Lexer (tokenizer) for filter expressions.

use std::iter::Peekable;
use std::str::CharIndices;

use crate::error::{FilterError, FilterResult};

/// A token with its position in the input.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedToken {
    /// The token.
    pub token: Token,
    /// The byte position where the token starts (0-indexed).
    pub position: usize,
}

/// A token in a filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// A bare word: field path, keyword, number, date or GUID.
    Word(String),

    /// A quoted string with escapes resolved.
    Quoted(String),

    /// A comparison symbol (`=`, `!=`, `>=`, ...).
    Symbol(&'static str),

    /// Opening parenthesis `(`.
    OpenParen,

    /// Closing parenthesis `)`.
    CloseParen,

    /// List separator `,`.
    Comma,
}

impl Token {
    /// Returns true for a bare word equal to `keyword`, ignoring case.
    pub fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Word(w) if w.eq_ignore_ascii_case(keyword))
    }

    /// Text shown in error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Quoted(s) => format!("'{s}'"),
            Token::Symbol(s) => (*s).to_string(),
            Token::OpenParen => "(".to_string(),
            Token::CloseParen => ")".to_string(),
            Token::Comma => ",".to_string(),
        }
    }
}

/// Lexer for tokenizing filter expressions.
pub struct Lexer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input string.
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    /// Tokenizes the whole input.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnexpectedCharacter`] for characters that start
    /// no token and [`FilterError::UnterminatedString`] for unclosed quotes.
    pub fn tokenize(mut self) -> FilterResult<Vec<PositionedToken>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    /// Reads a bare word starting at `start`.
    fn read_word(&mut self, start: usize) -> String {
        let mut end = start;
        while let Some(&(i, c)) = self.chars.peek() {
            if !is_word_char(c) {
                break;
            }
            end = i + c.len_utf8();
            self.chars.next();
        }
        self.input[start..end].to_string()
    }

    /// Reads a quoted string. Single quotes escape by doubling (`''`),
    /// double quotes with a backslash.
    fn read_quoted(&mut self, quote: char, start: usize) -> FilterResult<String> {
        // Consume the opening quote
        self.chars.next();

        let mut result = String::new();
        while let Some((_, c)) = self.chars.next() {
            if c == quote {
                if quote == '\'' && self.peek() == Some('\'') {
                    self.chars.next();
                    result.push('\'');
                    continue;
                }
                return Ok(result);
            }
            if c == '\\' && quote == '"' {
                if let Some((_, escaped)) = self.chars.next() {
                    result.push(escaped);
                }
                continue;
            }
            result.push(c);
        }
        Err(FilterError::UnterminatedString { position: start })
    }

    /// Reads a comparison symbol starting with `first`.
    fn read_symbol(&mut self, first: char, position: usize) -> FilterResult<&'static str> {
        self.chars.next();
        let next = self.peek();
        let (symbol, consumed) = match (first, next) {
            ('=', Some('=')) => ("==", true),
            ('=', _) => ("=", false),
            ('!', Some('=')) => ("!=", true),
            ('<', Some('>')) => ("<>", true),
            ('<', Some('=')) => ("<=", true),
            ('<', _) => ("<", false),
            ('>', Some('=')) => (">=", true),
            ('>', _) => (">", false),
            _ => {
                return Err(FilterError::UnexpectedCharacter {
                    character: first,
                    position,
                })
            }
        };
        if consumed {
            self.chars.next();
        }
        Ok(symbol)
    }

    /// Returns the next token with its position, or None at end of input.
    pub fn next_token(&mut self) -> FilterResult<Option<PositionedToken>> {
        self.skip_whitespace();

        let Some(&(position, c)) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match c {
            '(' => {
                self.chars.next();
                Token::OpenParen
            }
            ')' => {
                self.chars.next();
                Token::CloseParen
            }
            ',' => {
                self.chars.next();
                Token::Comma
            }
            '\'' | '"' => Token::Quoted(self.read_quoted(c, position)?),
            '=' | '!' | '<' | '>' => Token::Symbol(self.read_symbol(c, position)?),
            _ if is_word_start(c) => Token::Word(self.read_word(position)),
            _ => {
                return Err(FilterError::UnexpectedCharacter {
                    character: c,
                    position,
                })
            }
        };

        Ok(Some(PositionedToken { token, position }))
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '$' | '@')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '+' | '.' | '/' | ':' | '$' | '@')
}
