use crate::lexer::tokens::*;

/// Single-pass scanner from source text to spanned tokens.
///
/// The lexer enforces the token-count and symbol-length limits; the source
/// byte-size limit is checked by the caller before the text reaches here.
#[derive(Debug)]
pub struct Lexer<'a> {
    input: &'a str,
    chars: Vec<(usize, char)>,
    position: usize,
    line: usize,
    column: usize,
    max_tokens: usize,
    max_symbol_len: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, max_tokens: usize, max_symbol_len: usize) -> Self {
        Self {
            input,
            chars: input.char_indices().collect(),
            position: 0,
            line: 1,
            column: 1,
            max_tokens,
            max_symbol_len,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<SpannedToken>, LexerError> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments();
            if self.position >= self.chars.len() {
                break;
            }

            let (line, column, offset) = (self.line, self.column, self.current_offset());
            let token = self.next_token()?;

            if tokens.len() >= self.max_tokens {
                return Err(LexerError::TooManyTokens {
                    max: self.max_tokens,
                    line,
                    column,
                    offset,
                });
            }
            tokens.push(SpannedToken::new(token, line, column, offset));
        }

        tokens.push(SpannedToken::new(
            Token::Eof,
            self.line,
            self.column,
            self.input.len(),
        ));
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, LexerError> {
        let ch = self.current_char();
        match ch {
            'A'..='Z' | 'a'..='z' => self.read_word(),
            '0'..='9' => self.read_number(),
            '"' => self.read_string(),
            '{' => {
                self.advance();
                Ok(Token::LBrace)
            }
            '}' => {
                self.advance();
                Ok(Token::RBrace)
            }
            '<' => {
                self.advance();
                Ok(Token::Less)
            }
            '>' => {
                self.advance();
                Ok(Token::Greater)
            }
            '=' => {
                // Only '==' is a token; a lone '=' is not part of the language.
                let (line, column, offset) = (self.line, self.column, self.current_offset());
                self.advance();
                if self.position < self.chars.len() && self.current_char() == '=' {
                    self.advance();
                    Ok(Token::EqualEqual)
                } else {
                    Err(LexerError::UnexpectedCharacter {
                        ch: '=',
                        line,
                        column,
                        offset,
                    })
                }
            }
            _ => Err(LexerError::UnexpectedCharacter {
                ch,
                line: self.line,
                column: self.column,
                offset: self.current_offset(),
            }),
        }
    }

    /// Read an identifier run and classify it as `Ident` (uppercase) or
    /// `Ref` (lowercase). A run mixing cases (e.g. `Foo`) is malformed.
    fn read_word(&mut self) -> Result<Token, LexerError> {
        let (line, column, offset) = (self.line, self.column, self.current_offset());
        let first = self.current_char();
        let mut word = String::new();

        while self.position < self.chars.len() {
            let ch = self.current_char();
            if ch.is_ascii_alphanumeric() || ch == '_' {
                word.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        self.check_symbol_len(word.len(), line, column, offset)?;

        let well_formed = if first.is_ascii_uppercase() {
            word.chars()
                .skip(1)
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        } else {
            word.chars()
                .skip(1)
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        };
        if !well_formed {
            return Err(LexerError::MalformedIdentifier {
                word,
                line,
                column,
                offset,
            });
        }

        if first.is_ascii_uppercase() {
            Ok(Token::Ident(word))
        } else {
            Ok(Token::Ref(word))
        }
    }

    /// Read `[0-9]+` and normalize to canonical decimal text (leading zeros
    /// stripped, all-zero input becomes "0"). Symbols are textual, so no
    /// numeric overflow is possible here.
    fn read_number(&mut self) -> Result<Token, LexerError> {
        let (line, column, offset) = (self.line, self.column, self.current_offset());
        let mut digits = String::new();

        while self.position < self.chars.len() {
            let ch = self.current_char();
            if ch.is_ascii_digit() {
                digits.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        let normalized = digits.trim_start_matches('0');
        let normalized = if normalized.is_empty() {
            "0".to_string()
        } else {
            normalized.to_string()
        };
        self.check_symbol_len(normalized.len(), line, column, offset)?;
        Ok(Token::Int(normalized))
    }

    /// Read a string literal. The grammar has no escape sequences: every
    /// character up to the closing quote is taken verbatim (newlines included).
    fn read_string(&mut self) -> Result<Token, LexerError> {
        let (line, column, offset) = (self.line, self.column, self.current_offset());
        self.advance(); // opening quote

        let mut text = String::new();
        while self.position < self.chars.len() {
            let ch = self.current_char();
            self.advance();
            if ch == '"' {
                self.check_symbol_len(text.len(), line, column, offset)?;
                return Ok(Token::Str(text));
            }
            text.push(ch);
        }

        Err(LexerError::UnterminatedString {
            line,
            column,
            offset,
        })
    }

    fn skip_whitespace_and_comments(&mut self) {
        while self.position < self.chars.len() {
            match self.current_char() {
                ' ' | '\t' | '\r' | '\n' => self.advance(),
                '#' => {
                    // Comment runs to end of line.
                    while self.position < self.chars.len() && self.current_char() != '\n' {
                        self.advance();
                    }
                }
                _ => break,
            }
        }
    }

    fn check_symbol_len(
        &self,
        len: usize,
        line: usize,
        column: usize,
        offset: usize,
    ) -> Result<(), LexerError> {
        if len > self.max_symbol_len {
            return Err(LexerError::SymbolTooLong {
                len,
                max: self.max_symbol_len,
                line,
                column,
                offset,
            });
        }
        Ok(())
    }

    fn current_char(&self) -> char {
        self.chars[self.position].1
    }

    fn current_offset(&self) -> usize {
        if self.position < self.chars.len() {
            self.chars[self.position].0
        } else {
            self.input.len()
        }
    }

    fn advance(&mut self) {
        if self.position < self.chars.len() {
            if self.chars[self.position].1 == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.position += 1;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexerError {
    #[error("unexpected character '{ch}' at line {line}, column {column} (byte {offset})")]
    UnexpectedCharacter {
        ch: char,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("malformed identifier '{word}' at line {line}, column {column} (byte {offset}): identifiers are all-uppercase or all-lowercase")]
    MalformedIdentifier {
        word: String,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("unterminated string starting at line {line}, column {column} (byte {offset})")]
    UnterminatedString {
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("symbol of {len} bytes exceeds max_symbol_len {max} at line {line}, column {column} (byte {offset})")]
    SymbolTooLong {
        len: usize,
        max: usize,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("token count exceeds max_tokens {max} at line {line}, column {column} (byte {offset})")]
    TooManyTokens {
        max: usize,
        line: usize,
        column: usize,
        offset: usize,
    },

    #[error("source is not valid UTF-8 (byte {offset})")]
    InvalidUtf8 { offset: usize },

    #[error("source of {len} bytes exceeds max_source_bytes {max}")]
    SourceTooLarge { len: usize, max: usize },
}

impl LexerError {
    /// Line and column for source snippet display (1-based); `None` for
    /// errors without a precise location.
    pub fn line_column(&self) -> Option<(usize, usize)> {
        match self {
            LexerError::UnexpectedCharacter { line, column, .. }
            | LexerError::MalformedIdentifier { line, column, .. }
            | LexerError::UnterminatedString { line, column, .. }
            | LexerError::SymbolTooLong { line, column, .. }
            | LexerError::TooManyTokens { line, column, .. } => Some((*line, *column)),
            LexerError::InvalidUtf8 { .. } | LexerError::SourceTooLarge { .. } => None,
        }
    }

    /// Byte offset of the error, when known.
    pub fn offset(&self) -> Option<usize> {
        match self {
            LexerError::UnexpectedCharacter { offset, .. }
            | LexerError::MalformedIdentifier { offset, .. }
            | LexerError::UnterminatedString { offset, .. }
            | LexerError::SymbolTooLong { offset, .. }
            | LexerError::TooManyTokens { offset, .. }
            | LexerError::InvalidUtf8 { offset } => Some(*offset),
            LexerError::SourceTooLarge { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Result<Vec<Token>, LexerError> {
        Lexer::new(input, 100_000, 4096)
            .tokenize()
            .map(|spanned| spanned.into_iter().map(|s| s.token).collect())
    }

    #[test]
    fn tokenizes_a_minimal_phase() {
        let tokens = lex("BEGIN { PUSH \"x\" }").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("BEGIN".into()),
                Token::LBrace,
                Token::Ident("PUSH".into()),
                Token::Str("x".into()),
                Token::RBrace,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn normalizes_integer_literals() {
        assert_eq!(
            lex("007 0 0010").unwrap(),
            vec![
                Token::Int("7".into()),
                Token::Int("0".into()),
                Token::Int("10".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let tokens = lex("GATE # depth < 3\nbound").unwrap();
        assert_eq!(
            tokens,
            vec![
                Token::Ident("GATE".into()),
                Token::Ref("bound".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn mixed_case_identifier_is_rejected() {
        let err = lex("Begin { HALT }").unwrap_err();
        assert!(matches!(err, LexerError::MalformedIdentifier { .. }));
    }

    #[test]
    fn spans_track_lines_and_byte_offsets() {
        let spanned = Lexer::new("A {\n  HALT\n}", 100, 4096).tokenize().unwrap();
        let halt = &spanned[2];
        assert_eq!(halt.token, Token::Ident("HALT".into()));
        assert_eq!(halt.line, 2);
        assert_eq!(halt.column, 3);
        assert_eq!(halt.offset, 6);
    }
}
