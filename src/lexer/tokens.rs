use std::fmt;

/// A lexical token. Operator words (`PUSH`, `SATURATE`, ...) are lexed as
/// plain `Ident` tokens; the parser reclassifies them via [`OpWord`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Uppercase identifier: `[A-Z][A-Z0-9_]*` (phase names, operator words).
    Ident(String),
    /// Lowercase identifier: `[a-z][a-z0-9_]*` (condition words, keys).
    Ref(String),
    /// String literal between double quotes; no escape sequences.
    Str(String),
    /// Integer literal, already normalized to canonical decimal text.
    Int(String),
    LBrace,
    RBrace,
    Less,
    Greater,
    EqualEqual,
    Eof,
}

impl Token {
    /// Short description for error messages ("string literal", "'{'", ...).
    pub fn describe(&self) -> String {
        match self {
            Token::Ident(name) => format!("'{}'", name),
            Token::Ref(name) => format!("'{}'", name),
            Token::Str(_) => "string literal".to_string(),
            Token::Int(text) => format!("integer '{}'", text),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Less => "'<'".to_string(),
            Token::Greater => "'>'".to_string(),
            Token::EqualEqual => "'=='".to_string(),
            Token::Eof => "end of input".to_string(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "{}", name),
            Token::Ref(name) => write!(f, "{}", name),
            Token::Str(text) => write!(f, "\"{}\"", text),
            Token::Int(text) => write!(f, "{}", text),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::Less => write!(f, "<"),
            Token::Greater => write!(f, ">"),
            Token::EqualEqual => write!(f, "=="),
            Token::Eof => write!(f, "<eof>"),
        }
    }
}

/// A token with its source position: 1-based line and column plus the byte
/// offset of its first character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpannedToken {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl SpannedToken {
    pub fn new(token: Token, line: usize, column: usize, offset: usize) -> Self {
        Self {
            token,
            line,
            column,
            offset,
        }
    }
}

/// The eight reserved operator words. Lexed as `Ident`, classified here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpWord {
    Push,
    Invert,
    Bind,
    Release,
    Gate,
    Saturate,
    Witness,
    Halt,
}

impl OpWord {
    /// Classify an uppercase identifier; `None` means it is an ordinary
    /// identifier (e.g. a phase name), not an operator word.
    pub fn from_ident(name: &str) -> Option<OpWord> {
        match name {
            "PUSH" => Some(OpWord::Push),
            "INVERT" => Some(OpWord::Invert),
            "BIND" => Some(OpWord::Bind),
            "RELEASE" => Some(OpWord::Release),
            "GATE" => Some(OpWord::Gate),
            "SATURATE" => Some(OpWord::Saturate),
            "WITNESS" => Some(OpWord::Witness),
            "HALT" => Some(OpWord::Halt),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OpWord::Push => "PUSH",
            OpWord::Invert => "INVERT",
            OpWord::Bind => "BIND",
            OpWord::Release => "RELEASE",
            OpWord::Gate => "GATE",
            OpWord::Saturate => "SATURATE",
            OpWord::Witness => "WITNESS",
            OpWord::Halt => "HALT",
        }
    }

    /// Number of argument tokens the operator consumes (a SATURATE block and
    /// a GATE condition each count as one argument).
    pub fn arity(&self) -> usize {
        match self {
            OpWord::Push | OpWord::Release | OpWord::Gate | OpWord::Saturate => 1,
            OpWord::Bind => 2,
            OpWord::Invert | OpWord::Witness | OpWord::Halt => 0,
        }
    }
}

impl fmt::Display for OpWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
