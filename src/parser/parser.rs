use crate::lexer::tokens::{OpWord, SpannedToken, Token};
use crate::parser::ast::{GateCond, Operation, Phase, Program};
use crate::parser::error::ParserError;

/// Recursive-descent parser over the spanned token stream.
///
/// Grammar and arity checks happen in one pass; the first error wins and no
/// partial AST is returned. Block nesting is bounded by `max_nesting`
/// (phase body is depth 0, each SATURATE block adds one).
pub struct Parser {
    tokens: Vec<SpannedToken>,
    position: usize,
    max_nesting: usize,
    current_phase: Option<String>,
    last_op: Option<OpWord>,
}

impl Parser {
    pub fn new(tokens: Vec<SpannedToken>, max_nesting: usize) -> Self {
        Self {
            tokens,
            position: 0,
            max_nesting,
            current_phase: None,
            last_op: None,
        }
    }

    pub fn parse(mut self) -> Result<Program, ParserError> {
        let mut program = Program::new();

        if matches!(self.current().token, Token::Eof) {
            return Err(self.unexpected("a phase definition"));
        }
        while !matches!(self.current().token, Token::Eof) {
            let phase = self.parse_phase()?;
            program.add_phase(phase);
        }
        Ok(program)
    }

    fn parse_phase(&mut self) -> Result<Phase, ParserError> {
        let spanned = self.current().clone();
        let name = match &spanned.token {
            Token::Ident(name) => {
                if OpWord::from_ident(name).is_some() {
                    return Err(self.unexpected("a phase name (operator words are reserved)"));
                }
                name.clone()
            }
            _ => return Err(self.unexpected("a phase name")),
        };
        self.advance();
        self.current_phase = Some(name.clone());

        let body = self.parse_block(0)?;
        self.current_phase = None;

        Ok(Phase {
            name,
            body,
            line: spanned.line,
        })
    }

    /// Parse `{ operation+ }`. `depth` is the nesting level of this block;
    /// the phase body is depth 0.
    fn parse_block(&mut self, depth: usize) -> Result<Vec<Operation>, ParserError> {
        if depth > self.max_nesting {
            let spanned = self.current();
            return Err(ParserError::NestingTooDeep {
                depth,
                max: self.max_nesting,
                phase: self.current_phase.clone(),
                line: spanned.line,
                column: spanned.column,
                offset: spanned.offset,
            });
        }

        let open = self.current().clone();
        match open.token {
            Token::LBrace => self.advance(),
            Token::Eof => return Err(self.unexpected_eof("'{'")),
            _ => return Err(self.unexpected("'{'")),
        }

        let mut operations = Vec::new();
        loop {
            match &self.current().token {
                Token::RBrace => {
                    if operations.is_empty() {
                        return Err(ParserError::EmptyBlock {
                            phase: self.current_phase.clone(),
                            line: open.line,
                            column: open.column,
                            offset: open.offset,
                        });
                    }
                    self.advance();
                    return Ok(operations);
                }
                Token::Eof => return Err(self.unexpected_eof("an operation or '}'")),
                _ => operations.push(self.parse_operation(depth)?),
            }
        }
    }

    fn parse_operation(&mut self, depth: usize) -> Result<Operation, ParserError> {
        let spanned = self.current().clone();
        let op = match &spanned.token {
            Token::Ident(word) => match OpWord::from_ident(word) {
                Some(op) => op,
                None => {
                    return Err(ParserError::InvalidOp {
                        word: word.clone(),
                        phase: self.current_phase.clone(),
                        line: spanned.line,
                        column: spanned.column,
                        offset: spanned.offset,
                    })
                }
            },
            // A literal in operation position is an over-supplied trailing
            // argument to the previous operation: an arity violation.
            Token::Str(_) | Token::Int(_) | Token::Ref(_) => {
                let (prev, expected) = match self.last_op {
                    Some(op) => (op.as_str(), op.arity()),
                    None => ("operation", 0),
                };
                return Err(ParserError::Arity {
                    op: prev,
                    expected,
                    found: format!("got trailing {}", spanned.token.describe()),
                    phase: self.current_phase.clone(),
                    line: spanned.line,
                    column: spanned.column,
                    offset: spanned.offset,
                });
            }
            _ => return Err(self.unexpected("an operation")),
        };
        self.advance();
        self.last_op = Some(op);

        match op {
            OpWord::Push => Ok(Operation::Push(self.parse_symbol_arg(op)?)),
            OpWord::Invert => Ok(Operation::Invert),
            OpWord::Bind => {
                let key = self.parse_symbol_arg(op)?;
                let value = self.parse_symbol_arg(op)?;
                Ok(Operation::Bind(key, value))
            }
            OpWord::Release => Ok(Operation::Release(self.parse_symbol_arg(op)?)),
            OpWord::Gate => Ok(Operation::Gate(self.parse_gate_cond()?)),
            OpWord::Saturate => {
                // The single SATURATE argument must be a block.
                let next = self.current().clone();
                if !matches!(next.token, Token::LBrace) {
                    return Err(ParserError::Arity {
                        op: OpWord::Saturate.as_str(),
                        expected: 1,
                        found: format!("got {}", next.token.describe()),
                        phase: self.current_phase.clone(),
                        line: next.line,
                        column: next.column,
                        offset: next.offset,
                    });
                }
                Ok(Operation::Saturate(self.parse_block(depth + 1)?))
            }
            OpWord::Witness => Ok(Operation::Witness),
            OpWord::Halt => Ok(Operation::Halt),
        }
    }

    /// A literal symbol argument: string, integer (already normalized), or
    /// lowercase reference. All become plain symbol text.
    fn parse_symbol_arg(&mut self, op: OpWord) -> Result<String, ParserError> {
        let spanned = self.current().clone();
        let symbol = match &spanned.token {
            Token::Str(text) => text.clone(),
            Token::Int(text) => text.clone(),
            Token::Ref(name) => name.clone(),
            other => {
                return Err(ParserError::Arity {
                    op: op.as_str(),
                    expected: op.arity(),
                    found: format!("got {}", other.describe()),
                    phase: self.current_phase.clone(),
                    line: spanned.line,
                    column: spanned.column,
                    offset: spanned.offset,
                })
            }
        };
        self.advance();
        Ok(symbol)
    }

    /// `depth (< | > | ==) INT`, `bound <symbol>`, or `unbound <symbol>`.
    /// A missing argument is an arity error; a present-but-malformed
    /// condition is ERR_CONDITION.
    fn parse_gate_cond(&mut self) -> Result<GateCond, ParserError> {
        let spanned = self.current().clone();
        let word = match &spanned.token {
            Token::Ref(word) => word.clone(),
            // Nothing that could begin a condition follows: missing argument.
            Token::RBrace | Token::Eof => {
                return Err(ParserError::Arity {
                    op: OpWord::Gate.as_str(),
                    expected: 1,
                    found: format!("got {}", spanned.token.describe()),
                    phase: self.current_phase.clone(),
                    line: spanned.line,
                    column: spanned.column,
                    offset: spanned.offset,
                })
            }
            Token::Ident(word) if OpWord::from_ident(word).is_some() => {
                return Err(ParserError::Arity {
                    op: OpWord::Gate.as_str(),
                    expected: 1,
                    found: format!("got operator {}", word),
                    phase: self.current_phase.clone(),
                    line: spanned.line,
                    column: spanned.column,
                    offset: spanned.offset,
                })
            }
            other => {
                return Err(self.condition_error(format!(
                    "expected 'depth', 'bound', or 'unbound', got {}",
                    other.describe()
                )))
            }
        };

        match word.as_str() {
            "depth" => {
                self.advance();
                let relation = self.current().clone();
                let make = match relation.token {
                    Token::Less => GateCond::DepthLt as fn(u64) -> GateCond,
                    Token::Greater => GateCond::DepthGt as fn(u64) -> GateCond,
                    Token::EqualEqual => GateCond::DepthEq as fn(u64) -> GateCond,
                    other => {
                        return Err(self.condition_error(format!(
                            "expected '<', '>', or '==' after 'depth', got {}",
                            other.describe()
                        )))
                    }
                };
                self.advance();
                let bound = self.current().clone();
                match &bound.token {
                    Token::Int(text) => {
                        let n: u64 = text.parse().map_err(|_| {
                            self.condition_error(format!(
                                "depth bound '{}' does not fit an unsigned 64-bit integer",
                                text
                            ))
                        })?;
                        self.advance();
                        Ok(make(n))
                    }
                    other => Err(self.condition_error(format!(
                        "expected an integer depth bound, got {}",
                        other.describe()
                    ))),
                }
            }
            "bound" | "unbound" => {
                let negated = word == "unbound";
                self.advance();
                let key_tok = self.current().clone();
                let key = match &key_tok.token {
                    Token::Str(text) => text.clone(),
                    Token::Int(text) => text.clone(),
                    Token::Ref(name) => name.clone(),
                    other => {
                        return Err(self.condition_error(format!(
                            "expected a key symbol after '{}', got {}",
                            word,
                            other.describe()
                        )))
                    }
                };
                self.advance();
                if negated {
                    Ok(GateCond::Unbound(key))
                } else {
                    Ok(GateCond::Bound(key))
                }
            }
            other => Err(self.condition_error(format!(
                "unknown condition word '{}': expected 'depth', 'bound', or 'unbound'",
                other
            ))),
        }
    }

    fn condition_error(&self, reason: String) -> ParserError {
        let spanned = self.current();
        ParserError::Condition {
            reason,
            phase: self.current_phase.clone(),
            line: spanned.line,
            column: spanned.column,
            offset: spanned.offset,
        }
    }

    fn unexpected(&self, expected: &str) -> ParserError {
        let spanned = self.current();
        if matches!(spanned.token, Token::Eof) {
            return self.unexpected_eof(expected);
        }
        ParserError::UnexpectedToken {
            found: spanned.token.describe(),
            expected: expected.to_string(),
            phase: self.current_phase.clone(),
            line: spanned.line,
            column: spanned.column,
            offset: spanned.offset,
        }
    }

    fn unexpected_eof(&self, expected: &str) -> ParserError {
        ParserError::UnexpectedEof {
            expected: expected.to_string(),
            phase: self.current_phase.clone(),
        }
    }

    /// The token at the cursor. The stream always ends with `Eof`, and the
    /// cursor never advances past it.
    fn current(&self) -> &SpannedToken {
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.position + 1 < self.tokens.len() {
            self.position += 1;
        }
    }
}
