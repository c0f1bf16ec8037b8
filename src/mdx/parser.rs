//! Parser for caller-supplied MDX fragments.
//!
//! Only the shapes a cut or drilldown can take are recognized: compound
//! identifiers, set literals `{a, b}`, parenthesized expressions and ranges
//! `(a : b)`, and function calls `NAME(args)`. Anything richer is left to
//! the engine.

use std::fmt;

use super::ident::{Cursor, Identifier, Quoting};

/// Errors raised while parsing an MDX fragment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MdxParseError {
    #[error("unexpected '{found}' at position {position}")]
    Unexpected { found: char, position: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("empty identifier segment at position {position}")]
    EmptySegment { position: usize },

    #[error("unterminated '[' at position {position}")]
    UnterminatedBracket { position: usize },
}

/// The operator of a call node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operator {
    /// `{a, b, c}`
    Braces,
    /// `(a)` or `(a, b)`
    Parens,
    /// `a : b`
    Range,
    /// `NAME(args)`
    Function(String),
}

impl Operator {
    /// Operator name as the engine's parser reports it.
    pub fn name(&self) -> &str {
        match self {
            Operator::Braces => "{}",
            Operator::Parens => "()",
            Operator::Range => ":",
            Operator::Function(name) => name,
        }
    }
}

/// A parsed fragment: either an identifier or a call with arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Identifier(Identifier),
    Call {
        operator: Operator,
        args: Vec<Fragment>,
    },
}

impl Fragment {
    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Fragment::Identifier(id) => Some(id),
            Fragment::Call { .. } => None,
        }
    }

    pub fn as_call(&self) -> Option<(&Operator, &[Fragment])> {
        match self {
            Fragment::Call { operator, args } => Some((operator, args.as_slice())),
            Fragment::Identifier(_) => None,
        }
    }
}

impl fmt::Display for Fragment {
    /// Canonical text: `{a, b}`, `(a : b)`, `NAME(a, b)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Fragment::Identifier(id) => write!(f, "{}", id),
            Fragment::Call { operator, args } => match operator {
                Operator::Braces => {
                    f.write_str("{")?;
                    write_list(f, args)?;
                    f.write_str("}")
                }
                Operator::Parens => {
                    f.write_str("(")?;
                    write_list(f, args)?;
                    f.write_str(")")
                }
                Operator::Range => match args.as_slice() {
                    [from, to] => write!(f, "{} : {}", from, to),
                    _ => write_list(f, args),
                },
                Operator::Function(name) => {
                    write!(f, "{}(", name)?;
                    write_list(f, args)?;
                    f.write_str(")")
                }
            },
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, args: &[Fragment]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", arg)?;
    }
    Ok(())
}

/// Parse a complete fragment; trailing input is an error.
pub fn parse_expression(input: &str) -> Result<Fragment, MdxParseError> {
    let mut parser = Parser {
        cursor: Cursor::new(input),
    };
    let fragment = parser.expression()?;
    parser.cursor.skip_ws();
    match parser.cursor.peek() {
        None => Ok(fragment),
        Some(found) => Err(MdxParseError::Unexpected {
            found,
            position: parser.cursor.pos,
        }),
    }
}

struct Parser {
    cursor: Cursor,
}

impl Parser {
    // expression := primary (':' primary)?
    fn expression(&mut self) -> Result<Fragment, MdxParseError> {
        let lhs = self.primary()?;
        if self.cursor.eat(':') {
            let rhs = self.primary()?;
            return Ok(Fragment::Call {
                operator: Operator::Range,
                args: vec![lhs, rhs],
            });
        }
        Ok(lhs)
    }

    fn primary(&mut self) -> Result<Fragment, MdxParseError> {
        self.cursor.skip_ws();
        match self.cursor.peek() {
            Some('{') => {
                self.cursor.bump();
                let args = self.list('}')?;
                Ok(Fragment::Call {
                    operator: Operator::Braces,
                    args,
                })
            }
            Some('(') => {
                self.cursor.bump();
                let args = self.list(')')?;
                if args.is_empty() {
                    return Err(MdxParseError::Unexpected {
                        found: ')',
                        position: self.cursor.pos.saturating_sub(1),
                    });
                }
                Ok(Fragment::Call {
                    operator: Operator::Parens,
                    args,
                })
            }
            Some(_) => {
                let ident = self.cursor.identifier()?;
                // A single unquoted segment followed by '(' is a function call.
                let is_function = ident.len() == 1 && ident.segments[0].quoting == Quoting::Unquoted;
                if is_function && self.cursor.eat('(') {
                    let args = self.list(')')?;
                    return Ok(Fragment::Call {
                        operator: Operator::Function(ident.segments[0].name.to_uppercase()),
                        args,
                    });
                }
                Ok(Fragment::Identifier(ident))
            }
            None => Err(MdxParseError::UnexpectedEnd),
        }
    }

    /// Comma-separated expressions up to and including `close`.
    fn list(&mut self, close: char) -> Result<Vec<Fragment>, MdxParseError> {
        let mut items = Vec::new();
        if self.cursor.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.expression()?);
            if self.cursor.eat(',') {
                continue;
            }
            if self.cursor.eat(close) {
                return Ok(items);
            }
            return match self.cursor.peek() {
                Some(found) => Err(MdxParseError::Unexpected {
                    found,
                    position: self.cursor.pos,
                }),
                None => Err(MdxParseError::UnexpectedEnd),
            };
        }
    }
}
