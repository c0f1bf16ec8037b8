//! MDX identifiers: dot-separated segments, each unquoted, `[bracket]`
//! quoted or `&`-prefixed member keys.

use std::fmt;

use super::parser::MdxParseError;

/// How a segment was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quoting {
    /// `Product Family`
    Unquoted,
    /// `[Product Family]`
    Quoted,
    /// `&Drink` or `&[Drink]` - a member key rather than a name.
    Key,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub name: String,
    pub quoting: Quoting,
}

impl Segment {
    pub fn unquoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoting: Quoting::Unquoted,
        }
    }

    pub fn quoted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            quoting: Quoting::Quoted,
        }
    }

    pub fn is_key(&self) -> bool {
        self.quoting == Quoting::Key
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quoting {
            Quoting::Unquoted => f.write_str(&self.name),
            Quoting::Quoted => f.write_str(&quote_name(&self.name)),
            Quoting::Key if is_plain(&self.name) => write!(f, "&{}", self.name),
            Quoting::Key => write!(f, "&{}", quote_name(&self.name)),
        }
    }
}

/// A compound identifier such as `[Time].[Year].[1997]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub segments: Vec<Segment>,
}

impl Identifier {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Parse a complete identifier; trailing input is an error.
    pub fn parse(input: &str) -> Result<Self, MdxParseError> {
        let mut cursor = Cursor::new(input);
        let ident = cursor.identifier()?;
        cursor.skip_ws();
        match cursor.peek() {
            None => Ok(ident),
            Some(c) => Err(MdxParseError::Unexpected {
                found: c,
                position: cursor.pos,
            }),
        }
    }

    /// Segment names with quoting stripped.
    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn has_key_segment(&self) -> bool {
        self.segments.iter().any(Segment::is_key)
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", seg)?;
        }
        Ok(())
    }
}

/// Bracket-quote a name, doubling any closing bracket.
pub fn quote_name(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn is_plain(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_alphanumeric() || c == '_')
}

/// Characters that end an unquoted segment.
pub(crate) fn is_delimiter(c: char) -> bool {
    matches!(c, '.' | ',' | '{' | '}' | '(' | ')' | ':' | '[' | ']' | '&' | '*')
}

/// Character cursor shared by the identifier and fragment parsers.
pub(crate) struct Cursor {
    chars: Vec<char>,
    pub(crate) pos: usize,
}

impl Cursor {
    pub(crate) fn new(src: &str) -> Self {
        Self {
            chars: src.chars().collect(),
            pos: 0,
        }
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    pub(crate) fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    pub(crate) fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    pub(crate) fn eat(&mut self, expected: char) -> bool {
        self.skip_ws();
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Parse `segment ('.' segment)*`.
    pub(crate) fn identifier(&mut self) -> Result<Identifier, MdxParseError> {
        let mut segments = vec![self.segment()?];
        loop {
            self.skip_ws();
            if self.peek() != Some('.') {
                break;
            }
            self.bump();
            segments.push(self.segment()?);
        }
        Ok(Identifier::new(segments))
    }

    fn segment(&mut self) -> Result<Segment, MdxParseError> {
        self.skip_ws();
        let start = self.pos;
        match self.peek() {
            Some('[') => Ok(Segment::quoted(self.bracketed()?)),
            Some('&') => {
                self.bump();
                let name = if self.peek() == Some('[') {
                    self.bracketed()?
                } else {
                    self.unquoted()
                };
                if name.is_empty() {
                    return Err(MdxParseError::EmptySegment { position: start });
                }
                Ok(Segment {
                    name,
                    quoting: Quoting::Key,
                })
            }
            Some(_) => {
                let name = self.unquoted();
                if name.is_empty() {
                    return Err(MdxParseError::EmptySegment { position: start });
                }
                Ok(Segment::unquoted(name))
            }
            None => Err(MdxParseError::UnexpectedEnd),
        }
    }

    fn unquoted(&mut self) -> String {
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_delimiter(c) {
                break;
            }
            name.push(c);
            self.pos += 1;
        }
        name.trim().to_string()
    }

    fn bracketed(&mut self) -> Result<String, MdxParseError> {
        let start = self.pos;
        self.bump(); // '['
        let mut name = String::new();
        loop {
            match self.bump() {
                Some(']') if self.peek() == Some(']') => {
                    self.bump();
                    name.push(']');
                }
                Some(']') => return Ok(name),
                Some(c) => name.push(c),
                None => return Err(MdxParseError::UnterminatedBracket { position: start }),
            }
        }
    }
}
