//! MDX tokens - the atomic units of rendered query text.
//!
//! Every piece of a compiled query is pushed as a token and serialized in a
//! single pass, so clause layout lives in one place.

use super::ident::quote_name;

/// MDX token.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    With,
    Member,
    As,
    Select,
    On,
    From,
    Where,
    NonEmpty,
    And,
    Members,
    CurrentMember,
    Properties,
    Caption,
    Name,
    UniqueName,
    BAsc,
    BDesc,
    Null,

    // === Punctuation ===
    Comma,
    Dot,
    Colon,
    Star,
    LParen,
    RParen,
    LBrace,
    RBrace,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,

    // === Whitespace / Formatting ===
    Space,
    Newline,

    // === Dynamic Content ===
    /// Axis name by ordinal: COLUMNS, ROWS, PAGES, ...
    Axis(usize),
    /// A single name, rendered bracket-quoted.
    Bracketed(String),
    /// An already-qualified unique name such as `[Time].[Year]`.
    UniqueIdent(String),
    /// Function name, rendered upper case.
    FunctionName(&'static str),
    /// Numeric literal, kept as validated text.
    Number(String),
    /// Integer literal.
    LitInt(u64),
    /// String literal.
    LitString(String),

    // === Escape Hatch ===
    /// Caller-supplied fragment that has already been parsed and re-rendered.
    ///
    /// Only ever fed from [`super::parser::Fragment`]'s canonical rendering,
    /// never from unparsed input.
    Fragment(String),
}

impl Token {
    /// Serialize this token to MDX text.
    pub fn serialize(&self) -> String {
        match self {
            // Keywords
            Token::With => "WITH".into(),
            Token::Member => "MEMBER".into(),
            Token::As => "AS".into(),
            Token::Select => "SELECT".into(),
            Token::On => "ON".into(),
            Token::From => "FROM".into(),
            Token::Where => "WHERE".into(),
            Token::NonEmpty => "NON EMPTY".into(),
            Token::And => "AND".into(),
            Token::Members => "Members".into(),
            Token::CurrentMember => "CurrentMember".into(),
            Token::Properties => "Properties".into(),
            Token::Caption => "Caption".into(),
            Token::Name => "Name".into(),
            Token::UniqueName => "UniqueName".into(),
            Token::BAsc => "BASC".into(),
            Token::BDesc => "BDESC".into(),
            Token::Null => "NULL".into(),

            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Colon => ":".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBrace => "{".into(),
            Token::RBrace => "}".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),

            // Whitespace
            Token::Space => " ".into(),
            Token::Newline => "\n".into(),

            // Dynamic
            Token::Axis(ordinal) => axis_name(*ordinal),
            Token::Bracketed(name) => quote_name(name),
            Token::UniqueIdent(name) => name.clone(),
            Token::FunctionName(name) => name.to_uppercase(),
            Token::Number(text) => text.clone(),
            Token::LitInt(n) => n.to_string(),
            Token::LitString(s) => format!("\"{}\"", s.replace('"', "\"\"")),

            Token::Fragment(s) => s.clone(),
        }
    }
}

/// Standard MDX axis names; axes past SECTIONS use `AXIS(n)`.
pub fn axis_name(ordinal: usize) -> String {
    match ordinal {
        0 => "COLUMNS".into(),
        1 => "ROWS".into(),
        2 => "PAGES".into(),
        3 => "CHAPTERS".into(),
        4 => "SECTIONS".into(),
        n => format!("AXIS({})", n),
    }
}

/// A stream of tokens that can be serialized to MDX.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Serialize all tokens to an MDX string.
    pub fn serialize(&self) -> String {
        self.tokens.iter().map(Token::serialize).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn newline(&mut self) -> &mut Self {
        self.push(Token::Newline)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    pub fn lbrace(&mut self) -> &mut Self {
        self.push(Token::LBrace)
    }
    pub fn rbrace(&mut self) -> &mut Self {
        self.push(Token::RBrace)
    }
    /// `, ` between list items.
    pub fn separator(&mut self) -> &mut Self {
        self.comma().space()
    }
}
