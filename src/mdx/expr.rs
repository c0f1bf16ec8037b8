//! Set and value expression tree.
//!
//! The compiler builds these nodes and only the renderer turns them into
//! text, so wrapping order (order, then subset, then distinct) is decided
//! by whoever nests the nodes, never by string formatting.

use super::ident::quote_name;
use super::parser::Fragment;
use super::token::{Token, TokenStream};

// =============================================================================
// Set expressions
// =============================================================================

/// An MDX set expression, as placed on an axis or in the slicer.
///
/// Every variant must be handled in `to_tokens()`.
#[derive(Debug, Clone, PartialEq)]
pub enum SetExpr {
    /// All members of a level: `[Time].[Year].Members`
    LevelMembers(String),

    /// A member by unique name, as reported by the engine.
    Member(String),

    /// A caller-supplied fragment (member, set literal or range), rendered
    /// in its canonical form.
    Fragment(Fragment),

    /// Set literal: `{a, b}`
    Set(Vec<SetExpr>),

    /// `DESCENDANTS(member, level)`
    Descendants { member: Box<SetExpr>, level: String },

    /// A named set reference: `[Top Sellers]`
    NamedSet(String),

    /// Cross product: `a * b`
    CrossJoin(Vec<SetExpr>),

    /// `ORDER(set, value, BASC|BDESC)`
    Order {
        set: Box<SetExpr>,
        by: ValueExpr,
        direction: SortDirection,
    },

    /// `SUBSET(set, start[, count])`
    Subset {
        set: Box<SetExpr>,
        start: u64,
        count: Option<u64>,
    },

    /// `DISTINCT(set)`
    Distinct(Box<SetExpr>),
}

impl SetExpr {
    /// Wrap a single member-like expression as a one-element set.
    pub fn braced(inner: SetExpr) -> Self {
        SetExpr::Set(vec![inner])
    }

    pub fn order(self, by: ValueExpr, direction: SortDirection) -> Self {
        SetExpr::Order {
            set: Box::new(self),
            by,
            direction,
        }
    }

    pub fn subset(self, start: u64, count: Option<u64>) -> Self {
        SetExpr::Subset {
            set: Box::new(self),
            start,
            count,
        }
    }

    pub fn distinct(self) -> Self {
        SetExpr::Distinct(Box::new(self))
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            SetExpr::LevelMembers(level) => {
                ts.push(Token::UniqueIdent(level.clone()))
                    .push(Token::Dot)
                    .push(Token::Members);
            }
            SetExpr::Member(name) => {
                ts.push(Token::UniqueIdent(name.clone()));
            }
            SetExpr::Fragment(fragment) => {
                ts.push(Token::Fragment(fragment.to_string()));
            }
            SetExpr::Set(items) => {
                ts.lbrace();
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        ts.separator();
                    }
                    ts.append(&item.to_tokens());
                }
                ts.rbrace();
            }
            SetExpr::Descendants { member, level } => {
                ts.push(Token::FunctionName("descendants"))
                    .lparen()
                    .append(&member.to_tokens())
                    .separator()
                    .push(Token::UniqueIdent(level.clone()))
                    .rparen();
            }
            SetExpr::NamedSet(name) => {
                ts.push(Token::Bracketed(name.clone()));
            }
            SetExpr::CrossJoin(sets) => {
                for (i, set) in sets.iter().enumerate() {
                    if i > 0 {
                        ts.space().push(Token::Star).space();
                    }
                    ts.append(&set.to_tokens());
                }
            }
            SetExpr::Order { set, by, direction } => {
                ts.push(Token::FunctionName("order"))
                    .lparen()
                    .append(&set.to_tokens())
                    .separator()
                    .append(&by.to_tokens())
                    .separator()
                    .push(match direction {
                        SortDirection::Ascending => Token::BAsc,
                        SortDirection::Descending => Token::BDesc,
                    })
                    .rparen();
            }
            SetExpr::Subset { set, start, count } => {
                ts.push(Token::FunctionName("subset"))
                    .lparen()
                    .append(&set.to_tokens())
                    .separator()
                    .push(Token::LitInt(*start));
                if let Some(count) = count {
                    ts.separator().push(Token::LitInt(*count));
                }
                ts.rparen();
            }
            SetExpr::Distinct(set) => {
                ts.push(Token::FunctionName("distinct"))
                    .lparen()
                    .append(&set.to_tokens())
                    .rparen();
            }
        }
        ts
    }

    pub fn to_mdx(&self) -> String {
        self.to_tokens().serialize()
    }
}

// =============================================================================
// Value expressions
// =============================================================================

/// Sort direction for `ORDER`. Hierarchy-breaking so the axis sorts as a
/// whole rather than within parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Built-in member attributes usable as sort keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAttribute {
    Caption,
    Key,
    Name,
    UniqueName,
}

impl MemberAttribute {
    /// Recognize an attribute name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "caption" => Some(MemberAttribute::Caption),
            "key" => Some(MemberAttribute::Key),
            "name" => Some(MemberAttribute::Name),
            "unique_name" | "uniquename" => Some(MemberAttribute::UniqueName),
            _ => None,
        }
    }
}

/// A scalar evaluated per tuple: a measure or something about the current
/// member of a hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueExpr {
    /// `[Measures].[Unit Sales]`
    Measure(String),

    /// `[Product].CurrentMember.Properties("Brand")`
    Property { hierarchy: String, property: String },

    /// `[Product].CurrentMember.Caption`
    Attribute {
        hierarchy: String,
        attribute: MemberAttribute,
    },
}

impl ValueExpr {
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        match self {
            ValueExpr::Measure(name) => {
                ts.push(Token::UniqueIdent(name.clone()));
            }
            ValueExpr::Property {
                hierarchy,
                property,
            } => {
                current_member(&mut ts, hierarchy);
                properties_call(&mut ts, property);
            }
            ValueExpr::Attribute {
                hierarchy,
                attribute,
            } => {
                current_member(&mut ts, hierarchy);
                match attribute {
                    MemberAttribute::Caption => {
                        ts.push(Token::Dot).push(Token::Caption);
                    }
                    MemberAttribute::Name => {
                        ts.push(Token::Dot).push(Token::Name);
                    }
                    MemberAttribute::UniqueName => {
                        ts.push(Token::Dot).push(Token::UniqueName);
                    }
                    MemberAttribute::Key => properties_call(&mut ts, "MEMBER_KEY"),
                }
            }
        }
        ts
    }
}

fn current_member(ts: &mut TokenStream, hierarchy: &str) {
    ts.push(Token::UniqueIdent(hierarchy.to_string()))
        .push(Token::Dot)
        .push(Token::CurrentMember);
}

fn properties_call(ts: &mut TokenStream, property: &str) {
    ts.push(Token::Dot)
        .push(Token::Properties)
        .lparen()
        .push(Token::LitString(property.to_string()))
        .rparen();
}

// =============================================================================
// Conditions
// =============================================================================

/// Comparison operators accepted in measure filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
}

impl CompareOp {
    pub fn parse(op: &str) -> Option<Self> {
        match op {
            "=" => Some(CompareOp::Eq),
            "<>" => Some(CompareOp::Ne),
            "<" => Some(CompareOp::Lt),
            ">" => Some(CompareOp::Gt),
            "<=" => Some(CompareOp::Lte),
            ">=" => Some(CompareOp::Gte),
            _ => None,
        }
    }

    fn token(self) -> Token {
        match self {
            CompareOp::Eq => Token::Eq,
            CompareOp::Ne => Token::Ne,
            CompareOp::Lt => Token::Lt,
            CompareOp::Gt => Token::Gt,
            CompareOp::Lte => Token::Lte,
            CompareOp::Gte => Token::Gte,
        }
    }
}

/// `value op number`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub value: ValueExpr,
    pub op: CompareOp,
    /// Numeric literal as written; validated by the filter compiler.
    pub number: String,
}

/// Comparisons joined with AND.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Condition {
    pub comparisons: Vec<Comparison>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.comparisons.is_empty()
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        for (i, cmp) in self.comparisons.iter().enumerate() {
            if i > 0 {
                ts.space().push(Token::And).space();
            }
            ts.append(&cmp.value.to_tokens())
                .space()
                .push(cmp.op.token())
                .space()
                .push(Token::Number(cmp.number.clone()));
        }
        ts
    }
}

// =============================================================================
// Calculated members
// =============================================================================

/// A measure that keeps a source measure's value only where a condition
/// holds and is NULL elsewhere:
/// `MEMBER [Measures].[Filtered m] AS IIF(cond, [Measures].[m], NULL)`
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredMeasure {
    /// Unique name of the calculated member.
    pub name: String,
    /// Unique name of the measure it wraps.
    pub source: String,
    pub condition: Condition,
}

impl FilteredMeasure {
    pub const PREFIX: &'static str = "Filtered ";

    /// Wrap the measure named `source_name` whose unique name is
    /// `source_full_name`.
    pub fn new(source_name: &str, source_full_name: &str, condition: Condition) -> Self {
        Self {
            name: Self::unique_name(source_name),
            source: source_full_name.to_string(),
            condition,
        }
    }

    /// `[Measures].[Filtered <name>]`
    pub fn unique_name(source_name: &str) -> String {
        format!(
            "[Measures].{}",
            quote_name(&format!("{}{}", Self::PREFIX, source_name))
        )
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(Token::Member)
            .space()
            .push(Token::UniqueIdent(self.name.clone()))
            .space()
            .push(Token::As)
            .space()
            .push(Token::FunctionName("iif"))
            .lparen()
            .append(&self.condition.to_tokens())
            .separator()
            .push(Token::UniqueIdent(self.source.clone()))
            .separator()
            .push(Token::Null)
            .rparen();
        ts
    }
}
