//! MDX generation module.
//!
//! - [`ident`] - Compound identifiers and name quoting
//! - [`parser`] - Recognizer for caller-supplied fragments (member, set, range, call)
//! - [`expr`] - Set/value expression tree
//! - [`query`] - SELECT query builder
//! - [`token`] - Token types for MDX generation

pub mod expr;
pub mod ident;
pub mod parser;
pub mod query;
pub mod token;

pub use expr::{
    CompareOp, Comparison, Condition, FilteredMeasure, MemberAttribute, SetExpr, SortDirection,
    ValueExpr,
};
pub use ident::{quote_name, Identifier, Quoting, Segment};
pub use parser::{parse_expression, Fragment, MdxParseError, Operator};
pub use query::{Axis, MdxQuery};
pub use token::{Token, TokenStream};
