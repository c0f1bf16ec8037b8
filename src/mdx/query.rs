//! Query builder - assemble a SELECT statement from axis expressions.

use super::expr::{FilteredMeasure, SetExpr};
use super::token::{Token, TokenStream};

/// One query axis: a set with an optional NON EMPTY modifier.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub set: SetExpr,
    pub non_empty: bool,
}

impl Axis {
    pub fn new(set: SetExpr) -> Self {
        Self {
            set,
            non_empty: false,
        }
    }

    pub fn non_empty(mut self, non_empty: bool) -> Self {
        self.non_empty = non_empty;
        self
    }
}

/// A SELECT query over one cube.
///
/// Calculated measures open the query in a single WITH clause. Axes are
/// emitted in order starting at COLUMNS; the slicer members are
/// cross-joined into a single WHERE tuple.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "MdxQuery has no effect until rendered with to_mdx()"]
pub struct MdxQuery {
    pub cube: String,
    pub members: Vec<FilteredMeasure>,
    pub axes: Vec<Axis>,
    pub slicer: Vec<SetExpr>,
}

impl MdxQuery {
    pub fn new(cube: &str) -> Self {
        Self {
            cube: cube.into(),
            members: vec![],
            axes: vec![],
            slicer: vec![],
        }
    }

    /// Define a calculated measure for the axes to reference.
    pub fn with_member(mut self, member: FilteredMeasure) -> Self {
        self.members.push(member);
        self
    }

    /// Append the next axis.
    pub fn axis(mut self, axis: Axis) -> Self {
        self.axes.push(axis);
        self
    }

    /// Add a member or set to the WHERE tuple.
    pub fn slice(mut self, set: SetExpr) -> Self {
        self.slicer.push(set);
        self
    }

    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        if !self.members.is_empty() {
            ts.push(Token::With).space();
            for member in &self.members {
                ts.append(&member.to_tokens()).newline();
            }
        }

        ts.push(Token::Select).space();
        for (ordinal, axis) in self.axes.iter().enumerate() {
            if ordinal > 0 {
                ts.comma().newline();
            }
            if axis.non_empty {
                ts.push(Token::NonEmpty).space();
            }
            ts.append(&axis.set.to_tokens())
                .space()
                .push(Token::On)
                .space()
                .push(Token::Axis(ordinal));
        }

        ts.newline()
            .push(Token::From)
            .space()
            .push(Token::Bracketed(self.cube.clone()));

        if !self.slicer.is_empty() {
            ts.newline()
                .push(Token::Where)
                .space()
                .lparen()
                .append(&SetExpr::CrossJoin(self.slicer.clone()).to_tokens())
                .rparen();
        }

        ts
    }

    pub fn to_mdx(&self) -> String {
        self.to_tokens().serialize()
    }
}

impl std::fmt::Display for MdxQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_mdx())
    }
}
