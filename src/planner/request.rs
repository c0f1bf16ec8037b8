//! Typed aggregate request.

use serde::{Deserialize, Serialize};

use crate::config::QueryDefaults;

/// Everything a caller can ask of an aggregate query.
///
/// Built once at the boundary, from [`QueryDefaults`] plus whatever the
/// caller supplied. Unset list fields mean "none".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregateRequest {
    /// Measure names; the cube's first measure when empty.
    pub measures: Vec<String>,
    /// `Dimension`, `Dimension.Level`, `Dimension.Hierarchy.Level` or a named set.
    pub drilldown: Vec<String>,
    /// Member, set, range or named-set expressions.
    pub cut: Vec<String>,
    /// `<measure> <op> <number>` clauses, conjoined.
    pub filter: Vec<String>,
    pub order: Option<String>,
    pub order_desc: bool,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
    pub nonempty: bool,
    pub distinct: bool,
    /// `Dimension.Level.Property` or `Dimension.Hierarchy.Level.Property`.
    pub properties: Vec<String>,
    /// Properties whose value replaces the member caption.
    pub caption: Vec<String>,
    pub parents: bool,
    pub debug: bool,
    pub sparse: bool,
}

impl AggregateRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// A request carrying the configured defaults.
    pub fn from_defaults(defaults: &QueryDefaults) -> Self {
        Self {
            nonempty: defaults.nonempty,
            distinct: defaults.distinct,
            parents: defaults.parents,
            debug: defaults.debug,
            sparse: defaults.sparse,
            ..Self::default()
        }
    }

    pub fn measure(mut self, name: impl Into<String>) -> Self {
        self.measures.push(name.into());
        self
    }

    pub fn drilldown(mut self, spec: impl Into<String>) -> Self {
        self.drilldown.push(spec.into());
        self
    }

    pub fn cut(mut self, expression: impl Into<String>) -> Self {
        self.cut.push(expression.into());
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filter.push(clause.into());
        self
    }

    pub fn order(mut self, target: impl Into<String>, descending: bool) -> Self {
        self.order = Some(target.into());
        self.order_desc = descending;
        self
    }

    pub fn page(mut self, offset: Option<u64>, limit: Option<u64>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }

    pub fn nonempty(mut self, nonempty: bool) -> Self {
        self.nonempty = nonempty;
        self
    }

    pub fn distinct(mut self, distinct: bool) -> Self {
        self.distinct = distinct;
        self
    }

    pub fn property(mut self, spec: impl Into<String>) -> Self {
        self.properties.push(spec.into());
        self
    }

    pub fn caption(mut self, spec: impl Into<String>) -> Self {
        self.caption.push(spec.into());
        self
    }

    pub fn parents(mut self, parents: bool) -> Self {
        self.parents = parents;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn sparse(mut self, sparse: bool) -> Self {
        self.sparse = sparse;
        self
    }
}
