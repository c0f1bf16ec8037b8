//! Request-level error type.
//!
//! Every failure while compiling or running an aggregate request is a
//! [`QueryError`]. None of them are retried, and each maps to the HTTP
//! status class a caller-facing layer should answer with.

use thiserror::Error;

use crate::engine::EngineError;

/// Result type for query compilation and execution.
pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("cube `{0}` not found")]
    UnknownCube(String),

    #[error("measure `{measure}` does not exist in cube {cube}")]
    UnknownMeasure { cube: String, measure: String },

    #[error("dimension `{dimension}` does not exist in cube {cube}")]
    UnknownDimension { cube: String, dimension: String },

    #[error("hierarchy `{hierarchy}` does not exist in dimension {dimension}")]
    UnknownHierarchy { dimension: String, hierarchy: String },

    #[error("level `{level}` does not exist in {dimension}")]
    UnknownLevel { dimension: String, level: String },

    #[error("{context}: `{expression}`")]
    UnknownMember { context: String, expression: String },

    #[error("member `{0}` not found")]
    MemberNotFound(String),

    #[error("invalid drilldown `{drilldown}`: {reason}")]
    InvalidDrilldown { drilldown: String, reason: String },

    #[error("invalid cut `{cut}`: {reason}")]
    InvalidCut { cut: String, reason: String },

    #[error("filter clause `{filter}` is invalid")]
    InvalidFilter { filter: String },

    #[error("invalid order `{order}`: {reason}")]
    InvalidOrder { order: String, reason: String },

    #[error("invalid property `{property}`: {reason}")]
    InvalidProperty { property: String, reason: String },

    #[error("all members in cut set `{cut}` must belong to the same level")]
    HeterogeneousCutSet { cut: String },

    #[error("both limits of cut range `{cut}` must belong to the same level")]
    HeterogeneousCutRange { cut: String },

    #[error("cut `{cut}` is on a level deeper than drilldown `{drilldown}`")]
    IllegalDrilldown { cut: String, drilldown: String },

    #[error("dimension `{dimension}` not in drilldown list")]
    PropertyNotInDrilldown { dimension: String },

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl QueryError {
    pub(crate) fn unknown_member(context: &str, expression: impl Into<String>) -> Self {
        Self::UnknownMember {
            context: context.to_string(),
            expression: expression.into(),
        }
    }

    /// HTTP status class for this error.
    pub fn status(&self) -> u16 {
        match self {
            Self::UnknownCube(_)
            | Self::UnknownMeasure { .. }
            | Self::UnknownHierarchy { .. }
            | Self::UnknownLevel { .. }
            | Self::MemberNotFound(_) => 404,
            Self::Engine(e) if !e.is_rejection() => 502,
            _ => 400,
        }
    }
}
