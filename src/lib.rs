//! # Prism
//!
//! A parameterized OLAP query layer. Callers name measures, drilldowns,
//! cuts, filters and an order; Prism compiles that into one MDX query,
//! runs it on an analytical engine and flattens the cell matrix into
//! tidy rows.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │              AggregateRequest (typed options)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [planner: resolve, match, assemble]
//! ┌─────────────────────────────────────────────────────────┐
//! │                 CompiledQuery → MDX text                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [engine: catalog or worker bridge]
//! ┌─────────────────────────────────────────────────────────┐
//! │               CellResult (axes + cells)                  │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [result::tidy, format]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Tidy rows → CSV / JSON records                │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod aggregate;
pub mod config;
pub mod describe;
pub mod engine;
pub mod error;
pub mod format;
pub mod mdx;
pub mod planner;
pub mod result;
pub mod worker;

pub use aggregate::{aggregate, compile_request, Aggregation};
pub use engine::{CatalogEngine, Engine, Session};
pub use error::{QueryError, QueryResult};
pub use planner::{AggregateRequest, CompiledQuery};
pub use result::{CellResult, Tidy, TidyOptions};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::aggregate::{aggregate, Aggregation};
    pub use crate::config::Settings;
    pub use crate::engine::{CatalogEngine, Cube, Engine, LevelRef, Member, Session};
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::format::{Format, FormatError};
    pub use crate::planner::{compile, AggregateRequest, CompiledQuery};
    pub use crate::result::{tidy, CellResult, Scalar, Tidy, TidyOptions};
}
