//! Analytical engine abstraction.
//!
//! - [`types`] - Cube, dimension, hierarchy, level and member metadata
//! - [`provider`] - The `Engine` capability trait
//! - [`catalog`] - In-memory engine over a JSON catalog
//! - [`worker_engine`] - Engine reached through a bridge process
//! - [`session`] - Shared engine handle with a cube cache
//!
//! The compiler and the flattener never talk to an engine directly; they
//! receive a [`Session`] (or a `&dyn Engine`) from the caller.

pub mod catalog;
mod error;
pub mod provider;
pub mod session;
pub mod types;
pub mod worker_engine;

pub use catalog::{measures_level, CatalogEngine};
pub use error::{EngineError, EngineResult};
pub use provider::Engine;
pub use session::Session;
pub use types::{
    Cube, Dimension, DimensionType, Hierarchy, Level, LevelRef, Measure, Member, NamedSet,
    ResolvedLevel,
};
pub use worker_engine::WorkerEngine;
