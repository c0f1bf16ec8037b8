//! Engine trait definition.
//!
//! The `Engine` trait is the only way the compiler and the flattener touch
//! the analytical engine: metadata reads, member resolution and query
//! execution. One adapter exists per engine binding.

use async_trait::async_trait;

use super::error::EngineResult;
use super::types::{Cube, LevelRef, Member};
use crate::result::CellResult;

/// Capability object for an analytical engine.
///
/// # Example
///
/// ```ignore
/// use prism::engine::{CatalogEngine, Engine};
///
/// async fn example(engine: &dyn Engine) -> EngineResult<()> {
///     let cube = engine.cube("Sales").await?.expect("cube exists");
///     let drink = engine.member("Sales", "Product.Product Family.Drink").await?;
///     let result = engine.execute("Sales", "SELECT {[Measures].[Unit Sales]} ON COLUMNS\nFROM [Sales]").await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait Engine: Send + Sync {
    /// Names of all cubes the engine serves.
    async fn cube_names(&self) -> EngineResult<Vec<String>>;

    /// Cube metadata, or `None` when no cube has that name.
    async fn cube(&self, name: &str) -> EngineResult<Option<Cube>>;

    /// Resolve a member expression such as `[Time].[Year].[1997]` or
    /// `Product.Product Family.&Drink`. `None` when nothing matches.
    async fn member(&self, cube: &str, expression: &str) -> EngineResult<Option<Member>>;

    /// Ancestors of a member, nearest parent first, up to the hierarchy root.
    async fn ancestors(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>>;

    /// Direct children of a member, in hierarchy order.
    async fn children(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>>;

    /// All members of a level, in hierarchy order.
    async fn level_members(&self, cube: &str, level: &LevelRef) -> EngineResult<Vec<Member>>;

    /// Execute an MDX query.
    async fn execute(&self, cube: &str, mdx: &str) -> EngineResult<CellResult>;

    /// Drop any schema or result caches the engine holds.
    async fn flush(&self) -> EngineResult<()>;
}
