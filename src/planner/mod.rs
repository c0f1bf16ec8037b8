//! Aggregate query compiler - turns an [`AggregateRequest`] into MDX.
//!
//! ```text
//! request ─┬─ drilldown ─┐
//!          ├─ cut ───────┼─ slicer matcher ─ assembler ─ CompiledQuery
//!          └─ filter/order/page ──────────────┘
//! ```
//!
//! Resolution needs the engine only to look up cut members; everything
//! after that is synchronous and never touches shared state.

pub mod assemble;
pub mod cut;
pub mod drilldown;
pub mod filter;
pub mod request;
pub mod slicer;

pub use assemble::{assemble, CompiledQuery, QueryClauses};
pub use cut::{resolve_cut, Cut, CutKind};
pub use drilldown::{resolve_drilldown, Drilldown, DrilldownTarget};
pub use filter::{compile_filters, compile_order, parse_filter, OrderSpec, Pagination};
pub use request::AggregateRequest;
pub use slicer::{match_cuts, ResolvedAxis, SlicerPlan};

use futures::future::try_join_all;

use crate::engine::{Cube, Engine, Measure};
use crate::error::{QueryError, QueryResult};

/// Compile a request against a cube.
///
/// Measures are validated first, then drilldowns, cuts, filters and the
/// order clause; the first failure aborts compilation.
pub async fn compile(
    engine: &dyn Engine,
    cube: &Cube,
    request: &AggregateRequest,
) -> QueryResult<CompiledQuery> {
    let measures = resolve_measures(cube, &request.measures)?;

    let drilldowns = request
        .drilldown
        .iter()
        .map(|d| resolve_drilldown(cube, d))
        .collect::<QueryResult<Vec<_>>>()?;

    let cuts = try_join_all(request.cut.iter().map(|c| resolve_cut(engine, cube, c))).await?;

    let filter = compile_filters(cube, &request.filter)?;
    let order = request
        .order
        .as_deref()
        .map(|o| compile_order(cube, o, request.order_desc))
        .transpose()?;

    let plan = match_cuts(&drilldowns, cuts)?;

    assemble(
        &cube.name,
        measures,
        drilldowns,
        plan,
        QueryClauses {
            filter,
            order,
            pagination: Pagination::new(request.offset, request.limit),
            nonempty: request.nonempty,
            distinct: request.distinct,
        },
    )
}

/// Requested measures, or the cube's default measure when none are named.
pub fn resolve_measures(cube: &Cube, names: &[String]) -> QueryResult<Vec<Measure>> {
    if names.is_empty() {
        return cube
            .default_measure()
            .cloned()
            .map(|m| vec![m])
            .ok_or_else(|| {
                QueryError::UnsupportedOperation(format!("cube {} has no measures", cube.name))
            });
    }

    names
        .iter()
        .map(|name| {
            cube.measure(name.trim())
                .cloned()
                .ok_or_else(|| QueryError::UnknownMeasure {
                    cube: cube.name.clone(),
                    measure: name.clone(),
                })
        })
        .collect()
}
