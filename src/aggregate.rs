//! End-to-end aggregate pipeline.
//!
//! ```text
//! request ─ cube lookup ─ compile ─ execute ─ (ancestors) ─ Aggregation
//! ```

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use log::{debug, info, warn};

use crate::engine::{measures_level, Cube, Engine, LevelRef, Member, Session};
use crate::error::QueryResult;
use crate::format::{render, Format, FormatResult};
use crate::planner::{compile, AggregateRequest, CompiledQuery};
use crate::result::{
    parse_caption_properties, parse_properties, tidy, CellResult, Scalar, Tidy, TidyOptions,
};

/// One executed aggregate request.
#[derive(Debug, Clone)]
pub struct Aggregation {
    pub cube: Arc<Cube>,
    pub query: CompiledQuery,
    pub result: CellResult,
    /// Flattening options derived from the request.
    pub options: TidyOptions,
}

impl Aggregation {
    pub fn mdx(&self) -> String {
        self.query.to_mdx()
    }

    pub fn tidy(&self) -> QueryResult<Tidy> {
        tidy(&self.result, &self.cube, &self.options)
    }

    pub fn render(&self, format: Format) -> FormatResult<String> {
        render(format, &self.result, &self.cube, &self.options)
    }
}

/// Compile a request without executing it.
pub async fn compile_request(
    session: &Session,
    cube: &str,
    request: &AggregateRequest,
) -> QueryResult<CompiledQuery> {
    let cube = session.cube(cube).await?;
    compile(session.engine(), &cube, request).await
}

/// Run a request against a cube.
///
/// Property and caption requests are validated against the compiled axes
/// before anything is sent to the engine.
pub async fn aggregate(
    session: &Session,
    cube: &str,
    request: &AggregateRequest,
) -> QueryResult<Aggregation> {
    let cube = session.cube(cube).await?;
    let query = compile(session.engine(), &cube, request).await?;

    let drilled: Vec<LevelRef> = query.axis_levels().into_iter().flatten().collect();
    let options = TidyOptions {
        parents: request.parents,
        debug: request.debug,
        properties: parse_properties(&cube, &request.properties, &drilled)?,
        captions: parse_caption_properties(&cube, &request.caption, &drilled)?,
        sparse: request.sparse,
        window: query.row_window,
    };

    let mdx = query.to_mdx();
    info!("{}", mdx);
    let mut result = session.engine().execute(&cube.name, &mdx).await?;

    if let Some(axis) = result.axes.first_mut() {
        if axis.level.is_none() {
            axis.level = Some(measures_level());
        }
        for member in &mut axis.members {
            if let Some(measure) = query.requested_measure(&member.full_name) {
                if measure.full_name != member.full_name {
                    debug!("{} reported as {}", member.full_name, measure.full_name);
                    member.name = measure.name.clone();
                    member.full_name = measure.full_name.clone();
                    member.caption = measure.caption.clone();
                    member.key = Scalar::Text(measure.name.clone());
                }
            }
        }
    }
    for (axis, level) in result.axes.iter_mut().skip(1).zip(query.axis_levels()) {
        if axis.level.is_none() {
            axis.level = level;
        }
    }

    if request.parents {
        fetch_parents(session.engine(), &cube.name, &mut result).await?;
    }
    if request.debug {
        result.mdx = Some(mdx);
    }

    Ok(Aggregation {
        cube,
        query,
        result,
        options,
    })
}

/// Attach ancestor chains to every drilldown axis. Each distinct parent
/// is fetched once, however many axes or members refer to it.
async fn fetch_parents(engine: &dyn Engine, cube: &str, result: &mut CellResult) -> QueryResult<()> {
    let parents: BTreeSet<String> = result
        .drilldown_axes()
        .iter()
        .flat_map(|axis| axis.members.iter())
        .filter_map(|m| m.parent_name.clone())
        .collect();
    if parents.is_empty() {
        return Ok(());
    }
    debug!("fetching ancestors of {} parent members", parents.len());

    let chains = try_join_all(parents.iter().map(|p| parent_chain(engine, cube, p))).await?;
    let memo: HashMap<&str, Vec<Member>> = parents.iter().map(String::as_str).zip(chains).collect();

    for axis in result.axes.iter_mut().skip(1) {
        for member in &axis.members {
            if let Some(parent) = &member.parent_name {
                if let Some(chain) = memo.get(parent.as_str()) {
                    axis.parents.insert(parent.clone(), chain.clone());
                }
            }
        }
    }
    Ok(())
}

/// The parent itself followed by its own ancestors.
async fn parent_chain(engine: &dyn Engine, cube: &str, parent: &str) -> QueryResult<Vec<Member>> {
    let Some(member) = engine.member(cube, parent).await? else {
        warn!("parent member {} could not be resolved", parent);
        return Ok(Vec::new());
    };
    let ancestors = engine.ancestors(cube, &member).await?;
    let mut chain = Vec::with_capacity(ancestors.len() + 1);
    chain.push(member);
    chain.extend(ancestors);
    Ok(chain)
}
