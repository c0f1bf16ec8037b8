use std::sync::Arc;

use async_trait::async_trait;
use prism::engine::{
    measures_level, CatalogEngine, Cube, Engine, EngineError, EngineResult, LevelRef, Member,
    Session,
};
use prism::error::QueryError;
use prism::result::CellResult;
use prism::{aggregate, compile_request, AggregateRequest};
use tokio::sync::Mutex;

const FOODMART: &str = include_str!("../fixtures/foodmart.json");

/// Wraps the catalog and records every query and member lookup.
struct RecordingEngine {
    inner: CatalogEngine,
    executed: Mutex<Vec<String>>,
    lookups: Mutex<Vec<String>>,
}

impl RecordingEngine {
    fn new() -> Self {
        Self {
            inner: CatalogEngine::from_json(FOODMART).unwrap(),
            executed: Mutex::new(Vec::new()),
            lookups: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl Engine for RecordingEngine {
    async fn cube_names(&self) -> EngineResult<Vec<String>> {
        self.inner.cube_names().await
    }

    async fn cube(&self, name: &str) -> EngineResult<Option<Cube>> {
        self.inner.cube(name).await
    }

    async fn member(&self, cube: &str, expression: &str) -> EngineResult<Option<Member>> {
        self.lookups.lock().await.push(expression.to_string());
        self.inner.member(cube, expression).await
    }

    async fn ancestors(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        self.inner.ancestors(cube, member).await
    }

    async fn children(&self, cube: &str, member: &Member) -> EngineResult<Vec<Member>> {
        self.inner.children(cube, member).await
    }

    async fn level_members(&self, cube: &str, level: &LevelRef) -> EngineResult<Vec<Member>> {
        self.inner.level_members(cube, level).await
    }

    async fn execute(&self, cube: &str, mdx: &str) -> EngineResult<CellResult> {
        self.executed.lock().await.push(mdx.to_string());
        self.inner.execute(cube, mdx).await
    }

    async fn flush(&self) -> EngineResult<()> {
        self.inner.flush().await
    }
}

fn session() -> Session {
    Session::new(Arc::new(CatalogEngine::from_json(FOODMART).unwrap()))
}

#[tokio::test]
async fn test_grand_total() {
    let aggregation = aggregate(&session(), "Sales", &AggregateRequest::new())
        .await
        .unwrap();
    assert_eq!(aggregation.result.shape(), vec![1]);
    assert_eq!(aggregation.result.axes[0].level, Some(measures_level()));
    assert_eq!(
        aggregation.result.nested_values(),
        serde_json::json!([266773.0])
    );
    assert!(aggregation.result.mdx.is_none());
}

#[tokio::test]
async fn test_debug_attaches_mdx() {
    let request = AggregateRequest::new().drilldown("Product").debug(true);
    let aggregation = aggregate(&session(), "Sales", &request).await.unwrap();
    assert_eq!(aggregation.result.mdx, Some(aggregation.mdx()));
    assert_eq!(aggregation.tidy().unwrap().mdx, Some(aggregation.mdx()));
}

#[tokio::test]
async fn test_axis_levels_filled_from_query() {
    let request = AggregateRequest::new()
        .measure("Store Sales")
        .drilldown("Product")
        .drilldown("Store Type")
        .drilldown("Time");
    let aggregation = aggregate(&session(), "Sales", &request).await.unwrap();
    let levels: Vec<_> = aggregation
        .result
        .drilldown_axes()
        .iter()
        .map(|a| a.level.clone().unwrap().level)
        .collect();
    assert_eq!(levels, vec!["Product Family", "Store Type", "Year"]);
    assert_eq!(aggregation.result.shape(), vec![1, 3, 3, 2]);
}

#[tokio::test]
async fn test_unknown_cube_is_not_found() {
    let err = aggregate(&session(), "Budget", &AggregateRequest::new())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownCube(ref name) if name == "Budget"));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_unrecorded_query_is_rejected() {
    let request = AggregateRequest::new().drilldown("Customers.City");
    let err = aggregate(&session(), "Sales", &request).await.unwrap_err();
    assert!(matches!(err, QueryError::Engine(ref e) if e.is_rejection()));
    assert_eq!(err.status(), 400);
}

#[tokio::test]
async fn test_compile_errors_never_reach_engine() {
    let engine = Arc::new(RecordingEngine::new());
    let session = Session::new(engine.clone());

    let request = AggregateRequest::new()
        .drilldown("Customers.Country")
        .cut("Customers.USA.OR.Lake Oswego");
    let err = aggregate(&session, "Sales", &request).await.unwrap_err();
    assert!(matches!(err, QueryError::IllegalDrilldown { .. }));

    let request = AggregateRequest::new()
        .drilldown("Product")
        .property("Time.Year.Holiday");
    let err = aggregate(&session, "Sales", &request).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidProperty { .. }));

    assert!(engine.executed.lock().await.is_empty());
}

#[tokio::test]
async fn test_each_parent_fetched_once() {
    let engine = Arc::new(RecordingEngine::new());
    let session = Session::new(engine.clone());

    let request = AggregateRequest::new()
        .drilldown("Product.Product Category")
        .cut("Product.Product Family.Drink")
        .parents(true);
    aggregate(&session, "Sales", &request).await.unwrap();

    let mut lookups = engine.lookups.lock().await.clone();
    lookups.sort();
    assert_eq!(
        lookups,
        vec![
            "Product.Product Family.Drink",
            "[Product].[Drink].[Alcoholic Beverages]",
            "[Product].[Drink].[Beverages]",
        ]
    );
    assert_eq!(engine.executed.lock().await.len(), 1);
}

#[tokio::test]
async fn test_compile_request_does_not_execute() {
    let engine = Arc::new(RecordingEngine::new());
    let session = Session::new(engine.clone());

    let query = compile_request(
        &session,
        "Sales",
        &AggregateRequest::new().drilldown("Time.Quarter"),
    )
    .await
    .unwrap();
    assert_eq!(
        query.to_mdx(),
        "SELECT {[Measures].[Unit Sales]} ON COLUMNS,\n[Time].[Quarter].Members ON ROWS\nFROM [Sales]"
    );
    assert!(engine.executed.lock().await.is_empty());
}

#[tokio::test]
async fn test_session_caches_cubes_until_flush() {
    let session = session();
    let first = session.cube("Sales").await.unwrap();
    let second = session.cube("Sales").await.unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    session.flush().await.unwrap();
    let third = session.cube("Sales").await.unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert_eq!(first, third);

    let uncached = Session::new(Arc::new(CatalogEngine::from_json(FOODMART).unwrap()))
        .with_cache(false);
    let a = uncached.cube("Sales").await.unwrap();
    let b = uncached.cube("Sales").await.unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
}

#[tokio::test]
async fn test_cube_names() {
    assert_eq!(
        session().cube_names().await.unwrap(),
        vec!["Sales", "Warehouse"]
    );
}

#[test]
fn test_bad_catalog() {
    let err = CatalogEngine::from_json("{\"cubes\": 3}").err().unwrap();
    assert!(matches!(err, EngineError::Catalog(_)));
}
