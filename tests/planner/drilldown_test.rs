use std::sync::Arc;

use prism::engine::{CatalogEngine, Cube, LevelRef, Session};
use prism::error::QueryError;
use prism::planner::{resolve_drilldown, DrilldownTarget};

async fn sales() -> Arc<Cube> {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    Session::new(Arc::new(engine)).cube("Sales").await.unwrap()
}

fn level_of(target: &DrilldownTarget) -> (&LevelRef, &str, usize) {
    match target {
        DrilldownTarget::Level {
            level,
            unique_name,
            depth,
        } => (level, unique_name.as_str(), *depth),
        DrilldownTarget::NamedSet(set) => panic!("expected a level, got named set {}", set.name),
    }
}

#[tokio::test]
async fn test_dimension_only_lands_on_first_real_level() {
    let cube = sales().await;

    let product = resolve_drilldown(&cube, "Product").unwrap();
    let (level, unique_name, depth) = level_of(&product.target);
    assert_eq!(level, &LevelRef::new("Product", "Product", "Product Family"));
    assert_eq!(unique_name, "[Product].[Product Family]");
    assert_eq!(depth, 1);

    // No All level: the first level is real.
    let time = resolve_drilldown(&cube, "Time").unwrap();
    let (level, unique_name, depth) = level_of(&time.target);
    assert_eq!(level.level, "Year");
    assert_eq!(unique_name, "[Time].[Year]");
    assert_eq!(depth, 0);
}

#[tokio::test]
async fn test_dimension_level() {
    let cube = sales().await;
    let drilldown = resolve_drilldown(&cube, "Customers.State Province").unwrap();
    let (level, unique_name, depth) = level_of(&drilldown.target);
    assert_eq!(level, &LevelRef::new("Customers", "Customers", "State Province"));
    assert_eq!(unique_name, "[Customers].[State Province]");
    assert_eq!(depth, 2);
    assert_eq!(drilldown.level(), Some(level));
}

#[tokio::test]
async fn test_dimension_hierarchy_level() {
    let cube = sales().await;
    let drilldown = resolve_drilldown(&cube, "[Time].[Weekly].[Week]").unwrap();
    let (level, unique_name, depth) = level_of(&drilldown.target);
    assert_eq!(level, &LevelRef::new("Time", "Weekly", "Week"));
    assert_eq!(unique_name, "[Time].[Weekly].[Week]");
    assert_eq!(depth, 2);
}

#[tokio::test]
async fn test_named_set() {
    let cube = sales().await;
    let drilldown = resolve_drilldown(&cube, "Top Sellers").unwrap();
    match &drilldown.target {
        DrilldownTarget::NamedSet(set) => assert_eq!(set.name, "Top Sellers"),
        other => panic!("expected named set, got {:?}", other),
    }
    assert_eq!(
        drilldown.level(),
        Some(&LevelRef::new("Product", "Product", "Product Family"))
    );
}

#[tokio::test]
async fn test_unknown_dimension() {
    let cube = sales().await;
    let err = resolve_drilldown(&cube, "Promotion.Media Type").unwrap_err();
    assert!(matches!(
        err,
        QueryError::UnknownDimension { ref dimension, .. } if dimension == "Promotion"
    ));
}

#[tokio::test]
async fn test_invalid_drilldowns() {
    let cube = sales().await;
    for spec in [
        "Product.Brand",
        "Time.Fiscal.Year",
        "Product.Product Family.&Drink",
        "Customers.Customers.Country.City",
    ] {
        let err = resolve_drilldown(&cube, spec).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidDrilldown { .. }),
            "{} gave {:?}",
            spec,
            err
        );
        assert_eq!(err.status(), 400);
    }
}
