use std::sync::Arc;

use prism::engine::{CatalogEngine, Cube, LevelRef, Session};
use prism::error::{QueryError, QueryResult};
use prism::mdx::{CompareOp, SortDirection, ValueExpr};
use prism::planner::{
    compile, compile_order, parse_filter, AggregateRequest, CompiledQuery, Pagination,
};

async fn sales() -> (Session, Arc<Cube>) {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    let session = Session::new(Arc::new(engine));
    let cube = session.cube("Sales").await.unwrap();
    (session, cube)
}

async fn compiled(request: AggregateRequest) -> QueryResult<CompiledQuery> {
    let (session, cube) = sales().await;
    compile(session.engine(), &cube, &request).await
}

async fn mdx(request: AggregateRequest) -> QueryResult<String> {
    Ok(compiled(request).await?.to_mdx())
}

#[tokio::test]
async fn test_parse_filter_clause() {
    let (_, cube) = sales().await;
    let cmp = parse_filter(&cube, "Unit Sales >= 1000").unwrap();
    assert_eq!(cmp.value, ValueExpr::Measure("[Measures].[Unit Sales]".into()));
    assert_eq!(cmp.op, CompareOp::Gte);
    assert_eq!(cmp.number, "1000");

    let err = parse_filter(&cube, "Unit Sales between 1 and 2").unwrap_err();
    assert!(matches!(err, QueryError::InvalidFilter { .. }));

    let err = parse_filter(&cube, "Profit > 3").unwrap_err();
    assert!(matches!(err, QueryError::UnknownMeasure { ref measure, .. } if measure == "Profit"));
}

#[tokio::test]
async fn test_compile_order_targets() {
    let (_, cube) = sales().await;

    let order = compile_order(&cube, "Measures.Unit Sales", true).unwrap();
    assert_eq!(order.by, ValueExpr::Measure("[Measures].[Unit Sales]".into()));
    assert_eq!(order.direction, SortDirection::Descending);
    assert!(order.hierarchy.is_none());

    let order = compile_order(&cube, "Product.Product Family.Short Name", false).unwrap();
    assert_eq!(
        order.by,
        ValueExpr::Property {
            hierarchy: "[Product]".into(),
            property: "Short Name".into(),
        }
    );
    assert_eq!(
        order.hierarchy,
        Some(LevelRef::new("Product", "Product", "Product Family"))
    );

    let order = compile_order(&cube, "Time.Weekly.Week.caption", false).unwrap();
    assert_eq!(
        order.hierarchy,
        Some(LevelRef::new("Time", "Weekly", "Week"))
    );

    for bad in [
        "Measures.Profit",
        "Product.Product Family.Color",
        "Product",
        "Promotion.Media Type.name",
    ] {
        let err = compile_order(&cube, bad, false).unwrap_err();
        assert!(
            matches!(err, QueryError::InvalidOrder { .. }),
            "{} gave {:?}",
            bad,
            err
        );
    }
}

#[tokio::test]
async fn test_full_wrapping_order() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .filter("Unit Sales > 1000")
        .filter("Store Sales <= 50000.5")
        .order("Measures.Unit Sales", true)
        .page(Some(1), Some(2))
        .distinct(true);

    insta::assert_snapshot!(mdx(request).await.unwrap(), @r"
    WITH MEMBER [Measures].[Filtered Unit Sales] AS IIF([Measures].[Unit Sales] > 1000 AND [Measures].[Store Sales] <= 50000.5, [Measures].[Unit Sales], NULL)
    SELECT {[Measures].[Filtered Unit Sales]} ON COLUMNS,
    DISTINCT(SUBSET(ORDER([Product].[Product Family].Members, [Measures].[Unit Sales], BDESC), 1, 2)) ON ROWS
    FROM [Sales]
    ");
}

#[tokio::test]
async fn test_filter_applies_to_every_cell() {
    let request = AggregateRequest::new()
        .drilldown("Product.Product Family")
        .drilldown("Time.Year")
        .measure("Unit Sales")
        .measure("Store Sales")
        .filter("Unit Sales > 100");

    insta::assert_snapshot!(mdx(request).await.unwrap(), @r"
    WITH MEMBER [Measures].[Filtered Unit Sales] AS IIF([Measures].[Unit Sales] > 100, [Measures].[Unit Sales], NULL)
    MEMBER [Measures].[Filtered Store Sales] AS IIF([Measures].[Unit Sales] > 100, [Measures].[Store Sales], NULL)
    SELECT {[Measures].[Filtered Unit Sales], [Measures].[Filtered Store Sales]} ON COLUMNS,
    [Product].[Product Family].Members ON ROWS,
    [Time].[Year].Members ON PAGES
    FROM [Sales]
    ");
}

#[tokio::test]
async fn test_filter_reaches_grand_total() {
    let request = AggregateRequest::new().filter("Unit Sales > 999999999");
    insta::assert_snapshot!(mdx(request).await.unwrap(), @r"
    WITH MEMBER [Measures].[Filtered Unit Sales] AS IIF([Measures].[Unit Sales] > 999999999, [Measures].[Unit Sales], NULL)
    SELECT {[Measures].[Filtered Unit Sales]} ON COLUMNS
    FROM [Sales]
    ");
}

#[tokio::test]
async fn test_filtered_measures_map_back() {
    let query = compiled(
        AggregateRequest::new()
            .measure("Store Sales")
            .filter("Unit Sales > 10"),
    )
    .await
    .unwrap();
    let measure = query
        .requested_measure("[Measures].[Filtered Store Sales]")
        .unwrap();
    assert_eq!(measure.full_name, "[Measures].[Store Sales]");
    assert!(query.requested_measure("[Measures].[Filtered Unit Sales]").is_none());

    let unfiltered = compiled(AggregateRequest::new().measure("Store Sales"))
        .await
        .unwrap();
    assert!(unfiltered
        .requested_measure("[Measures].[Filtered Store Sales]")
        .is_none());
}

#[tokio::test]
async fn test_limit_only_starts_at_zero() {
    let request = AggregateRequest::new().drilldown("Time").page(None, Some(5));
    insta::assert_snapshot!(mdx(request).await.unwrap(), @r"
    SELECT {[Measures].[Unit Sales]} ON COLUMNS,
    SUBSET([Time].[Year].Members, 0, 5) ON ROWS
    FROM [Sales]
    ");
}

#[tokio::test]
async fn test_property_order_wraps_only_its_axis() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .drilldown("Store Type")
        .order("Store Type.Store Type.key", false);

    insta::assert_snapshot!(mdx(request).await.unwrap(), @r#"
    SELECT {[Measures].[Unit Sales]} ON COLUMNS,
    [Product].[Product Family].Members ON ROWS,
    ORDER([Store Type].[Store Type].Members, [Store Type].CurrentMember.Properties("MEMBER_KEY"), BASC) ON PAGES
    FROM [Sales]
    "#);
}

#[tokio::test]
async fn test_order_on_undrilled_dimension() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .order("Store Type.Store Type.name", false);
    let err = mdx(request).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidOrder { .. }));
}

#[tokio::test]
async fn test_pagination_counts_rows_across_drilldowns() {
    let query = compiled(
        AggregateRequest::new()
            .drilldown("Product.Product Family")
            .drilldown("Time.Year")
            .page(Some(1), Some(5)),
    )
    .await
    .unwrap();

    // No per-axis SUBSET: 5 rows, not 5 members of each axis.
    insta::assert_snapshot!(query.to_mdx(), @r"
    SELECT {[Measures].[Unit Sales]} ON COLUMNS,
    [Product].[Product Family].Members ON ROWS,
    [Time].[Year].Members ON PAGES
    FROM [Sales]
    ");
    assert_eq!(query.row_window, Pagination::new(Some(1), Some(5)));

    let single = compiled(AggregateRequest::new().drilldown("Time").page(Some(1), Some(5)))
        .await
        .unwrap();
    assert!(single.row_window.is_empty());
}

#[tokio::test]
async fn test_clauses_without_drilldowns() {
    let query = compiled(
        AggregateRequest::new()
            .order("Store Type.Store Type.name", false)
            .page(Some(3), Some(3)),
    )
    .await
    .unwrap();
    assert_eq!(
        query.to_mdx(),
        "SELECT {[Measures].[Unit Sales]} ON COLUMNS\nFROM [Sales]"
    );
    assert_eq!(query.row_window, Pagination::new(Some(3), Some(3)));
}

#[tokio::test]
async fn test_filter_errors_surface_from_compile() {
    let request = AggregateRequest::new().drilldown("Product").filter("Unit Sales ~ 3");
    let err = mdx(request).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidFilter { .. }));
    assert_eq!(err.status(), 400);
}
