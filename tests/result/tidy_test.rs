use std::collections::BTreeMap;
use std::sync::Arc;

use prism::engine::{CatalogEngine, LevelRef, Member, Session};
use prism::error::QueryError;
use prism::result::{tidy, CellData, CellResult, ResultAxis, Scalar, TidyOptions};
use prism::{aggregate, AggregateRequest, Aggregation};

fn session() -> Session {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    Session::new(Arc::new(engine))
}

async fn run(request: AggregateRequest) -> Aggregation {
    aggregate(&session(), "Sales", &request).await.unwrap()
}

fn text(s: &str) -> Scalar {
    Scalar::Text(s.to_string())
}

#[tokio::test]
async fn test_grand_total_is_one_row() {
    let tidy = run(AggregateRequest::new()).await.tidy().unwrap();
    assert_eq!(tidy.header, vec!["Unit Sales"]);
    assert_eq!(tidy.rows, vec![vec![Scalar::Float(266773.0)]]);
}

#[tokio::test]
async fn test_three_axes_first_outermost() {
    let request = AggregateRequest::new()
        .measure("Store Sales")
        .drilldown("Product")
        .drilldown("Store Type")
        .drilldown("Time");
    let tidy = run(request).await.tidy().unwrap();

    assert_eq!(
        tidy.header,
        vec![
            "ID Product Family",
            "Product Family",
            "ID Store Type",
            "Store Type",
            "ID Year",
            "Year",
            "Store Sales"
        ]
    );
    assert_eq!(tidy.rows.len(), 18);
    assert!(tidy.rows.iter().all(|r| r.len() == tidy.header.len()));

    assert_eq!(
        tidy.rows[0],
        vec![
            text("Drink"),
            text("Drink"),
            Scalar::Int(1),
            text("Deluxe Supermarket"),
            Scalar::Int(1997),
            text("1997"),
            Scalar::Float(13487.16)
        ]
    );
    // Time varies fastest.
    assert_eq!(tidy.rows[1][4], Scalar::Int(1998));
    assert_eq!(tidy.rows[1][6], Scalar::Float(14212.07));
    // (Drink, Gourmet Supermarket, 1998) has no value.
    assert_eq!(tidy.rows[3][3], text("Gourmet Supermarket"));
    assert_eq!(tidy.rows[3][6], Scalar::Null);
    // Last row is the last member of every axis.
    assert_eq!(tidy.rows[17][1], text("Non-Consumable"));
    assert_eq!(tidy.rows[17][3], text("Supermarket"));
    assert_eq!(tidy.rows[17][6], Scalar::Float(65200.17));
}

#[tokio::test]
async fn test_sparse_drops_empty_rows() {
    let request = AggregateRequest::new()
        .measure("Store Sales")
        .drilldown("Product")
        .drilldown("Store Type")
        .drilldown("Time")
        .sparse(true);
    let tidy = run(request).await.tidy().unwrap();
    assert_eq!(tidy.rows.len(), 15);
    assert!(tidy.rows.iter().all(|r| !r[6].is_null()));
}

#[tokio::test]
async fn test_keyed_cells_and_sparse() {
    let request = AggregateRequest::new()
        .drilldown("Customers.State Province")
        .cut("Time.Year.1997");
    let tidy = run(request.clone()).await.tidy().unwrap();
    // Level caption, not name.
    assert_eq!(tidy.header, vec!["ID State", "State", "Unit Sales"]);
    assert_eq!(tidy.rows.len(), 3);
    assert_eq!(tidy.rows[2], vec![text("DF"), text("DF"), Scalar::Null]);

    let sparse = run(request.sparse(true)).await.tidy().unwrap();
    let states: Vec<_> = sparse.rows.iter().map(|r| r[1].clone()).collect();
    assert_eq!(states, vec![text("CA"), text("OR")]);
}

#[tokio::test]
async fn test_parents_add_ancestor_columns() {
    let request = AggregateRequest::new()
        .drilldown("Product.Product Category")
        .cut("Product.Product Family.Drink")
        .parents(true);
    let aggregation = run(request).await;

    // Each distinct parent appears once with its chain.
    let axis = &aggregation.result.axes[1];
    assert_eq!(axis.parents.len(), 2);
    let chain: Vec<_> = axis.parents["[Product].[Drink].[Beverages]"]
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(chain, vec!["Beverages", "Drink", "All Products"]);

    let tidy = aggregation.tidy().unwrap();
    assert_eq!(
        tidy.header,
        vec![
            "ID Product Family",
            "Product Family",
            "ID Product Department",
            "Product Department",
            "ID Product Category",
            "Product Category",
            "Unit Sales"
        ]
    );
    assert_eq!(
        tidy.rows[1],
        vec![
            text("Drink"),
            text("Drink"),
            text("Beverages"),
            text("Beverages"),
            text("Carbonated Beverages"),
            text("Carbonated Beverages"),
            Scalar::Float(3407.0)
        ]
    );
}

#[tokio::test]
async fn test_property_and_caption_columns() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .property("Product.Product Family.Short Name")
        .caption("Product.Product Family.Short Name");
    let tidy = run(request).await.tidy().unwrap();

    assert_eq!(
        tidy.header,
        vec!["ID Product Family", "Product Family", "Short Name", "Unit Sales"]
    );
    assert_eq!(
        tidy.rows[1],
        vec![text("Food"), text("FD"), text("FD"), Scalar::Float(191940.0)]
    );
}

#[tokio::test]
async fn test_property_requests_are_validated() {
    let session = session();

    let request = AggregateRequest::new()
        .drilldown("Product")
        .property("Store Type.Store Type.Size Class");
    let err = aggregate(&session, "Sales", &request).await.unwrap_err();
    assert!(matches!(
        err,
        QueryError::PropertyNotInDrilldown { ref dimension } if dimension == "Store Type"
    ));

    let request = AggregateRequest::new()
        .drilldown("Product")
        .property("Product.Product Family.Color");
    let err = aggregate(&session, "Sales", &request).await.unwrap_err();
    assert!(matches!(err, QueryError::InvalidProperty { .. }));
}

#[tokio::test]
async fn test_named_set_axis_uses_anchor_level() {
    let request = AggregateRequest::new()
        .measure("Unit Sales")
        .measure("Store Sales")
        .drilldown("Top Sellers");
    let tidy = run(request).await.tidy().unwrap();
    assert_eq!(
        tidy.header,
        vec!["ID Product Family", "Product Family", "Unit Sales", "Store Sales"]
    );
    assert_eq!(
        tidy.rows,
        vec![
            vec![
                text("Food"),
                text("Food"),
                Scalar::Float(191940.0),
                Scalar::Float(409035.59)
            ],
            vec![
                text("Drink"),
                text("Drink"),
                Scalar::Float(24597.0),
                Scalar::Float(48836.21)
            ],
        ]
    );
}

#[tokio::test]
async fn test_parents_across_two_hierarchies() {
    let request = AggregateRequest::new()
        .drilldown("Time.Month")
        .drilldown("Customers.City")
        .cut("Customers.Country.USA")
        .parents(true);
    let aggregation = run(request).await;
    insta::assert_snapshot!(aggregation.mdx(), @r"
    SELECT {[Measures].[Unit Sales]} ON COLUMNS,
    [Time].[Month].Members ON ROWS,
    DESCENDANTS(Customers.Country.USA, [Customers].[City]) ON PAGES
    FROM [Sales]
    ");

    let tidy = aggregation.tidy().unwrap();
    assert_eq!(
        tidy.header,
        vec![
            "ID Year",
            "Year",
            "ID Quarter",
            "Quarter",
            "ID Month",
            "Month",
            "ID Country",
            "Country",
            "ID State",
            "State",
            "ID City",
            "City",
            "Unit Sales"
        ]
    );
    assert_eq!(tidy.rows.len(), 16);
    assert_eq!(
        tidy.rows[1],
        vec![
            Scalar::Int(1997),
            text("1997"),
            text("Q1"),
            text("Q1"),
            Scalar::Int(1),
            text("1"),
            text("USA"),
            text("USA"),
            text("CA"),
            text("CA"),
            text("San Francisco"),
            text("San Francisco"),
            Scalar::Float(20.0)
        ]
    );
    // Same month name under another year keeps its own ancestors.
    assert_eq!(tidy.rows[12][0], Scalar::Int(1998));
    assert_eq!(tidy.rows[15][11], text("Portland"));
    assert_eq!(tidy.rows[15][12], Scalar::Float(1610.0));
}

#[tokio::test]
async fn test_flattening_is_repeatable() {
    let request = AggregateRequest::new()
        .drilldown("Time.Month")
        .drilldown("Customers.City")
        .cut("Customers.Country.USA")
        .parents(true)
        .sparse(true);
    let aggregation = run(request).await;

    let first = tidy(&aggregation.result, &aggregation.cube, &aggregation.options).unwrap();
    let second = tidy(&aggregation.result, &aggregation.cube, &aggregation.options).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.rows.len(), 15);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[tokio::test]
async fn test_filtered_cells_are_null() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .filter("Unit Sales > 30000");
    let aggregation = run(request.clone()).await;

    // The calculated member reads back as the measure it wraps.
    let measure = &aggregation.result.axes[0].members[0];
    assert_eq!(measure.full_name, "[Measures].[Unit Sales]");

    let tidy = aggregation.tidy().unwrap();
    assert_eq!(
        tidy.header,
        vec!["ID Product Family", "Product Family", "Unit Sales"]
    );
    assert_eq!(tidy.rows[0], vec![text("Drink"), text("Drink"), Scalar::Null]);

    let sparse = run(request.sparse(true)).await.tidy().unwrap();
    let families: Vec<_> = sparse.rows.iter().map(|r| r[1].clone()).collect();
    assert_eq!(families, vec![text("Food"), text("Non-Consumable")]);
}

#[tokio::test]
async fn test_page_counts_rows_across_axes() {
    let request = AggregateRequest::new()
        .measure("Store Sales")
        .drilldown("Product")
        .drilldown("Store Type")
        .drilldown("Time")
        .page(Some(2), Some(4));
    let tidy = run(request.clone()).await.tidy().unwrap();

    let values: Vec<_> = tidy.rows.iter().map(|r| r[6].clone()).collect();
    assert_eq!(
        values,
        vec![
            Scalar::Float(3181.43),
            Scalar::Null,
            Scalar::Float(30047.53),
            Scalar::Float(31020.86)
        ]
    );
    assert_eq!(tidy.rows[0][3], text("Gourmet Supermarket"));

    // The window is taken before sparse rows are dropped.
    let sparse = run(request.sparse(true)).await.tidy().unwrap();
    assert_eq!(sparse.rows.len(), 3);
}

fn member(name: &str, level: LevelRef) -> Member {
    Member {
        name: name.into(),
        full_name: format!("[{}]", name),
        caption: name.into(),
        key: Scalar::from(name),
        depth: 1,
        all_member: false,
        drillable: false,
        num_children: 0,
        parent_name: None,
        level,
        properties: BTreeMap::new(),
    }
}

#[tokio::test]
async fn test_empty_axis_yields_header_only() {
    let cube = session().cube("Sales").await.unwrap();
    let measure_level = LevelRef::new("Measures", "Measures", "MeasuresLevel");
    let result = CellResult {
        axes: vec![
            ResultAxis::new(vec![member("Unit Sales", measure_level)]),
            ResultAxis {
                level: Some(LevelRef::new("Product", "Product", "Product Family")),
                ..ResultAxis::default()
            },
        ],
        cells: CellData::Dense(vec![]),
        mdx: None,
    };

    let tidy = tidy(&result, &cube, &TidyOptions::default()).unwrap();
    assert_eq!(
        tidy.header,
        vec!["ID Product Family", "Product Family", "Unit Sales"]
    );
    assert!(tidy.is_empty());
}

#[tokio::test]
async fn test_unknown_axis_level_gets_numbered_columns() {
    let cube = session().cube("Sales").await.unwrap();
    let measure_level = LevelRef::new("Measures", "Measures", "MeasuresLevel");
    let foreign = LevelRef::new("Promotion", "Promotion", "Media Type");
    let result = CellResult {
        axes: vec![
            ResultAxis::new(vec![member("Unit Sales", measure_level)]),
            ResultAxis::new(vec![member("Radio", foreign.clone()), member("TV", foreign)]),
        ],
        cells: CellData::Dense(vec![Scalar::Int(5), Scalar::Int(7)]),
        mdx: Some("SELECT ...".into()),
    };

    let options = TidyOptions {
        debug: true,
        ..TidyOptions::default()
    };
    let tidy = tidy(&result, &cube, &options).unwrap();
    assert_eq!(tidy.header, vec!["ID Axis 1", "Axis 1", "Unit Sales"]);
    assert_eq!(
        tidy.rows[1],
        vec![text("TV"), text("TV"), Scalar::Int(7)]
    );
    assert_eq!(tidy.mdx.as_deref(), Some("SELECT ..."));
    assert_eq!(tidy.column("Unit Sales"), Some(2));
}
