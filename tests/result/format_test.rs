use std::sync::Arc;

use prism::engine::{CatalogEngine, Session};
use prism::format::{aggregation, Format};
use prism::{aggregate, AggregateRequest, Aggregation};
use serde_json::json;

async fn run(request: AggregateRequest) -> Aggregation {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    let session = Session::new(Arc::new(engine));
    aggregate(&session, "Sales", &request).await.unwrap()
}

#[tokio::test]
async fn test_csv() {
    let request = AggregateRequest::new()
        .drilldown("Customers.State Province")
        .cut("Time.Year.1997");
    let csv = run(request).await.render(Format::Csv).unwrap();

    insta::assert_snapshot!(csv, @r"
    ID State,State,Unit Sales
    CA,CA,74748.0
    OR,OR,67659.0
    DF,DF,
    ");
}

#[tokio::test]
async fn test_json_records() {
    let request = AggregateRequest::new()
        .drilldown("Product")
        .property("Product.Product Family.Short Name");
    let output = run(request).await.render(Format::JsonRecords).unwrap();
    let value: serde_json::Value = serde_json::from_str(&output).unwrap();

    assert_eq!(
        value["data"][0],
        json!({
            "ID Product Family": "Drink",
            "Product Family": "Drink",
            "Short Name": "DRK",
            "Unit Sales": 24597.0
        })
    );
    assert_eq!(value["data"].as_array().unwrap().len(), 3);
    // Keys keep header order.
    assert!(output.starts_with(r#"{"data":[{"ID Product Family":"Drink","Product Family""#));
}

#[tokio::test]
async fn test_grand_total_records() {
    let output = run(AggregateRequest::new())
        .await
        .render(Format::JsonRecords)
        .unwrap();
    assert_eq!(output, r#"{"data":[{"Unit Sales":266773.0}]}"#);
}

#[tokio::test]
async fn test_aggregation_json() {
    let request = AggregateRequest::new()
        .measure("Unit Sales")
        .measure("Store Sales")
        .drilldown("Top Sellers")
        .debug(true);
    let aggregation_run = run(request).await;
    let output = aggregation(&aggregation_run.result, &aggregation_run.cube);

    assert_eq!(output.axes.len(), 2);
    assert_eq!(output.axes[1].members[0].full_name, "[Product].[Food]");
    assert_eq!(
        output.values,
        json!([[191940.0, 409035.59], [24597.0, 48836.21]])
    );

    let measures = output.axis_dimensions[0].as_ref().unwrap();
    assert_eq!(measures.name, "Measures");
    assert_eq!(measures.level, "MeasuresLevel");
    let product = output.axis_dimensions[1].as_ref().unwrap();
    assert_eq!(product.name, "Product");
    assert_eq!(product.level, "Product Family");

    assert!(output.axis_parents.is_none());
    assert_eq!(
        output.mdx.as_deref(),
        Some("SELECT {[Measures].[Unit Sales], [Measures].[Store Sales]} ON COLUMNS,\n{[Top Sellers]} ON ROWS\nFROM [Sales]")
    );

    let value = serde_json::to_value(&output).unwrap();
    assert_eq!(value["axis_dimensions"][0]["type"], "measures");
}

#[tokio::test]
async fn test_aggregation_json_with_parents() {
    let request = AggregateRequest::new()
        .drilldown("Product.Product Category")
        .cut("Product.Product Family.Drink")
        .parents(true);
    let run = run(request).await;
    let output = aggregation(&run.result, &run.cube);

    let parents = output.axis_parents.unwrap();
    assert!(parents[0].is_empty());
    assert_eq!(
        parents[1]["[Product].[Drink].[Beverages]"].full_name,
        "[Product].[Drink].[Beverages]"
    );
    assert!(output.mdx.is_none());
}
