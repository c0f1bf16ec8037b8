use std::sync::Arc;

use prism::describe::{
    describe_cube, describe_dimension, level_members, member_by_key, member_by_name,
    MemberOptions,
};
use prism::engine::{CatalogEngine, Cube, DimensionType, Session};
use prism::error::QueryError;
use prism::result::Scalar;

async fn sales() -> (Session, Arc<Cube>) {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    let session = Session::new(Arc::new(engine));
    let cube = session.cube("Sales").await.unwrap();
    (session, cube)
}

#[tokio::test]
async fn test_describe_cube() {
    let (_, cube) = sales().await;
    let description = describe_cube(&cube);

    assert_eq!(description.name, "Sales");
    assert_eq!(description.annotations["source"], "foodmart");

    let dimensions: Vec<_> = description
        .dimensions
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    assert_eq!(dimensions, vec!["Time", "Product", "Store Type", "Customers"]);
    assert_eq!(description.dimensions[0].dimension_type, DimensionType::Time);

    let time = &description.dimensions[0];
    assert_eq!(time.hierarchies.len(), 2);
    assert!(!time.hierarchies[0].has_all);
    assert_eq!(
        time.hierarchies[1].all_member_name.as_deref(),
        Some("All Weeklys")
    );
    assert_eq!(time.hierarchies[1].levels[2].full_name, "[Time].[Weekly].[Week]");
    assert!(time.hierarchies[0].levels[0].members.is_none());

    // Hidden measures are left out.
    let measures: Vec<_> = description
        .measures
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(measures, vec!["Unit Sales", "Store Sales", "Sales Count"]);
    assert_eq!(description.measures[0].full_name, "[Measures].[Unit Sales]");
    assert_eq!(description.measures[0].annotations["format"], "#,###");
}

#[tokio::test]
async fn test_cube_description_json() {
    let (_, cube) = sales().await;
    let value = serde_json::to_value(describe_cube(&cube)).unwrap();
    assert_eq!(value["dimensions"][2]["type"], "standard");
    assert_eq!(
        value["dimensions"][3]["hierarchies"][0]["levels"][2]["caption"],
        "State"
    );
    assert!(value["dimensions"][0]["hierarchies"][0]["levels"][0]
        .get("members")
        .is_none());
}

#[tokio::test]
async fn test_describe_dimension_lists_level_members() {
    let (session, cube) = sales().await;
    let product = describe_dimension(&session, &cube, "Product").await.unwrap();

    let levels = &product.hierarchies[0].levels;
    let all: Vec<_> = levels[0]
        .members
        .as_ref()
        .unwrap()
        .iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(all, vec!["All Products"]);

    let departments = levels[2].members.as_ref().unwrap();
    assert_eq!(departments.len(), 4);

    let err = describe_dimension(&session, &cube, "Promotion")
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownDimension { .. }));
}

#[tokio::test]
async fn test_level_members_with_options() {
    let (session, cube) = sales().await;
    let options = MemberOptions {
        member_properties: vec!["Short Name".into()],
        caption: Some("Short Name".into()),
        children: true,
    };
    let families = level_members(&session, &cube, "Product", "Product Family", &options)
        .await
        .unwrap();

    assert_eq!(families.len(), 3);
    let drink = &families[0];
    assert_eq!(drink.name, "Drink");
    assert_eq!(drink.caption, "DRK");
    assert_eq!(drink.properties["Short Name"], Scalar::from("DRK"));
    let children: Vec<_> = drink
        .children
        .as_ref()
        .unwrap()
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    assert_eq!(children, vec!["Alcoholic Beverages", "Beverages"]);

    let err = level_members(&session, &cube, "Product", "Brand", &MemberOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownLevel { .. }));
    assert_eq!(err.status(), 404);
}

#[tokio::test]
async fn test_level_members_unique_by_key() {
    let (session, cube) = sales().await;
    let quarters = level_members(&session, &cube, "Time", "Quarter", &MemberOptions::default())
        .await
        .unwrap();
    let names: Vec<_> = quarters.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Q1", "Q2"]);
}

#[tokio::test]
async fn test_member_by_key() {
    let (session, cube) = sales().await;
    let member = member_by_key(
        &session,
        &cube,
        "Store Type",
        "Store Type",
        "2",
        &MemberOptions::default(),
    )
    .await
    .unwrap();
    assert_eq!(member.name, "Gourmet Supermarket");
    assert_eq!(member.key, Scalar::Int(2));
    let ancestors: Vec<_> = member
        .ancestors
        .unwrap()
        .iter()
        .map(|m| m.name.clone())
        .collect();
    assert_eq!(ancestors, vec!["All Store Types"]);

    let err = member_by_key(
        &session,
        &cube,
        "Store Type",
        "Store Type",
        "9",
        &MemberOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::MemberNotFound(_)));
}

#[tokio::test]
async fn test_member_by_name() {
    let (session, cube) = sales().await;
    let member = member_by_name(&session, &cube, "[Customers].[USA].[OR].[Lake Oswego]")
        .await
        .unwrap();

    assert_eq!(member.caption, "Lake Oswego");
    assert_eq!(member.depth, 3);
    assert_eq!(member.parent_name.as_deref(), Some("[Customers].[USA].[OR]"));
    let ancestors: Vec<_> = member
        .ancestors
        .as_ref()
        .unwrap()
        .iter()
        .map(|m| m.full_name.as_str())
        .collect();
    assert_eq!(
        ancestors,
        vec![
            "[Customers].[USA].[OR]",
            "[Customers].[USA]",
            "[Customers].[All Customers]"
        ]
    );

    let dimension = member.dimension.unwrap();
    assert_eq!(dimension.name, "Customers");
    assert_eq!(dimension.level, "City");

    let err = member_by_name(&session, &cube, "[Customers].[Canada]")
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::MemberNotFound(_)));
    assert_eq!(err.status(), 404);
}
