use std::sync::Arc;

use prism::engine::{CatalogEngine, Cube, LevelRef, Session};
use prism::error::QueryError;
use prism::planner::{resolve_cut, CutKind};

async fn session() -> (Session, Arc<Cube>) {
    let engine = CatalogEngine::from_json(include_str!("../fixtures/foodmart.json")).unwrap();
    let session = Session::new(Arc::new(engine));
    let cube = session.cube("Sales").await.unwrap();
    (session, cube)
}

#[tokio::test]
async fn test_member_cut() {
    let (session, cube) = session().await;
    let cut = resolve_cut(session.engine(), &cube, "Product.Product Family.Drink")
        .await
        .unwrap();

    assert_eq!(cut.kind, CutKind::Member);
    assert_eq!(
        cut.level,
        Some(LevelRef::new("Product", "Product", "Product Family"))
    );
    assert_eq!(cut.members.len(), 1);
    assert_eq!(cut.members[0].full_name, "[Product].[Drink]");
    assert_eq!(cut.depth(), Some(1));
    assert_eq!(cut.to_set().to_mdx(), "Product.Product Family.Drink");
}

#[tokio::test]
async fn test_set_cut_on_one_level() {
    let (session, cube) = session().await;
    let cut = resolve_cut(
        session.engine(),
        &cube,
        "{[Store Type].[Deluxe Supermarket], [Store Type].[Supermarket]}",
    )
    .await
    .unwrap();

    assert_eq!(cut.kind, CutKind::Set);
    assert_eq!(cut.members.len(), 2);
    assert_eq!(cut.member_fragments().len(), 2);
    assert_eq!(
        cut.to_set().to_mdx(),
        "{[Store Type].[Deluxe Supermarket], [Store Type].[Supermarket]}"
    );
}

#[tokio::test]
async fn test_range_cut_is_parenthesized() {
    let (session, cube) = session().await;
    let cut = resolve_cut(
        session.engine(),
        &cube,
        "[Time].[Year].[1997]:[Time].[Year].[1998]",
    )
    .await
    .unwrap();

    assert_eq!(cut.kind, CutKind::Range);
    assert_eq!(cut.level, Some(LevelRef::new("Time", "Time", "Year")));
    let names: Vec<_> = cut.members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["1997", "1998"]);
    assert_eq!(
        cut.to_set().to_mdx(),
        "([Time].[Year].[1997] : [Time].[Year].[1998])"
    );
}

#[tokio::test]
async fn test_named_set_cut() {
    let (session, cube) = session().await;
    let cut = resolve_cut(session.engine(), &cube, "Top Sellers")
        .await
        .unwrap();
    assert_eq!(cut.kind, CutKind::NamedSet);
    assert!(cut.members.is_empty());
    assert_eq!(cut.to_set().to_mdx(), "[Top Sellers]");
}

#[tokio::test]
async fn test_unknown_members() {
    let (session, cube) = session().await;

    let err = resolve_cut(session.engine(), &cube, "Product.Product Family.Bread")
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unknown member in cut: `Product.Product Family.Bread`"
    );

    let err = resolve_cut(
        session.engine(),
        &cube,
        "{Product.Product Family.Drink, Product.Product Family.Bread}",
    )
    .await
    .unwrap_err();
    assert!(err.to_string().starts_with("Unknown member in cut set"));

    let err = resolve_cut(session.engine(), &cube, "(Time.Year.1997 : Time.Year.1900)")
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Unknown member in cut range"));
}

#[tokio::test]
async fn test_mixed_levels_rejected() {
    let (session, cube) = session().await;

    let err = resolve_cut(
        session.engine(),
        &cube,
        "{Product.Product Family.Drink, [Product].[Drink].[Beverages]}",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::HeterogeneousCutSet { .. }));

    let err = resolve_cut(
        session.engine(),
        &cube,
        "([Time].[1997] : [Time].[1997].[Q2])",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::HeterogeneousCutRange { .. }));
}

#[tokio::test]
async fn test_unrecognized_shape() {
    let (session, cube) = session().await;
    let err = resolve_cut(
        session.engine(),
        &cube,
        "TOPCOUNT([Product].[Product Family].Members, 2)",
    )
    .await
    .unwrap_err();
    assert!(matches!(err, QueryError::InvalidCut { .. }));
}
