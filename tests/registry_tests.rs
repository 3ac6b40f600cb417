
use std::sync::Arc;

use dao_fixtures::{Shape, nested_hierarchy, shape_hierarchy};
use polydao::prelude::*;

fn registry(hierarchy: TypeHierarchy) -> MemoryDaoRegistry<Shape> {
    MemoryDaoRegistry::new(Arc::new(hierarchy), RegistryConfig::default())
}

fn same_dao(first: &DaoHandle<Shape>, second: &DaoHandle<Shape>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(first), Arc::as_ptr(second))
}

#[tokio::test]
async fn test_get_or_create_is_idempotent() {
    let registry = registry(shape_hierarchy(false));

    let first = registry.get_or_create("Shape").await.unwrap();
    let second = registry.get_or_create("Shape").await.unwrap();
    assert!(same_dao(&first, &second));

    // Shape and its three declared subclasses; undeclared descendants are not created.
    assert_eq!(registry.cached_count().unwrap(), 4);
    assert!(registry.cached("Ellipse").unwrap().is_none());
}

#[tokio::test]
async fn test_sub_daos_are_the_registry_daos() {
    let registry = registry(shape_hierarchy(false));
    let local = Arc::new(MemoryDao::new("Shape", "shape").with_table());

    let shapes = PolymorphicDao::build(
        Arc::clone(registry.hierarchy()),
        "Shape",
        local as DaoHandle<Shape>,
        &registry,
    )
    .await
    .unwrap();

    for entity_type in ["Circle", "Square", "Triangle"] {
        let from_set = shapes.dao_set().handle_for(entity_type).unwrap();
        let from_registry = registry.get_or_create(entity_type).await.unwrap();
        assert!(same_dao(from_set, &from_registry));
    }
    assert!(shapes.dao_set().handle_for("Shape").is_none());
}

#[tokio::test]
async fn test_concurrent_get_or_create_returns_one_dao() {
    let registry = registry(shape_hierarchy(false));

    let (first, second) = tokio::join!(
        registry.get_or_create("Shape"),
        registry.get_or_create("Shape")
    );
    assert!(same_dao(&first.unwrap(), &second.unwrap()));
}

#[tokio::test]
async fn test_unknown_type_is_rejected() {
    let registry = registry(shape_hierarchy(false));

    let Err(err) = registry.get_or_create("Nope").await else {
        panic!("expected UnknownEntityType");
    };
    assert!(matches!(err, DaoError::UnknownEntityType(ref name) if name == "Nope"));
    assert_eq!(registry.cached_count().unwrap(), 0);
}

#[tokio::test]
async fn test_leaf_type_gets_a_plain_dao() {
    let registry = registry(shape_hierarchy(false));

    let lines = registry.get_or_create("Line").await.unwrap();
    assert_eq!(lines.data_type(), "Line");

    let mut line = Shape::new("Line", "l", 1);
    lines.create(&mut line).await.unwrap();
    assert_eq!(line.id, Value::from(1));
    assert!(lines.query_for_id(&Value::from(1)).await.unwrap().is_some());
}

#[tokio::test]
async fn test_polymorphic_end_to_end() {
    let registry = registry(shape_hierarchy(false));
    let shapes = registry.get_or_create("Shape").await.unwrap();

    let mut circle = Shape::new("Circle", "c", 1);
    let mut square = Shape::new("Square", "s", 2);
    let mut blob = Shape::new("Shape", "b", 3);
    shapes.create(&mut circle).await.unwrap();
    shapes.create(&mut square).await.unwrap();
    shapes.create(&mut blob).await.unwrap();

    // Each table generates its own ids.
    assert_eq!(circle.id, Value::from(1));
    assert_eq!(square.id, Value::from(1));

    assert_eq!(shapes.count_of().await.unwrap(), 3);
    let names: Vec<String> = shapes
        .query_for_all()
        .await
        .unwrap()
        .into_iter()
        .map(|shape| shape.name)
        .collect();
    assert_eq!(names, vec!["c", "s", "b"]);

    let squares = registry.get_or_create("Square").await.unwrap();
    assert_eq!(squares.count_of().await.unwrap(), 1);

    let found = shapes
        .query_for_id_of(&Value::from(1), "Square")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.name, "s");

    square.size = 20;
    assert_eq!(shapes.update(&square).await.unwrap(), 1);
    let sized = shapes.query_for_eq("size", &Value::from(20)).await.unwrap();
    assert_eq!(sized.len(), 1);
    assert_eq!(sized[0].kind, "Square");

    assert_eq!(shapes.delete(&square).await.unwrap(), 1);
    assert_eq!(shapes.count_of().await.unwrap(), 2);
    assert!(!shapes.id_exists_of(&Value::from(1), "Square").await.unwrap());
    assert!(shapes.id_exists_of(&Value::from(1), "Circle").await.unwrap());
    assert!(shapes.is_table_exists().await.unwrap());
}

#[tokio::test]
async fn test_nested_hierarchy() {
    let registry = registry(nested_hierarchy());
    let shapes = registry.get_or_create("Shape").await.unwrap();

    for (kind, name) in [
        ("Circle", "circle"),
        ("Polygon", "polygon"),
        ("Square", "square"),
        ("Shape", "shape"),
    ] {
        let mut shape = Shape::new(kind, name, 1);
        shapes.create(&mut shape).await.unwrap();
    }

    assert_eq!(shapes.count_of().await.unwrap(), 4);
    let names: Vec<String> = shapes
        .query_for_all()
        .await
        .unwrap()
        .into_iter()
        .map(|shape| shape.name)
        .collect();
    assert_eq!(names, vec!["circle", "square", "polygon", "shape"]);

    let polygons = registry.get_or_create("Polygon").await.unwrap();
    assert_eq!(polygons.count_of().await.unwrap(), 2);

    let square = shapes
        .query_for_id_of(&Value::from(1), "Square")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(square.kind, "Square");

    assert_eq!(
        shapes.delete_ids_of(&[Value::from(1)], "Square").await.unwrap(),
        1
    );
    assert_eq!(polygons.count_of().await.unwrap(), 1);
    assert_eq!(shapes.count_of().await.unwrap(), 3);
}

#[tokio::test]
async fn test_tables_missing_without_auto_create() {
    let registry = MemoryDaoRegistry::<Shape>::new(
        Arc::new(shape_hierarchy(false)),
        RegistryConfig::new().auto_create_tables(false),
    );
    let shapes = registry.get_or_create("Shape").await.unwrap();

    assert!(!shapes.is_table_exists().await.unwrap());
    let err = shapes.query_for_all().await.unwrap_err();
    assert!(matches!(err, DaoError::TableNotFound(ref table) if table == "circle"));
    assert!(err.is_collaborator_failure());

    // Shape, Circle, Square and Triangle were created with the polymorphic DAO.
    assert_eq!(registry.create_tables().await.unwrap(), 4);
    assert_eq!(registry.create_tables().await.unwrap(), 0);
    assert!(shapes.is_table_exists().await.unwrap());

    let mut circle = Shape::new("Circle", "c", 1);
    shapes.create(&mut circle).await.unwrap();
    assert_eq!(shapes.count_of().await.unwrap(), 1);

    assert!(registry.create_table("Line").await.unwrap());
    assert!(!registry.create_table("Line").await.unwrap());
    let lines = registry.get_or_create("Line").await.unwrap();
    assert!(lines.is_table_exists().await.unwrap());
    assert!(registry.create_table("Nope").await.is_err());
}

#[tokio::test]
async fn test_registered_dao_is_served() {
    let registry = registry(shape_hierarchy(false));
    let lines: DaoHandle<Shape> = Arc::new(MemoryDao::new("Line", "custom_lines").with_table());

    assert!(registry.register_dao(Arc::clone(&lines)).unwrap().is_none());
    let served = registry.get_or_create("Line").await.unwrap();
    assert!(same_dao(&lines, &served));
    assert!(!registry.create_table("Line").await.unwrap());

    let stray: DaoHandle<Shape> = Arc::new(MemoryDao::new("Nope", "nope"));
    assert!(registry.register_dao(stray).is_err());
}

#[tokio::test]
async fn test_query_by_shadow_class_column() {
    let owner_class = DerivedField::class_shadow("owner_id", |shape: &Shape| {
        shape.owner.map(|(owner_type, _)| owner_type.to_string())
    })
    .unwrap();
    let registry = registry(shape_hierarchy(false))
        .with_derived_field("Circle", owner_class.clone())
        .with_derived_field("Square", owner_class);
    let shapes = registry.get_or_create("Shape").await.unwrap();

    let mut owned_by_person = Shape::new("Circle", "c", 1).owned_by("Person", 7);
    let mut owned_by_team = Shape::new("Square", "s", 1).owned_by("Team", 7);
    let mut unowned = Shape::new("Square", "u", 1);
    shapes.create(&mut owned_by_person).await.unwrap();
    shapes.create(&mut owned_by_team).await.unwrap();
    shapes.create(&mut unowned).await.unwrap();

    let by_id = shapes
        .query_for_eq("owner_id", &Value::from(7))
        .await
        .unwrap();
    assert_eq!(by_id.len(), 2);

    let mut values = FieldValues::new();
    values.insert("owner_id".to_string(), Value::from(7));
    values.insert("owner_class".to_string(), Value::from("Person"));
    let persons = shapes.query_for_field_values(&values).await.unwrap();
    assert_eq!(persons.len(), 1);
    assert_eq!(persons[0].name, "c");
    assert_eq!(shapes.count_of_matching(&values).await.unwrap(), 1);
}

#[tokio::test]
async fn test_hierarchy_and_config_from_json() {
    let hierarchy = TypeHierarchy::from_json(
        r#"{
            "types": [
                { "name": "Shape", "abstract": true, "direct_subclasses": ["Circle"] },
                { "name": "Circle", "parent": "Shape", "table_name": "round_things" }
            ]
        }"#,
    )
    .unwrap();
    let config = RegistryConfig::from_json(r#"{ "table_prefix": "app_" }"#).unwrap();
    assert!(config.auto_create_tables);

    let registry = MemoryDaoRegistry::<Shape>::new(Arc::new(hierarchy), config);
    let shapes = registry.get_or_create("Shape").await.unwrap();
    let mut circle = Shape::new("Circle", "c", 1);
    shapes.create(&mut circle).await.unwrap();
    assert_eq!(shapes.count_of().await.unwrap(), 1);

    let named = registry
        .get_or_create("Circle")
        .await
        .unwrap()
        .query_for_eq("name", &Value::from("c"))
        .await
        .unwrap();
    assert_eq!(named.len(), 1);
}
