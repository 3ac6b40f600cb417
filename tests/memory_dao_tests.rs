
use dao_fixtures::Shape;
use polydao::prelude::*;

fn circles() -> MemoryDao<Shape> {
    MemoryDao::new("Circle", "circle").with_table()
}

#[tokio::test]
async fn test_create_generates_ids() {
    let dao = circles();

    let mut first = Shape::new("Circle", "a", 1);
    let mut second = Shape::new("Circle", "b", 2);
    let mut explicit = Shape::new("Circle", "c", 3).with_id(10);
    assert_eq!(dao.create(&mut first).await.unwrap(), 1);
    assert_eq!(dao.create(&mut second).await.unwrap(), 1);
    dao.create(&mut explicit).await.unwrap();

    assert_eq!(first.id, Value::from(1));
    assert_eq!(second.id, Value::from(2));

    let mut next = Shape::new("Circle", "d", 4);
    dao.create(&mut next).await.unwrap();
    assert_eq!(next.id, Value::from(11));
    assert_eq!(dao.count_of().await.unwrap(), 4);
}

#[tokio::test]
async fn test_id_generation_fails_after_largest_id() {
    let dao = circles();
    let mut last = Shape::new("Circle", "last", 1).with_id(i64::MAX);
    dao.create(&mut last).await.unwrap();

    let mut next = Shape::new("Circle", "next", 1);
    let err = dao.create(&mut next).await.unwrap_err();
    assert!(matches!(err, DaoError::ConstraintViolation(_)));
    assert!(next.id.is_null());
    assert_eq!(dao.count_of().await.unwrap(), 1);
}

#[tokio::test]
async fn test_duplicate_id_is_rejected() {
    let dao = circles();
    let mut first = Shape::new("Circle", "a", 1).with_id(1);
    let mut again = Shape::new("Circle", "b", 1).with_id(1);

    dao.create(&mut first).await.unwrap();
    let err = dao.create(&mut again).await.unwrap_err();
    assert!(matches!(err, DaoError::ConstraintViolation(_)));
    assert_eq!(dao.count_of().await.unwrap(), 1);
}

#[tokio::test]
async fn test_writes_of_other_types_are_rejected() {
    let dao = circles();
    let mut square = Shape::new("Square", "s", 1);

    let err = dao.create(&mut square).await.unwrap_err();
    assert!(matches!(err, DaoError::NoMatchingSubtype { .. }));
    assert!(dao.query_for_id_of(&Value::from(1), "Square").await.is_err());
    assert_eq!(dao.count_of().await.unwrap(), 0);
}

#[tokio::test]
async fn test_queries() {
    let dao = circles();
    for (name, size) in [("a", 1), ("b", 2), ("c", 2)] {
        let mut shape = Shape::new("Circle", name, size);
        dao.create(&mut shape).await.unwrap();
    }

    let all = dao.query_for_all().await.unwrap();
    let names: Vec<&str> = all.iter().map(|shape| shape.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);

    assert_eq!(dao.query_for_eq("size", &Value::from(2)).await.unwrap().len(), 2);
    assert_eq!(dao.query_for_eq("id", &Value::from(3)).await.unwrap()[0].name, "c");
    assert!(dao.query_for_eq("colour", &Value::from(2)).await.unwrap().is_empty());

    let mut values = FieldValues::new();
    values.insert("size".to_string(), Value::from(2));
    values.insert("name".to_string(), Value::from("b"));
    assert_eq!(dao.query_for_field_values(&values).await.unwrap().len(), 1);
    assert_eq!(dao.count_of_matching(&values).await.unwrap(), 1);

    // Only id and non-null fields of the example are compared.
    let example = Shape::new("Circle", "c", 2);
    let matching = dao.query_for_matching(&example).await.unwrap();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].id, Value::from(3));

    assert_eq!(dao.query_for_id(&Value::from(2)).await.unwrap().unwrap().name, "b");
    assert!(dao.query_for_id(&Value::from(9)).await.unwrap().is_none());
    assert!(dao.id_exists(&Value::from(1)).await.unwrap());
    assert!(!dao.id_exists(&Value::from(9)).await.unwrap());
}

#[tokio::test]
async fn test_query_for_same_id() {
    let dao = circles();
    let mut stored = Shape::new("Circle", "stored", 1);
    dao.create(&mut stored).await.unwrap();

    let probe = Shape::new("Circle", "probe", 5).with_id(1);
    assert_eq!(dao.query_for_same_id(&probe).await.unwrap().unwrap().name, "stored");
    let unsaved = Shape::new("Circle", "unsaved", 5);
    assert!(dao.query_for_same_id(&unsaved).await.unwrap().is_none());
}

#[tokio::test]
async fn test_update_and_refresh() {
    let dao = circles();
    let mut shape = Shape::new("Circle", "before", 1);
    dao.create(&mut shape).await.unwrap();

    let mut changed = shape.clone();
    changed.name = "after".to_string();
    assert_eq!(dao.update(&changed).await.unwrap(), 1);

    assert_eq!(dao.refresh(&mut shape).await.unwrap(), 1);
    assert_eq!(shape.name, "after");

    let missing = Shape::new("Circle", "missing", 1).with_id(42);
    assert_eq!(dao.update(&missing).await.unwrap(), 0);
    let err = dao.update(&Shape::new("Circle", "no id", 1)).await.unwrap_err();
    assert!(matches!(err, DaoError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_update_id_moves_row() {
    let dao = circles();
    let mut shape = Shape::new("Circle", "moved", 1);
    dao.create(&mut shape).await.unwrap();
    let mut other = Shape::new("Circle", "other", 1);
    dao.create(&mut other).await.unwrap();

    assert_eq!(dao.update_id(&shape, &Value::from(100)).await.unwrap(), 1);
    assert!(dao.query_for_id(&Value::from(1)).await.unwrap().is_none());
    let moved = dao.query_for_id(&Value::from(100)).await.unwrap().unwrap();
    assert_eq!(moved.name, "moved");
    assert_eq!(moved.id, Value::from(100));
    assert_eq!(dao.count_of().await.unwrap(), 2);

    let err = dao.update_id(&other, &Value::from(100)).await.unwrap_err();
    assert!(matches!(err, DaoError::ConstraintViolation(_)));
}

#[tokio::test]
async fn test_create_or_update() {
    let dao = circles();
    let mut shape = Shape::new("Circle", "a", 1);

    let status = dao.create_or_update(&mut shape).await.unwrap();
    assert_eq!(status, CreateOrUpdateStatus::created(1));

    shape.size = 7;
    let status = dao.create_or_update(&mut shape).await.unwrap();
    assert_eq!(status, CreateOrUpdateStatus::updated(1));
    assert_eq!(dao.count_of().await.unwrap(), 1);
    assert_eq!(dao.query_for_id(&shape.id).await.unwrap().unwrap().size, 7);
}

#[tokio::test]
async fn test_create_if_not_exists_returns_stored_row() {
    let dao = circles();
    let mut stored = Shape::new("Circle", "stored", 1).with_id(5);
    dao.create(&mut stored).await.unwrap();

    let candidate = Shape::new("Circle", "candidate", 2).with_id(5);
    let existing = dao.create_if_not_exists(&candidate).await.unwrap();
    assert_eq!(existing.name, "stored");

    let fresh = Shape::new("Circle", "fresh", 3);
    let created = dao.create_if_not_exists(&fresh).await.unwrap();
    assert_eq!(created.id, Value::from(6));
    assert_eq!(dao.count_of().await.unwrap(), 2);
}

#[tokio::test]
async fn test_deletes() {
    let dao = circles();
    let mut rows = Vec::new();
    for n in 0..5 {
        let mut shape = Shape::new("Circle", "x", n);
        dao.create(&mut shape).await.unwrap();
        rows.push(shape);
    }

    assert_eq!(dao.delete(&rows[0]).await.unwrap(), 1);
    assert_eq!(dao.delete(&rows[0]).await.unwrap(), 0);
    assert_eq!(dao.delete_by_id(&Value::from(2)).await.unwrap(), 1);
    assert_eq!(
        dao.delete_ids(&[Value::from(3), Value::from(99)]).await.unwrap(),
        1
    );
    assert_eq!(dao.delete_all(&rows[3..]).await.unwrap(), 2);
    assert_eq!(dao.count_of().await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_table() {
    let dao: MemoryDao<Shape> = MemoryDao::new("Circle", "circle");

    assert!(!dao.is_table_exists().await.unwrap());
    let err = dao.query_for_all().await.unwrap_err();
    assert!(matches!(err, DaoError::TableNotFound(ref table) if table == "circle"));
    let mut shape = Shape::new("Circle", "a", 1);
    assert!(matches!(
        dao.create(&mut shape).await,
        Err(DaoError::TableNotFound(_))
    ));

    assert!(dao.create_table().await);
    assert!(!dao.create_table().await);
    assert!(dao.is_table_exists().await.unwrap());
    dao.create(&mut shape).await.unwrap();

    assert!(dao.drop_table().await);
    assert!(!dao.drop_table().await);
    assert!(dao.count_of().await.is_err());
}

#[tokio::test]
async fn test_object_rendering_and_equality() {
    let dao = circles();
    let shape = Shape::new("Circle", "round", 3).with_id(1);

    assert_eq!(
        dao.object_to_string(&shape).unwrap(),
        "Circle id=1, name=round, size=3, owner_id=NULL"
    );
    assert!(dao.objects_equal(&shape, &shape.clone()).unwrap());
    let resized = Shape {
        size: 4,
        ..shape.clone()
    };
    assert!(!dao.objects_equal(&shape, &resized).unwrap());
}

#[tokio::test]
async fn test_assign_empty_foreign_collection() {
    let dao = circles();
    let mut shape = Shape::new("Circle", "a", 1);

    dao.assign_empty_foreign_collection(&mut shape, "tags")
        .await
        .unwrap();
    assert_eq!(shape.tags, Some(Vec::new()));
    assert!(
        dao.assign_empty_foreign_collection(&mut shape, "corners")
            .await
            .is_err()
    );
}
