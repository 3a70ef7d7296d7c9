use serde_json::{Value, json};
use shop_catalog_api::models::{InvariantViolation, ItemDetail, ShapeError};

fn minimal() -> Value {
    json!({
        "id": 12,
        "name": "Sweater",
        "price": "45.95",
        "description": null,
        "created_at": "2025-05-30T17:09:00.000000Z",
        "updated_at": "2025-05-30T17:09:00.000000Z",
        "categories": [],
        "details": null,
        "sizes": [],
        "images": [],
        "detail_images": []
    })
}

fn full() -> Value {
    json!({
        "id": 1,
        "name": "Cotton T-Shirt",
        "price": "19.99",
        "description": "Basic crew neck tee",
        "created_at": "2025-05-30T17:09:00.123456Z",
        "updated_at": "2025-06-02T10:00:00.000000Z",
        "categories": [{ "id": 5, "name": "Men Top" }],
        "details": { "color": "White", "detail": null },
        "sizes": [{ "size": "S", "quantity": 20 }, { "size": "M", "quantity": 30 }],
        "images": [
            { "id": 1, "image_url": "https://picsum.photos/seed/item1-imgA-medium/800/600", "is_primary": true },
            { "id": 2, "image_url": "https://picsum.photos/seed/item1-imgA-low/400/300", "is_primary": false }
        ],
        "detail_images": [
            { "id": 8, "image_url": "https://picsum.photos/seed/item1-detail2/1000/1000", "display_order": 2 },
            { "id": 7, "image_url": "https://picsum.photos/seed/item1-detail1/1000/1000", "display_order": 1 }
        ]
    })
}

fn assert_non_conforming(value: Value, expected_path: &str, needle: &str) {
    match ItemDetail::from_json_value(value) {
        Err(ShapeError::NonConforming { path, reason }) => {
            assert_eq!(path, expected_path, "reason: {reason}");
            assert!(reason.contains(needle), "unexpected reason: {reason}");
        }
        other => panic!("expected non-conforming payload, got {other:?}"),
    }
}

#[test]
fn empty_collections_and_null_optionals_conform() {
    let item = ItemDetail::from_json_value(minimal()).expect("minimal record conforms");
    assert_eq!(item.description, None);
    assert_eq!(item.details, None);
    assert!(item.categories.is_empty());
    assert!(item.sizes.is_empty());
    assert!(item.images.is_empty());
    assert!(item.detail_images.is_empty());
}

#[test]
fn omitted_optionals_conform() {
    let mut value = minimal();
    let object = value.as_object_mut().unwrap();
    object.remove("description");
    object.remove("details");
    let item = ItemDetail::from_json_value(value).expect("omitted optionals conform");
    assert_eq!(item.description, None);
    assert_eq!(item.details, None);
}

#[test]
fn empty_description_differs_from_absent() {
    let mut value = minimal();
    value["description"] = json!("");
    let item = ItemDetail::from_json_value(value).unwrap();
    assert_eq!(item.description.as_deref(), Some(""));
}

#[test]
fn missing_id_does_not_conform() {
    let mut value = minimal();
    value.as_object_mut().unwrap().remove("id");
    assert_non_conforming(value, "id", "missing field");
}

#[test]
fn numeric_price_does_not_conform() {
    let mut value = minimal();
    value["price"] = json!(45.95);
    assert_non_conforming(value, "price", "string");
}

#[test]
fn category_without_name_does_not_conform() {
    let mut value = minimal();
    value["categories"] = json!([{ "id": 1, "name": "Men" }, { "id": 2 }]);
    assert_non_conforming(value, "categories[1].name", "missing field `name`");
}

#[test]
fn null_or_missing_collection_does_not_conform() {
    let mut value = minimal();
    value["sizes"] = Value::Null;
    assert_non_conforming(value, "sizes", "null");

    let mut value = minimal();
    value.as_object_mut().unwrap().remove("detail_images");
    assert_non_conforming(value, "detail_images", "missing field");
}

#[test]
fn details_require_color() {
    let mut value = minimal();
    value["details"] = json!({ "detail": "Stretch denim" });
    assert_non_conforming(value, "details.color", "missing field `color`");
}

#[test]
fn two_primary_images_conform_but_break_invariant() {
    let mut value = full();
    value["images"][1]["is_primary"] = json!(true);
    let item = ItemDetail::from_json_value(value).expect("shape allows two primaries");

    assert_eq!(
        item.check_invariants(),
        vec![InvariantViolation::MultiplePrimaryImages {
            image_ids: vec![1, 2]
        }]
    );
    assert!(matches!(item.validate(), Err(ShapeError::Invariants(_))));
}

#[test]
fn round_trip_preserves_every_field() {
    let original = ItemDetail::from_json_value(full()).unwrap();
    let encoded = serde_json::to_string(&original).unwrap();
    let decoded = ItemDetail::from_json_str(&encoded).unwrap();
    assert_eq!(decoded, original);
    assert_eq!(original.to_json_value().unwrap(), full());
}

#[test]
fn detail_images_keep_sequence_but_sort_on_request() {
    let item = ItemDetail::from_json_value(full()).unwrap();
    assert_eq!(item.detail_images[0].id, 8);
    let ordered: Vec<i64> = item
        .detail_images_by_display_order()
        .iter()
        .map(|image| image.id)
        .collect();
    assert_eq!(ordered, vec![7, 8]);
}
