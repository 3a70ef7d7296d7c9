use std::collections::HashMap;

use chrono::{SecondsFormat, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use serde_json::Value;

use crate::{
    dto::items::{CategoryTree, ConformanceReport, ItemList, RecentItemList},
    entity::{
        categories::{self, Entity as Categories},
        detail_images::{self, Entity as DetailImages},
        details::{self, Entity as Details},
        images::{self, Entity as Images, ImageQuality},
        item_categories::{self, Entity as ItemCategories},
        items::{self, Column, Entity as Items},
        sizes::{self, Entity as Sizes},
    },
    error::{AppError, AppResult},
    models::{
        CategoryNode, CategoryRef, DetailImage, ItemDetail, ItemDetails, ItemImage, ItemSummary,
        RecentItem, SizeVariant,
    },
    response::{ApiResponse, Meta},
    routes::params::{ItemQuery, ItemSortBy, RecentQuery, SortOrder},
    state::AppState,
};

pub async fn list_items(state: &AppState, query: ItemQuery) -> AppResult<ApiResponse<ItemList>> {
    let filter = query.filter()?;
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(category_id) = filter.category_id {
        let linked = Query::select()
            .column(item_categories::Column::ItemId)
            .from(ItemCategories)
            .and_where(item_categories::Column::CategoryId.eq(category_id))
            .to_owned();
        condition = condition.add(Column::Id.in_subquery(linked));
    }

    if let Some(search) = filter.search.as_ref() {
        let pattern = format!("%{}%", search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(min_price) = filter.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = filter.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_col = match filter.sort_by {
        ItemSortBy::CreatedAt => Column::CreatedAt,
        ItemSortBy::Price => Column::Price,
        ItemSortBy::Name => Column::Name,
    };

    let mut finder = Items::find().filter(condition);
    finder = match filter.sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col).order_by_asc(Column::Id),
        SortOrder::Desc => finder.order_by_desc(sort_col).order_by_desc(Column::Id),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let page_items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let item_ids: Vec<i32> = page_items.iter().map(|item| item.id).collect();
    let category_names = load_category_names(state, &item_ids).await?;
    let thumbnails = load_low_quality_images(state, &item_ids).await?;

    tracing::debug!(page, limit, total, returned = page_items.len(), "listed items");

    let items = page_items
        .into_iter()
        .map(|item| {
            let categories = category_names.get(&item.id).cloned().unwrap_or_default();
            let image = thumbnails.get(&item.id).cloned();
            summary_from_entity(item, categories, image)
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Items", ItemList { items }, Some(meta)))
}

pub async fn list_recent_items(
    state: &AppState,
    query: RecentQuery,
) -> AppResult<ApiResponse<RecentItemList>> {
    let recent = Items::find()
        .order_by_desc(Column::CreatedAt)
        .order_by_desc(Column::Id)
        .limit(query.limit())
        .all(&state.orm)
        .await?;

    let item_ids: Vec<i32> = recent.iter().map(|item| item.id).collect();
    let thumbnails = load_low_quality_images(state, &item_ids).await?;

    let items = recent
        .into_iter()
        .map(|item| RecentItem {
            low_quality_image: thumbnails.get(&item.id).cloned(),
            id: i64::from(item.id),
            name: item.name,
            price: item.price.to_string(),
            description: item.description,
        })
        .collect();

    Ok(ApiResponse::success(
        "Recent items",
        RecentItemList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_item_detail(state: &AppState, id: i32) -> AppResult<ApiResponse<ItemDetail>> {
    let item = match Items::find_by_id(id).one(&state.orm).await? {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let links = ItemCategories::find()
        .filter(item_categories::Column::ItemId.eq(id))
        .all(&state.orm)
        .await?;
    let category_ids: Vec<i32> = links.iter().map(|link| link.category_id).collect();
    let categories = if category_ids.is_empty() {
        Vec::new()
    } else {
        Categories::find()
            .filter(categories::Column::Id.is_in(category_ids))
            .order_by_asc(categories::Column::Id)
            .all(&state.orm)
            .await?
    };

    let details = Details::find()
        .filter(details::Column::ItemId.eq(id))
        .one(&state.orm)
        .await?;

    let sizes = Sizes::find()
        .filter(sizes::Column::ItemId.eq(id))
        .order_by_asc(sizes::Column::Id)
        .all(&state.orm)
        .await?;

    let images = Images::find()
        .filter(images::Column::ItemId.eq(id))
        .order_by_asc(images::Column::Id)
        .all(&state.orm)
        .await?;

    let detail_images = DetailImages::find()
        .filter(detail_images::Column::ItemId.eq(id))
        .order_by_asc(detail_images::Column::DisplayOrder)
        .order_by_asc(detail_images::Column::Id)
        .all(&state.orm)
        .await?;

    let detail = assemble_detail(item, categories, details, sizes, images, detail_images);

    let violations = detail.check_invariants();
    if !violations.is_empty() {
        let violations: Vec<String> = violations.iter().map(ToString::to_string).collect();
        tracing::warn!(item_id = id, ?violations, "item detail breaks catalog invariants");
    }

    Ok(ApiResponse::success("Item", detail, None))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryTree>> {
    let rows = Categories::find()
        .order_by_asc(categories::Column::Id)
        .all(&state.orm)
        .await?;
    let categories = build_category_tree(rows);
    Ok(ApiResponse::success(
        "Categories",
        CategoryTree { categories },
        Some(Meta::empty()),
    ))
}

/// Checks an arbitrary payload against the item detail shape. Non-conforming
/// payloads fail; conforming ones are reported with any broken invariants.
pub fn check_conformance(payload: Value) -> AppResult<ApiResponse<ConformanceReport>> {
    let item = ItemDetail::from_json_value(payload)?;
    let violations = item.check_invariants();
    let report = ConformanceReport {
        valid: violations.is_empty(),
        violations,
    };
    Ok(ApiResponse::success("Conforms", report, Some(Meta::empty())))
}

/// Category names per item, ordered by category id.
async fn load_category_names(
    state: &AppState,
    item_ids: &[i32],
) -> AppResult<HashMap<i32, Vec<String>>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let links = ItemCategories::find()
        .filter(item_categories::Column::ItemId.is_in(item_ids.to_vec()))
        .order_by_asc(item_categories::Column::CategoryId)
        .all(&state.orm)
        .await?;

    let mut category_ids: Vec<i32> = links.iter().map(|link| link.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    let names: HashMap<i32, String> = Categories::find()
        .filter(categories::Column::Id.is_in(category_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|category| (category.id, category.name))
        .collect();

    let mut by_item: HashMap<i32, Vec<String>> = HashMap::new();
    for link in links {
        if let Some(name) = names.get(&link.category_id) {
            by_item.entry(link.item_id).or_default().push(name.clone());
        }
    }
    Ok(by_item)
}

/// First low-quality image URL per item.
async fn load_low_quality_images(
    state: &AppState,
    item_ids: &[i32],
) -> AppResult<HashMap<i32, String>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows = Images::find()
        .filter(images::Column::ItemId.is_in(item_ids.to_vec()))
        .filter(images::Column::Quality.eq(ImageQuality::Low))
        .order_by_asc(images::Column::Id)
        .all(&state.orm)
        .await?;

    Ok(first_image_per_item(rows))
}

fn first_image_per_item(rows: Vec<images::Model>) -> HashMap<i32, String> {
    let mut first = HashMap::new();
    for row in rows {
        first.entry(row.item_id).or_insert(row.image_url);
    }
    first
}

pub(crate) fn format_timestamp(ts: &DateTimeWithTimeZone) -> String {
    ts.with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn summary_from_entity(
    item: items::Model,
    categories: Vec<String>,
    image: Option<String>,
) -> ItemSummary {
    ItemSummary {
        id: i64::from(item.id),
        name: item.name,
        price: item.price.to_string(),
        description: item.description,
        categories,
        image,
        created_at: format_timestamp(&item.created_at),
    }
}

/// Builds the item detail record from already loaded rows. Rows are kept in
/// the order given.
pub(crate) fn assemble_detail(
    item: items::Model,
    categories: Vec<categories::Model>,
    details: Option<details::Model>,
    sizes: Vec<sizes::Model>,
    images: Vec<images::Model>,
    detail_images: Vec<detail_images::Model>,
) -> ItemDetail {
    ItemDetail {
        id: i64::from(item.id),
        name: item.name,
        price: item.price.to_string(),
        description: item.description,
        created_at: format_timestamp(&item.created_at),
        updated_at: format_timestamp(&item.updated_at),
        categories: categories
            .into_iter()
            .map(|category| CategoryRef {
                id: i64::from(category.id),
                name: category.name,
            })
            .collect(),
        details: details.map(|row| ItemDetails {
            color: row.color,
            detail: row.detail,
        }),
        sizes: sizes
            .into_iter()
            .map(|row| SizeVariant {
                size: row.size,
                quantity: i64::from(row.quantity),
            })
            .collect(),
        images: images
            .into_iter()
            .map(|row| ItemImage {
                id: i64::from(row.id),
                image_url: row.image_url,
                is_primary: row.is_primary,
            })
            .collect(),
        detail_images: detail_images
            .into_iter()
            .map(|row| DetailImage {
                id: i64::from(row.id),
                image_url: row.image_url,
                display_order: i64::from(row.display_order),
            })
            .collect(),
    }
}

/// Nests categories under their parents. Categories whose parent is missing
/// are treated as roots. Siblings keep ascending id order.
pub(crate) fn build_category_tree(rows: Vec<categories::Model>) -> Vec<CategoryNode> {
    let known: std::collections::HashSet<i32> = rows.iter().map(|row| row.id).collect();
    let mut children: HashMap<Option<i32>, Vec<categories::Model>> = HashMap::new();
    for row in rows {
        let parent = row.parent_category_id.filter(|id| known.contains(id));
        children.entry(parent).or_default().push(row);
    }
    for siblings in children.values_mut() {
        siblings.sort_by_key(|row| row.id);
    }

    fn attach(
        parent: Option<i32>,
        children: &mut HashMap<Option<i32>, Vec<categories::Model>>,
    ) -> Vec<CategoryNode> {
        let rows = children.remove(&parent).unwrap_or_default();
        rows.into_iter()
            .map(|row| CategoryNode {
                id: i64::from(row.id),
                subcategories: attach(Some(row.id), children),
                name: row.name,
            })
            .collect()
    }

    attach(None, &mut children)
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};
    use rust_decimal::Decimal;

    use super::*;

    fn ts() -> DateTimeWithTimeZone {
        FixedOffset::east_opt(2 * 3600)
            .unwrap()
            .with_ymd_and_hms(2025, 5, 30, 19, 9, 0)
            .unwrap()
    }

    fn category(id: i32, name: &str, parent: Option<i32>) -> categories::Model {
        categories::Model {
            id,
            name: name.into(),
            parent_category_id: parent,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    fn image(id: i32, item_id: i32, quality: ImageQuality, is_primary: bool) -> images::Model {
        images::Model {
            id,
            item_id,
            image_url: format!("https://picsum.photos/seed/item{item_id}-{id}/400/300"),
            quality,
            is_primary,
            created_at: ts(),
            updated_at: ts(),
        }
    }

    #[test]
    fn conformance_reports_broken_invariants() {
        let payload = serde_json::json!({
            "id": 1,
            "name": "Cotton T-Shirt",
            "price": "19.99",
            "created_at": "2025-05-30T17:09:00Z",
            "updated_at": "2025-05-30T17:09:00Z",
            "categories": [],
            "sizes": [{ "size": "S", "quantity": 1 }, { "size": "S", "quantity": 2 }],
            "images": [],
            "detail_images": []
        });
        let report = check_conformance(payload).unwrap().data.unwrap();
        assert!(!report.valid);
        assert_eq!(report.violations.len(), 1);

        let missing = check_conformance(serde_json::json!({ "id": 1 }));
        assert!(matches!(missing, Err(AppError::Shape(_))));
    }

    #[test]
    fn timestamps_render_in_utc_with_micros() {
        assert_eq!(format_timestamp(&ts()), "2025-05-30T17:09:00.000000Z");
    }

    #[test]
    fn detail_is_assembled_with_exact_price_text() {
        let item = items::Model {
            id: 3,
            name: "Flannel Shirt".into(),
            price: Decimal::new(3950, 2),
            description: None,
            created_at: ts(),
            updated_at: ts(),
        };
        let detail = assemble_detail(
            item,
            vec![category(5, "Men Top", Some(1))],
            None,
            vec![sizes::Model {
                id: 1,
                item_id: 3,
                size: "M".into(),
                quantity: 12,
                created_at: ts(),
                updated_at: ts(),
            }],
            vec![
                image(1, 3, ImageQuality::Medium, true),
                image(2, 3, ImageQuality::Low, false),
            ],
            vec![],
        );

        assert_eq!(detail.price, "39.50");
        assert_eq!(detail.description, None);
        assert_eq!(detail.details, None);
        assert_eq!(
            detail.categories,
            vec![CategoryRef {
                id: 5,
                name: "Men Top".into()
            }]
        );
        assert_eq!(detail.sizes[0].quantity, 12);
        assert_eq!(detail.primary_image().map(|img| img.id), Some(1));
        assert!(detail.detail_images.is_empty());
        assert!(detail.check_invariants().is_empty());
    }

    #[test]
    fn first_low_image_wins_per_item() {
        let first = first_image_per_item(vec![
            image(4, 1, ImageQuality::Low, false),
            image(9, 1, ImageQuality::Low, false),
            image(5, 2, ImageQuality::Low, false),
        ]);
        assert_eq!(first.len(), 2);
        assert!(first[&1].contains("item1-4"));
        assert!(first[&2].contains("item2-5"));
    }

    #[test]
    fn categories_nest_under_parents() {
        let tree = build_category_tree(vec![
            category(6, "Men Bottom", Some(1)),
            category(1, "Men", None),
            category(5, "Men Top", Some(1)),
            category(4, "Other", None),
            category(13, "furniture", Some(4)),
            category(20, "orphan", Some(99)),
        ]);

        let roots: Vec<&str> = tree.iter().map(|node| node.name.as_str()).collect();
        assert_eq!(roots, vec!["Men", "Other", "orphan"]);
        let men: Vec<&str> = tree[0]
            .subcategories
            .iter()
            .map(|node| node.name.as_str())
            .collect();
        assert_eq!(men, vec!["Men Top", "Men Bottom"]);
        assert_eq!(tree[1].subcategories[0].name, "furniture");
        assert!(tree[2].subcategories.is_empty());
    }
}
