use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Full record for a single catalog item, as served by `GET /api/items/{item_id}`.
///
/// Optional fields serialize as `null` rather than being skipped, and every
/// collection is always present (possibly empty).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ItemDetail {
    pub id: i64,
    pub name: String,
    /// Decimal amount kept as text, e.g. `"19.99"`.
    #[schema(example = "19.99")]
    pub price: String,
    pub description: Option<String>,
    /// RFC 3339 timestamp in UTC.
    #[schema(example = "2025-05-30T17:09:00.123456Z")]
    pub created_at: String,
    #[schema(example = "2025-05-30T17:09:00.123456Z")]
    pub updated_at: String,
    pub categories: Vec<CategoryRef>,
    pub details: Option<ItemDetails>,
    pub sizes: Vec<SizeVariant>,
    pub images: Vec<ItemImage>,
    pub detail_images: Vec<DetailImage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryRef {
    pub id: i64,
    pub name: String,
}

/// Color and free-form detail text; at most one per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemDetails {
    pub color: String,
    pub detail: Option<String>,
}

/// Stock count for one size label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct SizeVariant {
    pub size: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ItemImage {
    pub id: i64,
    pub image_url: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DetailImage {
    pub id: i64,
    pub image_url: String,
    pub display_order: i64,
}

impl ItemDetail {
    /// First image flagged as primary, if any.
    pub fn primary_image(&self) -> Option<&ItemImage> {
        self.images.iter().find(|image| image.is_primary)
    }

    /// Detail images sorted by `display_order`; ties keep their sequence order.
    pub fn detail_images_by_display_order(&self) -> Vec<&DetailImage> {
        let mut ordered: Vec<&DetailImage> = self.detail_images.iter().collect();
        ordered.sort_by_key(|image| image.display_order);
        ordered
    }

    pub fn total_stock(&self) -> i64 {
        self.sizes.iter().map(|variant| variant.quantity).sum()
    }

    pub fn quantity_for(&self, size: &str) -> Option<i64> {
        self.sizes
            .iter()
            .find(|variant| variant.size == size)
            .map(|variant| variant.quantity)
    }
}
