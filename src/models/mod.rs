use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub mod conformance;
pub mod item_detail;

pub use conformance::{InvariantViolation, ShapeError};
pub use item_detail::{CategoryRef, DetailImage, ItemDetail, ItemDetails, ItemImage, SizeVariant};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
}

/// Listing row for `GET /api/items`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemSummary {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    /// Category names only.
    pub categories: Vec<String>,
    /// First low-quality image URL.
    pub image: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecentItem {
    pub id: i64,
    pub name: String,
    pub price: String,
    pub description: Option<String>,
    pub low_quality_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoryNode {
    pub id: i64,
    pub name: String,
    #[schema(no_recursion)]
    pub subcategories: Vec<CategoryNode>,
}
