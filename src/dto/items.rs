use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{CategoryNode, InvariantViolation, ItemSummary, RecentItem};

#[derive(Debug, Serialize, ToSchema)]
pub struct ItemList {
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecentItemList {
    pub items: Vec<RecentItem>,
}

/// Root categories, each with its nested subcategories.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryTree {
    pub categories: Vec<CategoryNode>,
}

/// Outcome for a payload that matched the item detail shape.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConformanceReport {
    /// `true` when no invariant is broken.
    pub valid: bool,
    pub violations: Vec<InvariantViolation>,
}
