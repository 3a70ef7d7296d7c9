use std::str::FromStr;

use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};

pub const DEFAULT_PAGE_SIZE: i64 = 12;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let page_size = self
            .page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        // Pages past the end come back empty.
        let offset = (page - 1).saturating_mul(page_size);
        (page, page_size, offset)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// `desc` (the default) sorts descending; any other value sorts ascending.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw.unwrap_or("desc") {
            "desc" => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemSortBy {
    CreatedAt,
    Price,
    Name,
}

impl ItemSortBy {
    /// Unknown fields fall back to `created_at`.
    pub fn from_param(raw: Option<&str>) -> Self {
        match raw {
            Some("price") => ItemSortBy::Price,
            Some("name") => ItemSortBy::Name,
            _ => ItemSortBy::CreatedAt,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ItemQuery {
    pub page: Option<i64>,
    /// Default 12, at most 100.
    pub page_size: Option<i64>,
    /// Category id; only items linked to exactly this category are returned.
    pub category: Option<String>,
    /// Case-insensitive match against name or description.
    pub search: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    /// `created_at`, `price` or `name`.
    pub sort: Option<String>,
    /// `desc` or `asc`.
    pub order: Option<String>,
}

/// Filters parsed out of an [`ItemQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct ItemFilter {
    pub category_id: Option<i32>,
    pub search: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub sort_by: ItemSortBy,
    pub sort_order: SortOrder,
}

impl ItemQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            page_size: self.page_size,
        }
    }

    pub fn filter(&self) -> AppResult<ItemFilter> {
        let category_id = match non_empty(&self.category) {
            Some(raw) => Some(raw.parse::<i32>().map_err(|_| {
                AppError::BadRequest(format!("category must be an integer id, got {raw:?}"))
            })?),
            None => None,
        };

        Ok(ItemFilter {
            category_id,
            search: non_empty(&self.search).map(str::to_string),
            min_price: parse_price("min_price", &self.min_price)?,
            max_price: parse_price("max_price", &self.max_price)?,
            sort_by: ItemSortBy::from_param(self.sort.as_deref()),
            sort_order: SortOrder::from_param(self.order.as_deref()),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RecentQuery {
    /// Number of items, default 8, at most 50.
    pub limit: Option<u64>,
}

impl RecentQuery {
    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(8).clamp(1, 50)
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_price(field: &str, raw: &Option<String>) -> AppResult<Option<Decimal>> {
    match non_empty(raw) {
        Some(value) => Decimal::from_str(value)
            .map(Some)
            .map_err(|_| AppError::BadRequest(format!("{field} must be a decimal amount"))),
        None => Ok(None),
    }
}
