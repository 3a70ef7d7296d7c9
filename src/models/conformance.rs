//! Shape conformance and optional invariant checks for [`ItemDetail`].
//!
//! Deserializing into the typed record is the conformance check: a payload
//! that is missing a required field, carries the wrong type, or has `null`
//! where a collection is required is rejected. The record type alone allows
//! some states a catalog never produces (two primary images, repeated size
//! labels); [`ItemDetail::check_invariants`] reports those separately.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::DateTime;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;

use super::item_detail::ItemDetail;

#[derive(Debug, Error)]
pub enum ShapeError {
    /// `path` locates the offending field, e.g. `categories[1].name`; `.` is
    /// the record itself.
    #[error("payload does not match the item detail shape at {path}: {reason}")]
    NonConforming { path: String, reason: String },

    #[error("item detail violates {} invariant(s)", .0.len())]
    Invariants(Vec<InvariantViolation>),
}

const ROOT_PATH: &str = ".";

impl From<serde_path_to_error::Error<serde_json::Error>> for ShapeError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        let path = err.path().to_string();
        let reason = err.into_inner().to_string();
        // A missing field is reported at its parent; point at the field.
        let path = match missing_field(&reason) {
            Some(field) if path == ROOT_PATH => field.to_string(),
            Some(field) => format!("{path}.{field}"),
            None => path,
        };
        ShapeError::NonConforming { path, reason }
    }
}

impl From<serde_json::Error> for ShapeError {
    fn from(err: serde_json::Error) -> Self {
        ShapeError::NonConforming {
            path: ROOT_PATH.to_string(),
            reason: err.to_string(),
        }
    }
}

fn missing_field(reason: &str) -> Option<&str> {
    reason
        .strip_prefix("missing field `")?
        .split('`')
        .next()
        .filter(|field| !field.is_empty())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvariantViolation {
    MultiplePrimaryImages { image_ids: Vec<i64> },
    DuplicateSize { size: String },
    NegativeQuantity { size: String, quantity: i64 },
    DuplicateCategory { category_id: i64 },
    InvalidPrice { price: String },
    InvalidTimestamp { field: String, value: String },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::MultiplePrimaryImages { image_ids } => {
                write!(f, "images {image_ids:?} are all marked primary")
            }
            InvariantViolation::DuplicateSize { size } => {
                write!(f, "size {size:?} is listed more than once")
            }
            InvariantViolation::NegativeQuantity { size, quantity } => {
                write!(f, "size {size:?} has negative quantity {quantity}")
            }
            InvariantViolation::DuplicateCategory { category_id } => {
                write!(f, "category {category_id} is listed more than once")
            }
            InvariantViolation::InvalidPrice { price } => {
                write!(f, "price {price:?} is not a decimal amount")
            }
            InvariantViolation::InvalidTimestamp { field, value } => {
                write!(f, "{field} {value:?} is not an RFC 3339 timestamp")
            }
        }
    }
}

impl ItemDetail {
    pub fn from_json_value(value: Value) -> Result<Self, ShapeError> {
        Ok(serde_path_to_error::deserialize(value)?)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, ShapeError> {
        let mut de = serde_json::Deserializer::from_str(raw);
        let item = serde_path_to_error::deserialize(&mut de)?;
        de.end()?;
        Ok(item)
    }

    pub fn to_json_value(&self) -> Result<Value, ShapeError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Every invariant the record breaks, in field order. Empty when clean.
    pub fn check_invariants(&self) -> Vec<InvariantViolation> {
        let mut violations = Vec::new();

        if Decimal::from_str(&self.price).is_err() {
            violations.push(InvariantViolation::InvalidPrice {
                price: self.price.clone(),
            });
        }

        for (field, value) in [("created_at", &self.created_at), ("updated_at", &self.updated_at)] {
            if DateTime::parse_from_rfc3339(value).is_err() {
                violations.push(InvariantViolation::InvalidTimestamp {
                    field: field.to_string(),
                    value: value.clone(),
                });
            }
        }

        let mut seen_categories = HashSet::new();
        for category in &self.categories {
            if !seen_categories.insert(category.id) {
                violations.push(InvariantViolation::DuplicateCategory {
                    category_id: category.id,
                });
            }
        }

        let mut seen_sizes = HashSet::new();
        for variant in &self.sizes {
            if !seen_sizes.insert(variant.size.as_str()) {
                violations.push(InvariantViolation::DuplicateSize {
                    size: variant.size.clone(),
                });
            }
            if variant.quantity < 0 {
                violations.push(InvariantViolation::NegativeQuantity {
                    size: variant.size.clone(),
                    quantity: variant.quantity,
                });
            }
        }

        let primary_ids: Vec<i64> = self
            .images
            .iter()
            .filter(|image| image.is_primary)
            .map(|image| image.id)
            .collect();
        if primary_ids.len() > 1 {
            violations.push(InvariantViolation::MultiplePrimaryImages {
                image_ids: primary_ids,
            });
        }

        violations
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        let violations = self.check_invariants();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(ShapeError::Invariants(violations))
        }
    }
}
