use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::category;
use crate::error::FieldErrors;
use crate::listing::Listing;
use crate::models::shared::LabelOption;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CategoryRequest {
    #[serde(default)]
    #[schema(example = "Lighting")]
    pub category: String,
    /// Replaces the category's tag set.
    #[serde(default)]
    #[schema(example = json!([1, 2]))]
    pub tag_ids: Vec<i32>,
}

impl CategoryRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("category", &self.category);
        errors
    }
}

#[derive(Debug, Serialize, PartialEq, utoipa::ToSchema)]
pub struct CategoryTag {
    pub tag_id: i32,
    pub tag: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CategoryResponse {
    pub category_id: i32,
    pub category: String,
    pub tags: Vec<CategoryTag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CategoryResponse {
    pub fn new(c: category::Model, tags: Vec<CategoryTag>) -> Self {
        Self {
            category_id: c.id,
            category: c.category,
            tags,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

impl From<category::Model> for LabelOption {
    fn from(c: category::Model) -> Self {
        Self {
            value: c.id,
            label: c.category,
        }
    }
}

pub const CATEGORY_LISTING: Listing<category::Entity> = Listing {
    search: &[category::Column::Category],
    sort: &[
        ("category", category::Column::Category),
        ("created_at", category::Column::CreatedAt),
    ],
    tie_breaker: category::Column::Id,
};
