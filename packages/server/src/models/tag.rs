use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::tag;
use crate::error::FieldErrors;
use crate::listing::Listing;
use crate::models::shared::LabelOption;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct TagRequest {
    #[serde(default)]
    #[schema(example = "Outdoor")]
    pub tag: String,
}

impl TagRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("tag", &self.tag);
        errors
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TagResponse {
    pub tag_id: i32,
    pub tag: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<tag::Model> for TagResponse {
    fn from(t: tag::Model) -> Self {
        Self {
            tag_id: t.id,
            tag: t.tag,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

impl From<tag::Model> for LabelOption {
    fn from(t: tag::Model) -> Self {
        Self {
            value: t.id,
            label: t.tag,
        }
    }
}

pub const TAG_LISTING: Listing<tag::Entity> = Listing {
    search: &[tag::Column::Tag],
    sort: &[
        ("tag", tag::Column::Tag),
        ("created_at", tag::Column::CreatedAt),
    ],
    tie_breaker: tag::Column::Id,
};
