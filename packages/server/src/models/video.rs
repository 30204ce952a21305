use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::video;
use crate::listing::Listing;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct VideoResponse {
    pub video_id: i32,
    pub video_title: String,
    pub embed: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<video::Model> for VideoResponse {
    fn from(v: video::Model) -> Self {
        Self {
            video_id: v.id,
            video_title: v.title,
            embed: v.embed,
            created_at: v.created_at,
            updated_at: v.updated_at,
        }
    }
}

pub const VIDEO_LISTING: Listing<video::Entity> = Listing {
    search: &[video::Column::Title, video::Column::Embed],
    sort: &[
        ("video_title", video::Column::Title),
        ("created_at", video::Column::CreatedAt),
    ],
    tie_breaker: video::Column::Id,
};
