use serde::Serialize;

use crate::entity::{gallery, hero};

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct GalleryResponse {
    pub gallery_id: i32,
    #[schema(example = "/public/0b6f3c1e-5d2a-4c1b-9a57-1f0e2d3c4b5a.jpg")]
    pub path: String,
    pub gallery_name: String,
    pub size: i64,
    pub format: String,
    pub product_id: i32,
}

impl From<gallery::Model> for GalleryResponse {
    fn from(g: gallery::Model) -> Self {
        Self {
            gallery_id: g.id,
            path: g.path,
            gallery_name: g.gallery_name,
            size: g.size,
            format: g.format,
            product_id: g.product_id,
        }
    }
}

/// Landing-page banner.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HeroResponse {
    pub hero_id: i32,
    pub path: String,
    pub product_id: i32,
}

impl From<hero::Model> for HeroResponse {
    fn from(h: hero::Model) -> Self {
        Self {
            hero_id: h.id,
            path: h.path,
            product_id: h.product_id,
        }
    }
}
