use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::product;
use crate::listing::Listing;
use crate::models::shared::LabelOption;

/// Datatable filter for products.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProductFilter {
    /// Only products in this category.
    pub category_id: Option<String>,
}

/// A product with its category label and file path resolved.
///
/// Every product response is rendered from this one shape, so list and
/// single-item endpoints always flatten relations the same way.
#[derive(Debug, Clone)]
pub struct ProductView {
    pub product: product::Model,
    pub category: String,
    pub path_file: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductResponse {
    pub product_id: i32,
    #[schema(example = "LED Panel")]
    pub title: String,
    pub specification: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_id: Option<i32>,
    pub category_id: i32,
    #[schema(example = "/public/0b6f3c1e-5d2a-4c1b-9a57-1f0e2d3c4b5a.png")]
    pub path_file: String,
    #[schema(example = "Lighting")]
    pub category: String,
}

impl From<ProductView> for ProductResponse {
    fn from(v: ProductView) -> Self {
        Self {
            product_id: v.product.id,
            title: v.product.title,
            specification: v.product.specification,
            description: v.product.description,
            created_at: v.product.created_at,
            updated_at: v.product.updated_at,
            file_id: v.product.file_id,
            category_id: v.product.category_id,
            path_file: v.path_file,
            category: v.category,
        }
    }
}

/// Datatable row; identical to [`ProductResponse`] except the title is sent as `name`.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ProductDatatableItem {
    pub product_id: i32,
    pub name: String,
    pub description: String,
    pub specification: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub file_id: Option<i32>,
    pub category_id: i32,
    pub path_file: String,
    pub category: String,
}

impl From<ProductView> for ProductDatatableItem {
    fn from(v: ProductView) -> Self {
        let r = ProductResponse::from(v);
        Self {
            product_id: r.product_id,
            name: r.title,
            description: r.description,
            specification: r.specification,
            created_at: r.created_at,
            updated_at: r.updated_at,
            file_id: r.file_id,
            category_id: r.category_id,
            path_file: r.path_file,
            category: r.category,
        }
    }
}

impl From<product::Model> for LabelOption {
    fn from(p: product::Model) -> Self {
        Self {
            value: p.id,
            label: p.title,
        }
    }
}

pub const PRODUCT_LISTING: Listing<product::Entity> = Listing {
    search: &[product::Column::Title],
    sort: &[
        ("title", product::Column::Title),
        ("name", product::Column::Title),
        ("created_at", product::Column::CreatedAt),
        ("updated_at", product::Column::UpdatedAt),
    ],
    tie_breaker: product::Column::Id,
};
