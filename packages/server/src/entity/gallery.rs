use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A product image. Carries its own blob metadata instead of pointing at a
/// [`super::file`] row.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "gallery")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub path: String,
    pub gallery_name: String,
    pub size: i64,
    pub format: String,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
