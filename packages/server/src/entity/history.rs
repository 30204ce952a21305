use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Portfolio entry: a finished project built around one product.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "history")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    /// Free-form, as entered by editors (e.g. "2023-04" or "April 2023").
    pub start_date: String,
    pub end_date: String,

    pub product_id: i32,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,

    /// Customer the project was delivered to, if recorded.
    pub user_id: Option<i32>,
    #[sea_orm(belongs_to, from = "user_id", to = "id")]
    pub user: BelongsTo<Option<super::user::Entity>>,

    /// Owned rows; no foreign keys, see [`super::product::Model::file_id`].
    pub file_id: Option<i32>,
    pub video_id: Option<i32>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
