use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Metadata for one uploaded blob in the public directory.
///
/// Owned by exactly one product, user or history row through its `file_id`.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Public URL path, e.g. `/public/<uuid>.png`.
    #[sea_orm(unique)]
    pub path: String,
    /// Name the client uploaded the file under.
    pub file_name: String,
    /// Size in bytes.
    pub size: i64,
    /// Original extension including the dot; empty when there was none.
    pub format: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
