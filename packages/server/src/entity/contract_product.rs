use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contract_product")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub contract_id: i32,
    #[sea_orm(primary_key)]
    pub product_id: i32,
    #[sea_orm(belongs_to, from = "contract_id", to = "id")]
    pub contract: HasOne<super::contract::Entity>,
    #[sea_orm(belongs_to, from = "product_id", to = "id")]
    pub product: HasOne<super::product::Entity>,
}

impl ActiveModelBehavior for ActiveModel {}
