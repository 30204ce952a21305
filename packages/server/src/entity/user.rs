use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Stored as its name; any other value fails to load.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    utoipa::ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Role {
    #[sea_orm(string_value = "Admin")]
    Admin,
    #[sea_orm(string_value = "Customer")]
    Customer,
    #[sea_orm(string_value = "SuperAdmin")]
    SuperAdmin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin | Role::SuperAdmin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Customer => "Customer",
            Role::SuperAdmin => "SuperAdmin",
        }
    }

    /// Parse a role name exactly as stored.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Admin" => Some(Role::Admin),
            "Customer" => Some(Role::Customer),
            "SuperAdmin" => Some(Role::SuperAdmin),
            _ => None,
        }
    }
}

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub full_name: String,
    pub username: String,
    pub phone_number: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string.
    pub password: String,
    pub address: Option<String>,
    pub role: Role,

    /// Owned avatar [`super::file`] row.
    pub file_id: Option<i32>,

    #[sea_orm(has_many)]
    pub contracts: HasMany<super::contract::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
