use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::contract;
use crate::error::FieldErrors;
use crate::listing::Listing;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContractFilter {
    /// Only contracts owned by this user.
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ContractRequest {
    #[serde(default)]
    #[schema(example = "Street lighting, phase 2")]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[schema(value_type = Option<String>, format = Date, example = "2024-01-15")]
    pub start_date: Option<NaiveDate>,
    #[schema(value_type = Option<String>, format = Date, example = "2024-06-30")]
    pub end_date: Option<NaiveDate>,
    pub user_id: Option<i32>,
    /// Products covered by the contract; at least one.
    #[serde(default)]
    pub product_ids: Vec<i32>,
}

impl ContractRequest {
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title);
        errors.require_id("user_id", self.user_id);
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) if end < start => {
                errors.add("end_date", "The end_date must not be before start_date");
            }
            (start, end) => {
                if start.is_none() {
                    errors.add("start_date", "The start_date field is required");
                }
                if end.is_none() {
                    errors.add("end_date", "The end_date field is required");
                }
            }
        }
        if self.product_ids.is_empty() {
            errors.add("product_ids", "At least one product is required");
        }
        errors
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, utoipa::ToSchema)]
pub struct ContractProductName {
    pub id: i32,
    pub name: String,
}

/// A contract with its owner's name and product names resolved.
#[derive(Debug, Clone)]
pub struct ContractView {
    pub contract: contract::Model,
    pub user_name: String,
    pub products: Vec<ContractProductName>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ContractResponse {
    pub contract_id: i32,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, format = Date)]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = Date)]
    pub end_date: NaiveDate,
    pub user_id: i32,
    pub user_name: String,
    pub product_names: Vec<ContractProductName>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContractView> for ContractResponse {
    fn from(v: ContractView) -> Self {
        Self {
            contract_id: v.contract.id,
            title: v.contract.title,
            description: v.contract.description,
            start_date: v.contract.start_date,
            end_date: v.contract.end_date,
            user_id: v.contract.user_id,
            user_name: v.user_name,
            product_names: v.products,
            created_at: v.contract.created_at,
            updated_at: v.contract.updated_at,
        }
    }
}

pub const CONTRACT_LISTING: Listing<contract::Entity> = Listing {
    search: &[contract::Column::Title],
    sort: &[
        ("title", contract::Column::Title),
        ("start_date", contract::Column::StartDate),
        ("end_date", contract::Column::EndDate),
        ("created_at", contract::Column::CreatedAt),
    ],
    tie_breaker: contract::Column::Id,
};
