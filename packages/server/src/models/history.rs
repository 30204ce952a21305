use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::history;
use crate::listing::Listing;

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryFilter {
    /// Only portfolio entries for this product.
    pub product_id: Option<String>,
}

/// A portfolio entry with every rendered relation resolved to scalars.
#[derive(Debug, Clone)]
pub struct HistoryView {
    pub history: history::Model,
    pub product_name: String,
    pub category_name: String,
    pub path_file: String,
    pub video_title: String,
    pub embed: String,
    pub user_name: String,
    pub user_path_file: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HistoryResponse {
    pub history_id: i32,
    pub title: String,
    pub description: String,
    pub start_date: String,
    pub end_date: String,
    /// Product name.
    pub product: String,
    /// Category name of the product.
    pub category: String,
    pub path_file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HistoryView> for HistoryResponse {
    fn from(v: HistoryView) -> Self {
        Self {
            history_id: v.history.id,
            title: v.history.title,
            description: v.history.description,
            start_date: v.history.start_date,
            end_date: v.history.end_date,
            product: v.product_name,
            category: v.category_name,
            path_file: v.path_file,
            created_at: v.history.created_at,
            updated_at: v.history.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HistoryDatatableItem {
    pub history_id: i32,
    pub title: String,
    pub description: String,
    pub product_id: i32,
    pub product_name: String,
    pub start_date: String,
    pub end_date: String,
    pub embed: String,
    pub video_title: String,
    pub user_id: Option<i32>,
    /// Full name of the customer.
    pub user: String,
    pub category_name: String,
    pub file_id: Option<i32>,
    pub path_file: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<HistoryView> for HistoryDatatableItem {
    fn from(v: HistoryView) -> Self {
        Self {
            history_id: v.history.id,
            title: v.history.title,
            description: v.history.description,
            product_id: v.history.product_id,
            product_name: v.product_name,
            start_date: v.history.start_date,
            end_date: v.history.end_date,
            embed: v.embed,
            video_title: v.video_title,
            user_id: v.history.user_id,
            user: v.user_name,
            category_name: v.category_name,
            file_id: v.history.file_id,
            path_file: v.path_file,
            created_at: v.history.created_at,
            updated_at: v.history.updated_at,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PortfolioUser {
    pub full_name: String,
    pub path_file_user: String,
}

/// Card on the public portfolio page.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct PortfolioCard {
    pub history_id: i32,
    pub title: String,
    pub path_file: String,
    pub user: PortfolioUser,
}

impl From<HistoryView> for PortfolioCard {
    fn from(v: HistoryView) -> Self {
        Self {
            history_id: v.history.id,
            title: v.history.title,
            path_file: v.path_file,
            user: PortfolioUser {
                full_name: v.user_name,
                path_file_user: v.user_path_file,
            },
        }
    }
}

pub const HISTORY_LISTING: Listing<history::Entity> = Listing {
    search: &[history::Column::Title, history::Column::Description],
    sort: &[
        ("title", history::Column::Title),
        ("start_date", history::Column::StartDate),
        ("created_at", history::Column::CreatedAt),
    ],
    tie_breaker: history::Column::Id,
};
