use serde::Serialize;

/// Record counts shown on the admin dashboard.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct DashboardResponse {
    pub product_count: u64,
    pub user_count: u64,
    pub contract_count: u64,
    pub history_count: u64,
    pub category_count: u64,
}
