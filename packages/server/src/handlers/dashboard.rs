use axum::Json;
use axum::extract::State;
use sea_orm::Condition;
use tracing::instrument;

use crate::entity::{category, contract, history, product, user};
use crate::error::AppError;
use crate::models::dashboard::DashboardResponse;
use crate::models::envelope::{DataEnvelope, ok};
use crate::repository::count;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/dashboard",
    tag = "Dashboard",
    operation_id = "dashboard",
    summary = "Record counts for the admin dashboard",
    responses((status = 200, description = "Counts", body = DashboardResponse)),
)]
#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<DashboardResponse>>, AppError> {
    let db = &state.db;
    Ok(ok(DashboardResponse {
        product_count: count::<product::Entity, _>(db, Condition::all()).await?,
        user_count: count::<user::Entity, _>(db, Condition::all()).await?,
        contract_count: count::<contract::Entity, _>(db, Condition::all()).await?,
        history_count: count::<history::Entity, _>(db, Condition::all()).await?,
        category_count: count::<category::Entity, _>(db, Condition::all()).await?,
    }))
}
