mod api;

use axum::Router;

use crate::config::AppConfig;
use crate::state::AppState;

pub fn api_routes(config: &AppConfig) -> Router<AppState> {
    api::routes(config)
}
