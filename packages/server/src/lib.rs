pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod files;
pub mod handlers;
pub mod listing;
pub mod models;
pub mod repository;
pub mod routes;
pub mod seed;
pub mod state;
pub mod utils;

#[cfg(test)]
mod testing;

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::http::{HeaderValue, Method, header};
use axum::routing::get;
use common::storage::filesystem::FilesystemPublicStore;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::ServeDir;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::config::{AppConfig, CorsConfig};
use crate::files::FileStore;
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Matahari Business Profile API",
        version = "1.0.0",
        description = "Products, portfolio entries, contracts and customers of a business profile site"
    ),
    paths(
        handlers::dashboard::dashboard,
        handlers::auth::login,
        handlers::auth::register,
        handlers::auth::profile,
        handlers::user::list_users,
        handlers::user::count_users,
        handlers::user::user_datatable,
        handlers::user::user_labels,
        handlers::user::get_user,
        handlers::user::create_user,
        handlers::user::update_user,
        handlers::user::delete_user,
        handlers::product::list_products,
        handlers::product::count_products,
        handlers::product::product_datatable,
        handlers::product::product_labels,
        handlers::product::get_product,
        handlers::product::create_product,
        handlers::product::update_product,
        handlers::product::delete_product,
        handlers::category::list_categories,
        handlers::category::category_labels,
        handlers::category::count_categories,
        handlers::category::get_category,
        handlers::category::create_category,
        handlers::category::update_category,
        handlers::category::delete_category,
        handlers::tag::list_tags,
        handlers::tag::tag_labels,
        handlers::tag::create_tag,
        handlers::tag::update_tag,
        handlers::tag::delete_tag,
        handlers::contract::list_contracts,
        handlers::contract::count_contracts,
        handlers::contract::contract_datatable,
        handlers::contract::get_contract,
        handlers::contract::create_contract,
        handlers::contract::update_contract,
        handlers::contract::delete_contract,
        handlers::history::list_histories,
        handlers::history::count_histories,
        handlers::history::history_datatable,
        handlers::history::portfolio_cards,
        handlers::history::get_history,
        handlers::history::histories_by_product,
        handlers::history::create_history,
        handlers::history::update_history,
        handlers::history::delete_history,
        handlers::video::list_videos,
        handlers::video::video_datatable,
        handlers::gallery::list_gallery,
        handlers::gallery::add_gallery,
        handlers::gallery::delete_gallery_item,
        handlers::hero::list_heroes,
        handlers::hero::create_hero,
        handlers::hero::delete_hero,
    ),
    tags(
        (name = "Dashboard", description = "Record counts"),
        (name = "Auth", description = "Login, registration and profile"),
        (name = "Users", description = "Customer and administrator accounts"),
        (name = "Products", description = "Products with cover image and gallery"),
        (name = "Categories", description = "Product categories and their tags"),
        (name = "Tags", description = "Category tags"),
        (name = "Contracts", description = "Customer contracts covering products"),
        (name = "History", description = "Portfolio entries"),
        (name = "Videos", description = "Videos attached to portfolio entries"),
        (name = "Gallery", description = "Product gallery images"),
        (name = "Hero", description = "Landing-page banners"),
    ),
    modifiers(&SecurityAddon),
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_default();
        components.add_security_scheme(
            "jwt",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// Open the public directory and wrap it in a [`FileStore`].
pub async fn build_file_store(config: &AppConfig) -> anyhow::Result<FileStore> {
    let blobs = FilesystemPublicStore::new(
        config.storage.public_dir.clone().into(),
        config.storage.max_upload_size,
    )
    .await?;
    Ok(FileStore::new(Arc::new(blobs), &config.storage.url_prefix))
}

fn cors_layer(cors: &CorsConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cors
        .allow_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    let allow_origin = if cors.allow_origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .max_age(Duration::from_secs(cors.max_age))
}

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let public = ServeDir::new(&state.config.storage.public_dir);
    let public_prefix = state.config.storage.url_prefix.trim_end_matches('/').to_string();
    let cors = cors_layer(&state.config.server.cors);

    axum::Router::new()
        .nest("/api", routes::api_routes(&state.config))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        .with_state(state)
        .nest_service(&public_prefix, public)
        .layer(cors)
}
