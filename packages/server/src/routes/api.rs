use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::config::{AppConfig, StorageConfig};
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> Router<AppState> {
    let storage = &config.storage;
    Router::new()
        .route("/dashboard", get(handlers::dashboard::dashboard))
        .nest("/auth", auth_routes())
        .nest("/user", user_routes(storage))
        .nest("/product", product_routes(storage))
        .nest("/category", category_routes())
        .nest("/tag", tag_routes())
        .nest("/contract", contract_routes())
        .nest("/history", history_routes(storage))
        .nest("/video", video_routes())
        .nest("/gallery", gallery_routes(storage))
        .nest("/hero", hero_routes(storage))
}

fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .route("/register", post(handlers::auth::register))
        .route("/profile", get(handlers::auth::profile))
}

fn user_routes(storage: &StorageConfig) -> Router<AppState> {
    let reads = Router::new()
        .route("/all", get(handlers::user::list_users))
        .route("/count", get(handlers::user::count_users))
        .route("/datatable", get(handlers::user::user_datatable))
        .route("/label", get(handlers::user::user_labels))
        .route(
            "/",
            get(handlers::user::get_user).delete(handlers::user::delete_user),
        );

    let uploads = Router::new()
        .route("/", post(handlers::user::create_user))
        .route("/{id}", put(handlers::user::update_user))
        .layer(handlers::single_upload_limit(storage));

    reads.merge(uploads)
}

fn product_routes(storage: &StorageConfig) -> Router<AppState> {
    let reads = Router::new()
        .route("/all", get(handlers::product::list_products))
        .route("/count", get(handlers::product::count_products))
        .route("/datatable", get(handlers::product::product_datatable))
        .route("/label", get(handlers::product::product_labels))
        .route("/{id}", get(handlers::product::get_product))
        .route("/", delete(handlers::product::delete_product));

    let uploads = Router::new()
        .route("/", post(handlers::product::create_product))
        .route("/{id}", put(handlers::product::update_product))
        .layer(handlers::gallery_upload_limit(storage));

    reads.merge(uploads)
}

fn category_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(handlers::category::list_categories))
        .route("/label", get(handlers::category::category_labels))
        .route("/count", get(handlers::category::count_categories))
        .route("/", post(handlers::category::create_category))
        .route(
            "/{id}",
            get(handlers::category::get_category)
                .put(handlers::category::update_category)
                .delete(handlers::category::delete_category),
        )
}

fn tag_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::tag::list_tags).post(handlers::tag::create_tag),
        )
        .route("/label", get(handlers::tag::tag_labels))
        .route(
            "/{id}",
            put(handlers::tag::update_tag).delete(handlers::tag::delete_tag),
        )
}

fn contract_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(handlers::contract::list_contracts))
        .route("/count", get(handlers::contract::count_contracts))
        .route("/datatable", get(handlers::contract::contract_datatable))
        .route("/", post(handlers::contract::create_contract))
        .route(
            "/{id}",
            get(handlers::contract::get_contract)
                .put(handlers::contract::update_contract)
                .delete(handlers::contract::delete_contract),
        )
}

fn history_routes(storage: &StorageConfig) -> Router<AppState> {
    let reads = Router::new()
        .route("/all", get(handlers::history::list_histories))
        .route("/count", get(handlers::history::count_histories))
        .route("/datatable", get(handlers::history::history_datatable))
        .route("/user", get(handlers::history::portfolio_cards))
        .route("/product/{id}", get(handlers::history::histories_by_product))
        .route(
            "/{id}",
            get(handlers::history::get_history).delete(handlers::history::delete_history),
        );

    let uploads = Router::new()
        .route("/", post(handlers::history::create_history))
        .route("/{id}", put(handlers::history::update_history))
        .layer(handlers::single_upload_limit(storage));

    reads.merge(uploads)
}

fn video_routes() -> Router<AppState> {
    Router::new()
        .route("/all", get(handlers::video::list_videos))
        .route("/datatable", get(handlers::video::video_datatable))
}

fn gallery_routes(storage: &StorageConfig) -> Router<AppState> {
    Router::new()
        .route("/{product_id}", get(handlers::gallery::list_gallery))
        .route("/item/{id}", delete(handlers::gallery::delete_gallery_item))
        .merge(
            Router::new()
                .route("/{product_id}", post(handlers::gallery::add_gallery))
                .layer(handlers::gallery_upload_limit(storage)),
        )
}

fn hero_routes(storage: &StorageConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::hero::list_heroes))
        .route("/{id}", delete(handlers::hero::delete_hero))
        .merge(
            Router::new()
                .route("/", post(handlers::hero::create_hero))
                .layer(handlers::single_upload_limit(storage)),
        )
}
