use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{hero, product};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::form::FormData;
use crate::files::BlobChanges;
use crate::models::envelope::{DataEnvelope, FieldErrorEnvelope, MessageEnvelope, message, ok};
use crate::models::gallery::HeroResponse;
use crate::repository;
use crate::state::AppState;

/// Banners shown on the landing page.
const HERO_LIMIT: u64 = 5;

/// Delete every banner row promoting `product_id` and queue their blobs.
pub(crate) async fn purge_heroes<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    changes: &mut BlobChanges,
) -> Result<(), AppError> {
    let banners = hero::Entity::find()
        .filter(hero::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    hero::Entity::delete_many()
        .filter(hero::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    for banner in banners {
        changes.remove_later(banner.path);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/hero",
    tag = "Hero",
    operation_id = "listHeroes",
    summary = "Latest landing-page banners",
    description = "Returns the five most recently added banners, newest first.",
    responses((status = 200, description = "Banners", body = [HeroResponse])),
)]
#[instrument(skip(state))]
pub async fn list_heroes(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<HeroResponse>>>, AppError> {
    let banners = hero::Entity::find()
        .order_by_desc(hero::Column::CreatedAt)
        .order_by_desc(hero::Column::Id)
        .limit(HERO_LIMIT)
        .all(&state.db)
        .await?;
    Ok(ok(banners.into_iter().map(HeroResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/hero",
    tag = "Hero",
    operation_id = "createHero",
    summary = "Add a banner",
    description = "Multipart form with `product_id` and `file`. Requires Admin or SuperAdmin.",
    request_body(content_type = "multipart/form-data", description = "`product_id` and banner `file`"),
    responses(
        (status = 200, description = "Banner stored", body = MessageEnvelope),
        (status = 400, description = "Missing fields", body = FieldErrorEnvelope),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id))]
pub async fn create_hero(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let product_id = form.id("product_id");
    let upload = form.file("file");

    let mut errors = FieldErrors::new();
    errors.require_id("product_id", product_id);
    if upload.is_none() {
        errors.add("file", "The file field is required");
    }
    let (Some(product_id), Some(upload)) = (product_id, upload) else {
        return Err(AppError::InvalidFields(errors));
    };
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    repository::ensure_exists::<product::Entity, _>(&txn, product_id, "Product").await?;
    let blob = state.files.write_blob(upload, &mut changes).await?;
    let now = Utc::now();
    let banner = hero::ActiveModel {
        path: Set(blob.path),
        hero_name: Set(blob.original_name),
        size: Set(blob.size),
        format: Set(blob.format),
        product_id: Set(product_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let banner = repository::create(&txn, banner).await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(hero_id = banner.id, product_id, "Hero created");
    Ok(message("Hero saved successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/hero/{id}",
    tag = "Hero",
    operation_id = "deleteHero",
    summary = "Delete a banner",
    params(("id" = i32, Path, description = "Hero ID")),
    responses(
        (status = 200, description = "Banner deleted", body = MessageEnvelope),
        (status = 404, description = "Banner not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, hero_id = id))]
pub async fn delete_hero(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let banner = repository::find_by_id::<hero::Entity, _>(&txn, id, "Hero").await?;
    repository::delete_by_id::<hero::Entity, _>(&txn, id, "Hero").await?;
    changes.remove_later(banner.path);
    txn.commit().await?;
    state.files.sweep(changes).await;

    Ok(message("Hero deleted successfully"))
}
