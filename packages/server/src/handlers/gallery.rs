use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{gallery, product};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::form::FormData;
use crate::files::{BlobChanges, FileStore, Upload};
use crate::models::envelope::{DataEnvelope, FieldErrorEnvelope, MessageEnvelope, message, ok};
use crate::models::gallery::GalleryResponse;
use crate::repository;
use crate::state::AppState;

/// Write each upload as a gallery image of `product_id`.
pub(crate) async fn store_gallery<C: ConnectionTrait>(
    files: &FileStore,
    db: &C,
    product_id: i32,
    uploads: &[Upload],
    changes: &mut BlobChanges,
) -> Result<Vec<gallery::Model>, AppError> {
    let mut stored = Vec::with_capacity(uploads.len());
    for upload in uploads {
        let blob = files.write_blob(upload, changes).await?;
        let now = Utc::now();
        let row = gallery::ActiveModel {
            path: Set(blob.path),
            gallery_name: Set(blob.original_name),
            size: Set(blob.size),
            format: Set(blob.format),
            product_id: Set(product_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        stored.push(repository::create(db, row).await?);
    }
    Ok(stored)
}

/// Delete every gallery image row of `product_id` and queue their blobs.
pub(crate) async fn purge_gallery<C: ConnectionTrait>(
    db: &C,
    product_id: i32,
    changes: &mut BlobChanges,
) -> Result<(), AppError> {
    let images = gallery::Entity::find()
        .filter(gallery::Column::ProductId.eq(product_id))
        .all(db)
        .await?;
    gallery::Entity::delete_many()
        .filter(gallery::Column::ProductId.eq(product_id))
        .exec(db)
        .await?;
    for image in images {
        changes.remove_later(image.path);
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/gallery/{product_id}",
    tag = "Gallery",
    operation_id = "listGallery",
    summary = "Gallery images of a product",
    params(("product_id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Images in upload order", body = [GalleryResponse]),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state))]
pub async fn list_gallery(
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
) -> Result<Json<DataEnvelope<Vec<GalleryResponse>>>, AppError> {
    repository::ensure_exists::<product::Entity, _>(&state.db, product_id, "Product").await?;
    let images = gallery::Entity::find()
        .filter(gallery::Column::ProductId.eq(product_id))
        .order_by_asc(gallery::Column::Id)
        .all(&state.db)
        .await?;
    Ok(ok(images.into_iter().map(GalleryResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/gallery/{product_id}",
    tag = "Gallery",
    operation_id = "addGallery",
    summary = "Append gallery images to a product",
    description = "Multipart form with one or more `gallery[]` files. Requires Admin or SuperAdmin.",
    params(("product_id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Repeated `gallery[]` files"),
    responses(
        (status = 200, description = "Images stored", body = MessageEnvelope),
        (status = 400, description = "No files sent", body = FieldErrorEnvelope),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id))]
pub async fn add_gallery(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(product_id): Path<i32>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let uploads = form.files("gallery");
    let mut errors = FieldErrors::new();
    if uploads.is_empty() {
        errors.add("gallery", "The gallery field is required");
    }
    let limit = state.config.storage.max_gallery_files;
    if uploads.len() > limit {
        errors.add("gallery", format!("At most {limit} gallery images are allowed"));
    }
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    repository::ensure_exists::<product::Entity, _>(&txn, product_id, "Product").await?;
    let stored = store_gallery(&state.files, &txn, product_id, uploads, &mut changes).await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(count = stored.len(), "Gallery images added");
    Ok(message("Gallery saved successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/gallery/item/{id}",
    tag = "Gallery",
    operation_id = "deleteGalleryItem",
    summary = "Delete one gallery image",
    params(("id" = i32, Path, description = "Gallery image ID")),
    responses(
        (status = 200, description = "Image deleted", body = MessageEnvelope),
        (status = 404, description = "Image not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, gallery_id = id))]
pub async fn delete_gallery_item(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let image = repository::find_by_id::<gallery::Entity, _>(&txn, id, "Gallery image").await?;
    repository::delete_by_id::<gallery::Entity, _>(&txn, id, "Gallery image").await?;
    changes.remove_later(image.path);
    txn.commit().await?;
    state.files.sweep(changes).await;

    Ok(message("Gallery image deleted successfully"))
}
