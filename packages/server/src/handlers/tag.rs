use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{category_tag, tag};
use crate::error::AppError;
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::models::envelope::{DataEnvelope, FieldErrorEnvelope, MessageEnvelope, message, ok};
use crate::models::shared::LabelOption;
use crate::models::tag::{TagRequest, TagResponse};
use crate::repository;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/api/tag",
    tag = "Tags",
    operation_id = "listTags",
    summary = "List every tag",
    responses((status = 200, description = "Tags ordered by name", body = [TagResponse])),
)]
#[instrument(skip(state))]
pub async fn list_tags(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<TagResponse>>>, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Tag)
        .order_by_asc(tag::Column::Id)
        .all(&state.db)
        .await?;
    Ok(ok(tags.into_iter().map(TagResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/tag/label",
    tag = "Tags",
    operation_id = "tagLabels",
    summary = "Tags as select options",
    responses((status = 200, description = "`{value, label}` pairs", body = [LabelOption])),
)]
#[instrument(skip(state))]
pub async fn tag_labels(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<LabelOption>>>, AppError> {
    let tags = tag::Entity::find()
        .order_by_asc(tag::Column::Tag)
        .all(&state.db)
        .await?;
    Ok(ok(tags.into_iter().map(LabelOption::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/tag",
    tag = "Tags",
    operation_id = "createTag",
    summary = "Create a tag",
    request_body = TagRequest,
    responses(
        (status = 200, description = "Tag saved", body = MessageEnvelope),
        (status = 400, description = "Missing tag", body = FieldErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id))]
pub async fn create_tag(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    payload.validate().into_result()?;

    let now = Utc::now();
    let tag = repository::create(
        &state.db,
        tag::ActiveModel {
            tag: Set(payload.tag.trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        },
    )
    .await?;

    info!(tag_id = tag.id, "Tag created");
    Ok(message("Tag saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/tag/{id}",
    tag = "Tags",
    operation_id = "updateTag",
    summary = "Rename a tag",
    params(("id" = i32, Path, description = "Tag ID")),
    request_body = TagRequest,
    responses(
        (status = 200, description = "Tag updated", body = MessageEnvelope),
        (status = 400, description = "Missing tag", body = FieldErrorEnvelope),
        (status = 404, description = "Tag not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id, tag_id = id))]
pub async fn update_tag(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<TagRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    payload.validate().into_result()?;

    let mut tag = repository::find_by_id::<tag::Entity, _>(&state.db, id, "Tag")
        .await?
        .into_active_model();
    tag.tag = Set(payload.tag.trim().to_string());
    tag.updated_at = Set(Utc::now());
    repository::update(&state.db, tag).await?;

    Ok(message("Tag updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/tag/{id}",
    tag = "Tags",
    operation_id = "deleteTag",
    summary = "Delete a tag",
    description = "Also detaches the tag from every category.",
    params(("id" = i32, Path, description = "Tag ID")),
    responses(
        (status = 200, description = "Tag deleted", body = MessageEnvelope),
        (status = 404, description = "Tag not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, tag_id = id))]
pub async fn delete_tag(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    repository::ensure_exists::<tag::Entity, _>(&txn, id, "Tag").await?;
    category_tag::Entity::delete_many()
        .filter(category_tag::Column::TagId.eq(id))
        .exec(&txn)
        .await?;
    repository::delete_by_id::<tag::Entity, _>(&txn, id, "Tag").await?;
    txn.commit().await?;

    info!("Tag deleted");
    Ok(message("Tag deleted successfully"))
}
