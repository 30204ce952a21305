use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{category, category_tag, product, tag};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::listing::{DatatableParams, ListQuery};
use crate::models::category::*;
use crate::models::envelope::{DataEnvelope, FieldErrorEnvelope, MessageEnvelope, message, ok};
use crate::models::shared::LabelOption;
use crate::repository;
use crate::state::AppState;

/// Tags of each category, keyed by category id and ordered by tag name.
async fn tags_by_category<C: ConnectionTrait>(
    db: &C,
    category_ids: &[i32],
) -> Result<HashMap<i32, Vec<CategoryTag>>, AppError> {
    if category_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let links = category_tag::Entity::find()
        .filter(category_tag::Column::CategoryId.is_in(category_ids.iter().copied()))
        .all(db)
        .await?;
    let tags = repository::load_by_ids::<tag::Entity, _, _>(
        db,
        tag::Column::Id,
        links.iter().map(|l| l.tag_id),
        |t| t.id,
    )
    .await?;

    let mut grouped: HashMap<i32, Vec<CategoryTag>> = HashMap::new();
    for link in links {
        if let Some(t) = tags.get(&link.tag_id) {
            grouped.entry(link.category_id).or_default().push(CategoryTag {
                tag_id: t.id,
                tag: t.tag.clone(),
            });
        }
    }
    for list in grouped.values_mut() {
        list.sort_by(|a, b| a.tag.cmp(&b.tag).then(a.tag_id.cmp(&b.tag_id)));
    }
    Ok(grouped)
}

/// Point `category_id` at exactly `tag_ids`. Unknown tags are field errors.
async fn replace_tags<C: ConnectionTrait>(
    db: &C,
    category_id: i32,
    tag_ids: &[i32],
) -> Result<(), AppError> {
    let missing = repository::missing_ids::<tag::Entity, _>(db, tag::Column::Id, tag_ids, |t| t.id)
        .await?;
    if !missing.is_empty() {
        let mut errors = FieldErrors::new();
        for id in missing {
            errors.add("tag_ids", format!("Tag {id} does not exist"));
        }
        return Err(AppError::InvalidFields(errors));
    }

    category_tag::Entity::delete_many()
        .filter(category_tag::Column::CategoryId.eq(category_id))
        .exec(db)
        .await?;

    let mut ids = tag_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    if ids.is_empty() {
        return Ok(());
    }
    category_tag::Entity::insert_many(ids.into_iter().map(|tag_id| category_tag::ActiveModel {
        category_id: Set(category_id),
        tag_id: Set(tag_id),
    }))
    .exec(db)
    .await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/category/all",
    tag = "Categories",
    operation_id = "listCategories",
    summary = "List every category with its tags",
    params(DatatableParams),
    responses(
        (status = 200, description = "Categories", body = [CategoryResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_categories(
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<CategoryResponse>>>, AppError> {
    let categories = ListQuery::from_params(&params)
        .fetch_all(&state.db, category::Entity::find(), &CATEGORY_LISTING)
        .await?;
    let ids: Vec<i32> = categories.iter().map(|c| c.id).collect();
    let mut tags = tags_by_category(&state.db, &ids).await?;

    Ok(ok(categories
        .into_iter()
        .map(|c| {
            let own = tags.remove(&c.id).unwrap_or_default();
            CategoryResponse::new(c, own)
        })
        .collect()))
}

#[utoipa::path(
    get,
    path = "/api/category/label",
    tag = "Categories",
    operation_id = "categoryLabels",
    summary = "Categories as select options",
    responses((status = 200, description = "`{value, label}` pairs", body = [LabelOption])),
)]
#[instrument(skip(state))]
pub async fn category_labels(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<LabelOption>>>, AppError> {
    let categories = category::Entity::find()
        .order_by_asc(category::Column::Category)
        .all(&state.db)
        .await?;
    Ok(ok(categories.into_iter().map(LabelOption::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/category/count",
    tag = "Categories",
    operation_id = "countCategories",
    summary = "Count categories",
    responses((status = 200, description = "Number of categories", body = u64)),
)]
#[instrument(skip(state))]
pub async fn count_categories(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<u64>>, AppError> {
    Ok(ok(
        repository::count::<category::Entity, _>(&state.db, Condition::all()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "getCategory",
    summary = "Get a category",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category with tags", body = CategoryResponse),
        (status = 404, description = "Category not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state), fields(category_id = id))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DataEnvelope<CategoryResponse>>, AppError> {
    let category = repository::find_by_id::<category::Entity, _>(&state.db, id, "Category").await?;
    let tags = tags_by_category(&state.db, &[id])
        .await?
        .remove(&id)
        .unwrap_or_default();
    Ok(ok(CategoryResponse::new(category, tags)))
}

#[utoipa::path(
    post,
    path = "/api/category",
    tag = "Categories",
    operation_id = "createCategory",
    summary = "Create a category",
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category saved", body = MessageEnvelope),
        (status = 400, description = "Missing category or unknown tags", body = FieldErrorEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id))]
pub async fn create_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    payload.validate().into_result()?;

    let txn = state.db.begin().await?;
    let now = Utc::now();
    let category = repository::create(
        &txn,
        category::ActiveModel {
            category: Set(payload.category.trim().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        },
    )
    .await?;
    replace_tags(&txn, category.id, &payload.tag_ids).await?;
    txn.commit().await?;

    info!(category_id = category.id, "Category created");
    Ok(message("Category saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "updateCategory",
    summary = "Update a category",
    description = "Renames the category and replaces its tag set with `tag_ids`.",
    params(("id" = i32, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = MessageEnvelope),
        (status = 400, description = "Missing category or unknown tags", body = FieldErrorEnvelope),
        (status = 404, description = "Category not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id, category_id = id))]
pub async fn update_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<CategoryRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    payload.validate().into_result()?;

    let txn = state.db.begin().await?;
    let mut category = repository::find_by_id::<category::Entity, _>(&txn, id, "Category")
        .await?
        .into_active_model();
    category.category = Set(payload.category.trim().to_string());
    category.updated_at = Set(Utc::now());
    repository::update(&txn, category).await?;
    replace_tags(&txn, id, &payload.tag_ids).await?;
    txn.commit().await?;

    Ok(message("Category updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/category/{id}",
    tag = "Categories",
    operation_id = "deleteCategory",
    summary = "Delete a category",
    description = "Refused while any product still belongs to the category.",
    params(("id" = i32, Path, description = "Category ID")),
    responses(
        (status = 200, description = "Category deleted", body = MessageEnvelope),
        (status = 400, description = "Category still in use", body = MessageEnvelope),
        (status = 404, description = "Category not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, category_id = id))]
pub async fn delete_category(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    repository::ensure_exists::<category::Entity, _>(&txn, id, "Category").await?;

    let products = repository::count::<product::Entity, _>(
        &txn,
        Condition::all().add(product::Column::CategoryId.eq(id)),
    )
    .await?;
    if products > 0 {
        return Err(AppError::Validation(format!(
            "Category is still used by {products} products"
        )));
    }

    category_tag::Entity::delete_many()
        .filter(category_tag::Column::CategoryId.eq(id))
        .exec(&txn)
        .await?;
    repository::delete_by_id::<category::Entity, _>(&txn, id, "Category").await?;
    txn.commit().await?;

    info!("Category deleted");
    Ok(message("Category deleted successfully"))
}
