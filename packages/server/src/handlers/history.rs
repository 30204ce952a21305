use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{category, file, history, product, user, video};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::form::FormData;
use crate::files::BlobChanges;
use crate::listing::{DatatableParams, ListQuery, parse_filter_id};
use crate::models::envelope::{
    DataEnvelope, Datatable, FieldErrorEnvelope, MessageEnvelope, message, ok,
};
use crate::models::history::*;
use crate::repository;
use crate::state::AppState;

/// Resolve product, category, owner, file and video for a batch of entries.
async fn history_views<C: ConnectionTrait>(
    db: &C,
    histories: Vec<history::Model>,
) -> Result<Vec<HistoryView>, AppError> {
    let products = repository::load_by_ids::<product::Entity, _, _>(
        db,
        product::Column::Id,
        histories.iter().map(|h| h.product_id),
        |p| p.id,
    )
    .await?;
    let categories = repository::load_by_ids::<category::Entity, _, _>(
        db,
        category::Column::Id,
        products.values().map(|p| p.category_id),
        |c| c.id,
    )
    .await?;
    let users = repository::load_by_ids::<user::Entity, _, _>(
        db,
        user::Column::Id,
        histories.iter().filter_map(|h| h.user_id),
        |u| u.id,
    )
    .await?;
    let videos = repository::load_by_ids::<video::Entity, _, _>(
        db,
        video::Column::Id,
        histories.iter().filter_map(|h| h.video_id),
        |v| v.id,
    )
    .await?;
    let files = repository::load_by_ids::<file::Entity, _, _>(
        db,
        file::Column::Id,
        histories
            .iter()
            .filter_map(|h| h.file_id)
            .chain(users.values().filter_map(|u| u.file_id)),
        |f| f.id,
    )
    .await?;

    let path_of = |id: Option<i32>| {
        id.and_then(|id| files.get(&id))
            .map(|f| f.path.clone())
            .unwrap_or_default()
    };

    Ok(histories
        .into_iter()
        .map(|history| {
            let product = products.get(&history.product_id);
            let owner = history.user_id.and_then(|id| users.get(&id));
            let video = history.video_id.and_then(|id| videos.get(&id));
            HistoryView {
                product_name: product.map(|p| p.title.clone()).unwrap_or_default(),
                category_name: product
                    .and_then(|p| categories.get(&p.category_id))
                    .map(|c| c.category.clone())
                    .unwrap_or_default(),
                path_file: path_of(history.file_id),
                video_title: video.map(|v| v.title.clone()).unwrap_or_default(),
                embed: video.map(|v| v.embed.clone()).unwrap_or_default(),
                user_name: owner.map(|u| u.full_name.clone()).unwrap_or_default(),
                user_path_file: path_of(owner.and_then(|u| u.file_id)),
                history,
            }
        })
        .collect())
}

/// Optional customer reference from the form; sent but malformed is an error.
fn optional_user_id(form: &FormData, errors: &mut FieldErrors) -> Option<i32> {
    form.optional("user_id")?;
    let parsed = form.id("user_id");
    errors.require_id("user_id", parsed);
    parsed
}

#[utoipa::path(
    get,
    path = "/api/history/all",
    tag = "History",
    operation_id = "listHistories",
    summary = "List every portfolio entry",
    params(DatatableParams),
    responses(
        (status = 200, description = "Portfolio entries", body = [HistoryResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_histories(
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<HistoryResponse>>>, AppError> {
    let histories = ListQuery::from_params(&params)
        .fetch_all(&state.db, history::Entity::find(), &HISTORY_LISTING)
        .await?;
    let views = history_views(&state.db, histories).await?;
    Ok(ok(views.into_iter().map(HistoryResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/history/count",
    tag = "History",
    operation_id = "countHistories",
    summary = "Count portfolio entries",
    responses((status = 200, description = "Number of entries", body = u64)),
)]
#[instrument(skip(state))]
pub async fn count_histories(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<u64>>, AppError> {
    Ok(ok(
        repository::count::<history::Entity, _>(&state.db, Condition::all()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/history/datatable",
    tag = "History",
    operation_id = "historyDatatable",
    summary = "Search, sort and page through portfolio entries",
    description = "Searches title and description. Sortable by `title`, `start_date`, `created_at`. Optional `product_id` filter.",
    params(DatatableParams, HistoryFilter),
    responses(
        (status = 200, description = "Paginated entries", body = [HistoryDatatableItem]),
        (status = 400, description = "Unknown sort column or malformed filter", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, uri, params, filter))]
pub async fn history_datatable(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DatatableParams>,
    Query(filter): Query<HistoryFilter>,
) -> Result<Json<DataEnvelope<Datatable<HistoryDatatableItem>>>, AppError> {
    let product_id = parse_filter_id("product_id", filter.product_id.as_deref())?;
    let mut page = ListQuery::from_params(&params)
        .filter_eq(history::Column::ProductId, product_id)
        .fetch(&state.db, history::Entity::find(), &HISTORY_LISTING)
        .await?;
    let views = history_views(&state.db, std::mem::take(&mut page.items)).await?;

    Ok(ok(Datatable::from_page(
        page.with_items(views),
        &uri,
        HistoryDatatableItem::from,
    )))
}

#[utoipa::path(
    get,
    path = "/api/history/user",
    tag = "History",
    operation_id = "portfolioCards",
    summary = "Portfolio cards with customer details",
    responses((status = 200, description = "Cards", body = [PortfolioCard])),
)]
#[instrument(skip(state))]
pub async fn portfolio_cards(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<PortfolioCard>>>, AppError> {
    let histories = history::Entity::find()
        .order_by_asc(history::Column::Id)
        .all(&state.db)
        .await?;
    let views = history_views(&state.db, histories).await?;
    Ok(ok(views.into_iter().map(PortfolioCard::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/history/{id}",
    tag = "History",
    operation_id = "getHistory",
    summary = "Get a portfolio entry",
    params(("id" = i32, Path, description = "History ID")),
    responses(
        (status = 200, description = "Portfolio entry", body = HistoryDatatableItem),
        (status = 404, description = "Entry not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state), fields(history_id = id))]
pub async fn get_history(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DataEnvelope<HistoryDatatableItem>>, AppError> {
    let history = repository::find_by_id::<history::Entity, _>(&state.db, id, "History").await?;
    let view = history_views(&state.db, vec![history])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("History not found".into()))?;
    Ok(ok(HistoryDatatableItem::from(view)))
}

#[utoipa::path(
    get,
    path = "/api/history/product/{id}",
    tag = "History",
    operation_id = "historiesByProduct",
    summary = "Portfolio entries built around a product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Portfolio entries", body = [HistoryDatatableItem]),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state), fields(product_id = id))]
pub async fn histories_by_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DataEnvelope<Vec<HistoryDatatableItem>>>, AppError> {
    repository::ensure_exists::<product::Entity, _>(&state.db, id, "Product").await?;
    let histories = history::Entity::find()
        .filter(history::Column::ProductId.eq(id))
        .order_by_asc(history::Column::Id)
        .all(&state.db)
        .await?;
    let views = history_views(&state.db, histories).await?;
    Ok(ok(views.into_iter().map(HistoryDatatableItem::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/history",
    tag = "History",
    operation_id = "createHistory",
    summary = "Create a portfolio entry",
    description = "Multipart form: `title`, `description`, `start_date`, `end_date`, `product_id`, optional `user_id`, optional `video_title`/`embed`, required `file`. A video is created when a title or embed is sent. Requires Admin or SuperAdmin.",
    request_body(content_type = "multipart/form-data", description = "Entry fields, cover file and optional video"),
    responses(
        (status = 200, description = "Entry saved", body = MessageEnvelope),
        (status = 400, description = "Missing fields", body = FieldErrorEnvelope),
        (status = 404, description = "Product or user not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id))]
pub async fn create_history(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let title = form.text("title");
    let description = form.text("description");
    let product_id = form.id("product_id");
    let upload = form.file("file");

    let mut errors = FieldErrors::new();
    errors.require("title", &title);
    errors.require("description", &description);
    errors.require_id("product_id", product_id);
    let user_id = optional_user_id(&form, &mut errors);
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
    if let Some(user_id) = user_id {
        repository::ensure_exists::<user::Entity, _>(&txn, user_id, "User").await?;
    }

    let now = Utc::now();
    let video_title = form.text("video_title");
    let embed = form.text("embed");
    let video_id = if video_title.is_empty() && embed.is_empty() {
        None
    } else {
        let video = repository::create(
            &txn,
            video::ActiveModel {
                title: Set(video_title),
                embed: Set(embed),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            },
        )
        .await?;
        Some(video.id)
    };

    let mut history = history::ActiveModel {
        title: Set(title),
        description: Set(description),
        start_date: Set(form.text("start_date")),
        end_date: Set(form.text("end_date")),
        product_id: Set(product_id),
        user_id: Set(user_id),
        file_id: Set(None),
        video_id: Set(video_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    state.files.attach(&txn, &mut history, upload, &mut changes).await?;
    let history = repository::create(&txn, history).await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(history_id = history.id, ?video_id, "History created");
    Ok(message("History saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/history/{id}",
    tag = "History",
    operation_id = "updateHistory",
    summary = "Update a portfolio entry",
    description = "Multipart form; every field is optional. A new `file` replaces the current one. `video_title`/`embed` update the linked video, or create one when the entry has none. Requires Admin or SuperAdmin.",
    params(("id" = i32, Path, description = "History ID")),
    request_body(content_type = "multipart/form-data", description = "Changed entry fields"),
    responses(
        (status = 200, description = "Entry updated", body = MessageEnvelope),
        (status = 400, description = "Malformed fields", body = FieldErrorEnvelope),
        (status = 404, description = "Entry, product or user not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id, history_id = id))]
pub async fn update_history(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let mut errors = FieldErrors::new();
    let product_id = match form.optional("product_id") {
        Some(_) => {
            let parsed = form.id("product_id");
            errors.require_id("product_id", parsed);
            parsed
        }
        None => None,
    };
    let user_id = optional_user_id(&form, &mut errors);
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let current = repository::find_by_id::<history::Entity, _>(&txn, id, "History").await?;
    let video_id = current.video_id;
    let mut history = current.into_active_model();
    let now = Utc::now();

    for (field, column) in [
        ("title", &mut history.title),
        ("description", &mut history.description),
        ("start_date", &mut history.start_date),
        ("end_date", &mut history.end_date),
    ] {
        if let Some(value) = form.optional(field) {
            *column = Set(value);
        }
    }
    if let Some(product_id) = product_id {
        repository::ensure_exists::<product::Entity, _>(&txn, product_id, "Product").await?;
        history.product_id = Set(product_id);
    }
    if let Some(user_id) = user_id {
        repository::ensure_exists::<user::Entity, _>(&txn, user_id, "User").await?;
        history.user_id = Set(Some(user_id));
    }

    let video_title = form.optional("video_title");
    let embed = form.optional("embed");
    if video_title.is_some() || embed.is_some() {
        let existing = match video_id {
            Some(video_id) => video::Entity::find_by_id(video_id).one(&txn).await?,
            None => None,
        };
        match existing {
            Some(found) => {
                let mut video = found.into_active_model();
                if let Some(title) = video_title {
                    video.title = Set(title);
                }
                if let Some(embed) = embed {
                    video.embed = Set(embed);
                }
                video.updated_at = Set(now);
                repository::update(&txn, video).await?;
            }
            None => {
                let video = repository::create(
                    &txn,
                    video::ActiveModel {
                        title: Set(video_title.unwrap_or_default()),
                        embed: Set(embed.unwrap_or_default()),
                        created_at: Set(now),
                        updated_at: Set(now),
                        ..Default::default()
                    },
                )
                .await?;
                history.video_id = Set(Some(video.id));
            }
        }
    }

    if let Some(upload) = form.file("file") {
        state.files.attach(&txn, &mut history, upload, &mut changes).await?;
    }
    history.updated_at = Set(now);
    repository::update(&txn, history).await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!("History updated");
    Ok(message("History updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/history/{id}",
    tag = "History",
    operation_id = "deleteHistory",
    summary = "Delete a portfolio entry",
    description = "Deletes the entry together with its video and cover file.",
    params(("id" = i32, Path, description = "History ID")),
    responses(
        (status = 200, description = "Entry deleted", body = MessageEnvelope),
        (status = 404, description = "Entry not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, history_id = id))]
pub async fn delete_history(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let history = repository::find_by_id::<history::Entity, _>(&txn, id, "History").await?;
    let video_id = history.video_id;

    let mut owner = history.into_active_model();
    state.files.release(&txn, &mut owner, &mut changes).await?;
    repository::delete_by_id::<history::Entity, _>(&txn, id, "History").await?;
    if let Some(video_id) = video_id {
        video::Entity::delete_by_id(video_id).exec(&txn).await?;
    }
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!("History deleted");
    Ok(message("History deleted successfully"))
}
