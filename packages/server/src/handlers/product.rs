use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{category, contract_product, file, history, product};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::form::FormData;
use crate::files::BlobChanges;
use crate::handlers::{gallery, hero};
use crate::listing::{DatatableParams, ListQuery, parse_filter_id};
use crate::models::envelope::{
    DataEnvelope, Datatable, FieldErrorEnvelope, MessageEnvelope, message, ok,
};
use crate::models::product::*;
use crate::models::shared::{IdQuery, LabelOption};
use crate::repository;
use crate::state::AppState;

/// Resolve category labels and file paths for a batch of products.
pub(crate) async fn product_views<C: ConnectionTrait>(
    db: &C,
    products: Vec<product::Model>,
) -> Result<Vec<ProductView>, AppError> {
    let categories = repository::load_by_ids::<category::Entity, _, _>(
        db,
        category::Column::Id,
        products.iter().map(|p| p.category_id),
        |c| c.id,
    )
    .await?;
    let files = repository::load_by_ids::<file::Entity, _, _>(
        db,
        file::Column::Id,
        products.iter().filter_map(|p| p.file_id),
        |f| f.id,
    )
    .await?;

    Ok(products
        .into_iter()
        .map(|product| ProductView {
            category: categories
                .get(&product.category_id)
                .map(|c| c.category.clone())
                .unwrap_or_default(),
            path_file: product
                .file_id
                .and_then(|id| files.get(&id))
                .map(|f| f.path.clone())
                .unwrap_or_default(),
            product,
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/product/all",
    tag = "Products",
    operation_id = "listProducts",
    summary = "List every product",
    description = "Returns all products in the `data` envelope. Accepts the datatable `search`, `sort` and `sort_by` parameters; pagination parameters are ignored.",
    params(DatatableParams),
    responses(
        (status = 200, description = "Products", body = [ProductResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<ProductResponse>>>, AppError> {
    let products = ListQuery::from_params(&params)
        .fetch_all(&state.db, product::Entity::find(), &PRODUCT_LISTING)
        .await?;
    let views = product_views(&state.db, products).await?;
    Ok(ok(views.into_iter().map(ProductResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/product/count",
    tag = "Products",
    operation_id = "countProducts",
    summary = "Count products",
    responses((status = 200, description = "Number of products", body = u64)),
)]
#[instrument(skip(state))]
pub async fn count_products(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<u64>>, AppError> {
    Ok(ok(
        repository::count::<product::Entity, _>(&state.db, Condition::all()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/product/datatable",
    tag = "Products",
    operation_id = "productDatatable",
    summary = "Search, sort and page through products",
    description = "Searches product titles. Sortable by `title` (alias `name`), `created_at`, `updated_at`. Optional `category_id` filter.",
    params(DatatableParams, ProductFilter),
    responses(
        (status = 200, description = "Paginated products; rows carry the title as `name`", body = [ProductDatatableItem]),
        (status = 400, description = "Unknown sort column or malformed filter", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, uri, params, filter))]
pub async fn product_datatable(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DatatableParams>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<DataEnvelope<Datatable<ProductDatatableItem>>>, AppError> {
    let category_id = parse_filter_id("category_id", filter.category_id.as_deref())?;
    let query =
        ListQuery::from_params(&params).filter_eq(product::Column::CategoryId, category_id);

    let mut page = query
        .fetch(&state.db, product::Entity::find(), &PRODUCT_LISTING)
        .await?;
    let views = product_views(&state.db, std::mem::take(&mut page.items)).await?;

    Ok(ok(Datatable::from_page(
        page.with_items(views),
        &uri,
        ProductDatatableItem::from,
    )))
}

#[utoipa::path(
    get,
    path = "/api/product/label",
    tag = "Products",
    operation_id = "productLabels",
    summary = "Products as select options",
    responses((status = 200, description = "`{value, label}` pairs", body = [LabelOption])),
)]
#[instrument(skip(state))]
pub async fn product_labels(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<LabelOption>>>, AppError> {
    let products = product::Entity::find()
        .order_by_asc(product::Column::Title)
        .all(&state.db)
        .await?;
    Ok(ok(products.into_iter().map(LabelOption::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/product/{id}",
    tag = "Products",
    operation_id = "getProduct",
    summary = "Get a product",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state), fields(product_id = id))]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DataEnvelope<ProductResponse>>, AppError> {
    let product = repository::find_by_id::<product::Entity, _>(&state.db, id, "Product").await?;
    let view = product_views(&state.db, vec![product])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Product not found".into()))?;
    Ok(ok(ProductResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/product",
    tag = "Products",
    operation_id = "createProduct",
    summary = "Create a product",
    description = "Multipart form: `title` (or `name`), `description`, `specification`, `category_id`, `file` (required) and any number of `gallery[]` images. Requires Admin or SuperAdmin.",
    request_body(content_type = "multipart/form-data", description = "Product fields, cover file and gallery images"),
    responses(
        (status = 200, description = "Product saved", body = MessageEnvelope),
        (status = 400, description = "Missing fields", body = FieldErrorEnvelope),
        (status = 401, description = "Unauthorized", body = MessageEnvelope),
        (status = 403, description = "Forbidden", body = MessageEnvelope),
        (status = 404, description = "Category not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id))]
pub async fn create_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let title = form.text_any(&["title", "name"]);
    let category_id = form.id("category_id");
    let upload = form.file("file");
    let gallery_uploads = form.files("gallery");

    let mut errors = FieldErrors::new();
    errors.require("title", &title);
    errors.require_id("category_id", category_id);
    if upload.is_none() {
        errors.add("file", "The file field is required");
    }
    if gallery_uploads.len() > state.config.storage.max_gallery_files {
        errors.add(
            "gallery",
            format!(
                "At most {} gallery images are allowed",
                state.config.storage.max_gallery_files
            ),
        );
    }
    let (Some(category_id), Some(upload)) = (category_id, upload) else {
        return Err(AppError::InvalidFields(errors));
    };
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    repository::ensure_exists::<category::Entity, _>(&txn, category_id, "Category").await?;

    let now = Utc::now();
    let mut product = product::ActiveModel {
        title: Set(title),
        description: Set(form.text("description")),
        specification: Set(form.text("specification")),
        category_id: Set(category_id),
        file_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    state.files.attach(&txn, &mut product, upload, &mut changes).await?;
    let product = repository::create(&txn, product).await?;
    gallery::store_gallery(&state.files, &txn, product.id, gallery_uploads, &mut changes).await?;

    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(
        product_id = product.id,
        gallery = gallery_uploads.len(),
        "Product created"
    );
    Ok(message("Product saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/product/{id}",
    tag = "Products",
    operation_id = "updateProduct",
    summary = "Update a product",
    description = "Multipart form; every field is optional. A new `file` replaces the current one and deletes the old blob. Requires Admin or SuperAdmin.",
    params(("id" = i32, Path, description = "Product ID")),
    request_body(content_type = "multipart/form-data", description = "Changed product fields and optional new cover file"),
    responses(
        (status = 200, description = "Product updated", body = MessageEnvelope),
        (status = 400, description = "Malformed fields", body = FieldErrorEnvelope),
        (status = 404, description = "Product or category not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id, product_id = id))]
pub async fn update_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let mut errors = FieldErrors::new();
    let category_id = match form.optional("category_id") {
        Some(_) => {
            let parsed = form.id("category_id");
            errors.require_id("category_id", parsed);
            parsed
        }
        None => None,
    };
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let mut product = repository::find_by_id::<product::Entity, _>(&txn, id, "Product")
        .await?
        .into_active_model();

    let title = form.text_any(&["title", "name"]);
    if !title.is_empty() {
        product.title = Set(title);
    }
    if let Some(description) = form.optional("description") {
        product.description = Set(description);
    }
    if let Some(specification) = form.optional("specification") {
        product.specification = Set(specification);
    }
    if let Some(category_id) = category_id {
        repository::ensure_exists::<category::Entity, _>(&txn, category_id, "Category").await?;
        product.category_id = Set(category_id);
    }
    if let Some(upload) = form.file("file") {
        state.files.attach(&txn, &mut product, upload, &mut changes).await?;
    }
    product.updated_at = Set(Utc::now());
    repository::update(&txn, product).await?;

    txn.commit().await?;
    state.files.sweep(changes).await;

    info!("Product updated");
    Ok(message("Product updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/product",
    tag = "Products",
    operation_id = "deleteProduct",
    summary = "Delete a product",
    description = "Deletes the product with its gallery, hero banners, contract links and file. Products still used by portfolio entries are refused. Requires Admin or SuperAdmin.",
    params(IdQuery),
    responses(
        (status = 200, description = "Product deleted", body = MessageEnvelope),
        (status = 400, description = "Missing id or product still in use", body = MessageEnvelope),
        (status = 404, description = "Product not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin_id = admin.user_id))]
pub async fn delete_product(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let id = query.require()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let product = repository::find_by_id::<product::Entity, _>(&txn, id, "Product").await?;

    let histories = history::Entity::find()
        .filter(history::Column::ProductId.eq(id))
        .count(&txn)
        .await?;
    if histories > 0 {
        return Err(AppError::Validation(format!(
            "Product is still used by {histories} portfolio entries"
        )));
    }

    contract_product::Entity::delete_many()
        .filter(contract_product::Column::ProductId.eq(id))
        .exec(&txn)
        .await?;
    gallery::purge_gallery(&txn, id, &mut changes).await?;
    hero::purge_heroes(&txn, id, &mut changes).await?;
    state
        .files
        .release(&txn, &mut product.into_active_model(), &mut changes)
        .await?;
    repository::delete_by_id::<product::Entity, _>(&txn, id, "Product").await?;

    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(product_id = id, "Product deleted");
    Ok(message("Product deleted successfully"))
}
