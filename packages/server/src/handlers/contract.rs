use std::collections::HashMap;

use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use chrono::Utc;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::{contract, contract_product, product, user};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::json::AppJson;
use crate::listing::{DatatableParams, ListQuery, parse_filter_id};
use crate::models::contract::*;
use crate::models::envelope::{
    DataEnvelope, Datatable, FieldErrorEnvelope, MessageEnvelope, message, ok,
};
use crate::repository;
use crate::state::AppState;

async fn contract_views<C: ConnectionTrait>(
    db: &C,
    contracts: Vec<contract::Model>,
) -> Result<Vec<ContractView>, AppError> {
    let users = repository::load_by_ids::<user::Entity, _, _>(
        db,
        user::Column::Id,
        contracts.iter().map(|c| c.user_id),
        |u| u.id,
    )
    .await?;

    let links = if contracts.is_empty() {
        Vec::new()
    } else {
        contract_product::Entity::find()
            .filter(contract_product::Column::ContractId.is_in(contracts.iter().map(|c| c.id)))
            .all(db)
            .await?
    };
    let products = repository::load_by_ids::<product::Entity, _, _>(
        db,
        product::Column::Id,
        links.iter().map(|l| l.product_id),
        |p| p.id,
    )
    .await?;

    let mut names: HashMap<i32, Vec<ContractProductName>> = HashMap::new();
    for link in links {
        if let Some(p) = products.get(&link.product_id) {
            names
                .entry(link.contract_id)
                .or_default()
                .push(ContractProductName {
                    id: p.id,
                    name: p.title.clone(),
                });
        }
    }

    Ok(contracts
        .into_iter()
        .map(|contract| {
            let mut products = names.remove(&contract.id).unwrap_or_default();
            products.sort_by_key(|p| p.id);
            ContractView {
                user_name: users
                    .get(&contract.user_id)
                    .map(|u| u.full_name.clone())
                    .unwrap_or_default(),
                products,
                contract,
            }
        })
        .collect())
}

/// Check that the owner and every product exist before anything is written.
async fn check_references<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
    product_ids: &[i32],
) -> Result<(), AppError> {
    repository::ensure_exists::<user::Entity, _>(db, user_id, "User").await?;
    let missing =
        repository::missing_ids::<product::Entity, _>(db, product::Column::Id, product_ids, |p| {
            p.id
        })
        .await?;
    if missing.is_empty() {
        return Ok(());
    }
    let mut errors = FieldErrors::new();
    for id in missing {
        errors.add("product_ids", format!("Product {id} does not exist"));
    }
    Err(AppError::InvalidFields(errors))
}

async fn link_products<C: ConnectionTrait>(
    db: &C,
    contract_id: i32,
    product_ids: &[i32],
) -> Result<(), AppError> {
    contract_product::Entity::delete_many()
        .filter(contract_product::Column::ContractId.eq(contract_id))
        .exec(db)
        .await?;

    let mut ids = product_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    contract_product::Entity::insert_many(ids.into_iter().map(|product_id| {
        contract_product::ActiveModel {
            contract_id: Set(contract_id),
            product_id: Set(product_id),
        }
    }))
    .exec(db)
    .await?;
    Ok(())
}

#[utoipa::path(
    get,
    path = "/api/contract/all",
    tag = "Contracts",
    operation_id = "listContracts",
    summary = "List every contract",
    params(DatatableParams),
    responses(
        (status = 200, description = "Contracts", body = [ContractResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, params))]
pub async fn list_contracts(
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<ContractResponse>>>, AppError> {
    let contracts = ListQuery::from_params(&params)
        .fetch_all(&state.db, contract::Entity::find(), &CONTRACT_LISTING)
        .await?;
    let views = contract_views(&state.db, contracts).await?;
    Ok(ok(views.into_iter().map(ContractResponse::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/contract/count",
    tag = "Contracts",
    operation_id = "countContracts",
    summary = "Count contracts",
    responses((status = 200, description = "Number of contracts", body = u64)),
)]
#[instrument(skip(state))]
pub async fn count_contracts(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<u64>>, AppError> {
    Ok(ok(
        repository::count::<contract::Entity, _>(&state.db, Condition::all()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/contract/datatable",
    tag = "Contracts",
    operation_id = "contractDatatable",
    summary = "Search, sort and page through contracts",
    description = "Searches contract titles. Sortable by `title`, `start_date`, `end_date`, `created_at`. Optional `user_id` filter.",
    params(DatatableParams, ContractFilter),
    responses(
        (status = 200, description = "Paginated contracts", body = [ContractResponse]),
        (status = 400, description = "Unknown sort column or malformed filter", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, uri, params, filter))]
pub async fn contract_datatable(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DatatableParams>,
    Query(filter): Query<ContractFilter>,
) -> Result<Json<DataEnvelope<Datatable<ContractResponse>>>, AppError> {
    let user_id = parse_filter_id("user_id", filter.user_id.as_deref())?;
    let mut page = ListQuery::from_params(&params)
        .filter_eq(contract::Column::UserId, user_id)
        .fetch(&state.db, contract::Entity::find(), &CONTRACT_LISTING)
        .await?;
    let views = contract_views(&state.db, std::mem::take(&mut page.items)).await?;

    Ok(ok(Datatable::from_page(
        page.with_items(views),
        &uri,
        ContractResponse::from,
    )))
}

#[utoipa::path(
    get,
    path = "/api/contract/{id}",
    tag = "Contracts",
    operation_id = "getContract",
    summary = "Get a contract",
    params(("id" = i32, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract", body = ContractResponse),
        (status = 404, description = "Contract not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state), fields(contract_id = id))]
pub async fn get_contract(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DataEnvelope<ContractResponse>>, AppError> {
    let contract = repository::find_by_id::<contract::Entity, _>(&state.db, id, "Contract").await?;
    let view = contract_views(&state.db, vec![contract])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("Contract not found".into()))?;
    Ok(ok(ContractResponse::from(view)))
}

#[utoipa::path(
    post,
    path = "/api/contract",
    tag = "Contracts",
    operation_id = "createContract",
    summary = "Create a contract",
    description = "Creates the contract and its product links in one transaction. Requires Admin or SuperAdmin.",
    request_body = ContractRequest,
    responses(
        (status = 200, description = "Contract saved", body = MessageEnvelope),
        (status = 400, description = "Missing fields or unknown products", body = FieldErrorEnvelope),
        (status = 404, description = "User not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id))]
pub async fn create_contract(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<ContractRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let errors = payload.validate();
    let (Some(user_id), Some(start_date), Some(end_date)) =
        (payload.user_id, payload.start_date, payload.end_date)
    else {
        return Err(AppError::InvalidFields(errors));
    };
    errors.into_result()?;

    let txn = state.db.begin().await?;
    check_references(&txn, user_id, &payload.product_ids).await?;

    let now = Utc::now();
    let contract = repository::create(
        &txn,
        contract::ActiveModel {
            title: Set(payload.title.trim().to_string()),
            description: Set(payload.description),
            start_date: Set(start_date),
            end_date: Set(end_date),
            user_id: Set(user_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        },
    )
    .await?;
    link_products(&txn, contract.id, &payload.product_ids).await?;
    txn.commit().await?;

    info!(contract_id = contract.id, "Contract created");
    Ok(message("Contract saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/contract/{id}",
    tag = "Contracts",
    operation_id = "updateContract",
    summary = "Update a contract",
    description = "Overwrites every field and replaces the product links. Requires Admin or SuperAdmin.",
    params(("id" = i32, Path, description = "Contract ID")),
    request_body = ContractRequest,
    responses(
        (status = 200, description = "Contract updated", body = MessageEnvelope),
        (status = 400, description = "Missing fields or unknown products", body = FieldErrorEnvelope),
        (status = 404, description = "Contract or user not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, payload), fields(admin_id = admin.user_id, contract_id = id))]
pub async fn update_contract(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    AppJson(payload): AppJson<ContractRequest>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let errors = payload.validate();
    let (Some(user_id), Some(start_date), Some(end_date)) =
        (payload.user_id, payload.start_date, payload.end_date)
    else {
        return Err(AppError::InvalidFields(errors));
    };
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut contract = repository::find_by_id::<contract::Entity, _>(&txn, id, "Contract")
        .await?
        .into_active_model();
    check_references(&txn, user_id, &payload.product_ids).await?;

    contract.title = Set(payload.title.trim().to_string());
    contract.description = Set(payload.description);
    contract.start_date = Set(start_date);
    contract.end_date = Set(end_date);
    contract.user_id = Set(user_id);
    contract.updated_at = Set(Utc::now());
    repository::update(&txn, contract).await?;
    link_products(&txn, id, &payload.product_ids).await?;
    txn.commit().await?;

    Ok(message("Contract updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/contract/{id}",
    tag = "Contracts",
    operation_id = "deleteContract",
    summary = "Delete a contract",
    params(("id" = i32, Path, description = "Contract ID")),
    responses(
        (status = 200, description = "Contract deleted", body = MessageEnvelope),
        (status = 404, description = "Contract not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin), fields(admin_id = admin.user_id, contract_id = id))]
pub async fn delete_contract(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let txn = state.db.begin().await?;
    repository::ensure_exists::<contract::Entity, _>(&txn, id, "Contract").await?;
    contract_product::Entity::delete_many()
        .filter(contract_product::Column::ContractId.eq(id))
        .exec(&txn)
        .await?;
    repository::delete_by_id::<contract::Entity, _>(&txn, id, "Contract").await?;
    txn.commit().await?;

    info!("Contract deleted");
    Ok(message("Contract deleted successfully"))
}
