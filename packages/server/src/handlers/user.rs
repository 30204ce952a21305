use axum::Json;
use axum::extract::{OriginalUri, Path, Query, State};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use tracing::{info, instrument};

use crate::entity::user::{self, Role};
use crate::entity::{contract, file, history};
use crate::error::{AppError, FieldErrors};
use crate::extractors::auth::AdminUser;
use crate::extractors::form::FormData;
use crate::files::{BlobChanges, FileStore, Upload};
use crate::listing::{DatatableParams, ListQuery};
use crate::models::envelope::{
    DataEnvelope, Datatable, FieldErrorEnvelope, MessageEnvelope, message, ok,
};
use crate::models::shared::{IdQuery, LabelOption};
use crate::models::user::*;
use crate::repository;
use crate::state::AppState;
use crate::utils::hash;

pub(crate) async fn user_responses<C: ConnectionTrait>(
    db: &C,
    users: Vec<user::Model>,
) -> Result<Vec<UserResponse>, AppError> {
    let files = repository::load_by_ids::<file::Entity, _, _>(
        db,
        file::Column::Id,
        users.iter().filter_map(|u| u.file_id),
        |f| f.id,
    )
    .await?;
    Ok(users
        .into_iter()
        .map(|u| {
            let path = u
                .file_id
                .and_then(|id| files.get(&id))
                .map(|f| f.path.clone())
                .unwrap_or_default();
            UserResponse::new(u, path)
        })
        .collect())
}

fn email_taken(e: AppError) -> AppError {
    match e {
        AppError::Conflict(_) => AppError::Conflict("Email is already registered".into()),
        other => other,
    }
}

/// Hash the password and insert a user, storing `avatar` when given.
pub(crate) async fn insert_user<C: ConnectionTrait>(
    db: &C,
    files: &FileStore,
    fields: UserFields,
    role: Role,
    avatar: Option<&Upload>,
    changes: &mut BlobChanges,
) -> Result<user::Model, AppError> {
    let password = hash::hash_password(&fields.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;

    let now = Utc::now();
    let mut user = user::ActiveModel {
        full_name: Set(fields.full_name),
        username: Set(fields.username),
        phone_number: Set(fields.phone_number),
        email: Set(fields.email),
        password: Set(password),
        address: Set(fields.address),
        role: Set(role),
        file_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    if let Some(avatar) = avatar {
        files.attach(db, &mut user, avatar, changes).await?;
    }
    repository::create(db, user).await.map_err(email_taken)
}

fn form_fields(form: &FormData) -> UserFields {
    UserFields {
        full_name: form.text("full_name"),
        username: form.text("username"),
        phone_number: form.text("phone_number"),
        email: form.text("email"),
        password: form.raw("password"),
        address: form.optional("address"),
    }
}

#[utoipa::path(
    get,
    path = "/api/user/all",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List every user",
    description = "Requires Admin or SuperAdmin.",
    params(DatatableParams),
    responses(
        (status = 200, description = "Users", body = [UserResponse]),
        (status = 401, description = "Unauthorized", body = MessageEnvelope),
        (status = 403, description = "Forbidden", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, params), fields(admin_id = admin.user_id))]
pub async fn list_users(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Vec<UserResponse>>>, AppError> {
    let users = ListQuery::from_params(&params)
        .fetch_all(&state.db, user::Entity::find(), &USER_LISTING)
        .await?;
    Ok(ok(user_responses(&state.db, users).await?))
}

#[utoipa::path(
    get,
    path = "/api/user/count",
    tag = "Users",
    operation_id = "countUsers",
    summary = "Count users",
    responses((status = 200, description = "Number of users", body = u64)),
)]
#[instrument(skip(state))]
pub async fn count_users(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<u64>>, AppError> {
    Ok(ok(
        repository::count::<user::Entity, _>(&state.db, Condition::all()).await?,
    ))
}

#[utoipa::path(
    get,
    path = "/api/user/datatable",
    tag = "Users",
    operation_id = "userDatatable",
    summary = "Search, sort and page through users",
    description = "Searches full name, username and email. Sortable by `full_name`, `username`, `email`, `role`, `created_at`.",
    params(DatatableParams),
    responses(
        (status = 200, description = "Paginated users", body = [UserResponse]),
        (status = 400, description = "Unknown sort column", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, uri, params))]
pub async fn user_datatable(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Query(params): Query<DatatableParams>,
) -> Result<Json<DataEnvelope<Datatable<UserResponse>>>, AppError> {
    let mut page = ListQuery::from_params(&params)
        .fetch(&state.db, user::Entity::find(), &USER_LISTING)
        .await?;
    let users = user_responses(&state.db, std::mem::take(&mut page.items)).await?;
    Ok(ok(Datatable::from_page(
        page.with_items(users),
        &uri,
        std::convert::identity,
    )))
}

#[utoipa::path(
    get,
    path = "/api/user/label",
    tag = "Users",
    operation_id = "userLabels",
    summary = "Users as select options",
    responses((status = 200, description = "`{value, label}` pairs", body = [LabelOption])),
)]
#[instrument(skip(state))]
pub async fn user_labels(
    State(state): State<AppState>,
) -> Result<Json<DataEnvelope<Vec<LabelOption>>>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::FullName)
        .all(&state.db)
        .await?;
    Ok(ok(users.into_iter().map(LabelOption::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/user",
    tag = "Users",
    operation_id = "getUser",
    summary = "Get a user",
    params(IdQuery),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 400, description = "Missing id", body = MessageEnvelope),
        (status = 404, description = "User not found", body = MessageEnvelope),
    ),
)]
#[instrument(skip(state, query))]
pub async fn get_user(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<DataEnvelope<UserResponse>>, AppError> {
    let id = query.require()?;
    let user = repository::find_by_id::<user::Entity, _>(&state.db, id, "User").await?;
    let response = user_responses(&state.db, vec![user])
        .await?
        .pop()
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    Ok(ok(response))
}

#[utoipa::path(
    post,
    path = "/api/user",
    tag = "Users",
    operation_id = "createUser",
    summary = "Create a user",
    description = "Multipart form: `full_name`, `username`, `phone_number`, `email`, `password`, optional `address`, `role` (defaults to Customer) and avatar `file`. Requires Admin or SuperAdmin.",
    request_body(content_type = "multipart/form-data", description = "User fields and optional avatar"),
    responses(
        (status = 200, description = "User saved", body = MessageEnvelope),
        (status = 400, description = "Missing or malformed fields", body = FieldErrorEnvelope),
        (status = 409, description = "Email already registered", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id))]
pub async fn create_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let fields = form_fields(&form);
    let mut errors = fields.validate();
    let role = parse_role(&mut errors, &form.text("role"));
    if role == Role::SuperAdmin && admin.role != Role::SuperAdmin {
        errors.add("role", "Only a SuperAdmin may create another SuperAdmin");
    }
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let avatar = form.file("file");
    let user = insert_user(&txn, &state.files, fields, role, avatar, &mut changes).await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(user_id = user.id, role = role.as_str(), "User created");
    Ok(message("User saved successfully"))
}

#[utoipa::path(
    put,
    path = "/api/user/{id}",
    tag = "Users",
    operation_id = "updateUser",
    summary = "Update a user",
    description = "Multipart form; every field is optional. A new `file` replaces the avatar and deletes the old blob. A blank password keeps the current one. Requires Admin or SuperAdmin.",
    params(("id" = i32, Path, description = "User ID")),
    request_body(content_type = "multipart/form-data", description = "Changed user fields"),
    responses(
        (status = 200, description = "User updated", body = MessageEnvelope),
        (status = 400, description = "Malformed fields", body = FieldErrorEnvelope),
        (status = 404, description = "User not found", body = MessageEnvelope),
        (status = 409, description = "Email already registered", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, form), fields(admin_id = admin.user_id, user_id = id))]
pub async fn update_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    form: FormData,
) -> Result<Json<MessageEnvelope>, AppError> {
    let mut errors = FieldErrors::new();
    let email = form.optional("email");
    if let Some(email) = &email
        && !looks_like_email(email)
    {
        errors.add("email", "The email must be a valid email address");
    }
    let password = form.raw("password");
    if !password.is_empty() {
        validate_password(&mut errors, &password);
    }
    let role = form
        .optional("role")
        .map(|raw| parse_role(&mut errors, &raw));
    if role == Some(Role::SuperAdmin) && admin.role != Role::SuperAdmin {
        errors.add("role", "Only a SuperAdmin may grant SuperAdmin");
    }
    errors.into_result()?;

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let mut user = repository::find_by_id::<user::Entity, _>(&txn, id, "User")
        .await?
        .into_active_model();

    for (field, column) in [
        ("full_name", &mut user.full_name),
        ("username", &mut user.username),
        ("phone_number", &mut user.phone_number),
    ] {
        if let Some(value) = form.optional(field) {
            *column = Set(value);
        }
    }
    if let Some(email) = email {
        user.email = Set(email);
    }
    if let Some(address) = form.optional("address") {
        user.address = Set(Some(address));
    }
    if let Some(role) = role {
        user.role = Set(role);
    }
    if !password.is_empty() {
        let hashed = hash::hash_password(&password)
            .map_err(|e| AppError::Internal(format!("Password hash error: {e}")))?;
        user.password = Set(hashed);
    }
    if let Some(upload) = form.file("file") {
        state.files.attach(&txn, &mut user, upload, &mut changes).await?;
    }
    user.updated_at = Set(Utc::now());
    repository::update(&txn, user).await.map_err(email_taken)?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!("User updated");
    Ok(message("User updated successfully"))
}

#[utoipa::path(
    delete,
    path = "/api/user",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user",
    description = "Deletes the user and their avatar file. Users that still own contracts are refused. Requires Admin or SuperAdmin.",
    params(IdQuery),
    responses(
        (status = 200, description = "User deleted", body = MessageEnvelope),
        (status = 400, description = "Missing id or user still owns contracts", body = MessageEnvelope),
        (status = 404, description = "User not found", body = MessageEnvelope),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, admin, query), fields(admin_id = admin.user_id))]
pub async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> Result<Json<MessageEnvelope>, AppError> {
    let id = query.require()?;
    if id == admin.user_id {
        return Err(AppError::Validation("You cannot delete your own account".into()));
    }

    let txn = state.db.begin().await?;
    let mut changes = BlobChanges::new();
    let user = repository::find_by_id::<user::Entity, _>(&txn, id, "User").await?;

    let contracts = repository::count::<contract::Entity, _>(
        &txn,
        Condition::all().add(contract::Column::UserId.eq(id)),
    )
    .await?;
    if contracts > 0 {
        return Err(AppError::Validation(format!(
            "User still owns {contracts} contracts"
        )));
    }

    history::Entity::update_many()
        .col_expr(history::Column::UserId, Expr::value(Option::<i32>::None))
        .filter(history::Column::UserId.eq(id))
        .exec(&txn)
        .await?;
    let mut owner = user.into_active_model();
    state.files.release(&txn, &mut owner, &mut changes).await?;
    repository::delete_by_id::<user::Entity, _>(&txn, id, "User").await?;
    txn.commit().await?;
    state.files.sweep(changes).await;

    info!(user_id = id, "User deleted");
    Ok(message("User deleted successfully"))
}
