use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::{ApiErrorResponse, CreateUserRequest, UpdateUserRequest, UserResponse};
use crate::errors::ApiError;
use crate::models::{NewUser, User, UserChanges, UserRole};
use crate::schema;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<String>,
    pub telegram_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramQuery {
    pub telegram_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user).get(list_users))
        .route("/users/restaurants", get(list_restaurant_users))
        .route("/users/tg", get(get_user_by_telegram))
        .route(
            "/users/{id}",
            get(get_user).patch(update_user).delete(delete_user),
        )
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 409, description = "Phone already registered", body = ApiErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let conn = &mut state.pool.get()?;
    info!(phone = %payload.phone, "creating user");

    let existing = schema::users::table
        .filter(schema::users::phone.eq(&payload.phone))
        .select(schema::users::id)
        .first::<i32>(conn)
        .optional()?;
    if existing.is_some() {
        warn!(phone = %payload.phone, "user creation failed: phone already exists");
        return Err(ApiError::Conflict("Phone number already exists".to_string()));
    }

    let user: User = diesel::insert_into(schema::users::table)
        .values(&NewUser {
            name: payload.name,
            phone: payload.phone,
            address: payload.address,
            role: payload.role,
            telegram_id: payload.telegram_id,
            city_id: payload.city_id,
        })
        .get_result(conn)?;

    info!(user = user.id, role = ?user.role, "user created");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/users",
    params(
        ("role" = Option<String>, Query, description = "Filter by role"),
        ("telegram_id" = Option<String>, Query, description = "Filter by telegram id"),
    ),
    responses(
        (status = 200, description = "Matching users", body = Vec<UserResponse>),
        (status = 400, description = "Invalid role filter", body = ApiErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let role = match &params.role {
        Some(raw) => Some(
            raw.parse::<UserRole>()
                .map_err(|_| ApiError::BadRequest(format!("Invalid role: {raw}")))?,
        ),
        None => None,
    };

    let conn = &mut state.pool.get()?;
    let mut query = schema::users::table
        .select(User::as_select())
        .into_boxed();

    // Filters combine with OR, matching a user on either criterion.
    query = match (role, &params.telegram_id) {
        (Some(role), Some(telegram_id)) => query.filter(
            schema::users::role
                .eq(role)
                .nullable()
                .or(schema::users::telegram_id.eq(telegram_id)),
        ),
        (Some(role), None) => query.filter(schema::users::role.eq(role)),
        (None, Some(telegram_id)) => query.filter(schema::users::telegram_id.eq(telegram_id)),
        (None, None) => query,
    };

    let users = query.load::<User>(conn)?;
    info!("Found {} users", users.len());
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/users/restaurants",
    responses(
        (status = 200, description = "Users holding the restaurant role", body = Vec<UserResponse>),
    ),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn list_restaurant_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    let users = schema::users::table
        .filter(schema::users::role.eq(UserRole::Restaurant))
        .select(User::as_select())
        .load::<User>(conn)?;

    info!("Found {} restaurants", users.len());
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/users/tg",
    params(
        ("telegram_id" = String, Query, description = "Telegram id to look up"),
    ),
    responses(
        (status = 200, description = "User for the telegram id, or null", body = Option<UserResponse>),
    ),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn get_user_by_telegram(
    State(state): State<AppState>,
    Query(params): Query<TelegramQuery>,
) -> Result<Json<Option<UserResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    // Telegram lookups are probes from the bot; a miss is not an error.
    let user = schema::users::table
        .filter(schema::users::telegram_id.eq(&params.telegram_id))
        .select(User::as_select())
        .first::<User>(conn)
        .optional()?;

    Ok(Json(user.map(Into::into)))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User details", body = UserResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let user = schema::users::table
        .find(id)
        .select(User::as_select())
        .first::<User>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Nothing to update", body = ApiErrorResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    schema::users::table
        .find(id)
        .select(schema::users::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let changes = UserChanges {
        name: payload.name,
        phone: payload.phone,
        address: payload.address,
        role: payload.role,
        telegram_id: payload.telegram_id,
        city_id: payload.city_id,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No valid fields to update".to_string()));
    }

    let user: User = diesel::update(schema::users::table.find(id))
        .set(&changes)
        .get_result(conn)?;

    info!(user = id, "user updated");
    Ok(Json(user.into()))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    params(
        ("id" = i32, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "Deleted user", body = UserResponse),
        (status = 404, description = "User not found", body = ApiErrorResponse),
    ),
    tag = "users"
)]
#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<UserResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    schema::users::table
        .find(id)
        .select(schema::users::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let user: User = diesel::delete(schema::users::table.find(id)).get_result(conn)?;

    info!(user = id, "user deleted");
    Ok(Json(user.into()))
}
