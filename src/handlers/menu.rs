use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use diesel::prelude::*;
use tracing::{info, instrument, warn};

use crate::api::{ApiErrorResponse, CreateMenuItemRequest, MenuItemResponse, UpdateMenuItemRequest};
use crate::errors::ApiError;
use crate::models::{MenuItem, MenuItemChanges, NewMenuItem};
use crate::pricing;
use crate::schema;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu", post(create_menu_item))
        .route(
            "/menu/restaurant/{restaurant_id}",
            get(list_menu_for_restaurant),
        )
        .route(
            "/menu/{id}",
            get(get_menu_item)
                .patch(update_menu_item)
                .delete(delete_menu_item),
        )
}

#[utoipa::path(
    post,
    path = "/menu",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid price or restaurant", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state, payload))]
pub async fn create_menu_item(
    State(state): State<AppState>,
    Json(payload): Json<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    payload.validate()?;
    let price = pricing::money_from_f64(payload.price, "price")?;

    let conn = &mut state.pool.get()?;
    info!(name = %payload.name, "creating menu item");

    schema::restaurants::table
        .find(payload.restaurant_id)
        .select(schema::restaurants::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| ApiError::BadRequest("Restaurant not found".to_string()))?;

    let item: MenuItem = diesel::insert_into(schema::menu::table)
        .values(&NewMenuItem {
            name: payload.name,
            description: payload.description,
            image: payload.image,
            price,
            restaurant_id: payload.restaurant_id,
        })
        .get_result(conn)?;

    info!(item = item.id, "menu item created");
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    get,
    path = "/menu/restaurant/{restaurant_id}",
    params(
        ("restaurant_id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 200, description = "Menu items for the restaurant", body = Vec<MenuItemResponse>),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_menu_for_restaurant(
    State(state): State<AppState>,
    Path(restaurant_id): Path<i32>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    let items = schema::menu::table
        .filter(schema::menu::restaurant_id.eq(restaurant_id))
        .select(MenuItem::as_select())
        .load::<MenuItem>(conn)?;

    info!("Found {} products for restaurant ID: {restaurant_id}", items.len());
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/menu/{id}",
    params(
        ("id" = i32, Path, description = "Menu item ID"),
    ),
    responses(
        (status = 200, description = "Menu item details", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let item = fetch_menu_item(conn, id)?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    patch,
    path = "/menu/{id}",
    params(
        ("id" = i32, Path, description = "Menu item ID"),
    ),
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Updated menu item", body = MenuItemResponse),
        (status = 400, description = "Nothing to update", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state, payload))]
pub async fn update_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    payload.validate()?;
    let price = match payload.price {
        Some(value) => Some(pricing::money_from_f64(value, "price")?),
        None => None,
    };

    let conn = &mut state.pool.get()?;
    fetch_menu_item(conn, id)?;

    let changes = MenuItemChanges {
        name: payload.name,
        description: payload.description,
        image: payload.image,
        price,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No valid fields to update".to_string()));
    }

    let item: MenuItem = diesel::update(schema::menu::table.find(id))
        .set(&changes)
        .get_result(conn)?;

    info!(item = id, "menu item updated");
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/menu/{id}",
    params(
        ("id" = i32, Path, description = "Menu item ID"),
    ),
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
        (status = 409, description = "Menu item referenced by orders", body = ApiErrorResponse),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_menu_item(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let conn = &mut state.pool.get()?;
    fetch_menu_item(conn, id)?;

    // Historical order lines keep their snapshot rows; the menu row backing
    // them must stay.
    let referencing: i64 = schema::order_items::table
        .filter(schema::order_items::menu_id.eq(id))
        .count()
        .get_result(conn)?;
    if referencing > 0 {
        warn!(item = id, referencing, "refusing to delete referenced menu item");
        return Err(ApiError::Conflict(format!(
            "Cannot delete menu item with ID {id} because it is referenced by existing orders"
        )));
    }

    diesel::delete(schema::menu::table.find(id)).execute(conn)?;
    info!(item = id, "menu item deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn fetch_menu_item(conn: &mut PgConnection, id: i32) -> Result<MenuItem, ApiError> {
    schema::menu::table
        .find(id)
        .select(MenuItem::as_select())
        .first::<MenuItem>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("Menu item with ID {id} not found")))
}
