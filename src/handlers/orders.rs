use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bigdecimal::BigDecimal;
use diesel::{insert_into, prelude::*};
use tracing::{debug, info, instrument, warn};

use crate::api::{
    ApiErrorResponse, ClientOrderResponse, CreateOrderItemRequest, CreateOrderRequest,
    DeleteOrderResponse, OrderDetailResponse, OrderResponse, OrderWithItemsResponse,
    RestaurantOrderResponse, RestaurantSummary, UpdateOrderRequest, UserSummary,
};
use crate::errors::ApiError;
use crate::models::{
    MenuItem, NewOrder, NewOrderItem, Order, OrderChanges, OrderItem, OrderStatus, PaymentStatus,
    Restaurant, User, UserRole,
};
use crate::pricing::{self, PricedItem};
use crate::schema;

use super::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(create_order))
        .route(
            "/orders/restaurant/{restaurant_id}",
            get(list_restaurant_orders),
        )
        .route("/orders/my-orders/{telegram_id}", get(list_client_orders))
        .route(
            "/orders/{id}",
            get(get_order).patch(update_order).delete(delete_order),
        )
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created with its items", body = OrderWithItemsResponse),
        (status = 400, description = "Invalid order payload", body = ApiErrorResponse),
        (status = 404, description = "Participant or menu item not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state, payload))]
pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<OrderWithItemsResponse>), ApiError> {
    info!(
        restaurant = payload.restaurant_id,
        client = payload.client_id,
        items = payload.items.len(),
        "creating order"
    );
    payload.validate()?;

    let conn = &mut state.pool.get()?;

    // Every referenced participant must exist with the right role before
    // anything is written.
    validate_participants(
        conn,
        payload.driver_id,
        payload.client_id,
        payload.restaurant_id,
    )?;

    let menu_rows = load_menu_rows(conn, &payload.items)?;
    let priced = pricing::price_items(&payload.items, &menu_rows)?;

    let subtotal = pricing::subtotal(&priced);
    let discount = payload.discount.unwrap_or(0);
    let delivery_fee = match payload.delivery_fee {
        Some(fee) => pricing::money_from_f64(fee, "delivery fee")?,
        None => BigDecimal::from(0),
    };
    let total = pricing::total(&subtotal, discount, &delivery_fee);
    debug!(%subtotal, %total, discount, "order totals computed");

    let new_order = NewOrder {
        address: payload.address,
        status: payload.status.unwrap_or(OrderStatus::New),
        total_price: total,
        subtotal_price: subtotal,
        discount,
        delivery_fee,
        payment_method: payload.payment_method,
        payment_status: PaymentStatus::Pending,
        delivery_method: payload.delivery_method,
        comment: payload.comment,
        driver_id: payload.driver_id,
        client_id: payload.client_id,
        restaurant_id: payload.restaurant_id,
    };

    let (order, items) = conn.transaction::<_, ApiError, _>(|conn| {
        let order: Order = insert_into(schema::orders::table)
            .values(&new_order)
            .get_result(conn)?;

        let rows = item_rows(order.id, priced);
        let items: Vec<OrderItem> = insert_into(schema::order_items::table)
            .values(&rows)
            .get_results(conn)?;

        Ok((order, items))
    })?;

    info!(order = order.id, items = items.len(), "order created");
    Ok((
        StatusCode::CREATED,
        Json(OrderWithItemsResponse::new(order, items)),
    ))
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Order with participants and items", body = OrderDetailResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<OrderDetailResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let order = fetch_order(conn, id)?;

    // One batched lookup covers both user references; a dangling driver
    // resolves to null instead of failing the read.
    let mut participant_ids = vec![order.client_id];
    if let Some(driver_id) = order.driver_id {
        participant_ids.push(driver_id);
    }
    let participants: Vec<User> = schema::users::table
        .filter(schema::users::id.eq_any(&participant_ids))
        .select(User::as_select())
        .load(conn)?;

    let client = participants
        .iter()
        .find(|u| u.id == order.client_id)
        .cloned()
        .map(UserSummary::from);
    let driver = order.driver_id.and_then(|driver_id| {
        participants
            .iter()
            .find(|u| u.id == driver_id)
            .cloned()
            .map(UserSummary::from)
    });
    let restaurant = schema::restaurants::table
        .find(order.restaurant_id)
        .select(Restaurant::as_select())
        .first::<Restaurant>(conn)
        .optional()?
        .map(RestaurantSummary::from);

    let items = load_order_items(conn, id)?;

    Ok(Json(OrderDetailResponse {
        order: order.into(),
        client,
        restaurant,
        driver,
        items: items.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/orders/restaurant/{restaurant_id}",
    params(
        ("restaurant_id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 200, description = "Orders for the restaurant, newest first", body = Vec<RestaurantOrderResponse>),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_restaurant_orders(
    State(state): State<AppState>,
    Path(restaurant_id): Path<i32>,
) -> Result<Json<Vec<RestaurantOrderResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    schema::restaurants::table
        .find(restaurant_id)
        .select(schema::restaurants::id)
        .first::<i32>(conn)
        .optional()?
        .ok_or_else(|| {
            warn!(restaurant = restaurant_id, "restaurant not found");
            ApiError::NotFound(format!(
                "Restaurant with ID {restaurant_id} not found or is not a restaurant"
            ))
        })?;

    let rows: Vec<(Order, Option<User>)> = schema::orders::table
        .left_join(schema::users::table)
        .filter(schema::orders::restaurant_id.eq(restaurant_id))
        .order(schema::orders::created_at.desc())
        .select((Order::as_select(), Option::<User>::as_select()))
        .load(conn)?;

    info!(
        "Found {} orders for restaurant ID: {restaurant_id}",
        rows.len()
    );
    Ok(Json(
        rows.into_iter()
            .map(|(order, client)| RestaurantOrderResponse {
                order: order.into(),
                client: client.map(Into::into),
            })
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/orders/my-orders/{telegram_id}",
    params(
        ("telegram_id" = String, Path, description = "Telegram id of the client"),
    ),
    responses(
        (status = 200, description = "Orders placed by the client", body = Vec<ClientOrderResponse>),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_client_orders(
    State(state): State<AppState>,
    Path(telegram_id): Path<String>,
) -> Result<Json<Vec<ClientOrderResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    let rows: Vec<(Order, Option<User>, Option<Restaurant>)> = schema::orders::table
        .left_join(schema::users::table)
        .left_join(schema::restaurants::table)
        .filter(schema::users::telegram_id.eq(&telegram_id))
        .select((
            Order::as_select(),
            Option::<User>::as_select(),
            Option::<Restaurant>::as_select(),
        ))
        .load(conn)?;

    // Drivers are resolved in one batched lookup over the distinct ids
    // present in the page.
    let mut driver_ids: Vec<i32> = rows
        .iter()
        .filter_map(|(order, _, _)| order.driver_id)
        .collect();
    driver_ids.sort_unstable();
    driver_ids.dedup();

    let drivers: Vec<User> = if driver_ids.is_empty() {
        Vec::new()
    } else {
        schema::users::table
            .filter(schema::users::id.eq_any(&driver_ids))
            .select(User::as_select())
            .load(conn)?
    };

    let responses = rows
        .into_iter()
        .map(|(order, client, restaurant)| {
            let driver = order.driver_id.and_then(|driver_id| {
                drivers
                    .iter()
                    .find(|d| d.id == driver_id)
                    .cloned()
                    .map(UserSummary::from)
            });
            ClientOrderResponse {
                order: order.into(),
                client: client.map(Into::into),
                restaurant: restaurant.map(Into::into),
                driver,
            }
        })
        .collect();

    Ok(Json(responses))
}

#[utoipa::path(
    patch,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Updated order", body = OrderWithItemsResponse),
        (status = 400, description = "Nothing to update or invalid patch", body = ApiErrorResponse),
        (status = 404, description = "Order, driver or menu item not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state, payload))]
pub async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateOrderRequest>,
) -> Result<Response, ApiError> {
    payload.validate()?;

    let conn = &mut state.pool.get()?;
    let existing = fetch_order(conn, id)?;

    let replacement = payload.replacement_items();
    if replacement.is_none() && !payload.has_scalar_updates() {
        return Err(ApiError::BadRequest("No valid fields to update".to_string()));
    }

    if let Some(driver_id) = payload.driver_id {
        validate_driver(conn, driver_id)?;
    }

    let discount = payload.discount.unwrap_or(existing.discount);
    let delivery_fee = match payload.delivery_fee {
        Some(fee) => pricing::money_from_f64(fee, "delivery fee")?,
        None => existing.delivery_fee.clone(),
    };
    // Any change to a pricing-relevant field re-derives the total; scalar
    // patches reuse the stored subtotal, item replacement re-prices it.
    let pricing_changed =
        replacement.is_some() || payload.discount.is_some() || payload.delivery_fee.is_some();

    let (order, items) = conn.transaction::<_, ApiError, _>(|conn| {
        let (subtotal, replaced_items) = match replacement {
            Some(requested) => {
                diesel::delete(
                    schema::order_items::table.filter(schema::order_items::order_id.eq(id)),
                )
                .execute(conn)?;

                let menu_rows = load_menu_rows(conn, requested)?;
                let priced = pricing::price_items(requested, &menu_rows)?;
                let subtotal = pricing::subtotal(&priced);

                let rows = item_rows(id, priced);
                let inserted: Vec<OrderItem> = insert_into(schema::order_items::table)
                    .values(&rows)
                    .get_results(conn)?;

                (subtotal, Some(inserted))
            }
            None => (existing.subtotal_price.clone(), None),
        };

        let changes = OrderChanges {
            address: payload.address.clone(),
            status: payload.status,
            discount: payload.discount,
            delivery_fee: payload.delivery_fee.is_some().then(|| delivery_fee.clone()),
            driver_id: payload.driver_id,
            total_price: pricing_changed
                .then(|| pricing::total(&subtotal, discount, &delivery_fee)),
            subtotal_price: replaced_items.is_some().then(|| subtotal.clone()),
        };
        let order: Order = diesel::update(schema::orders::table.find(id))
            .set(&changes)
            .get_result(conn)?;

        Ok((order, replaced_items))
    })?;

    info!(order = id, replaced_items = items.is_some(), "order updated");
    match items {
        Some(items) => Ok(Json(OrderWithItemsResponse::new(order, items)).into_response()),
        None => Ok(Json(OrderResponse::from(order)).into_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = i32, Path, description = "Order ID"),
    ),
    responses(
        (status = 200, description = "Deleted order snapshot", body = DeleteOrderResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn delete_order(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteOrderResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    fetch_order(conn, id)?;

    let deleted = conn.transaction::<_, ApiError, _>(|conn| {
        // Items go first; the order row is the parent.
        diesel::delete(schema::order_items::table.filter(schema::order_items::order_id.eq(id)))
            .execute(conn)?;
        let deleted: Order = diesel::delete(schema::orders::table.find(id)).get_result(conn)?;
        Ok(deleted)
    })?;

    info!(order = id, "order deleted");
    Ok(Json(DeleteOrderResponse {
        success: true,
        message: format!("Order with ID {id} successfully deleted"),
        deleted_order: deleted.into(),
    }))
}

fn fetch_order(conn: &mut PgConnection, id: i32) -> Result<Order, ApiError> {
    schema::orders::table
        .find(id)
        .select(Order::as_select())
        .first::<Order>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("Order with ID {id} not found")))
}

fn load_order_items(conn: &mut PgConnection, order_id: i32) -> Result<Vec<OrderItem>, ApiError> {
    Ok(schema::order_items::table
        .filter(schema::order_items::order_id.eq(order_id))
        .select(OrderItem::as_select())
        .load(conn)?)
}

fn validate_driver(conn: &mut PgConnection, driver_id: i32) -> Result<(), ApiError> {
    let driver = schema::users::table
        .filter(schema::users::id.eq(driver_id))
        .filter(schema::users::role.eq(UserRole::Driver))
        .select(schema::users::id)
        .first::<i32>(conn)
        .optional()?;
    if driver.is_none() {
        warn!(driver = driver_id, "driver validation failed");
        return Err(ApiError::NotFound(format!(
            "Driver with ID {driver_id} not found or is not a driver"
        )));
    }
    Ok(())
}

fn validate_participants(
    conn: &mut PgConnection,
    driver_id: Option<i32>,
    client_id: i32,
    restaurant_id: i32,
) -> Result<(), ApiError> {
    if let Some(driver_id) = driver_id {
        validate_driver(conn, driver_id)?;
    }

    let client = schema::users::table
        .filter(schema::users::id.eq(client_id))
        .filter(schema::users::role.eq(UserRole::Client))
        .select(schema::users::id)
        .first::<i32>(conn)
        .optional()?;
    if client.is_none() {
        warn!(client = client_id, "client validation failed");
        return Err(ApiError::NotFound(format!(
            "Client with ID {client_id} not found or is not a client"
        )));
    }

    let restaurant = schema::restaurants::table
        .find(restaurant_id)
        .select(schema::restaurants::id)
        .first::<i32>(conn)
        .optional()?;
    if restaurant.is_none() {
        warn!(restaurant = restaurant_id, "restaurant validation failed");
        return Err(ApiError::NotFound(format!(
            "Restaurant with ID {restaurant_id} not found or is not a restaurant"
        )));
    }

    Ok(())
}

/// Batch lookup for every distinct menu id referenced by the request.
fn load_menu_rows(
    conn: &mut PgConnection,
    items: &[CreateOrderItemRequest],
) -> Result<Vec<MenuItem>, ApiError> {
    let menu_ids: Vec<i32> = items.iter().map(|item| item.menu_id).collect();
    Ok(schema::menu::table
        .filter(schema::menu::id.eq_any(&menu_ids))
        .select(MenuItem::as_select())
        .load(conn)?)
}

fn item_rows(order_id: i32, priced: Vec<PricedItem>) -> Vec<NewOrderItem> {
    priced
        .into_iter()
        .map(|item| NewOrderItem {
            order_id,
            menu_id: item.menu_id,
            quantity: item.quantity,
            price: item.price,
            notes: item.notes,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_rows_carry_the_snapshot_price() {
        let rows = item_rows(
            9,
            vec![PricedItem {
                menu_id: 3,
                quantity: 2,
                price: "10.00".parse().unwrap(),
                notes: Some("no onions".to_string()),
            }],
        );
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].order_id, 9);
        assert_eq!(rows[0].menu_id, 3);
        assert_eq!(rows[0].price, "10.00".parse::<BigDecimal>().unwrap());
        assert_eq!(rows[0].notes.as_deref(), Some("no onions"));
    }
}
