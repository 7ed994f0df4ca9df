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

use crate::api::{
    ApiErrorResponse, CategoryGroup, CategoryListResponse, CreateRestaurantRequest,
    PaginatedRestaurantsResponse, Pagination, RestaurantListResponse, RestaurantResponse,
    UpdateRestaurantRequest,
};
use crate::errors::ApiError;
use crate::models::{City, NewRestaurant, Restaurant, RestaurantChanges};
use crate::schema;

use super::AppState;

const DEFAULT_PAGE_LIMIT: u32 = 10;

#[derive(Debug, Deserialize)]
pub struct ListRestaurantsQuery {
    pub search: Option<String>,
    pub city_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/restaurants", post(create_restaurant).get(list_restaurants))
        .route("/restaurants/category", get(list_restaurants_by_category))
        .route("/restaurants/city/{city_id}", get(list_restaurants_by_city))
        .route(
            "/restaurants/{id}",
            get(get_restaurant)
                .patch(update_restaurant)
                .delete(delete_restaurant),
        )
}

#[utoipa::path(
    post,
    path = "/restaurants",
    request_body = CreateRestaurantRequest,
    responses(
        (status = 201, description = "Restaurant created", body = RestaurantResponse),
        (status = 400, description = "City not found", body = ApiErrorResponse),
        (status = 409, description = "Phone already registered", body = ApiErrorResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state, payload))]
pub async fn create_restaurant(
    State(state): State<AppState>,
    Json(payload): Json<CreateRestaurantRequest>,
) -> Result<(StatusCode, Json<RestaurantResponse>), ApiError> {
    let conn = &mut state.pool.get()?;
    info!("creating restaurant");

    validate_unique_phone(conn, &payload.phone, None)?;
    validate_city_exists(conn, payload.city_id)?;

    let restaurant: Restaurant = diesel::insert_into(schema::restaurants::table)
        .values(&NewRestaurant {
            name: payload.name,
            phone: payload.phone,
            image: payload.image,
            address: payload.address,
            category: payload.category,
            city_id: payload.city_id,
        })
        .get_result(conn)?;

    info!(restaurant = restaurant.id, "restaurant created");
    let response = fetch_restaurant(conn, restaurant.id)?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[utoipa::path(
    get,
    path = "/restaurants",
    params(
        ("search" = Option<String>, Query, description = "Name substring filter"),
        ("city_id" = Option<i32>, Query, description = "Filter by city"),
    ),
    responses(
        (status = 200, description = "Restaurants with their city", body = RestaurantListResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants(
    State(state): State<AppState>,
    Query(params): Query<ListRestaurantsQuery>,
) -> Result<Json<RestaurantListResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let data = load_restaurants(conn, &params)?;

    info!("Found {} restaurants", data.len());
    Ok(Json(RestaurantListResponse { data }))
}

#[utoipa::path(
    get,
    path = "/restaurants/category",
    params(
        ("search" = Option<String>, Query, description = "Name substring filter"),
        ("city_id" = Option<i32>, Query, description = "Filter by city"),
    ),
    responses(
        (status = 200, description = "Restaurants grouped by category", body = CategoryListResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants_by_category(
    State(state): State<AppState>,
    Query(params): Query<ListRestaurantsQuery>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let data = load_restaurants(conn, &params)?;

    info!("Found {} restaurants", data.len());
    Ok(Json(CategoryListResponse {
        data: group_by_category(data),
    }))
}

#[utoipa::path(
    get,
    path = "/restaurants/city/{city_id}",
    params(
        ("city_id" = i32, Path, description = "City ID"),
        ("page" = Option<u32>, Query, description = "Page number, starting at 1"),
        ("limit" = Option<u32>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Restaurants in the city", body = PaginatedRestaurantsResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn list_restaurants_by_city(
    State(state): State<AppState>,
    Path(city_id): Path<i32>,
    Query(params): Query<PageQuery>,
) -> Result<Json<PaginatedRestaurantsResponse>, ApiError> {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let offset = i64::from(page - 1) * i64::from(limit);

    let conn = &mut state.pool.get()?;
    let total: i64 = schema::restaurants::table
        .filter(schema::restaurants::city_id.eq(city_id))
        .count()
        .get_result(conn)?;

    let rows: Vec<(Restaurant, Option<City>)> = schema::restaurants::table
        .left_join(schema::cities::table)
        .filter(schema::restaurants::city_id.eq(city_id))
        .order(schema::restaurants::created_at.desc())
        .limit(i64::from(limit))
        .offset(offset)
        .select((Restaurant::as_select(), Option::<City>::as_select()))
        .load(conn)?;

    info!("Found {} restaurants in city {city_id}", rows.len());
    Ok(Json(PaginatedRestaurantsResponse {
        data: rows.into_iter().map(Into::into).collect(),
        pagination: Pagination {
            page,
            limit,
            total,
            total_pages: (total + i64::from(limit) - 1) / i64::from(limit),
        },
    }))
}

#[utoipa::path(
    get,
    path = "/restaurants/{id}",
    params(
        ("id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 200, description = "Restaurant details", body = RestaurantResponse),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn get_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    let response = fetch_restaurant(conn, id)?;
    Ok(Json(response))
}

#[utoipa::path(
    patch,
    path = "/restaurants/{id}",
    params(
        ("id" = i32, Path, description = "Restaurant ID"),
    ),
    request_body = UpdateRestaurantRequest,
    responses(
        (status = 200, description = "Updated restaurant", body = RestaurantResponse),
        (status = 400, description = "Nothing to update or city not found", body = ApiErrorResponse),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
        (status = 409, description = "Phone already registered", body = ApiErrorResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state, payload))]
pub async fn update_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateRestaurantRequest>,
) -> Result<Json<RestaurantResponse>, ApiError> {
    let conn = &mut state.pool.get()?;
    fetch_restaurant(conn, id)?;

    if let Some(phone) = &payload.phone {
        validate_unique_phone(conn, phone, Some(id))?;
    }
    if let Some(city_id) = payload.city_id {
        validate_city_exists(conn, city_id)?;
    }

    let changes = RestaurantChanges {
        name: payload.name,
        phone: payload.phone,
        image: payload.image,
        address: payload.address,
        category: payload.category,
        city_id: payload.city_id,
    };
    if changes.is_empty() {
        return Err(ApiError::BadRequest("No valid fields to update".to_string()));
    }

    diesel::update(schema::restaurants::table.find(id))
        .set(&changes)
        .execute(conn)?;

    info!(restaurant = id, "restaurant updated");
    let response = fetch_restaurant(conn, id)?;
    Ok(Json(response))
}

#[utoipa::path(
    delete,
    path = "/restaurants/{id}",
    params(
        ("id" = i32, Path, description = "Restaurant ID"),
    ),
    responses(
        (status = 204, description = "Restaurant deleted"),
        (status = 404, description = "Restaurant not found", body = ApiErrorResponse),
    ),
    tag = "restaurants"
)]
#[instrument(skip(state))]
pub async fn delete_restaurant(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let conn = &mut state.pool.get()?;
    fetch_restaurant(conn, id)?;

    diesel::delete(schema::restaurants::table.find(id)).execute(conn)?;
    info!(restaurant = id, "restaurant deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn load_restaurants(
    conn: &mut PgConnection,
    params: &ListRestaurantsQuery,
) -> Result<Vec<RestaurantResponse>, ApiError> {
    let mut query = schema::restaurants::table
        .left_join(schema::cities::table)
        .select((Restaurant::as_select(), Option::<City>::as_select()))
        .into_boxed();

    if let Some(search) = &params.search {
        query = query.filter(schema::restaurants::name.ilike(format!("%{search}%")));
    }
    if let Some(city_id) = params.city_id {
        query = query.filter(schema::restaurants::city_id.eq(city_id));
    }

    let rows: Vec<(Restaurant, Option<City>)> = query
        .order(schema::restaurants::created_at.desc())
        .load(conn)?;
    Ok(rows.into_iter().map(Into::into).collect())
}

fn fetch_restaurant(conn: &mut PgConnection, id: i32) -> Result<RestaurantResponse, ApiError> {
    let row: Option<(Restaurant, Option<City>)> = schema::restaurants::table
        .left_join(schema::cities::table)
        .filter(schema::restaurants::id.eq(id))
        .select((Restaurant::as_select(), Option::<City>::as_select()))
        .first(conn)
        .optional()?;

    row.map(Into::into)
        .ok_or_else(|| ApiError::NotFound(format!("Restaurant with ID {id} not found")))
}

fn validate_unique_phone(
    conn: &mut PgConnection,
    phone: &str,
    exclude_id: Option<i32>,
) -> Result<(), ApiError> {
    let mut query = schema::restaurants::table
        .filter(schema::restaurants::phone.eq(phone))
        .select(schema::restaurants::id)
        .into_boxed();
    if let Some(id) = exclude_id {
        query = query.filter(schema::restaurants::id.ne(id));
    }

    if query.first::<i32>(conn).optional()?.is_some() {
        warn!(%phone, "phone number already registered");
        return Err(ApiError::Conflict("Phone number already exists".to_string()));
    }
    Ok(())
}

fn validate_city_exists(conn: &mut PgConnection, city_id: i32) -> Result<(), ApiError> {
    schema::cities::table
        .find(city_id)
        .select(schema::cities::id)
        .first::<i32>(conn)
        .optional()?
        .map(|_| ())
        .ok_or_else(|| ApiError::BadRequest("City not found".to_string()))
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn group_by_category(restaurants: Vec<RestaurantResponse>) -> Vec<CategoryGroup> {
    let mut groups: Vec<CategoryGroup> = Vec::new();
    for restaurant in restaurants {
        let label = capitalize(restaurant.category.as_str());
        match groups.iter_mut().find(|g| g.category == label) {
            Some(group) => group.restaurants.push(restaurant),
            None => groups.push(CategoryGroup {
                id: groups.len() as i32 + 1,
                category: label,
                restaurants: vec![restaurant],
            }),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RestaurantCategory;
    use chrono::Utc;

    fn restaurant(id: i32, category: RestaurantCategory) -> RestaurantResponse {
        RestaurantResponse {
            id,
            name: format!("Restaurant {id}"),
            phone: format!("+99890000000{id}"),
            image: "cover.png".to_string(),
            address: None,
            category,
            city_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            city: None,
        }
    }

    #[test]
    fn capitalize_uppercases_first_letter_only() {
        assert_eq!(capitalize("fast_food"), "Fast_food");
        assert_eq!(capitalize("pizza"), "Pizza");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn grouping_keeps_one_group_per_category() {
        let groups = group_by_category(vec![
            restaurant(1, RestaurantCategory::Pizza),
            restaurant(2, RestaurantCategory::Burger),
            restaurant(3, RestaurantCategory::Pizza),
        ]);

        assert_eq!(groups.len(), 2);
        let pizza = groups.iter().find(|g| g.category == "Pizza").unwrap();
        assert_eq!(pizza.restaurants.len(), 2);
        let burger = groups.iter().find(|g| g.category == "Burger").unwrap();
        assert_eq!(burger.restaurants.len(), 1);
    }

    #[test]
    fn group_ids_are_assigned_in_first_seen_order() {
        let groups = group_by_category(vec![
            restaurant(1, RestaurantCategory::MilliyTaom),
            restaurant(2, RestaurantCategory::FastFood),
        ]);
        assert_eq!(groups[0].id, 1);
        assert_eq!(groups[0].category, "Milliy_taom");
        assert_eq!(groups[1].id, 2);
    }
}
