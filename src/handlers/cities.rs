use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use diesel::prelude::*;
use serde::Deserialize;
use tracing::{info, instrument, warn};

use crate::api::{ApiErrorResponse, CityRelationsResponse, CityResponse, CreateCityRequest};
use crate::errors::ApiError;
use crate::models::{City, NewCity, Restaurant, User};
use crate::schema;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct GetCityQuery {
    pub include_relations: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cities", post(create_city).get(list_cities))
        .route("/cities/{id}", get(get_city).delete(delete_city))
}

#[utoipa::path(
    post,
    path = "/cities",
    request_body = CreateCityRequest,
    responses(
        (status = 201, description = "City created", body = CityResponse),
        (status = 400, description = "Invalid payload", body = ApiErrorResponse),
    ),
    tag = "cities"
)]
#[instrument(skip(state))]
pub async fn create_city(
    State(state): State<AppState>,
    Json(payload): Json<CreateCityRequest>,
) -> Result<(StatusCode, Json<CityResponse>), ApiError> {
    let conn = &mut state.pool.get()?;
    let city: City = diesel::insert_into(schema::cities::table)
        .values(&NewCity { name: payload.name })
        .get_result(conn)?;

    info!(city = city.id, "city created");
    Ok((StatusCode::CREATED, Json(city.into())))
}

#[utoipa::path(
    get,
    path = "/cities",
    responses(
        (status = 200, description = "All cities", body = Vec<CityResponse>),
    ),
    tag = "cities"
)]
#[instrument(skip(state))]
pub async fn list_cities(
    State(state): State<AppState>,
) -> Result<Json<Vec<CityResponse>>, ApiError> {
    let conn = &mut state.pool.get()?;
    let cities = schema::cities::table
        .select(City::as_select())
        .load::<City>(conn)?;

    info!("Found {} total cities", cities.len());
    Ok(Json(cities.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/cities/{id}",
    params(
        ("id" = i32, Path, description = "City ID"),
        ("include_relations" = Option<bool>, Query, description = "Embed referencing restaurants and users"),
    ),
    responses(
        (status = 200, description = "City details", body = CityRelationsResponse),
        (status = 404, description = "City not found", body = ApiErrorResponse),
    ),
    tag = "cities"
)]
#[instrument(skip(state))]
pub async fn get_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(query): Query<GetCityQuery>,
) -> Result<Response, ApiError> {
    let conn = &mut state.pool.get()?;
    let city = schema::cities::table
        .find(id)
        .select(City::as_select())
        .first::<City>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("City with ID {id} not found")))?;

    if query.include_relations != Some(true) {
        return Ok(Json(CityResponse::from(city)).into_response());
    }

    let restaurants = schema::restaurants::table
        .filter(schema::restaurants::city_id.eq(id))
        .select(Restaurant::as_select())
        .load::<Restaurant>(conn)?;
    let users = schema::users::table
        .filter(schema::users::city_id.eq(id))
        .select(User::as_select())
        .load::<User>(conn)?;

    Ok(Json(CityRelationsResponse {
        city: city.into(),
        restaurants: restaurants.into_iter().map(Into::into).collect(),
        users: users.into_iter().map(Into::into).collect(),
    })
    .into_response())
}

#[utoipa::path(
    delete,
    path = "/cities/{id}",
    params(
        ("id" = i32, Path, description = "City ID"),
    ),
    responses(
        (status = 204, description = "City deleted"),
        (status = 404, description = "City not found", body = ApiErrorResponse),
        (status = 409, description = "City still referenced", body = ApiErrorResponse),
    ),
    tag = "cities"
)]
#[instrument(skip(state))]
pub async fn delete_city(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    let conn = &mut state.pool.get()?;
    schema::cities::table
        .find(id)
        .select(City::as_select())
        .first::<City>(conn)
        .optional()?
        .ok_or_else(|| ApiError::NotFound(format!("City with ID {id} not found")))?;

    let restaurant_count: i64 = schema::restaurants::table
        .filter(schema::restaurants::city_id.eq(id))
        .count()
        .get_result(conn)?;
    let user_count: i64 = schema::users::table
        .filter(schema::users::city_id.eq(id))
        .count()
        .get_result(conn)?;

    let kinds = relation_kinds(restaurant_count, user_count);
    if !kinds.is_empty() {
        warn!(city = id, ?kinds, "refusing to delete referenced city");
        return Err(ApiError::Conflict(format!(
            "Cannot delete city with ID {id} because it has related {}.",
            kinds.join(", ")
        )));
    }

    diesel::delete(schema::cities::table.find(id)).execute(conn)?;
    info!(city = id, "city deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn relation_kinds(restaurant_count: i64, user_count: i64) -> Vec<&'static str> {
    let mut kinds = Vec::new();
    if restaurant_count > 0 {
        kinds.push("restaurants");
    }
    if user_count > 0 {
        kinds.push("users");
    }
    kinds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relation_kinds_lists_each_referencing_table() {
        assert!(relation_kinds(0, 0).is_empty());
        assert_eq!(relation_kinds(2, 0), vec!["restaurants"]);
        assert_eq!(relation_kinds(0, 1), vec!["users"]);
        assert_eq!(relation_kinds(3, 4), vec!["restaurants", "users"]);
    }

    #[test]
    fn conflict_message_names_the_relations() {
        let kinds = relation_kinds(1, 1);
        let message = format!(
            "Cannot delete city with ID {} because it has related {}.",
            7,
            kinds.join(", ")
        );
        assert_eq!(
            message,
            "Cannot delete city with ID 7 because it has related restaurants, users."
        );
    }
}
