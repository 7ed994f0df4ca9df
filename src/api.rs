//! Request and response shapes for the HTTP surface.
//!
//! Requests are validated here, at the boundary, so handlers only ever see
//! well-formed values. Monetary amounts are serialized as strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::ApiError;
use crate::models::{
    City, DeliveryMethod, MenuItem, Order, OrderItem, OrderStatus, PaymentMethod, PaymentStatus,
    Restaurant, RestaurantCategory, User, UserRole,
};

pub const MAX_DISCOUNT_PERCENT: i32 = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCityRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CityResponse {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<City> for CityResponse {
    fn from(city: City) -> Self {
        CityResponse {
            id: city.id,
            name: city.name,
            created_at: city.created_at,
            updated_at: city.updated_at,
        }
    }
}

/// City with the rows that reference it, for `include_relations=true`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CityRelationsResponse {
    #[serde(flatten)]
    pub city: CityResponse,
    pub restaurants: Vec<RestaurantResponse>,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<UserRole>,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
}

/// Full user row, minus the password hash which never leaves the service.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            name: user.name,
            phone: user.phone,
            address: user.address,
            role: user.role,
            telegram_id: user.telegram_id,
            city_id: user.city_id,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Identity fields embedded into order payloads.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserSummary {
    pub id: i32,
    pub name: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub role: UserRole,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        UserSummary {
            id: user.id,
            name: user.name,
            phone: user.phone,
            address: user.address,
            role: user.role,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub phone: String,
    pub image: String,
    pub address: Option<String>,
    pub category: RestaurantCategory,
    pub city_id: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRestaurantRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
    pub category: Option<RestaurantCategory>,
    pub city_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CityRef {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantResponse {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub image: String,
    pub address: Option<String>,
    pub category: RestaurantCategory,
    pub city_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub city: Option<CityRef>,
}

impl From<(Restaurant, Option<City>)> for RestaurantResponse {
    fn from((restaurant, city): (Restaurant, Option<City>)) -> Self {
        RestaurantResponse {
            id: restaurant.id,
            name: restaurant.name,
            phone: restaurant.phone,
            image: restaurant.image,
            address: restaurant.address,
            category: restaurant.category,
            city_id: restaurant.city_id,
            created_at: restaurant.created_at,
            updated_at: restaurant.updated_at,
            city: city.map(|c| CityRef {
                id: c.id,
                name: c.name,
            }),
        }
    }
}

impl From<Restaurant> for RestaurantResponse {
    fn from(restaurant: Restaurant) -> Self {
        (restaurant, None).into()
    }
}

/// Identity fields embedded into order payloads.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantSummary {
    pub id: i32,
    pub name: String,
    pub phone: String,
}

impl From<Restaurant> for RestaurantSummary {
    fn from(restaurant: Restaurant) -> Self {
        RestaurantSummary {
            id: restaurant.id,
            name: restaurant.name,
            phone: restaurant.phone,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantListResponse {
    pub data: Vec<RestaurantResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryGroup {
    pub id: i32,
    pub category: String,
    pub restaurants: Vec<RestaurantResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryListResponse {
    pub data: Vec<CategoryGroup>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedRestaurantsResponse {
    pub data: Vec<RestaurantResponse>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub price: f64,
    pub restaurant_id: i32,
}

impl CreateMenuItemRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if !(self.price.is_finite() && self.price >= 0.0) {
            return Err(ApiError::BadRequest(
                "Price must be a non-negative amount".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<f64>,
}

impl UpdateMenuItemRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(price) = self.price {
            if !(price.is_finite() && price >= 0.0) {
                return Err(ApiError::BadRequest(
                    "Price must be a non-negative amount".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub price: String,
    pub restaurant_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(item: MenuItem) -> Self {
        MenuItemResponse {
            id: item.id,
            name: item.name,
            description: item.description,
            image: item.image,
            price: item.price.to_string(),
            restaurant_id: item.restaurant_id,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateOrderItemRequest {
    pub menu_id: i32,
    pub quantity: i32,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    pub address: String,
    pub driver_id: Option<i32>,
    pub payment_method: PaymentMethod,
    pub client_id: i32,
    pub delivery_method: DeliveryMethod,
    pub restaurant_id: i32,
    pub items: Vec<CreateOrderItemRequest>,
    pub status: Option<OrderStatus>,
    pub discount: Option<i32>,
    pub delivery_fee: Option<f64>,
    pub comment: Option<String>,
}

fn validate_items(items: &[CreateOrderItemRequest]) -> Result<(), ApiError> {
    for item in items {
        if item.quantity < 1 {
            return Err(ApiError::BadRequest(format!(
                "Quantity for menu item {} must be at least 1",
                item.menu_id
            )));
        }
    }
    Ok(())
}

fn validate_discount(discount: Option<i32>) -> Result<(), ApiError> {
    if let Some(discount) = discount {
        if !(0..=MAX_DISCOUNT_PERCENT).contains(&discount) {
            return Err(ApiError::BadRequest(
                "Discount must be between 0 and 100".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_delivery_fee(delivery_fee: Option<f64>) -> Result<(), ApiError> {
    if let Some(fee) = delivery_fee {
        if !(fee.is_finite() && fee >= 0.0) {
            return Err(ApiError::BadRequest(
                "Delivery fee must be a non-negative amount".to_string(),
            ));
        }
    }
    Ok(())
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.items.is_empty() {
            return Err(ApiError::BadRequest(
                "Order must contain at least one item".to_string(),
            ));
        }
        validate_items(&self.items)?;
        validate_discount(self.discount)?;
        validate_delivery_fee(self.delivery_fee)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderRequest {
    pub address: Option<String>,
    pub status: Option<OrderStatus>,
    pub discount: Option<i32>,
    pub delivery_fee: Option<f64>,
    pub driver_id: Option<i32>,
    pub items: Option<Vec<CreateOrderItemRequest>>,
}

impl UpdateOrderRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(items) = &self.items {
            validate_items(items)?;
        }
        validate_discount(self.discount)?;
        validate_delivery_fee(self.delivery_fee)
    }

    /// An empty item list carries no replacement set and counts as absent.
    pub fn replacement_items(&self) -> Option<&[CreateOrderItemRequest]> {
        self.items.as_deref().filter(|items| !items.is_empty())
    }

    pub fn has_scalar_updates(&self) -> bool {
        self.address.is_some()
            || self.status.is_some()
            || self.discount.is_some()
            || self.delivery_fee.is_some()
            || self.driver_id.is_some()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: i32,
    pub address: String,
    pub status: OrderStatus,
    pub total_price: String,
    pub subtotal_price: String,
    pub is_deleted: bool,
    pub discount: i32,
    pub delivery_fee: String,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_method: DeliveryMethod,
    pub comment: Option<String>,
    pub estimated_delivery_time: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub restaurant_rating: Option<i32>,
    pub delivery_rating: Option<i32>,
    pub driver_id: Option<i32>,
    pub client_id: i32,
    pub restaurant_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderResponse {
    fn from(order: Order) -> Self {
        OrderResponse {
            id: order.id,
            address: order.address,
            status: order.status,
            total_price: order.total_price.to_string(),
            subtotal_price: order.subtotal_price.to_string(),
            is_deleted: order.is_deleted,
            discount: order.discount,
            delivery_fee: order.delivery_fee.to_string(),
            payment_method: order.payment_method,
            payment_status: order.payment_status,
            delivery_method: order.delivery_method,
            comment: order.comment,
            estimated_delivery_time: order.estimated_delivery_time,
            delivered_at: order.delivered_at,
            restaurant_rating: order.restaurant_rating,
            delivery_rating: order.delivery_rating,
            driver_id: order.driver_id,
            client_id: order.client_id,
            restaurant_id: order.restaurant_id,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemResponse {
    pub id: i32,
    pub order_id: i32,
    pub menu_id: i32,
    pub quantity: i32,
    pub price: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        OrderItemResponse {
            id: item.id,
            order_id: item.order_id,
            menu_id: item.menu_id,
            quantity: item.quantity,
            price: item.price.to_string(),
            notes: item.notes,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Order merged with its line items, as returned by create/update.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItemsResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub items: Vec<OrderItemResponse>,
}

impl OrderWithItemsResponse {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        OrderWithItemsResponse {
            order: order.into(),
            items: items.into_iter().map(Into::into).collect(),
        }
    }
}

/// Fully assembled order for `GET /orders/{id}`.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetailResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub client: Option<UserSummary>,
    pub restaurant: Option<RestaurantSummary>,
    pub driver: Option<UserSummary>,
    pub items: Vec<OrderItemResponse>,
}

/// Order joined with the client who placed it, for the restaurant listing.
#[derive(Debug, Serialize, ToSchema)]
pub struct RestaurantOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub client: Option<UserSummary>,
}

/// Order joined with client, restaurant and driver identity, for "my orders".
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientOrderResponse {
    #[serde(flatten)]
    pub order: OrderResponse,
    pub client: Option<UserSummary>,
    pub restaurant: Option<RestaurantSummary>,
    pub driver: Option<UserSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteOrderResponse {
    pub success: bool,
    pub message: String,
    pub deleted_order: OrderResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_create_request() -> CreateOrderRequest {
        CreateOrderRequest {
            address: "Chilonzor 5".to_string(),
            driver_id: None,
            payment_method: PaymentMethod::Cash,
            client_id: 1,
            delivery_method: DeliveryMethod::Delivery,
            restaurant_id: 1,
            items: vec![CreateOrderItemRequest {
                menu_id: 1,
                quantity: 2,
                notes: None,
            }],
            status: None,
            discount: None,
            delivery_fee: None,
            comment: None,
        }
    }

    #[test]
    fn create_request_deserializes_with_defaults() {
        let request: CreateOrderRequest = serde_json::from_str(
            r#"{
                "address": "Chilonzor 5",
                "payment_method": "cash",
                "client_id": 1,
                "delivery_method": "delivery",
                "restaurant_id": 2,
                "items": [{"menu_id": 3, "quantity": 1}]
            }"#,
        )
        .unwrap();
        assert!(request.driver_id.is_none());
        assert!(request.discount.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_empty_items() {
        let mut request = base_create_request();
        request.items.clear();
        let err = request.validate().unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn create_request_rejects_zero_quantity() {
        let mut request = base_create_request();
        request.items[0].quantity = 0;
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_request_rejects_out_of_range_discount() {
        let mut request = base_create_request();
        request.discount = Some(101);
        assert!(request.validate().is_err());
        request.discount = Some(-1);
        assert!(request.validate().is_err());
        request.discount = Some(100);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn create_request_rejects_negative_delivery_fee() {
        let mut request = base_create_request();
        request.delivery_fee = Some(-0.5);
        assert!(request.validate().is_err());
    }

    #[test]
    fn update_request_treats_empty_items_as_absent() {
        let request = UpdateOrderRequest {
            address: None,
            status: None,
            discount: None,
            delivery_fee: None,
            driver_id: None,
            items: Some(vec![]),
        };
        assert!(request.replacement_items().is_none());
        assert!(!request.has_scalar_updates());
    }

    #[test]
    fn money_fields_serialize_as_strings() {
        use chrono::Utc;

        let order = Order {
            id: 7,
            address: "Chilonzor 5".to_string(),
            status: OrderStatus::New,
            total_price: "23.00".parse().unwrap(),
            subtotal_price: "20.00".parse().unwrap(),
            is_deleted: false,
            discount: 10,
            delivery_fee: "5.00".parse().unwrap(),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            delivery_method: DeliveryMethod::Delivery,
            comment: None,
            estimated_delivery_time: None,
            delivered_at: None,
            restaurant_rating: None,
            delivery_rating: None,
            driver_id: None,
            client_id: 1,
            restaurant_id: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let value = serde_json::to_value(OrderResponse::from(order)).unwrap();
        assert_eq!(value["total_price"], "23.00");
        assert_eq!(value["subtotal_price"], "20.00");
        assert_eq!(value["status"], "new");
    }
}
