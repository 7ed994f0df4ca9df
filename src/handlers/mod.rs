pub mod cities;
pub mod menu;
pub mod orders;
pub mod restaurants;
pub mod users;

// Re-export routers for easier importing
pub use cities::router as cities_router;
pub use menu::router as menu_router;
pub use orders::router as orders_router;
pub use restaurants::router as restaurants_router;
pub use users::router as users_router;

use utoipa::OpenApi;

use crate::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        cities::create_city,
        cities::list_cities,
        cities::get_city,
        cities::delete_city,
        users::create_user,
        users::list_users,
        users::list_restaurant_users,
        users::get_user_by_telegram,
        users::get_user,
        users::update_user,
        users::delete_user,
        restaurants::create_restaurant,
        restaurants::list_restaurants,
        restaurants::list_restaurants_by_category,
        restaurants::list_restaurants_by_city,
        restaurants::get_restaurant,
        restaurants::update_restaurant,
        restaurants::delete_restaurant,
        menu::create_menu_item,
        menu::list_menu_for_restaurant,
        menu::get_menu_item,
        menu::update_menu_item,
        menu::delete_menu_item,
        orders::create_order,
        orders::list_restaurant_orders,
        orders::list_client_orders,
        orders::get_order,
        orders::update_order,
        orders::delete_order,
    ),
    components(
        schemas(
            crate::api::CreateCityRequest,
            crate::api::CityResponse,
            crate::api::CityRelationsResponse,
            crate::api::CreateUserRequest,
            crate::api::UpdateUserRequest,
            crate::api::UserResponse,
            crate::api::UserSummary,
            crate::api::CreateRestaurantRequest,
            crate::api::UpdateRestaurantRequest,
            crate::api::RestaurantResponse,
            crate::api::RestaurantSummary,
            crate::api::RestaurantListResponse,
            crate::api::CategoryListResponse,
            crate::api::PaginatedRestaurantsResponse,
            crate::api::CreateMenuItemRequest,
            crate::api::UpdateMenuItemRequest,
            crate::api::MenuItemResponse,
            crate::api::CreateOrderRequest,
            crate::api::CreateOrderItemRequest,
            crate::api::UpdateOrderRequest,
            crate::api::OrderResponse,
            crate::api::OrderItemResponse,
            crate::api::OrderWithItemsResponse,
            crate::api::OrderDetailResponse,
            crate::api::RestaurantOrderResponse,
            crate::api::ClientOrderResponse,
            crate::api::DeleteOrderResponse,
            crate::api::ApiErrorResponse
        )
    ),
    tags(
        (name = "cities", description = "City management endpoints"),
        (name = "users", description = "User management endpoints"),
        (name = "restaurants", description = "Restaurant management endpoints"),
        (name = "menu", description = "Menu management endpoints"),
        (name = "orders", description = "Order management endpoints")
    ),
    info(
        title = "Dastarkhan Backend",
        description = "Food delivery backend for clients, drivers and restaurants",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;
