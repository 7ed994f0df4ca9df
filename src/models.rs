use std::io::Write;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::{
    deserialize::{self, FromSql, FromSqlRow},
    expression::AsExpression,
    pg::{Pg, PgValue},
    prelude::*,
    serialize::{self, IsNull, Output, ToSql},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::schema::{cities, menu, order_items, orders, restaurants, users};

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::UserRole)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Client,
    Driver,
    Admin,
    Restaurant,
    Chef,
}

impl ToSql<crate::schema::sql_types::UserRole, Pg> for UserRole {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            UserRole::Client => out.write_all(b"client")?,
            UserRole::Driver => out.write_all(b"driver")?,
            UserRole::Admin => out.write_all(b"admin")?,
            UserRole::Restaurant => out.write_all(b"restaurant")?,
            UserRole::Chef => out.write_all(b"chef")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::UserRole, Pg> for UserRole {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"client" => Ok(UserRole::Client),
            b"driver" => Ok(UserRole::Driver),
            b"admin" => Ok(UserRole::Admin),
            b"restaurant" => Ok(UserRole::Restaurant),
            b"chef" => Ok(UserRole::Chef),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client" => Ok(UserRole::Client),
            "driver" => Ok(UserRole::Driver),
            "admin" => Ok(UserRole::Admin),
            "restaurant" => Ok(UserRole::Restaurant),
            "chef" => Ok(UserRole::Chef),
            _ => Err(()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::RestaurantCategory)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantCategory {
    FastFood,
    MilliyTaom,
    Pizza,
    Burger,
}

impl RestaurantCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            RestaurantCategory::FastFood => "fast_food",
            RestaurantCategory::MilliyTaom => "milliy_taom",
            RestaurantCategory::Pizza => "pizza",
            RestaurantCategory::Burger => "burger",
        }
    }
}

impl ToSql<crate::schema::sql_types::RestaurantCategory, Pg> for RestaurantCategory {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        out.write_all(self.as_str().as_bytes())?;
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::RestaurantCategory, Pg> for RestaurantCategory {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"fast_food" => Ok(RestaurantCategory::FastFood),
            b"milliy_taom" => Ok(RestaurantCategory::MilliyTaom),
            b"pizza" => Ok(RestaurantCategory::Pizza),
            b"burger" => Ok(RestaurantCategory::Burger),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::OrderStatus)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    New,
    Confirmed,
    Preparing,
    ReadyForPickup,
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl ToSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            OrderStatus::New => out.write_all(b"new")?,
            OrderStatus::Confirmed => out.write_all(b"confirmed")?,
            OrderStatus::Preparing => out.write_all(b"preparing")?,
            OrderStatus::ReadyForPickup => out.write_all(b"ready_for_pickup")?,
            OrderStatus::OutForDelivery => out.write_all(b"out_for_delivery")?,
            OrderStatus::Delivered => out.write_all(b"delivered")?,
            OrderStatus::Cancelled => out.write_all(b"cancelled")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::OrderStatus, Pg> for OrderStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"new" => Ok(OrderStatus::New),
            b"confirmed" => Ok(OrderStatus::Confirmed),
            b"preparing" => Ok(OrderStatus::Preparing),
            b"ready_for_pickup" => Ok(OrderStatus::ReadyForPickup),
            b"out_for_delivery" => Ok(OrderStatus::OutForDelivery),
            b"delivered" => Ok(OrderStatus::Delivered),
            b"cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::PaymentMethod)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Online,
}

impl ToSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            PaymentMethod::Cash => out.write_all(b"cash")?,
            PaymentMethod::Card => out.write_all(b"card")?,
            PaymentMethod::Online => out.write_all(b"online")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::PaymentMethod, Pg> for PaymentMethod {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"cash" => Ok(PaymentMethod::Cash),
            b"card" => Ok(PaymentMethod::Card),
            b"online" => Ok(PaymentMethod::Online),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::PaymentStatus)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl ToSql<crate::schema::sql_types::PaymentStatus, Pg> for PaymentStatus {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            PaymentStatus::Pending => out.write_all(b"pending")?,
            PaymentStatus::Paid => out.write_all(b"paid")?,
            PaymentStatus::Failed => out.write_all(b"failed")?,
            PaymentStatus::Refunded => out.write_all(b"refunded")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::PaymentStatus, Pg> for PaymentStatus {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"pending" => Ok(PaymentStatus::Pending),
            b"paid" => Ok(PaymentStatus::Paid),
            b"failed" => Ok(PaymentStatus::Failed),
            b"refunded" => Ok(PaymentStatus::Refunded),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(
    FromSqlRow, AsExpression, Serialize, Deserialize, ToSchema, PartialEq, Copy, Clone, Debug,
)]
#[diesel(sql_type = crate::schema::sql_types::DeliveryMethod)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryMethod {
    Delivery,
    Pickup,
}

impl ToSql<crate::schema::sql_types::DeliveryMethod, Pg> for DeliveryMethod {
    fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
        match *self {
            DeliveryMethod::Delivery => out.write_all(b"delivery")?,
            DeliveryMethod::Pickup => out.write_all(b"pickup")?,
        }
        Ok(IsNull::No)
    }
}

impl FromSql<crate::schema::sql_types::DeliveryMethod, Pg> for DeliveryMethod {
    fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
        match bytes.as_bytes() {
            b"delivery" => Ok(DeliveryMethod::Delivery),
            b"pickup" => Ok(DeliveryMethod::Pickup),
            _ => Err("Unrecognized enum variant".into()),
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = cities)]
pub struct City {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = cities)]
pub struct NewCity {
    pub name: String,
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = users)]
pub struct User {
    pub id: i32,
    pub name: Option<String>,
    pub phone: String,
    pub password: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub name: Option<String>,
    pub phone: String,
    pub address: Option<String>,
    pub role: UserRole,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = users)]
pub struct UserChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Option<UserRole>,
    pub telegram_id: Option<String>,
    pub city_id: Option<i32>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.role.is_none()
            && self.telegram_id.is_none()
            && self.city_id.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(City))]
#[diesel(table_name = restaurants)]
pub struct Restaurant {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub password: Option<String>,
    pub image: String,
    pub address: Option<String>,
    pub category: RestaurantCategory,
    pub city_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = restaurants)]
pub struct NewRestaurant {
    pub name: String,
    pub phone: String,
    pub image: String,
    pub address: Option<String>,
    pub category: RestaurantCategory,
    pub city_id: i32,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = restaurants)]
pub struct RestaurantChanges {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub image: Option<String>,
    pub address: Option<String>,
    pub category: Option<RestaurantCategory>,
    pub city_id: Option<i32>,
}

impl RestaurantChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.phone.is_none()
            && self.image.is_none()
            && self.address.is_none()
            && self.category.is_none()
            && self.city_id.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Restaurant))]
#[diesel(table_name = menu)]
pub struct MenuItem {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub price: BigDecimal,
    pub restaurant_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = menu)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub image: String,
    pub price: BigDecimal,
    pub restaurant_id: i32,
}

#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = menu)]
pub struct MenuItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<BigDecimal>,
}

impl MenuItemChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.image.is_none()
            && self.price.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, PartialEq)]
#[diesel(table_name = orders)]
pub struct Order {
    pub id: i32,
    pub address: String,
    pub status: OrderStatus,
    pub total_price: BigDecimal,
    pub subtotal_price: BigDecimal,
    pub is_deleted: bool,
    pub discount: i32,
    pub delivery_fee: BigDecimal,
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

#[derive(Insertable, Debug)]
#[diesel(table_name = orders)]
pub struct NewOrder {
    pub address: String,
    pub status: OrderStatus,
    pub total_price: BigDecimal,
    pub subtotal_price: BigDecimal,
    pub discount: i32,
    pub delivery_fee: BigDecimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_method: DeliveryMethod,
    pub comment: Option<String>,
    pub driver_id: Option<i32>,
    pub client_id: i32,
    pub restaurant_id: i32,
}

/// Scalar patch for an order. Totals are recomputed by the handler whenever
/// a pricing-relevant field changes, so they travel with the patch.
#[derive(AsChangeset, Debug, Default)]
#[diesel(table_name = orders)]
pub struct OrderChanges {
    pub address: Option<String>,
    pub status: Option<OrderStatus>,
    pub discount: Option<i32>,
    pub delivery_fee: Option<BigDecimal>,
    pub driver_id: Option<i32>,
    pub total_price: Option<BigDecimal>,
    pub subtotal_price: Option<BigDecimal>,
}

impl OrderChanges {
    pub fn is_empty(&self) -> bool {
        self.address.is_none()
            && self.status.is_none()
            && self.discount.is_none()
            && self.delivery_fee.is_none()
            && self.driver_id.is_none()
            && self.total_price.is_none()
            && self.subtotal_price.is_none()
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_items)]
pub struct OrderItem {
    pub id: i32,
    pub order_id: i32,
    pub menu_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = order_items)]
pub struct NewOrderItem {
    pub order_id: i32,
    pub menu_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_role_parses_wire_names() {
        assert_eq!("driver".parse::<UserRole>(), Ok(UserRole::Driver));
        assert_eq!("restaurant".parse::<UserRole>(), Ok(UserRole::Restaurant));
        assert!("superuser".parse::<UserRole>().is_err());
    }

    #[test]
    fn enums_serialize_as_snake_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::ReadyForPickup).unwrap(),
            "\"ready_for_pickup\""
        );
        assert_eq!(
            serde_json::to_string(&RestaurantCategory::MilliyTaom).unwrap(),
            "\"milliy_taom\""
        );
        assert_eq!(
            serde_json::to_string(&PaymentMethod::Cash).unwrap(),
            "\"cash\""
        );
    }

    #[test]
    fn enums_deserialize_from_snake_case() {
        let status: OrderStatus = serde_json::from_str("\"out_for_delivery\"").unwrap();
        assert_eq!(status, OrderStatus::OutForDelivery);
        assert!(serde_json::from_str::<OrderStatus>("\"on-way\"").is_err());
    }

    #[test]
    fn empty_changesets_are_detected() {
        assert!(OrderChanges::default().is_empty());
        assert!(!OrderChanges {
            discount: Some(5),
            ..Default::default()
        }
        .is_empty());
        assert!(UserChanges::default().is_empty());
        assert!(MenuItemChanges::default().is_empty());
    }
}
