//! Invoice arithmetic for the order flow.
//!
//! Prices are snapshotted from the menu at pricing time; an order item keeps
//! the price it was sold at even if the menu row changes later.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, RoundingMode};

use crate::api::CreateOrderItemRequest;
use crate::errors::ApiError;
use crate::models::MenuItem;

/// An order line with its price captured from the current menu.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedItem {
    pub menu_id: i32,
    pub quantity: i32,
    pub price: BigDecimal,
    pub notes: Option<String>,
}

/// Converts a JSON number into a 2-scale money amount.
pub fn money_from_f64(value: f64, field: &str) -> Result<BigDecimal, ApiError> {
    BigDecimal::try_from(value)
        .map(|v| v.with_scale_round(2, RoundingMode::HalfUp))
        .map_err(|_| ApiError::BadRequest(format!("Invalid {field}")))
}

/// Resolves every requested line against the fetched menu rows, snapshotting
/// the current price. Any missing menu id fails the whole batch.
pub fn price_items(
    items: &[CreateOrderItemRequest],
    menu_rows: &[MenuItem],
) -> Result<Vec<PricedItem>, ApiError> {
    let by_id: HashMap<i32, &MenuItem> = menu_rows.iter().map(|m| (m.id, m)).collect();

    items
        .iter()
        .map(|item| {
            let menu_item = by_id.get(&item.menu_id).ok_or_else(|| {
                ApiError::NotFound(format!("Menu item with ID {} not found", item.menu_id))
            })?;
            Ok(PricedItem {
                menu_id: item.menu_id,
                quantity: item.quantity,
                price: menu_item.price.clone(),
                notes: item.notes.clone(),
            })
        })
        .collect()
}

pub fn subtotal(items: &[PricedItem]) -> BigDecimal {
    items
        .iter()
        .map(|i| &i.price * BigDecimal::from(i.quantity))
        .sum()
}

/// `total = subtotal - subtotal*discount/100 + delivery_fee`, with the
/// discount amount rounded half-up to 2 places.
pub fn total(subtotal: &BigDecimal, discount: i32, delivery_fee: &BigDecimal) -> BigDecimal {
    let discount_amount = (subtotal * BigDecimal::from(discount) / BigDecimal::from(100))
        .with_scale_round(2, RoundingMode::HalfUp);
    subtotal - discount_amount + delivery_fee
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn menu_row(id: i32, price: &str) -> MenuItem {
        MenuItem {
            id,
            name: format!("Item {id}"),
            description: None,
            image: "item.png".to_string(),
            price: dec(price),
            restaurant_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn requested(menu_id: i32, quantity: i32) -> CreateOrderItemRequest {
        CreateOrderItemRequest {
            menu_id,
            quantity,
            notes: None,
        }
    }

    #[test]
    fn subtotal_sums_quantity_times_price() {
        let items = vec![
            PricedItem {
                menu_id: 1,
                quantity: 2,
                price: dec("10.00"),
                notes: None,
            },
            PricedItem {
                menu_id: 2,
                quantity: 3,
                price: dec("4.50"),
                notes: None,
            },
        ];
        assert_eq!(subtotal(&items), dec("33.50"));
    }

    #[test]
    fn total_applies_discount_then_delivery_fee() {
        // 2 x 10.00 with 10% discount and a 5.00 fee -> 20.00 - 2.00 + 5.00
        let items = vec![PricedItem {
            menu_id: 1,
            quantity: 2,
            price: dec("10.00"),
            notes: None,
        }];
        let sub = subtotal(&items);
        assert_eq!(sub, dec("20.00"));
        assert_eq!(total(&sub, 10, &dec("5.00")), dec("23.00"));
    }

    #[test]
    fn zero_discount_and_fee_leave_subtotal_unchanged() {
        let sub = dec("41.97");
        assert_eq!(total(&sub, 0, &dec("0")), dec("41.97"));
    }

    #[test]
    fn discount_amount_rounds_to_cents() {
        // 3% of 10.45 is 0.3135, rounded half-up to 0.31
        let sub = dec("10.45");
        assert_eq!(total(&sub, 3, &dec("0")), dec("10.14"));
    }

    #[test]
    fn full_discount_leaves_only_delivery_fee() {
        let sub = dec("18.00");
        assert_eq!(total(&sub, 100, &dec("3.50")), dec("3.50"));
    }

    #[test]
    fn price_items_snapshots_current_menu_prices() {
        let menu = vec![menu_row(1, "10.00"), menu_row(2, "7.25")];
        let priced = price_items(&[requested(1, 2), requested(2, 1)], &menu).unwrap();
        assert_eq!(priced[0].price, dec("10.00"));
        assert_eq!(priced[1].price, dec("7.25"));
    }

    #[test]
    fn price_items_fails_on_any_missing_menu_id() {
        let menu = vec![menu_row(1, "10.00")];
        let err = price_items(&[requested(1, 1), requested(42, 1)], &menu).unwrap_err();
        match err {
            ApiError::NotFound(msg) => assert!(msg.contains("42")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn money_from_f64_normalizes_float_noise() {
        assert_eq!(money_from_f64(0.1, "delivery fee").unwrap(), dec("0.10"));
        assert_eq!(money_from_f64(5.0, "delivery fee").unwrap(), dec("5.00"));
        assert!(money_from_f64(f64::NAN, "delivery fee").is_err());
    }
}
