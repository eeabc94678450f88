//! Cart pricing
//!
//! Pure pricing pass over the cart: client-supplied prices are ignored,
//! every amount comes from the catalog row fetched server-side.

use std::collections::HashMap;

use serde::Deserialize;
use thiserror::Error;

use crate::db::models::{OrderItem, Product};
use crate::utils::AppError;

/// Shipping fee rules, amounts in fils
#[derive(Debug, Clone, Copy)]
pub struct ShippingPolicy {
    pub free_threshold_fils: i64,
    pub base_fee_fils: i64,
}

impl ShippingPolicy {
    /// Free at or above the threshold
    pub fn fee_for(&self, subtotal_fils: i64) -> i64 {
        if subtotal_fils >= self.free_threshold_fils {
            0
        } else {
            self.base_fee_fils
        }
    }
}

impl Default for ShippingPolicy {
    fn default() -> Self {
        Self {
            free_threshold_fils: 15_000,
            base_fee_fils: 2_000,
        }
    }
}

/// Upper bound for a single line's quantity after merging duplicates.
/// Keeps hostile carts from overflowing the integer totals math.
pub const MAX_LINE_QTY: i64 = 1_000;

/// One raw cart line as submitted by the client. The product reference
/// is accepted under either key; qty survives strings and garbage.
#[derive(Debug, Clone, Deserialize)]
pub struct CartLine {
    #[serde(default, alias = "productId")]
    pub product: Option<String>,
    #[serde(default)]
    pub qty: Option<serde_json::Value>,
}

impl CartLine {
    /// Coerce qty to a sane integer: numbers and numeric strings pass
    /// through, anything else (or anything below 1) becomes 1.
    pub fn quantity(&self) -> i64 {
        let parsed = match &self.qty {
            Some(serde_json::Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().ok(),
            _ => None,
        };
        parsed.unwrap_or(1).max(1)
    }
}

/// Priced cart ready to be persisted as an order
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub items: Vec<OrderItem>,
    pub subtotal_in_fils: i64,
    pub shipping_in_fils: i64,
    pub total_in_fils: i64,
    pub currency: String,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart line is missing a product reference")]
    MissingProductRef,

    #[error("Product unavailable: {0}")]
    ProductUnavailable(String),

    #[error("Quantity for {0} exceeds the maximum of {MAX_LINE_QTY} per line")]
    QuantityTooLarge(String),

    #[error("Insufficient stock for {title}: {available} left, {requested} requested")]
    InsufficientStock {
        title: String,
        available: i64,
        requested: i64,
    },
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::EmptyCart
            | CheckoutError::MissingProductRef
            | CheckoutError::QuantityTooLarge(_) => AppError::validation(e.to_string()),
            CheckoutError::ProductUnavailable(_) | CheckoutError::InsufficientStock { .. } => {
                AppError::business_rule(e.to_string())
            }
        }
    }
}

/// Merge duplicate lines per product, keeping first-seen order
pub fn normalize_lines(lines: &[CartLine]) -> Result<Vec<(String, i64)>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let mut order: Vec<String> = Vec::new();
    let mut quantities: HashMap<String, i64> = HashMap::new();
    for line in lines {
        let id = line
            .product
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(CheckoutError::MissingProductRef)?;
        let entry = quantities.entry(id.to_string()).or_insert_with(|| {
            order.push(id.to_string());
            0
        });
        // Checked: two huge lines for the same product must not wrap
        // into a negative merged quantity
        *entry = entry
            .checked_add(line.quantity())
            .filter(|q| *q <= MAX_LINE_QTY)
            .ok_or_else(|| CheckoutError::QuantityTooLarge(id.to_string()))?;
    }
    Ok(order
        .into_iter()
        .map(|id| {
            let qty = quantities[&id];
            (id, qty)
        })
        .collect())
}

/// Price the normalized cart against the fetched catalog rows.
/// `catalog` is keyed by the "table:key" id string and holds only
/// sellable products; anything absent is treated as unavailable.
pub fn price_cart(
    catalog: &HashMap<String, Product>,
    lines: &[(String, i64)],
    policy: ShippingPolicy,
    default_currency: &str,
) -> Result<PricedCart, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let mut items = Vec::with_capacity(lines.len());
    let mut subtotal: i64 = 0;
    let mut currency: Option<String> = None;

    for (id, qty) in lines {
        let product = catalog
            .get(id)
            .ok_or_else(|| CheckoutError::ProductUnavailable(id.clone()))?;
        if product.stock < *qty {
            return Err(CheckoutError::InsufficientStock {
                title: product.title.clone(),
                available: product.stock,
                requested: *qty,
            });
        }

        let line_total = product
            .price_in_fils
            .checked_mul(*qty)
            .ok_or_else(|| CheckoutError::QuantityTooLarge(product.title.clone()))?;
        subtotal = subtotal
            .checked_add(line_total)
            .ok_or_else(|| CheckoutError::QuantityTooLarge(product.title.clone()))?;
        currency.get_or_insert_with(|| product.currency.clone());

        items.push(OrderItem {
            product: product
                .id
                .clone()
                .ok_or_else(|| CheckoutError::ProductUnavailable(id.clone()))?,
            title: product.title.clone(),
            unit_price_in_fils: product.price_in_fils,
            currency: product.currency.clone(),
            qty: *qty,
            line_total_in_fils: line_total,
            image_url: product.primary_image().map(|img| img.url.clone()),
        });
    }

    let shipping = policy.fee_for(subtotal);
    Ok(PricedCart {
        items,
        subtotal_in_fils: subtotal,
        shipping_in_fils: shipping,
        total_in_fils: subtotal + shipping,
        currency: currency.unwrap_or_else(|| default_currency.to_string()),
    })
}

impl PricedCart {
    /// Sanity check used when persisting: totals must re-derive from lines
    pub fn totals_consistent(&self) -> bool {
        let from_lines: i64 = self.items.iter().map(|i| i.line_total_in_fils).sum();
        from_lines == self.subtotal_in_fils
            && self.subtotal_in_fils + self.shipping_in_fils == self.total_in_fils
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{ProductStatus, Rating};
    use chrono::Utc;
    use surrealdb::RecordId;

    fn product(key: &str, price: i64, stock: i64) -> Product {
        Product {
            id: Some(RecordId::from_table_key("product", key)),
            title: format!("Product {key}"),
            slug: key.to_string(),
            description: String::new(),
            price_in_fils: price,
            compare_at_price_in_fils: None,
            currency: "KWD".into(),
            stock,
            status: ProductStatus::Active,
            images: vec![],
            category: None,
            rating: Rating::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn catalog(products: Vec<Product>) -> HashMap<String, Product> {
        products
            .into_iter()
            .map(|p| (p.id.as_ref().unwrap().to_string(), p))
            .collect()
    }

    fn line(id: &str, qty: serde_json::Value) -> CartLine {
        CartLine {
            product: Some(format!("product:{id}")),
            qty: Some(qty),
        }
    }

    #[test]
    fn qty_coercion_floors_at_one() {
        let l = CartLine {
            product: Some("product:a".into()),
            qty: None,
        };
        assert_eq!(l.quantity(), 1);
        assert_eq!(line("a", serde_json::json!(0)).quantity(), 1);
        assert_eq!(line("a", serde_json::json!(-3)).quantity(), 1);
        assert_eq!(line("a", serde_json::json!("4")).quantity(), 4);
        assert_eq!(line("a", serde_json::json!("junk")).quantity(), 1);
        assert_eq!(line("a", serde_json::json!(2.9)).quantity(), 2);
    }

    #[test]
    fn duplicate_lines_merge() {
        let lines = vec![
            line("a", serde_json::json!(2)),
            line("b", serde_json::json!(1)),
            line("a", serde_json::json!(3)),
        ];
        let normalized = normalize_lines(&lines).unwrap();
        assert_eq!(
            normalized,
            vec![("product:a".to_string(), 5), ("product:b".to_string(), 1)]
        );
    }

    #[test]
    fn merged_quantity_cannot_wrap_negative() {
        // Two maximal lines for the same product would overflow i64 if
        // summed unchecked and sail through every stock comparison as a
        // negative quantity
        let lines = vec![
            line("a", serde_json::json!(i64::MAX)),
            line("a", serde_json::json!(i64::MAX)),
        ];
        assert!(matches!(
            normalize_lines(&lines),
            Err(CheckoutError::QuantityTooLarge(_))
        ));
    }

    #[test]
    fn quantity_above_cap_rejected() {
        let lines = vec![line("a", serde_json::json!(MAX_LINE_QTY + 1))];
        assert!(matches!(
            normalize_lines(&lines),
            Err(CheckoutError::QuantityTooLarge(_))
        ));

        let at_cap = vec![line("a", serde_json::json!(MAX_LINE_QTY))];
        let normalized = normalize_lines(&at_cap).unwrap();
        assert_eq!(normalized, vec![("product:a".to_string(), MAX_LINE_QTY)]);
    }

    #[test]
    fn line_total_overflow_rejected() {
        let cat = catalog(vec![product("a", i64::MAX / 2, 1_000)]);
        let lines = vec![("product:a".to_string(), 1_000)];
        assert!(matches!(
            price_cart(&cat, &lines, ShippingPolicy::default(), "KWD"),
            Err(CheckoutError::QuantityTooLarge(_))
        ));
    }

    #[test]
    fn empty_cart_rejected() {
        assert!(matches!(
            normalize_lines(&[]),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn missing_product_ref_rejected() {
        let lines = vec![CartLine {
            product: None,
            qty: Some(serde_json::json!(1)),
        }];
        assert!(matches!(
            normalize_lines(&lines),
            Err(CheckoutError::MissingProductRef)
        ));
    }

    #[test]
    fn prices_come_from_catalog() {
        let cat = catalog(vec![product("a", 5_000, 10), product("b", 2_500, 10)]);
        let lines = vec![("product:a".to_string(), 2), ("product:b".to_string(), 1)];
        let cart = price_cart(&cat, &lines, ShippingPolicy::default(), "KWD").unwrap();
        assert_eq!(cart.subtotal_in_fils, 12_500);
        assert_eq!(cart.shipping_in_fils, 2_000);
        assert_eq!(cart.total_in_fils, 14_500);
        assert!(cart.totals_consistent());
    }

    #[test]
    fn shipping_free_at_threshold() {
        let cat = catalog(vec![product("a", 15_000, 10)]);
        let lines = vec![("product:a".to_string(), 1)];
        let cart = price_cart(&cat, &lines, ShippingPolicy::default(), "KWD").unwrap();
        assert_eq!(cart.shipping_in_fils, 0);
        assert_eq!(cart.total_in_fils, 15_000);
    }

    #[test]
    fn shipping_charged_one_fil_below_threshold() {
        let cat = catalog(vec![product("a", 14_999, 10)]);
        let lines = vec![("product:a".to_string(), 1)];
        let cart = price_cart(&cat, &lines, ShippingPolicy::default(), "KWD").unwrap();
        assert_eq!(cart.shipping_in_fils, 2_000);
        assert_eq!(cart.total_in_fils, 16_999);
    }

    #[test]
    fn unknown_product_is_unavailable() {
        let cat = catalog(vec![product("a", 5_000, 10)]);
        let lines = vec![("product:ghost".to_string(), 1)];
        assert!(matches!(
            price_cart(&cat, &lines, ShippingPolicy::default(), "KWD"),
            Err(CheckoutError::ProductUnavailable(_))
        ));
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let cat = catalog(vec![product("a", 5_000, 2)]);
        let lines = vec![("product:a".to_string(), 3)];
        match price_cart(&cat, &lines, ShippingPolicy::default(), "KWD") {
            Err(CheckoutError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }
    }
}
