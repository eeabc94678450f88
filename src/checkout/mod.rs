//! Checkout pipeline
//!
//! validate -> fetch active products -> price -> reserve stock -> persist.
//! Stock reservation happens before the order row exists; any later
//! failure releases the reservation so a rejected request leaves nothing
//! behind.

pub mod dispatcher;
pub mod invoice;
pub mod pricing;

use std::collections::HashMap;

use serde::Deserialize;
use surrealdb::RecordId;
use tracing::warn;

use crate::db::DbService;
use crate::db::models::{Customer, Order, OrderStatus, ShippingAddress};
use crate::db::repository::{OrderRepository, ProductRepository, RepoError};
use crate::utils::validation::{
    MAX_ADDRESS_LEN, MAX_NAME_LEN, MAX_NOTE_LEN, is_valid_email, validate_optional_text,
    validate_phone, validate_required_text,
};
use crate::utils::{AppError, AppResult};

pub use pricing::{CartLine, CheckoutError, PricedCart, ShippingPolicy};

/// Checkout request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub items: Vec<CartLine>,
    pub customer: CustomerInput,
    pub shipping_address: AddressInput,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInput {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    pub area: String,
    pub block: String,
    pub street: String,
    #[serde(default)]
    pub avenue: Option<String>,
    pub house_no: String,
    #[serde(default)]
    pub note: Option<String>,
}

fn validate_customer(input: &CustomerInput) -> AppResult<Customer> {
    validate_required_text(&input.name, "customer.name", MAX_NAME_LEN)?;
    let phone = validate_phone(&input.phone)?;
    let email = match &input.email {
        Some(e) if !e.trim().is_empty() => {
            let e = e.trim().to_lowercase();
            if !is_valid_email(&e) {
                return Err(AppError::validation("customer.email is not a valid email"));
            }
            Some(e)
        }
        _ => None,
    };
    Ok(Customer {
        name: input.name.trim().to_string(),
        email,
        phone,
    })
}

fn validate_address(input: &AddressInput) -> AppResult<ShippingAddress> {
    validate_required_text(&input.area, "shippingAddress.area", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.block, "shippingAddress.block", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.street, "shippingAddress.street", MAX_ADDRESS_LEN)?;
    validate_required_text(&input.house_no, "shippingAddress.houseNo", MAX_ADDRESS_LEN)?;
    validate_optional_text(&input.avenue, "shippingAddress.avenue", MAX_ADDRESS_LEN)?;
    validate_optional_text(&input.note, "shippingAddress.note", MAX_NOTE_LEN)?;
    Ok(ShippingAddress {
        area: input.area.trim().to_string(),
        block: input.block.trim().to_string(),
        street: input.street.trim().to_string(),
        avenue: input.avenue.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
        house_no: input.house_no.trim().to_string(),
        note: input.note.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(String::from),
    })
}

/// Release already-reserved lines after a downstream failure
async fn release_reserved(products: &ProductRepository, reserved: &[(RecordId, i64)]) {
    for (id, qty) in reserved {
        if let Err(e) = products.restock(id, *qty).await {
            warn!(product = %id, qty, error = %e, "Failed to release reserved stock");
        }
    }
}

/// Run the full checkout pipeline and persist the order.
/// `user` links the order to an account when the caller is logged in.
pub async fn place_order(
    db: &DbService,
    policy: ShippingPolicy,
    default_currency: &str,
    user: Option<RecordId>,
    req: CheckoutRequest,
) -> AppResult<Order> {
    let customer = validate_customer(&req.customer)?;
    let address = validate_address(&req.shipping_address)?;

    // Normalize lines, resolving client id strings to record ids
    let raw_lines = pricing::normalize_lines(&req.items).map_err(AppError::from)?;
    let mut lines: Vec<(RecordId, i64)> = Vec::with_capacity(raw_lines.len());
    for (id, qty) in raw_lines {
        let record_id = crate::db::repository::parse_record_id("product", &id)
            .map_err(|_| CheckoutError::ProductUnavailable(id.clone()))
            .map_err(AppError::from)?;
        lines.push((record_id, qty));
    }

    let products = ProductRepository::new(db.db().clone());
    let orders = OrderRepository::new(db.db().clone());

    // Batch fetch; inactive and unknown products simply do not come back
    let ids: Vec<RecordId> = lines.iter().map(|(id, _)| id.clone()).collect();
    let fetched = products.find_active_by_ids(ids).await?;
    let catalog: HashMap<String, crate::db::models::Product> = fetched
        .into_iter()
        .filter_map(|p| p.id.as_ref().map(|id| (id.to_string(), p.clone())))
        .collect();

    let string_lines: Vec<(String, i64)> = lines
        .iter()
        .map(|(id, qty)| (id.to_string(), *qty))
        .collect();
    let cart = pricing::price_cart(&catalog, &string_lines, policy, default_currency)
        .map_err(AppError::from)?;

    // Reserve stock line by line; back out everything on the first miss.
    // The conditional decrement is what actually prevents oversell, the
    // earlier stock check only produces a friendlier early error.
    let mut reserved: Vec<(RecordId, i64)> = Vec::with_capacity(lines.len());
    for (id, qty) in &lines {
        match products.try_decrement_stock(id, *qty).await {
            Ok(true) => reserved.push((id.clone(), *qty)),
            Ok(false) => {
                release_reserved(&products, &reserved).await;
                let title = catalog
                    .get(&id.to_string())
                    .map(|p| p.title.clone())
                    .unwrap_or_else(|| id.to_string());
                return Err(AppError::business_rule(format!(
                    "Insufficient stock for {title}"
                )));
            }
            Err(e) => {
                release_reserved(&products, &reserved).await;
                return Err(e.into());
            }
        }
    }

    let now = chrono::Utc::now();
    let build_order = |invoice_no: String| Order {
        id: None,
        invoice_no,
        user: user.clone(),
        customer: customer.clone(),
        shipping_address: address.clone(),
        items: cart.items.clone(),
        subtotal_in_fils: cart.subtotal_in_fils,
        shipping_in_fils: cart.shipping_in_fils,
        total_in_fils: cart.total_in_fils,
        currency: cart.currency.clone(),
        payment_method: req
            .payment_method
            .clone()
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| "cod".to_string()),
        paid: false,
        status: OrderStatus::Pending,
        created_at: now,
        updated_at: now,
    };

    // One regeneration on an invoice number collision, then give up
    let order = match orders.create(build_order(invoice::generate_invoice_no())).await {
        Ok(order) => order,
        Err(RepoError::Duplicate(_)) => {
            match orders.create(build_order(invoice::generate_invoice_no())).await {
                Ok(order) => order,
                Err(e) => {
                    release_reserved(&products, &reserved).await;
                    return Err(e.into());
                }
            }
        }
        Err(e) => {
            release_reserved(&products, &reserved).await;
            return Err(e.into());
        }
    };

    Ok(order)
}
