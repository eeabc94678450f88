//! Order Model
//!
//! Orders are immutable price snapshots: every item carries the unit price
//! and title it sold at, so later catalog edits never rewrite history.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::serde_helpers;

pub const ORDER_TABLE: &str = "order";

/// Order lifecycle state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Processing,
    Shipped,
    Completed,
    Fulfilled,
    Cancelled,
}

impl OrderStatus {
    /// Allowed transitions. Terminal states accept nothing.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Pending, Processing)
                | (Pending, Cancelled)
                | (Confirmed, Processing)
                | (Confirmed, Shipped)
                | (Confirmed, Cancelled)
                | (Processing, Shipped)
                | (Processing, Cancelled)
                | (Shipped, Completed)
                | (Shipped, Fulfilled)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OrderStatus::Completed | OrderStatus::Fulfilled | OrderStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Contact snapshot taken at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Normalized 8-digit local number
    pub phone: String,
}

/// Kuwaiti address block
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub area: String,
    pub block: String,
    pub street: String,
    #[serde(default)]
    pub avenue: Option<String>,
    pub house_no: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl ShippingAddress {
    /// Single-line form used on invoices and WhatsApp messages
    pub fn formatted(&self) -> String {
        let mut parts = vec![
            self.area.clone(),
            format!("Block {}", self.block),
            format!("Street {}", self.street),
        ];
        if let Some(avenue) = &self.avenue
            && !avenue.trim().is_empty()
        {
            parts.push(format!("Avenue {avenue}"));
        }
        parts.push(format!("House {}", self.house_no));
        parts.join(", ")
    }
}

/// One priced order line
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(with = "serde_helpers::record_id")]
    pub product: RecordId,
    pub title: String,
    pub unit_price_in_fils: i64,
    pub currency: String,
    pub qty: i64,
    pub line_total_in_fils: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Order model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(
        default,
        with = "serde_helpers::option_record_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<RecordId>,
    pub invoice_no: String,
    /// Record link to the account that placed the order; guest checkout
    /// leaves this unset.
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub user: Option<RecordId>,
    pub customer: Customer,
    pub shipping_address: ShippingAddress,
    pub items: Vec<OrderItem>,
    pub subtotal_in_fils: i64,
    pub shipping_in_fils: i64,
    pub total_in_fils: i64,
    pub currency: String,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_payment_method() -> String {
    "cod".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_moves_forward_or_cancels() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Processing));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Completed));
    }

    #[test]
    fn shipped_only_closes_out() {
        use OrderStatus::*;
        assert!(Shipped.can_transition_to(Completed));
        assert!(Shipped.can_transition_to(Fulfilled));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_accept_nothing() {
        use OrderStatus::*;
        for terminal in [Completed, Fulfilled, Cancelled] {
            assert!(terminal.is_terminal());
            for next in [
                Pending, Confirmed, Processing, Shipped, Completed, Fulfilled, Cancelled,
            ] {
                assert!(!terminal.can_transition_to(next));
            }
        }
    }

    #[test]
    fn no_self_transitions() {
        use OrderStatus::*;
        for s in [
            Pending, Confirmed, Processing, Shipped, Completed, Fulfilled, Cancelled,
        ] {
            assert!(!s.can_transition_to(s));
        }
    }

    #[test]
    fn address_formats_one_line() {
        let addr = ShippingAddress {
            area: "Salmiya".into(),
            block: "4".into(),
            street: "12".into(),
            avenue: Some("3".into()),
            house_no: "25".into(),
            note: None,
        };
        assert_eq!(
            addr.formatted(),
            "Salmiya, Block 4, Street 12, Avenue 3, House 25"
        );

        let no_avenue = ShippingAddress {
            avenue: None,
            ..addr
        };
        assert_eq!(
            no_avenue.formatted(),
            "Salmiya, Block 4, Street 12, House 25"
        );
    }
}
