//! Sale transaction model, totals computation, and state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Sale lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum SaleStatus {
    Pending = 0,
    Completed = 1,
    Cancelled = 2,
}

impl SaleStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaleStatus::Pending => "pending",
            SaleStatus::Completed => "completed",
            SaleStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the state machine permits moving from `self` to `to`.
    /// Stock is deducted on pending->completed and restored on
    /// completed->cancelled; `Cancelled` is terminal.
    pub fn can_transition_to(self, to: SaleStatus) -> bool {
        matches!(
            (self, to),
            (SaleStatus::Pending, SaleStatus::Completed)
                | (SaleStatus::Pending, SaleStatus::Cancelled)
                | (SaleStatus::Completed, SaleStatus::Cancelled)
        )
    }
}

/// Payment status carried on the transaction; no lifecycle coupling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum PaymentStatus {
    Pending = 0,
    Paid = 1,
    Partial = 2,
}

/// Sale transaction model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Sale {
    pub id: i32,
    pub bill_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub tax: Decimal,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub paid_amount: Decimal,
    pub status: SaleStatus,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Line items, populated via join-at-read
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

/// Sale line item from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct SaleItem {
    pub id: i32,
    pub sale_id: i32,
    pub product_id: i32,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub line_total: Decimal,
    #[sqlx(default)]
    #[serde(default)]
    pub product_name: Option<String>,
}

/// Line item input
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SaleItemInput {
    pub product_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Computed money columns for a sale
pub struct SaleTotals {
    pub line_totals: Vec<Decimal>,
    pub subtotal: Decimal,
    pub total_amount: Decimal,
}

/// Computes line totals, the subtotal, and
/// `total = subtotal - discount + tax`.
pub fn sale_totals(items: &[SaleItemInput], discount: Decimal, tax: Decimal) -> SaleTotals {
    let line_totals: Vec<Decimal> = items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.unit_price)
        .collect();
    let subtotal: Decimal = line_totals.iter().copied().sum();
    SaleTotals {
        line_totals,
        subtotal,
        total_amount: subtotal - discount + tax,
    }
}

/// Create sale request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateSale {
    #[validate(length(min = 1, message = "Customer name must not be empty"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, message = "A sale must have at least one line item"))]
    #[validate(nested)]
    pub items: Vec<SaleItemInput>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub paid_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Update sale request; only pending sales accept edits
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateSale {
    pub customer_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Replacement line items; availability is re-validated
    #[validate(nested)]
    pub items: Option<Vec<SaleItemInput>>,
    pub discount: Option<Decimal>,
    pub tax: Option<Decimal>,
    pub payment_status: Option<PaymentStatus>,
    pub paid_amount: Option<Decimal>,
    pub notes: Option<String>,
}

/// Status transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateSaleStatus {
    pub status: SaleStatus,
    pub notes: Option<String>,
}

/// Sale query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct SaleQuery {
    pub status: Option<i16>,
    pub payment_status: Option<i16>,
    pub customer_name: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Substring match on bill number or customer name
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, unit_price: i64) -> SaleItemInput {
        SaleItemInput {
            product_id: 1,
            quantity,
            unit_price: Decimal::from(unit_price),
        }
    }

    #[test]
    fn totals_sum_lines_then_apply_discount_and_tax() {
        let items = vec![item(2, 50), item(3, 10)];
        let totals = sale_totals(&items, Decimal::from(20), Decimal::from(13));
        assert_eq!(totals.line_totals, vec![Decimal::from(100), Decimal::from(30)]);
        assert_eq!(totals.subtotal, Decimal::from(130));
        assert_eq!(totals.total_amount, Decimal::from(123));
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        use SaleStatus::*;
        assert!(Pending.can_transition_to(Completed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Completed.can_transition_to(Cancelled));

        assert!(!Completed.can_transition_to(Pending));
        assert!(!Completed.can_transition_to(Completed));
        for to in [Pending, Completed, Cancelled] {
            assert!(!Cancelled.can_transition_to(to));
        }
    }
}
