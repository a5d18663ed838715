//! Rental transaction model, lifecycle math, and state machine

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::asset::AssetUnit;

/// Rental lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[repr(i16)]
pub enum RentalStatus {
    Pending = 0,
    Active = 1,
    Completed = 2,
    Cancelled = 3,
}

impl RentalStatus {
    pub fn label(self) -> &'static str {
        match self {
            RentalStatus::Pending => "pending",
            RentalStatus::Active => "active",
            RentalStatus::Completed => "completed",
            RentalStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the state machine permits moving from `self` to `to`.
    /// `Completed` and `Cancelled` are terminal.
    pub fn can_transition_to(self, to: RentalStatus) -> bool {
        matches!(
            (self, to),
            (RentalStatus::Pending, RentalStatus::Active)
                | (RentalStatus::Pending, RentalStatus::Cancelled)
                | (RentalStatus::Active, RentalStatus::Completed)
                | (RentalStatus::Active, RentalStatus::Cancelled)
        )
    }

    /// Mutable rentals may have their dates, rate, or asset set edited.
    pub fn is_mutable(self) -> bool {
        matches!(self, RentalStatus::Pending | RentalStatus::Active)
    }
}

/// Number of chargeable days between two instants: the ceiling of the span,
/// never negative. A span of zero or less charges nothing.
pub fn chargeable_days(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    let secs = (to - from).num_seconds();
    if secs <= 0 {
        return 0;
    }
    (secs + 86_399) / 86_400
}

/// Total amount due for a rental period.
pub fn rental_amount(start: DateTime<Utc>, end: DateTime<Utc>, daily_rate: Decimal) -> Decimal {
    Decimal::from(chargeable_days(start, end)) * daily_rate
}

/// Penalty for a late return: overdue days x daily rate x penalty multiplier.
/// Zero when the return is on or before the due date.
pub fn late_penalty(
    end: DateTime<Utc>,
    returned: DateTime<Utc>,
    daily_rate: Decimal,
    penalty_rate: Decimal,
) -> Decimal {
    Decimal::from(chargeable_days(end, returned)) * daily_rate * penalty_rate
}

/// Default penalty multiplier applied when neither the transaction nor the
/// completion request carries one.
pub fn default_penalty_rate() -> Decimal {
    Decimal::new(15, 1) // 1.5
}

/// Rental transaction model from database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Rental {
    pub id: i32,
    pub rental_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub daily_rate: Decimal,
    pub total_amount: Decimal,
    pub deposit: Decimal,
    pub penalty_rate: Decimal,
    pub penalty_amount: Decimal,
    pub status: RentalStatus,
    pub notes: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    // Claimed units, populated via rental_assets join-at-read
    #[sqlx(skip)]
    #[serde(default)]
    pub assets: Vec<AssetUnit>,
}

/// Create rental request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateRental {
    #[validate(length(min = 1, message = "Customer name must not be empty"))]
    pub customer_name: String,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    #[validate(length(min = 1, message = "A rental must claim at least one asset unit"))]
    pub asset_unit_ids: Vec<i32>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub daily_rate: Decimal,
    pub deposit: Option<Decimal>,
    pub penalty_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Update rental request; only mutable (pending/active) rentals accept edits
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRental {
    pub customer_name: Option<String>,
    #[validate(email(message = "Invalid email format"))]
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    /// Replacement asset set; removed units are released, added ones claimed
    pub asset_unit_ids: Option<Vec<i32>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub daily_rate: Option<Decimal>,
    pub deposit: Option<Decimal>,
    pub notes: Option<String>,
}

/// Status transition request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRentalStatus {
    pub status: RentalStatus,
    /// Return date for completion; defaults to now
    pub actual_return_date: Option<DateTime<Utc>>,
    /// Penalty multiplier override for completion
    pub penalty_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Rental query parameters
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct RentalQuery {
    pub status: Option<i16>,
    pub customer_email: Option<String>,
    /// Rentals whose period overlaps [from, to]
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    /// Substring match on rental number or customer name
    pub search: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn amount_charges_ceiling_of_day_span() {
        let rate = Decimal::from(200);
        assert_eq!(rental_amount(day(1), day(6), rate), Decimal::from(1000));
        // Half a day still charges a full day
        let half = day(1) + chrono::Duration::hours(12);
        assert_eq!(rental_amount(day(1), half, rate), Decimal::from(200));
    }

    #[test]
    fn amount_is_zero_for_empty_or_inverted_span() {
        let rate = Decimal::from(200);
        assert_eq!(rental_amount(day(5), day(5), rate), Decimal::ZERO);
        assert_eq!(rental_amount(day(5), day(1), rate), Decimal::ZERO);
    }

    #[test]
    fn penalty_charges_overdue_days_times_multiplier() {
        let rate = Decimal::from(100);
        let multiplier = default_penalty_rate();
        assert_eq!(
            late_penalty(day(10), day(13), rate, multiplier),
            Decimal::from(450)
        );
    }

    #[test]
    fn penalty_is_zero_on_time_or_early() {
        let rate = Decimal::from(100);
        let multiplier = default_penalty_rate();
        assert_eq!(late_penalty(day(10), day(10), rate, multiplier), Decimal::ZERO);
        assert_eq!(late_penalty(day(10), day(8), rate, multiplier), Decimal::ZERO);
    }

    #[test]
    fn transitions_follow_the_state_machine() {
        use RentalStatus::*;
        assert!(Pending.can_transition_to(Active));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Active.can_transition_to(Completed));
        assert!(Active.can_transition_to(Cancelled));

        assert!(!Pending.can_transition_to(Completed));
        assert!(!Active.can_transition_to(Pending));
    }

    #[test]
    fn terminal_states_admit_no_transition() {
        use RentalStatus::*;
        for to in [Pending, Active, Completed, Cancelled] {
            assert!(!Completed.can_transition_to(to));
            assert!(!Cancelled.can_transition_to(to));
        }
    }
}
