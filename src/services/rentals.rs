//! Rental workflow service.
//!
//! Drives the rental state machine and the claimed units' statuses in
//! lockstep: creation claims, completion and cancellation release. Active
//! rentals report a live penalty against now so listings reflect real-time
//! overdue exposure without a background job.

use chrono::Utc;
use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, NewActivity},
        rental::{
            self, CreateRental, Rental, RentalQuery, RentalStatus, UpdateRental,
            UpdateRentalStatus,
        },
    },
    repository::{self, Repository},
};

use super::activity::ActivityService;

#[derive(Clone)]
pub struct RentalsService {
    repository: Repository,
    activity: ActivityService,
}

impl RentalsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    /// Create a rental: validates the request, computes the amount due, and
    /// claims every requested unit atomically. A pending rental already holds
    /// its assets out of the available pool.
    pub async fn create(&self, data: &CreateRental, actor: &str) -> AppResult<Rental> {
        data.validate()?;
        if data.end_date <= data.start_date {
            return Err(AppError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        if data.daily_rate.is_sign_negative() {
            return Err(AppError::Validation(
                "Daily rate must not be negative".to_string(),
            ));
        }

        let asset_ids = dedupe(&data.asset_unit_ids);
        let total_amount = rental::rental_amount(data.start_date, data.end_date, data.daily_rate);
        let penalty_rate = data.penalty_rate.unwrap_or_else(rental::default_penalty_rate);
        let rental_number = repository::next_rental_number();

        let created = self
            .repository
            .rentals
            .create(data, &asset_ids, &rental_number, total_amount, penalty_rate, actor)
            .await?;

        tracing::info!(
            "Rental {} created with {} asset units, total {}",
            created.rental_number,
            asset_ids.len(),
            created.total_amount
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Create,
                entity_type: "rental",
                entity_id: created.id,
                entity_name: created.rental_number.clone(),
                changes: Some(json!({
                    "new": {
                        "status": created.status.label(),
                        "assets": asset_ids,
                        "total_amount": created.total_amount,
                    }
                })),
            })
            .await;

        self.get_by_id(created.id).await
    }

    /// Drive a status transition. Completion freezes the penalty from the
    /// return date and releases the assets; cancellation just releases them.
    pub async fn update_status(
        &self,
        id: i32,
        data: &UpdateRentalStatus,
        actor: &str,
    ) -> AppResult<Rental> {
        let rental = self.repository.rentals.get_by_id(id).await?;

        if !rental.status.can_transition_to(data.status) {
            return Err(AppError::InvalidTransition(format!(
                "Rental {} cannot move from {} to {}",
                rental.rental_number,
                rental.status.label(),
                data.status.label()
            )));
        }

        let updated = match data.status {
            RentalStatus::Active => {
                self.repository
                    .rentals
                    .set_status(id, rental.status, RentalStatus::Active, data.notes.as_deref())
                    .await?
            }
            RentalStatus::Completed => {
                let returned_at = data.actual_return_date.unwrap_or_else(Utc::now);
                let penalty_rate = data.penalty_rate.unwrap_or(rental.penalty_rate);
                let penalty_amount = rental::late_penalty(
                    rental.end_date,
                    returned_at,
                    rental.daily_rate,
                    penalty_rate,
                );
                self.repository
                    .rentals
                    .complete(
                        id,
                        rental.status,
                        returned_at,
                        penalty_rate,
                        penalty_amount,
                        data.notes.as_deref(),
                    )
                    .await?
            }
            RentalStatus::Cancelled => {
                self.repository
                    .rentals
                    .cancel(id, rental.status, data.notes.as_deref())
                    .await?
            }
            // Unreachable behind can_transition_to; nothing transitions back
            RentalStatus::Pending => {
                return Err(AppError::InvalidTransition(
                    "No transition leads back to pending".to_string(),
                ))
            }
        };

        tracing::info!(
            "Rental {}: {} -> {}",
            updated.rental_number,
            rental.status.label(),
            updated.status.label()
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "rental",
                entity_id: updated.id,
                entity_name: updated.rental_number.clone(),
                changes: Some(json!({
                    "old": { "status": rental.status.label() },
                    "new": {
                        "status": updated.status.label(),
                        "penalty_amount": updated.penalty_amount,
                    },
                })),
            })
            .await;

        self.get_by_id(id).await
    }

    /// Edit a mutable rental. The amount due is recomputed when dates or rate
    /// change; an asset-set change releases removed units and claims added
    /// ones, committing only if the new claim fully succeeds.
    pub async fn update(&self, id: i32, data: &UpdateRental, actor: &str) -> AppResult<Rental> {
        data.validate()?;

        let rental = self.repository.rentals.get_by_id(id).await?;
        if !rental.status.is_mutable() {
            return Err(AppError::InvalidState(format!(
                "Rental {} is {} and cannot be edited",
                rental.rental_number,
                rental.status.label()
            )));
        }

        let mut merged = rental.clone();
        if let Some(ref name) = data.customer_name {
            merged.customer_name = name.clone();
        }
        if data.customer_email.is_some() {
            merged.customer_email = data.customer_email.clone();
        }
        if data.customer_phone.is_some() {
            merged.customer_phone = data.customer_phone.clone();
        }
        if let Some(start) = data.start_date {
            merged.start_date = start;
        }
        if let Some(end) = data.end_date {
            merged.end_date = end;
        }
        if let Some(rate) = data.daily_rate {
            merged.daily_rate = rate;
        }
        if let Some(deposit) = data.deposit {
            merged.deposit = deposit;
        }
        if data.notes.is_some() {
            merged.notes = data.notes.clone();
        }

        if merged.end_date <= merged.start_date {
            return Err(AppError::Validation(
                "End date must be after start date".to_string(),
            ));
        }
        merged.total_amount =
            rental::rental_amount(merged.start_date, merged.end_date, merged.daily_rate);

        let new_asset_ids = match &data.asset_unit_ids {
            Some(ids) => {
                let deduped = dedupe(ids);
                if deduped.is_empty() {
                    return Err(AppError::Validation(
                        "A rental must claim at least one asset unit".to_string(),
                    ));
                }
                Some(deduped)
            }
            None => None,
        };

        let updated = self
            .repository
            .rentals
            .update(&merged, rental.status, new_asset_ids.as_deref())
            .await?;

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "rental",
                entity_id: updated.id,
                entity_name: updated.rental_number.clone(),
                changes: Some(json!({
                    "old": { "total_amount": rental.total_amount },
                    "new": {
                        "total_amount": updated.total_amount,
                        "assets": new_asset_ids,
                    },
                })),
            })
            .await;

        self.get_by_id(id).await
    }

    /// Get a rental; an active one reports its live penalty against now
    pub async fn get_by_id(&self, id: i32) -> AppResult<Rental> {
        let mut rental = self.repository.rentals.get_by_id(id).await?;
        apply_live_penalty(&mut rental);
        Ok(rental)
    }

    /// List rentals; active ones report their live penalty against now,
    /// completed ones their frozen value
    pub async fn list(&self, query: &RentalQuery) -> AppResult<(Vec<Rental>, i64)> {
        let (mut rentals, total) = self.repository.rentals.list(query).await?;
        for rental in &mut rentals {
            apply_live_penalty(rental);
        }
        Ok((rentals, total))
    }
}

/// Overdue exposure of an active rental as of now; stored values are left
/// alone for every other status
fn apply_live_penalty(rental: &mut Rental) {
    if rental.status == RentalStatus::Active {
        rental.penalty_amount = rental::late_penalty(
            rental.end_date,
            Utc::now(),
            rental.daily_rate,
            rental.penalty_rate,
        );
    }
}

/// First-occurrence dedupe, preserving caller order
fn dedupe(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}
