//! Sale workflow service.
//!
//! Availability is checked when a sale is created or edited, but stock is
//! only deducted when the sale completes (re-validated at commit time inside
//! one transaction). Cancelling a completed sale restores the quantities.

use rust_decimal::Decimal;
use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, NewActivity},
        product::ProductKind,
        sale::{
            self, CreateSale, Sale, SaleItemInput, SaleQuery, SaleStatus, UpdateSale,
            UpdateSaleStatus,
        },
    },
    repository::{self, Repository},
};

use super::activity::ActivityService;

#[derive(Clone)]
pub struct SalesService {
    repository: Repository,
    activity: ActivityService,
}

impl SalesService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    /// Per item: the product must be countable stock and the ledger must hold
    /// at least the requested quantity. Nothing is deducted here.
    async fn validate_items(&self, items: &[SaleItemInput]) -> AppResult<()> {
        for item in items {
            let product = self.repository.products.get_by_id(item.product_id).await?;
            if product.kind != ProductKind::Countable {
                return Err(AppError::InvalidProductKind(format!(
                    "Product '{}' is {}, not countable stock",
                    product.name,
                    product.kind.label()
                )));
            }
            if item.unit_price.is_sign_negative() {
                return Err(AppError::Validation(format!(
                    "Unit price for '{}' must not be negative",
                    product.name
                )));
            }

            let available = self
                .repository
                .stock
                .find(item.product_id)
                .await?
                .map(|entry| entry.quantity)
                .unwrap_or(0);
            if available < item.quantity {
                return Err(AppError::InsufficientStock(format!(
                    "Product '{}' has {} in stock, {} requested",
                    product.name, available, item.quantity
                )));
            }
        }
        Ok(())
    }

    /// Create a pending sale after validating every line item
    pub async fn create(&self, data: &CreateSale, actor: &str) -> AppResult<Sale> {
        data.validate()?;
        self.validate_items(&data.items).await?;

        let totals = sale::sale_totals(
            &data.items,
            data.discount.unwrap_or(Decimal::ZERO),
            data.tax.unwrap_or(Decimal::ZERO),
        );
        let bill_number = repository::next_bill_number();

        let created = self
            .repository
            .sales
            .create(data, &totals, &bill_number, actor)
            .await?;

        tracing::info!(
            "Sale {} created with {} items, total {}",
            created.bill_number,
            data.items.len(),
            created.total_amount
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Create,
                entity_type: "sale",
                entity_id: created.id,
                entity_name: created.bill_number.clone(),
                changes: Some(json!({
                    "new": {
                        "status": created.status.label(),
                        "total_amount": created.total_amount,
                    }
                })),
            })
            .await;

        self.repository.sales.get_by_id(created.id).await
    }

    /// Edit a pending sale; replacement items are re-validated and the money
    /// columns recomputed
    pub async fn update(&self, id: i32, data: &UpdateSale, actor: &str) -> AppResult<Sale> {
        data.validate()?;

        let sale = self.repository.sales.get_by_id(id).await?;
        if sale.status != SaleStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Sale {} is {} and cannot be edited",
                sale.bill_number,
                sale.status.label()
            )));
        }

        let mut merged = sale.clone();
        if let Some(ref name) = data.customer_name {
            merged.customer_name = name.clone();
        }
        if data.customer_email.is_some() {
            merged.customer_email = data.customer_email.clone();
        }
        if data.customer_phone.is_some() {
            merged.customer_phone = data.customer_phone.clone();
        }
        if let Some(discount) = data.discount {
            merged.discount = discount;
        }
        if let Some(tax) = data.tax {
            merged.tax = tax;
        }
        if let Some(payment_status) = data.payment_status {
            merged.payment_status = payment_status;
        }
        if let Some(paid) = data.paid_amount {
            merged.paid_amount = paid;
        }
        if data.notes.is_some() {
            merged.notes = data.notes.clone();
        }

        let updated = match &data.items {
            Some(items) => {
                if items.is_empty() {
                    return Err(AppError::Validation(
                        "A sale must have at least one line item".to_string(),
                    ));
                }
                self.validate_items(items).await?;
                let totals = sale::sale_totals(items, merged.discount, merged.tax);
                merged.subtotal = totals.subtotal;
                merged.total_amount = totals.total_amount;
                self.repository
                    .sales
                    .update(&merged, Some((items.as_slice(), &totals.line_totals)))
                    .await?
            }
            None => {
                merged.total_amount = merged.subtotal - merged.discount + merged.tax;
                self.repository.sales.update(&merged, None).await?
            }
        };

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "sale",
                entity_id: updated.id,
                entity_name: updated.bill_number.clone(),
                changes: Some(json!({
                    "old": { "total_amount": sale.total_amount },
                    "new": { "total_amount": updated.total_amount },
                })),
            })
            .await;

        self.repository.sales.get_by_id(id).await
    }

    /// Drive a status transition. Completion deducts stock per item inside
    /// one transaction; cancelling a completed sale restores it.
    pub async fn update_status(
        &self,
        id: i32,
        data: &UpdateSaleStatus,
        actor: &str,
    ) -> AppResult<Sale> {
        let sale = self.repository.sales.get_by_id(id).await?;

        if !sale.status.can_transition_to(data.status) {
            return Err(AppError::InvalidTransition(format!(
                "Sale {} cannot move from {} to {}",
                sale.bill_number,
                sale.status.label(),
                data.status.label()
            )));
        }

        let updated = match data.status {
            SaleStatus::Completed => {
                self.repository
                    .sales
                    .complete(id, data.notes.as_deref(), actor)
                    .await?
            }
            SaleStatus::Cancelled => {
                self.repository
                    .sales
                    .cancel(id, sale.status, data.notes.as_deref(), actor)
                    .await?
            }
            // Unreachable behind can_transition_to; nothing transitions back
            SaleStatus::Pending => {
                return Err(AppError::InvalidTransition(
                    "No transition leads back to pending".to_string(),
                ))
            }
        };

        tracing::info!(
            "Sale {}: {} -> {}",
            updated.bill_number,
            sale.status.label(),
            updated.status.label()
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "sale",
                entity_id: updated.id,
                entity_name: updated.bill_number.clone(),
                changes: Some(json!({
                    "old": { "status": sale.status.label() },
                    "new": { "status": updated.status.label() },
                })),
            })
            .await;

        self.repository.sales.get_by_id(id).await
    }

    /// Delete a pending sale; completed and cancelled sales must be cancelled
    /// instead and are never deleted
    pub async fn delete(&self, id: i32, actor: &str) -> AppResult<()> {
        let sale = self.repository.sales.get_by_id(id).await?;
        self.repository.sales.delete(id).await?;

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Delete,
                entity_type: "sale",
                entity_id: sale.id,
                entity_name: sale.bill_number.clone(),
                changes: None,
            })
            .await;

        Ok(())
    }

    pub async fn get_by_id(&self, id: i32) -> AppResult<Sale> {
        self.repository.sales.get_by_id(id).await
    }

    pub async fn list(&self, query: &SaleQuery) -> AppResult<(Vec<Sale>, i64)> {
        self.repository.sales.list(query).await
    }
}
