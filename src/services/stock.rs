//! Stock ledger service

use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, NewActivity},
        product::{Product, ProductKind},
        stock::{AdjustStock, StockEntry, StockQuery, UpsertStock},
    },
    repository::Repository,
};

use super::activity::ActivityService;

#[derive(Clone)]
pub struct StockService {
    repository: Repository,
    activity: ActivityService,
}

impl StockService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    /// Resolve the product and require it to be of the countable-stock kind
    async fn countable_product(&self, product_id: i32) -> AppResult<Product> {
        let product = self.repository.products.get_by_id(product_id).await?;
        if product.kind != ProductKind::Countable {
            return Err(AppError::InvalidProductKind(format!(
                "Product '{}' is {}, not countable stock",
                product.name,
                product.kind.label()
            )));
        }
        Ok(product)
    }

    /// Create or overwrite the ledger entry for a product
    pub async fn upsert(
        &self,
        product_id: i32,
        data: &UpsertStock,
        actor: &str,
    ) -> AppResult<StockEntry> {
        data.validate()?;
        let product = self.countable_product(product_id).await?;

        let before = self.repository.stock.find(product_id).await?;
        let entry = self
            .repository
            .stock
            .upsert(product_id, data.quantity, data.min_quantity, actor)
            .await?;

        let action = if before.is_some() {
            ActivityAction::Update
        } else {
            ActivityAction::Create
        };
        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action,
                entity_type: "stock",
                entity_id: entry.id,
                entity_name: product.name.clone(),
                changes: Some(json!({
                    "old": before.as_ref().map(|b| json!({
                        "quantity": b.quantity, "min_quantity": b.min_quantity
                    })),
                    "new": { "quantity": entry.quantity, "min_quantity": entry.min_quantity },
                })),
            })
            .await;

        Ok(entry)
    }

    /// Apply a signed delta atomically; a result below zero is rejected in full
    pub async fn adjust(
        &self,
        product_id: i32,
        data: &AdjustStock,
        actor: &str,
    ) -> AppResult<StockEntry> {
        let before = self.repository.stock.get(product_id).await?;
        let entry = self
            .repository
            .stock
            .adjust(product_id, data.delta, actor)
            .await?;

        tracing::info!(
            "Stock of product {} adjusted by {} ({} -> {})",
            product_id,
            data.delta,
            before.quantity,
            entry.quantity
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "stock",
                entity_id: entry.id,
                entity_name: before
                    .product_name
                    .clone()
                    .unwrap_or_else(|| format!("product {}", product_id)),
                changes: Some(json!({
                    "old": { "quantity": before.quantity },
                    "new": { "quantity": entry.quantity },
                    "reason": data.reason,
                })),
            })
            .await;

        Ok(entry)
    }

    /// Get the ledger entry for a product
    pub async fn get(&self, product_id: i32) -> AppResult<StockEntry> {
        self.repository.stock.get(product_id).await
    }

    /// All entries at or below their minimum quantity, most urgent first
    pub async fn list_low_stock(&self) -> AppResult<Vec<StockEntry>> {
        self.repository.stock.list_low_stock().await
    }

    /// List entries with search and pagination
    pub async fn list(&self, query: &StockQuery) -> AppResult<(Vec<StockEntry>, i64)> {
        self.repository.stock.list(query).await
    }
}
