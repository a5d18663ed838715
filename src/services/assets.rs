//! Asset registry service

use serde_json::json;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        activity::{ActivityAction, NewActivity},
        asset::{
            AssetQuery, AssetStatus, AssetUnit, AvailableGroup, CreateAssetBatch, GroupedAsset,
            UpdateAssetStatus,
        },
        product::ProductKind,
    },
    repository::Repository,
};

use super::activity::ActivityService;

#[derive(Clone)]
pub struct AssetsService {
    repository: Repository,
    activity: ActivityService,
}

impl AssetsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    /// Intake a batch of `count` units sharing one asset code
    pub async fn create_batch(
        &self,
        data: &CreateAssetBatch,
        actor: &str,
    ) -> AppResult<Vec<AssetUnit>> {
        data.validate()?;

        let product = self.repository.products.get_by_id(data.product_id).await?;
        if product.kind != ProductKind::UnitTracked {
            return Err(AppError::InvalidProductKind(format!(
                "Product '{}' is {}, not unit-tracked",
                product.name,
                product.kind.label()
            )));
        }

        let status = data.status.unwrap_or(AssetStatus::Available);
        if status == AssetStatus::Rented {
            return Err(AppError::Validation(
                "Units cannot be created as rented; the rented status is driven by the rental workflow".to_string(),
            ));
        }

        let units = self
            .repository
            .assets
            .create_batch(
                data.product_id,
                &data.asset_code,
                data.count,
                status,
                data.notes.as_deref(),
            )
            .await?;

        tracing::info!(
            "Created {} asset units with code '{}' for product {}",
            units.len(),
            data.asset_code,
            data.product_id
        );

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Create,
                entity_type: "asset",
                entity_id: units.first().map(|u| u.id).unwrap_or_default(),
                entity_name: data.asset_code.clone(),
                changes: Some(json!({
                    "new": { "count": units.len(), "status": status.label() }
                })),
            })
            .await;

        Ok(units)
    }

    /// Direct status override for maintenance/damage marking. The rented
    /// status can only be entered through the rental workflow.
    pub async fn set_status(
        &self,
        id: i32,
        data: &UpdateAssetStatus,
        actor: &str,
    ) -> AppResult<AssetUnit> {
        if data.status == AssetStatus::Rented {
            return Err(AppError::Validation(
                "The rented status is driven by the rental workflow".to_string(),
            ));
        }

        let before = self.repository.assets.get_by_id(id).await?;
        let unit = self
            .repository
            .assets
            .set_status(id, data.status, data.notes.as_deref())
            .await?;

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Update,
                entity_type: "asset",
                entity_id: unit.id,
                entity_name: unit.asset_code.clone(),
                changes: Some(json!({
                    "old": { "status": before.status.label() },
                    "new": { "status": unit.status.label() },
                })),
            })
            .await;

        Ok(unit)
    }

    /// Delete a unit; rejected while it is out on a rental
    pub async fn delete(&self, id: i32, actor: &str) -> AppResult<()> {
        let unit = self.repository.assets.get_by_id(id).await?;
        self.repository.assets.delete(id).await?;

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Delete,
                entity_type: "asset",
                entity_id: unit.id,
                entity_name: unit.asset_code.clone(),
                changes: Some(json!({
                    "old": { "status": unit.status.label() }
                })),
            })
            .await;

        Ok(())
    }

    pub async fn get(&self, id: i32) -> AppResult<AssetUnit> {
        self.repository.assets.get_by_id(id).await
    }

    pub async fn list_grouped(&self, query: &AssetQuery) -> AppResult<(Vec<GroupedAsset>, i64)> {
        self.repository.assets.list_grouped(query).await
    }

    pub async fn list_available(&self, product_id: Option<i32>) -> AppResult<Vec<AssetUnit>> {
        self.repository.assets.list_available(product_id).await
    }

    pub async fn list_available_grouped(&self) -> AppResult<Vec<AvailableGroup>> {
        self.repository.assets.list_available_grouped().await
    }
}
