//! Product catalog service

use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        activity::{ActivityAction, NewActivity},
        product::{CreateProduct, Product, ProductQuery},
    },
    repository::Repository,
};

use super::activity::ActivityService;

#[derive(Clone)]
pub struct ProductsService {
    repository: Repository,
    activity: ActivityService,
}

impl ProductsService {
    pub fn new(repository: Repository, activity: ActivityService) -> Self {
        Self { repository, activity }
    }

    pub async fn get(&self, id: i32) -> AppResult<Product> {
        self.repository.products.get_by_id(id).await
    }

    pub async fn create(&self, data: &CreateProduct, actor: &str) -> AppResult<Product> {
        data.validate()?;
        let product = self.repository.products.create(data).await?;

        self.activity
            .record(NewActivity {
                actor: actor.to_string(),
                action: ActivityAction::Create,
                entity_type: "product",
                entity_id: product.id,
                entity_name: product.name.clone(),
                changes: Some(serde_json::json!({
                    "new": { "sku": product.sku, "kind": product.kind.label() }
                })),
            })
            .await;

        Ok(product)
    }

    pub async fn list(&self, query: &ProductQuery) -> AppResult<(Vec<Product>, i64)> {
        self.repository.products.list(query).await
    }
}
