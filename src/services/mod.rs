//! Business logic services

pub mod activity;
pub mod assets;
pub mod products;
pub mod rentals;
pub mod sales;
pub mod stock;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub products: products::ProductsService,
    pub stock: stock::StockService,
    pub assets: assets::AssetsService,
    pub rentals: rentals::RentalsService,
    pub sales: sales::SalesService,
    pub activity: activity::ActivityService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository) -> Self {
        let activity = activity::ActivityService::new(repository.clone());
        Self {
            products: products::ProductsService::new(repository.clone(), activity.clone()),
            stock: stock::StockService::new(repository.clone(), activity.clone()),
            assets: assets::AssetsService::new(repository.clone(), activity.clone()),
            rentals: rentals::RentalsService::new(repository.clone(), activity.clone()),
            sales: sales::SalesService::new(repository, activity.clone()),
            activity,
        }
    }
}
