//! Repository layer for database operations

pub mod activity;
pub mod assets;
pub mod products;
pub mod rentals;
pub mod sales;
pub mod stock;

use once_cell::sync::Lazy;
use snowflaked::sync::Generator;
use sqlx::{Pool, Postgres};

// Snowflake generators for time-derived unique transaction numbers.
// Distinct instance ids keep rental and bill sequences disjoint.
static RENTAL_NUMBERS: Lazy<Generator> = Lazy::new(|| Generator::new(1));
static BILL_NUMBERS: Lazy<Generator> = Lazy::new(|| Generator::new(2));

/// Next unique rental number, e.g. `RNT-7341992882716672`
pub(crate) fn next_rental_number() -> String {
    format!("RNT-{}", RENTAL_NUMBERS.generate::<u64>())
}

/// Next unique bill number, e.g. `BILL-7341992882720768`
pub(crate) fn next_bill_number() -> String {
    format!("BILL-{}", BILL_NUMBERS.generate::<u64>())
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub products: products::ProductsRepository,
    pub stock: stock::StockRepository,
    pub assets: assets::AssetsRepository,
    pub rentals: rentals::RentalsRepository,
    pub sales: sales::SalesRepository,
    pub activity: activity::ActivityRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        let stock = stock::StockRepository::new(pool.clone());
        let assets = assets::AssetsRepository::new(pool.clone());
        Self {
            products: products::ProductsRepository::new(pool.clone()),
            rentals: rentals::RentalsRepository::new(pool.clone(), assets.clone()),
            sales: sales::SalesRepository::new(pool.clone(), stock.clone()),
            activity: activity::ActivityRepository::new(pool.clone()),
            stock,
            assets,
            pool,
        }
    }
}
