pub mod app_config;
pub mod database;
pub mod catalog_repo;
pub mod booking_repo;
pub mod user_repo;

pub use database::DbClient;
pub use catalog_repo::StoreCatalogRepository;
pub use booking_repo::StoreBookingRepository;
pub use user_repo::StoreUserRepository;
