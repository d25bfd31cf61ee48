pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod service;

pub use config::AppConfig;
pub use db::{create_pool, MemoryRepository, PgRepository, Repository};
pub use error::ImportError;
pub use service::Importer;
