pub mod memory;
pub mod pool;
pub mod queries;
pub mod repository;

pub use memory::MemoryRepository;
pub use pool::create_pool;
pub use queries::PgRepository;
pub use repository::Repository;
