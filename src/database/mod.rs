pub mod manager;
pub mod models;
pub mod query;
pub mod record;
pub mod repository;

pub use manager::DatabaseError;
pub use record::{Record, RecordError};
pub use repository::{Repository, TenantOwned};
