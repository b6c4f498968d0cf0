//! Services module

mod collection_service;
mod crud_service;

pub use collection_service::CollectionService;
pub use crud_service::{CrudService, DEFAULT_BATCH_SIZE};
