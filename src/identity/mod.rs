pub mod file_backend;
pub mod hashmap_backend;
pub mod identity_store;
pub mod record;
pub mod traits;
