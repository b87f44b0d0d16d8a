//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod db;
mod service_repo;
mod settings_repo;
mod memory_repo;


pub use traits::{Repository, SettingsSource};
pub use db::{init_db, DbState, SharedConnection};
pub use service_repo::ServiceRepository;
pub use settings_repo::SettingsRepository;
pub use memory_repo::MemoryServiceRepository;
