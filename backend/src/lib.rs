//! Portal Backend
//!
//! Layered architecture:
//! - domain: Core entities and business rules
//! - repository: Data access abstractions and implementations
//!
//! The hosted data backend is reached only through the repository traits,
//! so the client core can run against SQLite or in-memory storage.

pub mod domain;
pub mod repository;

pub use domain::{DomainError, DomainResult, ServiceRecord, SiteSettings};
pub use repository::{init_db, DbState, Repository, SettingsSource};
