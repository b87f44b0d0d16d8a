//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has no storage dependencies beyond error conversion.

mod entity;
mod service;
mod booking_config;
mod settings;

pub use entity::{Entity, DomainError, DomainResult};
pub use service::{ServiceRecord, Pricing};
pub use booking_config::{BookingConfig, FormField, FieldType, DocumentRequirement};
pub use settings::SiteSettings;
