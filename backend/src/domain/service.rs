//! Service Entity
//!
//! One entry in the service catalog: either a category that groups
//! sub-services or a bookable leaf. Hierarchy is a single parent reference.

use serde::{Deserialize, Serialize};
use super::booking_config::BookingConfig;
use super::entity::Entity;

/// How a service is priced, derived from the nullable `price` column
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pricing {
    /// No price applies (categories, informational entries)
    NotApplicable,
    /// Explicitly free of charge
    Free,
    /// Paid service with the given amount
    Paid(f64),
}

/// A flat catalog record as stored by the data backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRecord {
    /// Unique identifier
    pub id: u32,
    /// Parent service ID (None = top level)
    #[serde(default)]
    pub parent_id: Option<u32>,
    /// Display label
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether a user may book this service directly
    #[serde(default)]
    pub is_bookable: bool,
    /// None = not applicable, 0 = free
    #[serde(default)]
    pub price: Option<f64>,
    /// Sort key among siblings
    #[serde(default)]
    pub display_order: i32,
    /// Eligible for homepage promotion
    #[serde(default)]
    pub is_featured: bool,
    /// Admin-configured booking form, opaque to the catalog tree
    #[serde(default)]
    pub booking_config: Option<BookingConfig>,
}

impl ServiceRecord {
    /// Create a new top-level service with default values
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            parent_id: None,
            name: name.into(),
            description: None,
            is_bookable: false,
            price: None,
            display_order: 0,
            is_featured: false,
            booking_config: None,
        }
    }

    /// Create a new service under a parent
    pub fn new_child(id: u32, name: impl Into<String>, parent_id: u32, display_order: i32) -> Self {
        Self {
            parent_id: Some(parent_id),
            display_order,
            ..Self::new(id, name)
        }
    }

    /// Check if this is a top-level service (no parent)
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn pricing(&self) -> Pricing {
        match self.price {
            None => Pricing::NotApplicable,
            Some(p) if p == 0.0 => Pricing::Free,
            Some(p) => Pricing::Paid(p),
        }
    }
}

impl Entity for ServiceRecord {
    type Id = u32;

    fn id(&self) -> Self::Id {
        self.id
    }
}
