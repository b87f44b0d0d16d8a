//! Government Services Portal Core
//!
//! Builds the hierarchical service catalog from flat backend records and
//! provides navigation, search, cached stores and booking form handling
//! on top of it.

pub mod config;
pub mod context;
pub mod form_builder;
pub mod form_schema;
pub mod models;
pub mod search;
pub mod seed;
pub mod store;
pub mod tree;

pub use config::PortalConfig;
pub use context::AppContext;
pub use models::ServiceNode;
pub use tree::{build_tree, find_by_id, flatten, get_breadcrumbs};
