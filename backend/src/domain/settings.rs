//! Site Settings
//!
//! Portal-wide settings edited by administrators.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteSettings {
    pub site_name: String,
    pub support_email: Option<String>,
    pub support_phone: Option<String>,
    /// When set, booking is disabled portal-wide
    pub maintenance_mode: bool,
    /// Banner text shown on every page
    pub announcement: Option<String>,
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            site_name: "Government Services Portal".to_string(),
            support_email: None,
            support_phone: None,
            maintenance_mode: false,
            announcement: None,
        }
    }
}
