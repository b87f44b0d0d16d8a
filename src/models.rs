//! Frontend Models
//!
//! The hierarchical view of the catalog built from backend records.

use serde::Serialize;

pub use portal_backend::domain::{
    BookingConfig, DocumentRequirement, FieldType, FormField, Pricing, ServiceRecord, SiteSettings,
};

/// A catalog record with its sub-services attached
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceNode {
    #[serde(flatten)]
    pub service: ServiceRecord,
    pub children: Vec<ServiceNode>,
}

impl ServiceNode {
    pub fn new(service: ServiceRecord, children: Vec<ServiceNode>) -> Self {
        Self { service, children }
    }

    pub fn id(&self) -> u32 {
        self.service.id
    }

    pub fn name(&self) -> &str {
        &self.service.name
    }

    /// No sub-services
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

impl Drop for ServiceNode {
    // Unlink descendants one level at a time so deep chains drop without recursion
    fn drop(&mut self) {
        let mut stack = std::mem::take(&mut self.children);
        while let Some(mut node) = stack.pop() {
            stack.append(&mut node.children);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_flat_record_with_nested_children() {
        let mut renewal = ServiceRecord::new_child(2, "Renewal", 1, 0);
        renewal.is_bookable = true;
        renewal.price = Some(25.0);
        let node = ServiceNode::new(
            ServiceRecord::new(1, "Passport"),
            vec![ServiceNode::new(renewal, Vec::new())],
        );

        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["id"], json!(1));
        assert_eq!(value["name"], json!("Passport"));
        assert!(value.get("service").is_none());

        let child = &value["children"][0];
        assert_eq!(child["parentId"], json!(1));
        assert_eq!(child["isBookable"], json!(true));
        assert_eq!(child["displayOrder"], json!(0));
        assert_eq!(child["price"], json!(25.0));
        assert_eq!(child["children"], json!([]));
    }

    #[test]
    fn test_drop_releases_whole_subtree() {
        let mut node = ServiceNode::new(ServiceRecord::new(3, "Leaf"), Vec::new());
        for id in (1..3).rev() {
            node = ServiceNode::new(ServiceRecord::new(id, "Level"), vec![node]);
        }
        assert_eq!(node.children[0].children[0].id(), 3);
        drop(node);
    }
}
