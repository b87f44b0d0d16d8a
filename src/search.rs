//! Service Search
//!
//! Suggestion matching over the flattened catalog: case-insensitive
//! substring match on name and description, no ranking.

use crate::models::ServiceNode;
use crate::tree::flatten;

/// Shorter queries produce no suggestions
pub const MIN_QUERY_LEN: usize = 2;
/// Suggestions shown at most
pub const MAX_SUGGESTIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub min_query_len: usize,
    pub max_results: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_query_len: MIN_QUERY_LEN,
            max_results: MAX_SUGGESTIONS,
        }
    }
}

/// Case-insensitive substring check; `needle` must already be lowercase
fn contains_folded(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

pub fn matches(node: &ServiceNode, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    matches_folded(node, &needle)
}

fn matches_folded(node: &ServiceNode, needle: &str) -> bool {
    contains_folded(&node.service.name, needle)
        || node
            .service
            .description
            .as_deref()
            .map_or(false, |d| contains_folded(d, needle))
}

/// Filter already-flattened nodes, keeping their order
pub fn search<'a>(
    nodes: &[&'a ServiceNode],
    query: &str,
    options: &SearchOptions,
) -> Vec<&'a ServiceNode> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < options.min_query_len {
        return Vec::new();
    }

    nodes
        .iter()
        .copied()
        .filter(|node| matches_folded(node, &needle))
        .take(options.max_results)
        .collect()
}

/// Flatten the forest and search it
pub fn search_forest<'a>(
    forest: &'a [ServiceNode],
    query: &str,
    options: &SearchOptions,
) -> Vec<&'a ServiceNode> {
    search(&flatten(forest), query, options)
}
