//! Catalog Tree
//!
//! Builds the service forest from flat parent-referencing records and
//! navigates it. Everything here is pure and never fails: bad parent
//! references degrade to top-level nodes instead of hiding services.

use log::{debug, warn};
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::models::{ServiceNode, ServiceRecord};

/// Records waiting for their parent, keyed by parent id, tagged with input position
type Pending = HashMap<u32, Vec<(usize, ServiceRecord)>>;

/// Build the forest, preserving input order among siblings and roots.
///
/// Records whose parent is absent from `records` are promoted to the top
/// level. When an id repeats, the last record carrying it wins.
pub fn build_tree(records: Vec<ServiceRecord>) -> Vec<ServiceNode> {
    // Pass 1: id -> position of the record that owns it
    let owner: HashMap<u32, usize> = records
        .iter()
        .enumerate()
        .map(|(index, record)| (record.id, index))
        .collect();

    // Pass 2: file every record under its parent or at the top level
    let mut roots = Vec::new();
    let mut pending: Pending = HashMap::new();
    for (index, record) in records.into_iter().enumerate() {
        if owner.get(&record.id) != Some(&index) {
            warn!("Duplicate service id {}, keeping the later record", record.id);
            continue;
        }
        match record.parent_id {
            None => roots.push(record),
            Some(parent) if parent == record.id => {
                warn!("Service {} is its own parent, shown at top level", record.id);
                roots.push(record);
            }
            Some(parent) if owner.contains_key(&parent) => {
                pending.entry(parent).or_default().push((index, record));
            }
            Some(parent) => {
                debug!(
                    "Service {} references missing parent {}, shown at top level",
                    record.id, parent
                );
                roots.push(record);
            }
        }
    }

    let mut forest = Vec::with_capacity(roots.len());
    for record in roots {
        attach(record, &mut pending, &mut forest);
    }

    // Anything left is on a parent cycle and unreachable from a root
    while let Some(record) = take_stranded(&mut pending) {
        warn!("Service {} is part of a parent cycle, shown at top level", record.id);
        attach(record, &mut pending, &mut forest);
    }

    forest
}

/// Build the forest and order it for presentation
pub fn build_sorted_tree(records: Vec<ServiceRecord>) -> Vec<ServiceNode> {
    let mut forest = build_tree(records);
    sort_forest(&mut forest);
    forest
}

/// Sort roots and every children list by (display_order, name). Stable.
pub fn sort_forest(forest: &mut [ServiceNode]) {
    let mut stack = vec![forest];
    while let Some(nodes) = stack.pop() {
        nodes.sort_by(|a, b| catalog_order(&a.service, &b.service));
        for node in nodes {
            stack.push(&mut node.children[..]);
        }
    }
}

fn catalog_order(a: &ServiceRecord, b: &ServiceRecord) -> Ordering {
    a.display_order
        .cmp(&b.display_order)
        .then_with(|| a.name.cmp(&b.name))
}

/// A node under construction: children still waiting plus those already built
struct Frame {
    service: ServiceRecord,
    waiting: std::vec::IntoIter<(usize, ServiceRecord)>,
    children: Vec<ServiceNode>,
}

impl Frame {
    fn open(service: ServiceRecord, pending: &mut Pending) -> Self {
        let waiting = pending.remove(&service.id).unwrap_or_default().into_iter();
        Self {
            service,
            waiting,
            children: Vec::new(),
        }
    }
}

/// Build the subtree under `service` depth-first with an explicit stack and
/// push it onto `out`
fn attach(service: ServiceRecord, pending: &mut Pending, out: &mut Vec<ServiceNode>) {
    let mut stack = vec![Frame::open(service, pending)];
    while let Some(top) = stack.last_mut() {
        if let Some((_, child)) = top.waiting.next() {
            let frame = Frame::open(child, pending);
            stack.push(frame);
            continue;
        }
        if let Some(done) = stack.pop() {
            let node = ServiceNode::new(done.service, done.children);
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => out.push(node),
            }
        }
    }
}

/// Remove the pending record that came first in the input
fn take_stranded(pending: &mut Pending) -> Option<ServiceRecord> {
    let (_, parent, slot) = pending
        .iter()
        .flat_map(|(parent, siblings)| {
            siblings
                .iter()
                .enumerate()
                .map(move |(slot, (index, _))| (*index, *parent, slot))
        })
        .min()?;

    let siblings = pending.get_mut(&parent)?;
    let (_, record) = siblings.remove(slot);
    if siblings.is_empty() {
        pending.remove(&parent);
    }
    Some(record)
}

/// Depth-first search; `None` means the service does not exist
pub fn find_by_id(forest: &[ServiceNode], id: u32) -> Option<&ServiceNode> {
    let mut stack: Vec<&ServiceNode> = forest.iter().rev().collect();
    while let Some(node) = stack.pop() {
        if node.id() == id {
            return Some(node);
        }
        stack.extend(node.children.iter().rev());
    }
    None
}

/// Path from the top-level ancestor down to `id`, inclusive. Empty if not found.
pub fn get_breadcrumbs(forest: &[ServiceNode], id: u32) -> Vec<&ServiceNode> {
    // Every visited node with the index of its parent in `visited`
    let mut visited: Vec<(&ServiceNode, Option<usize>)> = Vec::new();
    let mut stack: Vec<(&ServiceNode, Option<usize>)> =
        forest.iter().rev().map(|node| (node, None)).collect();

    while let Some((node, parent)) = stack.pop() {
        let index = visited.len();
        visited.push((node, parent));

        if node.id() == id {
            let mut path = Vec::new();
            let mut cursor = Some(index);
            while let Some(i) = cursor {
                let (ancestor, up) = visited[i];
                path.push(ancestor);
                cursor = up;
            }
            path.reverse();
            return path;
        }

        stack.extend(node.children.iter().rev().map(|child| (child, Some(index))));
    }
    Vec::new()
}

/// Every node once, pre-order: parents before children, siblings in forest order
pub fn flatten(forest: &[ServiceNode]) -> Vec<&ServiceNode> {
    flatten_with_depth(forest)
        .into_iter()
        .map(|(node, _)| node)
        .collect()
}

/// Pre-order nodes paired with their depth (0 = top level)
pub fn flatten_with_depth(forest: &[ServiceNode]) -> Vec<(&ServiceNode, usize)> {
    let mut result = Vec::new();
    let mut stack: Vec<(&ServiceNode, usize)> =
        forest.iter().rev().map(|node| (node, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        result.push((node, depth));
        stack.extend(node.children.iter().rev().map(|child| (child, depth + 1)));
    }
    result
}

/// Featured services at any depth, in pre-order
pub fn featured_services(forest: &[ServiceNode]) -> Vec<&ServiceNode> {
    flatten(forest)
        .into_iter()
        .filter(|node| node.service.is_featured)
        .collect()
}
