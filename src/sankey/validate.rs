use super::SankeyData;
use std::collections::HashSet;

/// Developer-facing problems with a Sankey payload. Empty means valid.
pub fn validate_sankey(data: &SankeyData) -> Vec<String> {
    let mut errors = Vec::new();

    if data.nodes.is_empty() {
        errors.push("Sankey payload has no nodes".to_string());
    }

    let mut ids = HashSet::with_capacity(data.nodes.len());
    for (i, node) in data.nodes.iter().enumerate() {
        if node.id.is_empty() {
            errors.push(format!("Node {} has an empty id", i));
        } else if !ids.insert(node.id.as_str()) {
            errors.push(format!("Duplicate node id '{}'", node.id));
        }
    }

    for (i, link) in data.links.iter().enumerate() {
        if !ids.contains(link.source.as_str()) {
            errors.push(format!(
                "Link {} references unknown source '{}'",
                i, link.source
            ));
        }
        if !ids.contains(link.target.as_str()) {
            errors.push(format!(
                "Link {} references unknown target '{}'",
                i, link.target
            ));
        }
        if link.source == link.target {
            errors.push(format!("Link {} connects '{}' to itself", i, link.source));
        }
        if !(link.value.is_finite() && link.value > 0.0) {
            errors.push(format!(
                "Link {} ({} -> {}) has non-positive value {}",
                i, link.source, link.target, link.value
            ));
        }
    }

    errors
}
