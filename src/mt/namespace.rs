//! i18next namespace detection
//!
//! A resource whose top-level values are all objects is treated as a bundle of
//! namespaces (`{"common": {...}, "checkout": {...}}`). Detection is for
//! reporting only; it does not change how the tree is translated.

use crate::content::{ContentNode, KeyPath};
use crate::mt::path_matcher::SkipRules;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceEntry {
    pub name: String,
    /// Translatable leaves under the namespace after skip rules
    pub key_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceInfo {
    pub detected: bool,
    pub namespaces: Vec<NamespaceEntry>,
}

/// Classify the top level of a tree
///
/// An empty object, a list, or a bare string is never namespaced.
pub fn detect_namespaces(tree: &ContentNode, rules: &SkipRules) -> NamespaceInfo {
    let ContentNode::Map(entries) = tree else {
        return NamespaceInfo::default();
    };
    if entries.is_empty() || !entries.iter().all(|(_, value)| value.is_map()) {
        return NamespaceInfo::default();
    }

    let namespaces = entries
        .iter()
        .map(|(name, value)| NamespaceEntry {
            name: name.clone(),
            key_count: count_included(value, &KeyPath::root().child_key(name), rules),
        })
        .collect();

    NamespaceInfo {
        detected: true,
        namespaces,
    }
}

fn count_included(node: &ContentNode, path: &KeyPath, rules: &SkipRules) -> usize {
    match node {
        ContentNode::Text(_) => usize::from(!rules.is_excluded(path)),
        ContentNode::Literal(_) => 0,
        ContentNode::List(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| count_included(item, &path.child_index(index), rules))
            .sum(),
        ContentNode::Map(entries) => entries
            .iter()
            .map(|(key, value)| count_included(value, &path.child_key(key), rules))
            .sum(),
    }
}
