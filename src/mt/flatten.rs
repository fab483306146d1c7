//! Tree flattening: content tree to ordered translation units
//!
//! The traversal is depth-first and follows document order, so the unit list
//! is stable for a given tree and can be zipped with backend output.

use crate::content::{ContentNode, KeyPath};
use crate::mt::path_matcher::SkipRules;
use crate::mt::placeholder::{Placeholder, mask};
use crate::mt::plural::{PluralCategory, split_plural_key};

/// A single translatable string leaf
///
/// # Example
///
/// ```ignore
/// TranslationUnit {
///     key_path: "cart.items_one",
///     source_text: "{{count}} item",
///     masked_text: "⟦0⟧ item",
///     placeholders: [Placeholder { marker: "⟦0⟧", original: "{{count}}" }],
///     plural_category: Some(One),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationUnit {
    pub key_path: KeyPath,
    pub source_text: String,
    /// Text sent to the backend; equals `source_text` when masking is off
    pub masked_text: String,
    pub placeholders: Vec<Placeholder>,
    /// Set when the last key carries a CLDR category suffix
    pub plural_category: Option<PluralCategory>,
}

impl TranslationUnit {
    /// Build a unit for a single string, masking it if asked to
    pub fn new(key_path: KeyPath, source_text: &str, mask_placeholders: bool) -> Self {
        let (masked_text, placeholders) = if mask_placeholders {
            let masked = mask(source_text);
            (masked.text, masked.placeholders)
        } else {
            (source_text.to_string(), Vec::new())
        };

        Self {
            key_path,
            source_text: source_text.to_string(),
            masked_text,
            placeholders,
            plural_category: None,
        }
    }

    /// Whether there is anything worth sending to a backend
    pub fn is_blank(&self) -> bool {
        self.source_text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlattenOptions {
    pub mask_placeholders: bool,
    pub detect_plurals: bool,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            mask_placeholders: true,
            detect_plurals: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenOutput {
    pub units: Vec<TranslationUnit>,
    /// String leaves excluded by skip rules, in document order
    pub skipped: Vec<KeyPath>,
}

/// Flatten a tree into translation units
///
/// Only string leaves produce units. Non-string scalars are neither units nor
/// skipped; rebuild copies them as they are.
pub fn flatten(tree: &ContentNode, rules: &SkipRules, options: FlattenOptions) -> FlattenOutput {
    let mut output = FlattenOutput::default();
    walk(tree, KeyPath::root(), rules, options, &mut output);
    output
}

fn walk(
    node: &ContentNode,
    path: KeyPath,
    rules: &SkipRules,
    options: FlattenOptions,
    output: &mut FlattenOutput,
) {
    match node {
        ContentNode::Text(text) => {
            if rules.is_excluded(&path) {
                output.skipped.push(path);
                return;
            }
            let plural_category = if options.detect_plurals {
                path.last_key()
                    .and_then(split_plural_key)
                    .map(|(_, category)| category)
            } else {
                None
            };
            let mut unit = TranslationUnit::new(path, text, options.mask_placeholders);
            unit.plural_category = plural_category;
            output.units.push(unit);
        }
        ContentNode::Literal(_) => {}
        ContentNode::List(items) => {
            for (index, item) in items.iter().enumerate() {
                walk(item, path.child_index(index), rules, options, output);
            }
        }
        ContentNode::Map(entries) => {
            for (key, value) in entries {
                walk(value, path.child_key(key), rules, options, output);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::plural::PluralCategory;
    use serde_json::json;

    fn paths(units: &[TranslationUnit]) -> Vec<String> {
        units.iter().map(|u| u.key_path.to_string()).collect()
    }

    #[test]
    fn test_depth_first_document_order() {
        let tree = ContentNode::from(json!({
            "b": "Bee",
            "a": {"z": "Zed", "y": ["one", "two"]},
            "c": "See"
        }));
        let output = flatten(&tree, &SkipRules::default(), FlattenOptions::default());
        assert_eq!(paths(&output.units), vec!["b", "a.z", "a.y.0", "a.y.1", "c"]);
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_literals_are_not_units() {
        let tree = ContentNode::from(json!({"count": 3, "enabled": true, "label": "Label"}));
        let output = flatten(&tree, &SkipRules::default(), FlattenOptions::default());
        assert_eq!(paths(&output.units), vec!["label"]);
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_skipped_leaves_recorded() {
        let rules = SkipRules::new(&["brand"], &["states.*"]).unwrap();
        let tree = ContentNode::from(json!({
            "brand": "Acme",
            "states": {"CA": "California", "NY": "New York"},
            "title": "Welcome"
        }));
        let output = flatten(&tree, &rules, FlattenOptions::default());
        assert_eq!(paths(&output.units), vec!["title"]);
        let skipped: Vec<String> = output.skipped.iter().map(ToString::to_string).collect();
        assert_eq!(skipped, vec!["brand", "states.CA", "states.NY"]);
    }

    #[test]
    fn test_units_are_masked() {
        let tree = ContentNode::from(json!({"greeting": "Hello, {{name}}!"}));
        let output = flatten(&tree, &SkipRules::default(), FlattenOptions::default());
        let unit = &output.units[0];
        assert_eq!(unit.source_text, "Hello, {{name}}!");
        assert_eq!(unit.masked_text, "Hello, ⟦0⟧!");
        assert_eq!(unit.placeholders.len(), 1);
    }

    #[test]
    fn test_masking_can_be_disabled() {
        let tree = ContentNode::from(json!({"greeting": "Hello, {{name}}!"}));
        let options = FlattenOptions {
            mask_placeholders: false,
            ..FlattenOptions::default()
        };
        let output = flatten(&tree, &SkipRules::default(), options);
        assert_eq!(output.units[0].masked_text, "Hello, {{name}}!");
        assert!(output.units[0].placeholders.is_empty());
    }

    #[test]
    fn test_plural_tags() {
        let tree = ContentNode::from(json!({
            "items_one": "{{count}} item",
            "items_other": "{{count}} items",
            "rank_ordinal_one": "{{count}}st",
            "title": "Cart"
        }));
        let output = flatten(&tree, &SkipRules::default(), FlattenOptions::default());
        let tags: Vec<Option<PluralCategory>> =
            output.units.iter().map(|u| u.plural_category).collect();
        assert_eq!(
            tags,
            vec![Some(PluralCategory::One), Some(PluralCategory::Other), None, None]
        );

        let options = FlattenOptions {
            detect_plurals: false,
            ..FlattenOptions::default()
        };
        let output = flatten(&tree, &SkipRules::default(), options);
        assert!(output.units.iter().all(|u| u.plural_category.is_none()));
    }

    #[test]
    fn test_list_elements_never_plural() {
        let tree = ContentNode::from(json!({"items_one": ["a", "b"]}));
        let output = flatten(&tree, &SkipRules::default(), FlattenOptions::default());
        assert!(output.units.iter().all(|u| u.plural_category.is_none()));
    }

    #[test]
    fn test_blank_units() {
        let unit = TranslationUnit::new(KeyPath::root().child_index(0), "   ", true);
        assert!(unit.is_blank());
        assert!(!TranslationUnit::new(KeyPath::root(), "x", true).is_blank());
    }
}
