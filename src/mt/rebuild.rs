//! Tree rebuilding: translated units back into the source shape
//!
//! The output mirrors the source tree: same key order, same list lengths,
//! same nesting. Plural families are the one place where the key set may
//! change: members the target locale keeps stay at their source position,
//! dropped members disappear, and added forms are slotted in next to the
//! kept member with the closest category.

use crate::content::{ContentNode, KeyPath};
use crate::mt::plural::{FamilyKey, PluralCategory, plural_key, split_plural_key};
use std::collections::{HashMap, HashSet};

/// Everything a rebuild needs for one target locale
#[derive(Debug, Clone, Default)]
pub struct TranslatedLeaves {
    /// Translated text of ordinary leaves, by key path
    pub leaves: HashMap<KeyPath, String>,
    /// Forms of each plural family for the target locale, canonical order
    pub families: HashMap<FamilyKey, Vec<(PluralCategory, String)>>,
}

impl TranslatedLeaves {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_leaf(&mut self, path: KeyPath, text: String) {
        self.leaves.insert(path, text);
    }

    pub fn insert_family(&mut self, key: FamilyKey, forms: Vec<(PluralCategory, String)>) {
        self.families.insert(key, forms);
    }
}

/// Rebuild `original` with translated text substituted
///
/// String leaves without a translation keep their source value; this covers
/// skipped and blank leaves. Non-string scalars are copied.
pub fn rebuild(original: &ContentNode, translated: &TranslatedLeaves) -> ContentNode {
    rebuild_node(original, &KeyPath::root(), translated)
}

fn rebuild_node(node: &ContentNode, path: &KeyPath, translated: &TranslatedLeaves) -> ContentNode {
    match node {
        ContentNode::Text(source) => ContentNode::Text(
            translated
                .leaves
                .get(path)
                .cloned()
                .unwrap_or_else(|| source.clone()),
        ),
        ContentNode::Literal(value) => ContentNode::Literal(value.clone()),
        ContentNode::List(items) => ContentNode::List(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| rebuild_node(item, &path.child_index(index), translated))
                .collect(),
        ),
        ContentNode::Map(entries) => rebuild_map(entries, path, translated),
    }
}

/// Where the forms a locale adds to a family go
#[derive(Default)]
struct Insertions {
    before: HashMap<usize, Vec<usize>>,
    after: HashMap<usize, Vec<usize>>,
}

/// Map entry index -> family and category of every plural member in `entries`
fn family_members<'a>(
    entries: &[(String, ContentNode)],
    path: &KeyPath,
    translated: &'a TranslatedLeaves,
) -> HashMap<usize, (&'a FamilyKey, PluralCategory)> {
    entries
        .iter()
        .enumerate()
        .filter_map(|(index, (key, value))| {
            let ContentNode::Text(_) = value else {
                return None;
            };
            let (stem, category) = split_plural_key(key)?;
            let family = FamilyKey {
                parent: path.clone(),
                stem: stem.to_string(),
            };
            let (family_key, _) = translated.families.get_key_value(&family)?;
            Some((index, (family_key, category)))
        })
        .collect()
}

fn rebuild_map(
    entries: &[(String, ContentNode)],
    path: &KeyPath,
    translated: &TranslatedLeaves,
) -> ContentNode {
    // Keys held by non-string siblings can never be taken by a plural form
    let occupied: HashSet<&str> = entries
        .iter()
        .filter(|(_, value)| !matches!(value, ContentNode::Text(_)))
        .map(|(key, _)| key.as_str())
        .collect();

    let members = family_members(entries, path, translated);

    // Forms a family gets that the source lacks are placed before the kept
    // member with the next higher category, else after the highest kept one.
    // Kept members stay where the source has them.
    let mut added: Vec<(String, String)> = Vec::new();
    let mut insertions = Insertions::default();
    let mut families: Vec<&FamilyKey> = members.values().map(|(family, _)| *family).collect();
    families.sort();
    families.dedup();

    for family_key in families {
        let forms = &translated.families[family_key];
        let mut own: Vec<(usize, PluralCategory)> = members
            .iter()
            .filter(|(_, (family, _))| *family == family_key)
            .map(|(index, (_, category))| (*index, *category))
            .collect();
        own.sort();
        let kept: Vec<(usize, PluralCategory)> = own
            .iter()
            .copied()
            .filter(|(_, category)| forms.iter().any(|(c, _)| c == category))
            .collect();
        let first_member = own.first().map(|(index, _)| *index).unwrap_or_default();

        for (category, text) in forms {
            if own.iter().any(|(_, c)| c == category) {
                continue;
            }
            let form_key = plural_key(&family_key.stem, *category);
            if occupied.contains(form_key.as_str()) {
                continue;
            }
            let slot = added.len();
            added.push((form_key, text.clone()));

            let next_higher = kept
                .iter()
                .filter(|(_, c)| c > category)
                .min_by_key(|(_, c)| *c);
            let highest = kept.iter().max_by_key(|(_, c)| *c);
            match (next_higher, highest) {
                (Some((index, _)), _) => insertions.before.entry(*index).or_default().push(slot),
                (None, Some((index, _))) => insertions.after.entry(*index).or_default().push(slot),
                (None, None) => insertions.before.entry(first_member).or_default().push(slot),
            }
        }
    }

    let mut output = Vec::with_capacity(entries.len() + added.len());
    let push_added = |output: &mut Vec<(String, ContentNode)>, slots: Option<&Vec<usize>>| {
        for &slot in slots.into_iter().flatten() {
            let (key, text) = &added[slot];
            output.push((key.clone(), ContentNode::Text(text.clone())));
        }
    };

    for (index, (key, value)) in entries.iter().enumerate() {
        push_added(&mut output, insertions.before.get(&index));
        match members.get(&index) {
            Some((family_key, category)) => {
                let text = translated.families[*family_key]
                    .iter()
                    .find(|(c, _)| c == category)
                    .map(|(_, text)| text);
                if let Some(text) = text {
                    output.push((key.clone(), ContentNode::Text(text.clone())));
                }
            }
            None => {
                let child = rebuild_node(value, &path.child_key(key), translated);
                output.push((key.clone(), child));
            }
        }
        push_added(&mut output, insertions.after.get(&index));
    }

    ContentNode::Map(output)
}
