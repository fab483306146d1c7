//! i18next plural families and CLDR category mapping
//!
//! i18next stores the forms of a pluralized message as sibling keys named
//! `<stem>_<category>`:
//!
//! ```json
//! { "items_one": "{{count}} item", "items_other": "{{count}} items" }
//! ```
//!
//! Languages need different sets of forms. English uses `one` and `other`;
//! Russian uses `one`, `few`, `many` and `other`. When a family is translated
//! the output carries exactly the categories the target language requires:
//!
//! - a missing category is produced by translating the source `other` form
//!   (or the only form present) again, with the category passed to the
//!   backend as a hint
//! - a surplus category is dropped for that language
//!
//! The category sets come from a fixed CLDR cardinal table. Languages not in
//! the table get `one` and `other`.

use crate::content::KeyPath;
use crate::mt::flatten::TranslationUnit;
use crate::mt::translator::normalize_locale;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::debug;

/// CLDR plural category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        PluralCategory::Zero,
        PluralCategory::One,
        PluralCategory::Two,
        PluralCategory::Few,
        PluralCategory::Many,
        PluralCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PluralCategory::Zero => "zero",
            PluralCategory::One => "one",
            PluralCategory::Two => "two",
            PluralCategory::Few => "few",
            PluralCategory::Many => "many",
            PluralCategory::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PluralCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PluralCategory::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or(())
    }
}

use PluralCategory::{Few, Many, One, Other, Two, Zero};

const ONLY_OTHER: &[PluralCategory] = &[Other];
const ONE_OTHER: &[PluralCategory] = &[One, Other];
const ONE_MANY_OTHER: &[PluralCategory] = &[One, Many, Other];
const ONE_FEW_OTHER: &[PluralCategory] = &[One, Few, Other];
const ONE_TWO_OTHER: &[PluralCategory] = &[One, Two, Other];
const ZERO_ONE_OTHER: &[PluralCategory] = &[Zero, One, Other];
const ONE_FEW_MANY_OTHER: &[PluralCategory] = &[One, Few, Many, Other];
const ONE_TWO_FEW_OTHER: &[PluralCategory] = &[One, Two, Few, Other];
const ALL_SIX: &[PluralCategory] = &[Zero, One, Two, Few, Many, Other];

/// Categories for languages missing from the table
pub const DEFAULT_CATEGORIES: &[PluralCategory] = ONE_OTHER;

/// CLDR cardinal plural categories by language subtag
static PLURAL_TABLE: LazyLock<HashMap<&'static str, &'static [PluralCategory]>> =
    LazyLock::new(|| {
        let groups: [(&[&'static str], &'static [PluralCategory]); 9] = [
            (
                &["ja", "zh", "ko", "vi", "th", "id", "ms", "lo", "my", "yue"],
                ONLY_OTHER,
            ),
            (
                &[
                    "en", "de", "nl", "sv", "da", "nb", "nn", "no", "fi", "et", "el", "hu", "tr",
                    "bg", "hi", "bn", "ur", "sw", "ta", "te", "ml", "kn", "mr", "gu", "az", "ka",
                    "kk", "af", "sq", "eu", "gl", "is", "fa", "fil", "mk",
                ],
                ONE_OTHER,
            ),
            (&["es", "fr", "it", "pt", "ca"], ONE_MANY_OTHER),
            (&["ro", "hr", "sr", "bs"], ONE_FEW_OTHER),
            (&["he"], ONE_TWO_OTHER),
            (&["lv"], ZERO_ONE_OTHER),
            (&["ru", "uk", "be", "pl", "lt", "cs", "sk"], ONE_FEW_MANY_OTHER),
            (&["sl"], ONE_TWO_FEW_OTHER),
            (&["ar", "cy"], ALL_SIX),
        ];

        groups
            .into_iter()
            .flat_map(|(languages, categories)| {
                languages.iter().map(move |language| (*language, categories))
            })
            .collect()
    });

/// Required plural categories for a locale, in canonical order
pub fn required_categories(locale: &str) -> &'static [PluralCategory] {
    let language = normalize_locale(locale);
    PLURAL_TABLE
        .get(language.as_str())
        .copied()
        .unwrap_or(DEFAULT_CATEGORIES)
}

/// Whether the locale's language has its own table entry
pub fn is_known_locale(locale: &str) -> bool {
    PLURAL_TABLE.contains_key(normalize_locale(locale).as_str())
}

/// Split `items_one` into (`items`, One)
///
/// Returns `None` for keys without a category suffix, with an empty stem, or
/// with an i18next ordinal suffix (`place_ordinal_one`); ordinals follow
/// ordinal rules and are translated as ordinary keys.
pub fn split_plural_key(key: &str) -> Option<(&str, PluralCategory)> {
    let (stem, suffix) = key.rsplit_once('_')?;
    if stem.is_empty() || stem.ends_with("_ordinal") {
        return None;
    }
    let category = suffix.parse::<PluralCategory>().ok()?;
    Some((stem, category))
}

/// Key of the `<stem>_<category>` form
pub fn plural_key(stem: &str, category: PluralCategory) -> String {
    format!("{}_{}", stem, category)
}

/// Identity of a family: its parent object and stem
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FamilyKey {
    pub parent: KeyPath,
    pub stem: String,
}

impl FamilyKey {
    /// Key path of one form of this family
    pub fn form_path(&self, category: PluralCategory) -> KeyPath {
        self.parent.child_key(&plural_key(&self.stem, category))
    }
}

/// Sibling keys forming one pluralized message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluralFamily {
    pub key: FamilyKey,
    /// Translatable forms: category -> index into the unit list
    pub source_forms: BTreeMap<PluralCategory, usize>,
    /// Forms excluded by skip rules; copied verbatim, never regenerated
    pub skipped_forms: BTreeSet<PluralCategory>,
    /// Index of the first unit of the family in document order
    pub first_unit: usize,
}

impl PluralFamily {
    /// Unit used as the source for categories the family does not provide
    pub fn template_unit(&self) -> Option<usize> {
        self.source_forms
            .get(&Other)
            .or_else(|| self.source_forms.values().next())
            .copied()
    }
}

/// One form to produce for a target locale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetForm {
    pub category: PluralCategory,
    /// Unit whose text is translated for this form
    pub template: usize,
    /// The source family had no form of this category
    pub cloned: bool,
}

/// Plan for one family in one target locale
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FamilyExpansion {
    pub forms: Vec<TargetForm>,
    /// Translatable source categories the target locale does not use
    pub dropped: Vec<PluralCategory>,
}

/// Group plural-tagged units into families
///
/// Units sharing a parent path and stem form one family. Skipped key paths
/// that belong to a family are recorded in `skipped_forms`; a family made only
/// of skipped keys does not exist. Families are returned in document order of
/// their first unit.
pub fn group_families(units: &[TranslationUnit], skipped: &[KeyPath]) -> Vec<PluralFamily> {
    let mut families: BTreeMap<FamilyKey, PluralFamily> = BTreeMap::new();

    for (index, unit) in units.iter().enumerate() {
        let Some(category) = unit.plural_category else {
            continue;
        };
        let Some((stem, _)) = unit.key_path.last_key().and_then(split_plural_key) else {
            continue;
        };
        let key = FamilyKey {
            parent: unit.key_path.parent(),
            stem: stem.to_string(),
        };
        families
            .entry(key.clone())
            .or_insert_with(|| PluralFamily {
                key,
                source_forms: BTreeMap::new(),
                skipped_forms: BTreeSet::new(),
                first_unit: index,
            })
            .source_forms
            .insert(category, index);
    }

    for path in skipped {
        let Some((stem, category)) = path.last_key().and_then(split_plural_key) else {
            continue;
        };
        let key = FamilyKey {
            parent: path.parent(),
            stem: stem.to_string(),
        };
        if let Some(family) = families.get_mut(&key) {
            family.skipped_forms.insert(category);
        }
    }

    let mut families: Vec<PluralFamily> = families.into_values().collect();
    families.sort_by_key(|family| family.first_unit);
    families
}

/// Decide which forms a family gets in the target locale
pub fn expand(family: &PluralFamily, source_locale: &str, target_locale: &str) -> FamilyExpansion {
    let required = required_categories(target_locale);
    let Some(fallback) = family.template_unit() else {
        return FamilyExpansion {
            forms: Vec::new(),
            dropped: Vec::new(),
        };
    };

    let forms: Vec<TargetForm> = required
        .iter()
        .filter(|category| !family.skipped_forms.contains(*category))
        .map(|&category| match family.source_forms.get(&category) {
            Some(&template) => TargetForm {
                category,
                template,
                cloned: false,
            },
            None => TargetForm {
                category,
                template: fallback,
                cloned: true,
            },
        })
        .collect();

    let dropped: Vec<PluralCategory> = family
        .source_forms
        .keys()
        .filter(|category| !required.contains(category))
        .copied()
        .collect();

    debug!(
        "Plural family '{}' {} -> {}: {} forms ({} cloned), {} dropped",
        family.key.parent.child_key(&family.key.stem),
        source_locale,
        target_locale,
        forms.len(),
        forms.iter().filter(|f| f.cloned).count(),
        dropped.len()
    );

    FamilyExpansion { forms, dropped }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::flatten::{FlattenOptions, flatten};
    use crate::mt::path_matcher::SkipRules;
    use crate::content::ContentNode;
    use icu_locale::Locale;
    use icu_plurals::{PluralRuleType, PluralRules};
    use serde_json::json;

    fn units_for(value: serde_json::Value, rules: &SkipRules) -> (Vec<TranslationUnit>, Vec<KeyPath>) {
        let tree = ContentNode::from(value);
        let output = flatten(&tree, rules, FlattenOptions::default());
        (output.units, output.skipped)
    }

    fn categories(forms: &[TargetForm]) -> Vec<PluralCategory> {
        forms.iter().map(|f| f.category).collect()
    }

    #[test]
    fn test_split_plural_key() {
        assert_eq!(split_plural_key("items_one"), Some(("items", One)));
        assert_eq!(split_plural_key("items_other"), Some(("items", Other)));
        assert_eq!(split_plural_key("cart_items_few"), Some(("cart_items", Few)));
        assert_eq!(split_plural_key("items"), None);
        assert_eq!(split_plural_key("items_unknown"), None);
        assert_eq!(split_plural_key("_one"), None);
        assert_eq!(split_plural_key("items_One"), None);
        assert_eq!(split_plural_key("place_ordinal_one"), None);
    }

    #[test]
    fn test_required_categories() {
        assert_eq!(required_categories("en"), &[One, Other]);
        assert_eq!(required_categories("ru"), &[One, Few, Many, Other]);
        assert_eq!(required_categories("ar"), &[Zero, One, Two, Few, Many, Other]);
        assert_eq!(required_categories("ja"), &[Other]);
        assert_eq!(required_categories("pt-BR"), &[One, Many, Other]);
        assert_eq!(required_categories("en_GB"), &[One, Other]);
    }

    #[test]
    fn test_unknown_locale_defaults_to_one_other() {
        assert_eq!(required_categories("xx"), &[One, Other]);
        assert!(!is_known_locale("xx"));
        assert!(is_known_locale("ru-RU"));
    }

    #[test]
    fn test_group_families_by_parent_and_stem() {
        let (units, skipped) = units_for(
            json!({
                "items_one": "{{count}} item",
                "items_other": "{{count}} items",
                "cart": {"items_one": "one in cart", "items_other": "many in cart"},
                "title": "Title"
            }),
            &SkipRules::default(),
        );
        let families = group_families(&units, &skipped);

        assert_eq!(families.len(), 2);
        assert_eq!(families[0].key.parent, KeyPath::root());
        assert_eq!(families[0].key.stem, "items");
        assert_eq!(families[1].key.parent, KeyPath::root().child_key("cart"));
        assert_eq!(families[1].source_forms.len(), 2);
    }

    #[test]
    fn test_expand_to_russian_clones_other() {
        let (units, skipped) = units_for(
            json!({"items_one": "{{count}} item", "items_other": "{{count}} items"}),
            &SkipRules::default(),
        );
        let families = group_families(&units, &skipped);
        let expansion = expand(&families[0], "en", "ru");

        assert_eq!(categories(&expansion.forms), vec![One, Few, Many, Other]);
        assert!(expansion.dropped.is_empty());

        let other_unit = families[0].source_forms[&Other];
        let one_unit = families[0].source_forms[&One];
        assert_eq!(expansion.forms[0].template, one_unit);
        assert!(!expansion.forms[0].cloned);
        assert_eq!(expansion.forms[1].template, other_unit);
        assert!(expansion.forms[1].cloned);
        assert_eq!(expansion.forms[2].template, other_unit);
        assert!(!expansion.forms[3].cloned);
    }

    #[test]
    fn test_expand_contracts_to_japanese() {
        let (units, skipped) = units_for(
            json!({"items_one": "{{count}} item", "items_other": "{{count}} items"}),
            &SkipRules::default(),
        );
        let families = group_families(&units, &skipped);
        let expansion = expand(&families[0], "en", "ja");

        assert_eq!(categories(&expansion.forms), vec![Other]);
        assert_eq!(expansion.dropped, vec![One]);
    }

    #[test]
    fn test_expand_without_other_uses_single_form() {
        let (units, skipped) = units_for(json!({"files_one": "One file"}), &SkipRules::default());
        let families = group_families(&units, &skipped);
        let expansion = expand(&families[0], "en", "en");

        assert_eq!(categories(&expansion.forms), vec![One, Other]);
        assert_eq!(expansion.forms[1].template, families[0].source_forms[&One]);
        assert!(expansion.forms[1].cloned);
    }

    #[test]
    fn test_skipped_forms_are_not_regenerated() {
        let rules = SkipRules::new(&["items_one"], &[] as &[&str]).unwrap();
        let (units, skipped) = units_for(
            json!({"items_one": "{{count}} item", "items_other": "{{count}} items"}),
            &rules,
        );
        let families = group_families(&units, &skipped);
        assert_eq!(families.len(), 1);
        assert!(families[0].skipped_forms.contains(&One));

        let expansion = expand(&families[0], "en", "ru");
        assert_eq!(categories(&expansion.forms), vec![Few, Many, Other]);
    }

    #[test]
    fn test_fully_skipped_family_does_not_exist() {
        let rules = SkipRules::new(&[] as &[&str], &["*"]).unwrap();
        let (units, skipped) = units_for(
            json!({"items_one": "a", "items_other": "b"}),
            &rules,
        );
        assert!(units.is_empty());
        assert!(group_families(&units, &skipped).is_empty());
    }

    /// Categories ICU4X reaches with integer samples for a locale
    fn icu_integer_categories(locale: &str) -> Vec<PluralCategory> {
        let locale: Locale = locale.parse().unwrap();
        let rules = PluralRules::try_new(locale.into(), PluralRuleType::Cardinal.into()).unwrap();
        let samples: [u32; 24] = [
            0, 1, 2, 3, 4, 5, 6, 7, 10, 11, 12, 15, 20, 21, 22, 23, 25, 100, 101, 102, 103, 111,
            1000, 1_000_000,
        ];
        let mut found = BTreeSet::new();
        for n in samples {
            let category = match rules.category_for(n as usize) {
                icu_plurals::PluralCategory::Zero => Zero,
                icu_plurals::PluralCategory::One => One,
                icu_plurals::PluralCategory::Two => Two,
                icu_plurals::PluralCategory::Few => Few,
                icu_plurals::PluralCategory::Many => Many,
                icu_plurals::PluralCategory::Other => Other,
                #[allow(unreachable_patterns)]
                _ => Other,
            };
            found.insert(category);
        }
        found.into_iter().collect()
    }

    #[test]
    fn test_table_agrees_with_icu_cldr_data() {
        for (language, categories) in PLURAL_TABLE.iter() {
            for category in icu_integer_categories(language) {
                assert!(
                    categories.contains(&category),
                    "{}: ICU reports '{}' which the table lacks ({:?})",
                    language,
                    category,
                    categories
                );
            }
        }
    }
}
