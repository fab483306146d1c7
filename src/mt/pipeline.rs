//! Translation pipeline
//!
//! Orchestrates a request end to end:
//!
//! 1. validate locales and skip rules (nothing is traversed or sent before this)
//! 2. flatten the source tree and group plural families
//! 3. per target locale, plan one batch, call the backend once, unmask
//! 4. rebuild a tree per locale with the source shape
//!
//! Target locales are independent and run concurrently. The first failing
//! locale, in request order, fails the whole call; no partial result is
//! returned.

use crate::content::{ContentNode, KeyPath};
use crate::mt::config::ClientConfig;
use crate::mt::error::{MtError, MtResult};
use crate::mt::flatten::{FlattenOptions, TranslationUnit, flatten};
use crate::mt::hosted::HostedTranslator;
use crate::mt::namespace::{NamespaceInfo, detect_namespaces};
use crate::mt::path_matcher::SkipRules;
use crate::mt::placeholder::unmask;
use crate::mt::plural::{
    PluralCategory, PluralFamily, expand, group_families, is_known_locale, plural_key,
    required_categories,
};
use crate::mt::rebuild::{TranslatedLeaves, rebuild};
use crate::mt::translator::{BatchRequest, MachineTranslator, validate_locale};
use futures::future::join_all;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Caller options for one translation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslateOptions {
    /// Mask interpolation tokens before sending text to the backend
    pub preserve_placeholders: bool,
    /// Treat `<stem>_<category>` keys as plural families
    pub enable_pluralization: bool,
    /// Exact key paths to leave untranslated (`company.name`)
    pub skip_keys: Vec<String>,
    /// Glob key paths to leave untranslated (`states.*`)
    pub skip_paths: Vec<String>,
    /// Report i18next namespaces in the result
    pub detect_namespaces: bool,
}

impl Default for TranslateOptions {
    fn default() -> Self {
        Self {
            preserve_placeholders: true,
            enable_pluralization: true,
            skip_keys: Vec::new(),
            skip_paths: Vec::new(),
            detect_namespaces: false,
        }
    }
}

/// Content accepted by [`TranslationPipeline::translate`]
#[derive(Debug, Clone, PartialEq)]
pub enum TranslationInput {
    Text(String),
    Texts(Vec<String>),
    Tree(ContentNode),
}

impl From<ContentNode> for TranslationInput {
    fn from(tree: ContentNode) -> Self {
        TranslationInput::Tree(tree)
    }
}

impl From<&str> for TranslationInput {
    fn from(text: &str) -> Self {
        TranslationInput::Text(text.to_string())
    }
}

impl From<Vec<String>> for TranslationInput {
    fn from(texts: Vec<String>) -> Self {
        TranslationInput::Texts(texts)
    }
}

/// One translated string of a text-mode request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextPair {
    pub original: String,
    pub translated: String,
}

/// Output for one target locale
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LanguageOutput {
    Tree(ContentNode),
    Text(Vec<TextPair>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SkipReport {
    pub count: usize,
    pub keys: Vec<String>,
}

/// A non-fatal anomaly found while translating
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranslationWarning {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl TranslationWarning {
    fn new(message: String, key_path: &KeyPath, locale: &str) -> Self {
        Self {
            message,
            key_path: Some(key_path.to_string()),
            locale: Some(locale.to_string()),
        }
    }
}

/// Result of one translation request
///
/// Serializes as one entry per locale followed by `skipped`, `warnings` and,
/// when namespace detection ran, `namespaceInfo`.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslationResult {
    /// Outputs in the order the locales were requested
    pub languages: Vec<(String, LanguageOutput)>,
    pub skipped: SkipReport,
    pub warnings: Vec<TranslationWarning>,
    pub namespace_info: Option<NamespaceInfo>,
}

impl TranslationResult {
    pub fn get(&self, locale: &str) -> Option<&LanguageOutput> {
        self.languages
            .iter()
            .find(|(l, _)| l == locale)
            .map(|(_, output)| output)
    }

    /// Translated tree of a locale (tree-mode requests)
    pub fn tree(&self, locale: &str) -> Option<&ContentNode> {
        match self.get(locale)? {
            LanguageOutput::Tree(tree) => Some(tree),
            LanguageOutput::Text(_) => None,
        }
    }

    /// Translated pairs of a locale (text-mode requests)
    pub fn texts(&self, locale: &str) -> Option<&[TextPair]> {
        match self.get(locale)? {
            LanguageOutput::Text(pairs) => Some(pairs),
            LanguageOutput::Tree(_) => None,
        }
    }

    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(|(locale, _)| locale.as_str())
    }
}

impl Serialize for TranslationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let extra = 2 + usize::from(self.namespace_info.is_some());
        let mut map = serializer.serialize_map(Some(self.languages.len() + extra))?;
        for (locale, output) in &self.languages {
            map.serialize_entry(locale, output)?;
        }
        map.serialize_entry("skipped", &self.skipped)?;
        map.serialize_entry("warnings", &self.warnings)?;
        if let Some(info) = &self.namespace_info {
            map.serialize_entry("namespaceInfo", info)?;
        }
        map.end()
    }
}

/// One text to produce for a locale
struct Job<'a> {
    unit: &'a TranslationUnit,
    hint: Option<PluralCategory>,
    /// Where the output lands; differs from the unit path for cloned plural forms
    output_path: KeyPath,
    /// Excluded by a skip rule; the source text is kept
    verbatim: bool,
}

/// Where a job's output goes in the rebuilt tree
enum Slot {
    Leaf,
    Form { family: usize, category: PluralCategory },
}

/// Locale-independent state of a tree request
struct TreePlan<'a> {
    tree: &'a ContentNode,
    units: Vec<TranslationUnit>,
    families: Vec<PluralFamily>,
    /// First unit index of each family -> family index
    family_starts: HashMap<usize, usize>,
    family_members: HashSet<usize>,
}

pub struct TranslationPipeline {
    translator: Arc<dyn MachineTranslator>,
}

impl TranslationPipeline {
    pub fn new(translator: Arc<dyn MachineTranslator>) -> Self {
        Self { translator }
    }

    /// Pipeline backed by the hosted service; fails fast on bad configuration
    pub fn from_config(config: ClientConfig) -> MtResult<Self> {
        Ok(Self::new(Arc::new(HostedTranslator::new(config)?)))
    }

    pub fn provider_name(&self) -> &str {
        self.translator.provider_name()
    }

    /// Translate any supported input
    pub async fn translate<S: AsRef<str>>(
        &self,
        input: &TranslationInput,
        source_locale: &str,
        target_locales: &[S],
        options: &TranslateOptions,
    ) -> MtResult<TranslationResult> {
        match input {
            TranslationInput::Tree(tree) => {
                self.translate_json(tree, source_locale, target_locales, options)
                    .await
            }
            TranslationInput::Text(text) => {
                self.translate_text(std::slice::from_ref(text), source_locale, target_locales, options)
                    .await
            }
            TranslationInput::Texts(texts) => {
                self.translate_text(texts, source_locale, target_locales, options)
                    .await
            }
        }
    }

    /// Translate an i18next resource, always reporting namespaces
    pub async fn translate_i18next<S: AsRef<str>>(
        &self,
        content: &ContentNode,
        source_locale: &str,
        target_locales: &[S],
        options: &TranslateOptions,
    ) -> MtResult<TranslationResult> {
        let options = TranslateOptions {
            detect_namespaces: true,
            ..options.clone()
        };
        self.translate_json(content, source_locale, target_locales, &options)
            .await
    }

    /// Translate a content tree into every target locale
    pub async fn translate_json<S: AsRef<str>>(
        &self,
        content: &ContentNode,
        source_locale: &str,
        target_locales: &[S],
        options: &TranslateOptions,
    ) -> MtResult<TranslationResult> {
        let targets = prepare_locales(source_locale, target_locales)?;
        let rules = SkipRules::new(&options.skip_keys, &options.skip_paths)?;

        let flattened = flatten(
            content,
            &rules,
            FlattenOptions {
                mask_placeholders: options.preserve_placeholders,
                detect_plurals: options.enable_pluralization,
            },
        );
        let families = if options.enable_pluralization {
            group_families(&flattened.units, &flattened.skipped)
        } else {
            Vec::new()
        };

        if !families.is_empty() {
            for target in targets.iter().filter(|target| !is_known_locale(target)) {
                info!("No plural rules for {}; using one/other", target);
            }
        }

        info!(
            "Translating {} units ({} plural families, {} skipped) from {} into {} locale(s) via {}",
            flattened.units.len(),
            families.len(),
            flattened.skipped.len(),
            source_locale,
            targets.len(),
            self.translator.provider_name()
        );

        let plan = TreePlan {
            tree: content,
            family_starts: families
                .iter()
                .enumerate()
                .map(|(index, family)| (family.first_unit, index))
                .collect(),
            family_members: families
                .iter()
                .flat_map(|family| family.source_forms.values().copied())
                .collect(),
            units: flattened.units,
            families,
        };

        let outcomes = join_all(
            targets
                .iter()
                .map(|target| self.translate_tree_locale(&plan, source_locale, target, options)),
        )
        .await;

        let mut languages = Vec::with_capacity(targets.len());
        let mut warnings = Vec::new();
        for (target, outcome) in targets.iter().zip(outcomes) {
            let (tree, locale_warnings) = outcome.map_err(|e| locale_failed(target, e))?;
            languages.push((target.clone(), LanguageOutput::Tree(tree)));
            warnings.extend(locale_warnings);
        }

        let mut seen = HashSet::new();
        let keys: Vec<String> = flattened
            .skipped
            .iter()
            .map(ToString::to_string)
            .filter(|key| seen.insert(key.clone()))
            .collect();

        let namespace_info = options
            .detect_namespaces
            .then(|| detect_namespaces(content, &rules));

        Ok(TranslationResult {
            languages,
            skipped: SkipReport {
                count: keys.len(),
                keys,
            },
            warnings,
            namespace_info,
        })
    }

    /// Translate plain strings; each becomes one `{original, translated}` pair
    pub async fn translate_text<S: AsRef<str>, T: AsRef<str>>(
        &self,
        texts: &[T],
        source_locale: &str,
        target_locales: &[S],
        options: &TranslateOptions,
    ) -> MtResult<TranslationResult> {
        let targets = prepare_locales(source_locale, target_locales)?;
        let rules = SkipRules::new(&options.skip_keys, &options.skip_paths)?;

        let units: Vec<TranslationUnit> = texts
            .iter()
            .enumerate()
            .map(|(index, text)| {
                TranslationUnit::new(
                    KeyPath::root().child_index(index),
                    text.as_ref(),
                    options.preserve_placeholders,
                )
            })
            .collect();
        let jobs: Vec<Job<'_>> = units
            .iter()
            .map(|unit| Job {
                unit,
                hint: None,
                output_path: unit.key_path.clone(),
                verbatim: rules.is_excluded(&unit.key_path),
            })
            .collect();
        let skipped: Vec<String> = jobs
            .iter()
            .filter(|job| job.verbatim)
            .map(|job| job.output_path.to_string())
            .collect();

        info!(
            "Translating {} text(s) from {} into {} locale(s) via {}",
            units.len(),
            source_locale,
            targets.len(),
            self.translator.provider_name()
        );

        let outcomes = join_all(
            targets
                .iter()
                .map(|target| self.run_jobs(&jobs, source_locale, target, options)),
        )
        .await;

        let mut languages = Vec::with_capacity(targets.len());
        let mut warnings = Vec::new();
        for (target, outcome) in targets.iter().zip(outcomes) {
            let (outputs, locale_warnings) = outcome.map_err(|e| locale_failed(target, e))?;
            let pairs = units
                .iter()
                .zip(outputs)
                .map(|(unit, translated)| TextPair {
                    original: unit.source_text.clone(),
                    translated,
                })
                .collect();
            languages.push((target.clone(), LanguageOutput::Text(pairs)));
            warnings.extend(locale_warnings);
        }

        Ok(TranslationResult {
            languages,
            skipped: SkipReport {
                count: skipped.len(),
                keys: skipped,
            },
            warnings,
            namespace_info: None,
        })
    }

    async fn translate_tree_locale(
        &self,
        plan: &TreePlan<'_>,
        source_locale: &str,
        target_locale: &str,
        options: &TranslateOptions,
    ) -> MtResult<(ContentNode, Vec<TranslationWarning>)> {
        let mut jobs = Vec::with_capacity(plan.units.len());
        let mut slots = Vec::with_capacity(plan.units.len());
        let mut warnings = Vec::new();

        for (index, unit) in plan.units.iter().enumerate() {
            if let Some(&family_index) = plan.family_starts.get(&index) {
                let family = &plan.families[family_index];
                let expansion = expand(family, source_locale, target_locale);

                for category in &expansion.dropped {
                    let path = family.key.form_path(*category);
                    let warning = TranslationWarning::new(
                        format!(
                            "Plural form '{}' is not used in {}; dropped",
                            plural_key(&family.key.stem, *category),
                            target_locale
                        ),
                        &path,
                        target_locale,
                    );
                    warn!("{}: {}", path, warning.message);
                    warnings.push(warning);
                }

                let required = required_categories(target_locale);
                for category in family
                    .skipped_forms
                    .iter()
                    .filter(|category| !required.contains(*category))
                {
                    let path = family.key.form_path(*category);
                    let warning = TranslationWarning::new(
                        format!(
                            "Plural form '{}' is not used in {}; kept because it is skipped",
                            plural_key(&family.key.stem, *category),
                            target_locale
                        ),
                        &path,
                        target_locale,
                    );
                    warn!("{}: {}", path, warning.message);
                    warnings.push(warning);
                }

                for form in &expansion.forms {
                    jobs.push(Job {
                        unit: &plan.units[form.template],
                        hint: Some(form.category),
                        output_path: family.key.form_path(form.category),
                        verbatim: false,
                    });
                    slots.push(Slot::Form {
                        family: family_index,
                        category: form.category,
                    });
                }
            }
            if plan.family_members.contains(&index) {
                continue;
            }
            jobs.push(Job {
                unit,
                hint: None,
                output_path: unit.key_path.clone(),
                verbatim: false,
            });
            slots.push(Slot::Leaf);
        }

        let (outputs, batch_warnings) = self
            .run_jobs(&jobs, source_locale, target_locale, options)
            .await?;
        warnings.extend(batch_warnings);

        let mut translated = TranslatedLeaves::new();
        let mut forms: Vec<BTreeMap<PluralCategory, String>> =
            vec![BTreeMap::new(); plan.families.len()];

        for ((job, slot), text) in jobs.iter().zip(&slots).zip(outputs) {
            match slot {
                Slot::Leaf => translated.insert_leaf(job.output_path.clone(), text),
                Slot::Form { family, category } => {
                    forms[*family].insert(*category, text);
                }
            }
        }

        for (family, mut family_forms) in plan.families.iter().zip(forms) {
            for category in &family.skipped_forms {
                let verbatim = plan
                    .tree
                    .get_path(&family.key.form_path(*category))
                    .and_then(ContentNode::as_text);
                if let Some(text) = verbatim {
                    family_forms.insert(*category, text.to_string());
                }
            }
            translated.insert_family(family.key.clone(), family_forms.into_iter().collect());
        }

        Ok((rebuild(plan.tree, &translated), warnings))
    }

    /// Send every non-blank job in one batch and restore placeholders
    ///
    /// Returns one output per job, in job order. Blank and verbatim jobs keep
    /// their source.
    async fn run_jobs(
        &self,
        jobs: &[Job<'_>],
        source_locale: &str,
        target_locale: &str,
        options: &TranslateOptions,
    ) -> MtResult<(Vec<String>, Vec<TranslationWarning>)> {
        let mut outputs: Vec<String> = jobs.iter().map(|job| job.unit.source_text.clone()).collect();
        let mut warnings = Vec::new();

        let outbound: Vec<usize> = (0..jobs.len())
            .filter(|&index| !jobs[index].verbatim && !jobs[index].unit.is_blank())
            .collect();
        if outbound.is_empty() {
            debug!("Nothing to send for {}", target_locale);
            return Ok((outputs, warnings));
        }

        let mut request = BatchRequest::new(
            source_locale,
            target_locale,
            outbound
                .iter()
                .map(|&index| jobs[index].unit.masked_text.clone())
                .collect(),
        );
        request.plural_hints = outbound.iter().map(|&index| jobs[index].hint).collect();
        request.preserve_placeholders = options.preserve_placeholders;
        request.enable_pluralization = options.enable_pluralization;

        debug!(
            "Batch {} -> {}: {} texts ({} with plural hints)",
            source_locale,
            target_locale,
            request.len(),
            request.plural_hints.iter().filter(|hint| hint.is_some()).count()
        );

        let translations = self.translator.translate_batch(&request).await?;
        if translations.len() != request.len() {
            return Err(MtError::BatchLengthMismatch {
                locale: target_locale.to_string(),
                expected: request.len(),
                actual: translations.len(),
            });
        }

        for (&index, translated) in outbound.iter().zip(translations) {
            let job = &jobs[index];
            let restored = unmask(&translated, &job.unit.placeholders);

            let problems = [
                ("lost in translation", &restored.missing),
                ("duplicated by the translation", &restored.duplicated),
            ];
            for (what, indices) in problems {
                if indices.is_empty() {
                    continue;
                }
                let tokens: Vec<&str> = indices
                    .iter()
                    .map(|&i| job.unit.placeholders[i].original.as_str())
                    .collect();
                let warning = TranslationWarning::new(
                    format!("Placeholder(s) {} {}", tokens.join(", "), what),
                    &job.output_path,
                    target_locale,
                );
                warn!("{} ({}): {}", job.output_path, target_locale, warning.message);
                warnings.push(warning);
            }

            outputs[index] = restored.text;
        }

        Ok((outputs, warnings))
    }
}

fn locale_failed(locale: &str, error: MtError) -> MtError {
    MtError::LocaleFailed {
        locale: locale.to_string(),
        source: Box::new(error),
    }
}

/// Validate the source and targets; returns targets without duplicates
fn prepare_locales<S: AsRef<str>>(source_locale: &str, target_locales: &[S]) -> MtResult<Vec<String>> {
    validate_locale(source_locale)?;
    if target_locales.is_empty() {
        return Err(MtError::Config(
            "At least one target language is required".to_string(),
        ));
    }

    let mut targets: Vec<String> = Vec::with_capacity(target_locales.len());
    for target in target_locales {
        let target = target.as_ref();
        validate_locale(target)?;
        if !targets.iter().any(|t| t == target) {
            targets.push(target.to_string());
        }
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::mock::{MockMode, MockTranslator};
    use serde_json::json;

    fn suffix_pipeline() -> (TranslationPipeline, MockTranslator) {
        let mock = MockTranslator::new(MockMode::Suffix);
        (TranslationPipeline::new(Arc::new(mock.clone())), mock)
    }

    #[test]
    fn test_prepare_locales_dedupes_in_order() {
        let targets = prepare_locales("en", &["fr", "de", "fr"]).unwrap();
        assert_eq!(targets, vec!["fr", "de"]);
    }

    #[test]
    fn test_prepare_locales_rejects_bad_input() {
        assert!(matches!(
            prepare_locales::<&str>("en", &[]),
            Err(MtError::Config(_))
        ));
        assert!(matches!(
            prepare_locales("en", &["es", "x@y"]),
            Err(MtError::InvalidLocale(_))
        ));
        assert!(matches!(
            prepare_locales("", &["es"]),
            Err(MtError::InvalidLocale(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_targets_translated_once() {
        let (pipeline, mock) = suffix_pipeline();
        let tree = ContentNode::from(json!({"a": "A"}));
        let result = pipeline
            .translate_json(&tree, "en", &["fr", "fr"], &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(result.locales().collect::<Vec<_>>(), vec!["fr"]);
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_blank_texts_are_not_sent() {
        let (pipeline, mock) = suffix_pipeline();
        let tree = ContentNode::from(json!({"empty": "", "space": "  ", "word": "Hi"}));
        let result = pipeline
            .translate_json(&tree, "en", &["fr"], &TranslateOptions::default())
            .await
            .unwrap();

        assert_eq!(
            result.tree("fr").unwrap().to_value(),
            json!({"empty": "", "space": "  ", "word": "Hi_fr"})
        );
        assert_eq!(mock.requests()[0].texts, vec!["Hi"]);
    }

    #[tokio::test]
    async fn test_tree_without_text_makes_no_call() {
        let (pipeline, mock) = suffix_pipeline();
        let tree = ContentNode::from(json!({"n": 1, "list": [true, null]}));
        let result = pipeline
            .translate_json(&tree, "en", &["fr"], &TranslateOptions::default())
            .await
            .unwrap();
        assert_eq!(result.tree("fr"), Some(&tree));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn test_plural_hints_name_target_categories() {
        let (pipeline, mock) = suffix_pipeline();
        let tree = ContentNode::from(json!({
            "title": "Cart",
            "items_one": "{{count}} item",
            "items_other": "{{count}} items"
        }));
        pipeline
            .translate_json(&tree, "en", &["ru"], &TranslateOptions::default())
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(
            request.texts,
            vec!["Cart", "⟦0⟧ item", "⟦0⟧ items", "⟦0⟧ items", "⟦0⟧ items"]
        );
        assert_eq!(
            request.plural_hints,
            vec![
                None,
                Some(PluralCategory::One),
                Some(PluralCategory::Few),
                Some(PluralCategory::Many),
                Some(PluralCategory::Other),
            ]
        );
    }

    #[tokio::test]
    async fn test_options_are_forwarded() {
        let (pipeline, mock) = suffix_pipeline();
        let options = TranslateOptions {
            preserve_placeholders: false,
            enable_pluralization: false,
            ..TranslateOptions::default()
        };
        pipeline
            .translate_text(&["Hi {{name}}"], "en", &["de"], &options)
            .await
            .unwrap();

        let request = &mock.requests()[0];
        assert_eq!(request.texts, vec!["Hi {{name}}"]);
        assert!(!request.preserve_placeholders);
        assert!(!request.enable_pluralization);
    }

    #[test]
    fn test_result_serialization_shape() {
        let result = TranslationResult {
            languages: vec![
                (
                    "es".to_string(),
                    LanguageOutput::Tree(ContentNode::from(json!({"a": "Hola"}))),
                ),
                (
                    "fr".to_string(),
                    LanguageOutput::Text(vec![TextPair {
                        original: "Hi".to_string(),
                        translated: "Salut".to_string(),
                    }]),
                ),
            ],
            skipped: SkipReport {
                count: 1,
                keys: vec!["brand".to_string()],
            },
            warnings: vec![TranslationWarning {
                message: "dropped".to_string(),
                key_path: Some("items_one".to_string()),
                locale: None,
            }],
            namespace_info: None,
        };

        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({
                "es": {"a": "Hola"},
                "fr": [{"original": "Hi", "translated": "Salut"}],
                "skipped": {"count": 1, "keys": ["brand"]},
                "warnings": [{"message": "dropped", "keyPath": "items_one"}]
            })
        );
    }
}
