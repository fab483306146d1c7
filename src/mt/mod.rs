//! Machine Translation Module
//!
//! This module translates localization resources through a batch translation
//! backend while keeping everything that is not prose intact: interpolation
//! tokens, excluded keys, the tree shape and key order, and i18next plural
//! families, which are re-expanded to the categories each target language
//! needs.
//!
//! # Overview
//!
//! 1. **Path Matcher** - Exact and single-segment glob skip rules
//! 2. **Placeholder Masker** - Swaps `{{name}}` / ICU arguments for stable markers and back
//! 3. **Plural Resolver** - Groups `<stem>_<category>` keys and plans CLDR forms per locale
//! 4. **Flattener / Rebuilder** - Tree to ordered units and back
//! 5. **Namespace Detector** - i18next namespace reporting
//! 6. **Pipeline** - One backend call per target locale, warnings and skip report
//!
//! # Example
//!
//! ```ignore
//! use shipi18n::ContentNode;
//! use shipi18n::mt::{ClientConfig, TranslateOptions, TranslationPipeline};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = TranslationPipeline::from_config(ClientConfig::from_env()?)?;
//!
//!     let content = ContentNode::from(json!({
//!         "greeting": "Hello, {{name}}!",
//!         "items_one": "{{count}} item",
//!         "items_other": "{{count}} items"
//!     }));
//!     let options = TranslateOptions {
//!         skip_paths: vec!["states.*".to_string()],
//!         ..TranslateOptions::default()
//!     };
//!
//!     let result = pipeline
//!         .translate_json(&content, "en", &["es", "ru"], &options)
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&result)?);
//!     Ok(())
//! }
//! ```
pub mod config;
pub mod error;
pub mod flatten;
pub mod hosted;
pub mod mock;
pub mod namespace;
pub mod path_matcher;
pub mod pipeline;
pub mod placeholder;
pub mod plural;
pub mod rebuild;
pub mod translator;


pub use config::ClientConfig;
pub use error::{MtError, MtResult, StatusCategory};
pub use flatten::{FlattenOptions, FlattenOutput, TranslationUnit, flatten};
pub use hosted::HostedTranslator;
pub use mock::{MockMode, MockTranslator};
pub use namespace::{NamespaceEntry, NamespaceInfo, detect_namespaces};
pub use path_matcher::{GlobPattern, SkipRules, is_excluded};
pub use pipeline::{
    LanguageOutput, SkipReport, TextPair, TranslateOptions, TranslationInput, TranslationPipeline,
    TranslationResult, TranslationWarning,
};
pub use placeholder::{MaskedText, Placeholder, UnmaskedText, mask, unmask};
pub use plural::{
    FamilyExpansion, FamilyKey, PluralCategory, PluralFamily, TargetForm, expand, group_families,
    required_categories, split_plural_key,
};
pub use rebuild::{TranslatedLeaves, rebuild};
pub use translator::{BatchRequest, MachineTranslator, normalize_locale, validate_locale};
