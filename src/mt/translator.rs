//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! enabling support for different backends (the hosted service, mock, etc.)
//! without coupling the pipeline to any specific implementation.
//!
//! # Example
//!
//! ```ignore
//! use shipi18n::mt::{BatchRequest, HostedTranslator, MachineTranslator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = HostedTranslator::from_env()?;
//!
//!     let result = provider.translate("Hello, world!", "en", "fr").await?;
//!     println!("{}", result);
//!
//!     let request = BatchRequest::new("en", "fr", vec!["Hello".into(), "Goodbye".into()]);
//!     let results = provider.translate_batch(&request).await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::plural::PluralCategory;
use async_trait::async_trait;
use icu_locale::Locale;

/// One outbound request to a translation backend.
///
/// `texts` are already masked. `plural_hints` is parallel to `texts`: an entry
/// names the CLDR category a plural template is being translated into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRequest {
    pub source_locale: String,
    pub target_locale: String,
    pub texts: Vec<String>,
    pub plural_hints: Vec<Option<PluralCategory>>,
    pub preserve_placeholders: bool,
    pub enable_pluralization: bool,
}

impl BatchRequest {
    pub fn new(source_locale: &str, target_locale: &str, texts: Vec<String>) -> Self {
        let plural_hints = vec![None; texts.len()];
        Self {
            source_locale: source_locale.to_string(),
            target_locale: target_locale.to_string(),
            texts,
            plural_hints,
            preserve_placeholders: true,
            enable_pluralization: true,
        }
    }

    pub fn len(&self) -> usize {
        self.texts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texts.is_empty()
    }
}

/// Generic trait for translation backends
///
/// Implementations of this trait handle the actual translation work,
/// whether through an API (the hosted service) or deterministic logic (Mock).
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate every text of the request in one logical call
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length
    ///
    /// The pipeline checks the length and rejects a mismatched answer; order
    /// cannot be verified and is trusted.
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>>;

    /// Translate a single text string from source to target locale
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> MtResult<String> {
        let request = BatchRequest::new(source_locale, target_locale, vec![text.to_string()]);
        let mut results = self.translate_batch(&request).await?;
        if results.len() != 1 {
            return Err(MtError::BatchLengthMismatch {
                locale: target_locale.to_string(),
                expected: 1,
                actual: results.len(),
            });
        }
        Ok(results.remove(0))
    }

    /// Name of this provider, used in logs
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code by stripping region information
///
/// - `en-US` → `en`
/// - `zh-Hans` → `zh`
/// - `pt_BR` → `pt`
pub fn normalize_locale(locale: &str) -> String {
    locale
        .split(['-', '_'])
        .next()
        .unwrap_or(locale)
        .to_lowercase()
}

/// Validate that a locale code is a usable BCP 47 tag
///
/// Underscores are accepted as subtag separators (`de_DE`).
pub fn validate_locale(locale: &str) -> MtResult<()> {
    if locale.is_empty() {
        return Err(MtError::InvalidLocale("Locale code is empty".to_string()));
    }

    if !locale
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(MtError::InvalidLocale(format!(
            "Invalid characters in locale code: {}",
            locale
        )));
    }

    locale
        .replace('_', "-")
        .parse::<Locale>()
        .map_err(|e| MtError::InvalidLocale(format!("Failed to parse locale '{}': {}", locale, e)))?;

    Ok(())
}
