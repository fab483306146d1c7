//! Mock Machine Translator for testing
//!
//! This module provides a deterministic, API-free translator for testing
//! the pipeline without requiring API keys or network access.
//!
//! # Example
//!
//! ```ignore
//! use shipi18n::mt::{MachineTranslator, MockTranslator, MockMode};
//!
//! #[tokio::test]
//! async fn test_translation() {
//!     let mock = MockTranslator::new(MockMode::Suffix);
//!     let result = mock.translate("hello", "en", "fr").await.unwrap();
//!     assert_eq!(result, "hello_fr");
//! }
//! ```

use crate::mt::error::{MtError, MtResult};
use crate::mt::translator::{BatchRequest, MachineTranslator};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

static MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"⟦+[0-9]+⟧").expect("valid marker regex"));

/// Mock translation modes for testing different scenarios
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Append locale suffix: "hello" → "hello_fr"
    /// This preserves masking markers perfectly for testing
    Suffix,

    /// Use predefined mappings for realistic translations
    /// (text, target_locale) → translation; unmapped texts fall back to Suffix
    Mappings(HashMap<(String, String), String>),

    /// Simulate word reordering (for testing word-order-changing languages like Japanese)
    /// Reverses the order of words separated by spaces
    Reorder,

    /// Fail every request with this error
    Error(MtError),

    /// Fail requests for one target locale; other locales behave like Suffix
    FailLocale { locale: String, error: MtError },

    /// Strip masking markers, like a backend that mangles them
    DropMarkers,

    /// Answer with one translation fewer than requested
    ShortBatch,

    /// No-op: return input unchanged
    NoOp,
}

/// Mock translator that simulates various translation scenarios
///
/// Every request is recorded; clones share the record, so a test can keep a
/// handle while the pipeline owns another.
#[derive(Debug, Clone)]
pub struct MockTranslator {
    mode: MockMode,
    /// Optional simulated network delay (in milliseconds)
    delay_ms: u64,
    requests: Arc<Mutex<Vec<BatchRequest>>>,
}

impl MockTranslator {
    /// Create a new MockTranslator with the given mode
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::new(MockMode::Suffix);
    /// ```
    pub fn new(mode: MockMode) -> Self {
        Self::with_delay(mode, 0)
    }

    /// Create a MockTranslator with simulated network delay
    ///
    /// # Example
    ///
    /// ```ignore
    /// let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
    /// // Each batch will have ~50ms delay
    /// ```
    pub fn with_delay(mode: MockMode, delay_ms: u64) -> Self {
        Self {
            mode,
            delay_ms,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Requests received so far, in arrival order
    pub fn requests(&self) -> Vec<BatchRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Internal helper to apply the simulated delay
    async fn apply_delay(&self) {
        if self.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
        }
    }

    fn record(&self, request: &BatchRequest) {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
    }

    /// Apply translation logic based on the mode
    fn apply_translation(&self, text: &str, target: &str) -> String {
        match &self.mode {
            MockMode::Mappings(map) => map
                .get(&(text.to_string(), target.to_string()))
                .cloned()
                .unwrap_or_else(|| format!("{}_{}", text, target)),
            MockMode::Reorder => text.split_whitespace().rev().collect::<Vec<_>>().join(" "),
            MockMode::DropMarkers => MARKER.replace_all(text, "").trim().to_string(),
            MockMode::NoOp => text.to_string(),
            _ => format!("{}_{}", text, target),
        }
    }
}

#[async_trait]
impl MachineTranslator for MockTranslator {
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>> {
        self.record(request);
        // Delay applies per batch, not per string
        self.apply_delay().await;

        match &self.mode {
            MockMode::Error(error) => return Err(error.clone()),
            MockMode::FailLocale { locale, error } if *locale == request.target_locale => {
                return Err(error.clone());
            }
            _ => {}
        }

        let mut results: Vec<String> = request
            .texts
            .iter()
            .map(|text| self.apply_translation(text, &request.target_locale))
            .collect();

        if matches!(self.mode, MockMode::ShortBatch) {
            results.pop();
        }
        Ok(results)
    }

    fn provider_name(&self) -> &str {
        "Mock Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mt::error::StatusCategory;

    fn batch(target: &str, texts: &[&str]) -> BatchRequest {
        BatchRequest::new("en", target, texts.iter().map(|t| t.to_string()).collect())
    }

    // ========== Suffix Mode Tests ==========

    #[tokio::test]
    async fn test_suffix_single_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = mock.translate("hello", "en", "fr").await.unwrap();
        assert_eq!(result, "hello_fr");
    }

    #[tokio::test]
    async fn test_suffix_batch_translation() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let results = mock
            .translate_batch(&batch("fr", &["hello", "world"]))
            .await
            .unwrap();
        assert_eq!(results, vec!["hello_fr", "world_fr"]);
    }

    #[tokio::test]
    async fn test_suffix_preserves_markers() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let result = mock.translate("⟦0⟧ sent ⟦1⟧", "en", "fr").await.unwrap();
        assert_eq!(result, "⟦0⟧ sent ⟦1⟧_fr");
    }

    // ========== Mapping Mode Tests ==========

    #[tokio::test]
    async fn test_mapping_with_fallback() {
        let mut map = HashMap::new();
        map.insert(("hello".to_string(), "fr".to_string()), "bonjour".to_string());

        let mock = MockTranslator::new(MockMode::Mappings(map));
        let results = mock
            .translate_batch(&batch("fr", &["hello", "unknown"]))
            .await
            .unwrap();
        assert_eq!(results, vec!["bonjour", "unknown_fr"]);
    }

    // ========== Reorder Mode Tests ==========

    #[tokio::test]
    async fn test_reorder_reverses_words() {
        let mock = MockTranslator::new(MockMode::Reorder);
        let result = mock.translate("⟦0⟧ sent ⟦1⟧", "en", "ja").await.unwrap();
        assert_eq!(result, "⟦1⟧ sent ⟦0⟧");
    }

    // ========== Failure Mode Tests ==========

    #[tokio::test]
    async fn test_error_mode_returns_error() {
        let error = MtError::Backend {
            status: StatusCategory::Authentication,
            message: "Invalid API key".to_string(),
            code: Some("INVALID_API_KEY".to_string()),
        };
        let mock = MockTranslator::new(MockMode::Error(error.clone()));
        let result = mock.translate_batch(&batch("fr", &["hello"])).await;
        assert_eq!(result, Err(error));
    }

    #[tokio::test]
    async fn test_fail_locale_only_fails_that_locale() {
        let mock = MockTranslator::new(MockMode::FailLocale {
            locale: "de".to_string(),
            error: MtError::backend(StatusCategory::Server, "down"),
        });
        assert!(mock.translate_batch(&batch("de", &["hi"])).await.is_err());
        assert_eq!(
            mock.translate_batch(&batch("fr", &["hi"])).await.unwrap(),
            vec!["hi_fr"]
        );
    }

    #[tokio::test]
    async fn test_drop_markers() {
        let mock = MockTranslator::new(MockMode::DropMarkers);
        let result = mock.translate("Hello, ⟦0⟧", "en", "fr").await.unwrap();
        assert_eq!(result, "Hello,");
    }

    #[tokio::test]
    async fn test_short_batch() {
        let mock = MockTranslator::new(MockMode::ShortBatch);
        let results = mock.translate_batch(&batch("fr", &["a", "b"])).await.unwrap();
        assert_eq!(results.len(), 1);

        let single = mock.translate("a", "en", "fr").await;
        assert!(matches!(single, Err(MtError::BatchLengthMismatch { .. })));
    }

    // ========== NoOp Mode Tests ==========

    #[tokio::test]
    async fn test_noop_returns_unchanged() {
        let mock = MockTranslator::new(MockMode::NoOp);
        let results = mock
            .translate_batch(&batch("fr", &["Hello world", ""]))
            .await
            .unwrap();
        assert_eq!(results, vec!["Hello world", ""]);
    }

    // ========== Delay Tests ==========

    #[tokio::test]
    async fn test_delay_adds_latency() {
        let mock = MockTranslator::with_delay(MockMode::Suffix, 50);
        let start = std::time::Instant::now();
        let _ = mock.translate("hello", "en", "fr").await.unwrap();

        // Should have at least 50ms delay
        assert!(start.elapsed().as_millis() >= 50);
    }

    // ========== Recording Tests ==========

    #[tokio::test]
    async fn test_requests_are_recorded_and_shared() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let handle = mock.clone();
        mock.translate_batch(&batch("fr", &["a"])).await.unwrap();
        mock.translate_batch(&batch("de", &["b", "c"])).await.unwrap();

        assert_eq!(handle.request_count(), 2);
        let requests = handle.requests();
        assert_eq!(requests[0].target_locale, "fr");
        assert_eq!(requests[1].texts, vec!["b", "c"]);
    }

    #[tokio::test]
    async fn test_batch_handles_empty_input() {
        let mock = MockTranslator::new(MockMode::Suffix);
        let results = mock.translate_batch(&batch("fr", &[])).await.unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_provider_name() {
        let mock = MockTranslator::new(MockMode::Suffix);
        assert_eq!(mock.provider_name(), "Mock Translator");
    }
}
