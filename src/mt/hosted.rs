//! Hosted translation service client
//!
//! Talks to the batch translation endpoint of the hosted service.
//!
//! # Authentication
//!
//! The key is sent in the `x-api-key` header. `HostedTranslator::from_env`
//! reads it from `SHIPI18N_API_KEY` (see [`ClientConfig`]).
//!
//! # Wire format
//!
//! ```text
//! POST {base_url}/api/translate
//! {
//!   "sourceLanguage": "en",
//!   "targetLanguage": "ru",
//!   "texts": ["⟦0⟧ item", "⟦0⟧ items"],
//!   "pluralCategories": [null, "few"],
//!   "preservePlaceholders": true,
//!   "enablePluralization": true
//! }
//!
//! 200 { "translations": ["...", "..."] }
//! 4xx/5xx { "message": "...", "code": "..." } or { "error": { "message": "...", "code": "..." } }
//! ```

use crate::mt::config::ClientConfig;
use crate::mt::error::{MtError, MtResult, StatusCategory};
use crate::mt::plural::PluralCategory;
use crate::mt::translator::{BatchRequest, MachineTranslator, validate_locale};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::error::Error as StdError;
use std::io;
use tracing::debug;

const TRANSLATE_PATH: &str = "/api/translate";

/// reqwest-backed [`MachineTranslator`] for the hosted service
///
/// Batches larger than the configured size are split into chunks that are
/// sent one after another and concatenated.
#[derive(Clone)]
pub struct HostedTranslator {
    config: ClientConfig,
    /// HTTP client for async requests
    client: reqwest::Client,
    endpoint: String,
}

impl HostedTranslator {
    /// Create a translator from a validated configuration
    ///
    /// # Example
    ///
    /// ```ignore
    /// let translator = HostedTranslator::new(ClientConfig::new("your-api-key"))?;
    /// ```
    pub fn new(config: ClientConfig) -> MtResult<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| MtError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = format!("{}{}", config.base_url.trim_end_matches('/'), TRANSLATE_PATH);

        Ok(Self {
            config,
            client,
            endpoint,
        })
    }

    /// Create a translator from `SHIPI18N_*` environment variables
    pub fn from_env() -> MtResult<Self> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Translate one chunk of a batch via the API
    async fn translate_chunk(
        &self,
        request: &BatchRequest,
        texts: &[String],
        hints: &[Option<PluralCategory>],
    ) -> MtResult<Vec<String>> {
        let body = json!({
            "sourceLanguage": request.source_locale,
            "targetLanguage": request.target_locale,
            "texts": texts,
            "pluralCategories": hints,
            "preservePlaceholders": request.preserve_placeholders,
            "enablePluralization": request.enable_pluralization,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_from_body(status.as_u16(), &error_text));
        }

        let json: Value = response.json().await.map_err(|e| {
            MtError::backend(
                StatusCategory::Unknown,
                format!("Failed to parse API response: {}", e),
            )
        })?;

        let translations = json["translations"].as_array().ok_or_else(|| {
            MtError::backend(
                StatusCategory::Unknown,
                "Invalid API response: missing 'translations' array",
            )
        })?;

        translations
            .iter()
            .map(|t| {
                t.as_str().map(str::to_string).ok_or_else(|| {
                    MtError::backend(
                        StatusCategory::Unknown,
                        "Invalid API response: translation is not a string",
                    )
                })
            })
            .collect()
    }
}

/// Classify a reqwest failure that happened before any response arrived
fn transport_error(error: reqwest::Error) -> MtError {
    let status = transport_status(error.is_timeout(), io_error_kind(&error));
    MtError::backend(status, error.to_string())
}

/// An aborted or interrupted connection means the call was cancelled
fn transport_status(timed_out: bool, io_kind: Option<io::ErrorKind>) -> StatusCategory {
    match io_kind {
        _ if timed_out => StatusCategory::Timeout,
        Some(io::ErrorKind::TimedOut) => StatusCategory::Timeout,
        Some(io::ErrorKind::ConnectionAborted | io::ErrorKind::Interrupted) => {
            StatusCategory::Cancelled
        }
        _ => StatusCategory::Network,
    }
}

fn io_error_kind(error: &(dyn StdError + 'static)) -> Option<io::ErrorKind> {
    let mut source = error.source();
    while let Some(inner) = source {
        if let Some(io_error) = inner.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
        source = inner.source();
    }
    None
}

/// Build a backend error from a non-success response body
///
/// The service answers either `{message, code}` or `{error: {message, code}}`;
/// anything else keeps the raw body as the message.
fn error_from_body(status: u16, body: &str) -> MtError {
    let category = StatusCategory::from_http_status(status);
    let parsed: Option<Value> = serde_json::from_str(body).ok();

    let details = parsed.as_ref().map(|value| match value.get("error") {
        Some(inner) if inner.is_object() => inner,
        _ => value,
    });

    let message = details
        .and_then(|d| d.get("message").and_then(Value::as_str))
        .or_else(|| parsed.as_ref().and_then(|v| v.get("error")).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                format!("HTTP {}", status)
            } else {
                body.to_string()
            }
        });

    let code = details
        .and_then(|d| d.get("code").and_then(Value::as_str))
        .map(str::to_string);

    MtError::Backend {
        status: category,
        message,
        code,
    }
}

impl std::fmt::Debug for HostedTranslator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedTranslator")
            .field("api_key", &"***")
            .field("endpoint", &self.endpoint)
            .field("max_batch_size", &self.config.max_batch_size)
            .finish()
    }
}

#[async_trait]
impl MachineTranslator for HostedTranslator {
    async fn translate_batch(&self, request: &BatchRequest) -> MtResult<Vec<String>> {
        validate_locale(&request.source_locale)?;
        validate_locale(&request.target_locale)?;

        if request.is_empty() {
            return Ok(Vec::new());
        }

        let mut hints = request.plural_hints.clone();
        hints.resize(request.len(), None);

        let size = self.config.max_batch_size;
        let chunks = request.texts.chunks(size).zip(hints.chunks(size));
        let mut all_results = Vec::with_capacity(request.len());

        for (index, (texts, hints)) in chunks.enumerate() {
            debug!(
                "Sending chunk {} ({} texts) to {} for {}",
                index,
                texts.len(),
                self.endpoint,
                request.target_locale
            );
            let chunk_results = self.translate_chunk(request, texts, hints).await?;
            if chunk_results.len() != texts.len() {
                return Err(MtError::BatchLengthMismatch {
                    locale: request.target_locale.clone(),
                    expected: texts.len(),
                    actual: chunk_results.len(),
                });
            }
            all_results.extend(chunk_results);
        }

        Ok(all_results)
    }

    fn provider_name(&self) -> &str {
        "Shipi18n"
    }
}
