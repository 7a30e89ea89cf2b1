use crate::config::{Config, ProviderKind};
use crate::error::ProviderError;
use crate::i18n::{Glossary, Locale, TranslationMetrics};
use crate::retry::{with_retry_if, RetryConfig};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A remote machine-translation backend.
///
/// Implementations report every failure as an error; deciding what to show
/// instead is the [`Translator`]'s job.
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate(
        &self,
        text: &str,
        source: Locale,
        target: Locale,
    ) -> Result<String, ProviderError>;
}

/// Google Cloud Translation v2 request body
#[derive(Debug, Serialize)]
struct GoogleTranslateRequest<'a> {
    q: &'a str,
    source: &'static str,
    target: &'static str,
    format: &'static str,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslateResponse {
    data: GoogleTranslateData,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslateData {
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GoogleTranslation {
    translated_text: String,
}

pub struct GoogleTranslateProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    retry: RetryConfig,
}

impl GoogleTranslateProvider {
    pub fn new(client: reqwest::Client, api_url: &str, api_key: &str) -> Self {
        Self {
            client,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            retry: RetryConfig::provider_call(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn send_once(&self, request: &GoogleTranslateRequest<'_>) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ProviderError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GoogleTranslateResponse = serde_json::from_str(&body)
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| ProviderError::Malformed("response contained no translations".to_string()))
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslateProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn translate(
        &self,
        text: &str,
        source: Locale,
        target: Locale,
    ) -> Result<String, ProviderError> {
        let request = GoogleTranslateRequest {
            q: text,
            source: source.provider_code(),
            target: target.provider_code(),
            format: "text",
        };

        with_retry_if(
            &self.retry,
            &format!("Translation {} -> {}", source, target),
            || self.send_once(&request),
            ProviderError::is_retryable,
        )
        .await
    }
}

/// Build the configured provider, or `None` when translation is disabled.
pub fn provider_from_config(
    config: &Config,
    client: reqwest::Client,
) -> Option<Arc<dyn TranslationProvider>> {
    match (config.translation_provider, &config.translation_api_key) {
        (ProviderKind::None, _) => {
            info!("Machine translation disabled; content is served in its stored locales");
            None
        }
        (ProviderKind::Google, None) => {
            warn!("TRANSLATION_PROVIDER=google but TRANSLATION_API_KEY is not set; translation disabled");
            None
        }
        (ProviderKind::Google, Some(key)) => {
            info!("Machine translation via Google ({})", config.translation_api_url);
            Some(Arc::new(GoogleTranslateProvider::new(
                client,
                &config.translation_api_url,
                key,
            )))
        }
    }
}

/// Where a translated string came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// Returned as given: same locale or nothing to translate
    Unchanged,
    /// Produced by the provider
    Provider,
    /// Provider missing or failed; source text with glossary applied
    SourceFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedText {
    pub text: String,
    pub origin: TextOrigin,
}

/// Fail-closed translation: never returns an error to the caller.
#[derive(Clone)]
pub struct Translator {
    provider: Option<Arc<dyn TranslationProvider>>,
    glossary: Arc<Glossary>,
    metrics: Arc<TranslationMetrics>,
}

impl Translator {
    pub fn new(
        provider: Option<Arc<dyn TranslationProvider>>,
        glossary: Arc<Glossary>,
        metrics: Arc<TranslationMetrics>,
    ) -> Self {
        Self {
            provider,
            glossary,
            metrics,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn glossary(&self) -> &Glossary {
        &self.glossary
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        &self.metrics
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// Same-locale and blank input come back untouched with no provider call.
    /// Everything else is run through the glossary for `target`, whether the
    /// provider produced it or it is the source text after a failure.
    pub async fn translate(&self, text: &str, source: Locale, target: Locale) -> String {
        self.translate_detailed(text, source, target).await.text
    }

    pub async fn translate_detailed(
        &self,
        text: &str,
        source: Locale,
        target: Locale,
    ) -> TranslatedText {
        if source == target || text.trim().is_empty() {
            return TranslatedText {
                text: text.to_string(),
                origin: TextOrigin::Unchanged,
            };
        }

        let Some(provider) = &self.provider else {
            self.metrics.record_source_fallback();
            return TranslatedText {
                text: self.glossary.apply(text, target),
                origin: TextOrigin::SourceFallback,
            };
        };

        self.metrics.record_provider_call();
        match provider.translate(text, source, target).await {
            Ok(translated) => {
                debug!(
                    "Translated {} chars {} -> {} via {}",
                    text.len(),
                    source,
                    target,
                    provider.name()
                );
                TranslatedText {
                    text: self.glossary.apply(&translated, target),
                    origin: TextOrigin::Provider,
                }
            }
            Err(e) => {
                self.metrics.record_provider_failure();
                self.metrics.record_source_fallback();
                warn!(
                    "Translation {} -> {} via {} failed, using source text: {}",
                    source,
                    target,
                    provider.name(),
                    e
                );
                TranslatedText {
                    text: self.glossary.apply(text, target),
                    origin: TextOrigin::SourceFallback,
                }
            }
        }
    }
}
