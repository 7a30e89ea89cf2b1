//! Error taxonomy for the localization core.
//!
//! Missing translations are not errors and have no variant here. Provider
//! errors never leave the translation module; they are logged and replaced by
//! the source text.

use crate::i18n::Locale;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown locale code: '{0}'")]
pub struct UnknownLocale(pub String);

/// Failure of a single machine-translation call.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Failed to send translation request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Translation provider error ({status}): {body}")]
    Status { status: u16, body: String },

    #[error("Malformed translation response: {0}")]
    Malformed(String),
}

impl ProviderError {
    /// Network failures, 429, 5xx and malformed bodies are worth another try.
    /// Other 4xx responses (bad key, bad request) are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Status { status, .. } => *status == 429 || *status >= 500,
            ProviderError::Request(_) | ProviderError::Malformed(_) => true,
        }
    }
}

/// Failure of the entity store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Event {0} not found")]
    EventNotFound(i64),

    #[error("Invalid stored record: {0}")]
    InvalidRecord(String),
}

/// Glossary table rejected at load time.
#[derive(Debug, Error)]
pub enum GlossaryError {
    #[error("Glossary entry for '{locale}' has an empty term")]
    EmptyTerm { locale: Locale },

    #[error("Glossary term '{term}' must start and end with a word character")]
    NonWordEdge { term: String },

    #[error("Glossary source term '{term}' is defined twice for '{locale}'")]
    DuplicateSource { term: String, locale: Locale },

    #[error(
        "Glossary target '{target}' for '{locale}' contains source term '{source_term}'; \
         substitution would not be idempotent"
    )]
    NonIdempotent {
        target: String,
        source_term: String,
        locale: Locale,
    },

    #[error("Failed to read glossary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse glossary file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to compile glossary matcher: {0}")]
    Regex(#[from] regex::Error),
}

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: {source}")]
    InvalidLocale {
        var: &'static str,
        #[source]
        source: UnknownLocale,
    },

    #[error("{var} must list at least one locale")]
    EmptyLocaleList { var: &'static str },

    #[error("DEFAULT_LOCALE '{0}' is not in SUPPORTED_LOCALES")]
    DefaultNotSupported(Locale),

    #[error("FALLBACK_ORDER locale '{0}' is not in SUPPORTED_LOCALES")]
    FallbackNotSupported(Locale),

    #[error("Unknown TRANSLATION_PROVIDER '{0}' (expected 'none' or 'google')")]
    UnknownProvider(String),

    #[error("{var} has invalid value '{value}'")]
    InvalidValue { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_retryability() {
        let status = |code| ProviderError::Status {
            status: code,
            body: String::new(),
        };
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(status(429).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(401).is_retryable());
        assert!(!status(403).is_retryable());
    }

    #[test]
    fn test_malformed_is_retryable() {
        assert!(ProviderError::Malformed("no translations".to_string()).is_retryable());
    }

    #[test]
    fn test_status_message_mentions_code() {
        let err = ProviderError::Status {
            status: 403,
            body: "forbidden".to_string(),
        };
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_non_idempotent_message() {
        let err = GlossaryError::NonIdempotent {
            target: "Event Hall".to_string(),
            source_term: "Event".to_string(),
            locale: Locale::KU,
        };
        let msg = err.to_string();
        assert!(msg.contains("Event Hall"));
        assert!(msg.contains("ku"));
    }
}
