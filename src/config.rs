use crate::error::ConfigError;
use crate::i18n::Locale;
use anyhow::{Context, Result};
use std::str::FromStr;

pub const DEFAULT_TRANSLATION_API_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

/// Which machine-translation backend to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    None,
    Google,
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(ProviderKind::None),
            "google" => Ok(ProviderKind::Google),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    // Storage (None = in-memory store)
    pub database_url: Option<String>,

    // HTTP
    pub port: u16,
    pub api_key: Option<String>,

    // Translation provider
    pub translation_provider: ProviderKind,
    pub translation_api_key: Option<String>,
    pub translation_api_url: String,

    // Locales
    pub supported_locales: Vec<Locale>,
    pub default_locale: Locale,
    pub fallback_order: Vec<Locale>,

    // Pipeline
    pub glossary_path: Option<String>,
    pub backfill_on_read: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            database_url: env_opt("DATABASE_URL"),

            port: std::env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            api_key: env_opt("API_KEY"),

            translation_provider: env_opt("TRANSLATION_PROVIDER")
                .map(|v| v.parse::<ProviderKind>())
                .transpose()
                .context("TRANSLATION_PROVIDER")?
                .unwrap_or(ProviderKind::None),
            translation_api_key: env_opt("TRANSLATION_API_KEY"),
            translation_api_url: env_opt("TRANSLATION_API_URL")
                .unwrap_or_else(|| DEFAULT_TRANSLATION_API_URL.to_string()),

            supported_locales: match env_opt("SUPPORTED_LOCALES") {
                Some(v) => parse_locale_list("SUPPORTED_LOCALES", &v)?,
                None => Locale::all(),
            },
            default_locale: match env_opt("DEFAULT_LOCALE") {
                Some(v) => Locale::from_code(&v).map_err(|source| ConfigError::InvalidLocale {
                    var: "DEFAULT_LOCALE",
                    source,
                })?,
                None => Locale::AR,
            },
            fallback_order: match env_opt("FALLBACK_ORDER") {
                Some(v) => parse_locale_list("FALLBACK_ORDER", &v)?,
                None => vec![Locale::AR, Locale::KU],
            },

            glossary_path: env_opt("GLOSSARY_PATH"),
            backfill_on_read: match env_opt("BACKFILL_ON_READ") {
                Some(v) => parse_bool("BACKFILL_ON_READ", &v)?,
                None => false,
            },
        };

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Cross-field checks that single-variable parsing cannot catch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.supported_locales.is_empty() {
            return Err(ConfigError::EmptyLocaleList {
                var: "SUPPORTED_LOCALES",
            });
        }
        if !self.supported_locales.contains(&self.default_locale) {
            return Err(ConfigError::DefaultNotSupported(self.default_locale));
        }
        if let Some(locale) = self
            .fallback_order
            .iter()
            .find(|l| !self.supported_locales.contains(l))
        {
            return Err(ConfigError::FallbackNotSupported(*locale));
        }
        Ok(())
    }

    /// A provider is only usable when it is selected and has credentials.
    pub fn provider_enabled(&self) -> bool {
        self.translation_provider != ProviderKind::None && self.translation_api_key.is_some()
    }

    /// Map a `lang` query value onto a supported locale, or the default.
    pub fn resolve_lang(&self, lang: Option<&str>) -> Locale {
        lang.and_then(|code| Locale::from_code(code).ok())
            .filter(|locale| self.supported_locales.contains(locale))
            .unwrap_or(self.default_locale)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            port: 8080,
            api_key: None,
            translation_provider: ProviderKind::None,
            translation_api_key: None,
            translation_api_url: DEFAULT_TRANSLATION_API_URL.to_string(),
            supported_locales: Locale::all(),
            default_locale: Locale::AR,
            fallback_order: vec![Locale::AR, Locale::KU],
            glossary_path: None,
            backfill_on_read: false,
        }
    }
}

/// Read an environment variable, treating empty values as unset.
fn env_opt(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse "en, ar,ku" into locales, keeping first occurrence order.
fn parse_locale_list(var: &'static str, value: &str) -> Result<Vec<Locale>, ConfigError> {
    let mut locales = Vec::new();
    for code in value.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        let locale =
            Locale::from_code(code).map_err(|source| ConfigError::InvalidLocale { var, source })?;
        if !locales.contains(&locale) {
            locales.push(locale);
        }
    }
    if locales.is_empty() {
        return Err(ConfigError::EmptyLocaleList { var });
    }
    Ok(locales)
}

fn parse_bool(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value: value.to_string(),
        }),
    }
}
