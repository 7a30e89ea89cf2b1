//! Locale type: a content locale validated against the registry.

use crate::error::UnknownLocale;
use crate::i18n::registry::{LocaleConfig, LocaleRegistry, TextDirection};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A validated content locale.
///
/// Only codes declared in the [`LocaleRegistry`] can be turned into a
/// `Locale`, so holding one means the registry lookup cannot fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Locale {
    code: &'static str,
}

impl Locale {
    pub const EN: Locale = Locale { code: "en" };
    pub const AR: Locale = Locale { code: "ar" };
    pub const KU: Locale = Locale { code: "ku" };

    /// Create a Locale from a code string.
    ///
    /// Codes are trimmed and lowercased before lookup, so `" AR "` parses as
    /// Arabic. Region subtags are not stripped: `ar-IQ` is rejected.
    pub fn from_code(code: &str) -> Result<Locale, UnknownLocale> {
        let normalized = code.trim().to_ascii_lowercase();
        LocaleRegistry::get()
            .get_by_code(&normalized)
            .map(|config| Locale { code: config.code })
            .ok_or_else(|| UnknownLocale(code.to_string()))
    }

    /// Every declared locale, in registry order.
    pub fn all() -> Vec<Locale> {
        LocaleRegistry::get()
            .list_all()
            .into_iter()
            .map(|config| Locale { code: config.code })
            .collect()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Full registry entry for this locale.
    ///
    /// # Panics
    /// Never in practice: a `Locale` can only be built from a registry code.
    pub fn config(&self) -> &'static LocaleConfig {
        LocaleRegistry::get()
            .get_by_code(self.code)
            .expect("Locale code should always be in the registry")
    }

    pub fn name(&self) -> &'static str {
        self.config().name
    }

    pub fn native_name(&self) -> &'static str {
        self.config().native_name
    }

    pub fn direction(&self) -> TextDirection {
        self.config().direction
    }

    /// Code sent to the machine-translation provider.
    pub fn provider_code(&self) -> &'static str {
        self.config().provider_code
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code)
    }
}

impl FromStr for Locale {
    type Err = UnknownLocale;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Locale::from_code(s)
    }
}

impl Serialize for Locale {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code)
    }
}

impl<'de> Deserialize<'de> for Locale {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = String::deserialize(deserializer)?;
        Locale::from_code(&code).map_err(serde::de::Error::custom)
    }
}
