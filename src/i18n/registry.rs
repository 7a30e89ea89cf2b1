//! Locale registry: single source of truth for every content locale.
//!
//! Adding a locale means adding one `LocaleConfig` here. Everything else
//! (parsing, `lang` query handling, backfill targets, provider codes) reads
//! from this table. The registry is immutable after first access.

use std::sync::OnceLock;

/// Text direction of a locale's script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Configuration for a supported content locale.
#[derive(Debug, Clone)]
pub struct LocaleConfig {
    /// Short locale code stored with translations (e.g., "en", "ar", "ku")
    pub code: &'static str,

    /// English name of the language (e.g., "Arabic")
    pub name: &'static str,

    /// Native name of the language (e.g., "العربية")
    pub native_name: &'static str,

    /// Script direction, used by clients for layout
    pub direction: TextDirection,

    /// Language code understood by the machine-translation provider.
    /// Iraqi Kurdish content is Sorani, which Google addresses as "ckb".
    pub provider_code: &'static str,
}

/// Registry of all declared locales, in their fixed order.
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
}

static REGISTRY: OnceLock<LocaleRegistry> = OnceLock::new();

impl LocaleRegistry {
    /// Get the registry, initializing it on first access.
    pub fn get() -> &'static LocaleRegistry {
        REGISTRY.get_or_init(|| LocaleRegistry {
            locales: declared_locales(),
        })
    }

    /// Look up a locale by its code. Matching is exact.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All declared locales in their fixed order.
    pub fn list_all(&self) -> Vec<&LocaleConfig> {
        self.locales.iter().collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.get_by_code(code).is_some()
    }
}

fn declared_locales() -> Vec<LocaleConfig> {
    vec![
        LocaleConfig {
            code: "en",
            name: "English",
            native_name: "English",
            direction: TextDirection::Ltr,
            provider_code: "en",
        },
        LocaleConfig {
            code: "ar",
            name: "Arabic",
            native_name: "العربية",
            direction: TextDirection::Rtl,
            provider_code: "ar",
        },
        LocaleConfig {
            code: "ku",
            name: "Kurdish",
            native_name: "کوردی",
            direction: TextDirection::Rtl,
            provider_code: "ckb",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_get_returns_singleton() {
        let registry1 = LocaleRegistry::get();
        let registry2 = LocaleRegistry::get();
        assert!(std::ptr::eq(registry1, registry2));
    }

    #[test]
    fn test_declared_order_is_en_ar_ku() {
        let codes: Vec<_> = LocaleRegistry::get()
            .list_all()
            .iter()
            .map(|l| l.code)
            .collect();
        assert_eq!(codes, vec!["en", "ar", "ku"]);
    }

    #[test]
    fn test_get_by_code_arabic() {
        let config = LocaleRegistry::get().get_by_code("ar").unwrap();
        assert_eq!(config.name, "Arabic");
        assert_eq!(config.native_name, "العربية");
        assert_eq!(config.direction, TextDirection::Rtl);
    }

    #[test]
    fn test_kurdish_uses_sorani_provider_code() {
        let config = LocaleRegistry::get().get_by_code("ku").unwrap();
        assert_eq!(config.provider_code, "ckb");
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = LocaleRegistry::get();
        assert!(registry.get_by_code("AR").is_none());
        assert!(registry.get_by_code("ar-IQ").is_none());
        assert!(!registry.contains("fr"));
        assert!(registry.contains("en"));
    }
}
