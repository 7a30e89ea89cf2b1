//! Locale fallback resolution.
//!
//! Picks which stored translation to show for a requested locale. The chain
//! is: the requested locale, then the configured fallback order, then
//! whatever the entity has first. An entity with no translations resolves to
//! `None` and callers render empty fields.

use crate::i18n::Locale;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleResolver {
    fallback_order: Vec<Locale>,
}

impl LocaleResolver {
    pub fn new(fallback_order: Vec<Locale>) -> Self {
        Self { fallback_order }
    }

    pub fn fallback_order(&self) -> &[Locale] {
        &self.fallback_order
    }

    /// Resolve `requested` against the locales an entity actually has.
    ///
    /// `available` is taken in its own order, which is the last tiebreaker.
    /// The result is always a member of `available`, or `None` when it is empty.
    pub fn resolve(&self, requested: Locale, available: &[Locale]) -> Option<Locale> {
        if available.contains(&requested) {
            return Some(requested);
        }

        self.fallback_order
            .iter()
            .find(|locale| available.contains(locale))
            .or_else(|| available.first())
            .copied()
    }

    /// The ordered list of locales that would be tried for `requested`,
    /// without duplicates.
    pub fn chain(&self, requested: Locale) -> Vec<Locale> {
        let mut chain = vec![requested];
        for locale in &self.fallback_order {
            if !chain.contains(locale) {
                chain.push(*locale);
            }
        }
        chain
    }
}

impl Default for LocaleResolver {
    fn default() -> Self {
        Self::new(vec![Locale::AR, Locale::KU])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ==================== Resolution Order Tests ====================

    #[test]
    fn test_exact_match_wins() {
        let resolver = LocaleResolver::default();
        let available = [Locale::EN, Locale::AR, Locale::KU];
        assert_eq!(resolver.resolve(Locale::EN, &available), Some(Locale::EN));
    }

    #[test]
    fn test_requested_ar_absent_falls_to_ku() {
        let resolver = LocaleResolver::default();
        let available = [Locale::EN, Locale::KU];
        assert_eq!(resolver.resolve(Locale::AR, &available), Some(Locale::KU));
    }

    #[test]
    fn test_fallback_order_beats_storage_order() {
        let resolver = LocaleResolver::default();
        let available = [Locale::EN, Locale::KU, Locale::AR];
        assert_eq!(resolver.resolve(Locale::EN, &[Locale::KU, Locale::AR]), Some(Locale::AR));
        assert_eq!(resolver.resolve(Locale::KU, &available), Some(Locale::KU));
    }

    #[test]
    fn test_first_available_when_no_fallback_present() {
        let resolver = LocaleResolver::default();
        assert_eq!(resolver.resolve(Locale::AR, &[Locale::EN]), Some(Locale::EN));
    }

    #[test]
    fn test_custom_order_is_respected() {
        let resolver = LocaleResolver::new(vec![Locale::EN]);
        let available = [Locale::KU, Locale::EN];
        assert_eq!(resolver.resolve(Locale::AR, &available), Some(Locale::EN));
    }

    #[test]
    fn test_empty_order_uses_storage_order() {
        let resolver = LocaleResolver::new(vec![]);
        let available = [Locale::KU, Locale::EN];
        assert_eq!(resolver.resolve(Locale::AR, &available), Some(Locale::KU));
    }

    #[test]
    fn test_empty_available_is_none() {
        let resolver = LocaleResolver::default();
        assert_eq!(resolver.resolve(Locale::AR, &[]), None);
    }

    // ==================== Chain Tests ====================

    #[test]
    fn test_chain_deduplicates_requested() {
        let resolver = LocaleResolver::default();
        assert_eq!(resolver.chain(Locale::AR), vec![Locale::AR, Locale::KU]);
        assert_eq!(
            resolver.chain(Locale::EN),
            vec![Locale::EN, Locale::AR, Locale::KU]
        );
    }

    // ==================== Properties ====================

    fn any_locale() -> impl Strategy<Value = Locale> {
        prop::sample::select(Locale::all())
    }

    fn any_available() -> impl Strategy<Value = Vec<Locale>> {
        prop::sample::subsequence(Locale::all(), 0..=3).prop_shuffle()
    }

    proptest! {
        #[test]
        fn prop_resolution_is_total(
            requested in any_locale(),
            available in any_available(),
            order in any_available(),
        ) {
            let resolver = LocaleResolver::new(order);
            match resolver.resolve(requested, &available) {
                Some(chosen) => prop_assert!(available.contains(&chosen)),
                None => prop_assert!(available.is_empty()),
            }
        }

        #[test]
        fn prop_resolution_is_deterministic(
            requested in any_locale(),
            available in any_available(),
        ) {
            let resolver = LocaleResolver::default();
            let first = resolver.resolve(requested, &available);
            let second = resolver.resolve(requested, &available);
            prop_assert_eq!(first, second);
        }
    }
}
