//! Internationalization (i18n) for event content.
//!
//! # Architecture
//!
//! - `registry`: Single source of truth for all content locales and their metadata
//! - `locale`: Validated `Locale` value type
//! - `fallback`: Picks the stored translation to show for a requested locale
//! - `glossary`: Fixed domain terminology applied after machine translation
//! - `metrics`: Translation and backfill counters
//!
//! # Example
//!
//! ```rust,ignore
//! use event_localization::i18n::{Glossary, Locale, LocaleResolver};
//!
//! let resolver = LocaleResolver::default();
//! let chosen = resolver.resolve(Locale::AR, &[Locale::EN, Locale::KU]);
//! assert_eq!(chosen, Some(Locale::KU));
//!
//! let glossary = Glossary::builtin()?;
//! assert_eq!(glossary.apply("Event Night", Locale::KU), "بۆنە Night");
//! ```

mod fallback;
mod glossary;
mod locale;
mod metrics;
mod registry;

pub use fallback::LocaleResolver;
pub use glossary::{Glossary, GlossaryEntry};
pub use locale::Locale;
pub use metrics::{MetricsReport, TranslationMetrics};
pub use registry::{LocaleConfig, LocaleRegistry, TextDirection};
