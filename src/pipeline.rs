//! Entity localization pipeline.
//!
//! Ties the store, the fallback resolver and the translator together:
//! projecting an event into one locale for display, and backfilling the
//! locales an event is missing.
//!
//! Backfill writes a locale only when all three text fields came back from
//! the provider. If any field fell back to the source text, nothing is stored
//! for that locale and the next backfill tries again.

use crate::config::Config;
use crate::db::{EntityStore, Event, EventId, MemoryStore, NewEvent, PgStore, Translation};
use crate::error::StoreError;
use crate::i18n::{Glossary, Locale, LocaleResolver, TranslationMetrics};
use crate::translation::{provider_from_config, TextOrigin, TranslatedText, Translator};
use anyhow::{Context, Result};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// An event's text resolved to a single locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalizedProjection {
    pub event_id: EventId,
    pub requested_locale: Locale,
    /// Locale the text actually comes from; `None` when the event has no
    /// translations at all and every field is empty
    pub resolved_locale: Option<Locale>,
    pub title: String,
    pub description: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BackfillOutcome {
    Written,
    /// The provider did not produce these fields; nothing was stored
    Untranslated { fields: Vec<&'static str> },
    PersistFailed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocaleBackfill {
    pub locale: Locale,
    #[serde(flatten)]
    pub outcome: BackfillOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub event_id: EventId,
    pub source_locale: Locale,
    pub provider_enabled: bool,
    /// Locales that had no translation when backfill started
    pub missing: Vec<Locale>,
    pub results: Vec<LocaleBackfill>,
}

impl BackfillReport {
    pub fn written(&self) -> Vec<Locale> {
        self.results
            .iter()
            .filter(|r| r.outcome == BackfillOutcome::Written)
            .map(|r| r.locale)
            .collect()
    }

    /// Every missing locale now has a stored translation.
    pub fn is_complete(&self) -> bool {
        let written = self.written();
        self.missing.iter().all(|locale| written.contains(locale))
    }
}

pub struct LocalizationPipeline {
    store: Arc<dyn EntityStore>,
    translator: Translator,
    resolver: LocaleResolver,
    supported_locales: Vec<Locale>,
    backfill_on_read: bool,
}

impl LocalizationPipeline {
    pub fn new(store: Arc<dyn EntityStore>, translator: Translator, config: &Config) -> Self {
        Self {
            store,
            translator,
            resolver: LocaleResolver::new(config.fallback_order.clone()),
            supported_locales: config.supported_locales.clone(),
            backfill_on_read: config.backfill_on_read,
        }
    }

    /// Build the store, glossary and provider described by `config`.
    ///
    /// Without `DATABASE_URL` the pipeline runs on an empty in-memory store.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store: Arc<dyn EntityStore> = match &config.database_url {
            Some(url) => Arc::new(
                PgStore::connect(url)
                    .await
                    .context("Failed to connect to PostgreSQL")?,
            ),
            None => {
                warn!("DATABASE_URL not set; using an in-memory event store");
                Arc::new(MemoryStore::new())
            }
        };

        let glossary = match &config.glossary_path {
            Some(path) => Glossary::from_json_file(path)
                .with_context(|| format!("Failed to load glossary from {}", path))?,
            None => Glossary::builtin().context("Built-in glossary is invalid")?,
        };

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        let translator = Translator::new(
            provider_from_config(config, client),
            Arc::new(glossary),
            Arc::new(TranslationMetrics::new()),
        );

        Ok(Self::new(store, translator, config))
    }

    pub fn translator(&self) -> &Translator {
        &self.translator
    }

    pub fn metrics(&self) -> &TranslationMetrics {
        self.translator.metrics()
    }

    pub fn resolver(&self) -> &LocaleResolver {
        &self.resolver
    }

    /// Project stored translations into `requested`, following the fallback chain.
    pub fn project(
        &self,
        event_id: EventId,
        translations: &[Translation],
        requested: Locale,
    ) -> LocalizedProjection {
        let available: Vec<Locale> = translations.iter().map(|t| t.locale).collect();
        let resolved = self.resolver.resolve(requested, &available);
        let record = resolved.and_then(|locale| translations.iter().find(|t| t.locale == locale));

        match record {
            Some(t) => LocalizedProjection {
                event_id,
                requested_locale: requested,
                resolved_locale: Some(t.locale),
                title: t.title.clone(),
                description: t.description.clone(),
                location: t.location.clone(),
            },
            None => LocalizedProjection {
                event_id,
                requested_locale: requested,
                resolved_locale: None,
                title: String::new(),
                description: String::new(),
                location: String::new(),
            },
        }
    }

    /// Localize one event, or `None` if it does not exist.
    ///
    /// With backfill-on-read enabled, a missing requested locale is
    /// translated and stored first.
    pub async fn localize(
        &self,
        event_id: EventId,
        requested: Locale,
    ) -> Result<Option<LocalizedProjection>, StoreError> {
        let Some(event) = self.store.get_event(event_id).await? else {
            return Ok(None);
        };

        let mut translations = self.store.get_translations(event_id).await?;

        let wants_backfill = self.backfill_on_read
            && self.translator.is_enabled()
            && self.supported_locales.contains(&requested)
            && !translations.iter().any(|t| t.locale == requested);

        if wants_backfill {
            debug!("Backfilling event {} on read for {}", event_id, requested);
            let report = self.backfill_from(&event, &translations).await;
            if !report.written().is_empty() {
                translations = self.store.get_translations(event_id).await?;
            }
        }

        Ok(Some(self.project(event_id, &translations, requested)))
    }

    /// Every event projected into `requested`. Never backfills.
    pub async fn list_localized(
        &self,
        requested: Locale,
    ) -> Result<Vec<LocalizedProjection>, StoreError> {
        let events = self.store.list_events().await?;
        let mut projections = Vec::with_capacity(events.len());
        for event in &events {
            let translations = self.store.get_translations(event.id).await?;
            projections.push(self.project(event.id, &translations, requested));
        }
        Ok(projections)
    }

    pub async fn create_event(&self, new_event: &NewEvent) -> Result<Event, StoreError> {
        let event = self.store.create_event(new_event).await?;
        info!(
            "Created event {} in {}",
            event.id, event.source_locale
        );
        Ok(event)
    }

    pub async fn get_event(&self, event_id: EventId) -> Result<Option<Event>, StoreError> {
        self.store.get_event(event_id).await
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        self.store.list_events().await
    }

    /// Translate and store every supported locale `event` is missing.
    pub async fn backfill(&self, event: &Event) -> Result<BackfillReport, StoreError> {
        let translations = self.store.get_translations(event.id).await?;
        Ok(self.backfill_from(event, &translations).await)
    }

    /// Backfill by id, or `None` if the event does not exist.
    pub async fn backfill_by_id(
        &self,
        event_id: EventId,
    ) -> Result<Option<BackfillReport>, StoreError> {
        match self.store.get_event(event_id).await? {
            Some(event) => self.backfill(&event).await.map(Some),
            None => Ok(None),
        }
    }

    /// Backfill each event in turn and return the ids still missing locales.
    ///
    /// A store failure on one event is logged and counted as incomplete; the
    /// remaining events are still processed.
    pub async fn backfill_events(&self, events: &[Event]) -> Vec<EventId> {
        let mut incomplete = Vec::new();
        for event in events {
            match self.backfill(event).await {
                Ok(report) if report.is_complete() => {}
                Ok(_) => incomplete.push(event.id),
                Err(e) => {
                    warn!("Failed to backfill event {}: {}", event.id, e);
                    incomplete.push(event.id);
                }
            }
        }
        incomplete
    }

    /// Supported locales with no stored translation, in declared order.
    /// The source locale is never a target, even when its record is missing.
    fn missing_locales(&self, event: &Event, translations: &[Translation]) -> Vec<Locale> {
        self.supported_locales
            .iter()
            .copied()
            .filter(|locale| *locale != event.source_locale)
            .filter(|locale| !translations.iter().any(|t| t.locale == *locale))
            .collect()
    }

    async fn backfill_from(&self, event: &Event, translations: &[Translation]) -> BackfillReport {
        let missing = self.missing_locales(event, translations);
        let mut report = BackfillReport {
            event_id: event.id,
            source_locale: event.source_locale,
            provider_enabled: self.translator.is_enabled(),
            missing: missing.clone(),
            results: Vec::new(),
        };

        if missing.is_empty() {
            debug!("Event {} has every supported locale", event.id);
            return report;
        }
        if !self.translator.is_enabled() {
            debug!(
                "Event {} is missing {:?} but translation is disabled",
                event.id, missing
            );
            return report;
        }

        // Translate from the authored record; fall back to whatever the
        // resolver would show for the source locale
        let available: Vec<Locale> = translations.iter().map(|t| t.locale).collect();
        let source = self
            .resolver
            .resolve(event.source_locale, &available)
            .and_then(|locale| translations.iter().find(|t| t.locale == locale));
        let Some(source) = source else {
            warn!("Event {} has no translations to backfill from", event.id);
            return report;
        };

        report.results = join_all(
            missing
                .iter()
                .map(|target| self.backfill_locale(event.id, source, *target)),
        )
        .await;

        info!(
            "Backfilled event {} from {}: {} of {} missing locales written",
            event.id,
            source.locale,
            report.written().len(),
            missing.len()
        );
        report
    }

    async fn backfill_locale(
        &self,
        event_id: EventId,
        source: &Translation,
        target: Locale,
    ) -> LocaleBackfill {
        let (title, description, location) = tokio::join!(
            self.translator
                .translate_detailed(&source.title, source.locale, target),
            self.translator
                .translate_detailed(&source.description, source.locale, target),
            self.translator
                .translate_detailed(&source.location, source.locale, target),
        );

        let untranslated: Vec<&'static str> = [
            ("title", &title),
            ("description", &description),
            ("location", &location),
        ]
        .into_iter()
        .filter(|(_, text)| text.origin == TextOrigin::SourceFallback)
        .map(|(field, _)| field)
        .collect();

        if !untranslated.is_empty() {
            self.metrics().record_backfill_untranslated();
            warn!(
                "Not storing {} for event {}: {:?} could not be translated",
                target, event_id, untranslated
            );
            return LocaleBackfill {
                locale: target,
                outcome: BackfillOutcome::Untranslated {
                    fields: untranslated,
                },
            };
        }

        let record = assemble(target, title, description, location);
        match self.store.upsert_translation(event_id, &record).await {
            Ok(()) => {
                self.metrics().record_backfill_written();
                LocaleBackfill {
                    locale: target,
                    outcome: BackfillOutcome::Written,
                }
            }
            Err(e) => {
                self.metrics().record_backfill_persist_failure();
                warn!(
                    "Failed to store {} translation of event {}: {}",
                    target, event_id, e
                );
                LocaleBackfill {
                    locale: target,
                    outcome: BackfillOutcome::PersistFailed {
                        error: e.to_string(),
                    },
                }
            }
        }
    }
}

fn assemble(
    locale: Locale,
    title: TranslatedText,
    description: TranslatedText,
    location: TranslatedText,
) -> Translation {
    Translation {
        locale,
        title: title.text,
        description: description.text,
        location: location.text,
    }
}
