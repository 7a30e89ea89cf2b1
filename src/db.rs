//! Event and translation storage.
//!
//! The pipeline only talks to [`EntityStore`]. `PgStore` is the production
//! implementation; `MemoryStore` backs tests and local runs without a
//! database. Both keep at most one translation per `(event, locale)` and
//! write a locale's three fields in a single atomic upsert.

use crate::error::StoreError;
use crate::i18n::Locale;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub type EventId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub id: EventId,
    /// Locale the event was authored in; backfill never overwrites it
    pub source_locale: Locale,
    pub created_at: DateTime<Utc>,
}

/// Text fields of an event in one locale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub locale: Locale,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

/// A new event together with its source-locale text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEvent {
    pub source_locale: Locale,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
}

impl NewEvent {
    pub fn source_translation(&self) -> Translation {
        Translation {
            locale: self.source_locale,
            title: self.title.clone(),
            description: self.description.clone(),
            location: self.location.clone(),
        }
    }
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Create an event and its source-locale translation together.
    async fn create_event(&self, new_event: &NewEvent) -> Result<Event, StoreError>;

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError>;

    /// All events, oldest first.
    async fn list_events(&self) -> Result<Vec<Event>, StoreError>;

    /// Delete an event and, by cascade, its translations.
    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError>;

    /// Translations of an event in insertion order.
    async fn get_translations(&self, event_id: EventId) -> Result<Vec<Translation>, StoreError>;

    /// Create or replace the translation for `(event_id, translation.locale)`.
    async fn upsert_translation(
        &self,
        event_id: EventId,
        translation: &Translation,
    ) -> Result<(), StoreError>;
}

// ==================== PostgreSQL ====================

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        let store = Self::from_pool(pool);
        store.init_schema().await?;
        info!("Connected to PostgreSQL event store");
        Ok(store)
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create tables if they do not exist yet. Safe to run on every start.
    pub async fn init_schema(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS events (
                id BIGSERIAL PRIMARY KEY,
                source_locale TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_translations (
                event_id BIGINT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
                locale TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                location TEXT NOT NULL DEFAULT '',
                seq BIGSERIAL NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                PRIMARY KEY (event_id, locale)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        debug!("Event store schema is ready");
        Ok(())
    }
}

fn event_from_row(row: &PgRow) -> Result<Event, StoreError> {
    let id: EventId = row.try_get("id")?;
    let code: String = row.try_get("source_locale")?;
    let source_locale = Locale::from_code(&code)
        .map_err(|e| StoreError::InvalidRecord(format!("event {}: {}", id, e)))?;

    Ok(Event {
        id,
        source_locale,
        created_at: row.try_get("created_at")?,
    })
}

/// Rows with a locale the registry does not declare are skipped.
fn translation_from_row(event_id: EventId, row: &PgRow) -> Result<Option<Translation>, StoreError> {
    let code: String = row.try_get("locale")?;
    let Ok(locale) = Locale::from_code(&code) else {
        warn!(
            "Skipping translation of event {} with undeclared locale '{}'",
            event_id, code
        );
        return Ok(None);
    };

    Ok(Some(Translation {
        locale,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
    }))
}

/// Foreign-key violation (SQLSTATE 23503): the event does not exist.
fn is_missing_parent(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code == "23503")
        .unwrap_or(false)
}

#[async_trait]
impl EntityStore for PgStore {
    async fn create_event(&self, new_event: &NewEvent) -> Result<Event, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            "INSERT INTO events (source_locale) VALUES ($1) RETURNING id, source_locale, created_at",
        )
        .bind(new_event.source_locale.code())
        .fetch_one(&mut *tx)
        .await?;
        let event = event_from_row(&row)?;

        sqlx::query(
            "INSERT INTO event_translations (event_id, locale, title, description, location)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id)
        .bind(new_event.source_locale.code())
        .bind(&new_event.title)
        .bind(&new_event.description)
        .bind(&new_event.location)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(event)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query("SELECT id, source_locale, created_at FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(event_from_row).transpose()
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        let rows = sqlx::query("SELECT id, source_locale, created_at FROM events ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in &rows {
            match event_from_row(row) {
                Ok(event) => events.push(event),
                Err(StoreError::InvalidRecord(msg)) => warn!("Skipping {}", msg),
                Err(e) => return Err(e),
            }
        }
        Ok(events)
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_translations(&self, event_id: EventId) -> Result<Vec<Translation>, StoreError> {
        let rows = sqlx::query(
            "SELECT locale, title, description, location
             FROM event_translations WHERE event_id = $1 ORDER BY seq",
        )
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let mut translations = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(translation) = translation_from_row(event_id, row)? {
                translations.push(translation);
            }
        }
        Ok(translations)
    }

    async fn upsert_translation(
        &self,
        event_id: EventId,
        translation: &Translation,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO event_translations (event_id, locale, title, description, location)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (event_id, locale) DO UPDATE SET
                title = EXCLUDED.title,
                description = EXCLUDED.description,
                location = EXCLUDED.location,
                updated_at = NOW()
            "#,
        )
        .bind(event_id)
        .bind(translation.locale.code())
        .bind(&translation.title)
        .bind(&translation.description)
        .bind(&translation.location)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_missing_parent(&e) {
                StoreError::EventNotFound(event_id)
            } else {
                StoreError::Database(e)
            }
        })?;

        Ok(())
    }
}

// ==================== In-memory ====================

#[derive(Debug, Default)]
struct MemoryState {
    last_id: EventId,
    events: Vec<Event>,
    translations: HashMap<EventId, Vec<Translation>>,
}

/// Process-local store with the same semantics as `PgStore`.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn create_event(&self, new_event: &NewEvent) -> Result<Event, StoreError> {
        let mut state = self.state.write().await;
        state.last_id += 1;
        let event = Event {
            id: state.last_id,
            source_locale: new_event.source_locale,
            created_at: Utc::now(),
        };
        state.events.push(event.clone());
        state
            .translations
            .insert(event.id, vec![new_event.source_translation()]);
        Ok(event)
    }

    async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let state = self.state.read().await;
        Ok(state.events.iter().find(|e| e.id == id).cloned())
    }

    async fn list_events(&self) -> Result<Vec<Event>, StoreError> {
        Ok(self.state.read().await.events.clone())
    }

    async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        let before = state.events.len();
        state.events.retain(|e| e.id != id);
        state.translations.remove(&id);
        Ok(state.events.len() < before)
    }

    async fn get_translations(&self, event_id: EventId) -> Result<Vec<Translation>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .translations
            .get(&event_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upsert_translation(
        &self,
        event_id: EventId,
        translation: &Translation,
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if !state.events.iter().any(|e| e.id == event_id) {
            return Err(StoreError::EventNotFound(event_id));
        }

        let records = state.translations.entry(event_id).or_default();
        match records.iter_mut().find(|t| t.locale == translation.locale) {
            Some(existing) => *existing = translation.clone(),
            None => records.push(translation.clone()),
        }
        Ok(())
    }
}
