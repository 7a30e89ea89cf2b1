//! HTTP surface for localized event reads and editorial writes.
//!
//! Every read takes an optional `lang` query parameter. Unknown or
//! unsupported values resolve to the configured default locale, so a read
//! never fails because of the requested language.

use crate::config::Config;
use crate::db::{EventId, NewEvent};
use crate::error::StoreError;
use crate::i18n::{Locale, MetricsReport, TextDirection};
use crate::pipeline::{BackfillReport, LocalizationPipeline, LocalizedProjection};
use crate::security::{api_key_matches, API_KEY_HEADER};
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<LocalizationPipeline>,
    pub config: Arc<Config>,
}

#[derive(Debug, Deserialize)]
pub struct LangQuery {
    pub lang: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LocaleInfo {
    pub code: Locale,
    pub name: &'static str,
    pub native_name: &'static str,
    pub direction: TextDirection,
    /// Locales tried, in order, when this one is requested
    pub fallback_chain: Vec<Locale>,
}

#[derive(Debug, Serialize)]
pub struct LocalesResponse {
    pub default_locale: Locale,
    pub fallback_order: Vec<Locale>,
    pub locales: Vec<LocaleInfo>,
}

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    NotFound(EventId),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::EventNotFound(id) => ApiError::NotFound(id),
            other => ApiError::Store(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Invalid API key".to_string()),
            ApiError::NotFound(id) => (StatusCode::NOT_FOUND, format!("Event {} not found", id)),
            ApiError::Store(e) => {
                error!("Store failure: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Event store unavailable".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/locales", get(list_locales))
        .route("/metrics", get(metrics))
        .route("/events", get(list_events).post(create_event))
        .route("/events/:id", get(get_event))
        .route("/events/:id/backfill", post(backfill_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authorize(headers: &HeaderMap, config: &Config) -> Result<(), ApiError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    if api_key_matches(config.api_key.as_deref(), provided) {
        Ok(())
    } else {
        warn!("Rejected write request with missing or invalid API key");
        Err(ApiError::Unauthorized)
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn list_locales(State(state): State<AppState>) -> Json<LocalesResponse> {
    let resolver = state.pipeline.resolver();
    let locales = state
        .config
        .supported_locales
        .iter()
        .map(|locale| LocaleInfo {
            code: *locale,
            name: locale.name(),
            native_name: locale.native_name(),
            direction: locale.direction(),
            fallback_chain: resolver.chain(*locale),
        })
        .collect();

    Json(LocalesResponse {
        default_locale: state.config.default_locale,
        fallback_order: state.config.fallback_order.clone(),
        locales,
    })
}

async fn metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.pipeline.metrics().report())
}

async fn list_events(
    Query(query): Query<LangQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<LocalizedProjection>>, ApiError> {
    let locale = state.config.resolve_lang(query.lang.as_deref());
    let projections = state.pipeline.list_localized(locale).await?;
    Ok(Json(projections))
}

async fn get_event(
    Path(id): Path<EventId>,
    Query(query): Query<LangQuery>,
    State(state): State<AppState>,
) -> Result<Json<LocalizedProjection>, ApiError> {
    let locale = state.config.resolve_lang(query.lang.as_deref());
    state
        .pipeline
        .localize(id, locale)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

async fn create_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(new_event): Json<NewEvent>,
) -> Result<impl IntoResponse, ApiError> {
    authorize(&headers, &state.config)?;
    let event = state.pipeline.create_event(&new_event).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn backfill_event(
    Path(id): Path<EventId>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<BackfillReport>, ApiError> {
    authorize(&headers, &state.config)?;
    state
        .pipeline
        .backfill_by_id(id)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{EntityStore, MemoryStore};
    use crate::i18n::{Glossary, TranslationMetrics};
    use crate::translation::Translator;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_state(api_key: Option<&str>) -> (AppState, Arc<MemoryStore>) {
        let config = Config {
            api_key: api_key.map(str::to_string),
            ..Config::default()
        };
        let store = Arc::new(MemoryStore::new());
        let translator = Translator::new(
            None,
            Arc::new(Glossary::empty()),
            Arc::new(TranslationMetrics::new()),
        );
        let pipeline = LocalizationPipeline::new(store.clone(), translator, &config);
        let state = AppState {
            pipeline: Arc::new(pipeline),
            config: Arc::new(config),
        };
        (state, store)
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn seed_event() -> NewEvent {
        NewEvent {
            source_locale: Locale::EN,
            title: "Book Fair".to_string(),
            description: "Annual fair".to_string(),
            location: "Baghdad".to_string(),
        }
    }

    // ==================== Read Endpoint Tests ====================

    #[tokio::test]
    async fn test_health() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_locales_lists_rtl_directions() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(Request::get("/locales").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["default_locale"], "ar");
        assert_eq!(json["fallback_order"], serde_json::json!(["ar", "ku"]));
        assert_eq!(json["locales"][0]["code"], "en");
        assert_eq!(json["locales"][1]["direction"], "rtl");
        assert_eq!(json["locales"][2]["native_name"], "کوردی");
        assert_eq!(
            json["locales"][0]["fallback_chain"],
            serde_json::json!(["en", "ar", "ku"])
        );
        assert_eq!(json["locales"][2]["fallback_chain"], serde_json::json!(["ku", "ar"]));
    }

    #[tokio::test]
    async fn test_get_event_falls_back() {
        let (state, store) = test_state(None).await;
        let event = store.create_event(&seed_event()).await.unwrap();

        let response = create_router(state)
            .oneshot(
                Request::get(format!("/events/{}?lang=ku", event.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["requested_locale"], "ku");
        assert_eq!(json["resolved_locale"], "en");
        assert_eq!(json["title"], "Book Fair");
    }

    #[tokio::test]
    async fn test_unknown_lang_uses_default() {
        let (state, store) = test_state(None).await;
        let event = store.create_event(&seed_event()).await.unwrap();

        let response = create_router(state)
            .oneshot(
                Request::get(format!("/events/{}?lang=tr", event.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["requested_locale"], "ar");
    }

    #[tokio::test]
    async fn test_get_missing_event_is_404() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(Request::get("/events/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert!(json["error"].as_str().unwrap().contains("42"));
    }

    #[tokio::test]
    async fn test_list_events() {
        let (state, store) = test_state(None).await;
        store.create_event(&seed_event()).await.unwrap();
        store.create_event(&seed_event()).await.unwrap();

        let response = create_router(state)
            .oneshot(Request::get("/events?lang=en").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert_eq!(json[0]["resolved_locale"], "en");
    }

    // ==================== Write Endpoint Tests ====================

    fn create_request(key: Option<&str>) -> Request<Body> {
        let mut builder = Request::post("/events").header("content-type", "application/json");
        if let Some(key) = key {
            builder = builder.header(API_KEY_HEADER, key);
        }
        builder
            .body(Body::from(
                r#"{"source_locale":"ar","title":"معرض الكتاب","location":"بغداد"}"#,
            ))
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_event_with_key() {
        let (state, store) = test_state(Some("secret")).await;
        let response = create_router(state)
            .oneshot(create_request(Some("secret")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let json = body_json(response).await;
        assert_eq!(json["source_locale"], "ar");

        let id = json["id"].as_i64().unwrap();
        let translations = store.get_translations(id).await.unwrap();
        assert_eq!(translations.len(), 1);
        assert_eq!(translations[0].description, "");
    }

    #[tokio::test]
    async fn test_create_event_rejects_bad_key() {
        let (state, store) = test_state(Some("secret")).await;
        let response = create_router(state)
            .oneshot(create_request(Some("guess")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(store.list_events().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_event_open_without_configured_key() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(create_request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_backfill_with_provider_disabled() {
        let (state, store) = test_state(None).await;
        let event = store.create_event(&seed_event()).await.unwrap();

        let response = create_router(state)
            .oneshot(
                Request::post(format!("/events/{}/backfill", event.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["provider_enabled"], false);
        assert_eq!(json["missing"], serde_json::json!(["ar", "ku"]));
        assert_eq!(json["results"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_backfill_missing_event_is_404() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(Request::post("/events/7/backfill").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    // ==================== Error Mapping Tests ====================

    #[tokio::test]
    async fn test_store_error_maps_to_503_without_driver_detail() {
        let response = ApiError::from(StoreError::Database(sqlx::Error::PoolClosed)).into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Event store unavailable");
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (state, _) = test_state(None).await;
        let response = create_router(state)
            .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["provider_calls"], 0);
    }
}
