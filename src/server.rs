use crate::error::AppError;
use crate::history::ChatRecord;
use crate::language::{Language, DEFAULT_LANGUAGE, SUPPORTED_LANGUAGES};
use crate::orchestrator::{GenerateRequest, Orchestrator};
use crate::security;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub orchestrator: Orchestrator,
    /// Bearer token required on /api routes when set
    pub api_key: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/chats", get(list_chats))
        .route("/api/languages", get(list_languages))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), AppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    if security::is_authorized(state.api_key.as_deref(), authorization) {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

// ==================== Health ====================

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    history_backend: &'static str,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        history_backend: state.orchestrator.store_backend(),
    })
}

// ==================== Generate ====================

/// Request body for `/api/generate`.
///
/// Each field accepts several names, but only one of them per request:
/// naming the same field twice is a duplicate-field error (400).
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateBody {
    #[serde(alias = "ownerId")]
    pub owner_id: String,
    #[serde(alias = "sourceText", alias = "post")]
    pub source_text: String,
    #[serde(alias = "targetLanguage", alias = "language")]
    pub target_language: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    pub success: bool,
    pub message: String,
    pub chat: ChatRecord,
}

async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Result<Json<GenerateResponse>, AppError> {
    authorize(&state, &headers)?;
    let Json(body) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let generation = state
        .orchestrator
        .generate(GenerateRequest {
            owner_id: body.owner_id,
            source_text: body.source_text,
            target_language: body.target_language,
        })
        .await?;

    Ok(Json(GenerateResponse {
        success: true,
        message: generation.text,
        chat: generation.chat,
    }))
}

// ==================== History ====================

#[derive(Debug, Deserialize)]
pub struct ChatsQuery {
    #[serde(alias = "ownerId")]
    pub owner_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatsResponse {
    pub success: bool,
    pub chats: Vec<ChatRecord>,
}

async fn list_chats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ChatsQuery>,
) -> Result<Json<ChatsResponse>, AppError> {
    authorize(&state, &headers)?;

    let owner_id = query
        .owner_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("owner_id is required".to_string()))?;

    let chats = state.orchestrator.history(&owner_id).await?;

    Ok(Json(ChatsResponse {
        success: true,
        chats,
    }))
}

// ==================== Languages ====================

#[derive(Debug, Serialize)]
struct LanguagesResponse {
    languages: &'static [Language],
    default: &'static str,
}

async fn list_languages(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<LanguagesResponse>, AppError> {
    authorize(&state, &headers)?;

    Ok(Json(LanguagesResponse {
        languages: SUPPORTED_LANGUAGES,
        default: DEFAULT_LANGUAGE,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_body_snake_case() {
        let body: GenerateBody = serde_json::from_str(
            r#"{"owner_id":"u1","source_text":"Hello","target_language":"French"}"#,
        )
        .unwrap();
        assert_eq!(body.owner_id, "u1");
        assert_eq!(body.source_text, "Hello");
        assert_eq!(body.target_language.as_deref(), Some("French"));
    }

    #[test]
    fn test_generate_body_aliases() {
        let body: GenerateBody =
            serde_json::from_str(r#"{"ownerId":"u1","post":"Hello","language":"Hindi"}"#).unwrap();
        assert_eq!(body.owner_id, "u1");
        assert_eq!(body.source_text, "Hello");
        assert_eq!(body.target_language.as_deref(), Some("Hindi"));

        let body: GenerateBody = serde_json::from_str(
            r#"{"ownerId":"u2","sourceText":"Hi","targetLanguage":"German"}"#,
        )
        .unwrap();
        assert_eq!(body.owner_id, "u2");
        assert_eq!(body.source_text, "Hi");
        assert_eq!(body.target_language.as_deref(), Some("German"));
    }

    #[test]
    fn test_generate_body_rejects_two_names_for_one_field() {
        let err = serde_json::from_str::<GenerateBody>(
            r#"{"owner_id":"u1","post":"Hi","source_text":"Hello"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate field"));
    }

    #[test]
    fn test_generate_body_missing_fields_default() {
        let body: GenerateBody = serde_json::from_str("{}").unwrap();
        assert!(body.owner_id.is_empty());
        assert!(body.source_text.is_empty());
        assert!(body.target_language.is_none());
    }
}
