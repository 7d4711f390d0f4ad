//! Note endpoints

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::http::error::ApiError;
use crate::http::extractors::{ValidJson, ValidNoteId};
use crate::http::server::AppState;
use crate::models::{ListParams, Note, NoteContent, NoteId, NotePage, NoteTitle, DEFAULT_LIMIT};
use crate::store::with_deadline;

/// Create/update note request
#[derive(Deserialize)]
pub struct NoteRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl NoteRequest {
    fn validate(&self) -> Result<(NoteTitle, NoteContent), ApiError> {
        Ok((NoteTitle::new(&self.title)?, NoteContent::new(&self.content)?))
    }
}

/// Batch read request
#[derive(Deserialize)]
pub struct BatchRequest {
    #[serde(default)]
    pub ids: Vec<NoteId>,
}

/// Batch read response
#[derive(Serialize)]
pub struct BatchResponse {
    pub items: Vec<Note>,
}

/// List query string
///
/// Values are kept as raw strings: one that doesn't parse is treated as
/// absent rather than rejected.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub cursor_created_at: Option<String>,
    pub cursor_id: Option<String>,
    pub q: Option<String>,
}

impl From<ListQuery> for ListParams {
    fn from(query: ListQuery) -> Self {
        Self {
            limit: query
                .limit
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_LIMIT),
            cursor_created_at: query
                .cursor_created_at
                .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            cursor_id: query.cursor_id.and_then(|v| v.parse().ok()),
            query: query.q.filter(|q| !q.is_empty()),
        }
    }
}

/// POST /notes - create a note
async fn create_note(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let (title, content) = req.validate()?;

    let note = with_deadline(state.request_timeout, state.store.create(&title, &content)).await?;
    tracing::info!(note_id = note.id, "note created");

    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /notes - list notes (search, keyset continuation or first page)
async fn list_notes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<NotePage>, ApiError> {
    let params = ListParams::from(query);
    let items = with_deadline(state.request_timeout, state.store.list(&params)).await?;

    Ok(Json(NotePage::new(items)))
}

/// POST /notes/batch - read many notes in one query
async fn batch_notes(
    State(state): State<Arc<AppState>>,
    ValidJson(req): ValidJson<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    let items = with_deadline(state.request_timeout, state.store.batch_get(&req.ids)).await?;
    Ok(Json(BatchResponse { items }))
}

/// GET /notes/{id} - get a single note
async fn get_note(
    State(state): State<Arc<AppState>>,
    ValidNoteId(id): ValidNoteId,
) -> Result<Json<Note>, ApiError> {
    let note = with_deadline(state.request_timeout, state.store.get(id)).await?;
    Ok(Json(note))
}

/// PUT /notes/{id} - replace title and content
async fn update_note(
    State(state): State<Arc<AppState>>,
    ValidNoteId(id): ValidNoteId,
    ValidJson(req): ValidJson<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let (title, content) = req.validate()?;

    let note = with_deadline(state.request_timeout, state.store.update(id, &title, &content)).await?;
    Ok(Json(note))
}

/// DELETE /notes/{id} - delete a note
async fn delete_note(
    State(state): State<Arc<AppState>>,
    ValidNoteId(id): ValidNoteId,
) -> Result<StatusCode, ApiError> {
    with_deadline(state.request_timeout, state.store.delete(id)).await?;
    tracing::info!(note_id = id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Note routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/notes", get(list_notes).post(create_note))
        .route("/notes/batch", post(batch_notes))
        .route("/notes/{id}", get(get_note).put(update_note).delete(delete_note))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::db::MemoryNoteStore;
    use crate::http::server::build_router;

    fn app() -> (Router, Arc<MemoryNoteStore>) {
        let store = Arc::new(MemoryNoteStore::new());
        let state = AppState {
            store: store.clone(),
            request_timeout: Duration::from_secs(5),
        };
        (build_router(state, false), store)
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_owned())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn create(app: &Router, title: &str) -> Value {
        let body = format!(r#"{{"title":"{title}","content":"body"}}"#);
        let (status, note) = send(app, "POST", "/notes", Some(&body)).await;
        assert_eq!(status, StatusCode::CREATED);
        note
    }

    #[test]
    fn list_query_ignores_garbage() {
        let params = ListParams::from(ListQuery {
            limit: Some("ten".into()),
            cursor_created_at: Some("yesterday".into()),
            cursor_id: Some("7".into()),
            q: Some(String::new()),
        });
        assert_eq!(params.limit, DEFAULT_LIMIT);
        assert!(params.cursor_created_at.is_none());
        assert_eq!(params.cursor_id, Some(7));
        assert!(params.query.is_none());
    }

    #[tokio::test]
    async fn create_returns_201_with_note() {
        let (app, _) = app();
        let note = create(&app, "first").await;
        assert_eq!(note["id"], 1);
        assert_eq!(note["title"], "first");
        assert!(note["created_at"].is_string());
    }

    #[tokio::test]
    async fn create_rejects_empty_fields_and_bad_json() {
        let (app, store) = app();

        let (status, body) =
            send(&app, "POST", "/notes", Some(r#"{"title":"","content":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");

        let (status, _) = send(&app, "POST", "/notes", Some(r#"{"title":"x"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/notes", Some("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // Nothing reached the store
        assert_eq!(store.round_trips(), 0);
    }

    #[tokio::test]
    async fn create_decodes_body_whatever_the_content_type() {
        let (app, _) = app();

        for content_type in [Some("application/x-www-form-urlencoded"), None] {
            let mut builder = Request::builder().method("POST").uri("/notes");
            if let Some(content_type) = content_type {
                builder = builder.header("content-type", content_type);
            }
            let response = app
                .clone()
                .oneshot(
                    builder
                        .body(Body::from(r#"{"title":"t","content":"c"}"#))
                        .unwrap(),
                )
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
        }

        let (_, page) = send(&app, "GET", "/notes", None).await;
        assert_eq!(page["items"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn get_update_delete_lifecycle() {
        let (app, _) = app();
        let created = create(&app, "draft").await;

        let (status, fetched) = send(&app, "GET", "/notes/1", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, created);

        let (status, updated) = send(
            &app,
            "PUT",
            "/notes/1",
            Some(r#"{"title":"final","content":"done"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["title"], "final");
        assert_eq!(updated["created_at"], created["created_at"]);

        let (status, _) = send(&app, "DELETE", "/notes/1", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&app, "GET", "/notes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");

        let (status, _) = send(&app, "DELETE", "/notes/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn non_integer_id_is_400() {
        let (app, _) = app();
        for method in ["GET", "DELETE"] {
            let (status, _) = send(&app, method, "/notes/abc", None).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        let (status, _) = send(
            &app,
            "PUT",
            "/notes/abc",
            Some(r#"{"title":"t","content":"c"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_missing_is_404_and_creates_nothing() {
        let (app, _) = app();
        let (status, _) = send(
            &app,
            "PUT",
            "/notes/42",
            Some(r#"{"title":"t","content":"c"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (_, page) = send(&app, "GET", "/notes", None).await;
        assert_eq!(page["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn list_pages_with_cursor() {
        let (app, _) = app();
        let a = create(&app, "A").await;
        let b = create(&app, "B").await;
        let c = create(&app, "C").await;

        let (status, first) = send(&app, "GET", "/notes?limit=2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(first["items"], serde_json::json!([c, b]));
        assert_eq!(first["next_cursor_id"], b["id"]);
        assert_eq!(first["next_cursor_created_at"], b["created_at"]);

        let uri = format!(
            "/notes?limit=2&cursor_created_at={}&cursor_id={}",
            first["next_cursor_created_at"].as_str().unwrap(),
            first["next_cursor_id"]
        );
        let (_, second) = send(&app, "GET", &uri, None).await;
        assert_eq!(second["items"], serde_json::json!([a]));

        let uri = format!(
            "/notes?limit=2&cursor_created_at={}&cursor_id={}",
            second["next_cursor_created_at"].as_str().unwrap(),
            second["next_cursor_id"]
        );
        let (_, third) = send(&app, "GET", &uri, None).await;
        assert_eq!(third, serde_json::json!({ "items": [] }));
    }

    #[tokio::test]
    async fn search_filters_titles() {
        let (app, _) = app();
        create(&app, "shopping list").await;
        let target = create(&app, "meeting notes").await;

        let (_, found) = send(&app, "GET", "/notes?q=meeting&cursor_id=1", None).await;
        assert_eq!(found["items"], serde_json::json!([target]));

        let (_, none) = send(&app, "GET", "/notes?q=holiday", None).await;
        assert_eq!(none["items"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn batch_returns_matches_newest_first() {
        let (app, store) = app();
        let a = create(&app, "a").await;
        create(&app, "b").await;
        let c = create(&app, "c").await;

        let (status, body) =
            send(&app, "POST", "/notes/batch", Some(r#"{"ids":[3,1,3,99]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], serde_json::json!([c, a]));

        let before = store.round_trips();
        let (status, body) = send(&app, "POST", "/notes/batch", Some(r#"{"ids":[]}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"], serde_json::json!([]));
        assert_eq!(store.round_trips(), before);
    }
}
