//! JSON-over-HTTP front end for [`NoteService`].
//!
//! The routes reproduce the `/api/notes` and `/api/categories` handlers the
//! web client calls, plus read-only views for the dashboard, vault and
//! community pages.
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use log::{error, info};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

use crate::{
    Category, CategorySummary, IdeaflowError, Note, NoteService, NoteStats, Result, TagCount,
};

type SharedService = Arc<NoteService>;

/// Error returned by handlers, rendered as `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(IdeaflowError);

impl From<IdeaflowError> for ApiError {
    fn from(err: IdeaflowError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else {
            error!("Request failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct LimitParams {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    id: String,
}

/// Builds the API router over a shared service.
pub fn router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/api/notes",
            get(list_notes).post(save_note).delete(delete_note),
        )
        .route("/api/notes/recent", get(recent_notes))
        .route("/api/notes/pinned", get(pinned_notes))
        .route("/api/notes/featured", get(featured_note))
        .route("/api/notes/search", get(search_notes))
        .route("/api/notes/{id}", get(get_note))
        .route("/api/categories", get(list_categories))
        .route("/api/categories/summary", get(category_summaries))
        .route("/api/categories/{id}", get(get_category))
        .route("/api/categories/{id}/notes", get(category_notes))
        .route("/api/tags/popular", get(popular_tags))
        .route("/api/community", get(community_notes))
        .route("/api/stats", get(stats))
        .with_state(service)
}

/// Serves the API on `addr` until Ctrl-C.
pub async fn serve(service: SharedService, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Ideaflow API listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Ideaflow API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Runs a service call on the blocking pool: every call reads the document
/// from disk, and writes also wait on the store's writer lock.
async fn blocking<T, F>(service: SharedService, call: F) -> std::result::Result<T, ApiError>
where
    F: FnOnce(&NoteService) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let outcome = tokio::task::spawn_blocking(move || call(&service))
        .await
        .map_err(|err| {
            error!("Store task failed: {}", err);
            IdeaflowError::TaskFailed {
                message: err.to_string(),
            }
        })?;
    Ok(outcome?)
}

async fn list_notes(State(service): State<SharedService>) -> ApiResult<Vec<Note>> {
    Ok(Json(blocking(service, |s| s.get_all_notes()).await?))
}

async fn save_note(
    State(service): State<SharedService>,
    Json(note): Json<Note>,
) -> ApiResult<Note> {
    Ok(Json(blocking(service, move |s| s.save_note(note)).await?))
}

async fn delete_note(
    State(service): State<SharedService>,
    Json(request): Json<DeleteRequest>,
) -> ApiResult<Value> {
    blocking(service, move |s| s.delete_note(&request.id)).await?;
    Ok(Json(json!({ "success": true })))
}

async fn get_note(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> ApiResult<Note> {
    let lookup = id.clone();
    match blocking(service, move |s| s.get_note_by_id(&lookup)).await? {
        Some(note) => Ok(Json(note)),
        None => Err(IdeaflowError::NoteNotFound { id }.into()),
    }
}

async fn recent_notes(
    State(service): State<SharedService>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<Note>> {
    let limit = params.limit.unwrap_or(service.default_recent_limit());
    Ok(Json(blocking(service, move |s| s.get_recent_notes(limit)).await?))
}

async fn pinned_notes(State(service): State<SharedService>) -> ApiResult<Vec<Note>> {
    Ok(Json(blocking(service, |s| s.get_pinned_notes()).await?))
}

async fn featured_note(State(service): State<SharedService>) -> ApiResult<Note> {
    match blocking(service, |s| s.get_featured_note()).await? {
        Some(note) => Ok(Json(note)),
        None => Err(IdeaflowError::NoteNotFound {
            id: "featured".to_string(),
        }
        .into()),
    }
}

async fn search_notes(
    State(service): State<SharedService>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<Note>> {
    Ok(Json(
        blocking(service, move |s| s.search_notes(&params.q, params.limit)).await?,
    ))
}

async fn list_categories(State(service): State<SharedService>) -> ApiResult<Vec<Category>> {
    Ok(Json(blocking(service, |s| s.get_all_categories()).await?))
}

async fn category_summaries(
    State(service): State<SharedService>,
) -> ApiResult<Vec<CategorySummary>> {
    Ok(Json(blocking(service, |s| s.get_category_summaries()).await?))
}

async fn get_category(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> ApiResult<Category> {
    let lookup = id.clone();
    match blocking(service, move |s| s.get_category_by_id(&lookup)).await? {
        Some(category) => Ok(Json(category)),
        None => Err(IdeaflowError::CategoryNotFound { id }.into()),
    }
}

// Dangling category ids are allowed on notes, so an unknown id is just an empty list
async fn category_notes(
    State(service): State<SharedService>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Note>> {
    Ok(Json(
        blocking(service, move |s| s.get_notes_by_category(&id)).await?,
    ))
}

async fn popular_tags(
    State(service): State<SharedService>,
    Query(params): Query<LimitParams>,
) -> ApiResult<Vec<TagCount>> {
    let limit = params.limit.unwrap_or(service.default_popular_tags_limit());
    Ok(Json(blocking(service, move |s| s.get_popular_tags(limit)).await?))
}

async fn community_notes(State(service): State<SharedService>) -> ApiResult<Vec<Note>> {
    Ok(Json(blocking(service, |s| s.get_public_notes()).await?))
}

async fn stats(State(service): State<SharedService>) -> ApiResult<NoteStats> {
    Ok(Json(blocking(service, |s| s.get_stats()).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;
    use axum::{
        body::{to_bytes, Body},
        http::{header::CONTENT_TYPE, Method, Request},
    };
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn setup_router() -> (Router, Arc<NoteService>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let service = Arc::new(NoteService::open(&Config::with_data_dir(tmp.path())).unwrap());
        (router(Arc::clone(&service)), service, tmp)
    }

    fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    fn note_json(id: &str, updated_at: &str, tags: &[&str]) -> Value {
        json!({
            "id": id,
            "title": format!("Note {}", id),
            "content": "<p>text</p>",
            "category": "ideas",
            "tags": tags,
            "pinned": false,
            "isPublic": false,
            "views": 0,
            "createdAt": updated_at,
            "updatedAt": updated_at,
        })
    }

    #[tokio::test]
    async fn test_post_then_get_all_and_by_id() {
        let (app, _service, _tmp) = setup_router();
        let body = note_json("n1", "2023-06-01T00:00:00Z", &["x"]);

        let (status, saved) = send(&app, json_request(Method::POST, "/api/notes", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, body);

        let (status, all) = send(&app, get_request("/api/notes")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(all, json!([body.clone()]));

        let (status, one) = send(&app, get_request("/api/notes/n1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one, body);
    }

    #[tokio::test]
    async fn test_missing_note_is_404() {
        let (app, _service, _tmp) = setup_router();

        let (status, body) = send(&app, get_request("/api/notes/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().unwrap().contains("missing"));

        let (status, _) = send(&app, get_request("/api/notes/featured")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_reports_success_even_when_missing() {
        let (app, service, _tmp) = setup_router();
        send(&app, json_request(Method::POST, "/api/notes", note_json("a", "2023-06-01", &[]))).await;

        let (status, body) =
            send(&app, json_request(Method::DELETE, "/api/notes", json!({ "id": "a" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "success": true }));
        assert!(service.get_all_notes().unwrap().is_empty());

        let (status, _) =
            send(&app, json_request(Method::DELETE, "/api/notes", json!({ "id": "a" }))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_views() {
        let (app, _service, _tmp) = setup_router();
        for (id, updated_at, tags) in [
            ("A", "2023-06-01", vec!["x", "y"]),
            ("B", "2023-06-03", vec!["y", "z"]),
            ("C", "2023-06-01", vec!["x"]),
        ] {
            send(&app, json_request(Method::POST, "/api/notes", note_json(id, updated_at, &tags))).await;
        }

        let (_, recent) = send(&app, get_request("/api/notes/recent?limit=2")).await;
        let recent_ids: Vec<&str> = recent.as_array().unwrap().iter().map(|n| n["id"].as_str().unwrap()).collect();
        assert_eq!(recent_ids, vec!["B", "A"]);

        let (_, tags) = send(&app, get_request("/api/tags/popular")).await;
        assert_eq!(
            tags,
            json!([
                { "tag": "x", "count": 2 },
                { "tag": "y", "count": 2 },
                { "tag": "z", "count": 1 }
            ])
        );

        let (_, stats) = send(&app, get_request("/api/stats")).await;
        assert_eq!(stats["totalNotes"], 3);
        assert_eq!(stats["uniqueTags"], 3);
    }

    #[tokio::test]
    async fn test_categories() {
        let (app, _service, _tmp) = setup_router();

        let (status, categories) = send(&app, get_request("/api/categories")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(categories.as_array().unwrap().len(), 4);

        let (status, ideas) = send(&app, get_request("/api/categories/ideas")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(ideas["name"], "Ideas");

        let (status, _) = send(&app, get_request("/api/categories/nope")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(&app, json_request(Method::POST, "/api/notes", note_json("a", "2023-06-01", &[]))).await;
        let (_, notes) = send(&app, get_request("/api/categories/ideas/notes")).await;
        assert_eq!(notes.as_array().unwrap().len(), 1);

        let (_, summary) = send(&app, get_request("/api/categories/summary")).await;
        assert_eq!(summary[2]["id"], "ideas");
        assert_eq!(summary[2]["noteCount"], 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_posts_all_land() {
        let (app, service, _tmp) = setup_router();

        let posts: Vec<_> = (0..16)
            .map(|i| {
                let app = app.clone();
                tokio::spawn(async move {
                    let body = note_json(&format!("n{}", i), "2023-06-01T00:00:00Z", &["load"]);
                    send(&app, json_request(Method::POST, "/api/notes", body)).await.0
                })
            })
            .collect();
        for post in posts {
            assert_eq!(post.await.unwrap(), StatusCode::OK);
        }

        let mut ids: Vec<String> = service
            .get_all_notes()
            .unwrap()
            .into_iter()
            .map(|n| n.id)
            .collect();
        ids.sort();
        let mut expected: Vec<String> = (0..16).map(|i| format!("n{}", i)).collect();
        expected.sort();
        assert_eq!(ids, expected);

        let (_, stats) = send(&app, get_request("/api/stats")).await;
        assert_eq!(stats["totalNotes"], 16);
    }

    #[tokio::test]
    async fn test_extra_keys_pass_through_the_api() {
        let (app, _service, _tmp) = setup_router();
        let mut body = note_json("n1", "2023-06-01T00:00:00Z", &[]);
        body["likes"] = json!(7);

        let (status, saved) = send(&app, json_request(Method::POST, "/api/notes", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved, body);
        let (_, one) = send(&app, get_request("/api/notes/n1")).await;
        assert_eq!(one["likes"], 7);
    }

    #[tokio::test]
    async fn test_store_failure_is_500() {
        let (app, _service, tmp) = setup_router();
        std::fs::write(tmp.path().join("notes.json"), "oops").unwrap();

        let (status, body) = send(&app, get_request("/api/notes")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].is_string());
    }
}
