use crate::{
    AppState, Config, Dictionary, FetchOutcome, SearchOutcome, SyncError, WordEntry, WordListState,
};
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::info;

type SharedState = Arc<Dictionary>;

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub base_url: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            base_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("http client error: {0}")]
    Client(#[from] reqwest::Error),
}

pub async fn serve(config: WebConfig, dictionary_config: &Config) -> Result<(), WebError> {
    let dictionary = Arc::new(Dictionary::from_config(dictionary_config)?);
    dictionary.restore().await;
    let router = build_router(dictionary);
    info!(%config.addr, base = %config.base_url, "Binding HTTP listener");
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(value: SyncError) -> Self {
        Self {
            status: StatusCode::BAD_GATEWAY,
            message: value.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/state", get(api_state))
        .route("/api/words", get(api_words))
        .route("/api/words/all", get(api_all_words))
        .route("/api/lookup", get(api_lookup))
        .route("/api/search", axum::routing::post(api_search))
        .route(
            "/api/favorites",
            get(api_favorites)
                .post(api_add_favorite)
                .delete(api_remove_favorite),
        )
        .route(
            "/api/history",
            get(api_history)
                .post(api_add_history)
                .delete(api_clear_history),
        )
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "wordbook-web" }))
}

async fn api_state(State(state): State<SharedState>) -> Json<AppState> {
    Json(state.store().snapshot())
}

#[derive(Debug, Deserialize)]
struct PageParams {
    page: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PagePayload {
    outcome: serde_json::Value,
    page_size: usize,
    state: serde_json::Value,
}

impl PagePayload {
    fn new(outcome: FetchOutcome, page_size: usize, state: &WordListState) -> Self {
        Self {
            outcome: serde_json::to_value(outcome).unwrap_or_default(),
            page_size,
            state: serde_json::to_value(state).unwrap_or_default(),
        }
    }
}

async fn api_words(
    State(state): State<SharedState>,
    Query(params): Query<PageParams>,
) -> Result<Json<PagePayload>, ApiError> {
    let words = state.words();
    let outcome = match params.page {
        Some(page) => words.fetch(Some(page)).await?,
        None => words.fetch_next_page().await?,
    };
    Ok(Json(PagePayload::new(
        outcome,
        words.page_size(),
        &state.store().word_list(),
    )))
}

#[derive(Debug, Deserialize)]
struct AllWordsParams {
    #[serde(default)]
    names_only: bool,
}

async fn api_all_words(
    State(state): State<SharedState>,
    Query(params): Query<AllWordsParams>,
) -> Result<Response, ApiError> {
    let words = state.words();
    if params.names_only {
        let names = words.merged_words().await.map_err(SyncError::from)?;
        return Ok(Json(json!({ "count": names.len(), "words": names })).into_response());
    }
    let outcome = words.fetch(None).await?;
    Ok(Json(PagePayload::new(outcome, words.page_size(), &state.store().word_list())).into_response())
}

#[derive(Debug, Deserialize)]
struct WordParams {
    word: Option<String>,
}

fn required_word(word: Option<String>) -> Result<String, ApiError> {
    word.map(|w| w.trim().to_string())
        .filter(|w| !w.is_empty())
        .ok_or_else(|| ApiError::bad_request("Provide ?word= or a JSON body with \"word\""))
}

async fn api_lookup(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
) -> Result<Json<Vec<WordEntry>>, ApiError> {
    let word = required_word(params.word)?;
    state
        .define(&word)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("No definitions found for {word:?}")))
}

#[derive(Debug, Deserialize)]
struct WordBody {
    word: Option<String>,
}

async fn api_search(
    State(state): State<SharedState>,
    Json(body): Json<WordBody>,
) -> Result<Json<SearchOutcome>, ApiError> {
    let word = required_word(body.word)?;
    Ok(Json(state.search(&word).await))
}

#[derive(Debug, Serialize, Deserialize)]
struct ListPayload {
    words: Vec<String>,
    changed: Option<bool>,
}

async fn api_favorites(State(state): State<SharedState>) -> Json<ListPayload> {
    Json(ListPayload {
        words: state.favorites().list(),
        changed: None,
    })
}

async fn api_add_favorite(
    State(state): State<SharedState>,
    Json(body): Json<WordBody>,
) -> Result<Json<ListPayload>, ApiError> {
    let word = required_word(body.word)?;
    let changed = state.favorites().add(&word).await;
    Ok(Json(ListPayload {
        words: state.favorites().list(),
        changed: Some(changed),
    }))
}

async fn api_remove_favorite(
    State(state): State<SharedState>,
    Query(params): Query<WordParams>,
) -> Result<Json<ListPayload>, ApiError> {
    let word = required_word(params.word)?;
    let changed = state.favorites().remove(&word).await;
    Ok(Json(ListPayload {
        words: state.favorites().list(),
        changed: Some(changed),
    }))
}

async fn api_history(State(state): State<SharedState>) -> Json<ListPayload> {
    Json(ListPayload {
        words: state.history().list(),
        changed: None,
    })
}

async fn api_add_history(
    State(state): State<SharedState>,
    Json(body): Json<WordBody>,
) -> Result<Json<ListPayload>, ApiError> {
    let word = required_word(body.word)?;
    let changed = state.history().add(&word).await;
    Ok(Json(ListPayload {
        words: state.history().list(),
        changed: Some(changed),
    }))
}

async fn api_clear_history(State(state): State<SharedState>) -> Json<ListPayload> {
    state.history().clear().await;
    Json(ListPayload {
        words: state.history().list(),
        changed: Some(true),
    })
}

#[cfg(all(test, feature = "web"))]
mod tests {
    use super::*;
    use crate::app::tests::dictionary;
    use axum::{body, body::Body, http::Request};
    use tower::ServiceExt;

    fn test_router() -> Router {
        build_router(Arc::new(dictionary(
            &["apple", "banana", "cherry"],
            vec!["apple", "banana", "cherry", "date"],
        )))
    }

    async fn json_body(response: Response) -> serde_json::Value {
        let bytes = body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = test_router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    #[tokio::test]
    async fn words_pages_then_reports_no_more_data() {
        let router = test_router();
        let response = router
            .clone()
            .oneshot(Request::get("/api/words?page=0").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert!(response.status().is_success());
        let payload = json_body(response).await;
        assert_eq!(payload["outcome"]["outcome"], "loaded");
        assert_eq!(payload["state"]["words"][1]["word"], "banana");
        assert_eq!(payload["state"]["status"], "succeeded");

        let response = router
            .oneshot(Request::get("/api/words?page=7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let payload = json_body(response).await;
        assert_eq!(payload["outcome"]["outcome"], "no_more_data");
    }

    #[tokio::test]
    async fn lookup_missing_word_is_404() {
        let response = test_router()
            .oneshot(
                Request::get("/api/lookup?word=xyzzynotaword")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lookup_without_word_is_400() {
        let response = test_router()
            .oneshot(Request::get("/api/lookup").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn search_then_names_only_listing() {
        let router = test_router();
        let response = router
            .clone()
            .oneshot(post_json("/api/search", json!({ "word": "Date" })))
            .await
            .unwrap();
        let payload = json_body(response).await;
        assert_eq!(payload["outcome"], "added");

        let response = router
            .oneshot(
                Request::get("/api/words/all?names_only=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let payload = json_body(response).await;
        assert_eq!(payload["count"], 4);
        assert_eq!(payload["words"][3], "date");
    }

    #[tokio::test]
    async fn favorites_add_and_remove() {
        let router = test_router();
        let response = router
            .clone()
            .oneshot(post_json("/api/favorites", json!({ "word": "apple" })))
            .await
            .unwrap();
        let payload: ListPayload = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(payload.words, vec!["apple"]);
        assert_eq!(payload.changed, Some(true));

        let response = router
            .oneshot(
                Request::delete("/api/favorites?word=apple")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let payload: ListPayload = serde_json::from_value(json_body(response).await).unwrap();
        assert!(payload.words.is_empty());
    }

    #[tokio::test]
    async fn lookup_records_history() {
        let router = test_router();
        router
            .clone()
            .oneshot(Request::get("/api/lookup?word=cherry").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let response = router
            .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let payload: ListPayload = serde_json::from_value(json_body(response).await).unwrap();
        assert_eq!(payload.words, vec!["cherry"]);
    }
}
