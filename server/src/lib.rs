use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use docrank_core::persist::{load_engine, IndexPaths};
use docrank_core::vector::DEFAULT_TOP_N;
use docrank_core::{DocId, SearchEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Hard ceiling on ranked results per request.
const MAX_K: usize = 100;

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: String,
    #[serde(default = "default_k")]
    pub k: usize,
}
fn default_k() -> usize { DEFAULT_TOP_N }

#[derive(Deserialize)]
pub struct BooleanParams {
    pub q: String,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub results: Vec<SearchHit>,
}

#[derive(Serialize)]
pub struct SearchHit {
    pub doc_id: DocId,
    pub name: String,
    pub score: f64,
}

#[derive(Serialize)]
pub struct BooleanResponse {
    pub query: String,
    pub took_s: f64,
    pub total_hits: usize,
    pub matches: Vec<BooleanHit>,
}

#[derive(Serialize)]
pub struct BooleanHit {
    pub doc_id: DocId,
    pub name: String,
}

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SearchEngine>,
}

pub fn build_app(index_dir: String) -> Result<Router> {
    // Load every artifact at startup; the engine is read-only afterwards
    let index_paths = IndexPaths::new(&index_dir);
    let engine = load_engine(&index_paths)?;
    tracing::info!(num_docs = engine.num_docs(), "index loaded");
    let app_state = AppState { engine: Arc::new(engine) };

    // CORS: read CORS_ALLOW_ORIGIN (comma-separated) or allow Any by default
    let cors = match std::env::var("CORS_ALLOW_ORIGIN") {
        Ok(val) => {
            let origins: Vec<_> = val
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
            } else {
                CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(Any).allow_headers(Any)
            }
        }
        Err(_) => CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/search", get(search_handler))
        .route("/boolean", get(boolean_handler))
        .route("/doc/:doc_id", get(doc_handler))
        .with_state(app_state)
        .layer(cors);
    Ok(app)
}

fn doc_name(state: &AppState, doc_id: DocId) -> String {
    state
        .engine
        .doc_meta(doc_id)
        .map(|meta| meta.name.clone())
        .unwrap_or_default()
}

/// Ranked retrieval. `k=0` is honored and returns no hits.
pub async fn search_handler(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Json<SearchResponse> {
    let start = std::time::Instant::now();
    let ranked = state.engine.ranked_search(&params.q, params.k.min(MAX_K));
    let results: Vec<SearchHit> = ranked
        .into_iter()
        .map(|(doc_id, score)| SearchHit {
            doc_id,
            name: doc_name(&state, doc_id),
            score,
        })
        .collect();

    let elapsed = start.elapsed();
    Json(SearchResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: results.len(),
        results,
    })
}

/// Boolean retrieval. Malformed queries come back as 400 with the parser's
/// message in the body.
pub async fn boolean_handler(
    State(state): State<AppState>,
    Query(params): Query<BooleanParams>,
) -> Result<Json<BooleanResponse>, (StatusCode, Json<serde_json::Value>)> {
    let start = std::time::Instant::now();
    let doc_ids = state.engine.boolean_search(&params.q).map_err(|err| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
    })?;

    let matches: Vec<BooleanHit> = doc_ids
        .into_iter()
        .map(|doc_id| BooleanHit {
            doc_id,
            name: doc_name(&state, doc_id),
        })
        .collect();

    let elapsed = start.elapsed();
    Ok(Json(BooleanResponse {
        query: params.q,
        took_s: elapsed.as_secs_f64(),
        total_hits: matches.len(),
        matches,
    }))
}

pub async fn doc_handler(
    State(state): State<AppState>,
    Path(doc_id): Path<DocId>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<serde_json::Value>)> {
    match state.engine.doc_meta(doc_id) {
        Some(meta) => Ok(Json(serde_json::json!({
            "doc_id": doc_id,
            "name": meta.name,
        }))),
        None => Err((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": "not found" })),
        )),
    }
}
