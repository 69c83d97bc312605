use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{error::AppError, models::SearchResult, AppState};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/search", post(semantic_search))
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    query: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    results: Vec<SearchResult>,
    note: String,
}

// TODO: replace the mock results with embedding lookups against a vector
// store once the metadata index exists; GeminiClient::embed is ready.
#[axum::debug_handler]
async fn semantic_search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    if state.ai.is_none() {
        return Err(AppError::Configuration(
            "cannot perform search: the Gemini API key is not configured".to_string(),
        ));
    }

    if request.query.trim().is_empty() {
        state.session.lock().last_results.clear();
        return Err(AppError::InvalidInput(
            "please enter a query to perform semantic search".to_string(),
        ));
    }

    tracing::info!("semantic search query: {}", request.query);

    let results = mock_results();
    state.session.lock().last_results = results.clone();

    Ok(Json(SearchResponse {
        results,
        note: "semantic search is not wired to an embedding index yet; returning mock matches"
            .to_string(),
    }))
}

fn mock_results() -> Vec<SearchResult> {
    vec![
        SearchResult {
            table: "customer_profile".to_string(),
            columns: vec!["email".to_string(), "created_at".to_string()],
            description: "Stores registered users and their signup metadata".to_string(),
        },
        SearchResult {
            table: "user_accounts".to_string(),
            columns: vec![
                "user_email".to_string(),
                "registration_timestamp".to_string(),
            ],
            description: "Details of user login and account creation".to_string(),
        },
    ]
}
