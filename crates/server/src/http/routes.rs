//! Route handlers.

use crate::http::error::ApiError;
use crate::http::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use rag_knowledge::AnswerResponse;
use serde::Deserialize;
use serde_json::{json, Value};

pub const SERVICE_NAME: &str = "rag-api";

/// Store name published by the health check. Clients match on it, so it
/// stays fixed whatever backend is configured.
pub const HEALTH_VECTOR_STORE: &str = "chromadb";

#[derive(Debug, Deserialize)]
pub struct AddParams {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct QueryParams {
    pub q: String,
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    tracing::debug!(backend = state.store().backend_name(), "Health check");
    Json(json!({
        "status": "ok",
        "service": SERVICE_NAME,
        "vector_store": HEALTH_VECTOR_STORE,
    }))
}

pub async fn add(
    State(state): State<AppState>,
    Query(params): Query<AddParams>,
) -> Result<Json<Value>, ApiError> {
    let item = rag_knowledge::add_knowledge(state.store().as_ref(), &params.text)
        .await
        .map_err(ApiError::from_add)?;

    Ok(Json(json!({
        "status": "success",
        "message": "Content added to knowledge base",
        "id": item.id,
    })))
}

pub async fn query(
    State(state): State<AppState>,
    Query(params): Query<QueryParams>,
) -> Result<Json<AnswerResponse>, ApiError> {
    state
        .composer
        .answer(&params.q)
        .await
        .map(Json)
        .map_err(ApiError::from_query)
}
