use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::RequestId,
    models::{Batch, Item, ItemId},
    services::{providers::attach_posters, title_resolver::MatchMode},
};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct TitleListQuery {
    /// Case-insensitive substring filter
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct OpenSessionRequest {
    pub title: String,
    pub match_mode: Option<MatchMode>,
    /// Existing session whose cursor should be replaced
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct QueryItemResponse {
    pub id: ItemId,
    pub title: String,
    pub release_date: Option<String>,
}

impl From<&Item> for QueryItemResponse {
    fn from(item: &Item) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            release_date: item.release_date.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub query: QueryItemResponse,
    /// Number of neighbors the cursor will page through
    pub total: usize,
}

#[derive(Debug, Default, Deserialize)]
pub struct NextBatchRequest {
    pub batch_size: Option<usize>,
    /// Attach poster URLs when a provider is configured
    #[serde(default)]
    pub posters: bool,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Sorted, distinct catalog titles for a selection list
pub async fn list_titles(
    State(state): State<AppState>,
    Query(params): Query<TitleListQuery>,
) -> Json<Vec<String>> {
    let needle = params
        .q
        .map(|q| q.trim().to_lowercase())
        .filter(|q| !q.is_empty());

    let titles = state
        .recommender
        .resolver()
        .titles()
        .filter(|title| match &needle {
            Some(needle) => title.to_lowercase().contains(needle),
            None => true,
        })
        .map(str::to_string)
        .collect();

    Json(titles)
}

/// Resolves a title and opens a fresh cursor for the session
pub async fn open_session(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<OpenSessionRequest>,
) -> AppResult<(StatusCode, Json<SessionResponse>)> {
    let mode = request.match_mode.unwrap_or(state.settings.match_mode);
    let recommender = &state.recommender;

    let item = recommender.resolve(&request.title, mode)?;
    let cursor = recommender.open(item.id)?;
    let total = cursor.ranked_neighbors().len();

    let session_id = request.session_id.unwrap_or_else(Uuid::new_v4);
    let replaced = state.sessions.insert(session_id, cursor).await;

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        query_id = item.id,
        match_mode = ?mode,
        replaced,
        "Opened recommendation cursor"
    );

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            session_id,
            query: QueryItemResponse::from(item),
            total,
        }),
    ))
}

/// Returns the next batch of recommendations for a session
pub async fn next_batch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Path(session_id): Path<Uuid>,
    request: Result<Json<NextBatchRequest>, JsonRejection>,
) -> AppResult<Json<Batch>> {
    // Only a body-less request falls back to the defaults
    let request = match request {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => NextBatchRequest::default(),
        Err(rejection) => {
            return Err(AppError::InvalidArgument(format!(
                "Invalid batch request: {}",
                rejection.body_text()
            )))
        }
    };
    let batch_size = request
        .batch_size
        .unwrap_or(state.settings.default_batch_size);

    if batch_size > state.settings.max_batch_size {
        return Err(AppError::InvalidArgument(format!(
            "batch_size {} exceeds maximum of {}",
            batch_size, state.settings.max_batch_size
        )));
    }

    let recommender = &state.recommender;
    let mut batch = state
        .sessions
        .with_cursor(session_id, |cursor| recommender.next_batch(cursor, batch_size))
        .await?;

    if request.posters {
        if let Some(provider) = &state.posters {
            attach_posters(provider.clone(), &mut batch.items).await;
        }
    }

    tracing::info!(
        request_id = %request_id,
        session_id = %session_id,
        returned = batch.items.len(),
        offset = batch.offset,
        exhausted = batch.exhausted,
        "Served recommendation batch"
    );

    Ok(Json(batch))
}

/// Ends a session and drops its cursor
pub async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if state.sessions.remove(session_id).await {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::SessionNotFound(session_id))
    }
}
