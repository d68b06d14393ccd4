//! HTTP surface of the bidround server
//!
//! Thin JSON handlers over the store. Participant routes are public and
//! carry the caller's admin status into the submitted event, so an
//! administrator bypasses the phase gates; listing, deleting and moving
//! the round are admin only. Admin status is a bearer token compared
//! against the configured one.

use axum::extract::{Path, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bidround_core::{Store, StoreError, ValidationError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Clone)]
struct AppState {
    store: Arc<Store>,
    admin_token: Option<String>,
}

/// Participant as rendered to clients
#[derive(Debug, Serialize, Deserialize)]
pub struct ViewParticipant {
    pub id: String,
    pub payload: Value,
    pub offer: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OfferRequest {
    pub amount: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateRequest {
    pub state: u8,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StateResponse {
    pub state: u8,
    pub name: String,
}

/// Error as rendered to clients: `{ "error": message }` plus a status
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("participant does not exist")]
    NotFound,

    #[error("admin authorization required")]
    Unauthorized,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Store(StoreError::Invalid(err)) => {
                let status = match err {
                    ValidationError::UnknownParticipant(_) => StatusCode::NOT_FOUND,
                    ValidationError::IdTaken(_) => StatusCode::CONFLICT,
                    _ => StatusCode::BAD_REQUEST,
                };
                (status, err.to_string())
            }
            ApiError::Store(err) => {
                error!("Routes: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Assemble the router around a shared store.
pub fn build_router(store: Arc<Store>, admin_token: Option<String>) -> Router {
    if admin_token.is_some() {
        info!("Routes: admin operations enabled");
    } else {
        warn!("Routes: no admin token configured, admin operations disabled");
    }

    let state = AppState { store, admin_token };
    Router::new()
        .route(
            "/api/participant",
            post(create_participant).get(list_participants),
        )
        .route(
            "/api/participant/:id",
            get(get_participant)
                .post(update_participant)
                .delete(delete_participant),
        )
        .route("/api/participant/:id/offer", post(set_offer))
        .route("/api/state", get(get_state).post(set_state))
        .with_state(state)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn is_admin(state: &AppState, headers: &HeaderMap) -> bool {
    match (&state.admin_token, bearer_token(headers)) {
        (Some(token), Some(provided)) => provided == token,
        _ => false,
    }
}

fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if is_admin(state, headers) {
        Ok(())
    } else {
        Err(ApiError::Unauthorized)
    }
}

async fn create_participant(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<ViewParticipant>, ApiError> {
    let as_admin = is_admin(&state, &headers);
    let id = state.store.create_participant(payload.clone(), as_admin)?;
    Ok(Json(ViewParticipant {
        id,
        payload,
        offer: 0,
    }))
}

async fn get_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewParticipant>, ApiError> {
    let participant = state.store.participant(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(ViewParticipant {
        id,
        payload: participant.payload,
        offer: participant.offer,
    }))
}

async fn list_participants(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ViewParticipant>>, ApiError> {
    require_admin(&state, &headers)?;

    let mut list: Vec<ViewParticipant> = state
        .store
        .participants()
        .into_iter()
        .map(|(id, participant)| ViewParticipant {
            id,
            payload: participant.payload,
            offer: participant.offer,
        })
        .collect();
    list.sort_by(|a, b| a.id.cmp(&b.id));

    Ok(Json(list))
}

async fn update_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(payload): Json<Value>,
) -> Result<Json<ViewParticipant>, ApiError> {
    let as_admin = is_admin(&state, &headers);
    let stored = state.store.update_participant(&id, payload, as_admin)?;
    let offer = state.store.offer(&id);
    Ok(Json(ViewParticipant {
        id,
        payload: stored,
        offer,
    }))
}

async fn delete_participant(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, &headers)?;
    state.store.delete_participant(&id, true)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(req): Json<OfferRequest>,
) -> Result<Json<ViewParticipant>, ApiError> {
    let as_admin = is_admin(&state, &headers);
    state.store.set_offer(&id, req.amount, as_admin)?;

    let participant = state.store.participant(&id).ok_or(ApiError::NotFound)?;
    Ok(Json(ViewParticipant {
        id,
        payload: participant.payload,
        offer: participant.offer,
    }))
}

async fn get_state(State(state): State<AppState>) -> Json<StateResponse> {
    let round = state.store.round_state();
    Json(StateResponse {
        state: round.ordinal(),
        name: round.to_string(),
    })
}

async fn set_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<StateRequest>,
) -> Result<Json<StateResponse>, ApiError> {
    require_admin(&state, &headers)?;
    state.store.set_round_state(req.state)?;

    let round = state.store.round_state();
    Ok(Json(StateResponse {
        state: round.ordinal(),
        name: round.to_string(),
    }))
}
