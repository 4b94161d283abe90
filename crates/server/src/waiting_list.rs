//! Waiting list endpoints.

use api_types::{
    result::CreateResult,
    waiting_list::{ExpiredEntries, WaitingListEntryGet, WaitingListJoin},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<Vec<WaitingListEntryGet>>, ServerError> {
    let entries = state
        .engine
        .waiting_list(actor.id, car_id, Utc::now())
        .await?;
    Ok(Json(entries.iter().map(convert::entry_to_api).collect()))
}

pub async fn join(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<WaitingListJoin>,
) -> Result<(StatusCode, Json<CreateResult<WaitingListEntryGet>>), ServerError> {
    let entry = state
        .engine
        .join_waiting_list(actor.id, car_id, payload.user_id, Utc::now())
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::entry_to_api(&entry))),
    ))
}

/// `null` when the queue is empty or an offer is still open.
pub async fn notify(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<Option<WaitingListEntryGet>>, ServerError> {
    let entry = state
        .engine
        .notify_next(actor.id, car_id, Utc::now())
        .await?;
    Ok(Json(entry.as_ref().map(convert::entry_to_api)))
}

pub async fn confirm(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<WaitingListEntryGet>, ServerError> {
    let entry = state
        .engine
        .confirm_entry(actor.id, entry_id, Utc::now())
        .await?;
    Ok(Json(convert::entry_to_api(&entry)))
}

pub async fn cancel(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(entry_id): Path<Uuid>,
) -> Result<Json<WaitingListEntryGet>, ServerError> {
    let entry = state
        .engine
        .cancel_entry(actor.id, entry_id, Utc::now())
        .await?;
    Ok(Json(convert::entry_to_api(&entry)))
}

pub async fn expire(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<ExpiredEntries>, ServerError> {
    let expired = state.engine.expire_notified(actor.id, Utc::now()).await?;
    Ok(Json(ExpiredEntries {
        expired: expired.len() as u64,
    }))
}

pub async fn for_user(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<WaitingListEntryGet>>, ServerError> {
    let entries = state.engine.entries_for_user(actor.id, user_id).await?;
    Ok(Json(entries.iter().map(convert::entry_to_api).collect()))
}
