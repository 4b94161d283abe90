//! Receipt endpoints.

use api_types::{
    receipt::{ReceiptCorrect, ReceiptGet},
    result::CreateResult,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::MoneyCents;
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

/// Settle a returned rent.
pub async fn issue(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<(StatusCode, Json<CreateResult<ReceiptGet>>), ServerError> {
    let receipt = state.engine.issue_receipt(actor.id, rent_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::receipt_to_api(&receipt))),
    ))
}

pub async fn for_rent(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<Json<ReceiptGet>, ServerError> {
    let receipt = state.engine.receipt_for_rent(actor.id, rent_id).await?;
    Ok(Json(convert::receipt_to_api(&receipt)))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<ReceiptGet>>, ServerError> {
    let receipts = state.engine.list_receipts(actor.id).await?;
    Ok(Json(receipts.iter().map(convert::receipt_to_api).collect()))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(receipt_id): Path<Uuid>,
) -> Result<Json<ReceiptGet>, ServerError> {
    let receipt = state.engine.receipt(actor.id, receipt_id).await?;
    Ok(Json(convert::receipt_to_api(&receipt)))
}

pub async fn correct(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(receipt_id): Path<Uuid>,
    Json(payload): Json<ReceiptCorrect>,
) -> Result<Json<ReceiptGet>, ServerError> {
    let receipt = state
        .engine
        .correct_receipt(actor.id, receipt_id, MoneyCents::new(payload.total_cost))
        .await?;
    Ok(Json(convert::receipt_to_api(&receipt)))
}
