//! Rent lifecycle endpoints.

use api_types::{
    rent::{
        RentCreate, RentGet, RentHandOver, RentListResponse, RentQuery, RentReject, RentTakeBack,
    },
    result::CreateResult,
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::Utc;
use engine::{RentListFilter, RentRequest, TakeBack};
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

const DEFAULT_PAGE_SIZE: u64 = 50;
const MAX_PAGE_SIZE: u64 = 200;

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<RentCreate>,
) -> Result<(StatusCode, Json<CreateResult<RentGet>>), ServerError> {
    let request = RentRequest {
        renter_id: payload.renter_id,
        car_id: payload.car_id,
        planned_start: payload.planned_start,
        planned_end: payload.planned_end,
        invoice_request: payload.invoice_request,
    };
    let rent = state.engine.create_rent(actor.id, &request).await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::rent_to_api(&rent))),
    ))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Query(query): Query<RentQuery>,
) -> Result<Json<RentListResponse>, ServerError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(ServerError::Generic(format!(
            "limit must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let filter = RentListFilter {
        status: query.status.map(convert::rent_status_from_api),
        car_id: query.car_id,
        renter_id: query.renter_id,
    };

    let page = state
        .engine
        .list_rents(actor.id, &filter, limit, query.cursor.as_deref())
        .await?;
    Ok(Json(RentListResponse {
        rents: page.rents.iter().map(convert::rent_to_api).collect(),
        next_cursor: page.next_cursor,
    }))
}

pub async fn for_renter(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(renter_id): Path<Uuid>,
) -> Result<Json<Vec<RentGet>>, ServerError> {
    let rents = state.engine.rents_for_renter(actor.id, renter_id).await?;
    Ok(Json(rents.iter().map(convert::rent_to_api).collect()))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<Json<RentGet>, ServerError> {
    let rent = state.engine.rent(actor.id, rent_id).await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn approve(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<Json<RentGet>, ServerError> {
    let rent = state.engine.approve_rent(actor.id, rent_id).await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn reject(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
    Json(payload): Json<RentReject>,
) -> Result<Json<RentGet>, ServerError> {
    let rent = state
        .engine
        .reject_rent(actor.id, rent_id, payload.reason)
        .await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn cancel(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<Json<RentGet>, ServerError> {
    let rent = state.engine.cancel_rent(actor.id, rent_id).await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn invoice_request(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
) -> Result<Json<RentGet>, ServerError> {
    let rent = state.engine.request_invoice(actor.id, rent_id).await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn hand_over(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
    Json(payload): Json<RentHandOver>,
) -> Result<Json<RentGet>, ServerError> {
    let actual_start = payload.actual_start.map(|at| at.with_timezone(&Utc));
    let rent = state
        .engine
        .hand_over(actor.id, rent_id, actual_start)
        .await?;
    Ok(Json(convert::rent_to_api(&rent)))
}

pub async fn take_back(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(rent_id): Path<Uuid>,
    Json(payload): Json<RentTakeBack>,
) -> Result<Json<RentGet>, ServerError> {
    let take_back = TakeBack {
        actual_end: payload
            .actual_end
            .map_or_else(Utc::now, |at| at.with_timezone(&Utc)),
        ending_kilometer: payload.ending_kilometer,
        in_proper_condition: payload.in_proper_condition,
    };
    let rent = state
        .engine
        .take_back(actor.id, rent_id, &take_back)
        .await?;
    Ok(Json(convert::rent_to_api(&rent)))
}
