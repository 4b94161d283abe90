//! Depots API endpoints.

use api_types::{
    depot::{DepotCreate, DepotGet, DepotUpdate},
    result::{CreateResult, ServiceResult},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<DepotGet>>, ServerError> {
    let depots = state.engine.list_depots().await?;
    Ok(Json(depots.iter().map(convert::depot_to_api).collect()))
}

pub async fn get(
    Extension(_actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(depot_id): Path<Uuid>,
) -> Result<Json<DepotGet>, ServerError> {
    let depot = state.engine.depot(depot_id).await?;
    Ok(Json(convert::depot_to_api(&depot)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<DepotCreate>,
) -> Result<(StatusCode, Json<CreateResult<DepotGet>>), ServerError> {
    let depot = state
        .engine
        .create_depot(actor.id, &convert::depot_input(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::depot_to_api(&depot))),
    ))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(depot_id): Path<Uuid>,
    Json(payload): Json<DepotUpdate>,
) -> Result<Json<DepotGet>, ServerError> {
    if payload.name.is_none() && payload.address.is_none() {
        return Err(ServerError::Generic(
            "provide at least one of name or address".to_string(),
        ));
    }
    let depot = state
        .engine
        .update_depot(actor.id, depot_id, &convert::depot_patch(payload))
        .await?;
    Ok(Json(convert::depot_to_api(&depot)))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(depot_id): Path<Uuid>,
) -> Result<Json<ServiceResult>, ServerError> {
    state.engine.delete_depot(actor.id, depot_id).await?;
    Ok(Json(ServiceResult::success()))
}
