//! Cars API endpoints.

use api_types::{
    car::{CarCreate, CarGet, CarQuery, CarUpdate},
    result::{CreateResult, ServiceResult},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use engine::CarListFilter;
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<CarQuery>,
) -> Result<Json<Vec<CarGet>>, ServerError> {
    let available_between = match (query.start_date, query.end_date) {
        (Some(start), Some(end)) => Some((start, end)),
        (None, None) => None,
        _ => {
            return Err(ServerError::Generic(
                "startDate and endDate must be given together".to_string(),
            ));
        }
    };
    let filter = CarListFilter {
        include_deleted: query.include_deleted.unwrap_or(false),
        depot_id: query.depot_id,
        fuel_type: query.fuel_type.map(convert::fuel_type_from_api),
        available_between,
    };

    let cars = state.engine.list_cars(&filter).await?;
    Ok(Json(cars.iter().map(convert::car_to_api).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<CarGet>, ServerError> {
    let car = state.engine.car(car_id).await?;
    Ok(Json(convert::car_to_api(&car)))
}

pub async fn create(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<CarCreate>,
) -> Result<(StatusCode, Json<CreateResult<CarGet>>), ServerError> {
    let car = state
        .engine
        .create_car(actor.id, &convert::car_input(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::car_to_api(&car))),
    ))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
    Json(payload): Json<CarUpdate>,
) -> Result<Json<CarGet>, ServerError> {
    let car = state
        .engine
        .update_car(actor.id, car_id, &convert::car_patch(payload))
        .await?;
    Ok(Json(convert::car_to_api(&car)))
}

pub async fn delete(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(car_id): Path<Uuid>,
) -> Result<Json<ServiceResult>, ServerError> {
    state.engine.delete_car(actor.id, car_id).await?;
    Ok(Json(ServiceResult::success()))
}
