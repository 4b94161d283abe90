//! Account endpoints: login, registration, profiles and roles.

use api_types::{
    result::{CreateResult, LoginResult, RegistrationResult},
    user::{GuestCreate, Login, RoleUpdate, UserGet, UserRegister, UserUpdate},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use uuid::Uuid;

use crate::{Actor, ServerError, convert, server::ServerState};

/// Check credentials and hand out a bearer token.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<LoginResult>, ServerError> {
    let user = state
        .engine
        .login(&payload.identifier, &payload.password)
        .await?;
    let token = state.tokens.issue(&user, Utc::now())?;
    tracing::info!(user_id = %user.id, "user logged in");

    Ok(Json(LoginResult {
        succeeded: true,
        errors: Vec::new(),
        token: Some(token),
        user: Some(convert::user_to_api(&user)),
    }))
}

pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<UserRegister>,
) -> Result<(StatusCode, Json<RegistrationResult>), ServerError> {
    let user = state
        .engine
        .register(&convert::registration(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(RegistrationResult {
            succeeded: true,
            errors: Vec::new(),
            user_id: Some(user.id),
        }),
    ))
}

pub async fn guest_new(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Json(payload): Json<GuestCreate>,
) -> Result<(StatusCode, Json<CreateResult<UserGet>>), ServerError> {
    let user = state
        .engine
        .create_guest(actor.id, &convert::guest_input(payload))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateResult::success(convert::user_to_api(&user))),
    ))
}

pub async fn list(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Vec<UserGet>>, ServerError> {
    let users = state.engine.list_users(actor.id).await?;
    Ok(Json(users.iter().map(convert::user_to_api).collect()))
}

pub async fn me(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<UserGet>, ServerError> {
    let user = state.engine.user(actor.id, actor.id).await?;
    Ok(Json(convert::user_to_api(&user)))
}

pub async fn get(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserGet>, ServerError> {
    let user = state.engine.user(actor.id, user_id).await?;
    Ok(Json(convert::user_to_api(&user)))
}

pub async fn update(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UserUpdate>,
) -> Result<Json<UserGet>, ServerError> {
    let user = state
        .engine
        .update_user(actor.id, user_id, &convert::user_patch(payload))
        .await?;
    Ok(Json(convert::user_to_api(&user)))
}

pub async fn set_role(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<RoleUpdate>,
) -> Result<Json<UserGet>, ServerError> {
    let user = state
        .engine
        .set_role(actor.id, user_id, convert::role_from_api(payload.role))
        .await?;
    Ok(Json(convert::user_to_api(&user)))
}
