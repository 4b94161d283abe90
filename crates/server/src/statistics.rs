//! Statistics API endpoints

use api_types::stats::Statistics;
use axum::{Extension, Json, extract::State};

use crate::{Actor, ServerError, convert, server::ServerState};

/// Fleet and rental dashboard figures.
pub async fn get_stats(
    Extension(actor): Extension<Actor>,
    State(state): State<ServerState>,
) -> Result<Json<Statistics>, ServerError> {
    let stats = state.engine.statistics(actor.id).await?;
    Ok(Json(convert::statistics_to_api(&stats)))
}
