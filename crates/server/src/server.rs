use axum::{
    Router,
    extract::{Request, State},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};

use std::sync::Arc;

use crate::{
    ServerError, TokenIssuer, cars, depots, receipts, rents, statistics, users, waiting_list,
};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub tokens: Arc<TokenIssuer>,
}

impl ServerState {
    pub fn new(engine: Engine, tokens: TokenIssuer) -> Self {
        Self {
            engine: Arc::new(engine),
            tokens: Arc::new(tokens),
        }
    }
}

/// Resolve the bearer token into an [`crate::Actor`].
///
/// Role checks are left to the engine.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let Some(TypedHeader(Authorization(bearer))) = auth_header else {
        return Err(ServerError::Unauthorized("missing bearer token".to_string()));
    };
    let actor = state.tokens.verify(bearer.token())?;

    request.extensions_mut().insert(actor);
    Ok(next.run(request).await)
}

async fn health() -> &'static str {
    "ok"
}

fn public_routes() -> Router<ServerState> {
    Router::new()
        .route("/health", get(health))
        .route("/users/login", post(users::login))
        .route("/users/register", post(users::register))
        .route("/cars", get(cars::list))
        .route("/cars/{id}", get(cars::get))
        .route("/depots", get(depots::list))
}

fn protected_routes(state: ServerState) -> Router<ServerState> {
    Router::new()
        .route("/users", get(users::list))
        .route("/users/me", get(users::me))
        .route("/users/guest", post(users::guest_new))
        .route("/users/{id}", get(users::get).put(users::update))
        .route("/users/{id}/role", put(users::set_role))
        .route("/users/{id}/rents", get(rents::for_renter))
        .route("/users/{id}/waiting-list", get(waiting_list::for_user))
        .route("/cars", post(cars::create))
        .route("/cars/{id}", put(cars::update).delete(cars::delete))
        .route(
            "/cars/{id}/waiting-list",
            get(waiting_list::list).post(waiting_list::join),
        )
        .route("/cars/{id}/waiting-list/notify", post(waiting_list::notify))
        .route("/depots", post(depots::create))
        .route(
            "/depots/{id}",
            get(depots::get).put(depots::update).delete(depots::delete),
        )
        .route("/rents", get(rents::list).post(rents::create))
        .route("/rents/{id}", get(rents::get))
        .route("/rents/{id}/approve", post(rents::approve))
        .route("/rents/{id}/reject", post(rents::reject))
        .route("/rents/{id}/cancel", post(rents::cancel))
        .route("/rents/{id}/invoice-request", post(rents::invoice_request))
        .route("/rents/{id}/hand-over", post(rents::hand_over))
        .route("/rents/{id}/take-back", post(rents::take_back))
        .route(
            "/rents/{id}/receipt",
            get(receipts::for_rent).post(receipts::issue),
        )
        .route("/receipts", get(receipts::list))
        .route("/receipts/{id}", get(receipts::get).put(receipts::correct))
        .route("/waiting-list/expire", post(waiting_list::expire))
        .route("/waiting-list/{id}/confirm", post(waiting_list::confirm))
        .route("/waiting-list/{id}/cancel", post(waiting_list::cancel))
        .route("/statistics", get(statistics::get_stats))
        .route_layer(middleware::from_fn_with_state(state, auth))
}

pub fn router(state: ServerState) -> Router {
    public_routes()
        .merge(protected_routes(state.clone()))
        .with_state(state)
}

pub async fn run_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    state: ServerState,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(state, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}
