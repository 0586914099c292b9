pub(crate) mod appointments;
pub(crate) mod doctors;
pub(crate) mod health;
pub(crate) mod patients;
pub(crate) mod permissions;
pub(crate) mod roles;
pub(crate) mod users;

use crate::auth::{claims_middleware, rpt_exchange_middleware};
use crate::state::AppState;
use axum::{middleware, Router};

/// Combines all API routes into a single router
pub(super) fn router(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(protected_routes(state))
}

/// Creates a router for protected routes that sit behind the authorization
/// pipeline
fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(patients::router())
        .merge(doctors::router())
        .merge(appointments::router())
        .merge(users::router())
        .merge(roles::router())
        .merge(permissions::router())
        // Layers run outermost-last: the exchange stage must see the request
        // before bearer validation, so it is added after the claims layer.
        .layer(middleware::from_fn(claims_middleware))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rpt_exchange_middleware,
        ))
}
