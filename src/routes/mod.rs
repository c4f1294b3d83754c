use axum::{
    Router,
    extract::FromRequestParts,
    http::{HeaderName, request::Parts},
};

use crate::{
    error::AppError,
    state::{PlayerId, SharedState},
};

pub mod docs;
pub mod games;
pub mod health;
pub mod players;
pub mod rankings;

/// Header carrying the identifier of an already authenticated player.
pub const PLAYER_ID_HEADER: HeaderName = HeaderName::from_static("x-player-id");

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(players::router())
        .merge(games::router())
        .merge(rankings::router())
        .merge(docs::router());

    api_router.with_state(state)
}

/// Caller identity taken from [`PLAYER_ID_HEADER`].
pub struct Caller(pub PlayerId);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(&PLAYER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| AppError::Unauthorized("missing x-player-id header".into()))?;
        Ok(Caller(PlayerId::new(id)))
    }
}
