use axum::{body::Bytes, extract::State, Json};
use serde::de::DeserializeOwned;
use serde_json::Number;

use crate::app_state::AppState;
use crate::error::AppError;
use crate::game::message::{HealthResponse, MoveRequest, ResetRequest, Snapshot};
use crate::game::models::Player;

use std::sync::Arc;
use tracing::{debug, info};

/// An empty body is read as the request type's default, like a form posted
/// without fields.
fn parse_body<T: DeserializeOwned + Default>(body: &[u8]) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::InvalidArgument(format!("malformed request body: {}", e)))
}

/// Integers past `i64::MAX` saturate; they are out of range either way.
fn cell_index(pos: &Number) -> Result<i64, AppError> {
    pos.as_i64()
        .or_else(|| pos.as_u64().map(|_| i64::MAX))
        .ok_or_else(|| AppError::InvalidArgument(format!("pos must be an integer, got {}", pos)))
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<Snapshot> {
    let session = state.session.read().await;
    Json(session.snapshot())
}

#[axum::debug_handler]
pub async fn reset_game(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Snapshot>, AppError> {
    let request: ResetRequest = parse_body(&body)?;
    let human = match request.human.as_deref() {
        None => Player::X,
        Some(raw) => raw
            .parse::<Player>()
            .map_err(|e| AppError::InvalidArgument(format!("human: {}", e)))?,
    };
    info!("📥 RESET request - human: {}", human);

    let mut session = state.session.write().await;
    let snapshot = session.restart(human)?;
    info!("✅ Game restarted, {} to move", snapshot.current);

    Ok(Json(snapshot))
}

#[axum::debug_handler]
pub async fn make_move(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Snapshot>, AppError> {
    let request: MoveRequest = parse_body(&body)?;
    let pos = request
        .pos
        .ok_or_else(|| AppError::InvalidArgument("missing field `pos`".to_string()))?;
    let pos = cell_index(&pos)?;
    info!("📥 MOVE request - pos: {}", pos);

    let mut session = state.session.write().await;
    let snapshot = session.play(pos).map_err(|e| {
        debug!("Move {} by {} rejected: {}", pos, session.human(), e);
        AppError::from(e)
    })?;

    if snapshot.game_over {
        match snapshot.winner {
            Some(winner) => info!("🏁 Game over: {} wins", winner),
            None => info!("🏁 Game over: draw"),
        }
    }

    Ok(Json(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_bodies_fall_back_to_defaults() {
        let reset: ResetRequest = parse_body(b"").unwrap();
        assert!(reset.human.is_none());
        let mv: MoveRequest = parse_body(b"  \n").unwrap();
        assert!(mv.pos.is_none());
    }

    #[test]
    fn garbage_bodies_are_invalid_arguments() {
        let err = parse_body::<MoveRequest>(b"{pos: 1").unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
        let err = parse_body::<MoveRequest>(br#"{"pos": "four"}"#).unwrap_err();
        assert!(matches!(err, AppError::InvalidArgument(_)));
    }

    #[test]
    fn cell_index_accepts_any_integer() {
        let request: MoveRequest = parse_body(br#"{"pos": -3}"#).unwrap();
        assert_eq!(cell_index(&request.pos.unwrap()).unwrap(), -3);

        let request: MoveRequest = parse_body(br#"{"pos": 18446744073709551615}"#).unwrap();
        assert_eq!(cell_index(&request.pos.unwrap()).unwrap(), i64::MAX);

        let request: MoveRequest = parse_body(br#"{"pos": 4.5}"#).unwrap();
        assert!(matches!(
            cell_index(&request.pos.unwrap()),
            Err(AppError::InvalidArgument(_))
        ));
    }
}
