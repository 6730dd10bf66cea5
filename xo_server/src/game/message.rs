use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::models::{Board, Player};

/// Body of `POST /reset`. A missing `human` means the human plays X.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub human: Option<String>,
}

/// Body of `POST /move`. `pos` is kept as a raw JSON number so that
/// negative or oversized indexes are reported as illegal moves rather than
/// malformed bodies.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MoveRequest {
    #[serde(default)]
    pub pos: Option<Number>,
}

/// What every endpoint returns: the whole session as seen by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: Board,
    pub human: Player,
    pub ai: Player,
    pub current: Player,
    pub game_over: bool,
    pub winner: Option<Player>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
