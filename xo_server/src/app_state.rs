use crate::game::session::GameSession;

use tokio::sync::RwLock;

/// The one session every request works on. Writers hold the lock for a
/// whole human + opponent round.
pub struct AppState {
    pub session: RwLock<GameSession>,
}

impl AppState {
    pub fn new(session: GameSession) -> Self {
        AppState {
            session: RwLock::new(session),
        }
    }
}
