//! The single server-side game session.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::agent::MoveSelector;
use super::message::Snapshot;
use super::models::{Game, MoveError, Player, BOARD_SIZE};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    IllegalMove(#[from] MoveError),
    #[error("move selector returned no move for {0}")]
    NoMoveSelected(Player),
    #[error("move selector chose an illegal move for {symbol}: {source}")]
    SelectorMove { symbol: Player, source: MoveError },
}

pub struct GameSession {
    game: Game,
    human: Player,
    selector: Box<dyn MoveSelector>,
}

impl GameSession {
    /// Fresh session with the human playing X.
    pub fn new(selector: Box<dyn MoveSelector>) -> Self {
        Self {
            game: Game::default(),
            human: Player::X,
            selector,
        }
    }

    pub fn human(&self) -> Player {
        self.human
    }

    pub fn ai(&self) -> Player {
        self.human.other()
    }

    /// Discards the current game. The board is always empty afterwards even
    /// when the opponent opens; call [`GameSession::ai_move_if_needed`] to
    /// let it play.
    pub fn reset(&mut self, human: Player) -> Snapshot {
        self.game = Game::default();
        self.human = human;
        info!("Session reset: human plays {}, AI plays {}", human, self.ai());
        self.snapshot()
    }

    /// Lets the opponent move when it is its turn and the game is running.
    /// Returns the chosen cell, if any.
    pub fn ai_move_if_needed(&mut self) -> Result<Option<usize>, SessionError> {
        let ai = self.ai();
        if self.game.game_over || self.game.current_turn != ai {
            return Ok(None);
        }

        let pos = self
            .selector
            .select_move(&self.game.board, ai)
            .ok_or(SessionError::NoMoveSelected(ai))?;
        self.game
            .make_move(pos)
            .map_err(|source| SessionError::SelectorMove { symbol: ai, source })?;
        debug!("AI ({}) played {}", ai, pos);
        Ok(Some(pos))
    }

    /// Resets and lets the opponent open when the human plays O. If the
    /// opening move fails the previous session is restored.
    pub fn restart(&mut self, human: Player) -> Result<Snapshot, SessionError> {
        let before = (self.game.clone(), self.human);
        self.reset(human);
        match self.ai_move_if_needed() {
            Ok(opening) => {
                if let Some(pos) = opening {
                    info!("AI ({}) opened at {}", self.ai(), pos);
                }
                Ok(self.snapshot())
            }
            Err(err) => {
                warn!("Opponent failed to open, keeping previous game: {}", err);
                (self.game, self.human) = before;
                Err(err)
            }
        }
    }

    /// Plays the human's move at `pos` followed by the opponent's reply. On
    /// any error the session is left exactly as it was.
    pub fn play(&mut self, pos: i64) -> Result<Snapshot, SessionError> {
        if self.game.game_over {
            return Err(MoveError::GameOver.into());
        }
        if self.game.current_turn != self.human {
            return Err(MoveError::NotYourTurn(self.human).into());
        }
        let pos = usize::try_from(pos)
            .ok()
            .filter(|&p| p < BOARD_SIZE)
            .ok_or(MoveError::OutOfRange(pos))?;

        let before = self.game.clone();
        self.game.make_move(pos)?;
        debug!("Human ({}) played {}", self.human, pos);

        if let Err(err) = self.ai_move_if_needed() {
            warn!("Opponent failed to reply, rolling back: {}", err);
            self.game = before;
            return Err(err);
        }

        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            board: self.game.board,
            human: self.human,
            ai: self.ai(),
            current: self.game.current_turn,
            game_over: self.game.game_over,
            winner: self.game.winner,
        }
    }

    #[cfg(test)]
    pub(crate) fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }
}
