use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use thiserror::Error;
use tracing::debug;

pub const BOARD_SIZE: usize = 9;

const WIN_LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Player {
    X,
    O,
}

impl Player {
    pub fn other(self) -> Player {
        match self {
            Player::X => Player::O,
            Player::O => Player::X,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Player::X => 0,
            Player::O => 1,
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected \"X\" or \"O\", got {0:?}")]
pub struct ParsePlayerError(pub String);

impl FromStr for Player {
    type Err = ParsePlayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Player::X),
            "O" | "o" => Ok(Player::O),
            other => Err(ParsePlayerError(other.to_string())),
        }
    }
}

/// One board square. Serialized as `"X"`, `"O"` or `" "`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = " ")]
    Empty,
    X,
    O,
}

impl Cell {
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::X => Some(Player::X),
            Cell::O => Some(Player::O),
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Cell::Empty => ' ',
            Cell::X => 'X',
            Cell::O => 'O',
        }
    }
}

impl From<Player> for Cell {
    fn from(player: Player) -> Self {
        match player {
            Player::X => Cell::X,
            Player::O => Cell::O,
        }
    }
}

pub type Board = [Cell; BOARD_SIZE];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("position {0} is outside the board (0-8)")]
    OutOfRange(i64),
    #[error("cell {0} is already taken")]
    Occupied(usize),
    #[error("game is already over")]
    GameOver,
    #[error("it's not {0}'s turn")]
    NotYourTurn(Player),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    pub board: Board,
    pub current_turn: Player,
    pub game_over: bool,
    pub winner: Option<Player>,
}

impl Default for Game {
    fn default() -> Self {
        Game {
            board: [Cell::Empty; BOARD_SIZE],
            current_turn: Player::X,
            game_over: false,
            winner: None,
        }
    }
}

impl Game {
    /// Places the current player's symbol at `pos`. The turn only passes to
    /// the other player when the move does not end the game.
    pub fn make_move(&mut self, pos: usize) -> Result<(), MoveError> {
        if self.game_over {
            debug!("Move rejected: Game is already over.");
            return Err(MoveError::GameOver);
        }
        if pos >= BOARD_SIZE {
            debug!("Move rejected: Position {} out of bounds.", pos);
            return Err(MoveError::OutOfRange(
                i64::try_from(pos).unwrap_or(i64::MAX),
            ));
        }
        if self.board[pos] != Cell::Empty {
            debug!("Move rejected: Cell {} already taken.", pos);
            return Err(MoveError::Occupied(pos));
        }

        let player = self.current_turn;
        self.board[pos] = player.into();
        self.check_game_over();

        if self.game_over {
            match self.winner {
                Some(winner) => debug!("Game over: {} wins.", winner),
                None => debug!("Game over: It's a draw."),
            }
        } else {
            self.current_turn = player.other();
            debug!("Turn switched: Now it's {}'s turn.", self.current_turn);
        }

        Ok(())
    }

    pub fn available_moves(&self) -> Vec<usize> {
        (0..BOARD_SIZE)
            .filter(|&i| self.board[i] == Cell::Empty)
            .collect()
    }

    /// Board as a 9 character string, used as the Q-table key.
    pub fn state_key(&self) -> String {
        board_key(&self.board)
    }

    fn check_game_over(&mut self) {
        if let Some(player) = check_winner(&self.board) {
            self.game_over = true;
            self.winner = Some(player);
        } else if is_full(&self.board) {
            self.game_over = true;
            self.winner = None;
        }
    }
}

pub fn board_key(board: &Board) -> String {
    board.iter().map(|cell| cell.as_char()).collect()
}

pub fn check_winner(board: &Board) -> Option<Player> {
    WIN_LINES.iter().find_map(|&[a, b, c]| {
        let player = board[a].player()?;
        (board[a] == board[b] && board[b] == board[c]).then_some(player)
    })
}

pub fn is_full(board: &Board) -> bool {
    board.iter().all(|&cell| cell != Cell::Empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(s: &str) -> Board {
        let mut board = [Cell::Empty; BOARD_SIZE];
        for (i, ch) in s.chars().enumerate() {
            board[i] = match ch {
                'X' => Cell::X,
                'O' => Cell::O,
                _ => Cell::Empty,
            };
        }
        board
    }

    #[test]
    fn default_game_is_empty_with_x_to_move() {
        let game = Game::default();
        assert_eq!(game.board, [Cell::Empty; BOARD_SIZE]);
        assert_eq!(game.current_turn, Player::X);
        assert!(!game.game_over);
        assert_eq!(game.winner, None);
        assert_eq!(game.available_moves().len(), 9);
    }

    #[test]
    fn every_line_is_detected_for_both_symbols() {
        for line in WIN_LINES {
            for (player, cell) in [(Player::X, Cell::X), (Player::O, Cell::O)] {
                let mut board = [Cell::Empty; BOARD_SIZE];
                for i in line {
                    board[i] = cell;
                }
                assert_eq!(check_winner(&board), Some(player), "line {:?}", line);
            }
        }
    }

    #[test]
    fn mixed_line_is_not_a_win() {
        assert_eq!(check_winner(&board_from("XXO      ")), None);
        assert_eq!(check_winner(&board_from("         ")), None);
    }

    #[test]
    fn completing_a_row_wins() {
        let mut game = Game {
            board: board_from("XX OO    "),
            ..Game::default()
        };
        game.make_move(2).unwrap();
        assert!(game.game_over);
        assert_eq!(game.winner, Some(Player::X));
        // Winner keeps the turn marker.
        assert_eq!(game.current_turn, Player::X);
    }

    #[test]
    fn filling_the_board_without_a_line_is_a_draw() {
        // X O X
        // X O O
        // O X _   <- X plays 8
        let mut game = Game {
            board: board_from("XOXXOOOX "),
            ..Game::default()
        };
        game.make_move(8).unwrap();
        assert!(game.game_over);
        assert_eq!(game.winner, None);
        assert!(is_full(&game.board));
    }

    #[test]
    fn turn_alternates_after_non_terminal_moves() {
        let mut game = Game::default();
        game.make_move(4).unwrap();
        assert_eq!(game.current_turn, Player::O);
        game.make_move(0).unwrap();
        assert_eq!(game.current_turn, Player::X);
        assert_eq!(game.board[4], Cell::X);
        assert_eq!(game.board[0], Cell::O);
    }

    #[test]
    fn illegal_moves_leave_the_game_untouched() {
        let mut game = Game::default();
        game.make_move(4).unwrap();
        let before = game.clone();

        assert_eq!(game.make_move(4), Err(MoveError::Occupied(4)));
        assert_eq!(game.make_move(9), Err(MoveError::OutOfRange(9)));
        assert_eq!(game, before);
    }

    #[test]
    fn no_move_after_game_over() {
        let mut game = Game {
            board: board_from("XOXXOOOXX"),
            game_over: true,
            ..Game::default()
        };
        let before = game.clone();
        assert_eq!(game.make_move(0), Err(MoveError::GameOver));
        assert_eq!(game, before);
    }

    #[test]
    fn player_parsing_accepts_either_case() {
        assert_eq!("X".parse::<Player>(), Ok(Player::X));
        assert_eq!("o".parse::<Player>(), Ok(Player::O));
        assert!("Z".parse::<Player>().is_err());
        assert!("".parse::<Player>().is_err());
    }

    #[test]
    fn cells_serialize_as_single_characters() {
        let json = serde_json::to_string(&[Cell::X, Cell::Empty, Cell::O]).unwrap();
        assert_eq!(json, r#"["X"," ","O"]"#);
    }

    #[test]
    fn state_key_mirrors_the_board() {
        let game = Game {
            board: board_from("X   O    "),
            ..Game::default()
        };
        assert_eq!(game.state_key(), "X   O    ");
    }
}
