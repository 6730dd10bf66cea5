use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Player {
    X,
    O,
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Player::X => f.write_str("X"),
            Player::O => f.write_str("O"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    #[serde(rename = " ")]
    Empty,
    X,
    O,
}

/// Session as returned by every server endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub board: [Cell; 9],
    pub human: Player,
    #[serde(default)]
    pub ai: Option<Player>,
    pub current: Player,
    pub game_over: bool,
    pub winner: Option<Player>,
}

impl Default for Snapshot {
    fn default() -> Self {
        Snapshot {
            board: [Cell::Empty; 9],
            human: Player::X,
            ai: Some(Player::O),
            current: Player::X,
            game_over: false,
            winner: None,
        }
    }
}

impl Snapshot {
    /// Local pre-check before sending a move. The server decides anyway.
    pub fn can_play(&self, pos: usize) -> bool {
        !self.game_over && self.current == self.human && self.board.get(pos) == Some(&Cell::Empty)
    }

    pub fn status_text(&self) -> String {
        if self.game_over {
            match self.winner {
                None => "انتهت بالتعادل".to_string(),
                Some(winner) if winner == self.human => "أحسنت! فزت ✅".to_string(),
                Some(_) => "الذكاء فاز 🤖".to_string(),
            }
        } else {
            let turn = if self.current == self.human {
                "دورك"
            } else {
                "دور الذكاء"
            };
            format!("{} — أنت {}", turn, self.human)
        }
    }

    /// 3x3 grid; empty cells show their index so they can be typed.
    pub fn board_text(&self) -> String {
        let rows: Vec<String> = self
            .board
            .chunks(3)
            .enumerate()
            .map(|(row, cells)| {
                cells
                    .iter()
                    .enumerate()
                    .map(|(col, cell)| match cell {
                        Cell::X => " X ".to_string(),
                        Cell::O => " O ".to_string(),
                        Cell::Empty => format!(" {} ", row * 3 + col),
                    })
                    .collect::<Vec<_>>()
                    .join("|")
            })
            .collect();
        rows.join("\n---+---+---\n")
    }
}
