use crate::game_service::{Player, SessionApi, Snapshot};

use std::io::{self, BufRead, Write};
use tracing::{debug, error, warn};

const HELP: &str = "Commands: 0-8 play a cell | x / o new game as that symbol | new | q quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Move(usize),
    PlayAs(Player),
    NewGame,
    Help,
    Quit,
}

impl Command {
    pub fn parse(input: &str) -> Option<Command> {
        let input = input.trim();
        if let Ok(pos) = input.parse::<usize>() {
            return Some(Command::Move(pos));
        }
        match input.to_ascii_lowercase().as_str() {
            "x" => Some(Command::PlayAs(Player::X)),
            "o" => Some(Command::PlayAs(Player::O)),
            "new" | "n" => Some(Command::NewGame),
            "help" | "?" | "" => Some(Command::Help),
            "q" | "quit" | "exit" => Some(Command::Quit),
            _ => None,
        }
    }
}

/// Terminal front-end. Holds no game logic: everything shown comes from the
/// last snapshot the server returned.
pub struct GameApp<S: SessionApi> {
    service: S,
    human: Player,
}

impl<S: SessionApi> GameApp<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            human: Player::X,
        }
    }

    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut out: W) -> io::Result<()> {
        match self.service.state() {
            Ok(snapshot) => self.render(&snapshot, &mut out)?,
            Err(e) => {
                error!("❌ Failed to load game state: {}", e);
                writeln!(out, "⚠️ {}", e)?;
            }
        }
        writeln!(out, "{}", HELP)?;

        for line in input.lines() {
            let line = line?;
            match Command::parse(&line) {
                Some(Command::Quit) => break,
                Some(command) => self.handle(command, &mut out)?,
                None => writeln!(out, "Unknown command {:?}. {}", line.trim(), HELP)?,
            }
        }
        Ok(())
    }

    pub fn handle<W: Write>(&mut self, command: Command, out: &mut W) -> io::Result<()> {
        let result = match command {
            Command::Move(pos) => return self.play(pos, out),
            Command::PlayAs(human) => self.service.reset(human),
            Command::NewGame => self.service.reset(self.human),
            Command::Help => return writeln!(out, "{}", HELP),
            Command::Quit => return Ok(()),
        };
        match result {
            Ok(snapshot) => self.render(&snapshot, out),
            Err(e) => {
                error!("❌ Reset failed: {}", e);
                writeln!(out, "⚠️ {}", e)
            }
        }
    }

    /// Fetches the state first and only sends the move when it can be legal.
    /// Failed moves are logged and otherwise ignored.
    fn play<W: Write>(&mut self, pos: usize, out: &mut W) -> io::Result<()> {
        let current = match self.service.state() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("Could not refresh state before move: {}", e);
                return Ok(());
            }
        };
        if !current.can_play(pos) {
            warn!("Skipping move {}: not playable on the current board", pos);
            return Ok(());
        }
        match self.service.make_move(pos) {
            Ok(snapshot) => self.render(&snapshot, out),
            Err(e) => {
                warn!("Move {} failed: {}", pos, e);
                Ok(())
            }
        }
    }

    fn render<W: Write>(&mut self, snapshot: &Snapshot, out: &mut W) -> io::Result<()> {
        self.human = snapshot.human;
        if let Some(ai) = snapshot.ai {
            debug!("Rendering board: human {}, AI {}", snapshot.human, ai);
        }
        writeln!(out)?;
        writeln!(out, "{}", snapshot.board_text())?;
        writeln!(out, "{}", snapshot.status_text())
    }
}
