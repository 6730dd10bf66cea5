//! Opponent move selection.
//!
//! The session only knows the [`MoveSelector`] capability. The production
//! opponent is a pair of tabular Q-learning agents trained against each
//! other when the server starts.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use tracing::{debug, info};

use super::models::{board_key, Board, Cell, Game, Player, BOARD_SIZE};

/// Picks the next move for `symbol`. Returns `None` only when the board has
/// no empty cell left.
pub trait MoveSelector: Send + Sync {
    fn select_move(&mut self, board: &Board, symbol: Player) -> Option<usize>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LearningParams {
    pub alpha: f64,
    pub gamma: f64,
    pub epsilon: f64,
}

impl Default for LearningParams {
    fn default() -> Self {
        Self {
            alpha: 0.4,
            gamma: 0.95,
            epsilon: 0.2,
        }
    }
}

pub struct QLearningAgent {
    q: HashMap<String, [f64; BOARD_SIZE]>,
    params: LearningParams,
    rng: StdRng,
}

impl QLearningAgent {
    pub fn new(params: LearningParams, rng: StdRng) -> Self {
        Self {
            q: HashMap::new(),
            params,
            rng,
        }
    }

    pub fn params(&self) -> LearningParams {
        self.params
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.params.epsilon = epsilon;
    }

    pub fn known_states(&self) -> usize {
        self.q.len()
    }

    pub fn get_q(&self, state: &str, action: usize) -> f64 {
        self.q.get(state).map_or(0.0, |values| values[action])
    }

    pub fn set_q(&mut self, state: &str, action: usize, value: f64) {
        match self.q.get_mut(state) {
            Some(values) => values[action] = value,
            None => {
                let mut values = [0.0; BOARD_SIZE];
                values[action] = value;
                self.q.insert(state.to_string(), values);
            }
        }
    }

    /// Epsilon-greedy choice; ties between the best actions are broken at
    /// random.
    pub fn choose(&mut self, state: &str, actions: &[usize], explore: bool) -> Option<usize> {
        if actions.is_empty() {
            return None;
        }
        if explore && self.rng.gen::<f64>() < self.params.epsilon {
            return actions.choose(&mut self.rng).copied();
        }

        let best_value = actions
            .iter()
            .map(|&a| self.get_q(state, a))
            .fold(f64::NEG_INFINITY, f64::max);
        let best: Vec<usize> = actions
            .iter()
            .copied()
            .filter(|&a| self.get_q(state, a) == best_value)
            .collect();
        best.choose(&mut self.rng).copied()
    }

    /// One Q-learning update. `next` is `None` for terminal transitions.
    pub fn learn(
        &mut self,
        state: &str,
        action: usize,
        reward: f64,
        next: Option<(&str, &[usize])>,
    ) {
        let old = self.get_q(state, action);
        let target = match next {
            Some((next_state, next_actions)) if !next_actions.is_empty() => {
                let best_next = next_actions
                    .iter()
                    .map(|&a| self.get_q(next_state, a))
                    .fold(f64::NEG_INFINITY, f64::max);
                reward + self.params.gamma * best_next
            }
            _ => reward,
        };
        let updated = old + self.params.alpha * (target - old);
        self.set_q(state, action, updated);
    }
}

fn reward_for(player: Player, winner: Option<Player>) -> f64 {
    match winner {
        None => 0.0,
        Some(w) if w == player => 1.0,
        Some(_) => -1.0,
    }
}

/// One Q-learning agent per symbol, indexed by [`Player::index`].
pub struct TrainedOpponent {
    agents: [QLearningAgent; 2],
}

impl TrainedOpponent {
    pub fn new(params: LearningParams, seed: Option<u64>) -> Self {
        let rng_for = |offset: u64| match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(offset)),
            None => StdRng::from_entropy(),
        };
        Self {
            agents: [
                QLearningAgent::new(params, rng_for(0)),
                QLearningAgent::new(params, rng_for(1)),
            ],
        }
    }

    /// Builds both agents, trains them by self-play and turns exploration
    /// off for inference.
    pub fn train(episodes: usize, seed: Option<u64>) -> Self {
        let mut opponent = Self::new(LearningParams::default(), seed);
        opponent.self_play(episodes);
        for agent in &mut opponent.agents {
            agent.set_epsilon(0.0);
        }
        info!(
            "Self-play training finished: {} episodes, {} X states, {} O states",
            episodes,
            opponent.agent(Player::X).known_states(),
            opponent.agent(Player::O).known_states()
        );
        opponent
    }

    pub fn agent(&self, player: Player) -> &QLearningAgent {
        &self.agents[player.index()]
    }

    fn agent_mut(&mut self, player: Player) -> &mut QLearningAgent {
        &mut self.agents[player.index()]
    }

    pub fn self_play(&mut self, episodes: usize) {
        for episode in 0..episodes {
            self.play_episode();
            if (episode + 1) % 10_000 == 0 {
                debug!("Self-play progress: {}/{} episodes", episode + 1, episodes);
            }
        }
    }

    fn play_episode(&mut self) {
        let mut game = Game::default();
        // Last (state, action) taken by each symbol, awaiting its reward.
        let mut last: [Option<(String, usize)>; 2] = [None, None];

        while !game.game_over {
            let player = game.current_turn;
            let state = game.state_key();
            let actions = game.available_moves();
            let Some(action) = self.agent_mut(player).choose(&state, &actions, true) else {
                break;
            };
            if game.make_move(action).is_err() {
                break;
            }

            if game.game_over {
                let reward = reward_for(player, game.winner);
                self.agent_mut(player).learn(&state, action, reward, None);

                let opponent = player.other();
                if let Some((prev_state, prev_action)) = last[opponent.index()].take() {
                    let opponent_reward = reward_for(opponent, game.winner);
                    self.agent_mut(opponent)
                        .learn(&prev_state, prev_action, opponent_reward, None);
                }
            } else {
                if let Some((prev_state, prev_action)) = last[player.index()].take() {
                    let next_state = game.state_key();
                    let next_actions = game.available_moves();
                    self.agent_mut(player).learn(
                        &prev_state,
                        prev_action,
                        0.0,
                        Some((next_state.as_str(), next_actions.as_slice())),
                    );
                }
                last[player.index()] = Some((state, action));
            }
        }
    }
}

impl MoveSelector for TrainedOpponent {
    fn select_move(&mut self, board: &Board, symbol: Player) -> Option<usize> {
        let state = board_key(board);
        let actions: Vec<usize> = (0..BOARD_SIZE)
            .filter(|&i| board[i] == Cell::Empty)
            .collect();
        self.agent_mut(symbol).choose(&state, &actions, false)
    }
}

/// Always takes the lowest empty cell. Keeps session tests deterministic.
#[cfg(test)]
pub(crate) struct LowestEmptyCell;

#[cfg(test)]
impl MoveSelector for LowestEmptyCell {
    fn select_move(&mut self, board: &Board, _symbol: Player) -> Option<usize> {
        board.iter().position(|&cell| cell == Cell::Empty)
    }
}

/// Never finds a move.
#[cfg(test)]
pub(crate) struct NoMove;

#[cfg(test)]
impl MoveSelector for NoMove {
    fn select_move(&mut self, _board: &Board, _symbol: Player) -> Option<usize> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> QLearningAgent {
        QLearningAgent::new(LearningParams::default(), StdRng::seed_from_u64(7))
    }

    #[test]
    fn unseen_pairs_default_to_zero() {
        let agent = agent();
        assert_eq!(agent.get_q("         ", 4), 0.0);
        assert_eq!(agent.known_states(), 0);
    }

    #[test]
    fn terminal_update_moves_towards_reward() {
        let mut agent = agent();
        agent.learn("XX OO    ", 2, 1.0, None);
        assert!((agent.get_q("XX OO    ", 2) - 0.4).abs() < 1e-12);

        agent.learn("XX OO    ", 2, 1.0, None);
        // 0.4 + 0.4 * (1.0 - 0.4)
        assert!((agent.get_q("XX OO    ", 2) - 0.64).abs() < 1e-12);
    }

    #[test]
    fn intermediate_update_bootstraps_from_next_state() {
        let mut agent = agent();
        agent.set_q("X   O    ", 8, 1.0);
        agent.learn("X        ", 4, 0.0, Some(("X   O    ", &[1, 2, 8][..])));
        // 0.4 * 0.95 * 1.0
        assert!((agent.get_q("X        ", 4) - 0.38).abs() < 1e-12);
    }

    #[test]
    fn empty_next_actions_count_as_terminal() {
        let mut agent = agent();
        agent.learn("s", 0, -1.0, Some(("t", &[][..])));
        assert!((agent.get_q("s", 0) + 0.4).abs() < 1e-12);
    }

    #[test]
    fn greedy_choice_picks_the_highest_value() {
        let mut agent = agent();
        agent.set_q("state", 3, 0.5);
        agent.set_q("state", 6, -0.5);
        for _ in 0..20 {
            assert_eq!(agent.choose("state", &[0, 3, 6], false), Some(3));
        }
    }

    #[test]
    fn greedy_ties_stay_within_the_best_actions() {
        let mut agent = agent();
        agent.set_q("state", 1, 0.2);
        agent.set_q("state", 5, 0.2);
        for _ in 0..20 {
            let choice = agent.choose("state", &[0, 1, 5], false).unwrap();
            assert!(choice == 1 || choice == 5);
        }
    }

    #[test]
    fn no_actions_means_no_choice() {
        let mut agent = agent();
        assert_eq!(agent.choose("XOXXOOOXX", &[], true), None);
    }

    #[test]
    fn training_fills_both_tables_and_disables_exploration() {
        let opponent = TrainedOpponent::train(500, Some(42));
        assert!(opponent.agent(Player::X).known_states() > 0);
        assert!(opponent.agent(Player::O).known_states() > 0);
        assert_eq!(opponent.agent(Player::X).params().epsilon, 0.0);
        assert_eq!(opponent.agent(Player::O).params().epsilon, 0.0);
    }

    #[test]
    fn trained_opponent_only_picks_empty_cells() {
        let mut opponent = TrainedOpponent::train(2_000, Some(1));
        let mut game = Game::default();
        while !game.game_over {
            let board = game.board;
            let pos = opponent
                .select_move(&board, game.current_turn)
                .expect("board has empty cells");
            assert_eq!(board[pos], Cell::Empty);
            game.make_move(pos).unwrap();
        }
    }

    #[test]
    fn seeded_training_is_reproducible() {
        let mut first = TrainedOpponent::train(1_000, Some(99));
        let mut second = TrainedOpponent::train(1_000, Some(99));
        let board = [Cell::Empty; BOARD_SIZE];
        assert_eq!(
            first.select_move(&board, Player::X),
            second.select_move(&board, Player::X)
        );
    }

    #[test]
    fn full_board_yields_no_move() {
        let mut opponent = TrainedOpponent::new(LearningParams::default(), Some(3));
        let board = [
            Cell::X,
            Cell::O,
            Cell::X,
            Cell::X,
            Cell::O,
            Cell::O,
            Cell::O,
            Cell::X,
            Cell::X,
        ];
        assert_eq!(opponent.select_move(&board, Player::O), None);
    }
}
