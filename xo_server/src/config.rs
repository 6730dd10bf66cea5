//! Start-up configuration read from environment variables.

use std::env;
use tracing::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_TRAINING_EPISODES: usize = 30_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `HOST`
    pub host: String,
    /// `PORT`
    pub port: u16,
    /// `XO_TRAINING_EPISODES`: self-play games played before serving.
    pub training_episodes: usize,
    /// `XO_SEED`: fixes the opponent's RNG when set.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            training_episodes: DEFAULT_TRAINING_EPISODES,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or("PORT", lookup("PORT"), defaults.port),
            training_episodes: parse_or(
                "XO_TRAINING_EPISODES",
                lookup("XO_TRAINING_EPISODES"),
                defaults.training_episodes,
            ),
            seed: lookup("XO_SEED").and_then(|raw| match raw.trim().parse() {
                Ok(seed) => Some(seed),
                Err(_) => {
                    warn!("Ignoring XO_SEED={:?}: not an unsigned integer", raw);
                    None
                }
            }),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Debug,
{
    match raw {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring {}={:?}, using default {:?}", key, raw, default);
            default
        }),
    }
}
