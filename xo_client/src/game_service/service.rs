use crate::game_service::model::{Player, Snapshot};

use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// The three calls the front-end needs. Every call returns the full session.
pub trait SessionApi {
    fn state(&self) -> Result<Snapshot, ClientError>;
    fn reset(&self, human: Player) -> Result<Snapshot, ClientError>;
    fn make_move(&self, pos: usize) -> Result<Snapshot, ClientError>;
}

pub struct SessionClient {
    client: Client,
    server_url: String,
}

impl SessionClient {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            server_url: server_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.server_url, path)
    }

    fn read_snapshot(response: Response) -> Result<Snapshot, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<Snapshot>()?);
        }

        let text = response.text()?;
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        Err(ClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }
}

impl SessionApi for SessionClient {
    fn state(&self) -> Result<Snapshot, ClientError> {
        debug!("GET /state");
        let response = self.client.get(self.url("/state")).send()?;
        Self::read_snapshot(response)
    }

    fn reset(&self, human: Player) -> Result<Snapshot, ClientError> {
        info!("📤 Resetting game as {}", human);
        let response = self
            .client
            .post(self.url("/reset"))
            .json(&serde_json::json!({ "human": human }))
            .send()?;
        Self::read_snapshot(response)
    }

    fn make_move(&self, pos: usize) -> Result<Snapshot, ClientError> {
        info!("📤 Sending move {}", pos);
        let response = self
            .client
            .post(self.url("/move"))
            .json(&serde_json::json!({ "pos": pos }))
            .send()?;
        Self::read_snapshot(response)
    }
}
