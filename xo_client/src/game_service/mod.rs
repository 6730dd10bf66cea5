pub mod model;
pub mod service;

pub use model::{Player, Snapshot};
pub use service::{SessionApi, SessionClient};
