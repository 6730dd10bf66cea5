pub mod agent;
pub mod handlers;
pub mod message;
pub mod models;
pub mod session;
