pub mod chat;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod init;
pub mod mcp;
pub mod progress;
pub mod search;
pub mod transport;

pub use error::QRadarError;
