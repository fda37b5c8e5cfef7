pub mod catalog;
pub mod error;
pub mod gateway;
pub mod progress;
pub mod server;
pub mod types;

pub use catalog::{ToolCategory, ToolName};
pub use gateway::ToolGateway;
pub use server::QRadarServer;
pub use types::{ToolRequest, ToolResponse};
