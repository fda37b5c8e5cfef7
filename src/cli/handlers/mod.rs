//! CLI command handlers.

pub mod call;
pub mod chat;
pub mod check;
pub mod tools;
