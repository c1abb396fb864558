pub mod client;
pub mod types;

pub use client::HttpAgentClient;
pub use types::*;
