pub mod client;
pub mod types;

pub use client::WorkersAiClient;
pub use types::*;

/// Default text-generation model
pub const DEFAULT_MODEL: &str = "@cf/meta/llama-3.1-8b-instruct";
