//! Provider name constants
//!
//! This module defines canonical provider names used throughout the SDK

/// Generic HTTP agent speaking the `{ messages } -> { text }` contract
pub const AGENT: &str = "agent";

/// Cloudflare Workers AI REST API
pub const WORKERS_AI: &str = "workers_ai";
