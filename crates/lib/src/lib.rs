//! Conduit core library: timer-triggered routes that pass messages through
//! LLM agents (with optional per-conversation memory) and log the replies.

pub mod agent;
pub mod config;
pub mod context;
pub mod demo;
pub mod dsl;
pub mod endpoint;
pub mod exchange;
pub mod expression;
pub mod init;
pub mod llm;
pub mod log_sink;
pub mod mock;
pub mod producer;
pub mod route;
pub mod timer;
