//! open-coder Engine Library
//!
//! This library provides the core functionality of the open-coder agent.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Shell command execution module
pub mod command_executor;

/// Workspace context gathering and prompt rendering
pub mod context;

/// Model reply extraction and decoding
pub mod response;

/// LLM provider abstraction layer
pub mod llm;

/// Agent loop core module
pub mod agent;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
