//! Doc Chat - AI conversations attached to wiki documents
//!
//! A Rust library for storing and serving the chat messages members exchange
//! with an external inference service about a documentation page.
//!
//! # Features
//!
//! - Paginated message listing with per-viewer delete permissions
//! - Chat and analysis turns proxied to an inference HTTP service
//! - Comment-policy enforcement per collection (book)
//! - Role-based message deletion

/// HTTP routes and JSON envelopes
pub mod api;
/// Configuration management
pub mod config;
/// Database connection pooling and catalog lookups
pub mod db;
/// Error types
pub mod error;
/// Outbound calls to the inference service
pub mod inference;
/// Logging setup and utilities
pub mod logging;
/// Metrics collection
pub mod metrics;
/// Data models and structures
pub mod models;
/// Delete permission checks
pub mod permission;
/// Database schema definitions
pub mod schema;
/// Request orchestration
pub mod service;
/// Chat message persistence
pub mod store;
/// Input validation and sanitization
pub mod validation;

// Re-export key components for easier access
pub use db::Database;
pub use error::{ChatError, ErrorKind, Result};
pub use inference::{HttpInferenceGateway, InferenceGateway, InferenceRequest};
pub use models::{ChatMessage, Document, Member, PageRequest};
pub use service::ChatService;
pub use store::MessageStore;
