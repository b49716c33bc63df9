//! ASTRA core: progression state and generative-AI tasks for the dashboard.
//!
//! # Overview
//! Two components carry the behaviour every front-end relies on:
//!
//! - [`progression::ProgressionEngine`]: global XP, derived level and
//!   progress, per-topic skill XP, persistence and short-lived award
//!   notifications.
//! - [`task::TaskController`]: one-shot generation calls with a timeout,
//!   typed JSON parsing and a simulated-data fallback when the provider
//!   reports an exhausted quota.
//!
//! The feature tasks (trivia, document scan, career analysis) live in
//! [`tasks`], the timed quiz in [`arcade`] and the follow-up conversation in
//! [`chat`]. Providers plug in through [`generation::GenerationProvider`] or,
//! for REST backends, [`generation::http::HTTPGenerationProvider`].

#[cfg(feature = "http-client")]
pub mod adapters;

/// Timed trivia rounds
pub mod arcade;

/// Career follow-up conversation
pub mod chat;

pub mod clock;

/// Runtime configuration
pub mod config;

/// Error types and handling
pub mod error;

/// Generation capability traits and prompt types
pub mod generation;

#[cfg(feature = "http-client")]
pub mod outbound;

pub mod progression;

/// Key-value persistence port
pub mod store;

pub mod task;

/// Prompt templates and offline datasets for each feature
pub mod tasks;

#[cfg(test)]
pub mod test_utils;

pub use config::AstraConfig;
pub use error::AstraError;
pub use generation::{ChatMessage, ChatRole, GenerationProvider, MediaMime, Prompt};
pub use progression::{Notification, NotificationKind, ProgressSnapshot, ProgressionEngine};
pub use task::{FailureKind, TaskConfig, TaskController, TaskFailure, TaskRequest, TaskResult};
