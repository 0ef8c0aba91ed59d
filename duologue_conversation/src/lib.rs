#![warn(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Two-party dialogue orchestration.
//!
//! The [`ConversationManager`] loads a persona roster from configuration,
//! starts bounded exchanges between named agents with retry-on-failure,
//! and keeps a chronological log of conversation topics queryable by
//! participant name.

mod manager;
mod topic;

pub use manager::{ConversationError, ConversationManager, DEFAULT_MAX_TURNS, EXCHANGE_ATTEMPTS};
pub use topic::TopicRecord;
