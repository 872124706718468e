//! Daily tidbits from README-style tool lists.
//!
//! Each run picks one source document, draws three random positions, asks an
//! LLM CLI to explain the tools nearest those positions, and mails the result.
//!
//! This crate provides:
//! - Source and seed selection ([`SourceSelector`], [`SelectionSeed`])
//! - Prompt construction and subprocess-backed generation ([`ContentGenerator`])
//! - Markdown to styled HTML rendering ([`render`])
//! - Interchangeable delivery transports: IFTTT webhook, SendGrid, SMTP ([`delivery`])
//! - The run orchestrator ([`Publisher`])
//!
//! Scheduling is left to whatever invokes the binary (cron, a Kubernetes
//! CronJob, a CI schedule). Every run is independent and stateless.

pub mod config;
pub mod delivery;
pub mod error;
pub mod generator;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod seed;
pub mod source;

// Re-export main types
pub use config::{AppConfig, DeliveryConfig, TransportKind};
pub use delivery::{build_transport, DeliveryResult, Email, Transport};
pub use error::{Result, TidbitsError};
pub use generator::{ContentGenerator, GeneratedContent, LlmCli, TextGenerator};
pub use pipeline::{FailureReason, Publisher, RunMode, RunReport, RunState};
pub use seed::SelectionSeed;
pub use source::{SourceSelector, SourceUrl};
