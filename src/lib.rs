//! DeepSeek Code - terminal assistant for analyzing, explaining, generating
//! and refactoring source code through the DeepSeek chat-completions API.
//!
//! The library provides everything the `deepseek` binary runs on:
//!
//! - **Interactive sessions** with slash-commands and follow-up prompts
//! - **Per-directory trust** before any file is read or sent
//! - **Persistent credentials** with validated generation parameters
//! - **Tolerant reply decoding** that falls back to the raw text
//!
//! # Architecture
//!
//! - [`session`] - The interactive loop: trust gate, config load, dispatch
//! - [`trust_gate`] - One-time consent per working directory
//! - [`command_router`] - Parses a line into a [`command_router::Command`]
//! - [`operations`] - analyze, explain, generate, refactor
//! - [`remote_client`] - Chat-completions requests and failure classification
//! - [`prompts`] - Task templates sent as the user message
//! - [`interpreter`] - Decodes replies into structured results
//! - [`render`] - Console output for results and status lines
//! - [`files`] - Source reads, output writes, language detection
//! - [`config`] - Credentials record and its on-disk store
//! - [`http_client`] - HTTP client abstraction
//! - [`error`] - The error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use deepseek_code::config::CredentialStore;
//! use deepseek_code::http_client::ReqwestHttpClient;
//! use deepseek_code::session::Session;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut session = Session::new(
//!         std::env::current_dir()?,
//!         CredentialStore::new()?,
//!         Arc::new(ReqwestHttpClient::new()),
//!         std::io::stdin().lock(),
//!         std::io::stdout(),
//!     );
//!     session.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Reply decoding
//!
//! Analysis, explanation and refactor replies are expected as JSON objects.
//! When a reply is not, the command still succeeds and the text is shown as
//! it came back:
//!
//! ```
//! use deepseek_code::interpreter::{interpret, AnalysisResult, Interpreted};
//!
//! let reply = interpret::<AnalysisResult>("Looks fine to me.");
//! assert_eq!(reply, Interpreted::Raw("Looks fine to me.".to_string()));
//! ```

pub mod command_router;
pub mod config;
pub mod error;
pub mod files;
pub mod http_client;
pub mod interpreter;
pub mod operations;
pub mod prompts;
pub mod remote_client;
pub mod render;
pub mod session;
pub mod trust_gate;
