//! Token Generation Backends
//!
//! Producers that report their output through [`GenerationHooks`] callbacks
//! rather than returning a stream. Pair one with a
//! [`TokenBridge`](crate::streaming::TokenBridge) to read the output as a
//! pull-based sequence.
//!
//! # Available Backends
//!
//! - **Ollama**: local LLM server, streamed over NDJSON
//! - **Scripted**: fixed token list, for tests and demos
//!
//! # Usage
//!
//! ```ignore
//! use bridge_core::backend::{GenerationRequest, OllamaBackend};
//! use bridge_core::hooks::run_generation;
//!
//! let backend = OllamaBackend::from_env()?;
//! let request = GenerationRequest::new("Hello!", "llama3.2");
//! run_generation(&backend, &request, &bridge).await?;
//! ```
//!
//! [`GenerationHooks`]: crate::hooks::GenerationHooks

mod ollama;
mod scripted;
mod traits;

pub use ollama::{
    OllamaBackend, DEFAULT_HOST as OLLAMA_DEFAULT_HOST, DEFAULT_PORT as OLLAMA_DEFAULT_PORT,
};
pub use scripted::ScriptedGenerator;
pub use traits::{GenerationRequest, TokenGenerator};
