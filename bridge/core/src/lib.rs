//! Bridge Core - Callback-to-Pull Token Streaming
//!
//! Token producers such as LLM clients usually report their output through
//! callbacks: "generation started", "here is a token", "done", "failed".
//! Consumers usually want to iterate. This crate sits between the two.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────┐            ┌──────────────────────────┐
//! │   Producer (any thread)  │            │  Consumer (any thread)   │
//! │                          │            │                          │
//! │  TokenGenerator          │            │  for token in            │
//! │    └─ GenerationHooks ───┼──push()──▶ │    bridge.tokens() { }   │
//! │        on_start          │   queue    │                          │
//! │        on_token          │  (flume)   │  bridge.stream().await   │
//! │        on_end / on_error │            │                          │
//! └──────────────────────────┘            └────────────┬─────────────┘
//!                                                      │
//!                                            cancel() ─┘ stops both sides
//! ```
//!
//! # Key Types
//!
//! - [`TokenBridge`]: the queue, the run bookkeeping and the stop flag
//! - [`GenerationHooks`]: producer-side callbacks, implemented by the bridge
//! - [`TokenGenerator`]: anything that can produce tokens through hooks
//! - [`Document`]: text plus metadata, for the chunking helpers
//!
//! # Quick Start
//!
//! ```
//! use std::thread;
//! use bridge_core::TokenBridge;
//!
//! let bridge = TokenBridge::new();
//! bridge.start();
//!
//! thread::scope(|s| {
//!     s.spawn(|| {
//!         for token in ["Hello", ", ", "world"] {
//!             bridge.push(token);
//!         }
//!         bridge.finish();
//!     });
//!
//!     let text: String = bridge.tokens().collect();
//!     assert_eq!(text, "Hello, world");
//! });
//! ```
//!
//! # Module Overview
//!
//! - [`streaming`]: the bridge itself
//! - [`hooks`]: producer callbacks and the `run_generation` driver
//! - [`backend`]: token generators (Ollama, scripted)
//! - [`documents`]: splitting, chunking and metadata enrichment
//! - [`config`]: TOML and environment configuration

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod documents;
pub mod hooks;
pub mod streaming;

// Re-exports for convenience
pub use backend::{GenerationRequest, OllamaBackend, ScriptedGenerator, TokenGenerator};
pub use config::{load_config, load_config_from_path, BridgeConfig, ConfigError, ConfigSource};
pub use documents::{
    add_meta, chunk_sources, fix_json_meta, ChunkOptions, Document, DocumentError, MetaOptions,
    MetaValue, VectorStoreKind,
};
pub use hooks::{run_generation, GenerationHooks};
pub use streaming::{
    BridgeOptions, BridgeStats, Pulled, StreamEnd, TimeoutPolicy, TokenBridge, Tokens,
};
