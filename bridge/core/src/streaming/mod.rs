//! Streaming Token Bridge
//!
//! This module turns a callback-driven token producer into a pull-based
//! token sequence. A generation backend reports progress through lifecycle
//! hooks; a reader loop pulls tokens in generation order until the run ends.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────┐                          ┌────────────────────┐
//! │ Generation backend │                          │    Reader loop     │
//! │                    │   start()  ─┐            │                    │
//! │  on_start          │   push(t)  ─┼─► [ FIFO ] ─► pull() / tokens()  │
//! │  on_token          │   finish() ─┤   run-     │                    │
//! │  on_end / on_error │   fail(e)  ─┘   stamped  │  cancel()          │
//! └────────────────────┘                          └────────────────────┘
//! ```
//!
//! # Guarantees
//!
//! - **FIFO**: tokens come out in the order they were pushed
//! - **Termination**: one `finish`/`fail` per run yields exactly one end-of-stream
//! - **Run isolation**: `start` discards anything left from earlier runs
//! - **Cooperative cancellation**: after `cancel`, every pull ends immediately
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bridge_core::streaming::TokenBridge;
//!
//! let bridge = Arc::new(TokenBridge::new());
//! let producer = Arc::clone(&bridge);
//!
//! let handle = std::thread::spawn(move || {
//!     producer.start();
//!     producer.push("Hello");
//!     producer.push(" world");
//!     producer.finish();
//! });
//!
//! let text: String = bridge.tokens().collect();
//! handle.join().unwrap();
//! assert_eq!(text, "Hello world");
//! ```

mod bridge;

pub use bridge::{
    BridgeOptions, BridgeStats, Pulled, StreamEnd, TimeoutPolicy, TokenBridge, Tokens,
};
