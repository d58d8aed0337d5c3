//! Document Helpers
//!
//! Sequential transformations applied to documents before they reach a
//! vector store: splitting into chunks and stamping provenance metadata.
//! Nothing here is concurrent; these are the plain functions a generation
//! pipeline calls around the streaming core.
//!
//! # Example
//!
//! ```
//! use bridge_core::documents::{
//!     add_meta, chunk_sources, fix_json_meta, ChunkOptions, Document, MetaOptions,
//!     VectorStoreKind,
//! };
//!
//! let mut docs = vec![Document::new("alpha beta gamma")];
//! add_meta(&mut docs, "inline-note", &MetaOptions::default()).unwrap();
//!
//! let options = ChunkOptions {
//!     chunk_size: 10,
//!     store: VectorStoreKind::Faiss,
//!     ..Default::default()
//! };
//! let mut chunks = chunk_sources(docs, &options);
//! fix_json_meta(&mut chunks);
//!
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[1].chunk_id(), Some(1));
//! ```

use std::path::PathBuf;

use thiserror::Error;

mod chunking;
mod metadata;
mod splitter;
mod types;

pub use chunking::{
    chunk_sources, chunk_sources_with, ChunkOptions, VectorStoreKind, ORIGINAL_CHUNK_ID,
};
pub use metadata::{
    add_meta, add_parser, content_sha, fix_json_meta, hash_file, MetaOptions, DEFAULT_PARSER,
};
pub use splitter::{RecursiveCharacterSplitter, TextSplitter, DEFAULT_SEPARATORS};
pub use types::{Document, MetaValue, Metadata, CHUNK_ID};

/// Errors from document helpers
#[derive(Debug, Error)]
pub enum DocumentError {
    /// A source file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        /// The file that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },
}
