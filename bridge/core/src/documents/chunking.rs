//! Source Chunking
//!
//! Splits documents into chunks tagged with their split order. Stores that
//! keep the original documents alongside their chunks get the originals back
//! too, tagged `chunk_id = -1`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::splitter::{RecursiveCharacterSplitter, TextSplitter};
use super::types::{Document, CHUNK_ID};

/// `chunk_id` given to an original, unsplit document
pub const ORIGINAL_CHUNK_ID: i64 = -1;

/// Vector store flavours that affect chunk layout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreKind {
    /// Chroma
    #[default]
    Chroma,
    /// Legacy Chroma layout
    ChromaOld,
    /// FAISS
    Faiss,
    /// Weaviate
    Weaviate,
}

impl VectorStoreKind {
    /// Whether originals are stored next to their chunks
    #[must_use]
    pub fn keeps_originals(self) -> bool {
        matches!(self, Self::Chroma | Self::ChromaOld)
    }
}

impl fmt::Display for VectorStoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Chroma => "chroma",
            Self::ChromaOld => "chroma_old",
            Self::Faiss => "faiss",
            Self::Weaviate => "weaviate",
        };
        f.write_str(name)
    }
}

impl FromStr for VectorStoreKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "chroma" => Ok(Self::Chroma),
            "chroma_old" => Ok(Self::ChromaOld),
            "faiss" => Ok(Self::Faiss),
            "weaviate" => Ok(Self::Weaviate),
            other => Err(format!("unknown vector store kind: {other}")),
        }
    }
}

/// How [`chunk_sources`] splits its input
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkOptions {
    /// Split documents (false passes them through)
    pub enabled: bool,
    /// Maximum chunk length in characters
    pub chunk_size: usize,
    /// Target store
    pub store: VectorStoreKind,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            chunk_size: 512,
            store: VectorStoreKind::default(),
        }
    }
}

/// Chunk documents with the default recursive splitter
#[must_use]
pub fn chunk_sources(sources: Vec<Document>, options: &ChunkOptions) -> Vec<Document> {
    let splitter = RecursiveCharacterSplitter::new(options.chunk_size);
    chunk_sources_with(sources, options, &splitter)
}

/// Chunk documents with a caller-supplied splitter
///
/// Chunks carry a zero-based `chunk_id` in split order across the whole
/// batch. With chunking disabled every document gets `chunk_id = 0`.
#[must_use]
pub fn chunk_sources_with(
    mut sources: Vec<Document>,
    options: &ChunkOptions,
    splitter: &dyn TextSplitter,
) -> Vec<Document> {
    let keep_originals = options.store.keeps_originals();

    let chunks = if options.enabled {
        let mut chunks = splitter.split_documents(&sources);
        for (chunk_id, chunk) in chunks.iter_mut().enumerate() {
            chunk.set_meta(CHUNK_ID, chunk_id);
        }
        chunks
    } else {
        for source in &mut sources {
            source.set_meta(CHUNK_ID, 0_i64);
        }
        if !keep_originals {
            return sources;
        }
        sources.clone()
    };

    tracing::debug!(
        sources = sources.len(),
        chunks = chunks.len(),
        store = %options.store,
        "chunked sources"
    );

    if !keep_originals {
        return chunks;
    }

    for source in &mut sources {
        source.set_meta(CHUNK_ID, ORIGINAL_CHUNK_ID);
    }
    sources.extend(chunks);
    sources
}
