//! Metadata Enrichment
//!
//! Stamps a batch of documents with provenance: where they came from, when,
//! a content hash of the source, and a short preview of each document.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

use super::types::{Document, MetaValue};
use super::DocumentError;

/// Parser label used when a document has none
pub const DEFAULT_PARSER: &str = "NotSet";

/// Fields that must never be absent when handed to the store
const NON_NULL_FIELDS: [&str; 2] = ["sender_name", "timestamp_ms"];

/// Options for [`add_meta`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MetaOptions {
    /// Characters of content copied into `head`
    pub head_size: usize,
    /// Index of the source within a multi-file ingest
    pub file_index: i64,
    /// Parser label for documents that lack one
    pub parser: String,
}

impl Default for MetaOptions {
    fn default() -> Self {
        Self {
            head_size: 50,
            file_index: 0,
            parser: DEFAULT_PARSER.to_string(),
        }
    }
}

/// SHA-256 of a file's contents, hex encoded
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<String, DocumentError> {
    let io_err = |source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut reader = BufReader::new(File::open(path).map_err(io_err)?);
    let mut hasher = Sha256::new();
    let mut block = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut block).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&block[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// SHA-256 of a text label, hex encoded
#[must_use]
pub fn content_sha(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Set `parser` on documents that do not have one yet
pub fn add_parser(docs: &mut [Document], parser: &str) {
    for doc in docs {
        doc.metadata
            .entry("parser".to_string())
            .or_insert_with(|| MetaValue::from(parser));
    }
}

/// Attach provenance metadata to a batch of documents
///
/// `source` is either a file path or a free-form label. For files the
/// extension becomes `input_type` and the file contents are hashed; for
/// labels the label itself is used for both.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if `source` is a file that cannot be read.
pub fn add_meta(
    docs: &mut [Document],
    source: &str,
    options: &MetaOptions,
) -> Result<(), DocumentError> {
    let path = Path::new(source);
    let (input_type, hashid) = if path.is_file() {
        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        (extension, hash_file(path)?)
    } else {
        (source.to_string(), content_sha(source))
    };

    let doc_hash: String = uuid::Uuid::new_v4().to_string().chars().take(10).collect();
    let date = chrono::Local::now()
        .format("%Y-%m-%d %H:%M:%S%.6f")
        .to_string();
    let time = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default();

    for (order_id, doc) in docs.iter_mut().enumerate() {
        let head: String = doc.content.chars().take(options.head_size).collect();
        let parser = doc
            .meta("parser")
            .cloned()
            .unwrap_or_else(|| MetaValue::from(options.parser.as_str()));

        doc.set_meta("input_type", input_type.as_str());
        doc.set_meta("parser", parser);
        doc.set_meta("date", date.as_str());
        doc.set_meta("time", time);
        doc.set_meta("order_id", order_id);
        doc.set_meta("hashid", hashid.as_str());
        doc.set_meta("doc_hash", doc_hash.as_str());
        doc.set_meta("file_id", options.file_index);
        doc.set_meta("head", head.trim());
    }

    tracing::debug!(
        source,
        documents = docs.len(),
        doc_hash = %doc_hash,
        "attached document metadata"
    );
    Ok(())
}

/// Replace absent or empty values the store would reject with `""`
pub fn fix_json_meta(docs: &mut [Document]) {
    for doc in docs {
        for field in NON_NULL_FIELDS {
            let empty = doc.meta(field).map_or(true, MetaValue::is_falsy);
            if empty {
                doc.set_meta(field, "");
            }
        }
    }
}
