//! Text Splitting
//!
//! Recursive character splitting: try the coarsest separator that occurs in
//! the text, merge the pieces back together up to `chunk_size` characters,
//! and recurse with finer separators into any piece that is still too long.

use super::types::Document;

/// Default separators, coarsest first; `""` splits into characters
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Splits text into bounded-size chunks
pub trait TextSplitter {
    /// Split one text into chunks
    fn split_text(&self, text: &str) -> Vec<String>;

    /// Split every document, copying its metadata onto each chunk
    fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.content)
                    .into_iter()
                    .map(move |content| Document {
                        content,
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }
}

/// Recursive character splitter with configurable separators
#[derive(Clone, Debug)]
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<String>,
    keep_separator: bool,
    strip_whitespace: bool,
}

impl RecursiveCharacterSplitter {
    /// Create a splitter with the default separators and no overlap
    ///
    /// A `chunk_size` of zero is treated as one.
    #[must_use]
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: 0,
            separators: DEFAULT_SEPARATORS.iter().map(|s| (*s).to_string()).collect(),
            keep_separator: false,
            strip_whitespace: true,
        }
    }

    /// Set the overlap between consecutive chunks (clamped below `chunk_size`)
    #[must_use]
    pub fn with_overlap(mut self, overlap: usize) -> Self {
        self.chunk_overlap = overlap.min(self.chunk_size - 1);
        self
    }

    /// Replace the separator list
    #[must_use]
    pub fn with_separators<I, S>(mut self, separators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    /// Keep each separator attached to the start of the following piece
    #[must_use]
    pub fn with_keep_separator(mut self, keep: bool) -> Self {
        self.keep_separator = keep;
        self
    }

    /// Configured chunk size in characters
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        // Coarsest separator present in the text; "" always matches.
        let (separator, finer) = separators
            .iter()
            .enumerate()
            .find(|(_, sep)| sep.is_empty() || text.contains(sep.as_str()))
            .map_or(("", &[][..]), |(i, sep)| {
                let finer = if sep.is_empty() {
                    &[][..]
                } else {
                    &separators[i + 1..]
                };
                (sep.as_str(), finer)
            });

        let splits = split_on(text, separator, self.keep_separator);
        let joiner = if self.keep_separator { "" } else { separator };

        let mut chunks = Vec::new();
        let mut good = Vec::new();
        for piece in splits {
            if char_len(&piece) < self.chunk_size {
                good.push(piece);
                continue;
            }
            if !good.is_empty() {
                chunks.extend(self.merge(&std::mem::take(&mut good), joiner));
            }
            if finer.is_empty() {
                chunks.push(piece);
            } else {
                chunks.extend(self.split_recursive(&piece, finer));
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge(&good, joiner));
        }
        chunks
    }

    /// Greedily join pieces while the result stays within `chunk_size`
    fn merge(&self, pieces: &[String], joiner: &str) -> Vec<String> {
        let joiner_len = char_len(joiner);
        let mut merged = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(piece);
            let sep = if current.is_empty() { 0 } else { joiner_len };
            if total + len + sep > self.chunk_size && !current.is_empty() {
                if let Some(doc) = self.join(&current, joiner) {
                    merged.push(doc);
                }
                // Slide the window until it fits the overlap budget.
                loop {
                    let sep = if current.is_empty() { 0 } else { joiner_len };
                    let too_big = total > 0 && total + len + sep > self.chunk_size;
                    if current.is_empty() || !(total > self.chunk_overlap || too_big) {
                        break;
                    }
                    let dropped_sep = if current.len() > 1 { joiner_len } else { 0 };
                    total -= char_len(current.remove(0)) + dropped_sep;
                }
            }
            current.push(piece);
            if current.len() > 1 {
                total += joiner_len;
            }
            total += len;
        }

        if let Some(doc) = self.join(&current, joiner) {
            merged.push(doc);
        }
        merged
    }

    fn join(&self, pieces: &[&str], joiner: &str) -> Option<String> {
        let text = pieces.join(joiner);
        let text = if self.strip_whitespace {
            text.trim().to_string()
        } else {
            text
        };
        (!text.is_empty()).then_some(text)
    }
}

impl TextSplitter for RecursiveCharacterSplitter {
    fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split on a literal separator, dropping empty pieces
fn split_on(text: &str, separator: &str, keep_separator: bool) -> Vec<String> {
    if separator.is_empty() {
        return text.chars().map(String::from).collect();
    }
    if !keep_separator {
        return text
            .split(separator)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }

    let mut pieces = Vec::new();
    let mut last = 0;
    for (idx, _) in text.match_indices(separator) {
        if idx > last {
            pieces.push(text[last..idx].to_string());
        }
        last = idx;
    }
    pieces.push(text[last..].to_string());
    pieces.retain(|s| !s.is_empty());
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_short_text_is_single_chunk() {
        let splitter = RecursiveCharacterSplitter::new(100);
        assert_eq!(splitter.split_text("  hello world  "), vec!["hello world"]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        let splitter = RecursiveCharacterSplitter::new(10);
        assert!(splitter.split_text("").is_empty());
        assert!(splitter.split_text(" \n\n ").is_empty());
    }

    #[test]
    fn test_splits_on_paragraphs_first() {
        let splitter = RecursiveCharacterSplitter::new(12);
        let chunks = splitter.split_text("first para\n\nsecond one");
        assert_eq!(chunks, vec!["first para", "second one"]);
    }

    #[test]
    fn test_merges_words_up_to_limit() {
        let splitter = RecursiveCharacterSplitter::new(10);
        let chunks = splitter.split_text("aa bb cc dd ee");
        assert_eq!(chunks, vec!["aa bb cc", "dd ee"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
    }

    #[test]
    fn test_long_word_falls_back_to_characters() {
        let splitter = RecursiveCharacterSplitter::new(4);
        let chunks = splitter.split_text("abcdefghij");
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let splitter = RecursiveCharacterSplitter::new(3);
        let chunks = splitter.split_text("äöüß");
        assert_eq!(chunks, vec!["äöü", "ß"]);
    }

    #[test]
    fn test_keep_separator_prefixes_pieces() {
        assert_eq!(
            split_on("a-b-c", "-", true),
            vec!["a".to_string(), "-b".to_string(), "-c".to_string()]
        );
        assert_eq!(
            split_on("a-b-c", "-", false),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_overlap_repeats_tail() {
        let splitter = RecursiveCharacterSplitter::new(8).with_overlap(3);
        let chunks = splitter.split_text("aa bb cc dd");
        assert_eq!(chunks, vec!["aa bb cc", "cc dd"]);
    }

    #[test]
    fn test_split_documents_copies_metadata() {
        let splitter = RecursiveCharacterSplitter::new(5);
        let doc = Document::new("one two").with_meta("source", "x.txt");

        let chunks = splitter.split_documents(&[doc]);
        assert_eq!(chunks.len(), 2);
        assert!(chunks
            .iter()
            .all(|c| c.meta("source").and_then(|v| v.as_str()) == Some("x.txt")));
    }
}
