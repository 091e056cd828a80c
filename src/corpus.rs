//! Pre-chunked text corpus.
//!
//! The corpus file is a JSON array of objects carrying a `sentence_chunk`
//! field. The array position of each object is its chunk id, which is the
//! identifier the vector index returns.

use crate::error::{RagchatError, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{info, warn};

/// A piece of source text stored for retrieval.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    /// Position in the corpus file, shared with the vector index ids.
    pub id: usize,
    pub text: String,
}

/// One record of the corpus file. Extra fields are ignored.
#[derive(Debug, Deserialize)]
struct CorpusRecord {
    sentence_chunk: String,
    #[serde(default)]
    id: Option<usize>,
}

/// In-memory mapping from chunk id to chunk text.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    chunks: Vec<Chunk>,
}

impl Corpus {
    /// Build a corpus from texts, assigning ids by position.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let chunks = texts
            .into_iter()
            .enumerate()
            .map(|(id, text)| Chunk {
                id,
                text: text.into(),
            })
            .collect();
        Self { chunks }
    }

    /// Parse a corpus from its JSON representation.
    ///
    /// A record with an explicit `id` must carry its own array position.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<CorpusRecord> = serde_json::from_str(json)
            .map_err(|e| RagchatError::CorpusLoad(format!("Malformed corpus: {}", e)))?;

        let mut chunks = Vec::with_capacity(records.len());
        for (position, record) in records.into_iter().enumerate() {
            if let Some(id) = record.id {
                if id != position {
                    return Err(RagchatError::CorpusLoad(format!(
                        "Record at position {} declares id {}; ids must match array positions",
                        position, id
                    )));
                }
            }
            chunks.push(Chunk {
                id: position,
                text: record.sentence_chunk,
            });
        }

        Ok(Self { chunks })
    }

    /// Load a corpus from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RagchatError::CorpusLoad(format!("Cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Load a corpus, falling back to an empty one on any failure.
    ///
    /// Retrieval against an empty corpus yields no context rather than an error.
    pub fn load_or_empty(path: &Path) -> Self {
        match Self::load(path) {
            Ok(corpus) => {
                info!("Loaded {} chunks from {}", corpus.len(), path.display());
                corpus
            }
            Err(e) => {
                warn!(error.kind = e.kind(), "{}; continuing with an empty corpus", e);
                Self::default()
            }
        }
    }

    /// Look up a chunk by id.
    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_positions_become_ids() {
        let corpus = Corpus::from_json(
            r#"[
                {"sentence_chunk": "first", "page_number": 3},
                {"sentence_chunk": "second"}
            ]"#,
        )
        .unwrap();

        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(1).unwrap().text, "second");
        assert!(corpus.get(2).is_none());
    }

    #[test]
    fn test_mismatched_explicit_id_is_rejected() {
        let err = Corpus::from_json(r#"[{"sentence_chunk": "a", "id": 4}]"#).unwrap_err();
        assert_eq!(err.kind(), "corpus_load");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        assert!(Corpus::from_json(r#"[{"text": "a"}]"#).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"sentence_chunk": "Water boils at 100C at sea level."}}]"#).unwrap();

        let corpus = Corpus::load(file.path()).unwrap();
        assert_eq!(corpus.get(0).unwrap().text, "Water boils at 100C at sea level.");
    }

    #[test]
    fn test_load_or_empty_on_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();

        assert!(Corpus::load_or_empty(file.path()).is_empty());
        assert!(Corpus::load_or_empty(Path::new("/definitely/missing.json")).is_empty());
    }
}
