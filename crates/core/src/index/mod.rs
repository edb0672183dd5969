//! Local document index.
//!
//! A JSON file of text chunks with an in-memory lexical search. Documents
//! are split with [`RecursiveSplitter`] on ingest; queries are scored by
//! TF-IDF weighted term overlap. Searching never touches the network or the
//! disk.

pub mod chunker;

use crate::agents::base::{AgentError, DocumentRetriever};
use async_trait::async_trait;
pub use chunker::RecursiveSplitter;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Returned by retrieval when the index holds no documents.
pub const EMPTY_INDEX_NOTICE: &str = "No document context available";

/// Returned by retrieval when no chunk matches the query.
pub const NO_MATCH_NOTICE: &str = "No relevant documents found";

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse index at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to write index at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// One indexed passage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// File the chunk was ingested from.
    pub source: String,
    pub text: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct IndexFile {
    #[serde(default)]
    chunks: Vec<Chunk>,
}

/// A scored search hit.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit<'a> {
    pub chunk: &'a Chunk,
    pub score: f64,
}

#[derive(Debug, Default)]
pub struct LocalIndex {
    path: Option<PathBuf>,
    chunks: Vec<Chunk>,
}

impl LocalIndex {
    /// An in-memory index over `chunks`, never persisted.
    pub fn from_chunks(chunks: Vec<Chunk>) -> Self {
        Self { path: None, chunks }
    }

    /// Load the index at `path`. A missing file yields an empty index bound
    /// to that path.
    pub fn load_or_empty(path: &Path) -> Result<Self, IndexError> {
        if !path.exists() {
            return Ok(Self {
                path: Some(path.to_path_buf()),
                chunks: Vec::new(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: IndexFile =
            serde_json::from_str(&content).map_err(|source| IndexError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        Ok(Self {
            path: Some(path.to_path_buf()),
            chunks: file.chunks,
        })
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Split `text` and append its chunks. Returns the number added.
    pub fn add_document(&mut self, source: &str, text: &str, splitter: &RecursiveSplitter) -> usize {
        let before = self.chunks.len();
        self.chunks.extend(splitter.split(text).into_iter().map(|text| Chunk {
            source: source.to_string(),
            text,
        }));
        self.chunks.len() - before
    }

    /// Read a text file, add it and persist the index.
    pub fn ingest(&mut self, file: &Path, splitter: &RecursiveSplitter) -> Result<usize, IndexError> {
        let text = std::fs::read_to_string(file).map_err(|source| IndexError::Read {
            path: file.to_path_buf(),
            source,
        })?;
        let source = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| file.display().to_string());

        let added = self.add_document(&source, &text, splitter);
        self.save()?;
        tracing::info!(file = %file.display(), chunks = added, "document ingested");
        Ok(added)
    }

    /// Write the index to its path. In-memory indexes are not persisted.
    pub fn save(&self) -> Result<(), IndexError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| IndexError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let file = IndexFile {
            chunks: self.chunks.clone(),
        };
        let json = serde_json::to_string_pretty(&file).map_err(|source| IndexError::Parse {
            path: path.clone(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| IndexError::Write {
            path: path.clone(),
            source,
        })
    }

    /// Best `top_k` chunks for `query`, highest score first. Chunks sharing
    /// no term with the query are never returned.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<SearchHit<'_>> {
        let query_terms: HashSet<String> = tokenize(query).collect();
        if query_terms.is_empty() || self.chunks.is_empty() {
            return Vec::new();
        }

        let term_counts: Vec<HashMap<String, usize>> = self
            .chunks
            .iter()
            .map(|chunk| {
                let mut counts = HashMap::new();
                for term in tokenize(&chunk.text) {
                    *counts.entry(term).or_insert(0) += 1;
                }
                counts
            })
            .collect();

        let n = self.chunks.len() as f64;
        let idf: HashMap<&str, f64> = query_terms
            .iter()
            .map(|term| {
                let df = term_counts
                    .iter()
                    .filter(|counts| counts.contains_key(term))
                    .count() as f64;
                (term.as_str(), ((n + 1.0) / (df + 1.0)).ln() + 1.0)
            })
            .collect();

        let mut hits: Vec<SearchHit<'_>> = self
            .chunks
            .iter()
            .zip(&term_counts)
            .filter_map(|(chunk, counts)| {
                let length: usize = counts.values().sum();
                if length == 0 {
                    return None;
                }
                let score: f64 = query_terms
                    .iter()
                    .filter_map(|term| {
                        let count = *counts.get(term)?;
                        Some(count as f64 / length as f64 * idf[term.as_str()])
                    })
                    .sum();
                (score > 0.0).then_some(SearchHit { chunk, score })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        hits
    }

    /// Search and format hits as `[Source i]: text` blocks.
    pub fn formatted_context(&self, query: &str, top_k: usize) -> String {
        if self.is_empty() {
            return EMPTY_INDEX_NOTICE.to_string();
        }
        let hits = self.search(query, top_k);
        if hits.is_empty() {
            return NO_MATCH_NOTICE.to_string();
        }
        hits.iter()
            .enumerate()
            .map(|(i, hit)| format!("[Source {}]: {}", i + 1, hit.chunk.text))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[async_trait]
impl DocumentRetriever for LocalIndex {
    async fn retrieve(&self, query: &str, top_k: usize) -> Result<String, AgentError> {
        Ok(self.formatted_context(query, top_k))
    }

    fn is_empty(&self) -> bool {
        LocalIndex::is_empty(self)
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
}
