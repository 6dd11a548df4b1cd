//! Case Corpus & Retriever (C2, spec.md §4.2).
//!
//! Ported from `vector_db.py::MedicalVectorDatabase`: cases are embedded with
//! the local model, indexed in a USearch HNSW index for approximate nearest
//! neighbor search, and backed by a SQLite table that is the source of truth
//! for text/condition/severity/metadata (the vector index only ever holds an
//! embedding keyed by the case's row id).

mod seed;

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use lru::LruCache;

use crate::embeddings::local::{Embedding, EmbeddingService};
use crate::error::CorpusError;
use crate::search::vector::{VectorIndex, VectorIndexConfig};
use crate::storage;
use crate::types::Severity;

/// Repeated queries (the same complaint re-submitted, or a retry after a
/// timeout) are common enough that caching the query embedding is worth a
/// bounded amount of memory.
const QUERY_CACHE_CAPACITY: usize = 256;

/// Provenance of a case row, mirroring `vector_db.py`'s `source` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSource {
    /// Shipped with the corpus on first open.
    Seed,
    /// Promoted from a verified-correct prediction (C7).
    Promoted,
}

impl CaseSource {
    fn as_str(self) -> &'static str {
        match self {
            CaseSource::Seed => "seed",
            CaseSource::Promoted => "promoted",
        }
    }
}

/// Caller-supplied provenance for [`CaseCorpus::add`].
#[derive(Debug, Clone)]
pub struct CaseMetadata {
    pub source: CaseSource,
    pub verified: bool,
    pub origin_confidence: Option<f64>,
}

impl Default for CaseMetadata {
    fn default() -> Self {
        Self { source: CaseSource::Seed, verified: true, origin_confidence: None }
    }
}

/// One case retrieved by [`CaseCorpus::search`], with the similarity
/// converted to the spec's confidence formula (spec.md §4.2):
/// `confidence = max(0, 1 - distance / 2)`, rounded to three decimals.
#[derive(Debug, Clone)]
pub struct CaseMatch {
    pub case_id: i64,
    pub text: String,
    pub condition: String,
    pub severity: Severity,
    pub distance: f64,
    pub confidence: f64,
}

/// The case corpus: embeds, indexes, and persists triage exemplars.
pub struct CaseCorpus {
    writer: Mutex<rusqlite::Connection>,
    reader: Mutex<rusqlite::Connection>,
    embeddings: EmbeddingService,
    index: Mutex<VectorIndex>,
    query_cache: Mutex<LruCache<String, Embedding>>,
}

impl CaseCorpus {
    /// Open (creating if absent) the corpus at `db_path`/`index_path`,
    /// applying migrations and seeding exemplars on first open.
    pub fn open(db_path: &Path, index_path: &Path) -> Result<Self, CorpusError> {
        let (writer, reader) = storage::open_pair(db_path)?;

        let embeddings = EmbeddingService::new();
        embeddings
            .init()
            .map_err(|e| CorpusError::Embedding(e.to_string()))?;

        let mut index = if index_path.exists() {
            VectorIndex::load(index_path, VectorIndexConfig::default())
                .map_err(|e| CorpusError::VectorIndex(e.to_string()))?
        } else {
            VectorIndex::new().map_err(|e| CorpusError::VectorIndex(e.to_string()))?
        };

        load_embeddings_into_index(&writer, &mut index)?;

        let query_cache = Mutex::new(LruCache::new(NonZeroUsize::new(QUERY_CACHE_CAPACITY).unwrap()));
        let corpus = Self { writer: Mutex::new(writer), reader: Mutex::new(reader), embeddings, index: Mutex::new(index), query_cache };

        if corpus.is_empty()? {
            corpus.seed()?;
        }

        corpus.persist_index(index_path)?;
        Ok(corpus)
    }

    fn is_empty(&self) -> Result<bool, CorpusError> {
        let reader = self.reader.lock().unwrap();
        let count: i64 = reader.query_row("SELECT COUNT(*) FROM cases", [], |row| row.get(0))?;
        Ok(count == 0)
    }

    fn seed(&self) -> Result<(), CorpusError> {
        tracing::info!("seeding case corpus with {} exemplars", seed::SEED_CASES.len());
        for case in seed::SEED_CASES {
            self.add(case.text, case.condition, case.severity, CaseMetadata::default())?;
        }
        Ok(())
    }

    /// Embed and persist a new case, add its embedding to the vector index,
    /// and return its row id.
    pub fn add(
        &self,
        text: &str,
        condition: &str,
        severity: Severity,
        metadata: CaseMetadata,
    ) -> Result<i64, CorpusError> {
        let embedding = self
            .embeddings
            .embed(text)
            .map_err(|e| CorpusError::Embedding(e.to_string()))?;

        let writer = self.writer.lock().unwrap();
        writer.execute(
            "INSERT INTO cases (text, condition, severity, source, verified, origin_confidence, embedding, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            rusqlite::params![
                text,
                condition,
                severity.to_string(),
                metadata.source.as_str(),
                metadata.verified,
                metadata.origin_confidence,
                embedding.to_bytes(),
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        let case_id = writer.last_insert_rowid();
        drop(writer);

        let mut index = self.index.lock().unwrap();
        index
            .add(&case_id.to_string(), &embedding.vector)
            .map_err(|e| CorpusError::VectorIndex(e.to_string()))?;

        Ok(case_id)
    }

    /// Embed `text` and return up to `k` nearest cases, ordered by
    /// descending confidence. Query embeddings are cached by exact text
    /// match so a repeated or retried query skips re-embedding.
    pub fn search(&self, text: &str, k: usize) -> Result<Vec<CaseMatch>, CorpusError> {
        let embedding = self.embed_query(text)?;

        let hits = {
            let index = self.index.lock().unwrap();
            index
                .search(&embedding.vector, k)
                .map_err(|e| CorpusError::VectorIndex(e.to_string()))?
        };

        let reader = self.reader.lock().unwrap();
        let mut matches = Vec::with_capacity(hits.len());
        for (key, similarity) in hits {
            let Ok(case_id) = key.parse::<i64>() else { continue };
            let row = reader.query_row(
                "SELECT text, condition, severity FROM cases WHERE id = ?1",
                [case_id],
                |row| {
                    let text: String = row.get(0)?;
                    let condition: String = row.get(1)?;
                    let severity: String = row.get(2)?;
                    Ok((text, condition, severity))
                },
            );
            let Ok((text, condition, severity_str)) = row else { continue };
            let severity = severity_str.parse().unwrap_or(Severity::Mild);

            let distance = (1.0 - similarity as f64).clamp(0.0, 2.0);
            let confidence = round3((1.0 - distance / 2.0).max(0.0));

            matches.push(CaseMatch { case_id, text, condition, severity, distance, confidence });
        }

        Ok(matches)
    }

    fn embed_query(&self, text: &str) -> Result<Embedding, CorpusError> {
        if let Some(cached) = self.query_cache.lock().unwrap().get(text) {
            return Ok(cached.clone());
        }
        let embedding = self
            .embeddings
            .embed(text)
            .map_err(|e| CorpusError::Embedding(e.to_string()))?;
        self.query_cache.lock().unwrap().put(text.to_string(), embedding.clone());
        Ok(embedding)
    }

    fn persist_index(&self, index_path: &Path) -> Result<(), CorpusError> {
        if let Some(dir) = index_path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        let index = self.index.lock().unwrap();
        index
            .save(index_path)
            .map_err(|e| CorpusError::VectorIndex(e.to_string()))
    }
}

fn round3(x: f64) -> f64 {
    (x * 1000.0).round() / 1000.0
}

/// Rebuild the in-memory vector index from the `cases` table's stored
/// embeddings, used when the index file is missing or stale relative to the
/// database (matching `Storage::new`'s startup reconciliation).
fn load_embeddings_into_index(
    conn: &rusqlite::Connection,
    index: &mut VectorIndex,
) -> Result<(), CorpusError> {
    if !index.is_empty() {
        return Ok(());
    }
    let mut stmt = conn.prepare("SELECT id, embedding FROM cases")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let embedding: Vec<u8> = row.get(1)?;
        Ok((id, embedding))
    })?;

    for row in rows {
        let (id, bytes) = row?;
        if let Some(embedding) = crate::embeddings::local::Embedding::from_bytes(&bytes) {
            let _ = index.add(&id.to_string(), &embedding.vector);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_paths() -> (tempfile::TempDir, std::path::PathBuf, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cases.sqlite3");
        let index = dir.path().join("cases.usearch");
        (dir, db, index)
    }

    #[test]
    #[ignore = "requires fastembed model download"]
    fn seeds_on_first_open_and_covers_every_condition() {
        let (_dir, db, index) = temp_paths();
        let corpus = CaseCorpus::open(&db, &index).unwrap();
        let catalog = crate::catalog::Catalog::load().unwrap();
        for condition in catalog.all_conditions() {
            let hits = corpus.search(condition, 50).unwrap();
            assert!(
                hits.iter().filter(|m| m.condition == condition).count() >= 1,
                "{condition} has no seed coverage"
            );
        }
    }

    #[test]
    #[ignore = "requires fastembed model download"]
    fn search_returns_confidence_in_unit_range() {
        let (_dir, db, index) = temp_paths();
        let corpus = CaseCorpus::open(&db, &index).unwrap();
        let hits = corpus.search("my dad collapsed and isn't breathing", 3).unwrap();
        for hit in hits {
            assert!((0.0..=1.0).contains(&hit.confidence));
        }
    }
}
