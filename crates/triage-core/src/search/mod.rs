//! HNSW vector search backing the case corpus's nearest-neighbor queries.

pub mod vector;
