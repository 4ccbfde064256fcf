//! Retrieval-augmented generation over a persisted vector index.
//!
//! The index is a directory holding a JSON-lines chunk store with
//! precomputed embeddings. [`VectorIndexLoader`] turns that directory into
//! a read-only [`VectorIndex`], which embeds each query, ranks chunks by
//! cosine similarity and asks the generation model for a grounded answer.
//! [`IndexBuilder`] produces the store from a folder of text documents.

pub mod builder;
pub mod engine;
pub mod store;
pub mod vector;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use builder::{BuildReport, IndexBuilder};
pub use engine::{IndexSettings, VectorIndex, VectorIndexLoader};
pub use store::{ChunkRecord, Manifest};
pub use vector::{cosine_similarity, rank_chunks};
