//! Embedding backend boundary.
//!
//! The retrieval pipeline treats the embedding model as a black box behind
//! [`Embedder`]; [`client::HttpEmbeddingClient`] is the production
//! implementation.

pub mod client;

pub use client::{HttpEmbeddingClient, HttpEmbeddingClientBuilder};

use crate::Result;

/// Produces fixed-dimension embedding vectors.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Dimension of every vector this embedder produces.
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts, one vector per input, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| crate::Error::embedding("embedder returned no vector"))
    }
}
