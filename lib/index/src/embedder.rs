//! Embedding providers
//!
//! [`Embedder`] is the boundary to whatever turns text into vectors. A remote
//! model plugs in by implementing it; [`HashingEmbedder`] is the local,
//! deterministic provider used by default.

use crate::Vector;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tabvec_core::{Error, Result};

/// Default dimension for hashed embeddings
pub const DEFAULT_DIM: usize = 512;

/// Turns text into a fixed-dimension vector.
///
/// Implementations must be deterministic for a given `model_id`: the same
/// text always yields the same vector, so documents and queries land in the
/// same space.
pub trait Embedder {
    /// Identifies the model; persisted with an index and checked at query time
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn embed(&self, text: &str) -> Result<Vector>;
}

impl<E: Embedder + ?Sized> Embedder for &E {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        (**self).embed(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimension(&self) -> usize {
        (**self).dimension()
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        (**self).embed(text)
    }
}

/// Feature-hashing embedder over words and character trigrams.
///
/// Lowercased text is split into alphanumeric words and padded trigrams; each
/// feature is hashed into one of `dim` buckets (words weigh 2, trigrams 1) and
/// the result is L2-normalized. Text with no words at all (`{}`) embeds as the
/// zero vector, which scores 0 against everything.
///
/// Buckets come from std's `DefaultHasher`, whose output is not guaranteed to
/// stay the same across Rust releases. The model id does not capture the
/// toolchain, so rebuild saved indexes after a compiler upgrade.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
    model_id: String,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        Ok(Self {
            dim,
            model_id: format!("hashing-trigram-v1-{}", dim),
        })
    }

    fn bucket<T: Hash + ?Sized>(&self, feature: &T) -> usize {
        let mut hasher = DefaultHasher::new();
        feature.hash(&mut hasher);
        (hasher.finish() % self.dim as u64) as usize
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_DIM,
            model_id: format!("hashing-trigram-v1-{}", DEFAULT_DIM),
        }
    }
}

impl Embedder for HashingEmbedder {
    /// Names the feature scheme and dimension only; `DefaultHasher` changes
    /// between Rust releases are not reflected here
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vector> {
        if text.trim().is_empty() {
            return Err(Error::EmbeddingProvider("cannot embed blank text".to_string()));
        }
        let normalized = text.to_lowercase();
        let words: Vec<&str> = normalized
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut components = vec![0.0f32; self.dim];
        for word in &words {
            components[self.bucket(*word)] += 2.0;

            let padded: Vec<char> = format!("  {}  ", word).chars().collect();
            for trigram in padded.windows(3) {
                components[self.bucket(trigram)] += 1.0;
            }
        }

        let mut vector = Vector::new(components);
        vector.normalize();
        Ok(vector)
    }
}
