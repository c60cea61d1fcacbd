use crate::{Embedder, FlatIndex, ScoredDocument, VectorIndex};
use tabvec_core::{Document, Error, Result};
use tracing::{debug, info, warn};

/// Embeds documents and loads them into an index.
///
/// A build is all-or-nothing: every document is embedded before the first
/// insert, so a provider failure leaves no partially filled index behind.
pub struct IndexBuilder<'a, E: Embedder + ?Sized> {
    embedder: &'a E,
    embed_metadata: bool,
}

impl<'a, E: Embedder + ?Sized> IndexBuilder<'a, E> {
    pub fn new(embedder: &'a E) -> Self {
        Self {
            embedder,
            embed_metadata: true,
        }
    }

    /// Whether metadata lines are prepended to the text sent to the embedder
    pub fn embed_metadata(mut self, enabled: bool) -> Self {
        self.embed_metadata = enabled;
        self
    }

    pub fn build(&self, documents: Vec<Document>) -> Result<FlatIndex> {
        let index = FlatIndex::new(self.embedder.model_id(), self.embedder.dimension());
        self.build_into(documents, index)
    }

    /// Fill `index`, which must be empty and share the embedder's model and dimension
    pub fn build_into<I: VectorIndex>(&self, documents: Vec<Document>, mut index: I) -> Result<I> {
        if !index.is_empty() {
            return Err(Error::InvalidConfig("index must be empty before a build".to_string()));
        }
        check_compatible(self.embedder, &index)?;

        let mut vectors = Vec::with_capacity(documents.len());
        for (i, document) in documents.iter().enumerate() {
            let text = document.embedding_text(self.embed_metadata);
            let vector = self.embedder.embed(&text).map_err(|e| {
                warn!("embedding document {} failed: {}", i, e);
                e
            })?;
            debug!("embedded document {} ({} chars)", i, text.len());
            vectors.push(vector);
        }

        for (vector, document) in vectors.into_iter().zip(documents) {
            index.insert(vector, document)?;
        }

        info!(
            "built index of {} documents with {}",
            index.len(),
            self.embedder.model_id()
        );
        Ok(index)
    }
}

/// Answers free-text queries against an index built with the same embedder
pub struct QueryService<'a, E: Embedder + ?Sized, I: VectorIndex> {
    embedder: &'a E,
    index: &'a I,
}

impl<'a, E: Embedder + ?Sized, I: VectorIndex> QueryService<'a, E, I> {
    /// Fails if the index was built by a different model
    pub fn new(embedder: &'a E, index: &'a I) -> Result<Self> {
        check_compatible(embedder, index)?;
        Ok(Self { embedder, index })
    }

    /// Up to `k` documents ranked by descending similarity to `query`
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let vector = self.embedder.embed(query)?;
        let results = self.index.nearest(&vector, k)?;
        debug!("query {:?}: {} results", query, results.len());
        Ok(results)
    }
}

fn check_compatible<E: Embedder + ?Sized, I: VectorIndex>(embedder: &E, index: &I) -> Result<()> {
    if embedder.model_id() != index.model_id() || embedder.dimension() != index.dimension() {
        return Err(Error::InvalidConfig(format!(
            "index was built with {} ({} dims), embedder is {} ({} dims)",
            index.model_id(),
            index.dimension(),
            embedder.model_id(),
            embedder.dimension()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HashingEmbedder, Vector};
    use std::cell::Cell;
    use std::collections::BTreeMap;
    use tabvec_core::Value;

    fn doc(category: &str, content: &str) -> Document {
        let mut metadata = BTreeMap::new();
        metadata.insert("category".to_string(), Value::from(category));
        Document::new(content.to_string(), metadata)
    }

    fn documents() -> Vec<Document> {
        vec![
            doc("Electronics", r#"{"product":"iPhone 12"}"#),
            doc("Books", r#"{"product":"The Great Gatsby"}"#),
            doc("Clothing", r#"{"product":"Cotton T-Shirt"}"#),
        ]
    }

    /// Fails on the n-th call
    struct FlakyEmbedder {
        inner: HashingEmbedder,
        fail_at: usize,
        calls: Cell<usize>,
    }

    impl Embedder for FlakyEmbedder {
        fn model_id(&self) -> &str {
            self.inner.model_id()
        }

        fn dimension(&self) -> usize {
            self.inner.dimension()
        }

        fn embed(&self, text: &str) -> Result<Vector> {
            let call = self.calls.get();
            self.calls.set(call + 1);
            if call == self.fail_at {
                return Err(Error::EmbeddingProvider("rate limited".to_string()));
            }
            self.inner.embed(text)
        }
    }

    #[test]
    fn test_build_and_search() {
        let embedder = HashingEmbedder::default();
        let index = IndexBuilder::new(&embedder).build(documents()).unwrap();
        assert_eq!(index.len(), 3);

        let service = QueryService::new(&embedder, &index).unwrap();
        let results = service.search("electronics", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].document.category(), Some(&Value::from("Electronics")));
    }

    #[test]
    fn test_build_preserves_document_order() {
        let embedder = HashingEmbedder::default();
        let index = IndexBuilder::new(&embedder).build(documents()).unwrap();
        let built: Vec<Document> = index.documents().cloned().collect();
        assert_eq!(built, documents());
    }

    #[test]
    fn test_build_aborts_on_embedding_failure() {
        let embedder = FlakyEmbedder {
            inner: HashingEmbedder::default(),
            fail_at: 2,
            calls: Cell::new(0),
        };
        let result = IndexBuilder::new(&embedder).build(documents());
        assert!(matches!(result, Err(Error::EmbeddingProvider(_))));
        assert_eq!(embedder.calls.get(), 3);
    }

    #[test]
    fn test_query_rejects_foreign_index() {
        let embedder = HashingEmbedder::default();
        let index = IndexBuilder::new(&embedder).build(documents()).unwrap();
        let other = HashingEmbedder::new(64).unwrap();
        assert!(matches!(
            QueryService::new(&other, &index),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_build_into_requires_empty_index() {
        let embedder = HashingEmbedder::default();
        let index = IndexBuilder::new(&embedder).build(documents()).unwrap();
        let result = IndexBuilder::new(&embedder).build_into(documents(), index);
        assert!(matches!(result, Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_empty_query_fails() {
        let embedder = HashingEmbedder::default();
        let index = IndexBuilder::new(&embedder).build(documents()).unwrap();
        let service = QueryService::new(&embedder, &index).unwrap();
        assert!(matches!(service.search("", 3), Err(Error::EmbeddingProvider(_))));
    }
}
