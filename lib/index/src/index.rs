use crate::Vector;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use tabvec_core::{Document, Error, Result};

/// A document returned by a similarity query
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Document,
    pub score: f32,
}

/// Similarity index over `(vector, document)` pairs.
///
/// Backends differ in how they find neighbours; callers only rely on
/// `nearest` returning at most `k` documents ranked by descending score.
pub trait VectorIndex {
    /// Embedding model the stored vectors came from
    fn model_id(&self) -> &str;

    fn dimension(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&mut self, vector: Vector, document: Document) -> Result<()>;

    fn nearest(&self, query: &Vector, k: usize) -> Result<Vec<ScoredDocument>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub vector: Vector,
    pub document: Document,
}

/// Exact cosine search over every stored vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    model_id: String,
    dimension: usize,
    entries: Vec<Entry>,
}

impl FlatIndex {
    pub fn new(model_id: impl Into<String>, dimension: usize) -> Self {
        Self {
            model_id: model_id.into(),
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.entries.iter().map(|e| &e.document)
    }

    /// Every stored vector must have the index dimension; deserialized
    /// indexes are not checked otherwise
    pub fn check_entries(&self) -> Result<()> {
        self.entries
            .iter()
            .try_for_each(|entry| self.check_dimension(&entry.vector))
    }

    fn check_dimension(&self, vector: &Vector) -> Result<()> {
        if vector.dim() != self.dimension {
            return Err(Error::InvalidDimension {
                expected: self.dimension,
                actual: vector.dim(),
            });
        }
        Ok(())
    }
}

impl VectorIndex for FlatIndex {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn insert(&mut self, vector: Vector, document: Document) -> Result<()> {
        self.check_dimension(&vector)?;
        self.entries.push(Entry {
            vector: vector.normalized(),
            document,
        });
        Ok(())
    }

    /// Ties keep insertion order
    fn nearest(&self, query: &Vector, k: usize) -> Result<Vec<ScoredDocument>> {
        self.check_dimension(query)?;
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = query.normalized();
        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, entry.vector.cosine_similarity(&query)))
            .collect();
        scored.sort_by_key(|&(i, score)| (Reverse(OrderedFloat(score)), i));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredDocument {
                document: self.entries[i].document.clone(),
                score,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tabvec_core::Value;

    fn doc(category: &str) -> Document {
        let mut metadata = BTreeMap::new();
        metadata.insert("category".to_string(), Value::from(category));
        Document::new(format!("{{\"name\":\"{}\"}}", category), metadata)
    }

    fn index() -> FlatIndex {
        let mut index = FlatIndex::new("test", 3);
        index.insert(Vector::new(vec![1.0, 0.0, 0.0]), doc("x")).unwrap();
        index.insert(Vector::new(vec![0.0, 1.0, 0.0]), doc("y")).unwrap();
        index.insert(Vector::new(vec![0.7, 0.7, 0.0]), doc("xy")).unwrap();
        index
    }

    #[test]
    fn test_nearest_ranking() {
        let index = index();
        let results = index.nearest(&Vector::new(vec![1.0, 0.1, 0.0]), 2).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].document, doc("x"));
        assert_eq!(results[1].document, doc("xy"));
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn test_k_larger_than_index() {
        let results = index().nearest(&Vector::new(vec![0.0, 0.0, 1.0]), 10).unwrap();
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let results = index().nearest(&Vector::new(vec![0.0, 0.0, 1.0]), 3).unwrap();
        let order: Vec<_> = results.iter().map(|r| r.document.clone()).collect();
        assert_eq!(order, vec![doc("x"), doc("y"), doc("xy")]);
    }

    #[test]
    fn test_zero_k() {
        assert!(index().nearest(&Vector::new(vec![1.0, 0.0, 0.0]), 0).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut index = index();
        assert!(matches!(
            index.insert(Vector::new(vec![1.0]), doc("z")),
            Err(Error::InvalidDimension { expected: 3, actual: 1 })
        ));
        assert!(index.nearest(&Vector::new(vec![1.0, 0.0]), 1).is_err());
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_check_entries() {
        assert!(index().check_entries().is_ok());

        let json = r#"{"model_id":"test","dimension":3,"entries":[
            {"vector":[1.0,0.0],"document":{"content":"{}","metadata":{"category":"x"}}}
        ]}"#;
        let index: FlatIndex = serde_json::from_str(json).unwrap();
        assert!(matches!(
            index.check_entries(),
            Err(Error::InvalidDimension { expected: 3, actual: 2 })
        ));
    }
}
