//! # tabvec Index
//!
//! The embedding and similarity-search boundary for tabvec documents.
//!
//! - [`Embedder`] - text to vector; [`HashingEmbedder`] is the local provider
//! - [`VectorIndex`] - nearest-neighbour search; [`FlatIndex`] is exact cosine
//! - [`IndexBuilder`] - all-or-nothing build from a document sequence
//! - [`QueryService`] - free-text search against a built index
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use tabvec_core::{Document, Value};
//! use tabvec_index::{HashingEmbedder, IndexBuilder, QueryService};
//!
//! let mut metadata = BTreeMap::new();
//! metadata.insert("category".to_string(), Value::from("Books"));
//! let documents = vec![Document::new(r#"{"product":"The Great Gatsby"}"#.to_string(), metadata)];
//!
//! let embedder = HashingEmbedder::default();
//! let index = IndexBuilder::new(&embedder).build(documents).unwrap();
//! let results = QueryService::new(&embedder, &index).unwrap().search("gatsby", 1).unwrap();
//! assert_eq!(results.len(), 1);
//! ```

pub mod builder;
pub mod embedder;
pub mod index;
pub mod vector;

pub use builder::{IndexBuilder, QueryService};
pub use embedder::{Embedder, HashingEmbedder, DEFAULT_DIM};
pub use index::{Entry, FlatIndex, ScoredDocument, VectorIndex};
pub use vector::Vector;
