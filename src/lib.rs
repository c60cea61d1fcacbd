//! # tabvec
//!
//! Turn several related tables into a searchable set of category documents.
//!
//! tabvec left-joins N tables on a shared key, groups the unified rows by a
//! category column, serializes each group into one [`Document`] (JSON row
//! records plus `{category: value}` metadata) and indexes the documents for
//! similarity search.
//!
//! ## Quick Start
//!
//! ### As a CLI
//!
//! ```bash
//! tabvec build --table file1.csv --table file2.csv --table file3.csv \
//!     --key id --category category --index-dir ./my_category_index
//! tabvec query --index-dir ./my_category_index -k 1 electronics
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use tabvec::prelude::*;
//!
//! let config = PipelineConfig {
//!     tables: vec!["file1.csv".into(), "file2.csv".into(), "file3.csv".into()],
//!     ..Default::default()
//! };
//! let pipeline = Pipeline::new(config).unwrap();
//! let report = pipeline.build().unwrap();
//! println!("{} documents", report.documents.len());
//!
//! for hit in pipeline.query("electronics", 1).unwrap() {
//!     println!("{:?} {:.3}", hit.document.category(), hit.score);
//! }
//! ```
//!
//! ## Crate Structure
//!
//! - `tabvec-core` - tables, join chain, grouping, documents, errors
//! - `tabvec-index` - embedders, vector index, index builder, query service
//! - `tabvec-storage` - CSV loading and index snapshots

pub mod config;
pub mod pipeline;

pub use config::PipelineConfig;
pub use pipeline::{BuildReport, DocumentSummary, Pipeline};

// Re-export core types
pub use tabvec_core::{
    group_and_assemble, join, AssemblyOptions, CollisionPolicy, Document, Error, GroupOrder,
    JoinKey, JoinOptions, Record, Result, Table, Value,
};

// Re-export index
pub use tabvec_index::{
    Embedder, FlatIndex, HashingEmbedder, IndexBuilder, QueryService, ScoredDocument, Vector,
    VectorIndex,
};

// Re-export storage
pub use tabvec_storage::{load_csv, parse_csv, IndexStore, SnapshotManifest, SnapshotStore};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        group_and_assemble, join, AssemblyOptions, CollisionPolicy, Document, Embedder, Error,
        FlatIndex, GroupOrder, HashingEmbedder, IndexBuilder, IndexStore, JoinKey, JoinOptions,
        Pipeline, PipelineConfig, QueryService, Result, SnapshotStore, Table, Value, VectorIndex,
    };
}
