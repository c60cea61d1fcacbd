//! Batch pipeline: load → join → group/assemble → build index → save,
//! and the later, independent query step.
//!
//! Stages run in order on one thread and hand their output to the next by
//! value. The first failing stage aborts the run.

use crate::config::PipelineConfig;
use serde::Serialize;
use tabvec_core::{group_and_assemble, join, Document, Error, Result, Table, Value};
use tabvec_index::{FlatIndex, IndexBuilder, QueryService, ScoredDocument, VectorIndex};
use tabvec_storage::{load_csv, IndexStore, SnapshotManifest, SnapshotStore};
use tracing::info;

/// Per-document summary of a build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub category: Value,
    pub records: usize,
    pub content_len: usize,
}

impl DocumentSummary {
    fn of(document: &Document) -> Self {
        Self {
            category: document.category().cloned().unwrap_or_default(),
            records: document.record_count(),
            content_len: document.content().len(),
        }
    }
}

/// Outcome of [`Pipeline::build`]
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub source_rows: Vec<usize>,
    pub unified_rows: usize,
    pub documents: Vec<DocumentSummary>,
    pub manifest: SnapshotManifest,
}

pub struct Pipeline {
    config: PipelineConfig,
    store: SnapshotStore,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store: SnapshotStore::default(),
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Read every configured source table, in order
    pub fn load_tables(&self) -> Result<Vec<Table>> {
        if self.config.tables.is_empty() {
            return Err(Error::InvalidConfig("no source tables configured".to_string()));
        }
        self.config.tables.iter().map(load_csv).collect()
    }

    /// Join `tables` and group the unified table into documents
    pub fn assemble(&self, tables: Vec<Table>) -> Result<Vec<Document>> {
        let unified = self.unify(tables)?;
        group_and_assemble(
            &unified,
            &self.config.category_column,
            &self.config.assembly_options(),
        )
    }

    fn unify(&self, tables: Vec<Table>) -> Result<Table> {
        let key = self.config.join_key()?;
        let unified = join(tables, &key, &self.config.join_options())?;
        info!(
            "unified table: {} rows, {} columns",
            unified.len(),
            unified.columns().len()
        );
        Ok(unified)
    }

    /// Embed `documents` into a fresh index
    pub fn index(&self, documents: Vec<Document>) -> Result<FlatIndex> {
        let embedder = self.config.embedder()?;
        IndexBuilder::new(&embedder)
            .embed_metadata(self.config.embed_metadata)
            .build(documents)
    }

    /// Full run from the configured CSV files to a saved index
    pub fn build(&self) -> Result<BuildReport> {
        let tables = self.load_tables()?;
        self.build_from_tables(tables)
    }

    /// Full run from in-memory tables to a saved index
    pub fn build_from_tables(&self, tables: Vec<Table>) -> Result<BuildReport> {
        let source_rows = tables.iter().map(Table::len).collect();
        let unified = self.unify(tables)?;
        let unified_rows = unified.len();

        let documents = group_and_assemble(
            &unified,
            &self.config.category_column,
            &self.config.assembly_options(),
        )?;
        drop(unified);
        let summaries = documents.iter().map(DocumentSummary::of).collect();

        let index = self.index(documents)?;
        let manifest = self.store.save(&index, &self.config.index_dir)?;

        Ok(BuildReport {
            source_rows,
            unified_rows,
            documents: summaries,
            manifest,
        })
    }

    /// Search the saved index
    pub fn query(&self, query: &str, k: usize) -> Result<Vec<ScoredDocument>> {
        let index = self.store.load(&self.config.index_dir)?;
        let embedder = self.config.query_embedder(index.dimension())?;
        QueryService::new(&embedder, &index)?.search(query, k)
    }
}
