use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tabvec_core::{
    AssemblyOptions, CollisionPolicy, Error, GroupOrder, JoinKey, JoinOptions, Result, NULL_SENTINEL,
};
use tabvec_index::{HashingEmbedder, DEFAULT_DIM};

/// Everything a pipeline run needs; loadable from a JSON file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Source tables, joined in this order; the first is the base population
    pub tables: Vec<PathBuf>,
    pub join_key: Vec<String>,
    pub category_column: String,
    /// Restrict row records to these columns
    pub columns: Option<Vec<String>>,
    pub excluded: Vec<String>,
    pub collision: CollisionPolicy,
    pub group_order: GroupOrder,
    pub null_sentinel: String,
    /// Unset: the default dimension when building, the saved index's when querying
    pub embedding_dim: Option<usize>,
    /// Prepend metadata to the text embedded for each document
    pub embed_metadata: bool,
    pub index_dir: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tables: Vec::new(),
            join_key: vec!["id".to_string()],
            category_column: "category".to_string(),
            columns: None,
            excluded: Vec::new(),
            collision: CollisionPolicy::default(),
            group_order: GroupOrder::default(),
            null_sentinel: NULL_SENTINEL.to_string(),
            embedding_dim: None,
            embed_metadata: true,
            index_dir: PathBuf::from("./index"),
        }
    }
}

impl PipelineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))
    }

    pub fn validate(&self) -> Result<()> {
        if self.join_key.iter().any(|k| k.is_empty()) {
            return Err(Error::InvalidConfig("join key columns must be named".to_string()));
        }
        if self.category_column.is_empty() {
            return Err(Error::InvalidConfig("category column is required".to_string()));
        }
        if self.embedding_dim == Some(0) {
            return Err(Error::InvalidConfig("embedding dimension must be positive".to_string()));
        }
        self.join_key()?;
        Ok(())
    }

    pub fn join_key(&self) -> Result<JoinKey> {
        JoinKey::new(self.join_key.iter().cloned())
    }

    pub fn join_options(&self) -> JoinOptions {
        JoinOptions {
            collision: self.collision,
        }
    }

    pub fn assembly_options(&self) -> AssemblyOptions {
        AssemblyOptions {
            columns: self.columns.clone(),
            excluded: self.excluded.clone(),
            null_sentinel: self.null_sentinel.clone(),
            order: self.group_order,
        }
    }

    /// Embedder for a build
    pub fn embedder(&self) -> Result<HashingEmbedder> {
        HashingEmbedder::new(self.embedding_dim.unwrap_or(DEFAULT_DIM))
    }

    /// Embedder for querying an index of `index_dim` dimensions
    pub fn query_embedder(&self, index_dim: usize) -> Result<HashingEmbedder> {
        HashingEmbedder::new(self.embedding_dim.unwrap_or(index_dim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabvec_index::Embedder;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.join_key().unwrap().columns(), &["id".to_string()]);
        assert_eq!(config.embedding_dim, None);
        assert_eq!(config.embedder().unwrap().dimension(), DEFAULT_DIM);
        assert_eq!(config.query_embedder(64).unwrap().dimension(), 64);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "tables": ["file1.csv", "file2.csv", "file3.csv"],
            "category_column": "category",
            "collision": "overwrite",
            "group_order": "sorted"
        }"#;
        let config: PipelineConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.tables.len(), 3);
        assert_eq!(config.join_key, vec!["id".to_string()]);
        assert_eq!(config.collision, CollisionPolicy::Overwrite);
        assert_eq!(config.group_order, GroupOrder::Sorted);
        assert!(config.embed_metadata);
    }

    #[test]
    fn test_invalid_configs() {
        let mut config = PipelineConfig::default();
        config.join_key.clear();
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let mut config = PipelineConfig::default();
        config.category_column.clear();
        assert!(config.validate().is_err());

        let mut config = PipelineConfig::default();
        config.embedding_dim = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        fs::write(&path, r#"{"join_key": ["id", "region"], "embedding_dim": 64}"#).unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();
        assert_eq!(config.join_key().unwrap().columns().len(), 2);
        assert_eq!(config.embedder().unwrap().dimension(), 64);
        assert_eq!(config.query_embedder(512).unwrap().dimension(), 64);

        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            PipelineConfig::from_file(&path),
            Err(Error::InvalidConfig(_))
        ));
    }
}
