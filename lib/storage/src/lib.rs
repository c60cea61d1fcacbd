pub mod loader;
pub mod snapshot;

pub use loader::{load_csv, parse_csv};
pub use snapshot::{IndexStore, SnapshotManifest, SnapshotStore, INDEX_FILE, MANIFEST_FILE};
