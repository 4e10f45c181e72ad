//! Source manifest loading.
//!
//! The console host describes its updatable sources in a JSON file:
//!
//! ```json
//! {
//!   "sources": [
//!     {
//!       "name": "Example Mod",
//!       "files": {
//!         "https://example.com/releases/example.dll": "mods/example.dll"
//!       }
//!     }
//!   ]
//! }
//! ```
//!
//! File paths are resolved relative to the manifest's own directory, so a
//! manifest can live next to the install it describes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::Deserialize;

use modsync::{FileEntry, StaticSource, Updatable};

/// Top-level manifest document.
#[derive(Debug, Deserialize)]
pub struct Manifest {
    pub sources: Vec<ManifestSource>,
}

/// One source in the manifest. The map is ordered so the plan and reports
/// keep a stable shape across runs.
#[derive(Debug, Deserialize)]
pub struct ManifestSource {
    pub name: String,
    pub files: BTreeMap<String, PathBuf>,
}

/// Load a manifest and convert it into the registry form the orchestrator
/// consumes.
pub fn load_sources(manifest_path: &Path) -> anyhow::Result<Vec<Arc<dyn Updatable>>> {
    let text = fs::read_to_string(manifest_path)
        .with_context(|| format!("failed to read manifest {}", manifest_path.display()))?;
    let manifest: Manifest = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse manifest {}", manifest_path.display()))?;

    let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));

    Ok(manifest
        .sources
        .into_iter()
        .map(|source| {
            let entries = source
                .files
                .into_iter()
                .map(|(url, path)| {
                    let resolved = if path.is_absolute() {
                        path
                    } else {
                        base.join(path)
                    };
                    FileEntry::new(url, resolved)
                })
                .collect();
            StaticSource::new(source.name, entries).into_updatable()
        })
        .collect())
}
