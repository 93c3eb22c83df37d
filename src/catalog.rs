use std::{collections::HashMap, fs, io, path::PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{Result, SnapshotError},
    remote::RemoteCatalog,
    store::Keyed,
};

/// One tracked app in the catalog. `name` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    #[serde(default)]
    pub app_id: Option<i64>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
}

impl Keyed for CatalogEntry {
    fn storage_key(&self) -> String {
        self.name.clone()
    }
}

/// Extra fields resolved by a per-entry remote lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDetails {
    #[serde(default)]
    pub app_id: Option<i64>,
    #[serde(default)]
    pub page_url: Option<String>,
    #[serde(default)]
    pub developer: Option<String>,
}

/// Whole-collection cache persisted as a single JSON file, falling back to a
/// remote fetch when the persisted collection is empty.
#[derive(Debug)]
pub struct CatalogStore {
    path: PathBuf,
    entries: RwLock<Vec<CatalogEntry>>,
}

impl CatalogStore {
    pub fn load(path: PathBuf) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, "[]")?;
        }

        let contents = fs::read_to_string(&path)?;
        let entries: Vec<CatalogEntry> = if contents.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&contents)?
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the persisted collection as-is when it is non-empty, with no
    /// freshness check. When it is empty, fetches the authoritative
    /// collection from `remote` and persists it before returning. A failed
    /// fetch is logged and yields an empty collection.
    pub async fn load_all<R: RemoteCatalog>(&self, remote: &R) -> Result<Vec<CatalogEntry>> {
        self.refresh_from_disk()?;
        {
            let entries = self.entries.read();
            if !entries.is_empty() {
                return Ok(entries.clone());
            }
        }

        let fetched = match remote.fetch_all().await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("catalog fetch failed, continuing with empty catalog: {err}");
                return Ok(Vec::new());
            }
        };

        let mut entries = self.entries.write();
        *entries = fetched;
        self.persist(&entries)?;
        Ok(entries.clone())
    }

    /// Refreshes one entry's details from `remote`, in memory only. Nothing
    /// is written until the caller decides to `persist_all`. Remote failures
    /// propagate.
    pub async fn update_details<R: RemoteCatalog>(
        &self,
        name: &str,
        remote: &R,
    ) -> Result<CatalogEntry> {
        let current = {
            let entries = self.entries.read();
            entries
                .iter()
                .find(|entry| entry.name == name)
                .cloned()
                .ok_or_else(|| SnapshotError::EntryNotFound(name.to_string()))?
        };

        let details = remote.fetch_details(&current).await?;

        let mut entries = self.entries.write();
        let entry = entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| SnapshotError::EntryNotFound(name.to_string()))?;
        if let Some(app_id) = details.app_id {
            entry.app_id = Some(app_id);
        }
        if let Some(page_url) = details.page_url {
            entry.page_url = Some(page_url);
        }
        if let Some(developer) = details.developer {
            entry.developer = Some(developer);
        }
        Ok(entry.clone())
    }

    pub fn list(&self) -> Vec<CatalogEntry> {
        let _ = self.refresh_from_disk();
        self.entries.read().clone()
    }

    pub fn persist_all(&self) -> Result<()> {
        let entries = self.entries.read();
        self.persist(&entries)
    }

    fn persist(&self, entries: &[CatalogEntry]) -> Result<()> {
        let payload = serde_json::to_string_pretty(&dedupe_by_name(entries))?;
        fs::write(&self.path, payload)?;
        Ok(())
    }

    fn refresh_from_disk(&self) -> Result<()> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                if let Some(parent) = self.path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&self.path, "[]")?;
                String::new()
            }
            Err(err) => return Err(SnapshotError::Io(err)),
        };

        let parsed: Vec<CatalogEntry> = if contents.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&contents)?
        };

        let mut entries = self.entries.write();
        *entries = parsed;
        Ok(())
    }
}

/// Name collisions overwrite: the later entry wins, keeping the earlier
/// entry's position.
fn dedupe_by_name(entries: &[CatalogEntry]) -> Vec<CatalogEntry> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut deduped: Vec<CatalogEntry> = Vec::new();
    for entry in entries {
        match positions.get(&entry.storage_key()) {
            Some(&index) => deduped[index] = entry.clone(),
            None => {
                positions.insert(entry.storage_key(), deduped.len());
                deduped.push(entry.clone());
            }
        }
    }
    deduped
}
