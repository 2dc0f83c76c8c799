//! Where site profiles are kept between runs, keyed by base URL.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ParserError, ParserResult};
use crate::profile::SiteProfile;

/// Read-mostly profile storage. Implementations must allow concurrent lookups.
pub trait ProfileStore: Send + Sync {
    fn lookup(&self, base_url: &str) -> ParserResult<Option<SiteProfile>>;

    /// Adds the profile, replacing any stored under the same base URL.
    fn insert(&self, profile: &SiteProfile) -> ParserResult<()>;
}

/// Returns the stored profile for `default`'s base URL, storing `default` first
/// when there is none yet.
pub fn resolve_profile(store: &dyn ProfileStore, default: SiteProfile) -> ParserResult<SiteProfile> {
    if let Some(stored) = store.lookup(&default.base_url)? {
        debug!("Using stored profile for {}", default.base_url);
        return Ok(stored);
    }
    info!("No stored profile for {}, saving the built-in one", default.base_url);
    store.insert(&default)?;
    Ok(default)
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, SiteProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryProfileStore {
    fn lookup(&self, base_url: &str) -> ParserResult<Option<SiteProfile>> {
        let profiles = self.profiles.read().map_err(|_| poisoned())?;
        Ok(profiles.get(base_url).cloned())
    }

    fn insert(&self, profile: &SiteProfile) -> ParserResult<()> {
        let mut profiles = self.profiles.write().map_err(|_| poisoned())?;
        profiles.insert(profile.base_url.clone(), profile.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredProfile {
    saved_at: DateTime<Utc>,
    profile: SiteProfile,
}

/// Profiles persisted as a JSON array in a single file. The file is read once
/// on open and rewritten on every insert.
#[derive(Debug)]
pub struct JsonProfileStore {
    path: PathBuf,
    entries: RwLock<Vec<StoredProfile>>,
}

impl JsonProfileStore {
    /// Opens `path`, treating a missing file as an empty store.
    pub fn open(path: impl AsRef<Path>) -> ParserResult<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = if path.exists() {
            let raw = fs::read_to_string(&path).map_err(|e| store_error(&path, e))?;
            if raw.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&raw).map_err(|e| store_error(&path, e))?
            }
        } else {
            Vec::new()
        };
        debug!("Opened profile store {} ({} profiles)", path.display(), entries.len());

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn saved_at(&self, base_url: &str) -> ParserResult<Option<DateTime<Utc>>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .find(|entry| entry.profile.base_url == base_url)
            .map(|entry| entry.saved_at))
    }

    /// Writes a sibling temp file and renames it over the store, so the store
    /// file is always either the old or the new complete array.
    fn flush(&self, entries: &[StoredProfile]) -> ParserResult<()> {
        if let Some(dir) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).map_err(|e| store_error(&self.path, e))?;
        }
        let json = serde_json::to_string_pretty(entries).map_err(|e| store_error(&self.path, e))?;

        let tmp = self.temp_path();
        fs::write(&tmp, json).map_err(|e| store_error(&tmp, e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            store_error(&self.path, e)
        })
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ProfileStore for JsonProfileStore {
    fn lookup(&self, base_url: &str) -> ParserResult<Option<SiteProfile>> {
        let entries = self.entries.read().map_err(|_| poisoned())?;
        Ok(entries
            .iter()
            .find(|entry| entry.profile.base_url == base_url)
            .map(|entry| entry.profile.clone()))
    }

    fn insert(&self, profile: &SiteProfile) -> ParserResult<()> {
        let mut entries = self.entries.write().map_err(|_| poisoned())?;
        let entry = StoredProfile {
            saved_at: Utc::now(),
            profile: profile.clone(),
        };
        match entries
            .iter_mut()
            .find(|existing| existing.profile.base_url == profile.base_url)
        {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.flush(&entries)
    }
}

fn poisoned() -> ParserError {
    ParserError::Store("profile store lock poisoned".to_string())
}

fn store_error(path: &Path, err: impl std::fmt::Display) -> ParserError {
    ParserError::Store(format!("{}: {err}", path.display()))
}
