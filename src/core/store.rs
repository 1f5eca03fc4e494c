//! # Reminder Persistence
//!
//! Loads the base reminder set from a YAML file and merges the runtime
//! overlay (JSON) over it; overlay entries win on name collision. Runtime
//! adds and removes rewrite the whole overlay file through a temp-file +
//! rename so a crashed write leaves the previous overlay intact.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::{Context, Result};
use log::{debug, info};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::features::reminders::ReminderDefinition;

/// Name-keyed reminder definitions, as stored in the config files.
pub type ReminderMap = BTreeMap<String, ReminderDefinition>;

/// Source and sink for persisted reminder definitions.
///
/// The scheduler only ever reads the merged view and writes single-entry
/// changes to the overlay; how the two sets are stored is this layer's
/// business.
pub trait ReminderStore: Send + Sync {
    /// Load the merged view: overlay entries replace base entries with the
    /// same name.
    fn load(&self) -> Result<ReminderMap>;

    /// Insert or replace one overlay entry.
    fn upsert_overlay(&self, name: &str, definition: &ReminderDefinition) -> Result<()>;

    /// Remove one overlay entry. Removing an absent name is not an error.
    fn remove_overlay(&self, name: &str) -> Result<()>;
}

/// File-backed [`ReminderStore`]: base set in YAML, overlay in JSON.
pub struct FileReminderStore {
    base_path: PathBuf,
    overlay_path: PathBuf,
}

impl FileReminderStore {
    pub fn new(base_path: impl Into<PathBuf>, overlay_path: impl Into<PathBuf>) -> Self {
        FileReminderStore {
            base_path: base_path.into(),
            overlay_path: overlay_path.into(),
        }
    }

    /// Read the base set. A missing base file is an empty set, not an error.
    fn load_base(&self) -> Result<ReminderMap> {
        if !self.base_path.exists() {
            info!("no base reminder config at {}", self.base_path.display());
            return Ok(ReminderMap::new());
        }
        let contents = fs::read_to_string(&self.base_path)
            .with_context(|| format!("reading {}", self.base_path.display()))?;
        serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing {}", self.base_path.display()))
    }

    /// Read the overlay. A missing overlay file is an empty set.
    fn load_overlay(&self) -> Result<ReminderMap> {
        if !self.overlay_path.exists() {
            return Ok(ReminderMap::new());
        }
        let contents = fs::read_to_string(&self.overlay_path)
            .with_context(|| format!("reading {}", self.overlay_path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing {}", self.overlay_path.display()))
    }

    /// Replace the overlay file contents via temp-file + rename.
    fn write_overlay(&self, overlay: &ReminderMap) -> Result<()> {
        let contents = serde_json::to_string_pretty(overlay)?;
        let tmp_path = temp_sibling(&self.overlay_path);
        fs::write(&tmp_path, contents)
            .with_context(|| format!("writing {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.overlay_path)
            .with_context(|| format!("replacing {}", self.overlay_path.display()))?;
        debug!(
            "wrote {} overlay entries to {}",
            overlay.len(),
            self.overlay_path.display()
        );
        Ok(())
    }
}

impl ReminderStore for FileReminderStore {
    fn load(&self) -> Result<ReminderMap> {
        let mut merged = self.load_base()?;
        let overlay = self.load_overlay()?;
        if !overlay.is_empty() {
            debug!("merging {} overlay entries over base", overlay.len());
        }
        merged.extend(overlay);
        Ok(merged)
    }

    fn upsert_overlay(&self, name: &str, definition: &ReminderDefinition) -> Result<()> {
        let mut overlay = self.load_overlay()?;
        overlay.insert(name.to_string(), definition.clone());
        self.write_overlay(&overlay)
    }

    fn remove_overlay(&self, name: &str) -> Result<()> {
        let mut overlay = self.load_overlay()?;
        if overlay.remove(name).is_none() {
            return Ok(());
        }
        self.write_overlay(&overlay)
    }
}

/// Temp file next to `path`, so the final rename stays on one filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "overlay".to_string());
    name.push_str(".tmp");
    path.with_file_name(name)
}
