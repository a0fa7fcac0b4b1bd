//! Ephemeral draft hand-off.
//!
//! The normalized draft is the only artifact the pipeline persists: one
//! transient `pendingSubscription` slot for hand-off to a manual-completion
//! UI. The slot is overwritten, never appended, and carries no schema
//! versioning.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;
use crate::normalize::NormalizedDraft;

const SLOT_FILE: &str = "pending_subscription.json";

/// The `pendingSubscription` key-value slot
#[derive(Debug, Clone)]
pub struct DraftSlot {
    path: PathBuf,
}

impl DraftSlot {
    /// Slot in the default data directory
    pub fn open_default() -> Result<Self> {
        Ok(Self {
            path: Config::data_dir()?.join(SLOT_FILE),
        })
    }

    /// Slot at an explicit path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Overwrite the slot with a draft
    pub fn store(&self, draft: &NormalizedDraft) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(draft)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }

    /// Read the pending draft, if any
    pub fn load(&self) -> Result<Option<NormalizedDraft>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Read and clear the pending draft in one step
    pub fn take(&self) -> Result<Option<NormalizedDraft>> {
        let draft = self.load()?;
        if draft.is_some() {
            self.clear()?;
        }
        Ok(draft)
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::DraftFields;
    use crate::normalize;
    use chrono::NaiveDate;

    fn sample() -> NormalizedDraft {
        normalize::normalize(
            DraftFields {
                service_name: Some("Netflix".into()),
                monthly_cost: serde_json::Number::from_f64(15.49).map(serde_json::Value::Number),
                ..DraftFields::default()
            },
            NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
        )
    }

    fn temp_slot(name: &str) -> DraftSlot {
        let dir = std::env::temp_dir().join("subwatch-slot-tests");
        DraftSlot::at(dir.join(name))
    }

    #[test]
    fn test_store_and_take() {
        let slot = temp_slot("store_and_take.json");
        slot.clear().unwrap();

        assert!(slot.load().unwrap().is_none());
        slot.store(&sample()).unwrap();
        let taken = slot.take().unwrap().unwrap();
        assert_eq!(taken.draft.service_name.as_deref(), Some("Netflix"));
        // take() clears the slot
        assert!(slot.load().unwrap().is_none());
    }

    #[test]
    fn test_store_overwrites() {
        let slot = temp_slot("overwrite.json");
        slot.clear().unwrap();

        slot.store(&sample()).unwrap();
        let mut second = sample();
        second.draft.service_name = Some("Spotify".into());
        slot.store(&second).unwrap();

        let loaded = slot.load().unwrap().unwrap();
        assert_eq!(loaded.draft.service_name.as_deref(), Some("Spotify"));
        slot.clear().unwrap();
    }
}
