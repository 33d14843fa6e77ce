//! The CLI's state file: locally known resource IDs plus a snapshot of the
//! in-memory service, so consecutive invocations see the same remote state.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use eventsub_client::{InMemoryClient, StoredSubscription};
use eventsub_reconcile::ResourceState;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    /// Remote ID per managed target, keyed by the target's ID.
    #[serde(default)]
    pub resources: BTreeMap<String, String>,
    #[serde(default)]
    pub remote: Vec<StoredSubscription>,
}

impl StateFile {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse state file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write state file {}", path.display()))
    }

    pub fn client(&self) -> Arc<InMemoryClient> {
        Arc::new(InMemoryClient::from_snapshot(self.remote.clone()))
    }

    pub fn resource(&self, key: &str) -> ResourceState {
        match self.resources.get(key) {
            Some(id) => ResourceState::imported(id.clone()),
            None => ResourceState::new(),
        }
    }

    /// Records `state` for `key` and refreshes the remote snapshot.
    ///
    /// An ID left behind by an interrupted write is kept, so the next apply
    /// updates that resource.
    pub fn record(&mut self, key: &str, state: &ResourceState, client: &InMemoryClient) {
        match &state.id {
            Some(id) => {
                self.resources.insert(key.to_string(), id.clone());
            }
            None => {
                self.resources.remove(key);
            }
        }
        self.remote = client.snapshot();
    }
}
