use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{DedupState, SignalStateStore};

/// On-disk shape: `[last_buy_ts_ms, last_sell_ts_ms]`.
#[derive(Serialize, Deserialize)]
struct StoredPoints(i64, i64);

/// JSON file holding the two thresholds as a two-element array.
///
/// Writes go to a sibling temp file first and are renamed into place so a
/// crash mid-write never leaves a truncated file behind.
pub struct JsonFileSignalStateStore {
    path: PathBuf,
}

impl JsonFileSignalStateStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SignalStateStore for JsonFileSignalStateStore {
    #[instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    async fn load(&self) -> Result<Option<DedupState>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("no signal state file yet");
                return Ok(None);
            }
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("read signal state {}", self.path.display()));
            }
        };

        let StoredPoints(buy, sell) = serde_json::from_str(&raw)
            .with_context(|| format!("parse signal state {}", self.path.display()))?;

        Ok(Some(DedupState::new(buy, sell)))
    }

    #[instrument(skip(self), fields(path = %self.path.display()), level = "debug")]
    async fn save(&self, state: &DedupState) -> Result<()> {
        let body = serde_json::to_string(&StoredPoints(state.last_buy_ts_ms, state.last_sell_ts_ms))?;
        let tmp = self.tmp_path();

        tokio::fs::write(&tmp, body)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;

        Ok(())
    }
}
