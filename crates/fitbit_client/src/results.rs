//! Where fetched records land on disk.

use std::path::{Path, PathBuf};

use crate::FitbitError;

const HEARTBEAT_DIR: &str = "heartbeat";
const SLEEP_DIR: &str = "sleepTime";

#[derive(Clone, Debug)]
pub struct ResultsLayout {
    root: PathBuf,
}

impl ResultsLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn heartbeat_dir(&self) -> PathBuf {
        self.root.join(HEARTBEAT_DIR)
    }

    pub fn sleep_dir(&self) -> PathBuf {
        self.root.join(SLEEP_DIR)
    }
}

impl Default for ResultsLayout {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_RESULTS_DIR)
    }
}

/// Create `path` and any missing parents. Existing directories are left as-is.
pub async fn ensure_dir(path: &Path) -> Result<(), FitbitError> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

/// Write `value` as 2-space indented JSON, replacing any existing file.
pub async fn write_pretty_json(path: &Path, value: &serde_json::Value) -> Result<(), FitbitError> {
    let json = serde_json::to_string_pretty(value)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

/// `{dir}/{key}.json`, refusing keys that would escape `dir`.
pub fn record_path(dir: &Path, key: &str) -> Result<PathBuf, FitbitError> {
    let is_plain = !key.is_empty()
        && key != "."
        && key != ".."
        && !key.contains(['/', '\\']);
    if !is_plain {
        return Err(FitbitError::MissingField(format!(
            "record key is not a plain file name: {key:?}"
        )));
    }
    Ok(dir.join(format!("{key}.json")))
}
