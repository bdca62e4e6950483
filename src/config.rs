use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    env, fs,
    path::{Path, PathBuf},
    sync::RwLock,
};

use crate::navigation::ClockMode;

pub const DATA_DIR_ENV: &str = "DAYBOOK_DATA_DIR";
pub const DATABASE_FILE: &str = "daybook.sqlite3";
pub const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct JournalConfig {
    /// Calendar used to decide which day "today" is.
    pub clock: ClockMode,
    /// Extra attempts for a durable write that failed with a storage error.
    pub write_retries: u32,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            clock: ClockMode::Local,
            write_retries: 2,
        }
    }
}

/// `--data-dir`, then `$DAYBOOK_DATA_DIR`, then `$HOME/.daybook`.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(dir) = env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    match env::var_os("HOME") {
        Some(home) => Path::new(&home).join(".daybook"),
        None => PathBuf::from(".daybook"),
    }
}

pub struct ConfigStore {
    path: PathBuf,
    data: RwLock<JournalConfig>,
}

impl ConfigStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!("Ignoring malformed config at {}: {err}", path.display());
                JournalConfig::default()
            })
        } else {
            JournalConfig::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> JournalConfig {
        match self.data.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn update(&self, config: JournalConfig) -> Result<()> {
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.persist(&config)?;
        *guard = config;
        Ok(())
    }

    fn persist(&self, data: &JournalConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write config to {}", self.path.display()))
    }
}
