//! FileSink - appends every replica operation to a JSON-lines journal

use chrono::{SecondsFormat, Utc};
use contracts::ContractError;
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};
use tracing::{debug, error, instrument};

use crate::SinkCall;

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        Self { base_path }
    }
}

/// One journal line
#[derive(Serialize)]
struct JournalEntry<'a> {
    ts: String,
    replica: &'a str,
    call: &'a SinkCall,
}

/// Sink that journals operations to `<base_path>/<name>.jsonl`
pub struct FileSink {
    pub(crate) name: String,
    path: PathBuf,
    file: Mutex<File>,
}

impl FileSink {
    /// Create a new FileSink, opening the journal in append mode
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let name = name.into();
        fs::create_dir_all(&config.base_path)?;

        let path = config.base_path.join(format!("{name}.jsonl"));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        debug!(sink = %name, path = %path.display(), "FileSink opened");

        Ok(Self {
            name,
            path,
            file: Mutex::new(file),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Journal file path
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn append(&self, call: &SinkCall) -> std::io::Result<()> {
        let entry = JournalEntry {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            replica: &self.name,
            call,
        };
        let mut line = serde_json::to_vec(&entry)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        line.push(b'\n');

        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(&line)?;
        file.flush()
    }

    #[instrument(
        name = "file_sink_apply",
        skip(self, call),
        fields(sink = %self.name, action = %call.action())
    )]
    pub(crate) async fn apply(&self, call: SinkCall) -> Result<(), ContractError> {
        self.append(&call).map_err(|e| {
            error!(sink = %self.name, error = %e, "Journal write failed");
            ContractError::sink_write(&self.name, e.to_string())
        })
    }
}
