//! Configuration types for sml.
//!
//! [`Config::load`] layers an optional TOML file over the built-in defaults.
//! [`Config::defaults`] returns the same defaults without touching the
//! filesystem (useful in tests). CLI flags are applied on top by the binary;
//! the orchestrator only ever sees the final struct.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::TimestampLayout;

// ---------------------------------------------------------------------------
// Embedded defaults
// ---------------------------------------------------------------------------

const DEFAULT_CONFIG: &str = r#"
[sink]
root_dir   = "./sml-data"
collection = "logs"

[pipeline]
workers = 10
# queue_capacity defaults to the worker count when unset
# queue_capacity = 10

[tail]
layout = 1
debug  = false
"#;

// ---------------------------------------------------------------------------
// Public config types
// ---------------------------------------------------------------------------

/// Top-level configuration, passed into the orchestrator constructor.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sink: SinkConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub tail: TailConfig,
}

/// `[sink]` section — where records are persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Root directory of the JSONL sink (the "connection string").
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Destination collection name; becomes `<root_dir>/<collection>.jsonl`.
    #[serde(default = "default_collection")]
    pub collection: String,
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("./sml-data")
}
fn default_collection() -> String {
    "logs".to_string()
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            collection: default_collection(),
        }
    }
}

/// `[pipeline]` section — worker pool and queue sizing.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Number of concurrent sink workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Capacity of the shared record queue. Defaults to the worker count.
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

fn default_workers() -> usize {
    10
}

impl PipelineConfig {
    /// The queue capacity actually used.
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.workers)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
        }
    }
}

/// `[tail]` section — per-file tailing behavior.
#[derive(Debug, Clone, Deserialize)]
pub struct TailConfig {
    /// Timestamp layout selector: `1` or `2`.
    #[serde(default = "default_layout")]
    pub layout: TimestampLayout,
    /// Verbose per-line logging in every engine.
    #[serde(default)]
    pub debug: bool,
}

fn default_layout() -> TimestampLayout {
    TimestampLayout::Human
}

impl Default for TailConfig {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            debug: false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

impl Config {
    /// Load configuration, layering `path` (when given) over the built-in
    /// defaults. A path that does not exist is an error; omit it to run on
    /// defaults alone.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut builder = config::Config::builder().add_source(config::File::from_str(
            DEFAULT_CONFIG,
            config::FileFormat::Toml,
        ));
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Return the built-in defaults without touching the filesystem.
    pub fn defaults() -> Self {
        config::Config::builder()
            .add_source(config::File::from_str(
                DEFAULT_CONFIG,
                config::FileFormat::Toml,
            ))
            .build()
            .expect("built-in default config must be valid TOML")
            .try_deserialize()
            .expect("built-in default config must deserialize correctly")
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.pipeline.workers == 0 {
            anyhow::bail!("pipeline.workers must be at least 1");
        }
        if self.pipeline.queue_capacity == Some(0) {
            anyhow::bail!("pipeline.queue_capacity must be at least 1 when set");
        }
        if self.sink.collection.is_empty() {
            anyhow::bail!("sink.collection cannot be empty");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_load() {
        let cfg = Config::defaults();
        assert_eq!(cfg.pipeline.workers, 10);
        assert_eq!(cfg.pipeline.effective_queue_capacity(), 10);
        assert_eq!(cfg.tail.layout, TimestampLayout::Human);
        assert!(!cfg.tail.debug);
        assert_eq!(cfg.sink.collection, "logs");
    }

    #[test]
    fn file_overrides_defaults() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            "[pipeline]\nworkers = 3\nqueue_capacity = 32\n\n[tail]\nlayout = 2"
        )
        .unwrap();
        file.flush().unwrap();

        let cfg = Config::load(Some(file.path())).unwrap();
        assert_eq!(cfg.pipeline.workers, 3);
        assert_eq!(cfg.pipeline.effective_queue_capacity(), 32);
        assert_eq!(cfg.tail.layout, TimestampLayout::Rfc3339);
        // Untouched sections keep their defaults.
        assert_eq!(cfg.sink.collection, "logs");
    }

    #[test]
    fn bad_layout_selector_is_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[tail]\nlayout = 7").unwrap();
        file.flush().unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn zero_workers_is_rejected() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "[pipeline]\nworkers = 0").unwrap();
        file.flush().unwrap();
        assert!(Config::load(Some(file.path())).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load(Some(Path::new("/nonexistent/sml.toml"))).is_err());
    }
}
