use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;

/// Environment variable that points at an alternative settings file
pub const CONFIG_ENV: &str = "THALIA_CONFIG_FILE";

#[derive(Debug, Clone)]
pub struct Timeouts {
    /// Deadline for read-only queries (status, log, branches, diff)
    pub git_read: Duration,
    /// Deadline for mutating operations (commit, checkout, ...)
    pub git_write: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            git_read: Duration::from_secs(10),
            git_write: Duration::from_secs(30),
        }
    }
}

impl Timeouts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_git_read(mut self, timeout: Duration) -> Self {
        self.git_read = timeout;
        self
    }

    pub fn with_git_write(mut self, timeout: Duration) -> Self {
        self.git_write = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Invalidations arriving within this window share one refresh
    pub debounce: Duration,
    /// Number of commits kept in the snapshot log
    pub log_limit: usize,
    /// Watch the working tree for changes made outside the app
    pub watch: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(50),
            log_limit: 200,
            watch: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    pub timeouts: Timeouts,
    pub refresh: RefreshConfig,
}

impl ServiceConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.refresh.debounce = debounce;
        self
    }

    pub fn with_log_limit(mut self, limit: usize) -> Self {
        self.refresh.log_limit = limit;
        self
    }

    pub fn with_watch(mut self, watch: bool) -> Self {
        self.refresh.watch = watch;
        self
    }
}

/// Everything read from the settings file
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub service: ServiceConfig,
    /// Action name to key strings, as written by the user
    pub bindings: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    refresh: RefreshSection,
    timeouts: TimeoutSection,
    bindings: BTreeMap<String, KeyList>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RefreshSection {
    debounce_ms: Option<u64>,
    log_limit: Option<usize>,
    watch: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct TimeoutSection {
    git_read_ms: Option<u64>,
    git_write_ms: Option<u64>,
}

/// A binding may name one key or several
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum KeyList {
    One(String),
    Many(Vec<String>),
}

impl Config {
    /// Load settings from `explicit`, `$THALIA_CONFIG_FILE`, or the user
    /// config directory, in that order. A missing file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => std::env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(default_config_path),
        };

        match path {
            Some(path) if path.exists() => Self::load_file(&path),
            Some(path) => {
                debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;

        let mut service = ServiceConfig::default();
        if let Some(ms) = file.refresh.debounce_ms {
            service.refresh.debounce = Duration::from_millis(ms);
        }
        if let Some(limit) = file.refresh.log_limit {
            service.refresh.log_limit = limit;
        }
        if let Some(watch) = file.refresh.watch {
            service.refresh.watch = watch;
        }
        if let Some(ms) = file.timeouts.git_read_ms {
            service.timeouts.git_read = Duration::from_millis(ms);
        }
        if let Some(ms) = file.timeouts.git_write_ms {
            service.timeouts.git_write = Duration::from_millis(ms);
        }

        let bindings = file
            .bindings
            .into_iter()
            .map(|(action, keys)| {
                let keys = match keys {
                    KeyList::One(k) => vec![k],
                    KeyList::Many(ks) => ks,
                };
                (action, keys)
            })
            .collect();

        Ok(Self { service, bindings })
    }
}

/// `~/.config/thalia/config.toml` on Linux
pub fn default_config_path() -> Option<PathBuf> {
    Some(dirs::config_dir()?.join("thalia").join("config.toml"))
}
