use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Result};
use dirs_next::home_dir;

const DEFAULT_UPSTREAM_BASE: &str = "https://raw.githubusercontent.com/wooorm/dictionaries";
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub(crate) struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    pub(crate) fn capture() -> Self {
        Self {
            vars: env::vars().collect(),
        }
    }

    pub(crate) fn var(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    #[cfg(test)]
    pub(crate) fn testing(pairs: &[(&str, &str)]) -> Self {
        let vars = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Self { vars }
    }
}

/// Where persisted state lives and which env key selected it.
#[derive(Debug, Clone)]
pub struct DataLocation {
    pub path: PathBuf,
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub online: bool,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    data: DataLocation,
    network: NetworkConfig,
    upstream: UpstreamConfig,
}

impl Config {
    /// Builds a configuration snapshot from the current process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if no data directory can be resolved.
    pub fn from_env() -> Result<Self> {
        Self::from_snapshot(&EnvSnapshot::capture())
    }

    pub(crate) fn from_snapshot(snapshot: &EnvSnapshot) -> Result<Self> {
        Ok(Self {
            data: resolve_data_path(snapshot)?,
            network: NetworkConfig {
                online: match snapshot.var("LEXI_ONLINE") {
                    Some(value) => {
                        let lowered = value.to_ascii_lowercase();
                        lowered != "0" && lowered != "false"
                    }
                    None => true,
                },
                timeout: snapshot
                    .var("LEXI_HTTP_TIMEOUT_SECS")
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_HTTP_TIMEOUT),
            },
            upstream: UpstreamConfig {
                base_url: snapshot
                    .var("LEXI_UPSTREAM_BASE")
                    .map(|v| v.trim_end_matches('/').to_string())
                    .unwrap_or_else(|| DEFAULT_UPSTREAM_BASE.to_string()),
            },
        })
    }

    /// Explicit data directory, overriding whatever the environment said.
    #[must_use]
    pub fn with_data_dir(mut self, path: PathBuf) -> Self {
        self.data = DataLocation {
            path,
            source: "--data-dir",
        };
        self
    }

    #[must_use]
    pub fn data(&self) -> &DataLocation {
        &self.data
    }

    #[must_use]
    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    #[must_use]
    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }
}

fn resolve_data_path(snapshot: &EnvSnapshot) -> Result<DataLocation> {
    if let Some(override_path) = snapshot.var("LEXI_DATA_PATH") {
        return Ok(DataLocation {
            path: absolutize(PathBuf::from(override_path))?,
            source: "LEXI_DATA_PATH",
        });
    }
    if let Some(xdg) = snapshot.var("XDG_DATA_HOME") {
        return Ok(DataLocation {
            path: PathBuf::from(xdg).join("lexi"),
            source: "XDG_DATA_HOME",
        });
    }
    let home = home_dir().ok_or_else(|| anyhow!("unable to determine home directory"))?;
    Ok(DataLocation {
        path: home.join(".local").join("share").join("lexi"),
        source: "~/.local/share",
    })
}

fn absolutize(path: PathBuf) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(env::current_dir()?.join(path))
    }
}
