//! Named environment configuration and credential resolution.

use crate::error::{ConnectorError, ConnectorResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How statements reach a given environment's database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Write statements to a scratch file and point the database CLI at it.
    /// Inline statements can exceed shell argument limits locally.
    LocalFile,
    /// Pass statements via `--command`. Remote backends commonly reject
    /// large multi-statement uploads, so batches stay small.
    RemoteCommand,
}

/// One named database environment (e.g. `local`, `staging`, `production`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment name used on the command line.
    pub name: String,
    /// Database binding name passed to the CLI.
    pub database: String,
    /// Execution path for this environment.
    pub mode: ExecutionMode,
    /// Process environment variable holding the API token. Required for
    /// `RemoteCommand` environments.
    #[serde(default)]
    pub token_env: Option<String>,
}

impl EnvironmentConfig {
    /// Resolves the credential for this environment.
    ///
    /// Returns `Ok(None)` for local environments. A remote environment with
    /// no resolvable token is a fatal configuration error naming exactly
    /// what to set.
    pub fn resolve_credential(&self) -> ConnectorResult<Option<String>> {
        if self.mode == ExecutionMode::LocalFile {
            return Ok(None);
        }

        let var = self.token_env.as_deref().ok_or_else(|| {
            ConnectorError::Configuration {
                message: format!(
                    "environment '{}' is remote but has no token_env configured",
                    self.name
                ),
            }
        })?;

        match std::env::var(var) {
            Ok(token) if !token.is_empty() => Ok(Some(token)),
            _ => Err(ConnectorError::Configuration {
                message: format!(
                    "missing credential for environment '{}': set the {var} environment variable",
                    self.name
                ),
            }),
        }
    }
}

/// The on-disk environments artifact loaded at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentsFile {
    /// Database CLI binary to invoke (default: `wrangler`).
    #[serde(default = "default_binary")]
    pub binary: String,
    /// All known environments.
    pub environments: Vec<EnvironmentConfig>,
    /// Path to the versioned legacy-id table, relative to this file.
    #[serde(default)]
    pub legacy_table: Option<String>,
    /// Fixed category codes the read-only verify entry point checks.
    #[serde(default)]
    pub verify_categories: Vec<String>,
}

fn default_binary() -> String {
    "wrangler".to_string()
}

impl EnvironmentsFile {
    /// Loads and parses the environments file.
    pub fn load(path: &Path) -> ConnectorResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| ConnectorError::Configuration {
            message: format!("invalid environments file {}: {e}", path.display()),
        })
    }

    /// Looks up an environment by name; unknown names are fatal.
    pub fn environment(&self, name: &str) -> ConnectorResult<&EnvironmentConfig> {
        self.environments
            .iter()
            .find(|env| env.name == name)
            .ok_or_else(|| ConnectorError::Configuration {
                message: format!(
                    "unknown environment '{name}' (known: {})",
                    self.environments
                        .iter()
                        .map(|e| e.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }
}
