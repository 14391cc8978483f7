//! Environment store backed by the platform database CLI.

use crate::environment::{EnvironmentConfig, ExecutionMode};
use crate::error::{classify_failure, ConnectorError, ConnectorResult};
use crate::row;
use crate::sql::{self, Statement};
use crate::store::EnvironmentStore;
use quizsync_model::{CategoryRecord, ItemRecord, SubItemRecord, WriteOp};
use serde_json::{Map, Value};
use std::io::Write as _;
use std::process::Command;
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{debug, trace};

/// Environment variable the CLI reads its API token from.
const TOKEN_VAR: &str = "CLOUDFLARE_API_TOKEN";

/// A store that shells out to the database CLI.
///
/// Two execution paths sit behind the one interface:
/// - local: the SQL is written to a scratch file and the CLI is pointed at
///   it with `--file`, because inline statements can exceed shell argument
///   limits. The scratch file is a [`NamedTempFile`], so it is removed on
///   every exit path, including errors.
/// - remote: the SQL is passed with `--command`, since the remote backend
///   rejects large multi-statement uploads anyway.
///
/// Every remote invocation is followed by a throttle delay. That is
/// deliberate backpressure against remote rate limits, owned here rather
/// than ambient in some process-wide map.
pub struct CliStore {
    binary: String,
    config: EnvironmentConfig,
    token: Option<String>,
    throttle: Duration,
}

impl CliStore {
    /// Creates a store for one environment, resolving its credential.
    ///
    /// A remote environment without a resolvable token fails here, before
    /// any statement is attempted.
    pub fn new(binary: impl Into<String>, config: EnvironmentConfig) -> ConnectorResult<Self> {
        let token = config.resolve_credential()?;
        let throttle = match config.mode {
            ExecutionMode::LocalFile => Duration::ZERO,
            ExecutionMode::RemoteCommand => Duration::from_millis(200),
        };
        Ok(Self {
            binary: binary.into(),
            config,
            token,
            throttle,
        })
    }

    /// Overrides the post-call throttle delay.
    pub fn with_throttle(mut self, throttle: Duration) -> Self {
        self.throttle = throttle;
        self
    }

    /// Executes rendered SQL and returns the result rows.
    fn execute(&self, sql_text: &str) -> ConnectorResult<Vec<Map<String, Value>>> {
        trace!(env = %self.config.name, sql = sql_text, "executing");

        let mut cmd = Command::new(&self.binary);
        cmd.arg("d1")
            .arg("execute")
            .arg(&self.config.database)
            .arg("--json");

        // Scratch file must outlive the child process; drop cleans it up.
        let mut scratch: Option<NamedTempFile> = None;
        match self.config.mode {
            ExecutionMode::LocalFile => {
                let mut file = NamedTempFile::new()?;
                file.write_all(sql_text.as_bytes())?;
                file.flush()?;
                cmd.arg("--local").arg("--file").arg(file.path());
                scratch = Some(file);
            }
            ExecutionMode::RemoteCommand => {
                cmd.arg("--remote").arg("--command").arg(sql_text);
            }
        }

        if let Some(token) = &self.token {
            cmd.env(TOKEN_VAR, token);
        }

        let output = cmd.output()?;
        drop(scratch);

        if self.throttle > Duration::ZERO {
            std::thread::sleep(self.throttle);
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let raw = if stderr.trim().is_empty() {
                stdout.into_owned()
            } else {
                stderr.into_owned()
            };
            debug!(env = %self.config.name, error = %raw.trim(), "statement failed");
            return Err(classify_failure(&raw));
        }

        parse_results(&String::from_utf8_lossy(&output.stdout))
    }

    fn query_rows(&self, stmt: &Statement) -> ConnectorResult<Vec<Map<String, Value>>> {
        self.execute(&stmt.render())
    }
}

/// Parses the CLI's `--json` output into plain row objects.
///
/// The CLI wraps rows as `[{"results": [...], "success": true, ...}]`; a
/// bare object or a bare row array are accepted too, since output shape has
/// shifted across CLI versions.
fn parse_results(stdout: &str) -> ConnectorResult<Vec<Map<String, Value>>> {
    // The CLI sometimes prefixes the JSON with banner lines.
    let json_start = stdout
        .find(['[', '{'])
        .ok_or_else(|| ConnectorError::Decode(format!("no JSON in CLI output: {stdout:?}")))?;
    let value: Value = serde_json::from_str(stdout[json_start..].trim())
        .map_err(|e| ConnectorError::Decode(format!("invalid CLI JSON output: {e}")))?;

    let mut rows = Vec::new();
    collect_rows(&value, &mut rows)?;
    Ok(rows)
}

fn collect_rows(value: &Value, rows: &mut Vec<Map<String, Value>>) -> ConnectorResult<()> {
    match value {
        Value::Array(entries) => {
            for entry in entries {
                collect_rows(entry, rows)?;
            }
            Ok(())
        }
        Value::Object(obj) => {
            if let Some(results) = obj.get("results") {
                collect_rows(results, rows)
            } else {
                rows.push(obj.clone());
                Ok(())
            }
        }
        other => Err(ConnectorError::Decode(format!(
            "unexpected row value: {other}"
        ))),
    }
}

impl EnvironmentStore for CliStore {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn apply(&self, ops: &[WriteOp]) -> ConnectorResult<()> {
        if ops.is_empty() {
            return Ok(());
        }
        let batch_sql = ops
            .iter()
            .map(|op| sql::render_op(op).render())
            .collect::<Vec<_>>()
            .join("\n");
        self.execute(&batch_sql).map(|_| ())
    }

    fn categories(&self) -> ConnectorResult<Vec<CategoryRecord>> {
        self.query_rows(&sql::select_categories())?
            .iter()
            .map(row::decode_category)
            .collect()
    }

    fn category_by_id(&self, id: &str) -> ConnectorResult<Option<CategoryRecord>> {
        let rows = self.query_rows(&sql::select_category_by_id(id))?;
        rows.first().map(row::decode_category).transpose()
    }

    fn categories_by_code(&self, code: &str) -> ConnectorResult<Vec<CategoryRecord>> {
        self.query_rows(&sql::select_categories_by_code(code))?
            .iter()
            .map(row::decode_category)
            .collect()
    }

    fn items(&self, category_id: &str) -> ConnectorResult<Vec<ItemRecord>> {
        self.query_rows(&sql::select_items(category_id))?
            .iter()
            .map(row::decode_item)
            .collect()
    }

    fn sub_items(&self, category_id: &str) -> ConnectorResult<Vec<SubItemRecord>> {
        self.query_rows(&sql::select_sub_items(category_id))?
            .iter()
            .map(row::decode_sub_item)
            .collect()
    }

    fn count_items(&self, category_id: &str) -> ConnectorResult<u64> {
        row::decode_count(&self.query_rows(&sql::count_items(category_id))?)
    }

    fn count_active_items(&self, category_id: &str) -> ConnectorResult<u64> {
        row::decode_count(&self.query_rows(&sql::count_active_items(category_id))?)
    }

    fn count_sub_items(&self, category_id: &str) -> ConnectorResult<u64> {
        row::decode_count(&self.query_rows(&sql::count_sub_items(category_id))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_results() {
        let stdout = r#"[{"results":[{"id":"cat_1","n":5}],"success":true,"meta":{"duration":1}}]"#;
        let rows = parse_results(stdout).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "cat_1");
    }

    #[test]
    fn parses_output_with_banner_prefix() {
        let stdout = "⛅️ wrangler 3.0.0\n-----------------\n[{\"results\":[],\"success\":true}]";
        let rows = parse_results(stdout).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn parses_bare_row_array() {
        let stdout = r#"[{"id":"a"},{"id":"b"}]"#;
        let rows = parse_results(stdout).unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn rejects_non_json_output() {
        assert!(matches!(
            parse_results("no rows here"),
            Err(ConnectorError::Decode(_))
        ));
    }

    #[test]
    fn missing_binary_is_io_error() {
        let store = CliStore::new(
            "quizsync-test-binary-that-does-not-exist",
            EnvironmentConfig {
                name: "local".into(),
                database: "quiz-db".into(),
                mode: ExecutionMode::LocalFile,
                token_env: None,
            },
        )
        .unwrap();

        assert!(matches!(
            store.categories(),
            Err(ConnectorError::Io(_))
        ));
    }
}
