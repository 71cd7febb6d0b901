//! Combine JSON run logs into one wide comparison table.
//!
//! Nested objects are flattened with `.` (`trade_stats.all_trades.avg_profit`).
//! Rows are keys sorted by name, columns are logs; a key missing from a log
//! is an empty cell.

use anyhow::{Context, Result};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;

/// Keys down the side, one column per log.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    pub columns: Vec<String>,
    pub rows: Vec<(String, Vec<String>)>,
}

impl ComparisonTable {
    /// Build from `(column name, JSON document)` pairs.
    pub fn from_logs(logs: &[(String, Value)]) -> Self {
        let mut keys: BTreeSet<String> = BTreeSet::new();
        let mut cells: Vec<HashMap<String, String>> = Vec::with_capacity(logs.len());

        for (_, doc) in logs {
            let mut flat = Vec::new();
            flatten_json(doc, "", &mut flat);
            keys.extend(flat.iter().map(|(key, _)| key.clone()));
            cells.push(flat.into_iter().collect());
        }

        let rows = keys
            .into_iter()
            .map(|key| {
                let values = cells
                    .iter()
                    .map(|c| c.get(&key).cloned().unwrap_or_default())
                    .collect();
                (key, values)
            })
            .collect();

        Self {
            columns: logs.iter().map(|(name, _)| name.clone()).collect(),
            rows,
        }
    }

    /// Read each JSON file; its file stem names the column.
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut logs = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let content = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let doc: Value = serde_json::from_str(&content)
                .with_context(|| format!("{} is not valid JSON", path.display()))?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            logs.push((name, doc));
        }
        Ok(Self::from_logs(&logs))
    }

    pub fn get(&self, key: &str, column: usize) -> Option<&str> {
        self.rows
            .iter()
            .find(|(k, _)| k == key)
            .and_then(|(_, values)| values.get(column))
            .map(String::as_str)
    }

    pub fn to_csv(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let header: Vec<&str> = std::iter::once("key")
            .chain(self.columns.iter().map(String::as_str))
            .collect();
        wtr.write_record(&header)?;
        for (key, values) in &self.rows {
            wtr.write_record(std::iter::once(key).chain(values.iter()))?;
        }
        let data = wtr.into_inner().context("failed to flush CSV writer")?;
        String::from_utf8(data).context("CSV output is not valid UTF-8")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(path, self.to_csv()?)
            .with_context(|| format!("failed to write {}", path.display()))
    }
}

/// Depth-first flatten of objects; scalars and arrays become leaf strings.
pub fn flatten_json(value: &Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten_json(v, &key, out);
            }
        }
        Value::String(s) => out.push((prefix.to_string(), s.clone())),
        Value::Null => out.push((prefix.to_string(), String::new())),
        other => out.push((prefix.to_string(), other.to_string())),
    }
}
