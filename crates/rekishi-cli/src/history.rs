//! History files: a base document plus the op log that builds on it.
//!
//! ```json
//! {
//!   "base": { "counter": 0 },
//!   "ops": [
//!     { "components": [ { "p": ["counter"], "number_add": 1 } ] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use rekishi_ops::{JsonDocument, JsonOp, OpLog};
use serde::{Deserialize, Serialize};
use tracing::info;

/// A history file as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryFile {
    #[serde(default)]
    pub base: JsonDocument,
    pub ops: OpLog<JsonOp>,
}

/// A history whose log is known to replay cleanly from its base.
#[derive(Debug, Clone)]
pub struct History {
    pub base: JsonDocument,
    pub head: JsonDocument,
    pub log: Arc<OpLog<JsonOp>>,
}

impl History {
    /// Parse and validate history JSON.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: HistoryFile = serde_json::from_str(text).context("parsing history JSON")?;
        let head = file
            .ops
            .validate_from(&file.base)
            .context("history does not replay from its base")?;
        Ok(Self { base: file.base, head, log: Arc::new(file.ops) })
    }

    /// Read, parse and validate a history file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let history = Self::from_json(&text).with_context(|| format!("loading {}", path.display()))?;
        info!(path = %path.display(), versions = history.log.len(), "history loaded");
        Ok(history)
    }

    /// One line per op: index and the kind/path of each component.
    pub fn summarize(&self) -> Vec<String> {
        self.log
            .iter()
            .enumerate()
            .map(|(i, op)| {
                let parts: Vec<String> = op
                    .components
                    .iter()
                    .map(|c| format!("{} {}", c.action.kind(), c.display_path()))
                    .collect();
                format!("{:>4}  {}", i, parts.join(", "))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const COUNTER: &str = r#"{
        "base": {"counter": 0},
        "ops": [
            {"components": [{"p": ["counter"], "number_add": 1}]},
            {"components": [{"p": ["counter"], "number_add": 1}]},
            {"components": [{"p": ["label"], "object_insert": "three"},
                            {"p": ["counter"], "number_add": 1}]}
        ]
    }"#;

    #[test]
    fn test_parse_and_validate() {
        let history = History::from_json(COUNTER).unwrap();
        assert_eq!(history.log.len(), 3);
        assert_eq!(history.head.root(), &serde_json::json!({"counter": 3, "label": "three"}));
    }

    #[test]
    fn test_invalid_log_is_rejected() {
        let text = r#"{"base": {}, "ops": [{"components": [{"p": ["n"], "number_add": 1}]}]}"#;
        let err = History::from_json(text).unwrap_err();
        assert!(format!("{err:#}").contains("op 0 cannot be applied"));
    }

    #[test]
    fn test_missing_base_defaults_to_null() {
        let text = r#"{"ops": []}"#;
        let history = History::from_json(text).unwrap();
        assert_eq!(history.base.root(), &serde_json::Value::Null);
        assert!(history.log.is_empty());
    }

    #[test]
    fn test_summarize() {
        let history = History::from_json(COUNTER).unwrap();
        let lines = history.summarize();
        assert_eq!(lines[0], "   0  number_add $.counter");
        assert_eq!(lines[2], "   2  object_insert $.label, number_add $.counter");
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(COUNTER.as_bytes()).unwrap();

        let history = History::load(file.path()).unwrap();
        assert_eq!(history.log.len(), 3);
    }
}
