//! Job configuration and the two ways of handing it to an external script:
//! command-line flags, or a JSON file whose path becomes a single argument.

use crate::error::{JobError, Result};
use crate::types::Args;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        ConfigValue::Bool(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        ConfigValue::Text(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        ConfigValue::Text(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<u32> for ConfigValue {
    fn from(value: u32) -> Self {
        ConfigValue::Number(value.into())
    }
}

impl From<u64> for ConfigValue {
    fn from(value: u64) -> Self {
        ConfigValue::Number(value.into())
    }
}

/// Ordered key/value configuration for one job.
///
/// Keys keep their insertion order in both handoff forms. Inserting an
/// existing key replaces the value where it stands.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JobConfig {
    entries: Vec<(String, ConfigValue)>,
}

impl JobConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Render as `--key value` pairs.
    ///
    /// `true` becomes a bare `--key`, `false` is left out entirely.
    pub fn to_cli_flags(&self) -> Args {
        let mut args = Args::with_capacity(self.entries.len() * 2);
        for (key, value) in &self.entries {
            match value {
                ConfigValue::Bool(true) => args.push(format!("--{}", key)),
                ConfigValue::Bool(false) => {}
                ConfigValue::Number(n) => {
                    args.push(format!("--{}", key));
                    args.push(n.to_string());
                }
                ConfigValue::Text(text) => {
                    args.push(format!("--{}", key));
                    args.push(text.clone());
                }
            }
        }
        args
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the config as `job-config-<uuid>.json` inside `dir`.
    ///
    /// The file lives as long as the returned guard.
    pub fn write_json(&self, dir: &Path) -> Result<ConfigFile> {
        let json = self.to_json()?;
        let path = dir.join(format!("job-config-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, json).map_err(|source| JobError::ConfigWrite {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), keys = self.entries.len(), "wrote job config");
        Ok(ConfigFile { path })
    }
}

impl Serialize for JobConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// A job config written to disk. Removed on drop.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
}

impl ConfigFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as a command-line argument.
    pub fn to_arg(&self) -> String {
        self.path.to_string_lossy().into_owned()
    }
}

impl Drop for ConfigFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "could not remove job config");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn batch_config() -> JobConfig {
        JobConfig::new()
            .with("duration", "6s")
            .with("resolution", "720p")
            .with("include-completed", false)
    }

    #[test]
    fn flags_follow_insertion_order() {
        assert_eq!(
            batch_config().to_cli_flags(),
            vec!["--duration", "6s", "--resolution", "720p"]
        );
    }

    #[test]
    fn true_flags_have_no_value() {
        let config = batch_config()
            .with("include-completed", true)
            .with("delay", 30u32);
        assert_eq!(
            config.to_cli_flags(),
            vec![
                "--duration",
                "6s",
                "--resolution",
                "720p",
                "--include-completed",
                "--delay",
                "30"
            ]
        );
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut config = batch_config();
        config.insert("duration", "10s");
        assert_eq!(config.len(), 3);
        assert_eq!(config.get("duration"), Some(&ConfigValue::from("10s")));
        assert_eq!(config.to_cli_flags()[..2], ["--duration", "10s"]);
    }

    #[test]
    fn json_keeps_order_and_unicode() {
        let config = JobConfig::new()
            .with("prompt", "một con mèo")
            .with("aspectRatio", "16:9")
            .with("retries", 2u32);
        let json = config.to_json().expect("encode");
        assert!(json.contains("một con mèo"));
        assert!(json.find("prompt") < json.find("aspectRatio"));

        let value: Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["prompt"], "một con mèo");
        assert_eq!(value["retries"], 2);
    }

    #[test]
    fn config_file_is_removed_on_drop() {
        let config = JobConfig::new().with("prompt", "a cat");
        let file = config.write_json(&std::env::temp_dir()).expect("write");
        let path = file.path().to_path_buf();

        let written: Value =
            serde_json::from_str(&fs::read_to_string(&path).expect("read back")).expect("json");
        assert_eq!(written["prompt"], "a cat");
        assert_eq!(file.to_arg(), path.to_string_lossy());

        drop(file);
        assert!(!path.exists());
    }

    #[test]
    fn write_into_missing_dir_fails() {
        let dir = std::env::temp_dir().join(format!("missing-{}", uuid::Uuid::new_v4()));
        let err = JobConfig::new().write_json(&dir).unwrap_err();
        assert!(matches!(err, JobError::ConfigWrite { .. }));
    }
}
