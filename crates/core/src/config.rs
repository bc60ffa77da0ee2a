//! Target list configuration.
//!
//! The target list is a JSON document:
//!
//! ```json
//! {
//!   "master_enable": true,
//!   "targets": [
//!     "SIM:TEMP",
//!     { "name": "SIM:PRESSURE", "enabled": true, "low": 10.0, "high": 20.0 }
//!   ]
//! }
//! ```
//!
//! A bare string entry takes the defaults (enabled, `[0, 100]`). The key
//! `target_pvs` is accepted in place of `targets`. [`MonitorConfig::load`]
//! and [`MonitorConfig::from_json`] validate before returning, so a
//! config that made it out of this module can be handed straight to the
//! registry.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::bounds::{Bounds, DEFAULT_HIGH, DEFAULT_LOW};
use crate::error::CoreError;
use crate::pv_names::{self, MASTER_ENABLE, SUMMARY_STATUS};

/// One configured target: its PV name and the operator defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(from = "TargetEntry")]
pub struct TargetDescriptor {
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub enabled: bool,
    pub low: f64,
    pub high: f64,
}

impl TargetDescriptor {
    pub fn new(name: impl Into<String>, enabled: bool, low: f64, high: f64) -> Self {
        Self {
            name: name.into(),
            enabled,
            low,
            high,
        }
    }

    /// A target with the default enable flag and bounds.
    pub fn with_defaults(name: impl Into<String>) -> Self {
        Self::new(name, true, DEFAULT_LOW, DEFAULT_HIGH)
    }

    /// The configured default bounds, validated.
    pub fn bounds(&self) -> Result<Bounds, CoreError> {
        Bounds::new(self.low, self.high)
    }
}

/// Wire shape of a target entry: a bare name or a full descriptor.
#[derive(Deserialize)]
#[serde(untagged)]
enum TargetEntry {
    Name(String),
    Detailed(DetailedEntry),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct DetailedEntry {
    name: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default = "default_low")]
    low: f64,
    #[serde(default = "default_high")]
    high: f64,
}

impl From<TargetEntry> for TargetDescriptor {
    fn from(entry: TargetEntry) -> Self {
        match entry {
            TargetEntry::Name(name) => TargetDescriptor::with_defaults(name),
            TargetEntry::Detailed(d) => TargetDescriptor::new(d.name, d.enabled, d.low, d.high),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_low() -> f64 {
    DEFAULT_LOW
}

fn default_high() -> f64 {
    DEFAULT_HIGH
}

/// The whole watcher configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Initial value of `MONITOR:MASTER_ENABLE`.
    #[serde(default = "default_true")]
    pub master_enable: bool,
    /// Targets in display order.
    #[serde(alias = "target_pvs")]
    pub targets: Vec<TargetDescriptor>,
}

impl MonitorConfig {
    pub fn new(master_enable: bool, targets: Vec<TargetDescriptor>) -> Self {
        Self {
            master_enable,
            targets,
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        let config: MonitorConfig = serde_json::from_str(text)
            .map_err(|e| CoreError::InvalidConfig(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Io(format!("failed to read {}: {e}", path.display())))?;
        Self::from_json(&text)
    }

    /// Check every descriptor and the set of PV names they publish.
    ///
    /// Fails on the first problem found: malformed descriptor, invalid PV
    /// name, invalid default bounds, duplicate target, or a target whose
    /// published PVs collide with another PV of this process.
    pub fn validate(&self) -> Result<(), CoreError> {
        let mut names = HashSet::with_capacity(self.targets.len());

        for target in &self.targets {
            Validate::validate(target).map_err(|e| {
                CoreError::InvalidConfig(format!("target '{}': {e}", target.name))
            })?;

            if !pv_names::is_valid_pv_name(&target.name) {
                return Err(CoreError::InvalidPvName(target.name.clone()));
            }

            target.bounds().map_err(|e| {
                CoreError::InvalidConfig(format!("target '{}': {e}", target.name))
            })?;

            if !names.insert(target.name.as_str()) {
                return Err(CoreError::DuplicateTarget(target.name.clone()));
            }
        }

        let mut published: HashSet<String> =
            HashSet::from([MASTER_ENABLE.to_string(), SUMMARY_STATUS.to_string()]);
        for target in &self.targets {
            for pv in pv_names::target_pvs(&target.name) {
                if !published.insert(pv.clone()) {
                    return Err(CoreError::InvalidConfig(format!(
                        "PV name collision: '{pv}' (published by target '{}')",
                        target.name
                    )));
                }
            }
        }

        Ok(())
    }

    pub fn target_names(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_bare_names_with_defaults() {
        let config = MonitorConfig::from_json(r#"{"targets":["SIM:A","SIM:B"]}"#).unwrap();

        assert!(config.master_enable);
        assert_eq!(config.targets.len(), 2);
        assert_eq!(config.targets[0], TargetDescriptor::new("SIM:A", true, 0.0, 100.0));
        assert_eq!(config.target_names().collect::<Vec<_>>(), vec!["SIM:A", "SIM:B"]);
    }

    #[test]
    fn parses_detailed_entries_and_partial_defaults() {
        let json = r#"{
            "master_enable": false,
            "targets": [
                {"name": "A", "enabled": false, "low": 10.0, "high": 20.0},
                {"name": "B", "high": 5.5}
            ]
        }"#;
        let config = MonitorConfig::from_json(json).unwrap();

        assert!(!config.master_enable);
        assert_eq!(config.targets[0], TargetDescriptor::new("A", false, 10.0, 20.0));
        assert_eq!(config.targets[1], TargetDescriptor::new("B", true, 0.0, 5.5));
    }

    #[test]
    fn accepts_target_pvs_alias() {
        let config = MonitorConfig::from_json(r#"{"target_pvs":["X"]}"#).unwrap();
        assert_eq!(config.targets[0].name, "X");
    }

    #[test]
    fn empty_target_list_is_valid() {
        let config = MonitorConfig::from_json(r#"{"targets":[]}"#).unwrap();
        assert!(config.targets.is_empty());
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"targets":["A","B","A"]}"#).unwrap_err();
        assert_matches!(err, CoreError::DuplicateTarget(name) if name == "A");
    }

    #[test]
    fn inverted_default_bounds_are_rejected() {
        let err =
            MonitorConfig::from_json(r#"{"targets":[{"name":"A","low":20,"high":10}]}"#)
                .unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(_));
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = MonitorConfig::from_json(r#"{"targets":[""]}"#).unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(_));
    }

    #[test]
    fn invalid_characters_are_rejected() {
        let err = MonitorConfig::from_json(r#"{"targets":["bad name"]}"#).unwrap_err();
        assert_matches!(err, CoreError::InvalidPvName(_));
    }

    #[test]
    fn field_collision_is_rejected() {
        // "A:LOW" as a target would shadow the LOW field of target "A".
        let err = MonitorConfig::from_json(r#"{"targets":["A","A:LOW"]}"#).unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(msg) if msg.contains("A:LOW"));
    }

    #[test]
    fn process_pv_collision_is_rejected() {
        let err =
            MonitorConfig::from_json(r#"{"targets":["MONITOR:SUMMARY_STATUS"]}"#).unwrap_err();
        assert_matches!(err, CoreError::InvalidConfig(_));
    }

    #[test]
    fn malformed_entry_is_rejected() {
        assert_matches!(
            MonitorConfig::from_json(r#"{"targets":[{"name":"A","lo":1}]}"#),
            Err(CoreError::InvalidConfig(_))
        );
        assert_matches!(
            MonitorConfig::from_json(r#"{"targets":[42]}"#),
            Err(CoreError::InvalidConfig(_))
        );
        assert_matches!(
            MonitorConfig::from_json("not json"),
            Err(CoreError::InvalidConfig(_))
        );
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"targets":["FILE:PV"]}}"#).unwrap();

        let config = MonitorConfig::load(file.path()).unwrap();
        assert_eq!(config.targets[0].name, "FILE:PV");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        assert_matches!(
            MonitorConfig::load("/nonexistent/pvwatch/config.json"),
            Err(CoreError::Io(_))
        );
    }
}
