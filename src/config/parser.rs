use crate::config::types::{CriteriaConfig, CriteriaSet, RuleSet, Settings, SourcesFile};
use crate::config::validation::{validate_criteria, validate_rule_set, validate_settings};
use crate::events::{EventSink, ScoutEvent};
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and validates the run settings file
///
/// # Arguments
///
/// * `path` - Path to the TOML settings file
///
/// # Returns
///
/// * `Ok(Settings)` - Successfully loaded and validated settings
/// * `Err(ConfigError)` - Failed to load, parse, or validate the settings
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use job_scout::config::load_settings;
///
/// let settings = load_settings(Path::new("config.toml")).unwrap();
/// println!("Sources: {}", settings.sources_path);
/// ```
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let settings: Settings = toml::from_str(&content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// This is stored with each run so that history rows can be tied to the
/// settings that produced them.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads settings and returns both the settings and their hash
pub fn load_settings_with_hash(path: &Path) -> Result<(Settings, String), ConfigError> {
    let settings = load_settings(path)?;
    let hash = compute_config_hash(path)?;
    Ok((settings, hash))
}

/// Loads the sources file
///
/// The file itself must read and parse. Individual rule sets that fail
/// validation are reported to `sink` and left out, so one broken source
/// never takes the others down with it.
pub fn load_sources(path: &Path, sink: &dyn EventSink) -> Result<Vec<RuleSet>, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let file: SourcesFile = toml::from_str(&content)?;

    let mut accepted = Vec::with_capacity(file.sources.len());
    for (index, entry) in file.sources.into_iter().enumerate() {
        let label = entry_label(&entry, index);
        let checked = toml::Value::Table(entry)
            .try_into::<RuleSet>()
            .map_err(ConfigError::from)
            .and_then(|rules| validate_rule_set(&rules).map(|()| rules));

        match checked {
            Ok(rules) => accepted.push(rules),
            Err(e) => sink.emit(&ScoutEvent::SourceRejected {
                source: label,
                error: e.to_string(),
            }),
        }
    }

    Ok(accepted)
}

/// The entry's `name`, or its position when the name is unreadable
fn entry_label(entry: &toml::Table, index: usize) -> String {
    entry
        .get("name")
        .and_then(toml::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("sources[{}]", index))
}

/// Like [`load_sources`], but an unreadable file yields no sources
pub fn load_sources_or_empty(path: &Path, sink: &dyn EventSink) -> Vec<RuleSet> {
    load_sources(path, sink).unwrap_or_else(|e| {
        sink.emit(&ScoutEvent::ConfigFallback {
            what: "sources",
            error: e.to_string(),
        });
        Vec::new()
    })
}

/// Loads and validates the criteria file
pub fn load_criteria(path: &Path) -> Result<CriteriaSet, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: CriteriaConfig = toml::from_str(&content)?;
    let criteria = CriteriaSet::from(config);
    validate_criteria(&criteria)?;
    Ok(criteria)
}

/// Like [`load_criteria`], but any failure yields a criteria set that matches nothing
pub fn load_criteria_or_empty(path: &Path, sink: &dyn EventSink) -> CriteriaSet {
    load_criteria(path).unwrap_or_else(|e| {
        sink.emit(&ScoutEvent::ConfigFallback {
            what: "criteria",
            error: e.to_string(),
        });
        CriteriaSet::empty()
    })
}
