//! Configuration module for Job-Scout
//!
//! This module loads three TOML files: the run settings, the per-source
//! extraction rule sets, and the search criteria. Sources and criteria have
//! tolerant loaders that fall back to an empty set instead of failing.
//!
//! # Example
//!
//! ```no_run
//! use job_scout::config::{load_criteria_or_empty, load_settings};
//! use job_scout::events::TracingSink;
//! use std::path::Path;
//!
//! let settings = load_settings(Path::new("config.toml")).unwrap();
//! let criteria = load_criteria_or_empty(Path::new(&settings.criteria_path), &TracingSink);
//! println!("Match threshold: {}", criteria.threshold);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CriteriaConfig, CriteriaSet, FetchConfig, NotifyConfig, PaginationConfig, PaginationMode,
    Recipient, RuleSet, Settings, SourcesFile, StorageConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_criteria, load_criteria_or_empty, load_settings,
    load_settings_with_hash, load_sources, load_sources_or_empty,
};
pub use validation::{validate_criteria, validate_rule_set};
