use crate::config::types::{CriteriaSet, FetchConfig, NotifyConfig, RuleSet, Settings};
use crate::crawler::ListingRules;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Validates the run settings
pub fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    if settings.sources_path.is_empty() {
        return Err(ConfigError::Validation(
            "sources_path cannot be empty".to_string(),
        ));
    }

    if settings.criteria_path.is_empty() {
        return Err(ConfigError::Validation(
            "criteria_path cannot be empty".to_string(),
        ));
    }

    if settings.storage.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    validate_fetch_config(&settings.fetch)?;
    validate_notify_config(&settings.notify)?;
    Ok(())
}

/// Validates fetch configuration
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be >= 1, got {}",
            config.max_retries
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout_secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates notification configuration
fn validate_notify_config(config: &NotifyConfig) -> Result<(), ConfigError> {
    if config.outbox_dir.is_empty() {
        return Err(ConfigError::Validation(
            "outbox_dir cannot be empty".to_string(),
        ));
    }

    if config.summary_path.is_empty() {
        return Err(ConfigError::Validation(
            "summary_path cannot be empty".to_string(),
        ));
    }

    validate_email(&config.sender)?;
    for recipient in &config.recipients {
        validate_email(&recipient.email)?;
    }

    Ok(())
}

/// Validates one source rule set
///
/// Checks the URLs, compiles every selector and parses every header so
/// that a rule set that passes here cannot fail later during a crawl.
pub fn validate_rule_set(rules: &RuleSet) -> Result<(), ConfigError> {
    if rules.name.trim().is_empty() {
        return Err(ConfigError::Validation(
            "source name cannot be empty".to_string(),
        ));
    }

    validate_http_url(&rules.name, "base_url", &rules.base_url)?;
    validate_http_url(&rules.name, "career_url", &rules.career_url)?;

    if let Some(pagination) = &rules.pagination {
        validate_http_url(&rules.name, "pagination.base_url", &pagination.base_url)?;

        if pagination.param_name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "Source '{}' has an empty pagination param_name",
                rules.name
            )));
        }

        if pagination.max_pages < 1 {
            return Err(ConfigError::Validation(format!(
                "Source '{}' max_pages must be >= 1, got {}",
                rules.name, pagination.max_pages
            )));
        }
    }

    for (name, value) in &rules.headers {
        let valid = HeaderName::from_bytes(name.as_bytes()).is_ok()
            && HeaderValue::from_str(value).is_ok();
        if !valid {
            return Err(ConfigError::InvalidHeader {
                source_name: rules.name.clone(),
                name: name.clone(),
            });
        }
    }

    ListingRules::compile(rules)?;

    Ok(())
}

/// Validates a prepared criteria set
pub fn validate_criteria(criteria: &CriteriaSet) -> Result<(), ConfigError> {
    if !criteria.threshold.is_finite() || !(0.0..=1.0).contains(&criteria.threshold) {
        return Err(ConfigError::Validation(format!(
            "match_threshold must be between 0 and 1, got {}",
            criteria.threshold
        )));
    }

    Ok(())
}

fn validate_http_url(source: &str, field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| {
        ConfigError::InvalidUrl(format!("Source '{}' {} '{}': {}", source, field, value, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Source '{}' {} '{}' must use http or https",
            source, field, value
        )));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation("email cannot be empty".to_string()));
    }

    // Basic email format check: must contain @ and have text on both sides
    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::PaginationConfig;
    use std::collections::BTreeMap;

    fn valid_rule_set() -> RuleSet {
        RuleSet {
            name: "Co".to_string(),
            base_url: "https://co.example".to_string(),
            career_url: "https://co.example/careers".to_string(),
            job_listing_selector: "div.opening".to_string(),
            title_selector: "a.title".to_string(),
            location_selector: "span.location".to_string(),
            link_selector: "a.title".to_string(),
            headers: BTreeMap::new(),
            pagination: Some(PaginationConfig {
                base_url: "https://co.example/careers".to_string(),
                param_name: "page".to_string(),
                max_pages: 20,
                has_next_page_selector: Some("a[rel=next]".to_string()),
            }),
        }
    }

    #[test]
    fn test_valid_rule_set() {
        assert!(validate_rule_set(&valid_rule_set()).is_ok());
    }

    #[test]
    fn test_rule_set_rejects_bad_url() {
        let mut rules = valid_rule_set();
        rules.career_url = "not a url".to_string();
        assert!(matches!(
            validate_rule_set(&rules),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut rules = valid_rule_set();
        rules.base_url = "ftp://co.example".to_string();
        assert!(matches!(
            validate_rule_set(&rules),
            Err(ConfigError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_rule_set_rejects_bad_selector() {
        let mut rules = valid_rule_set();
        rules.title_selector = "[[[".to_string();
        assert!(matches!(
            validate_rule_set(&rules),
            Err(ConfigError::InvalidSelector { field: "title", .. })
        ));
    }

    #[test]
    fn test_rule_set_rejects_bad_header() {
        let mut rules = valid_rule_set();
        rules
            .headers
            .insert("Bad Header".to_string(), "value".to_string());
        assert!(matches!(
            validate_rule_set(&rules),
            Err(ConfigError::InvalidHeader { .. })
        ));
    }

    #[test]
    fn test_rule_set_rejects_zero_page_ceiling() {
        let mut rules = valid_rule_set();
        if let Some(pagination) = rules.pagination.as_mut() {
            pagination.max_pages = 0;
        }
        assert!(matches!(
            validate_rule_set(&rules),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_criteria_threshold() {
        assert!(validate_criteria(&CriteriaSet::new(["x"], [], [], [], 0.0)).is_ok());
        assert!(validate_criteria(&CriteriaSet::new(["x"], [], [], [], 1.0)).is_ok());
        assert!(validate_criteria(&CriteriaSet::new(["x"], [], [], [], 1.5)).is_err());
        assert!(validate_criteria(&CriteriaSet::new(["x"], [], [], [], -0.1)).is_err());
        assert!(validate_criteria(&CriteriaSet::new(["x"], [], [], [], f64::NAN)).is_err());
    }

    #[test]
    fn test_validate_settings_defaults() {
        assert!(validate_settings(&Settings::default()).is_ok());

        let mut settings = Settings::default();
        settings.fetch.max_retries = 0;
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("job-scout@localhost").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@").is_err());
    }
}
