//! Configuration module for environment variable parsing.
//!
//! The three values the webhook cannot work without (shared secret, database
//! and collection ids) are loaded as optional and checked on every request,
//! so a misconfigured deployment answers 500 instead of refusing to start.

use std::env;
use tracing::warn;

/// Default Appwrite Cloud API endpoint.
pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret used to sign nRF Cloud webhook bodies
    pub webhook_secret: Option<String>,

    /// Appwrite database that receives device messages
    pub database_id: Option<String>,

    /// Appwrite collection that receives device messages
    pub collection_id: Option<String>,

    /// Appwrite API endpoint, without trailing slash
    pub appwrite_endpoint: String,

    /// Appwrite project id
    pub appwrite_project_id: Option<String>,

    /// Appwrite server API key
    pub appwrite_api_key: Option<String>,

    /// Timeout for a single Appwrite request in milliseconds
    pub appwrite_timeout_ms: u64,

    /// Port for the web server to listen on
    pub port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            webhook_secret: non_blank("NRFCLOUD_WEBHOOK_SECRET"),

            database_id: non_blank("DATABASE_ID"),

            collection_id: non_blank("COLLECTION_ID"),

            appwrite_endpoint: non_blank("APPWRITE_ENDPOINT")
                .map(|e| e.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string()),

            appwrite_project_id: non_blank("APPWRITE_PROJECT_ID"),

            appwrite_api_key: non_blank("APPWRITE_API_KEY"),

            appwrite_timeout_ms: parse_number("APPWRITE_TIMEOUT_MS", 15_000),

            port: parse_number("PORT", 8080),
        }
    }

    /// Names of the required variables that are not set.
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.webhook_secret.is_none() {
            missing.push("NRFCLOUD_WEBHOOK_SECRET");
        }
        if self.database_id.is_none() {
            missing.push("DATABASE_ID");
        }
        if self.collection_id.is_none() {
            missing.push("COLLECTION_ID");
        }
        missing
    }

    /// The required values, or `None` if any of them is missing.
    pub fn required(&self) -> Option<RequiredConfig<'_>> {
        Some(RequiredConfig {
            webhook_secret: self.webhook_secret.as_deref()?,
            database_id: self.database_id.as_deref()?,
            collection_id: self.collection_id.as_deref()?,
        })
    }
}

/// Borrowed view of the values every request needs.
#[derive(Debug, Clone, Copy)]
pub struct RequiredConfig<'a> {
    pub webhook_secret: &'a str,
    pub database_id: &'a str,
    pub collection_id: &'a str,
}

/// Read a variable, treating blank values as unset.
fn non_blank(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parse a numeric variable, falling back to `default` when unset or invalid.
fn parse_number<T: std::str::FromStr + Copy>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse() {
        Ok(v) => v,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> Config {
        Config {
            webhook_secret: Some("secret".to_string()),
            database_id: Some("db".to_string()),
            collection_id: Some("messages".to_string()),
            appwrite_endpoint: DEFAULT_APPWRITE_ENDPOINT.to_string(),
            appwrite_project_id: None,
            appwrite_api_key: None,
            appwrite_timeout_ms: 15_000,
            port: 8080,
        }
    }

    #[test]
    fn test_missing_required_none() {
        let config = full_config();
        assert!(config.missing_required().is_empty());
        let required = config.required().unwrap();
        assert_eq!(required.webhook_secret, "secret");
        assert_eq!(required.database_id, "db");
        assert_eq!(required.collection_id, "messages");
    }

    #[test]
    fn test_missing_required_lists_names() {
        let config = Config {
            webhook_secret: None,
            collection_id: None,
            ..full_config()
        };
        assert_eq!(
            config.missing_required(),
            vec!["NRFCLOUD_WEBHOOK_SECRET", "COLLECTION_ID"]
        );
        assert!(config.required().is_none());
    }

    #[test]
    fn test_non_blank() {
        env::set_var("TEST_NON_BLANK_SET", "value");
        env::set_var("TEST_NON_BLANK_BLANK", "   ");
        assert_eq!(non_blank("TEST_NON_BLANK_SET"), Some("value".to_string()));
        assert_eq!(non_blank("TEST_NON_BLANK_BLANK"), None);
        assert_eq!(non_blank("TEST_NON_BLANK_UNSET"), None);
        env::remove_var("TEST_NON_BLANK_SET");
        env::remove_var("TEST_NON_BLANK_BLANK");
    }

    #[test]
    fn test_parse_number() {
        env::set_var("TEST_PARSE_NUMBER", "9000");
        assert_eq!(parse_number::<u16>("TEST_PARSE_NUMBER", 8080), 9000);
        env::set_var("TEST_PARSE_NUMBER_BAD", "ninety");
        assert_eq!(parse_number::<u16>("TEST_PARSE_NUMBER_BAD", 8080), 8080);
        assert_eq!(parse_number::<u64>("TEST_PARSE_NUMBER_UNSET", 15), 15);
        env::remove_var("TEST_PARSE_NUMBER");
        env::remove_var("TEST_PARSE_NUMBER_BAD");
    }
}
