//! Configuration types for pagestream

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use url::Url;

/// Remote paged API configuration
///
/// Groups settings that describe the upstream API and how pages are fetched
/// from it. Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the paged endpoint (default: "https://reqres.in/api/users")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Query parameter carrying the 1-based page number (default: "page")
    #[serde(default = "default_page_param")]
    pub page_param: String,

    /// Top-level key holding the record array in each page (default: "data")
    #[serde(default = "default_records_key")]
    pub records_key: String,

    /// Top-level key holding the total page count in each page (default: "total_pages")
    #[serde(default = "default_total_pages_key")]
    pub total_pages_key: String,

    /// Per-page fetch timeout in seconds (default: 30)
    ///
    /// Applies to the whole request for one page, headers and body. There is
    /// no automatic retry; a timed-out page fails the export.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Optional delay between pages in milliseconds (default: none)
    ///
    /// Purely cosmetic: slows the export down so that incremental delivery is
    /// visible to a human watching the client. Not part of the pagination
    /// protocol.
    #[serde(default)]
    pub page_delay_ms: Option<u64>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            page_param: default_page_param(),
            records_key: default_records_key(),
            total_pages_key: default_total_pages_key(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            page_delay_ms: None,
        }
    }
}

/// CSV output configuration
///
/// Groups settings that shape the emitted rows. Used as a nested sub-config
/// within [`Config`].
///
/// Values are written unquoted and unescaped, matching the delimiter-joined
/// output of the export this crate models. Exports whose fields may contain
/// the delimiter should configure a different one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CsvConfig {
    /// Record fields to emit, in column order (default: first_name, last_name)
    #[serde(default = "default_fields")]
    pub fields: Vec<String>,

    /// Field delimiter (default: ",")
    #[serde(default = "default_delimiter")]
    pub delimiter: String,

    /// Row terminator (default: "\r\n")
    #[serde(default = "default_row_terminator")]
    pub row_terminator: String,

    /// Download filename suggested to clients (default: "users.csv")
    #[serde(default = "default_filename")]
    pub filename: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            fields: default_fields(),
            delimiter: default_delimiter(),
            row_terminator: default_row_terminator(),
            filename: default_filename(),
        }
    }
}

/// API server configuration
///
/// Groups settings for the HTTP delivery layer. Used as a nested sub-config
/// within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Bind address for the API server (default: 0.0.0.0:3000)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Whether to add CORS headers to responses (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins; "*" allows any origin (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Whether to serve the interactive Swagger UI (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

/// Main configuration for the export pipeline and its API server
///
/// Fields are organized into logical sub-configs:
/// - [`source`](SourceConfig) — remote API location and fetch behavior
/// - [`csv`](CsvConfig) — output fields, delimiter, terminator
/// - [`server`](ApiConfig) — bind address, CORS, Swagger UI
///
/// All sub-config fields are flattened for serialization, so the JSON/TOML
/// format stays flat (no nesting).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API settings
    #[serde(flatten)]
    pub source: SourceConfig,

    /// CSV output settings
    #[serde(flatten)]
    pub csv: CsvConfig,

    /// API server settings
    #[serde(flatten)]
    pub server: ApiConfig,
}

impl Config {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.source.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {}", self.source.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config {
                message: format!("base_url must be http or https, got '{}'", url.scheme()),
                key: Some("base_url".to_string()),
            });
        }
        if self.source.page_param.is_empty() {
            return Err(Error::Config {
                message: "page_param must not be empty".to_string(),
                key: Some("page_param".to_string()),
            });
        }
        if self.source.records_key.is_empty() {
            return Err(Error::Config {
                message: "records_key must not be empty".to_string(),
                key: Some("records_key".to_string()),
            });
        }
        if self.source.total_pages_key.is_empty() {
            return Err(Error::Config {
                message: "total_pages_key must not be empty".to_string(),
                key: Some("total_pages_key".to_string()),
            });
        }
        if self.csv.fields.is_empty() {
            return Err(Error::Config {
                message: "at least one output field is required".to_string(),
                key: Some("fields".to_string()),
            });
        }
        if self.csv.delimiter.is_empty() {
            return Err(Error::Config {
                message: "delimiter must not be empty".to_string(),
                key: Some("delimiter".to_string()),
            });
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://reqres.in/api/users".to_string()
}

fn default_page_param() -> String {
    "page".to_string()
}

fn default_records_key() -> String {
    "data".to_string()
}

fn default_total_pages_key() -> String {
    "total_pages".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_fields() -> Vec<String> {
    vec!["first_name".to_string(), "last_name".to_string()]
}

fn default_delimiter() -> String {
    ",".to_string()
}

fn default_row_terminator() -> String {
    "\r\n".to_string()
}

fn default_filename() -> String {
    "users.csv".to_string()
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.source.base_url, "https://reqres.in/api/users");
        assert_eq!(config.csv.fields, vec!["first_name", "last_name"]);
        assert_eq!(config.csv.row_terminator, "\r\n");
        assert_eq!(config.source.page_delay_ms, None);
    }

    #[test]
    fn test_empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config.source.page_param, "page");
        assert_eq!(config.source.fetch_timeout_secs, 30);
        assert_eq!(config.csv.filename, "users.csv");
        assert!(config.server.swagger_ui);
    }

    #[test]
    fn test_flattened_keys_deserialize() {
        let config: Config = serde_json::from_str(
            r#"{"base_url": "http://localhost:9000/items", "fields": ["name"], "delimiter": ";"}"#,
        )
        .unwrap();
        assert_eq!(config.source.base_url, "http://localhost:9000/items");
        assert_eq!(config.csv.fields, vec!["name"]);
        assert_eq!(config.csv.delimiter, ";");
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = Config::default();
        config.source.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "base_url"));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        let mut config = Config::default();
        config.source.base_url = "ftp://example.com/users".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_fields_rejected() {
        let mut config = Config::default();
        config.csv.fields.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, Error::Config { key: Some(ref k), .. } if k == "fields"));
    }

    #[test]
    fn test_empty_delimiter_rejected() {
        let mut config = Config::default();
        config.csv.delimiter.clear();
        assert!(config.validate().is_err());
    }
}
