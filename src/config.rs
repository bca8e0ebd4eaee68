// Runtime configuration. Everything comes from environment variables with a
// hard-coded fallback so the binary runs against a local service out of the box.

/// Default location of the extraction service (the Flask dev server port).
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000";

/// Fixed path of the extraction endpoint on the service.
pub const EXTRACT_PATH: &str = "/extract-data";

/// Log filter used when neither `RUST_LOG` nor `PASSPORT_EXTRACT_LOG` is set.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base URL of the extraction service, without trailing slash.
    pub service_url: String,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl Config {
    /// Read `EXTRACTION_SERVICE_URL` and `PASSPORT_EXTRACT_LOG`, falling back
    /// to the defaults above.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let service_url = lookup("EXTRACTION_SERVICE_URL")
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .unwrap_or(defaults.service_url);
        let log_level = lookup("PASSPORT_EXTRACT_LOG")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.log_level);
        Self {
            service_url,
            log_level,
        }
    }

    /// Full URL of `POST /extract-data`.
    pub fn extract_url(&self) -> String {
        format!("{}{}", self.service_url, EXTRACT_PATH)
    }
}
