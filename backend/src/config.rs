//! Server settings read from the environment.
//!
//! | Variable            | Default   |
//! |---------------------|-----------|
//! | `HOST`              | `0.0.0.0` |
//! | `PORT`              | `8080`    |
//! | `PAGE_SIZE`         | `10`      |
//! | `MAX_BODY_BYTES`    | `1048576` |
//! | `CORS_ALLOW_ORIGIN` | `*`       |
//!
//! Repository selection lives in [`crate::db`].

use std::fmt::Display;
use std::str::FromStr;

use crate::models::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// Which origins the CORS layer admits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl FromStr for CorsOrigins {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == "*" {
            return Ok(Self::Any);
        }
        let origins: Vec<String> = s
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if let Some(bad) = origins
            .iter()
            .find(|o| !(o.starts_with("http://") || o.starts_with("https://")))
        {
            return Err(format!("invalid CORS origin '{}'", bad));
        }
        Ok(Self::List(origins))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Page size used when a listing request does not name one.
    pub page_size: u32,
    pub max_body_bytes: usize,
    pub cors_origins: CorsOrigins,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            page_size: DEFAULT_PAGE_SIZE,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            cors_origins: CorsOrigins::Any,
        }
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| format!("invalid {} '{}': {}", key, raw, e)),
        _ => Ok(default),
    }
}

impl ServerConfig {
    /// Read settings from process environment variables.
    ///
    /// Unset variables take their defaults; values that do not parse are an error.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let defaults = Self::default();
        let host = lookup("HOST")
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or(defaults.host);

        let page_size: u32 = parse_or(&lookup, "PAGE_SIZE", defaults.page_size)?;
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(format!(
                "PAGE_SIZE must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, page_size
            ));
        }

        Ok(Self {
            host,
            port: parse_or(&lookup, "PORT", defaults.port)?,
            page_size,
            max_body_bytes: parse_or(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            cors_origins: parse_or(&lookup, "CORS_ALLOW_ORIGIN", defaults.cors_origins)?,
        })
    }

    /// `host:port`, ready for `SocketAddr` parsing.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
