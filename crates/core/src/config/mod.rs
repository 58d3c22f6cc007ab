use std::{env, fmt::Display, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{PortfolioError, Result};

pub const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.spotify.com";
pub const DEFAULT_API_URL: &str = "https://api.spotify.com/v1";

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub spotify: SpotifyConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Required keys
    /// that are absent or empty produce [`PortfolioError::Config`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let server = ServerConfig {
            bind: try_load(&var, "PORTFOLIO_BIND", "0.0.0.0")?,
            port: try_load(&var, "PORTFOLIO_PORT", "3000")?,
            production: try_load::<String, _>(&var, "PORTFOLIO_ENV", "development")?
                .eq_ignore_ascii_case("production"),
        };

        let spotify = SpotifyConfig {
            client_id: required(&var, "SPOTIFY_CLIENT_ID")?,
            client_secret: required(&var, "SPOTIFY_CLIENT_SECRET")?,
            redirect_uri: required(&var, "SPOTIFY_REDIRECT_URI")?,
            refresh_token: var("SPOTIFY_REFRESH_TOKEN"),
            accounts_url: try_load(&var, "SPOTIFY_ACCOUNTS_URL", DEFAULT_ACCOUNTS_URL)?,
            api_url: try_load(&var, "SPOTIFY_API_URL", DEFAULT_API_URL)?,
        };

        let cache = CacheConfig {
            ttl_secs: try_load(&var, "PORTFOLIO_CACHE_TTL_SECS", "3600")?,
            top_limit: try_load(&var, "PORTFOLIO_TOP_LIMIT", "20")?,
        };

        if spotify.refresh_token.is_none() {
            info!("SPOTIFY_REFRESH_TOKEN not set, top-items endpoints will fail until it is");
        }

        Ok(Self {
            server,
            spotify,
            cache,
        })
    }
}

/// Settings for the HTTP listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Production deployments mark cookies `Secure`.
    pub production: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 3000,
            production: false,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Credentials and endpoints for the upstream music provider.
#[derive(Clone, Serialize, Deserialize)]
pub struct SpotifyConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub refresh_token: Option<String>,
    pub accounts_url: String,
    pub api_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_uri: String::new(),
            refresh_token: None,
            accounts_url: DEFAULT_ACCOUNTS_URL.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
        }
    }
}

// Secrets stay out of logs and panic messages.
impl std::fmt::Debug for SpotifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "<redacted>"),
            )
            .field("accounts_url", &self.accounts_url)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Freshness window and page size for the top-items cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub top_limit: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 60 * 60,
            top_limit: 20,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn required<F>(var: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    var(key).ok_or_else(|| PortfolioError::Config(format!("{key} must be set")))
}

fn try_load<T, F>(var: &F, key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| PortfolioError::Config(format!("invalid {key} value: {e}")))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SPOTIFY_CLIENT_ID", "client"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
        ("SPOTIFY_REDIRECT_URI", "http://localhost:3000/api/spotify/callback"),
    ];

    #[test]
    fn fills_defaults_for_optional_values() {
        let config = AppConfig::from_lookup(lookup(&REQUIRED)).unwrap();

        assert_eq!(config.server.port, 3000);
        assert!(!config.server.production);
        assert_eq!(config.spotify.accounts_url, DEFAULT_ACCOUNTS_URL);
        assert_eq!(config.cache.ttl(), Duration::from_secs(3600));
        assert_eq!(config.cache.top_limit, 20);
        assert!(config.spotify.refresh_token.is_none());
    }

    #[test]
    fn reads_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("PORTFOLIO_PORT", "8080"),
            ("PORTFOLIO_ENV", "Production"),
            ("SPOTIFY_REFRESH_TOKEN", "refresh"),
            ("PORTFOLIO_CACHE_TTL_SECS", "60"),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();

        assert_eq!(config.server.address(), "0.0.0.0:8080");
        assert!(config.server.production);
        assert_eq!(config.spotify.refresh_token.as_deref(), Some("refresh"));
        assert_eq!(config.cache.ttl_secs, 60);
    }

    #[test]
    fn rejects_missing_credentials() {
        let err = AppConfig::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(format!("{err}").contains("SPOTIFY_REDIRECT_URI"));
    }

    #[test]
    fn rejects_unparseable_port() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PORTFOLIO_PORT", "eighty"));
        let err = AppConfig::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(matches!(err, PortfolioError::Config(_)));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("SPOTIFY_REFRESH_TOKEN", "very-secret-refresh"));
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        let rendered = format!("{:?}", config.spotify);

        assert!(!rendered.contains("very-secret-refresh"));
        assert!(!rendered.contains("\"secret\""));
    }
}
