//! Client configuration.

use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use tracing::{info, warn};

use crate::types::Uri;

/// Where the `/api` prefix of the web deployment is proxied to.
pub const DEFAULT_API_BASE: &str = "https://api.unoffimap.site";
pub const DEFAULT_GEOCODE_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/geocode/json";
/// Minimum camera movement, in kilometres, that triggers a proximity refetch.
pub const DEFAULT_REFETCH_THRESHOLD_KM: f64 = 20.0;
pub const DEFAULT_SUGGESTION_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_TOKEN_FILE: &str = "unoffimap-session.json";

/// What to do with a proximity response that resolves after a newer one was applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StalePolicy {
    /// Drop responses to requests issued before the last applied one.
    DiscardStale,
    /// Apply every response in completion order.
    LastWriteWins,
}

impl Default for StalePolicy {
    fn default() -> Self {
        StalePolicy::DiscardStale
    }
}

/// Settings shared by the API client, the geocoder and the map view.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use unoffimap::Config;
///
/// let mut config = Config::default();
/// config
///     .refetch_threshold_km(5.0)
///     .suggestion_debounce(Duration::from_millis(150));
/// assert_eq!(config.get_refetch_threshold_km(), 5.0);
/// ```
#[derive(Clone, Debug)]
pub struct Config {
    api_base: Uri,
    geocode_endpoint: Uri,
    geocode_key: Option<String>,
    refetch_threshold_km: f64,
    suggestion_debounce: Duration,
    token_path: PathBuf,
    stale_policy: StalePolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_base: Uri::from_static(DEFAULT_API_BASE),
            geocode_endpoint: Uri::from_static(DEFAULT_GEOCODE_ENDPOINT),
            geocode_key: None,
            refetch_threshold_km: DEFAULT_REFETCH_THRESHOLD_KM,
            suggestion_debounce: DEFAULT_SUGGESTION_DEBOUNCE,
            token_path: PathBuf::from(DEFAULT_TOKEN_FILE),
            stale_policy: StalePolicy::default(),
        }
    }
}

impl Config {
    /// Reads the configuration from `UNOFFIMAP_*` environment variables,
    /// falling back to the defaults for anything unset or invalid.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            api_base: try_load("UNOFFIMAP_API_BASE", defaults.api_base),
            geocode_endpoint: try_load("UNOFFIMAP_GEOCODE_ENDPOINT", defaults.geocode_endpoint),
            geocode_key: env::var("UNOFFIMAP_GEOCODE_KEY").ok().filter(|k| !k.is_empty()),
            refetch_threshold_km: try_load("UNOFFIMAP_REFETCH_KM", defaults.refetch_threshold_km),
            suggestion_debounce: Duration::from_millis(try_load(
                "UNOFFIMAP_DEBOUNCE_MS",
                defaults.suggestion_debounce.as_millis() as u64,
            )),
            token_path: try_load("UNOFFIMAP_TOKEN_PATH", defaults.token_path),
            stale_policy: defaults.stale_policy,
        }
    }

    /// Reset the base URI the backend endpoints are resolved against.
    pub fn api_base(&mut self, api_base: Uri) -> &mut Self {
        self.api_base = api_base;
        self
    }

    /// Reset the reverse geocoding endpoint.
    pub fn geocode_endpoint(&mut self, endpoint: Uri) -> &mut Self {
        self.geocode_endpoint = endpoint;
        self
    }

    /// Set the API key sent to the geocoding service.
    pub fn geocode_key(&mut self, key: impl Into<Option<String>>) -> &mut Self {
        self.geocode_key = key.into();
        self
    }

    /// Set the camera movement that triggers a refetch of nearby places.
    pub fn refetch_threshold_km(&mut self, km: f64) -> &mut Self {
        self.refetch_threshold_km = km;
        self
    }

    /// Set the quiet period before a tag suggestion request goes out.
    pub fn suggestion_debounce(&mut self, delay: Duration) -> &mut Self {
        self.suggestion_debounce = delay;
        self
    }

    /// Set the file the session token is persisted in.
    pub fn token_path(&mut self, path: impl Into<PathBuf>) -> &mut Self {
        self.token_path = path.into();
        self
    }

    pub fn stale_policy(&mut self, policy: StalePolicy) -> &mut Self {
        self.stale_policy = policy;
        self
    }

    pub fn get_api_base(&self) -> &Uri {
        &self.api_base
    }

    pub fn get_geocode_endpoint(&self) -> &Uri {
        &self.geocode_endpoint
    }

    pub fn get_geocode_key(&self) -> Option<&str> {
        self.geocode_key.as_deref()
    }

    pub fn get_refetch_threshold_km(&self) -> f64 {
        self.refetch_threshold_km
    }

    pub fn get_suggestion_debounce(&self) -> Duration {
        self.suggestion_debounce
    }

    pub fn get_token_path(&self) -> &PathBuf {
        &self.token_path
    }

    pub fn get_stale_policy(&self) -> StalePolicy {
        self.stale_policy
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|e| {
            warn!("Invalid {key} value {raw:?}: {e}, using default: {default:?}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default:?}");
            default
        }
    }
}
