//! Engine configuration
//!
//! Timing windows and remote credentials. Credentials are read once at
//! startup ([`SyncConfig::from_env`]) and checked by every remote-fetching
//! operation through [`SyncConfig::require_credentials`].

use std::fmt;
use std::time::Duration;

/// Environment variable holding the workspace id
pub const WORKSPACE_ID_ENV: &str = "BOARDSYNC_WORKSPACE_ID";

/// Environment variable holding the API token
pub const API_TOKEN_ENV: &str = "BOARDSYNC_API_TOKEN";

/// Key under which engine state is persisted
pub const DEFAULT_STORAGE_KEY: &str = "boardsync-state";

/// Snapshots older than this are refetched with a blocking load
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Snapshots older than this are served and refreshed in the background
pub const DEFAULT_STALENESS_THRESHOLD: Duration = Duration::from_secs(2 * 60);

/// Period of the background sync timer
pub const DEFAULT_PERIODIC_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Delay before the reconcile refresh that follows a structural change
pub const DEFAULT_RECONCILE_DELAY: Duration = Duration::from_secs(2);

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Workspace id not configured
    #[error("workspace id is not configured (set {WORKSPACE_ID_ENV})")]
    MissingWorkspaceId,

    /// API token not configured
    #[error("API token is not configured (set {API_TOKEN_ENV})")]
    MissingApiToken,

    /// Timing windows are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Remote API token; never printed
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Wrap a token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token, for the transport layer
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

/// Credentials borrowed from a validated [`SyncConfig`]
#[derive(Debug, Clone, Copy)]
pub struct Credentials<'a> {
    /// Workspace that owns the boards
    pub workspace_id: &'a str,
    /// API token
    pub api_token: &'a ApiToken,
}

/// Synchronization engine configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Workspace that owns the boards
    pub workspace_id: Option<String>,
    /// Remote API token
    pub api_token: Option<ApiToken>,
    /// Maximum snapshot age served without a blocking fetch
    pub freshness_window: Duration,
    /// Snapshot age past which a background refresh is triggered
    pub staleness_threshold: Duration,
    /// Background sync period
    pub periodic_interval: Duration,
    /// Delay before the reconcile refresh after structural module changes
    pub reconcile_delay: Duration,
    /// Persistence key
    pub storage_key: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workspace_id: None,
            api_token: None,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            staleness_threshold: DEFAULT_STALENESS_THRESHOLD,
            periodic_interval: DEFAULT_PERIODIC_INTERVAL,
            reconcile_delay: DEFAULT_RECONCILE_DELAY,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl SyncConfig {
    /// Defaults with no credentials
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with credentials read from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults with credentials read through `lookup`; blank values count
    /// as missing
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        Self {
            workspace_id: read(WORKSPACE_ID_ENV),
            api_token: read(API_TOKEN_ENV).map(ApiToken::new),
            ..Self::default()
        }
    }

    /// With credentials
    #[must_use]
    pub fn with_credentials(
        mut self,
        workspace_id: impl Into<String>,
        api_token: impl Into<String>,
    ) -> Self {
        self.workspace_id = Some(workspace_id.into());
        self.api_token = Some(ApiToken::new(api_token));
        self
    }

    /// With freshness window
    #[must_use]
    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// With staleness threshold
    #[must_use]
    pub fn with_staleness_threshold(mut self, threshold: Duration) -> Self {
        self.staleness_threshold = threshold;
        self
    }

    /// With periodic sync interval
    #[must_use]
    pub fn with_periodic_interval(mut self, interval: Duration) -> Self {
        self.periodic_interval = interval;
        self
    }

    /// With reconcile delay
    #[must_use]
    pub fn with_reconcile_delay(mut self, delay: Duration) -> Self {
        self.reconcile_delay = delay;
        self
    }

    /// With persistence key
    #[must_use]
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    /// Check timing windows
    ///
    /// # Errors
    /// `ConfigError::Invalid` when the staleness threshold exceeds the
    /// freshness window or the periodic interval is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.staleness_threshold > self.freshness_window {
            return Err(ConfigError::Invalid(format!(
                "staleness threshold {:?} exceeds freshness window {:?}",
                self.staleness_threshold, self.freshness_window
            )));
        }
        if self.periodic_interval.is_zero() {
            return Err(ConfigError::Invalid("periodic interval must be non-zero".into()));
        }
        Ok(())
    }

    /// Credentials, or the first missing one
    ///
    /// # Errors
    /// `MissingWorkspaceId` or `MissingApiToken`.
    pub fn require_credentials(&self) -> Result<Credentials<'_>, ConfigError> {
        let workspace_id = self
            .workspace_id
            .as_deref()
            .ok_or(ConfigError::MissingWorkspaceId)?;
        let api_token = self.api_token.as_ref().ok_or(ConfigError::MissingApiToken)?;
        Ok(Credentials {
            workspace_id,
            api_token,
        })
    }
}
