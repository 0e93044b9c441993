//! Credential value held by authenticators.

use std::fmt;

use crate::config::{EXPIRY_SAFETY_MARGIN, REFRESH_WINDOW_FRACTION};

/// An authentication secret and the timestamps that govern its refresh.
///
/// Credentials are replaced wholesale on refresh, never mutated.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    secret: String,
    /// Unix timestamp when the secret stops working; `None` = never.
    expires_at: Option<i64>,
    /// Unix timestamp after which a refresh should be attempted.
    refresh_at: Option<i64>,
}

impl Credential {
    /// A secret that never expires (static API keys, user-managed tokens).
    pub fn never_expires(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            expires_at: None,
            refresh_at: None,
        }
    }

    /// A token valid until `expires_at`, issued with a lifetime of
    /// `lifetime_secs`. Refresh is due once 80% of the lifetime has elapsed.
    pub fn expiring(secret: impl Into<String>, expires_at: i64, lifetime_secs: i64) -> Self {
        let window = (lifetime_secs.max(0) as f64 * REFRESH_WINDOW_FRACTION) as i64;
        Self {
            secret: secret.into(),
            expires_at: Some(expires_at),
            refresh_at: Some(expires_at - window),
        }
    }

    /// A token with explicit expiry and refresh timestamps.
    pub fn with_timestamps(secret: impl Into<String>, expires_at: i64, refresh_at: i64) -> Self {
        Self {
            secret: secret.into(),
            expires_at: Some(expires_at),
            refresh_at: Some(refresh_at.min(expires_at)),
        }
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.expires_at
    }

    pub fn refresh_at(&self) -> Option<i64> {
        self.refresh_at
    }

    /// Check if the secret is expired (with safety margin).
    #[must_use]
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(exp) => {
                let now = chrono::Utc::now().timestamp();
                exp <= now + EXPIRY_SAFETY_MARGIN.as_secs() as i64
            }
            None => false,
        }
    }

    /// Check if the secret should be replaced before use.
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        if self.secret.is_empty() || self.is_expired() {
            return true;
        }
        match self.refresh_at {
            Some(at) => at <= chrono::Utc::now().timestamp(),
            None => false,
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("secret", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .field("refresh_at", &self.refresh_at)
            .finish()
    }
}
