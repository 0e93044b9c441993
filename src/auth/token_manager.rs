//! Token lifecycle manager.
//!
//! Caches a [`Credential`] obtained from a [`TokenSource`] and refreshes it
//! when it enters its refresh window. Thread-safe: the credential sits behind
//! a `tokio::sync::RwLock`, and refresh happens under the write lock with a
//! re-check, so concurrent callers share a single token request.

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{AuthScheme, Authenticator, Credential};
use crate::error::{Error, ErrorKind, Result};
use crate::request::PendingRequest;

/// Something that can issue a fresh bearer token.
#[async_trait]
pub trait TokenSource: Send + Sync + std::fmt::Debug {
    /// Request a new token. Always performs a round trip.
    async fn fetch(&self) -> Result<Credential>;

    /// Name for logs (e.g. `iam`).
    fn name(&self) -> &str;

    fn scheme(&self) -> AuthScheme {
        AuthScheme::BearerToken
    }

    /// Check configuration without contacting the token endpoint.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Manages the token lifecycle for one [`TokenSource`].
#[derive(Debug)]
pub struct TokenManager<S> {
    source: S,
    credential: RwLock<Option<Credential>>,
}

impl<S: TokenSource> TokenManager<S> {
    /// Create a manager with no token yet; the first call fetches one.
    pub fn new(source: S) -> Self {
        Self {
            source,
            credential: RwLock::new(None),
        }
    }

    /// Create a manager seeded with an existing credential.
    pub fn with_credential(source: S, credential: Credential) -> Self {
        Self {
            source,
            credential: RwLock::new(Some(credential)),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a valid token, refreshing if necessary.
    ///
    /// Returns the cached token without any network I/O while it is outside
    /// its refresh window.
    pub async fn token(&self) -> Result<String> {
        {
            let current = self.credential.read().await;
            if let Some(credential) = current.as_ref()
                && !credential.needs_refresh()
            {
                return Ok(credential.secret().to_string());
            }
        }

        self.refresh(false).await
    }

    /// Fetch a new token even if the cached one looks valid (e.g. after a 401).
    pub async fn force_refresh(&self) -> Result<String> {
        info!(source = self.source.name(), "Force refresh requested");
        self.refresh(true).await
    }

    /// Drop the cached token; the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.credential.write().await = None;
    }

    /// Snapshot of the cached credential.
    pub async fn credential(&self) -> Option<Credential> {
        self.credential.read().await.clone()
    }

    async fn refresh(&self, force: bool) -> Result<String> {
        let mut current = self.credential.write().await;

        // Double-check: another task may have refreshed while we waited for the lock
        if !force
            && let Some(credential) = current.as_ref()
            && !credential.needs_refresh()
        {
            debug!(source = self.source.name(), "Token refreshed by another task");
            return Ok(credential.secret().to_string());
        }

        debug!(source = self.source.name(), "Requesting new token");
        let fetched = match self.source.fetch().await {
            Ok(fresh) if fresh.secret().is_empty() => Err(Error::authentication(
                format!("{} token endpoint returned an empty token", self.source.name()),
                None,
            )),
            Ok(fresh) => Ok(fresh),
            Err(e) => Err(as_authentication_error(self.source.name(), e)),
        };
        let fresh = match fetched {
            Ok(fresh) => fresh,
            Err(e) => {
                // An early refresh may fail while the cached token is still usable.
                if !force
                    && let Some(credential) = current.as_ref()
                    && !credential.is_expired()
                {
                    warn!(
                        source = self.source.name(),
                        error = %e,
                        "Token refresh failed; using current token until it expires"
                    );
                    return Ok(credential.secret().to_string());
                }
                warn!(source = self.source.name(), error = %e, "Token request failed");
                return Err(e);
            }
        };

        let secret = fresh.secret().to_string();
        info!(
            source = self.source.name(),
            expires_at = ?fresh.expires_at(),
            "Token refreshed successfully"
        );
        *current = Some(fresh);
        Ok(secret)
    }
}

fn as_authentication_error(source: &str, error: Error) -> Error {
    if error.kind() == ErrorKind::Authentication {
        return error;
    }
    let status = error.status();
    Error::authentication(format!("{source} token request failed: {error}"), status)
}

/// Bearer-token authenticator backed by a [`TokenManager`].
#[derive(Debug)]
pub struct TokenAuthenticator<S> {
    manager: TokenManager<S>,
}

impl<S: TokenSource> TokenAuthenticator<S> {
    pub fn new(source: S) -> Self {
        Self {
            manager: TokenManager::new(source),
        }
    }

    pub fn from_manager(manager: TokenManager<S>) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &TokenManager<S> {
        &self.manager
    }
}

#[async_trait]
impl<S: TokenSource> Authenticator for TokenAuthenticator<S> {
    fn scheme(&self) -> AuthScheme {
        self.manager.source().scheme()
    }

    fn validate(&self) -> Result<()> {
        self.manager.source().validate()
    }

    async fn authenticate(&self, request: PendingRequest) -> Result<PendingRequest> {
        let token = self.manager.token().await?;
        request.with_sensitive_header(
            reqwest::header::AUTHORIZATION.as_str(),
            &format!("Bearer {token}"),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;

    #[derive(Debug, Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl TokenSource for CountingSource {
        async fn fetch(&self) -> Result<Credential> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            // Widen the race window so concurrent callers pile up on the lock.
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(Error::Transport("connection refused".into()));
            }
            let now = chrono::Utc::now().timestamp();
            Ok(Credential::expiring(format!("token-{n}"), now + 3600, 3600))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn expired() -> Credential {
        let now = chrono::Utc::now().timestamp();
        Credential::expiring("stale", now - 10, 3600)
    }

    #[tokio::test]
    async fn test_first_call_fetches_then_caches() {
        let manager = TokenManager::new(CountingSource::default());
        assert_eq!(manager.token().await.unwrap(), "token-1");
        assert_eq!(manager.token().await.unwrap(), "token-1");
        assert_eq!(manager.source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_flight() {
        let manager = Arc::new(TokenManager::with_credential(
            CountingSource::default(),
            expired(),
        ));

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                tokio::spawn(async move { manager.token().await })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "token-1");
        }
        assert_eq!(manager.source().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_always_fetches() {
        let manager = TokenManager::new(CountingSource::default());
        manager.token().await.unwrap();
        assert_eq!(manager.force_refresh().await.unwrap(), "token-2");
        assert_eq!(manager.source().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let manager = TokenManager::new(CountingSource::default());
        manager.token().await.unwrap();
        manager.invalidate().await;
        assert!(manager.credential().await.is_none());
        assert_eq!(manager.token().await.unwrap(), "token-2");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_authentication_error() {
        let manager = TokenManager::new(CountingSource {
            fail: true,
            ..Default::default()
        });
        let err = manager.token().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert!(manager.credential().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_credential() {
        let manager = TokenManager::with_credential(
            CountingSource {
                fail: true,
                ..Default::default()
            },
            expired(),
        );
        assert!(manager.token().await.is_err());
        assert_eq!(manager.credential().await.unwrap().secret(), "stale");
    }

    #[tokio::test]
    async fn test_failed_early_refresh_serves_unexpired_token() {
        let now = chrono::Utc::now().timestamp();
        // Ten minutes left of an hour: inside the refresh window, not expired.
        let manager = TokenManager::with_credential(
            CountingSource {
                fail: true,
                ..Default::default()
            },
            Credential::expiring("still-valid", now + 600, 3600),
        );

        assert_eq!(manager.token().await.unwrap(), "still-valid");
        assert_eq!(manager.token().await.unwrap(), "still-valid");
        assert_eq!(manager.source().calls.load(Ordering::SeqCst), 2);

        let err = manager.force_refresh().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authentication);
    }
}
