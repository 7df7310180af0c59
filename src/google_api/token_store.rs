//! OAuth token storage.
//!
//! The credentials file is read lazily on first use and never written back.
//! Refreshed access tokens live in memory for the life of the process;
//! concurrent refreshes are serialized so only one hits the token endpoint.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;

use super::{is_token_expired, refresh_access_token, GoogleApiError, GoogleToken};

pub struct TokenStore {
    path: PathBuf,
    current: parking_lot::Mutex<Option<GoogleToken>>,
    refresh_lock: Mutex<()>,
    http: reqwest::Client,
}

impl TokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: parking_lot::Mutex::new(None),
            refresh_lock: Mutex::new(()),
            http: reqwest::Client::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get a valid access token, refreshing if expired.
    pub async fn access_token(&self) -> Result<String, GoogleApiError> {
        if let Some(token) = self.cached_valid() {
            return Ok(token);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have refreshed while we waited.
        if let Some(token) = self.cached_valid() {
            return Ok(token);
        }

        let existing = self.current.lock().clone();
        let base = match existing {
            Some(token) => token,
            None => load_token_file(&self.path)?,
        };
        if !is_token_expired(&base) {
            let access = base.token.clone();
            *self.current.lock() = Some(base);
            return Ok(access);
        }

        log::info!("Refreshing Google access token");
        let refreshed = refresh_access_token(&self.http, &base).await?;
        let access = refreshed.token.clone();
        *self.current.lock() = Some(refreshed);
        Ok(access)
    }

    /// Drop the in-memory access token so the next call refreshes.
    pub fn invalidate(&self) {
        if let Some(token) = self.current.lock().as_mut() {
            token.expiry = None;
        }
    }

    fn cached_valid(&self) -> Option<String> {
        self.current
            .lock()
            .as_ref()
            .filter(|token| !is_token_expired(token))
            .map(|token| token.token.clone())
    }
}

fn load_token_file(path: &Path) -> Result<GoogleToken, GoogleApiError> {
    if !path.exists() {
        return Err(GoogleApiError::CredentialsNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| GoogleApiError::InvalidCredentials(format!("{}: {}", path.display(), e)))
}
