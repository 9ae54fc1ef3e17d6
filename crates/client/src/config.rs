//! Client configuration.

use reqwest::Url;

use crate::error::{ClientError, ClientResult};

/// Backend used when `RIDEBOOK_API_URL` is unset.
pub const DEV_API_URL: &str = "http://localhost:3000/api";

/// Where the backend lives and which auth endpoints it exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    pub login_path: String,
    pub register_path: String,
    pub logout_path: String,
    pub refresh_path: String,
    pub whoami_path: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL '{base_url}': {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Config(format!("'{base_url}' cannot be a base URL")));
        }
        // `Url::join` replaces the last segment unless the base ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            login_path: "auth/login".to_string(),
            register_path: "auth/register".to_string(),
            logout_path: "auth/logout".to_string(),
            refresh_path: "auth/refresh".to_string(),
            whoami_path: "auth/me".to_string(),
        })
    }

    /// Read `RIDEBOOK_API_URL`, falling back to the local development backend.
    pub fn from_env() -> ClientResult<Self> {
        let base_url = std::env::var("RIDEBOOK_API_URL").unwrap_or_else(|_| {
            tracing::warn!("RIDEBOOK_API_URL not set; using {DEV_API_URL}");
            DEV_API_URL.to_string()
        });
        Self::new(&base_url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> ClientResult<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::Config(format!("invalid endpoint path '{path}': {e}")))
    }
}
