//! OAuth sign-in callback.
//!
//! The backend redirects to the client with `token`, `refresh_token` and a
//! URL-encoded JSON `user` in the query string. Only the access token and the
//! validated identity are kept; the refresh token lives in the HTTP-only
//! cookie and is never stored here.

use reqwest::Url;

use ridebook_auth::{Identity, IdentityClaims};

use crate::error::{ClientError, ClientResult};
use crate::session::AccessToken;

/// Base for callbacks handed over as a bare path (`/oauth/callback?...`).
const RELATIVE_BASE: &str = "http://callback.invalid/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthCallback {
    pub access_token: AccessToken,
    pub identity: Identity,
}

/// Decode and validate a callback URL.
pub fn parse_callback(callback: &str) -> ClientResult<OAuthCallback> {
    let url = match Url::parse(callback) {
        Ok(url) => url,
        Err(_) => Url::parse(RELATIVE_BASE)
            .and_then(|base| base.join(callback))
            .map_err(|e| ClientError::InvalidCallback(format!("unparseable URL: {e}")))?,
    };

    let mut token = None;
    let mut user = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "token" => token = Some(value.into_owned()),
            "user" => user = Some(value.into_owned()),
            _ => {}
        }
    }

    let access_token = token
        .and_then(AccessToken::new)
        .ok_or_else(|| ClientError::InvalidCallback("missing access token".into()))?;
    let raw_user = user.ok_or_else(|| ClientError::InvalidCallback("missing user".into()))?;

    let identity = IdentityClaims::from_json(&raw_user)
        .and_then(|claims| claims.validate())
        .map_err(|e| ClientError::InvalidCallback(e.to_string()))?;

    tracing::debug!(user_id = %identity.id, role = %identity.role, "accepted OAuth callback");
    Ok(OAuthCallback {
        access_token,
        identity,
    })
}
