//! Authenticated HTTP transport.
//!
//! Attaches credentials from the session, and recovers from an expired access
//! token at most once per request: on a 401 it runs the (coalesced) refresh
//! protocol and resends the request a single time. Every other failure is
//! returned as-is.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use ridebook_auth::{Identity, IdentityClaims};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult, backend_message};
use crate::refresh::RefreshCoordinator;
use crate::session::{AccessToken, SessionStore};

/// How an endpoint authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Credentials {
    /// Bearer access token from the session (cookies are still sent).
    #[default]
    Bearer,
    /// HTTP-only cookies alone (auth endpoints). A 401 here is final.
    Cookie,
}

/// A request description, independent of how many times it is sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<serde_json::Value>,
    credentials: Credentials,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            credentials: Credentials::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    pub fn json<B: serde::Serialize + ?Sized>(mut self, body: &B) -> ClientResult<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::validation(format!("unserializable request body: {e}")))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Which send of a request this is. At most one retry exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    AfterRefresh,
}

impl Attempt {
    pub fn number(self) -> u8 {
        match self {
            Attempt::Initial => 1,
            Attempt::AfterRefresh => 2,
        }
    }

    /// The attempt that follows a successful refresh, if one is still allowed.
    pub fn next(self) -> Option<Attempt> {
        match self {
            Attempt::Initial => Some(Attempt::AfterRefresh),
            Attempt::AfterRefresh => None,
        }
    }
}

/// Successful (2xx) response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> ClientResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.body.iter().all(u8::is_ascii_whitespace)
    }
}

enum Outcome {
    Complete(ApiResponse),
    /// 401, with the backend's message if it sent one.
    Unauthenticated(Option<String>),
}

/// Body of the refresh endpoint.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    #[serde(alias = "access_token", alias = "token")]
    access_token: String,
    #[serde(default)]
    user: Option<IdentityClaims>,
}

#[derive(Debug)]
pub struct Transport {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
    session: SessionStore,
    refresh: RefreshCoordinator,
}

impl Transport {
    pub fn new(config: Arc<ClientConfig>, session: SessionStore) -> ClientResult<Self> {
        // The cookie store carries the HTTP-only refresh cookie; it is never read here.
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .map_err(|e| ClientError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            config,
            session,
            refresh: RefreshCoordinator::default(),
        })
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a request, recovering once from an expired access token.
    pub async fn send(&self, request: &ApiRequest) -> ClientResult<ApiResponse> {
        let sent_under = self.session.generation();
        match self.attempt(request, Attempt::Initial).await? {
            Outcome::Complete(response) => Ok(response),
            Outcome::Unauthenticated(message) if request.credentials == Credentials::Cookie => {
                Err(ClientError::Unauthenticated { message })
            }
            Outcome::Unauthenticated(_) => self.retry(request, Attempt::Initial, sent_under).await,
        }
    }

    /// Send and decode a JSON body.
    pub async fn send_json<T: DeserializeOwned>(&self, request: &ApiRequest) -> ClientResult<T> {
        self.send(request).await?.json()
    }

    async fn retry(
        &self,
        request: &ApiRequest,
        failed: Attempt,
        sent_under: u64,
    ) -> ClientResult<ApiResponse> {
        let Some(attempt) = failed.next() else {
            return Err(self.give_up(request, failed, sent_under, None));
        };

        self.recover(sent_under).await?;

        let retried_under = self.session.generation();
        match self.attempt(request, attempt).await? {
            Outcome::Complete(response) => Ok(response),
            Outcome::Unauthenticated(message) => {
                Err(self.give_up(request, attempt, retried_under, message))
            }
        }
    }

    /// Final 401. The session is only cleared if it is still the one the
    /// request was sent under; a newer sign-in is left alone.
    fn give_up(
        &self,
        request: &ApiRequest,
        attempt: Attempt,
        sent_under: u64,
        message: Option<String>,
    ) -> ClientError {
        if self.session.generation() == sent_under {
            tracing::warn!(
                method = %request.method,
                path = %request.path,
                attempt = attempt.number(),
                "still unauthenticated after refresh; clearing session"
            );
            self.session.clear();
        } else {
            tracing::debug!(
                method = %request.method,
                path = %request.path,
                "stale request rejected; session already replaced"
            );
        }
        ClientError::Unauthenticated { message }
    }

    /// Make the session usable again after a 401 on a request sent under `sent_under`.
    async fn recover(&self, sent_under: u64) -> ClientResult<()> {
        self.refresh.run(|| self.perform_refresh(sent_under)).await
    }

    /// Run the refresh protocol, joining one already in flight.
    ///
    /// Failure clears the session and yields `Unauthenticated`.
    pub async fn refresh_session(&self) -> ClientResult<()> {
        self.recover(self.session.generation()).await
    }

    async fn perform_refresh(&self, seen: u64) -> ClientResult<()> {
        let started_under = self.session.generation();
        if started_under != seen {
            // The session was replaced after the caller's request went out.
            return if self.session.access_token().is_some() {
                tracing::debug!("session replaced since request was sent; resending");
                Ok(())
            } else {
                Err(ClientError::unauthenticated())
            };
        }

        tracing::info!("refreshing session");
        match self.request_new_token().await {
            Ok((token, identity)) => {
                if self.session.replace(started_under, token, identity) {
                    Ok(())
                } else {
                    Err(ClientError::unauthenticated())
                }
            }
            Err(err) => {
                tracing::error!(error = %err, "session refresh failed");
                if self.session.generation() == started_under {
                    self.session.clear();
                }
                Err(ClientError::unauthenticated())
            }
        }
    }

    async fn request_new_token(&self) -> ClientResult<(AccessToken, Option<Identity>)> {
        let url = self.config.endpoint(&self.config.refresh_path)?;
        let response = self
            .http
            .post(url)
            .header("x-request-id", Uuid::now_v7().to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        let refreshed: RefreshResponse =
            serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
        let token = AccessToken::new(refreshed.access_token)
            .ok_or_else(|| ClientError::Decode("refresh returned an empty access token".into()))?;
        let identity = refreshed.user.map(|claims| claims.validate()).transpose()?;

        Ok((token, identity))
    }

    async fn attempt(&self, request: &ApiRequest, attempt: Attempt) -> ClientResult<Outcome> {
        let url = self.config.endpoint(&request.path)?;
        let request_id = Uuid::now_v7();

        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .header("x-request-id", request_id.to_string());
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if request.credentials == Credentials::Bearer {
            if let Some(token) = self.session.access_token() {
                builder = builder.bearer_auth(token.expose());
            }
        }

        tracing::debug!(
            %request_id,
            method = %request.method,
            path = %request.path,
            attempt = attempt.number(),
            "dispatching request"
        );

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if status == StatusCode::UNAUTHORIZED {
            tracing::debug!(%request_id, attempt = attempt.number(), "request unauthenticated");
            return Ok(Outcome::Unauthenticated(backend_message(&body)));
        }
        if !status.is_success() {
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        Ok(Outcome::Complete(ApiResponse {
            status: status.as_u16(),
            body: body.to_vec(),
        }))
    }
}
