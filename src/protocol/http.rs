// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Authenticated HTTP client for the SmartCocoon cloud API.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use crate::error::{Error, RequestError, Result};
use crate::protocol::auth::{Credential, TokenStore, build_headers};
use crate::protocol::retry::{Failure, RetryPolicy, StatusClass, classify};
use crate::response::{FanRecord, decode_list};
use crate::types::{EntityType, FanMode, FanSpeed};

// ============================================================================
// ApiConfig - Connection settings for the cloud API
// ============================================================================

/// Configuration for the cloud API client.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::protocol::ApiConfig;
/// use smartcocoon_lib::types::FanSpeed;
/// use std::time::Duration;
///
/// let config = ApiConfig::new()
///     .with_timeout(Duration::from_secs(10))
///     .with_default_speed(FanSpeed::new(40).unwrap());
///
/// assert_eq!(config.url("fans"), "https://app.mysmartcocoon.com/api/fans");
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    base_url: String,
    timeout: Duration,
    user_agent: String,
    default_speed: FanSpeed,
    retry_unit: Duration,
}

impl ApiConfig {
    /// Production API root.
    pub const DEFAULT_BASE_URL: &'static str = "https://app.mysmartcocoon.com/api";
    /// User agent of the official mobile app.
    pub const DEFAULT_USER_AGENT: &'static str =
        "SmartCocoon/12601 CFNetwork/1568.300.101 Darwin/24.2.0";
    /// Default per-attempt timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Environment variable overriding the API root.
    pub const ENV_BASE_URL: &'static str = "SMARTCOCOON_API_URL";
    /// Environment variable overriding the timeout, in seconds.
    pub const ENV_TIMEOUT: &'static str = "SMARTCOCOON_REQUEST_TIMEOUT";
    /// Environment variable overriding the default activation speed.
    pub const ENV_DEFAULT_SPEED: &'static str = "SMARTCOCOON_DEFAULT_SPEED";

    const SIGN_IN_PATH: &'static str = "auth/sign_in";

    /// Creates the default configuration for the production API.
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            user_agent: Self::DEFAULT_USER_AGENT.to_string(),
            default_speed: FanSpeed::DEFAULT_ACTIVATION,
            retry_unit: RetryPolicy::DEFAULT_UNIT,
        }
    }

    /// Reads overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is set but malformed.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads overrides through `lookup`, which maps a variable name to its
    /// value.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a value is malformed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new();

        if let Some(url) = lookup(Self::ENV_BASE_URL) {
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup(Self::ENV_TIMEOUT) {
            let seconds: u64 = raw.trim().parse().map_err(|_| {
                Error::Config(format!("{} must be whole seconds, got {raw:?}", Self::ENV_TIMEOUT))
            })?;
            config = config.with_timeout(Duration::from_secs(seconds));
        }

        if let Some(raw) = lookup(Self::ENV_DEFAULT_SPEED) {
            let speed = raw
                .trim()
                .parse::<u8>()
                .ok()
                .and_then(|v| FanSpeed::new(v).ok())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{} must be a percentage (0-100), got {raw:?}",
                        Self::ENV_DEFAULT_SPEED
                    ))
                })?;
            config = config.with_default_speed(speed);
        }

        Ok(config)
    }

    /// Sets the API root, e.g. a mock server in tests.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the `User-Agent` header.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the speed used when a stopped fan is switched on.
    #[must_use]
    pub fn with_default_speed(mut self, speed: FanSpeed) -> Self {
        self.default_speed = speed;
        self
    }

    /// Sets the backoff unit (one second by default).
    #[must_use]
    pub fn with_retry_unit(mut self, unit: Duration) -> Self {
        self.retry_unit = unit;
        self
    }

    /// Returns the API root.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-attempt timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the `User-Agent` header value.
    #[must_use]
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Returns the default activation speed.
    #[must_use]
    pub fn default_speed(&self) -> FanSpeed {
        self.default_speed
    }

    /// Returns the backoff unit.
    #[must_use]
    pub fn retry_unit(&self) -> Duration {
        self.retry_unit
    }

    /// Resolves a path against the API root.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Returns the sign-in endpoint.
    #[must_use]
    pub fn sign_in_url(&self) -> String {
        self.url(Self::SIGN_IN_PATH)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// ApiClient - Authenticated request pipeline
// ============================================================================

#[derive(Clone)]
struct Login {
    email: String,
    password: String,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub(crate) struct ApiResponse {
    pub(crate) headers: HeaderMap,
    /// `Null` when the body was empty.
    pub(crate) body: serde_json::Value,
}

/// Client for the SmartCocoon cloud API.
///
/// Every call is attempted up to three times. 429, 5xx, connection failures
/// and per-attempt timeouts are retried with backoff; 401/403 surface at
/// once as [`Error::Unauthorized`]; anything else fails immediately.
///
/// [`send`](Self::send) and the typed helpers add one serialized
/// re-authentication when the server refuses the token, using the login
/// remembered by [`authenticate`](Self::authenticate).
///
/// # Examples
///
/// ```no_run
/// use smartcocoon_lib::protocol::{ApiClient, ApiConfig};
/// use smartcocoon_lib::response::Room;
/// use smartcocoon_lib::types::EntityType;
///
/// # async fn example() -> smartcocoon_lib::Result<()> {
/// let client = ApiClient::new(ApiConfig::new())?;
///
/// if client.authenticate("me@example.com", "hunter2").await? {
///     let rooms: Vec<Room> = client.list(EntityType::Rooms).await?;
///     println!("{} rooms", rooms.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    config: ApiConfig,
    retry: RetryPolicy,
    tokens: TokenStore,
    login: RwLock<Option<Login>>,
    refresh_lock: Mutex<()>,
}

impl ApiClient {
    /// Creates a client with its own connection pool.
    ///
    /// The pool is released when the client is dropped.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be created.
    pub fn new(config: ApiConfig) -> Result<Self> {
        let http = Client::builder().build().map_err(RequestError::Http)?;
        Ok(Self::with_http_client(http, config))
    }

    /// Creates a client on top of an externally owned `reqwest::Client`.
    ///
    /// The caller's pool stays usable after this client is dropped.
    #[must_use]
    pub fn with_http_client(http: Client, config: ApiConfig) -> Self {
        let retry = RetryPolicy::new().with_unit(config.retry_unit());
        Self {
            http,
            config,
            retry,
            tokens: TokenStore::new(),
            login: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Returns a copy of the current credential.
    #[must_use]
    pub fn credential(&self) -> Option<Credential> {
        self.tokens.get()
    }

    /// Returns the authenticated user's numeric id.
    #[must_use]
    pub fn user_id(&self) -> Option<i64> {
        self.tokens.get().map(|c| c.user_id())
    }

    /// Returns true if an unexpired credential is held.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens.is_valid(Utc::now())
    }

    /// Signs in with email and password.
    ///
    /// Returns `Ok(false)` when the server answered 2xx but without the
    /// `access-token`, `expiry` and `client` headers or without the user's
    /// id and email; nothing is stored in that case. On success the login
    /// is remembered for automatic re-authentication.
    ///
    /// # Errors
    ///
    /// Returns an error if the sign-in request itself fails.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<bool> {
        self.tokens.clear();

        let authenticated = self.sign_in(username, password).await?;
        if authenticated {
            *self.login.write() = Some(Login {
                email: username.to_string(),
                password: password.to_string(),
            });
        }
        Ok(authenticated)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<bool> {
        let body = serde_json::json!({ "email": username, "password": password });
        let url = self.config.sign_in_url();
        let response = self.execute(Method::POST, &url, Some(&body)).await?;
        Ok(self.absorb_sign_in(&response))
    }

    fn absorb_sign_in(&self, response: &ApiResponse) -> bool {
        match Credential::from_sign_in(&response.headers, &response.body, Utc::now()) {
            Ok(credential) => {
                tracing::debug!(
                    user_id = credential.user_id(),
                    expires_at = %credential.expires_at(),
                    "Authenticated with SmartCocoon"
                );
                self.tokens.set(credential);
                true
            }
            Err(reason) => {
                tracing::error!(%reason, "Authentication failed");
                false
            }
        }
    }

    /// Sends one logical request to an absolute URL.
    ///
    /// Returns the decoded JSON body, `Value::Null` for an empty body. When
    /// `url` is the sign-in endpoint a successful response also replaces
    /// the stored credential.
    ///
    /// # Errors
    ///
    /// - `Error::Unauthorized` on 401/403, without retrying
    /// - `Error::Request` when retries are exhausted, on other non-2xx
    ///   statuses, or on a non-JSON body
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let response = self.execute(method, url, body).await?;
        if url == self.config.sign_in_url() {
            self.absorb_sign_in(&response);
        }
        Ok(response.body)
    }

    /// Sends a request to a path under the API root, signing in again once
    /// if the token is expired or refused.
    ///
    /// # Errors
    ///
    /// Same as [`request`](Self::request); `Error::Unauthorized` only
    /// escapes when no login is remembered or the retried request is
    /// refused as well.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<serde_json::Value> {
        let url = self.config.url(path);

        if let Some(current) = self.tokens.get()
            && !current.is_valid_at(Utc::now())
            && self.has_login()
        {
            tracing::debug!("Credential expired, signing in again");
            self.reauthenticate(Some(current.bearer_token())).await?;
        }

        let used_token = self.tokens.get().map(|c| c.bearer_token().to_string());

        match self.request(method.clone(), &url, body).await {
            Err(Error::Unauthorized { status }) if self.has_login() => {
                tracing::debug!(status, url = %url, "Token refused, signing in again");
                self.reauthenticate(used_token.as_deref()).await?;
                self.request(method, &url, body).await
            }
            result => result,
        }
    }

    fn has_login(&self) -> bool {
        self.login.read().is_some()
    }

    /// Signs in again unless another caller already replaced `stale_token`.
    ///
    /// Concurrent callers queue on `refresh_lock`, so a burst of refused
    /// requests produces a single sign-in.
    async fn reauthenticate(&self, stale_token: Option<&str>) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.tokens.get()
            && Some(current.bearer_token()) != stale_token
            && current.is_valid_at(Utc::now())
        {
            tracing::debug!("Credential already refreshed by another request");
            return Ok(());
        }

        let Some(login) = self.login.read().clone() else {
            return Err(Error::NotAuthenticated);
        };

        if self.sign_in(&login.email, &login.password).await? {
            Ok(())
        } else {
            self.tokens.clear();
            Err(Error::NotAuthenticated)
        }
    }

    /// Lists every item of an entity collection.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payload does not decode.
    pub async fn list<T: DeserializeOwned>(&self, entity: EntityType) -> Result<Vec<T>> {
        let value = self.send(Method::GET, entity.as_str(), None).await?;
        Ok(decode_list(value, entity)?)
    }

    /// Fetches one fan by its server-assigned id.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the payload does not decode.
    pub async fn get_fan(&self, internal_id: i64) -> Result<FanRecord> {
        let path = format!("{}/{internal_id}", EntityType::Fans);
        let value = self.send(Method::GET, &path, None).await?;
        Ok(FanRecord::from_single(value)?)
    }

    /// Sets a fan's mode and speed.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn update_fan(
        &self,
        internal_id: i64,
        mode: FanMode,
        speed: FanSpeed,
    ) -> Result<serde_json::Value> {
        let path = format!("{}/{internal_id}", EntityType::Fans);
        let body = serde_json::json!({ "mode": mode.as_str(), "power": speed.power() });
        self.send(Method::PUT, &path, Some(&body)).await
    }

    /// Runs the bounded retry loop for one request.
    async fn execute(
        &self,
        method: Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ApiResponse> {
        let max_attempts = self.retry.max_attempts();
        let mut attempt = 1;

        loop {
            tracing::debug!(attempt, max_attempts, %method, url, "Calling SmartCocoon API");

            let outcome =
                tokio::time::timeout(self.config.timeout(), self.send_once(&method, url, body))
                    .await;

            let (failure, description) = match outcome {
                Err(_) => (
                    Failure::Transport,
                    format!("timed out after {} ms", self.config.timeout().as_millis()),
                ),
                Ok(Err(err)) if is_transient(&err) => (Failure::Transport, err.to_string()),
                Ok(Err(err)) => return Err(RequestError::Http(err).into()),
                Ok(Ok(raw)) => {
                    let status = raw.status;
                    tracing::debug!(attempt, %method, url, status = status.as_u16(), "SmartCocoon API response");

                    match classify(status) {
                        StatusClass::Success => {
                            return Ok(ApiResponse {
                                body: raw.json()?,
                                headers: raw.headers,
                            });
                        }
                        StatusClass::Unauthorized => {
                            return Err(Error::Unauthorized {
                                status: status.as_u16(),
                            });
                        }
                        StatusClass::RateLimited => (
                            Failure::RateLimited {
                                retry_after: raw
                                    .headers
                                    .get(RETRY_AFTER)
                                    .and_then(|v| v.to_str().ok())
                                    .map(str::to_string),
                            },
                            raw.status_line(),
                        ),
                        StatusClass::ServerError => (Failure::ServerError, raw.status_line()),
                        StatusClass::Fatal => {
                            return Err(RequestError::Status {
                                status: status.as_u16(),
                                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
                            }
                            .into());
                        }
                    }
                }
            };

            let decision = {
                let mut rng = rand::thread_rng();
                self.retry.decide(attempt, &failure, &mut rng)
            };

            if !decision.should_retry {
                return Err(RequestError::RetriesExhausted {
                    attempts: attempt,
                    last: description,
                }
                .into());
            }

            tracing::warn!(
                attempt,
                max_attempts,
                %method,
                url,
                reason = %description,
                wait_ms = u64::try_from(decision.wait.as_millis()).unwrap_or(u64::MAX),
                "Retrying SmartCocoon API call"
            );
            tokio::time::sleep(decision.wait).await;
            attempt += 1;
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        url: &str,
        body: Option<&serde_json::Value>,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        let credential = self.tokens.get();
        let mut request = self
            .http
            .request(method.clone(), url)
            .headers(build_headers(credential.as_ref(), self.config.user_agent()));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Connection-level failures worth another attempt.
fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// A fully read response of one attempt.
struct RawResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl RawResponse {
    /// Decodes the body as JSON whatever the content type says.
    fn json(&self) -> std::result::Result<serde_json::Value, RequestError> {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_slice(&self.body)
            .map_err(|e| RequestError::MalformedResponse(e.to_string()))
    }

    fn status_line(&self) -> String {
        format!(
            "HTTP {} - {}",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or("Unknown")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn config_default_values() {
        let config = ApiConfig::new();
        assert_eq!(config.base_url(), "https://app.mysmartcocoon.com/api");
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.default_speed(), FanSpeed::DEFAULT_ACTIVATION);
        assert_eq!(config.retry_unit(), Duration::from_secs(1));
    }

    #[test]
    fn config_urls() {
        let config = ApiConfig::new().with_base_url("http://127.0.0.1:8080/api/");
        assert_eq!(config.url("fans"), "http://127.0.0.1:8080/api/fans");
        assert_eq!(config.url("/rooms"), "http://127.0.0.1:8080/api/rooms");
        assert_eq!(config.sign_in_url(), "http://127.0.0.1:8080/api/auth/sign_in");
    }

    #[test]
    fn config_from_empty_environment() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url(), ApiConfig::DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), ApiConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn config_from_environment_overrides() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("SMARTCOCOON_API_URL", "http://localhost:9000/api"),
            ("SMARTCOCOON_REQUEST_TIMEOUT", "12"),
            ("SMARTCOCOON_DEFAULT_SPEED", "50"),
        ]))
        .unwrap();

        assert_eq!(config.base_url(), "http://localhost:9000/api");
        assert_eq!(config.timeout(), Duration::from_secs(12));
        assert_eq!(config.default_speed().value(), 50);
    }

    #[test]
    fn config_rejects_malformed_environment() {
        let err = ApiConfig::from_lookup(lookup(&[("SMARTCOCOON_REQUEST_TIMEOUT", "soon")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = ApiConfig::from_lookup(lookup(&[("SMARTCOCOON_DEFAULT_SPEED", "140")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn new_client_is_not_authenticated() {
        let client = ApiClient::new(ApiConfig::new()).unwrap();
        assert!(!client.is_authenticated());
        assert!(client.credential().is_none());
        assert!(client.user_id().is_none());
    }

    #[test]
    fn external_http_client_is_shared() {
        let http = Client::new();
        let client = ApiClient::with_http_client(http.clone(), ApiConfig::new());
        drop(client);
        // The caller's handle is still usable after the API client is gone.
        let _request = http.get("http://127.0.0.1/");
    }

    #[test]
    fn login_debug_redacts_password() {
        let login = Login {
            email: "me@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        assert!(!format!("{login:?}").contains("hunter2"));
    }
}
