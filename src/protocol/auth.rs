// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bearer credential handling.
//!
//! A [`Credential`] is an immutable value produced by a successful sign-in.
//! The [`TokenStore`] swaps it wholesale; request headers are derived from
//! it by the pure [`build_headers`] function.

use std::fmt;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::RwLock;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::response::SignInResponse;

/// Response header carrying the bearer token.
pub const ACCESS_TOKEN_HEADER: &str = "access-token";
/// Response header carrying the token lifetime in seconds.
pub const EXPIRY_HEADER: &str = "expiry";
/// Response header carrying the API client identifier.
pub const CLIENT_HEADER: &str = "client";
/// Request header identifying the user (their email).
pub const UID_HEADER: &str = "uid";

/// Subtracted from the server-announced lifetime so a token is never used
/// right at its expiry boundary.
pub const EXPIRY_MARGIN_SECS: i64 = 10;

/// An authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    bearer_token: String,
    client_id: String,
    user_identity: String,
    user_id: i64,
    expires_at: DateTime<Utc>,
}

impl Credential {
    /// Creates a credential.
    #[must_use]
    pub fn new(
        bearer_token: impl Into<String>,
        client_id: impl Into<String>,
        user_identity: impl Into<String>,
        user_id: i64,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            bearer_token: bearer_token.into(),
            client_id: client_id.into(),
            user_identity: user_identity.into(),
            user_id,
            expires_at,
        }
    }

    /// Builds a credential from sign-in response headers and body.
    ///
    /// `now` is the time the response was received.
    ///
    /// # Errors
    ///
    /// Returns the first missing or malformed piece.
    pub fn from_sign_in(
        headers: &HeaderMap,
        body: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> Result<Self, SignInIncomplete> {
        let token = header_str(headers, ACCESS_TOKEN_HEADER)?;
        let expiry = header_str(headers, EXPIRY_HEADER)?;
        let client = header_str(headers, CLIENT_HEADER)?;

        let expiry_seconds: i64 = expiry
            .trim()
            .parse()
            .map_err(|_| SignInIncomplete::InvalidExpiry(expiry.to_string()))?;
        let lifetime = TimeDelta::try_seconds(expiry_seconds)
            .ok_or_else(|| SignInIncomplete::InvalidExpiry(expiry.to_string()))?;

        let user = serde_json::from_value::<SignInResponse>(body.clone())
            .map_err(|_| SignInIncomplete::MissingUser)?
            .data;
        if HeaderValue::from_str(&user.email).is_err() {
            return Err(SignInIncomplete::MissingUser);
        }

        let expires_at = lifetime
            .checked_sub(&TimeDelta::seconds(EXPIRY_MARGIN_SECS))
            .and_then(|remaining| now.checked_add_signed(remaining))
            .ok_or_else(|| SignInIncomplete::InvalidExpiry(expiry.to_string()))?;

        Ok(Self::new(token, client, user.email, user.id, expires_at))
    }

    /// Returns the bearer token.
    #[must_use]
    pub fn bearer_token(&self) -> &str {
        &self.bearer_token
    }

    /// Returns the API client identifier.
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Returns the user's email, sent as `uid`.
    #[must_use]
    pub fn user_identity(&self) -> &str {
        &self.user_identity
    }

    /// Returns the numeric user id.
    #[must_use]
    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    /// Returns when the credential stops being usable.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns whether the credential is still usable at `now`.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("bearer_token", &"<redacted>")
            .field("client_id", &"<redacted>")
            .field("user_identity", &self.user_identity)
            .field("user_id", &self.user_id)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Why a sign-in response could not produce a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInIncomplete {
    /// A required response header is absent or not valid text.
    MissingHeader(&'static str),
    /// The `expiry` header is not an integer number of seconds.
    InvalidExpiry(String),
    /// The body lacks `data.id` / `data.email`.
    MissingUser,
}

impl fmt::Display for SignInIncomplete {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader(name) => write!(f, "missing {name} in response headers"),
            Self::InvalidExpiry(value) => write!(f, "invalid expiry header: {value:?}"),
            Self::MissingUser => f.write_str("missing or invalid user data in response"),
        }
    }
}

fn header_str<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<&'a str, SignInIncomplete> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .ok_or(SignInIncomplete::MissingHeader(name))
}

/// Holder of the current credential.
///
/// Reads and writes are serialized by a lock; only the sign-in path writes.
#[derive(Debug, Default)]
pub struct TokenStore {
    current: RwLock<Option<Credential>>,
}

impl TokenStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the stored credential.
    pub fn set(&self, credential: Credential) {
        *self.current.write() = Some(credential);
    }

    /// Returns a copy of the stored credential.
    #[must_use]
    pub fn get(&self) -> Option<Credential> {
        self.current.read().clone()
    }

    /// Removes the stored credential.
    pub fn clear(&self) {
        *self.current.write() = None;
    }

    /// Returns true iff a credential is stored and `now < expires_at`.
    #[must_use]
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.current
            .read()
            .as_ref()
            .is_some_and(|c| c.is_valid_at(now))
    }
}

/// Builds the headers sent with every request.
///
/// Always sets `Content-Type: application/json` and `User-Agent`; adds
/// `access-token`, `client` and `uid` when a credential is given.
#[must_use]
pub fn build_headers(credential: Option<&Credential>, user_agent: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }

    if let Some(credential) = credential {
        let pairs = [
            (ACCESS_TOKEN_HEADER, credential.bearer_token()),
            (CLIENT_HEADER, credential.client_id()),
            (UID_HEADER, credential.user_identity()),
        ];
        for (name, value) in pairs {
            match HeaderValue::from_str(value) {
                Ok(value) => {
                    headers.insert(HeaderName::from_static(name), value);
                }
                Err(_) => tracing::warn!(header = name, "Skipping header with invalid characters"),
            }
        }
    }

    headers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign_in_headers(token: Option<&str>, expiry: Option<&str>, client: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            (ACCESS_TOKEN_HEADER, token),
            (EXPIRY_HEADER, expiry),
            (CLIENT_HEADER, client),
        ] {
            if let Some(value) = value {
                headers.insert(name, HeaderValue::from_str(value).unwrap());
            }
        }
        headers
    }

    fn user_body() -> serde_json::Value {
        serde_json::json!({"data": {"id": 77, "email": "user@example.com"}})
    }

    #[test]
    fn credential_from_complete_sign_in() {
        let now = Utc::now();
        let headers = sign_in_headers(Some("tok"), Some("3600"), Some("cli"));
        let credential = Credential::from_sign_in(&headers, &user_body(), now).unwrap();

        assert_eq!(credential.bearer_token(), "tok");
        assert_eq!(credential.client_id(), "cli");
        assert_eq!(credential.user_identity(), "user@example.com");
        assert_eq!(credential.user_id(), 77);
        assert_eq!(credential.expires_at(), now + TimeDelta::seconds(3590));
    }

    #[test]
    fn each_missing_header_is_reported() {
        let now = Utc::now();
        let cases = [
            (sign_in_headers(None, Some("60"), Some("c")), ACCESS_TOKEN_HEADER),
            (sign_in_headers(Some("t"), None, Some("c")), EXPIRY_HEADER),
            (sign_in_headers(Some("t"), Some("60"), None), CLIENT_HEADER),
        ];
        for (headers, missing) in cases {
            let err = Credential::from_sign_in(&headers, &user_body(), now).unwrap_err();
            assert_eq!(err, SignInIncomplete::MissingHeader(missing));
        }
    }

    #[test]
    fn non_numeric_expiry() {
        let headers = sign_in_headers(Some("t"), Some("soon"), Some("c"));
        let err = Credential::from_sign_in(&headers, &user_body(), Utc::now()).unwrap_err();
        assert!(matches!(err, SignInIncomplete::InvalidExpiry(_)));
    }

    #[test]
    fn missing_user_data() {
        let headers = sign_in_headers(Some("t"), Some("60"), Some("c"));
        for body in [
            serde_json::Value::Null,
            serde_json::json!({}),
            serde_json::json!({"data": {"id": 1}}),
            serde_json::json!({"data": {"email": "a@b.c"}}),
        ] {
            let err = Credential::from_sign_in(&headers, &body, Utc::now()).unwrap_err();
            assert_eq!(err, SignInIncomplete::MissingUser);
        }
    }

    #[test]
    fn store_validity_follows_expiry() {
        let store = TokenStore::new();
        let now = Utc::now();
        assert!(!store.is_valid(now));

        store.set(Credential::new("t", "c", "u", 1, now + TimeDelta::seconds(5)));
        assert!(store.is_valid(now));
        assert!(!store.is_valid(now + TimeDelta::seconds(5)));

        store.clear();
        assert!(store.get().is_none());
    }

    #[test]
    fn set_replaces_wholesale() {
        let store = TokenStore::new();
        let now = Utc::now();
        store.set(Credential::new("old", "c1", "a@x", 1, now));
        store.set(Credential::new("new", "c2", "b@x", 2, now));

        let current = store.get().unwrap();
        assert_eq!(current.bearer_token(), "new");
        assert_eq!(current.client_id(), "c2");
        assert_eq!(current.user_identity(), "b@x");
    }

    #[test]
    fn headers_without_credential() {
        let headers = build_headers(None, "agent/1.0");
        assert_eq!(headers.get(CONTENT_TYPE).unwrap(), "application/json");
        assert_eq!(headers.get(USER_AGENT).unwrap(), "agent/1.0");
        assert!(headers.get(ACCESS_TOKEN_HEADER).is_none());
        assert!(headers.get(UID_HEADER).is_none());
    }

    #[test]
    fn headers_with_credential() {
        let credential = Credential::new("tok", "cli", "me@example.com", 1, Utc::now());
        let headers = build_headers(Some(&credential), "agent/1.0");
        assert_eq!(headers.get(ACCESS_TOKEN_HEADER).unwrap(), "tok");
        assert_eq!(headers.get(CLIENT_HEADER).unwrap(), "cli");
        assert_eq!(headers.get(UID_HEADER).unwrap(), "me@example.com");
    }

    #[test]
    fn debug_redacts_token() {
        let credential = Credential::new("secret-token", "cli", "me", 1, Utc::now());
        let debug = format!("{credential:?}");
        assert!(!debug.contains("secret-token"));
    }
}
