// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `smartcocoon_lib` library.
//!
//! Failures are split by who is expected to act on them:
//!
//! - [`Error::Unauthorized`] must reach a layer able to sign in again.
//! - [`RequestError`] is terminal for one call; the caller decides what to
//!   do next (for example, skip a refresh cycle).
//! - [`CommandError`] is a rejected fan command, returned before any
//!   request is sent.
//! - [`ParseError`] is a payload that does not match the expected shape.
//!
//! An incomplete sign-in is not an error: [`ApiClient::authenticate`]
//! returns `Ok(false)` for it.
//!
//! [`ApiClient::authenticate`]: crate::protocol::ApiClient::authenticate

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// The cloud API answered 401 or 403.
    #[error("unauthorized (HTTP {status})")]
    Unauthorized {
        /// The HTTP status returned by the server.
        status: u16,
    },

    /// A request failed after classification and retries.
    #[error("request failed: {0}")]
    Request(#[from] RequestError),

    /// A fan command was rejected before being sent.
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] CommandError),

    /// A response payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A value was outside its allowed range.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// No fan with this physical identifier is known to the registry.
    #[error("fan {0} not found")]
    FanNotFound(String),

    /// No usable credential and no stored login to obtain one.
    #[error("not authenticated")]
    NotAuthenticated,

    /// Configuration could not be built.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// MQTT client failure while setting up push notifications.
    #[cfg(feature = "mqtt")]
    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
}

/// Terminal failures of a single API call.
#[derive(Debug, Error)]
pub enum RequestError {
    /// The HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a status that is not retried.
    #[error("HTTP {status} - {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase.
        reason: String,
    },

    /// Every attempt failed with a retryable condition.
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        last: String,
    },

    /// The server answered 2xx with a body that is not JSON.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Rejections produced by the fan command resolver.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Neither a mode nor a speed was requested.
    #[error("a fan command needs a mode and/or a speed")]
    EmptyRequest,

    /// The requested speed is outside 0-100 %.
    #[error("fan speed {0}% is out of range [0, 100]")]
    SpeedOutOfRange(u8),
}

/// Errors related to decoding API payloads.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON decoding failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A fan mode string was not recognised.
    #[error("invalid fan mode: {0}")]
    InvalidFanMode(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
