// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Communication with the SmartCocoon cloud.
//!
//! - [`ApiClient`]: authenticated JSON-over-HTTPS client with bounded
//!   retries and automatic re-authentication
//! - [`retry`]: status classification and backoff used by the client
//! - [`auth`]: the credential obtained at sign-in and the headers built
//!   from it
//! - [`PushListener`]: MQTT notifications that a fan changed state
//!   (feature `mqtt`)

pub mod auth;
mod http;
#[cfg(feature = "mqtt")]
mod push;
pub mod retry;

pub use auth::{Credential, TokenStore};
pub use http::{ApiClient, ApiConfig};
#[cfg(feature = "mqtt")]
pub use push::{PushConfig, PushListener, is_state_notification, status_topic};
pub use retry::{MAX_ATTEMPTS, RetryDecision, RetryPolicy, StatusClass, classify};
