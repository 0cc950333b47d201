// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `SmartCocoon` Lib - A Rust client for SmartCocoon smart HVAC vent fans.
//!
//! This library talks to the SmartCocoon cloud API to discover an account's
//! locations, thermostats, rooms and fans, and to control the fans.
//!
//! # Features
//!
//! - **Authenticated client**: sign-in, bounded retries with backoff,
//!   automatic re-authentication serialized across concurrent callers
//! - **Fan control**: partial commands (mode only, speed only) completed
//!   from the last known state
//! - **Registry**: cached account view with change events
//! - **Push refresh** (feature `mqtt`, on by default): per-fan MQTT
//!   notifications that trigger a refresh
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use smartcocoon_lib::{ApiClient, ApiConfig, DeviceRegistry, FanMode};
//!
//! #[tokio::main]
//! async fn main() -> smartcocoon_lib::Result<()> {
//!     let client = Arc::new(ApiClient::new(ApiConfig::new())?);
//!     let registry = DeviceRegistry::new(client);
//!
//!     if !registry.start("me@example.com", "hunter2").await? {
//!         eprintln!("sign-in incomplete");
//!         return Ok(());
//!     }
//!
//!     for fan in registry.fans().await {
//!         println!(
//!             "{} ({}) {} at {}",
//!             fan.physical_id(),
//!             fan.room_name().unwrap_or("?"),
//!             fan.mode(),
//!             fan.speed()
//!         );
//!     }
//!
//!     registry.set_mode_and_speed("A1B2", FanMode::On, 50).await?;
//!     registry.set_speed("A1B2", 0).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Events
//!
//! ```no_run
//! use std::sync::Arc;
//! use smartcocoon_lib::{ApiClient, ApiConfig, DeviceRegistry};
//! use smartcocoon_lib::event::FanEvent;
//!
//! # async fn example() -> smartcocoon_lib::Result<()> {
//! let registry = DeviceRegistry::new(Arc::new(ApiClient::new(ApiConfig::new())?));
//! let mut events = registry.subscribe();
//!
//! tokio::spawn(async move {
//!     while let Ok(event) = events.recv().await {
//!         if let FanEvent::Updated { fan_id, state } = event {
//!             println!("{fan_id}: {} at {}", state.mode(), state.speed());
//!         }
//!     }
//! });
//! # Ok(())
//! # }
//! ```

pub mod command;
pub mod error;
pub mod event;
pub mod manager;
pub mod protocol;
pub mod response;
pub mod state;
pub mod types;

pub use command::{FanCommand, FanCommandResolver, ResolvedCommand};
pub use error::{CommandError, Error, ParseError, RequestError, Result, ValueError};
pub use event::{EventBus, FanEvent, RefreshRequest};
pub use manager::DeviceRegistry;
pub use protocol::{ApiClient, ApiConfig, Credential, RetryPolicy, TokenStore};
#[cfg(feature = "mqtt")]
pub use protocol::{PushConfig, PushListener};
pub use state::FanState;
pub use types::{EntityType, FanMode, FanSpeed};
