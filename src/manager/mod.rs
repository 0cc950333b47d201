// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account-level state management.
//!
//! The [`DeviceRegistry`] caches locations, thermostats, rooms and fans,
//! routes commands through the resolver and publishes
//! [`FanEvent`](crate::event::FanEvent)s when something changes.
//!
//! # Push-driven refresh
//!
//! ```no_run
//! use std::sync::Arc;
//! use smartcocoon_lib::manager::DeviceRegistry;
//! use smartcocoon_lib::protocol::{ApiClient, ApiConfig, PushConfig};
//!
//! # async fn example() -> smartcocoon_lib::Result<()> {
//! let client = Arc::new(ApiClient::new(ApiConfig::from_env()?)?);
//! let registry = Arc::new(DeviceRegistry::new(client));
//! registry.start("me@example.com", "hunter2").await?;
//!
//! let (tx, rx) = tokio::sync::mpsc::channel(32);
//! let _worker = registry.spawn_refresh_worker(rx);
//! let _listeners = registry
//!     .spawn_push_listeners(&PushConfig::new("mqtt.example.com"), &tx)
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod device_registry;

pub use device_registry::{DeviceRegistry, UNKNOWN_ROOM};
