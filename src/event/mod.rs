// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events going out of the registry and refresh signals coming in.
//!
//! [`FanEvent`]s are broadcast on an [`EventBus`] whenever the registry
//! learns about a new fan or a fan's state changes. [`RefreshRequest`]s
//! flow the other way, over an `mpsc` channel, to ask the registry to
//! fetch fresh state.
//!
//! # Examples
//!
//! ```
//! use smartcocoon_lib::event::{EventBus, FanEvent};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(FanEvent::Added { fan_id: "A1B2".to_string() });
//! assert!(matches!(rx.try_recv(), Ok(FanEvent::Added { .. })));
//! ```

mod event_bus;
mod fan_event;
mod refresh;

pub use event_bus::EventBus;
pub use fan_event::FanEvent;
pub use refresh::RefreshRequest;
