// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for SmartCocoon fan control.
//!
//! - [`FanMode`] - Operating mode (eco, always off, always on, auto)
//! - [`FanSpeed`] - Speed percentage (0-100), mapped to API power (0-10000)
//! - [`EntityType`] - Resource collections of the cloud API

mod entity;
mod fan_mode;
mod speed;

pub use entity::EntityType;
pub use fan_mode::FanMode;
pub use speed::FanSpeed;
