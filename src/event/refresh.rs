// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/// A signal that cached state is stale.
///
/// Produced by push notifications (or any other source) and consumed by
/// [`DeviceRegistry::spawn_refresh_worker`](crate::manager::DeviceRegistry::spawn_refresh_worker).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RefreshRequest {
    /// Refresh locations, thermostats, rooms and fans.
    All,
    /// Refresh one fan, by physical id.
    Fan(String),
}
