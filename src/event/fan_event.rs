// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::state::FanState;

/// Events published by the [`DeviceRegistry`](crate::manager::DeviceRegistry).
#[derive(Debug, Clone)]
pub enum FanEvent {
    /// A fan was seen for the first time.
    Added {
        /// Physical id of the fan.
        fan_id: String,
    },

    /// A fan's state changed after a refresh or an acknowledged command.
    Updated {
        /// Physical id of the fan.
        fan_id: String,
        /// The complete new state.
        state: FanState,
    },
}

impl FanEvent {
    /// Returns the physical id of the fan concerned.
    #[must_use]
    pub fn fan_id(&self) -> &str {
        match self {
            Self::Added { fan_id } | Self::Updated { fan_id, .. } => fan_id,
        }
    }

    /// Returns the new state for update events.
    #[must_use]
    pub fn state(&self) -> Option<&FanState> {
        match self {
            Self::Added { .. } => None,
            Self::Updated { state, .. } => Some(state),
        }
    }
}
