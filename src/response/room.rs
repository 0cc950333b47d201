// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// A room. Fans reference rooms by `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Server-assigned identifier. Changes if the room is re-added.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Temperature requested by the user.
    #[serde(default)]
    pub desired_temperature: Option<f64>,
    /// HVAC mode reported by the thermostat.
    #[serde(default)]
    pub hvac_mode: Option<String>,
    /// Current HVAC activity.
    #[serde(default)]
    pub hvac_state: Option<String>,
    /// Whether the temperature is estimated.
    #[serde(default)]
    pub is_estimating: Option<bool>,
    /// Predicted temperature.
    #[serde(default)]
    pub predicted_temperature: Option<f64>,
    /// Temperature the system is driving towards.
    #[serde(default)]
    pub target_temperature: Option<f64>,
    /// Measured temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Thermostat serving the room.
    #[serde(default)]
    pub thermostat_id: Option<i64>,
}
