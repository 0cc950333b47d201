// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// A thermostat linked to the account.
///
/// Only `id` and `name` are required. The vendor-specific fields vary in
/// type between integrations, so `thermostat_id` and `vendor` are kept as
/// raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thermostat {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Identifier on the vendor side.
    #[serde(default)]
    pub thermostat_id: Option<serde_json::Value>,
    /// Vendor access token.
    #[serde(default)]
    pub token: Option<String>,
    /// HVAC mode reported by the thermostat.
    #[serde(default)]
    pub hvac_mode: Option<String>,
    /// HVAC state reported by the thermostat.
    #[serde(default)]
    pub hvac_state: Option<String>,
    /// Current temperature.
    #[serde(default)]
    pub temperature: Option<f64>,
    /// Target temperature.
    #[serde(default)]
    pub target_temperature: Option<f64>,
    /// Thermostat vendor.
    #[serde(default)]
    pub vendor: Option<serde_json::Value>,
}
