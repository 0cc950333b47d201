// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan payload parsing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::types::FanMode;

/// A fan as returned by `GET fans` and `GET fans/{id}`.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::response::FanRecord;
/// use smartcocoon_lib::types::FanMode;
///
/// let json = r#"{
///     "id": 101, "fan_id": "ABC123", "mode": "auto", "fan_on": true,
///     "connected": true, "power": 4500, "room_id": 12
/// }"#;
/// let fan: FanRecord = serde_json::from_str(json).unwrap();
/// assert_eq!(fan.mode, FanMode::Auto);
/// assert_eq!(fan.power, 4500);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanRecord {
    /// Server-assigned identifier, used in `fans/{id}` URLs.
    pub id: i64,
    /// Identifier printed on the fan.
    pub fan_id: String,
    /// Current mode.
    pub mode: FanMode,
    /// Whether the device reports it is moving air.
    pub fan_on: bool,
    /// Whether the fan is connected to the cloud.
    pub connected: bool,
    /// Power in hundredths of a percent (0-10000).
    pub power: i64,
    /// Last time the fan reached the cloud.
    #[serde(default)]
    pub last_connection: Option<DateTime<Utc>>,
    /// Room the fan is installed in.
    #[serde(default)]
    pub room_id: Option<i64>,
    /// Installed firmware version.
    #[serde(default)]
    pub firmware_version: Option<String>,
    /// Whether the room temperature is estimated.
    #[serde(default)]
    pub is_room_estimating: Option<bool>,
    /// Predicted room temperature.
    #[serde(default)]
    pub predicted_room_temperature: Option<f64>,
    /// Vendor code of the linked thermostat.
    #[serde(default)]
    pub thermostat_vendor: Option<i64>,
    /// Username for the push-notification broker.
    #[serde(default)]
    pub mqtt_username: Option<String>,
    /// Password for the push-notification broker.
    #[serde(default)]
    pub mqtt_password: Option<String>,
}

impl FanRecord {
    /// Decodes the single-fan response, bare or wrapped in `{"fan": {...}}`.
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if the payload is not a fan object.
    pub fn from_single(value: serde_json::Value) -> Result<Self, ParseError> {
        let value = match value {
            serde_json::Value::Object(mut map) if map.contains_key("fan") => map
                .remove("fan")
                .ok_or_else(|| ParseError::MissingField("fan".to_string()))?,
            other => other,
        };
        serde_json::from_value(value).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fan_json() -> serde_json::Value {
        serde_json::json!({
            "id": 101,
            "fan_id": "ABC123",
            "mode": "always_on",
            "fan_on": false,
            "connected": true,
            "last_connection": "2024-05-01T10:15:00.000Z",
            "power": 3300,
            "room_id": 12,
            "firmware_version": "1.2.3",
            "mqtt_username": "42_ABC123",
            "mqtt_password": "secret"
        })
    }

    #[test]
    fn decodes_full_record() {
        let fan: FanRecord = serde_json::from_value(fan_json()).unwrap();
        assert_eq!(fan.fan_id, "ABC123");
        assert_eq!(fan.mode, FanMode::On);
        assert!(fan.last_connection.is_some());
        assert_eq!(fan.mqtt_username.as_deref(), Some("42_ABC123"));
    }

    #[test]
    fn null_optional_fields() {
        let mut json = fan_json();
        json["last_connection"] = serde_json::Value::Null;
        json["room_id"] = serde_json::Value::Null;
        let fan: FanRecord = serde_json::from_value(json).unwrap();
        assert!(fan.last_connection.is_none());
        assert!(fan.room_id.is_none());
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let mut json = fan_json();
        json.as_object_mut().unwrap().remove("mode");
        assert!(serde_json::from_value::<FanRecord>(json).is_err());
    }

    #[test]
    fn unknown_mode_is_an_error() {
        let mut json = fan_json();
        json["mode"] = serde_json::json!("turbo");
        assert!(serde_json::from_value::<FanRecord>(json).is_err());
    }

    #[test]
    fn from_single_accepts_wrapped_and_bare() {
        let bare = FanRecord::from_single(fan_json()).unwrap();
        let wrapped = FanRecord::from_single(serde_json::json!({ "fan": fan_json() })).unwrap();
        assert_eq!(bare, wrapped);
    }
}
