// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Last known state of one fan.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::command::ResolvedCommand;
use crate::response::FanRecord;
use crate::types::{FanMode, FanSpeed};

/// Last known state of a fan, keyed by its physical id.
///
/// Created from a [`FanRecord`] on refresh and updated optimistically when a
/// command is acknowledged. `fan_on` always agrees with the mode: `On`
/// drives air, `Off` does not, `Auto` and `Eco` keep what the device last
/// reported.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::response::FanRecord;
/// use smartcocoon_lib::state::FanState;
/// use smartcocoon_lib::types::FanMode;
///
/// let record: FanRecord = serde_json::from_value(serde_json::json!({
///     "id": 7, "fan_id": "A1B2", "mode": "always_on", "fan_on": false,
///     "connected": true, "power": 5000
/// })).unwrap();
///
/// let state = FanState::from_record(&record);
/// assert_eq!(state.mode(), FanMode::On);
/// assert!(state.fan_on());
/// assert_eq!(state.speed().value(), 50);
/// ```
#[derive(Clone, PartialEq, Serialize)]
pub struct FanState {
    internal_id: i64,
    physical_id: String,
    mode: FanMode,
    speed: FanSpeed,
    fan_on: bool,
    connected: bool,
    last_connection: Option<DateTime<Utc>>,
    room_id: Option<i64>,
    room_name: Option<String>,
    firmware_version: Option<String>,
    is_room_estimating: Option<bool>,
    predicted_room_temperature: Option<f64>,
    thermostat_vendor: Option<i64>,
    mqtt_username: Option<String>,
    #[serde(skip)]
    mqtt_password: Option<String>,
}

impl FanState {
    /// Builds the state of a newly seen fan.
    #[must_use]
    pub fn from_record(record: &FanRecord) -> Self {
        let mode = record.mode;
        Self {
            internal_id: record.id,
            physical_id: record.fan_id.clone(),
            mode,
            speed: FanSpeed::from_power(record.power),
            fan_on: mode.drives_air(record.fan_on),
            connected: record.connected,
            last_connection: record.last_connection,
            room_id: record.room_id,
            room_name: None,
            firmware_version: record.firmware_version.clone(),
            is_room_estimating: record.is_room_estimating,
            predicted_room_temperature: record.predicted_room_temperature,
            thermostat_vendor: record.thermostat_vendor,
            mqtt_username: record.mqtt_username.clone(),
            mqtt_password: record.mqtt_password.clone(),
        }
    }

    /// Overwrites every reported field from a fresh record.
    ///
    /// The room name is kept; the caller joins it again. Returns true if
    /// anything changed.
    pub fn update_from_record(&mut self, record: &FanRecord) -> bool {
        let mut fresh = Self::from_record(record);
        fresh.room_name = self.room_name.take();
        let changed = *self != fresh;
        *self = fresh;
        changed
    }

    /// Applies an acknowledged command. Returns true if anything changed.
    pub fn apply_command(&mut self, command: &ResolvedCommand) -> bool {
        let fan_on = command.fan_on(self.fan_on);
        let changed =
            self.mode != command.mode || self.speed != command.speed || self.fan_on != fan_on;

        self.mode = command.mode;
        self.speed = command.speed;
        self.fan_on = fan_on;
        changed
    }

    /// Sets the joined room name.
    pub fn set_room_name(&mut self, name: impl Into<String>) {
        self.room_name = Some(name.into());
    }

    /// Server-assigned numeric id, used in API paths.
    #[must_use]
    pub fn internal_id(&self) -> i64 {
        self.internal_id
    }

    /// Physical id printed on the device.
    #[must_use]
    pub fn physical_id(&self) -> &str {
        &self.physical_id
    }

    /// Current mode.
    #[must_use]
    pub fn mode(&self) -> FanMode {
        self.mode
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> FanSpeed {
        self.speed
    }

    /// Speed in API units (percent × 100).
    #[must_use]
    pub fn power(&self) -> u16 {
        self.speed.power()
    }

    /// Whether the fan is driving air.
    #[must_use]
    pub fn fan_on(&self) -> bool {
        self.fan_on
    }

    /// Whether the fan is connected to the cloud.
    #[must_use]
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Last time the fan reached the cloud.
    #[must_use]
    pub fn last_connection(&self) -> Option<DateTime<Utc>> {
        self.last_connection
    }

    /// Id of the room the fan is installed in.
    #[must_use]
    pub fn room_id(&self) -> Option<i64> {
        self.room_id
    }

    /// Name of the room, `"Unknown"` if the room was not found.
    #[must_use]
    pub fn room_name(&self) -> Option<&str> {
        self.room_name.as_deref()
    }

    /// Firmware version.
    #[must_use]
    pub fn firmware_version(&self) -> Option<&str> {
        self.firmware_version.as_deref()
    }

    /// Whether the room temperature is estimated.
    #[must_use]
    pub fn is_room_estimating(&self) -> Option<bool> {
        self.is_room_estimating
    }

    /// Predicted room temperature.
    #[must_use]
    pub fn predicted_room_temperature(&self) -> Option<f64> {
        self.predicted_room_temperature
    }

    /// Thermostat vendor code.
    #[must_use]
    pub fn thermostat_vendor(&self) -> Option<i64> {
        self.thermostat_vendor
    }

    /// Broker login for push notifications, if the API provided one.
    #[must_use]
    pub fn mqtt_credentials(&self) -> Option<(&str, &str)> {
        match (&self.mqtt_username, &self.mqtt_password) {
            (Some(username), Some(password)) => Some((username, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for FanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FanState")
            .field("internal_id", &self.internal_id)
            .field("physical_id", &self.physical_id)
            .field("mode", &self.mode)
            .field("speed", &self.speed)
            .field("fan_on", &self.fan_on)
            .field("connected", &self.connected)
            .field("last_connection", &self.last_connection)
            .field("room_id", &self.room_id)
            .field("room_name", &self.room_name)
            .field("firmware_version", &self.firmware_version)
            .field("mqtt_username", &self.mqtt_username)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(mode: &str, fan_on: bool, power: i64) -> FanRecord {
        serde_json::from_value(serde_json::json!({
            "id": 42,
            "fan_id": "FAN42",
            "mode": mode,
            "fan_on": fan_on,
            "connected": true,
            "power": power,
            "room_id": 3,
            "mqtt_username": "user42",
            "mqtt_password": "secret42"
        }))
        .unwrap()
    }

    #[test]
    fn fan_on_derived_from_mode() {
        assert!(FanState::from_record(&record("always_on", false, 0)).fan_on());
        assert!(!FanState::from_record(&record("always_off", true, 0)).fan_on());
        assert!(FanState::from_record(&record("auto", true, 0)).fan_on());
        assert!(!FanState::from_record(&record("eco", false, 0)).fan_on());
    }

    #[test]
    fn power_rounds_to_percent() {
        let state = FanState::from_record(&record("always_on", true, 3349));
        assert_eq!(state.speed().value(), 33);
        assert_eq!(state.power(), 3300);
        assert_eq!(state.power() % 100, 0);
    }

    #[test]
    fn update_keeps_room_name() {
        let mut state = FanState::from_record(&record("auto", true, 2000));
        state.set_room_name("Office");

        let changed = state.update_from_record(&record("always_off", false, 2000));

        assert!(changed);
        assert_eq!(state.mode(), FanMode::Off);
        assert_eq!(state.room_name(), Some("Office"));
    }

    #[test]
    fn identical_update_reports_no_change() {
        let mut state = FanState::from_record(&record("auto", true, 2000));
        state.set_room_name("Office");
        assert!(!state.update_from_record(&record("auto", true, 2000)));
    }

    #[test]
    fn apply_command_sets_mode_speed_and_fan_on() {
        let mut state = FanState::from_record(&record("always_off", false, 6000));
        let changed = state.apply_command(&ResolvedCommand {
            mode: FanMode::On,
            speed: FanSpeed::new(60).unwrap(),
        });

        assert!(changed);
        assert_eq!(state.mode(), FanMode::On);
        assert!(state.fan_on());

        let changed = state.apply_command(&ResolvedCommand {
            mode: FanMode::Auto,
            speed: FanSpeed::new(60).unwrap(),
        });
        assert!(changed);
        // Auto keeps the last reported value
        assert!(state.fan_on());
    }

    #[test]
    fn mqtt_credentials_and_redaction() {
        let state = FanState::from_record(&record("auto", true, 0));
        assert_eq!(state.mqtt_credentials(), Some(("user42", "secret42")));

        let debug = format!("{state:?}");
        assert!(!debug.contains("secret42"));

        let json = serde_json::to_string(&state).unwrap();
        assert!(!json.contains("secret42"));
    }
}
