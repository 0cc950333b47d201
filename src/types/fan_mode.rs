// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Operating mode of a SmartCocoon fan.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Operating mode of a fan, as understood by the cloud API.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::types::FanMode;
///
/// assert_eq!(FanMode::On.as_str(), "always_on");
/// assert_eq!("eco".parse::<FanMode>().unwrap(), FanMode::Eco);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FanMode {
    /// Runs when the HVAC system is running.
    #[serde(rename = "eco")]
    Eco,
    /// Always off.
    #[serde(rename = "always_off")]
    Off,
    /// Always on.
    #[serde(rename = "always_on")]
    On,
    /// Runs according to the room's temperature.
    #[serde(rename = "auto")]
    Auto,
}

impl FanMode {
    /// Returns the wire representation used by the cloud API.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Eco => "eco",
            Self::Off => "always_off",
            Self::On => "always_on",
            Self::Auto => "auto",
        }
    }

    /// Returns whether a fan in this mode is moving air.
    ///
    /// `On` and `Off` decide it; `Auto` and `Eco` leave it to the device,
    /// so the last reported value is kept.
    #[must_use]
    pub const fn drives_air(&self, last_reported: bool) -> bool {
        match self {
            Self::On => true,
            Self::Off => false,
            Self::Auto | Self::Eco => last_reported,
        }
    }
}

impl fmt::Display for FanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FanMode {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "eco" => Ok(Self::Eco),
            "always_off" | "off" => Ok(Self::Off),
            "always_on" | "on" => Ok(Self::On),
            "auto" => Ok(Self::Auto),
            _ => Err(ValueError::InvalidFanMode(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names() {
        assert_eq!(FanMode::Eco.as_str(), "eco");
        assert_eq!(FanMode::Off.as_str(), "always_off");
        assert_eq!(FanMode::On.as_str(), "always_on");
        assert_eq!(FanMode::Auto.as_str(), "auto");
    }

    #[test]
    fn parse_accepts_short_aliases() {
        assert_eq!("ON".parse::<FanMode>().unwrap(), FanMode::On);
        assert_eq!("off".parse::<FanMode>().unwrap(), FanMode::Off);
        assert!("turbo".parse::<FanMode>().is_err());
    }

    #[test]
    fn serde_uses_wire_names() {
        let json = serde_json::to_string(&FanMode::On).unwrap();
        assert_eq!(json, "\"always_on\"");

        let mode: FanMode = serde_json::from_str("\"always_off\"").unwrap();
        assert_eq!(mode, FanMode::Off);
    }

    #[test]
    fn drives_air_rules() {
        assert!(FanMode::On.drives_air(false));
        assert!(!FanMode::Off.drives_air(true));
        assert!(FanMode::Auto.drives_air(true));
        assert!(!FanMode::Eco.drives_air(false));
    }
}
