// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan speed type.
//!
//! The cloud API expresses fan power in hundredths of a percent
//! (`0..=10000`). The library only works at percent granularity, so a
//! [`FanSpeed`] always maps to a power that is a multiple of 100.

use std::fmt;

use crate::error::ValueError;

/// Fan speed as a percentage (0-100).
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::types::FanSpeed;
///
/// let speed = FanSpeed::new(42).unwrap();
/// assert_eq!(speed.power(), 4200);
/// assert_eq!(FanSpeed::from_power(6000).value(), 60);
/// assert!(FanSpeed::new(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, serde::Serialize, serde::Deserialize,
)]
pub struct FanSpeed(u8);

impl FanSpeed {
    /// Maximum speed value.
    pub const MAX: u8 = 100;

    /// Maximum power value accepted by the API.
    pub const MAX_POWER: u16 = 10_000;

    /// Stopped.
    pub const ZERO: Self = Self(0);

    /// Speed used when a stopped fan is switched on without a speed.
    pub const DEFAULT_ACTIVATION: Self = Self(33);

    /// Full speed.
    pub const FULL: Self = Self(100);

    /// Creates a new fan speed.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is greater than 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > Self::MAX {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: u16::from(Self::MAX),
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a fan speed, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Converts an API power value to the nearest percent.
    ///
    /// Negative values map to 0 and values above 10000 to 100.
    #[must_use]
    pub fn from_power(power: i64) -> Self {
        let clamped = power.clamp(0, i64::from(Self::MAX_POWER));
        // clamped is in 0..=10000, so the rounded percent fits in u8
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let percent = ((clamped + 50) / 100) as u8;
        Self::clamped(percent)
    }

    /// Returns the speed percentage.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the power value sent to the API (percent × 100).
    #[must_use]
    #[allow(clippy::cast_lossless)]
    pub const fn power(&self) -> u16 {
        self.0 as u16 * 100
    }

    /// Returns whether the fan is stopped.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for FanSpeed {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_valid_range() {
        for v in 0..=100 {
            let speed = FanSpeed::new(v).unwrap();
            assert_eq!(speed.value(), v);
            assert_eq!(speed.power() % 100, 0);
        }
    }

    #[test]
    fn speed_invalid() {
        assert!(FanSpeed::new(101).is_err());
        assert!(FanSpeed::new(255).is_err());
    }

    #[test]
    fn from_power_rounds_to_percent() {
        assert_eq!(FanSpeed::from_power(3300).value(), 33);
        assert_eq!(FanSpeed::from_power(3349).value(), 33);
        assert_eq!(FanSpeed::from_power(3350).value(), 34);
        assert_eq!(FanSpeed::from_power(-5).value(), 0);
        assert_eq!(FanSpeed::from_power(25_000).value(), 100);
    }

    #[test]
    fn display_shows_percent() {
        assert_eq!(FanSpeed::DEFAULT_ACTIVATION.to_string(), "33%");
    }
}
