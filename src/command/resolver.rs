// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Resolution of partial fan commands against the last known state.

use crate::error::CommandError;
use crate::types::{FanMode, FanSpeed};

/// A requested change of mode, speed, or both.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::command::FanCommand;
/// use smartcocoon_lib::types::FanMode;
///
/// let on = FanCommand::mode_only(FanMode::On);
/// assert_eq!(on.mode, Some(FanMode::On));
/// assert_eq!(on.speed, None);
///
/// let half = FanCommand::speed_only(50);
/// assert_eq!(half.speed, Some(50));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FanCommand {
    /// Requested mode.
    pub mode: Option<FanMode>,
    /// Requested speed in percent; validated during resolution.
    pub speed: Option<u8>,
}

impl FanCommand {
    /// Creates a command from optional parts.
    #[must_use]
    pub const fn new(mode: Option<FanMode>, speed: Option<u8>) -> Self {
        Self { mode, speed }
    }

    /// Requests a mode, keeping the speed decided by the resolver.
    #[must_use]
    pub const fn mode_only(mode: FanMode) -> Self {
        Self::new(Some(mode), None)
    }

    /// Requests a speed, switching the mode on or off as needed.
    #[must_use]
    pub const fn speed_only(percent: u8) -> Self {
        Self::new(None, Some(percent))
    }

    /// Requests both a mode and a speed.
    #[must_use]
    pub const fn mode_and_speed(mode: FanMode, percent: u8) -> Self {
        Self::new(Some(mode), Some(percent))
    }
}

/// The mode and speed to send to the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedCommand {
    /// Mode to set.
    pub mode: FanMode,
    /// Speed to set.
    pub speed: FanSpeed,
}

impl ResolvedCommand {
    /// Whether the fan drives air after this command.
    ///
    /// `last_reported` is used for modes where the device decides.
    #[must_use]
    pub const fn fan_on(&self, last_reported: bool) -> bool {
        self.mode.drives_air(last_reported)
    }
}

/// Turns a [`FanCommand`] into a complete mode and speed.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::command::{FanCommand, FanCommandResolver};
/// use smartcocoon_lib::types::{FanMode, FanSpeed};
///
/// let resolver = FanCommandResolver::default();
///
/// // A stopped fan switched on starts at the default speed
/// let resolved = resolver
///     .resolve(FanMode::Off, FanSpeed::ZERO, &FanCommand::mode_only(FanMode::On))
///     .unwrap();
/// assert_eq!(resolved.mode, FanMode::On);
/// assert_eq!(resolved.speed.value(), 33);
///
/// // Setting speed 0 turns a running fan off and remembers its speed
/// let running = FanSpeed::new(60).unwrap();
/// let resolved = resolver
///     .resolve(FanMode::On, running, &FanCommand::speed_only(0))
///     .unwrap();
/// assert_eq!(resolved.mode, FanMode::Off);
/// assert_eq!(resolved.speed, running);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FanCommandResolver {
    default_speed: FanSpeed,
}

impl FanCommandResolver {
    /// Creates a resolver that starts stopped fans at `default_speed`.
    #[must_use]
    pub const fn new(default_speed: FanSpeed) -> Self {
        Self { default_speed }
    }

    /// Returns the activation speed.
    #[must_use]
    pub const fn default_speed(&self) -> FanSpeed {
        self.default_speed
    }

    /// Resolves `command` against the fan's current mode and speed.
    ///
    /// # Errors
    ///
    /// - `CommandError::EmptyRequest` if neither mode nor speed is set
    /// - `CommandError::SpeedOutOfRange` if the speed exceeds 100
    pub fn resolve(
        &self,
        current_mode: FanMode,
        current_speed: FanSpeed,
        command: &FanCommand,
    ) -> Result<ResolvedCommand, CommandError> {
        let requested_speed = match (command.mode, command.speed) {
            (None, None) => return Err(CommandError::EmptyRequest),
            (_, Some(percent)) => {
                Some(FanSpeed::new(percent).map_err(|_| CommandError::SpeedOutOfRange(percent))?)
            }
            (_, None) => None,
        };

        let mode = match (command.mode, requested_speed) {
            (Some(mode), _) => mode,
            (None, Some(speed)) if speed.is_zero() => match current_mode {
                FanMode::On => FanMode::Off,
                other => other,
            },
            (None, _) => match current_mode {
                FanMode::Off => FanMode::On,
                other => other,
            },
        };

        let speed = match requested_speed {
            // Stopping through speed 0 keeps the last speed for next start
            Some(speed) if speed.is_zero() && command.mode.is_none() && mode == FanMode::Off => {
                current_speed
            }
            Some(speed) => speed,
            None if mode == FanMode::On && current_speed.is_zero() => self.default_speed,
            None => current_speed,
        };

        Ok(ResolvedCommand { mode, speed })
    }
}

impl Default for FanCommandResolver {
    fn default() -> Self {
        Self::new(FanSpeed::DEFAULT_ACTIVATION)
    }
}
