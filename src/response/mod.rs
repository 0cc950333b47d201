// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed records for SmartCocoon API payloads.
//!
//! Payloads are decoded at the boundary: a missing required field is a
//! decode error, never a silently empty value. Listing endpoints wrap their
//! items in an object keyed by the entity name, see [`decode_list`].

mod fan;
mod location;
mod room;
mod sign_in;
mod thermostat;

pub use fan::FanRecord;
pub use location::{Address, Location};
pub use room::Room;
pub use sign_in::{SignInResponse, SignInUser};
pub use thermostat::Thermostat;

use serde::de::DeserializeOwned;

use crate::error::ParseError;
use crate::types::EntityType;

/// Decodes a `{ "<entity>": [ ... ] }` listing response.
///
/// # Errors
///
/// Returns `ParseError::MissingField` if the entity key is absent and
/// `ParseError::Json` if an item does not decode.
pub fn decode_list<T: DeserializeOwned>(
    mut value: serde_json::Value,
    entity: EntityType,
) -> Result<Vec<T>, ParseError> {
    let items = value
        .get_mut(entity.as_str())
        .map(serde_json::Value::take)
        .ok_or_else(|| ParseError::MissingField(entity.as_str().to_string()))?;
    serde_json::from_value(items).map_err(Into::into)
}
