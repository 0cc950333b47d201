// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Serialize};

/// A location (the API calls it a client system).
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::response::Location;
///
/// let json = r#"{
///     "id": 7,
///     "name": "Home",
///     "location": {
///         "street": "1 Main St", "city": "Ottawa", "state": "ON",
///         "country": "CA", "postal_code": "K1A 0A1"
///     }
/// }"#;
/// let location: Location = serde_json::from_str(json).unwrap();
/// assert_eq!(location.address.city.as_deref(), Some("Ottawa"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Server-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Postal address.
    #[serde(rename = "location")]
    pub address: Address,
}

/// Postal address of a [`Location`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street line.
    #[serde(default)]
    pub street: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State or province.
    #[serde(default)]
    pub state: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
}
