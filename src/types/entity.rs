// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::fmt;

/// Resource collections exposed by the cloud API.
///
/// Each entity is listed with `GET {base}/{entity}` and returned wrapped in
/// an object keyed by the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    /// Locations (the API calls them client systems).
    Locations,
    /// Thermostats linked to the account.
    Thermostats,
    /// Rooms.
    Rooms,
    /// Fans.
    Fans,
}

impl EntityType {
    /// Returns the URL path segment and response key for this entity.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Locations => "client_systems",
            Self::Thermostats => "thermostats",
            Self::Rooms => "rooms",
            Self::Fans => "fans",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locations_are_client_systems() {
        assert_eq!(EntityType::Locations.as_str(), "client_systems");
        assert_eq!(EntityType::Fans.to_string(), "fans");
    }
}
