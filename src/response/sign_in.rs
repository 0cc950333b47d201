// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::Deserialize;

/// Body of a successful `auth/sign_in` response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInResponse {
    /// The authenticated user.
    pub data: SignInUser,
}

/// User identity returned by the sign-in exchange.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SignInUser {
    /// Numeric user id.
    pub id: i64,
    /// Email, sent back as the `uid` header.
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_user() {
        let json = r#"{"data": {"id": 5, "email": "me@example.com", "provider": "email"}}"#;
        let response: SignInResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.data.id, 5);
        assert_eq!(response.data.email, "me@example.com");
    }

    #[test]
    fn missing_email_is_an_error() {
        let json = r#"{"data": {"id": 5}}"#;
        assert!(serde_json::from_str::<SignInResponse>(json).is_err());
    }
}
