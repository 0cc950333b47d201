// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Fan commands.
//!
//! A [`FanCommand`] may carry only a mode or only a speed. The
//! [`FanCommandResolver`] completes it from the fan's last known state
//! before anything is sent:
//!
//! | Request | Current | Result |
//! |---------|---------|--------|
//! | mode ON | OFF at 0% | ON at the default speed (33%) |
//! | mode OFF | ON at 60% | OFF, speed kept at 60% |
//! | speed 0% | ON at 60% | OFF, speed kept at 60% |
//! | speed 80% | OFF | ON at 80% |
//! | speed 101% | any | rejected |
//! | nothing | any | rejected |

mod resolver;

pub use resolver::{FanCommand, FanCommandResolver, ResolvedCommand};
