// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast channel for fan events.

use tokio::sync::broadcast;

use super::FanEvent;

const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Fans out [`FanEvent`]s to every subscriber.
///
/// A subscriber that falls more than the capacity behind loses the oldest
/// events and sees `RecvError::Lagged`.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::event::{EventBus, FanEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.publish(FanEvent::Added { fan_id: "A1B2".to_string() });
/// assert_eq!(rx.try_recv().unwrap().fan_id(), "A1B2");
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<FanEvent>,
}

impl EventBus {
    /// Creates a bus with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Creates a bus buffering up to `capacity` events per subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Returns a receiver for events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FanEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of live receivers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Publishes an event. Without subscribers it is dropped.
    pub fn publish(&self, event: FanEvent) {
        let _ = self.sender.send(event);
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(fan_id: &str) -> FanEvent {
        FanEvent::Added {
            fan_id: fan_id.to_string(),
        }
    }

    #[test]
    fn subscriber_count_tracks_receivers() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        drop(rx1);
        assert_eq!(bus.subscriber_count(), 1);
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::new();
        bus.publish(added("X"));
    }

    #[tokio::test]
    async fn every_subscriber_gets_the_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(added("FAN1"));

        assert_eq!(rx1.recv().await.unwrap().fan_id(), "FAN1");
        assert_eq!(rx2.recv().await.unwrap().fan_id(), "FAN1");
    }

    #[test]
    fn clones_share_the_channel() {
        let bus = EventBus::with_capacity(8);
        let clone = bus.clone();
        let mut rx = bus.subscribe();

        clone.publish(added("FAN2"));
        assert_eq!(rx.try_recv().unwrap().fan_id(), "FAN2");
    }
}
