// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! MQTT push notifications for fan state changes.
//!
//! Each fan has its own broker login. The broker publishes on
//! `<mqtt_username>/status` whenever the fan changes state; the payload is
//! not used, it only tells us that a refresh is due.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::Result;
use crate::event::RefreshRequest;

/// Marker of the periodic keep-alive messages, which carry no state change.
const KEEP_ALIVE_MARKER: &str = "sendKeepAlive";

/// Broker connection settings.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::protocol::PushConfig;
/// use std::time::Duration;
///
/// let config = PushConfig::new("broker.example.com").with_port(8883);
/// assert_eq!(config.port(), 8883);
/// assert_eq!(config.keep_alive(), Duration::from_secs(60));
/// ```
#[derive(Debug, Clone)]
pub struct PushConfig {
    host: String,
    port: u16,
    keep_alive: Duration,
    reconnect_delay: Duration,
}

impl PushConfig {
    /// Default broker port.
    pub const DEFAULT_PORT: u16 = 1883;
    /// Default keep-alive interval.
    pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(60);
    /// Default pause before polling again after a broker error.
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);

    /// Creates a configuration for the given broker host.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            keep_alive: Self::DEFAULT_KEEP_ALIVE,
            reconnect_delay: Self::DEFAULT_RECONNECT_DELAY,
        }
    }

    /// Sets the broker port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the keep-alive interval.
    #[must_use]
    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive = keep_alive;
        self
    }

    /// Sets the pause after a broker error.
    #[must_use]
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// Returns the broker host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the broker port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns the keep-alive interval.
    #[must_use]
    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Returns the pause after a broker error.
    #[must_use]
    pub fn reconnect_delay(&self) -> Duration {
        self.reconnect_delay
    }
}

/// Returns true if a status payload announces a state change.
///
/// # Examples
///
/// ```
/// use smartcocoon_lib::protocol::is_state_notification;
///
/// assert!(is_state_notification(r#"{"mode":"auto"}"#));
/// assert!(!is_state_notification(r#"{"cmd":"sendKeepAlive"}"#));
/// ```
#[must_use]
pub fn is_state_notification(payload: &str) -> bool {
    !payload.contains(KEEP_ALIVE_MARKER)
}

/// Broker topic carrying a fan's status notifications.
#[must_use]
pub fn status_topic(mqtt_username: &str) -> String {
    format!("{mqtt_username}/status")
}

/// Background subscription for one fan.
///
/// Every state notification sends [`RefreshRequest::Fan`] on the refresh
/// channel. The task stops when the channel closes, on
/// [`disconnect`](Self::disconnect), or when the listener is dropped.
#[derive(Debug)]
pub struct PushListener {
    client: AsyncClient,
    fan_id: String,
    topic: String,
    task: JoinHandle<()>,
}

impl PushListener {
    /// Starts listening for a fan's notifications.
    ///
    /// The broker connection is established in the background; the status
    /// topic is subscribed again after every reconnection.
    ///
    /// # Errors
    ///
    /// Returns error if the subscription request cannot be queued.
    pub async fn connect(
        config: &PushConfig,
        mqtt_username: &str,
        mqtt_password: &str,
        fan_id: impl Into<String>,
        refresh_tx: mpsc::Sender<RefreshRequest>,
    ) -> Result<Self> {
        let fan_id = fan_id.into();
        let client_id = format!("smartcocoon_{}", uuid::Uuid::new_v4().simple());

        let mut options = MqttOptions::new(client_id, config.host(), config.port());
        options.set_keep_alive(config.keep_alive());
        options.set_clean_session(true);
        options.set_credentials(mqtt_username, mqtt_password);

        let (client, event_loop) = AsyncClient::new(options, 10);
        let topic = status_topic(mqtt_username);
        client.subscribe(topic.as_str(), QoS::AtMostOnce).await?;

        tracing::debug!(
            fan_id = %fan_id,
            host = config.host(),
            port = config.port(),
            topic = %topic,
            "Starting MQTT push listener"
        );

        let task = tokio::spawn(run_event_loop(
            event_loop,
            client.clone(),
            topic.clone(),
            fan_id.clone(),
            config.reconnect_delay(),
            refresh_tx,
        ));

        Ok(Self {
            client,
            fan_id,
            topic,
            task,
        })
    }

    /// Returns the physical id of the watched fan.
    #[must_use]
    pub fn fan_id(&self) -> &str {
        &self.fan_id
    }

    /// Returns the subscribed topic.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns true while the background task runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Disconnects from the broker.
    ///
    /// The background task ends once the disconnect has been sent.
    ///
    /// # Errors
    ///
    /// Returns error if the disconnect request cannot be queued, which
    /// happens when the task has already stopped.
    pub async fn disconnect(&self) -> Result<()> {
        tracing::debug!(fan_id = %self.fan_id, "Stopping MQTT push listener");
        self.client.disconnect().await?;
        Ok(())
    }
}

impl Drop for PushListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run_event_loop(
    mut event_loop: EventLoop,
    client: AsyncClient,
    topic: String,
    fan_id: String,
    reconnect_delay: Duration,
    refresh_tx: mpsc::Sender<RefreshRequest>,
) {
    let mut reconnecting = false;

    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(connack))) => {
                tracing::debug!(fan_id = %fan_id, ?connack, "MQTT connected");
                // Clean sessions drop subscriptions across reconnects
                if reconnecting
                    && let Err(e) = client.try_subscribe(topic.as_str(), QoS::AtMostOnce)
                {
                    tracing::error!(fan_id = %fan_id, error = %e, "MQTT subscribe failed");
                }
                reconnecting = true;
            }
            Ok(Event::Incoming(Packet::SubAck(suback))) => {
                tracing::debug!(fan_id = %fan_id, ?suback, "MQTT subscription acknowledged");
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload);
                tracing::debug!(
                    fan_id = %fan_id,
                    topic = %publish.topic,
                    payload = %payload,
                    "Received MQTT message"
                );

                if is_state_notification(&payload)
                    && refresh_tx
                        .send(RefreshRequest::Fan(fan_id.clone()))
                        .await
                        .is_err()
                {
                    tracing::debug!(fan_id = %fan_id, "Refresh channel closed");
                    break;
                }
            }
            Ok(Event::Outgoing(Outgoing::Disconnect)) => break,
            Ok(_) => {}
            Err(e) => {
                if refresh_tx.is_closed() {
                    break;
                }
                tracing::error!(fan_id = %fan_id, error = %e, "MQTT event loop error");
                tokio::time::sleep(reconnect_delay).await;
            }
        }
    }
}
