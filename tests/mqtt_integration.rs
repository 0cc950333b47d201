// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for MQTT push listeners using mockforge-mqtt.

#![cfg(feature = "mqtt")]

use std::sync::Arc;
use std::time::Duration;

use mockforge_mqtt::broker::MqttConfig;
use mockforge_mqtt::start_mqtt_server;
use serde_json::json;
use smartcocoon_lib::manager::DeviceRegistry;
use smartcocoon_lib::protocol::{ApiClient, ApiConfig, PushConfig, PushListener};
use tokio::sync::mpsc;
use tokio::time::sleep;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Helper to find an available port for testing.
fn get_test_port() -> u16 {
    use std::sync::atomic::{AtomicU16, Ordering};
    static PORT_COUNTER: AtomicU16 = AtomicU16::new(18950);
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Starts a mock MQTT broker on the given port.
async fn start_mock_broker(port: u16) {
    let config = MqttConfig {
        port,
        host: "127.0.0.1".to_string(),
        ..Default::default()
    };

    tokio::spawn(async move {
        let _ = start_mqtt_server(config).await;
    });

    // Give the broker time to bind
    sleep(Duration::from_millis(500)).await;
}

fn push_config(port: u16) -> PushConfig {
    PushConfig::new("127.0.0.1")
        .with_port(port)
        .with_reconnect_delay(Duration::from_millis(100))
}

mod push_listener {
    use super::*;

    #[tokio::test]
    async fn connect_to_broker() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let (tx, _rx) = mpsc::channel(4);
        let listener = PushListener::connect(&push_config(port), "mq-user", "mq-pass", "F1", tx)
            .await
            .unwrap();

        sleep(Duration::from_millis(200)).await;

        assert_eq!(listener.fan_id(), "F1");
        assert_eq!(listener.topic(), "mq-user/status");
        assert!(listener.is_running());
    }

    #[tokio::test]
    async fn disconnect_stops_listener() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let (tx, _rx) = mpsc::channel(4);
        let listener = PushListener::connect(&push_config(port), "mq-user", "mq-pass", "F1", tx)
            .await
            .unwrap();
        sleep(Duration::from_millis(200)).await;

        listener.disconnect().await.unwrap();

        for _ in 0..50 {
            if !listener.is_running() {
                break;
            }
            sleep(Duration::from_millis(20)).await;
        }
        assert!(!listener.is_running());
    }

    #[tokio::test]
    async fn unreachable_broker_keeps_retrying() {
        let (tx, _rx) = mpsc::channel(4);
        // Nothing listens on this port
        let listener = PushListener::connect(&push_config(1), "mq-user", "mq-pass", "F1", tx)
            .await
            .unwrap();

        sleep(Duration::from_millis(300)).await;
        assert!(listener.is_running());
    }
}

mod registry {
    use super::*;

    #[tokio::test]
    async fn one_listener_per_fan_with_credentials() {
        let port = get_test_port();
        start_mock_broker(port).await;

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/sign_in"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("access-token", "token")
                    .insert_header("expiry", "3600")
                    .insert_header("client", "client")
                    .set_body_json(json!({ "data": { "id": 1, "email": "me@example.com" } })),
            )
            .mount(&server)
            .await;
        for (entity, items) in [
            ("client_systems", json!([])),
            ("thermostats", json!([])),
            ("rooms", json!([])),
            (
                "fans",
                json!([
                    {
                        "id": 1, "fan_id": "F1", "mode": "auto", "fan_on": true,
                        "connected": true, "power": 1000,
                        "mqtt_username": "mq-f1", "mqtt_password": "pw"
                    },
                    {
                        "id": 2, "fan_id": "F2", "mode": "auto", "fan_on": true,
                        "connected": true, "power": 1000
                    }
                ]),
            ),
        ] {
            let mut body = serde_json::Map::new();
            body.insert(entity.to_string(), items);
            Mock::given(method("GET"))
                .and(path(format!("/api/{entity}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .mount(&server)
                .await;
        }

        let config = ApiConfig::new().with_base_url(format!("{}/api", server.uri()));
        let registry = Arc::new(DeviceRegistry::new(Arc::new(ApiClient::new(config).unwrap())));
        assert!(registry.start("me@example.com", "pw").await.unwrap());

        let (tx, _rx) = mpsc::channel(4);
        let listeners = registry
            .spawn_push_listeners(&push_config(port), &tx)
            .await
            .unwrap();

        assert_eq!(listeners.len(), 1);
        assert_eq!(listeners[0].fan_id(), "F1");
        assert_eq!(listeners[0].topic(), "mq-f1/status");
    }
}
