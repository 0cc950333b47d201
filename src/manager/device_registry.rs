// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of the account's locations, rooms, thermostats and fans.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::command::{FanCommand, FanCommandResolver};
use crate::error::{Error, Result};
use crate::event::{EventBus, FanEvent, RefreshRequest};
use crate::protocol::ApiClient;
#[cfg(feature = "mqtt")]
use crate::protocol::{PushConfig, PushListener};
use crate::response::{FanRecord, Location, Room, Thermostat};
use crate::state::FanState;
use crate::types::{EntityType, FanMode};

/// Room name used when a fan's room is not known.
pub const UNKNOWN_ROOM: &str = "Unknown";

/// In-memory view of the account, kept current by full refreshes, per-fan
/// refreshes and acknowledged commands.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use smartcocoon_lib::manager::DeviceRegistry;
/// use smartcocoon_lib::protocol::{ApiClient, ApiConfig};
///
/// # async fn example() -> smartcocoon_lib::Result<()> {
/// let client = Arc::new(ApiClient::new(ApiConfig::new())?);
/// let registry = Arc::new(DeviceRegistry::new(client));
///
/// if registry.start("me@example.com", "hunter2").await? {
///     for fan in registry.fans().await {
///         println!("{} in {:?}: {}", fan.physical_id(), fan.room_name(), fan.mode());
///     }
///     registry.set_speed("A1B2", 60).await?;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct DeviceRegistry {
    client: Arc<ApiClient>,
    resolver: FanCommandResolver,
    locations: RwLock<HashMap<i64, Location>>,
    thermostats: RwLock<HashMap<i64, Thermostat>>,
    rooms: RwLock<HashMap<i64, Room>>,
    fans: RwLock<HashMap<String, FanState>>,
    event_bus: EventBus,
}

impl DeviceRegistry {
    /// Creates an empty registry on top of an API client.
    ///
    /// Stopped fans switched on start at the client's configured default
    /// speed.
    #[must_use]
    pub fn new(client: Arc<ApiClient>) -> Self {
        let resolver = FanCommandResolver::new(client.config().default_speed());
        Self {
            client,
            resolver,
            locations: RwLock::new(HashMap::new()),
            thermostats: RwLock::new(HashMap::new()),
            rooms: RwLock::new(HashMap::new()),
            fans: RwLock::new(HashMap::new()),
            event_bus: EventBus::new(),
        }
    }

    /// Returns the underlying API client.
    #[must_use]
    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// Subscribes to fan events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FanEvent> {
        self.event_bus.subscribe()
    }

    /// Signs in and loads everything.
    ///
    /// Returns `Ok(false)` without refreshing if the sign-in response was
    /// incomplete.
    ///
    /// # Errors
    ///
    /// Returns error if the sign-in request or the refresh fails.
    pub async fn start(&self, username: &str, password: &str) -> Result<bool> {
        if !self.client.authenticate(username, password).await? {
            return Ok(false);
        }
        self.refresh_all().await?;
        Ok(true)
    }

    /// Reloads locations, thermostats, rooms and fans.
    ///
    /// The first three are fetched concurrently and replace the cached
    /// collections. Fans are fetched next so their room names can be joined;
    /// unseen fans are added and known ones overwritten.
    ///
    /// # Errors
    ///
    /// Returns the first failing fetch; the cache is left untouched.
    pub async fn refresh_all(&self) -> Result<()> {
        let (locations, thermostats, rooms) = tokio::try_join!(
            self.client.list::<Location>(EntityType::Locations),
            self.client.list::<Thermostat>(EntityType::Thermostats),
            self.client.list::<Room>(EntityType::Rooms),
        )?;
        let records = self.client.list::<FanRecord>(EntityType::Fans).await?;

        tracing::debug!(
            locations = locations.len(),
            thermostats = thermostats.len(),
            rooms = rooms.len(),
            fans = records.len(),
            "Refreshed SmartCocoon account"
        );

        *self.locations.write().await = locations.into_iter().map(|l| (l.id, l)).collect();
        *self.thermostats.write().await = thermostats.into_iter().map(|t| (t.id, t)).collect();

        let rooms: HashMap<i64, Room> = rooms.into_iter().map(|r| (r.id, r)).collect();
        let events = {
            let mut fans = self.fans.write().await;
            records
                .iter()
                .flat_map(|record| upsert_fan(&mut fans, record, &rooms))
                .collect::<Vec<_>>()
        };
        *self.rooms.write().await = rooms;

        for event in events {
            self.event_bus.publish(event);
        }
        Ok(())
    }

    /// Reloads a single fan.
    ///
    /// # Errors
    ///
    /// Returns `Error::FanNotFound` if the fan has never been seen, or the
    /// request error.
    pub async fn refresh_fan(&self, fan_id: &str) -> Result<FanState> {
        let internal_id = self.internal_id(fan_id).await?;
        let record = self.client.get_fan(internal_id).await?;

        let (state, events) = {
            let rooms = self.rooms.read().await;
            let mut fans = self.fans.write().await;
            let events = upsert_fan(&mut fans, &record, &rooms);
            let state = fans
                .get(&record.fan_id)
                .cloned()
                .ok_or_else(|| Error::FanNotFound(record.fan_id.clone()))?;
            (state, events)
        };

        for event in events {
            self.event_bus.publish(event);
        }
        Ok(state)
    }

    /// Handles one refresh signal.
    ///
    /// # Errors
    ///
    /// Same as [`refresh_all`](Self::refresh_all) or
    /// [`refresh_fan`](Self::refresh_fan).
    pub async fn handle_refresh(&self, request: &RefreshRequest) -> Result<()> {
        match request {
            RefreshRequest::All => self.refresh_all().await,
            RefreshRequest::Fan(fan_id) => self.refresh_fan(fan_id).await.map(|_| ()),
        }
    }

    /// Consumes refresh signals in the background until the channel closes.
    ///
    /// Failed refreshes are logged and the worker keeps going.
    pub fn spawn_refresh_worker(
        self: &Arc<Self>,
        mut rx: mpsc::Receiver<RefreshRequest>,
    ) -> JoinHandle<()> {
        let registry = Arc::clone(self);

        tokio::spawn(async move {
            tracing::debug!("Starting refresh worker");

            while let Some(request) = rx.recv().await {
                tracing::debug!(?request, "Processing refresh request");
                if let Err(e) = registry.handle_refresh(&request).await {
                    tracing::warn!(?request, error = %e, "Refresh failed");
                }
            }

            tracing::debug!("Refresh channel closed, stopping worker");
        })
    }

    /// Starts a push listener for every fan that has broker credentials.
    ///
    /// # Errors
    ///
    /// Returns error if a listener cannot subscribe.
    #[cfg(feature = "mqtt")]
    pub async fn spawn_push_listeners(
        &self,
        config: &PushConfig,
        refresh_tx: &mpsc::Sender<RefreshRequest>,
    ) -> Result<Vec<PushListener>> {
        let logins: Vec<(String, String, String)> = self
            .fans
            .read()
            .await
            .values()
            .filter_map(|fan| {
                fan.mqtt_credentials().map(|(user, pass)| {
                    (fan.physical_id().to_string(), user.to_string(), pass.to_string())
                })
            })
            .collect();

        let mut listeners = Vec::with_capacity(logins.len());
        for (fan_id, username, password) in logins {
            let listener =
                PushListener::connect(config, &username, &password, fan_id, refresh_tx.clone())
                    .await?;
            listeners.push(listener);
        }
        Ok(listeners)
    }

    /// Sends a command to a fan and updates the cache once acknowledged.
    ///
    /// The command is resolved against the cached mode and speed; the cache
    /// is updated optimistically without fetching the fan again.
    ///
    /// # Errors
    ///
    /// - `Error::FanNotFound` if the fan is unknown
    /// - `Error::InvalidCommand` if the command is rejected; nothing is sent
    /// - the request error if the update fails; the cache is unchanged
    pub async fn apply_command(&self, fan_id: &str, command: FanCommand) -> Result<FanState> {
        let (internal_id, mode, speed) = {
            let fans = self.fans.read().await;
            let fan = fans
                .get(fan_id)
                .ok_or_else(|| Error::FanNotFound(fan_id.to_string()))?;
            (fan.internal_id(), fan.mode(), fan.speed())
        };

        let resolved = self.resolver.resolve(mode, speed, &command)?;
        tracing::debug!(
            fan_id,
            mode = %resolved.mode,
            speed = %resolved.speed,
            "Sending fan command"
        );

        self.client
            .update_fan(internal_id, resolved.mode, resolved.speed)
            .await?;

        let state = {
            let mut fans = self.fans.write().await;
            let fan = fans
                .get_mut(fan_id)
                .ok_or_else(|| Error::FanNotFound(fan_id.to_string()))?;
            fan.apply_command(&resolved);
            fan.clone()
        };

        self.event_bus.publish(FanEvent::Updated {
            fan_id: fan_id.to_string(),
            state: state.clone(),
        });
        Ok(state)
    }

    /// Switches a fan to always on.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn turn_on(&self, fan_id: &str) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::mode_only(FanMode::On))
            .await
    }

    /// Switches a fan to always off, remembering its speed.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn turn_off(&self, fan_id: &str) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::mode_only(FanMode::Off))
            .await
    }

    /// Lets the fan follow the thermostat.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn set_auto(&self, fan_id: &str) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::mode_only(FanMode::Auto))
            .await
    }

    /// Switches a fan to eco mode.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn set_eco(&self, fan_id: &str) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::mode_only(FanMode::Eco))
            .await
    }

    /// Sets a fan's speed in percent; 0 turns a running fan off.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn set_speed(&self, fan_id: &str, percent: u8) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::speed_only(percent))
            .await
    }

    /// Sets mode and speed together.
    ///
    /// # Errors
    ///
    /// See [`apply_command`](Self::apply_command).
    pub async fn set_mode_and_speed(
        &self,
        fan_id: &str,
        mode: FanMode,
        percent: u8,
    ) -> Result<FanState> {
        self.apply_command(fan_id, FanCommand::mode_and_speed(mode, percent))
            .await
    }

    /// Returns every known fan, ordered by internal id.
    pub async fn fans(&self) -> Vec<FanState> {
        let mut fans: Vec<FanState> = self.fans.read().await.values().cloned().collect();
        fans.sort_by_key(FanState::internal_id);
        fans
    }

    /// Returns one fan by physical id.
    pub async fn fan(&self, fan_id: &str) -> Option<FanState> {
        self.fans.read().await.get(fan_id).cloned()
    }

    /// Returns the cached rooms, ordered by id.
    pub async fn rooms(&self) -> Vec<Room> {
        sorted_values(&*self.rooms.read().await, |r| r.id)
    }

    /// Returns the cached locations, ordered by id.
    pub async fn locations(&self) -> Vec<Location> {
        sorted_values(&*self.locations.read().await, |l| l.id)
    }

    /// Returns the cached thermostats, ordered by id.
    pub async fn thermostats(&self) -> Vec<Thermostat> {
        sorted_values(&*self.thermostats.read().await, |t| t.id)
    }

    /// Returns a room's name, or `"Unknown"` if it is not cached.
    pub async fn room_name(&self, room_id: Option<i64>) -> String {
        room_name_in(&*self.rooms.read().await, room_id).to_string()
    }

    async fn internal_id(&self, fan_id: &str) -> Result<i64> {
        self.fans
            .read()
            .await
            .get(fan_id)
            .map(FanState::internal_id)
            .ok_or_else(|| Error::FanNotFound(fan_id.to_string()))
    }
}

/// Inserts or overwrites a fan, returning the events to publish.
fn upsert_fan(
    fans: &mut HashMap<String, FanState>,
    record: &FanRecord,
    rooms: &HashMap<i64, Room>,
) -> Vec<FanEvent> {
    let room_name = room_name_in(rooms, record.room_id);

    if let Some(existing) = fans.get_mut(&record.fan_id) {
        let mut changed = existing.update_from_record(record);
        if existing.room_name() != Some(room_name) {
            existing.set_room_name(room_name);
            changed = true;
        }
        return if changed {
            vec![FanEvent::Updated {
                fan_id: record.fan_id.clone(),
                state: existing.clone(),
            }]
        } else {
            Vec::new()
        };
    }

    let mut state = FanState::from_record(record);
    state.set_room_name(room_name);
    tracing::debug!(fan_id = %record.fan_id, room = room_name, "Discovered fan");
    fans.insert(record.fan_id.clone(), state);

    vec![FanEvent::Added {
        fan_id: record.fan_id.clone(),
    }]
}

fn room_name_in(rooms: &HashMap<i64, Room>, room_id: Option<i64>) -> &str {
    room_id
        .and_then(|id| rooms.get(&id))
        .map_or(UNKNOWN_ROOM, |room| room.name.as_str())
}

fn sorted_values<T: Clone>(map: &HashMap<i64, T>, key: impl Fn(&T) -> i64) -> Vec<T> {
    let mut values: Vec<T> = map.values().cloned().collect();
    values.sort_by_key(|v| key(v));
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ApiConfig;

    fn room(id: i64, name: &str) -> Room {
        serde_json::from_value(serde_json::json!({"id": id, "name": name})).unwrap()
    }

    fn fan_record(fan_id: &str, room_id: Option<i64>, mode: &str) -> FanRecord {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "fan_id": fan_id,
            "mode": mode,
            "fan_on": false,
            "connected": true,
            "power": 4000,
            "room_id": room_id
        }))
        .unwrap()
    }

    fn registry() -> DeviceRegistry {
        DeviceRegistry::new(Arc::new(ApiClient::new(ApiConfig::new()).unwrap()))
    }

    #[test]
    fn room_name_lookup() {
        let rooms: HashMap<i64, Room> = [(1, room(1, "Bedroom"))].into_iter().collect();
        assert_eq!(room_name_in(&rooms, Some(1)), "Bedroom");
        assert_eq!(room_name_in(&rooms, Some(2)), UNKNOWN_ROOM);
        assert_eq!(room_name_in(&rooms, None), UNKNOWN_ROOM);
    }

    #[test]
    fn upsert_adds_then_updates() {
        let rooms: HashMap<i64, Room> = [(5, room(5, "Den"))].into_iter().collect();
        let mut fans = HashMap::new();

        let events = upsert_fan(&mut fans, &fan_record("F1", Some(5), "auto"), &rooms);
        assert!(matches!(events.as_slice(), [FanEvent::Added { fan_id }] if fan_id == "F1"));
        assert_eq!(fans["F1"].room_name(), Some("Den"));

        let events = upsert_fan(&mut fans, &fan_record("F1", Some(5), "auto"), &rooms);
        assert!(events.is_empty());

        let events = upsert_fan(&mut fans, &fan_record("F1", Some(9), "always_on"), &rooms);
        assert!(matches!(events.as_slice(), [FanEvent::Updated { .. }]));
        assert_eq!(fans["F1"].mode(), FanMode::On);
        assert_eq!(fans["F1"].room_name(), Some(UNKNOWN_ROOM));
    }

    #[tokio::test]
    async fn unknown_fan_is_reported() {
        let registry = registry();

        let err = registry.turn_on("missing").await.unwrap_err();
        assert!(matches!(err, Error::FanNotFound(ref id) if id == "missing"));

        let err = registry.refresh_fan("missing").await.unwrap_err();
        assert!(matches!(err, Error::FanNotFound(_)));
    }

    #[tokio::test]
    async fn empty_registry() {
        let registry = registry();
        assert!(registry.fans().await.is_empty());
        assert!(registry.rooms().await.is_empty());
        assert!(registry.fan("F1").await.is_none());
        assert_eq!(registry.room_name(Some(1)).await, UNKNOWN_ROOM);
    }

    #[tokio::test]
    async fn refresh_worker_stops_when_channel_closes() {
        let registry = Arc::new(registry());
        let (tx, rx) = mpsc::channel(4);

        let worker = registry.spawn_refresh_worker(rx);
        drop(tx);

        worker.await.unwrap();
    }
}
