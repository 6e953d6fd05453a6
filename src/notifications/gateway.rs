// ABOUTME: Real-time push interface: emit(gymId, event, payload), best-effort by contract
// ABOUTME: Transport (WebSocket wire format) is out of scope; this is an in-process room fan-out
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

/// One real-time event addressed to a tenant's room.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GatewayEvent {
    /// The gym whose room this event belongs to.
    pub gym_id: Uuid,
    /// Event name, e.g. `bodyMetricsChanged`, `lookupChanged`.
    pub event: String,
    /// Opaque payload.
    pub payload: Value,
}

/// The real-time push contract. Delivery is best-effort: implementations must not
/// return an error that callers would propagate, since a push failure must never fail
/// the write that triggered it.
#[async_trait]
pub trait PushGateway: Send + Sync {
    /// Emit one event into a tenant's room. Never fails from the caller's perspective.
    async fn emit(&self, gym_id: Uuid, event: &str, payload: Value);
}

/// In-process fan-out over a `tokio::sync::broadcast` channel per gym, lazily created.
/// WebSocket handlers subscribe a client to a gym's room by calling [`Self::subscribe`].
#[derive(Clone)]
pub struct BroadcastGateway {
    rooms: std::sync::Arc<DashMap<Uuid, broadcast::Sender<GatewayEvent>>>,
}

impl Default for BroadcastGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastGateway {
    /// Default channel capacity per room; old events are dropped for slow subscribers
    /// rather than applying backpressure to writers.
    const ROOM_CAPACITY: usize = 256;

    /// Build an empty gateway with no rooms yet.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rooms: std::sync::Arc::new(DashMap::new()),
        }
    }

    /// Subscribe to a gym's room, creating it if this is the first subscriber.
    #[must_use]
    pub fn subscribe(&self, gym_id: Uuid) -> broadcast::Receiver<GatewayEvent> {
        self.rooms
            .entry(gym_id)
            .or_insert_with(|| broadcast::channel(Self::ROOM_CAPACITY).0)
            .subscribe()
    }
}

#[async_trait]
impl PushGateway for BroadcastGateway {
    async fn emit(&self, gym_id: Uuid, event: &str, payload: Value) {
        let Some(sender) = self.rooms.get(&gym_id) else {
            return;
        };
        let message = GatewayEvent {
            gym_id,
            event: event.to_owned(),
            payload,
        };
        // SendError means no subscribers are currently listening; that is a normal,
        // expected outcome for a best-effort fan-out, not a fault.
        let _ = sender.send(message);
    }
}
