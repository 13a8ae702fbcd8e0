#![allow(dead_code)]
//! CRDT sync logic for exchanging events between peers.
//!
//! Implements a simple grow-only set merge:
//! 1. Exchange vector clocks (highest seq per actor)
//! 2. Compute missing events based on clock differences
//! 3. Transfer missing events
//! 4. Idempotent merge (INSERT OR IGNORE)

use crate::network::protocol::{Message, SyncEvent};
use crate::storage::{ActorId, Event, Storage, StorageError};

/// Convert storage events to protocol sync events.
pub fn events_to_sync(events: Vec<Event>) -> Vec<SyncEvent> {
    events
        .into_iter()
        .map(|e| SyncEvent {
            actor_id: e.actor_id.to_hex(),
            seq: e.seq,
            event_type: e.event_type,
            payload: e.payload,
            created_at: e.created_at,
        })
        .collect()
}

/// Convert protocol sync events to storage events.
pub fn sync_to_events(events: Vec<SyncEvent>) -> Vec<Event> {
    events
        .into_iter()
        .filter_map(|e| {
            let actor_bytes = hex_to_bytes(&e.actor_id)?;
            let actor_id = ActorId::from_bytes(&actor_bytes)?;
            Some(Event {
                actor_id,
                seq: e.seq,
                event_type: e.event_type,
                payload: e.payload,
                created_at: e.created_at,
            })
        })
        .collect()
}

/// Convert a hex string to bytes.
fn hex_to_bytes(hex: &str) -> Option<Vec<u8>> {
    if hex.len() != 32 {
        return None;
    }
    let mut bytes = Vec::with_capacity(16);
    for i in 0..16 {
        let byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16).ok()?;
        bytes.push(byte);
    }
    Some(bytes)
}

/// Create a sync request message from storage.
pub fn create_sync_request(storage: &Storage) -> Result<Message, StorageError> {
    let vclock = storage.get_vector_clock()?;
    let clock_vec: Vec<(String, i64)> = vclock
        .into_iter()
        .map(|(actor_id, seq)| (actor_id.to_hex(), seq))
        .collect();
    Ok(Message::SyncRequest {
        vector_clock: clock_vec,
    })
}

/// Process a received sync request and return events the peer is missing.
///
/// For each actor in our local storage, if the peer's clock shows a lower seq
/// (or doesn't know about the actor at all), we include those missing events.
pub fn process_sync_request(
    storage: &Storage,
    peer_clock: &[(String, i64)],
) -> Result<Message, StorageError> {
    // Convert peer clock to a map for easy lookup
    let peer_map: std::collections::HashMap<String, i64> = peer_clock
        .iter()
        .cloned()
        .collect();

    // Get our local clock
    let our_clock = storage.get_vector_clock()?;

    // Collect events the peer is missing
    let mut missing_events = Vec::new();

    for (actor_id, our_seq) in our_clock {
        let actor_hex = actor_id.to_hex();
        let peer_seq = peer_map.get(&actor_hex).copied().unwrap_or(0);

        if our_seq > peer_seq {
            // Peer is missing events from this actor
            let events = storage.get_events_after(&actor_id, peer_seq)?;
            missing_events.extend(events);
        }
    }

    Ok(Message::SyncEvents {
        events: events_to_sync(missing_events),
    })
}

/// Process received sync events by inserting them into storage.
///
/// Returns the number of new events inserted (duplicates are ignored).
pub fn process_sync_events(
    storage: &Storage,
    sync_events: Vec<SyncEvent>,
) -> Result<usize, StorageError> {
    let events = sync_to_events(sync_events);
    let mut inserted = 0;

    for event in events {
        if storage.insert_remote_event(&event)? {
            inserted += 1;
        }
    }

    Ok(inserted)
}
