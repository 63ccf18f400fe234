//! Server-Sent Events
//!
//! Each connection first receives the current snapshot of every collection,
//! then every newer snapshot (`event: <Collection>`) and every lifecycle event
//! (`event: <type>`). A slow client skips intermediate snapshots but never
//! receives them out of order.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use inward_common::events::{GateEvent, Snapshot};
use inward_common::models::Collection;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::AppState;

enum Next {
    Snapshot(Arc<Snapshot>),
    Event(GateEvent),
}

fn snapshot_event(snapshot: &Snapshot) -> Option<Event> {
    match serde_json::to_string(snapshot) {
        Ok(json) => Some(
            Event::default()
                .event(snapshot.collection().as_str())
                .id(snapshot.version.to_string())
                .data(json),
        ),
        Err(e) => {
            warn!(collection = %snapshot.collection(), error = %e, "Failed to serialize snapshot");
            None
        }
    }
}

fn gate_event(event: &GateEvent) -> Option<Event> {
    match serde_json::to_string(event) {
        Ok(json) => Some(Event::default().event(event.event_type()).data(json)),
        Err(e) => {
            warn!(event_type = event.event_type(), error = %e, "Failed to serialize event");
            None
        }
    }
}

/// GET /events
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    info!("New SSE client connected");

    let mut settings_rx = state.fanout.watch(Collection::Settings);
    let mut clients_rx = state.fanout.watch(Collection::Clients);
    let mut products_rx = state.fanout.watch(Collection::Products);
    let mut users_rx = state.fanout.watch(Collection::Users);
    let mut entries_rx = state.fanout.watch(Collection::Entries);
    let mut event_rx = state.event_bus.subscribe();

    let stream = async_stream::stream! {
        // Initial state: one snapshot per collection
        for rx in [&mut settings_rx, &mut clients_rx, &mut products_rx, &mut users_rx, &mut entries_rx] {
            let snapshot: Arc<Snapshot> = rx.borrow_and_update().clone();
            if let Some(event) = snapshot_event(&snapshot) {
                yield Ok(event);
            }
        }

        loop {
            let next = tokio::select! {
                Ok(()) = settings_rx.changed() => Next::Snapshot(settings_rx.borrow_and_update().clone()),
                Ok(()) = clients_rx.changed() => Next::Snapshot(clients_rx.borrow_and_update().clone()),
                Ok(()) = products_rx.changed() => Next::Snapshot(products_rx.borrow_and_update().clone()),
                Ok(()) = users_rx.changed() => Next::Snapshot(users_rx.borrow_and_update().clone()),
                Ok(()) = entries_rx.changed() => Next::Snapshot(entries_rx.borrow_and_update().clone()),
                received = event_rx.recv() => match received {
                    Ok(event) => Next::Event(event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("SSE client lagged, skipped {} events", skipped);
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };

            let event = match next {
                Next::Snapshot(snapshot) => {
                    debug!(collection = %snapshot.collection(), version = snapshot.version, "SSE: sending snapshot");
                    snapshot_event(&snapshot)
                }
                Next::Event(event) => gate_event(&event),
            };
            if let Some(event) = event {
                yield Ok(event);
            }
        }

        info!("SSE client stream ended");
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("heartbeat"),
    )
}
