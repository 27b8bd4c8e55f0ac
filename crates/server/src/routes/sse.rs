use std::collections::VecDeque;
use std::convert::Infallible;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::state::AppState;

pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 1000;
pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct EventsQuery {
    /// Only forward events of this project
    pub project_id: Option<String>,
}

/// Recently streamed events, replayed to clients reconnecting with
/// `Last-Event-ID`
pub struct EventBuffer {
    events: VecDeque<events::EventEnvelope>,
    max_size: usize,
}

impl EventBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            events: VecDeque::with_capacity(max_size),
            max_size,
        }
    }

    pub fn push(&mut self, envelope: events::EventEnvelope) {
        // Several live streams may see the same envelope
        if self.events.iter().any(|e| e.id == envelope.id) {
            return;
        }
        if self.events.len() >= self.max_size {
            self.events.pop_front();
        }
        self.events.push_back(envelope);
    }

    pub fn events_after(&self, event_id: Uuid) -> Vec<events::EventEnvelope> {
        self.events
            .iter()
            .skip_while(|envelope| envelope.id != event_id)
            .skip(1)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

pub type SharedEventBuffer = Arc<RwLock<EventBuffer>>;

fn matches_project(envelope: &events::EventEnvelope, project_id: Option<&str>) -> bool {
    match (project_id, envelope.event.project_id()) {
        (Some(wanted), Some(actual)) => wanted == actual,
        _ => true,
    }
}

fn envelope_to_sse_event(envelope: &events::EventEnvelope) -> Result<Event, Infallible> {
    let data = serde_json::to_string(&envelope).unwrap_or_else(|_| "{}".to_string());

    Ok(Event::default()
        .id(envelope.id.to_string())
        .event(envelope.event.event_type())
        .data(data))
}

/// Live bus events for one client. Every envelope is recorded in the replay
/// buffer, and only the ones matching `project_id` are forwarded.
fn live_events(
    rx: broadcast::Receiver<events::EventEnvelope>,
    project_id: Option<String>,
    buffer: SharedEventBuffer,
) -> impl Stream<Item = Result<Event, Infallible>> {
    BroadcastStream::new(rx).filter_map(move |result| {
        let project_id = project_id.clone();
        let buffer = Arc::clone(&buffer);

        async move {
            match result {
                Ok(envelope) => {
                    buffer
                        .write()
                        .unwrap_or_else(|poisoned| poisoned.into_inner())
                        .push(envelope.clone());

                    if !matches_project(&envelope, project_id.as_deref()) {
                        return None;
                    }

                    Some(envelope_to_sse_event(&envelope))
                }
                Err(e) => {
                    tracing::warn!("SSE broadcast error: {:?}", e);
                    None
                }
            }
        }
    })
}

#[utoipa::path(
    get,
    path = "/api/events",
    params(
        ("project_id" = Option<String>, Query, description = "Only stream events of this project"),
    ),
    responses(
        (status = 200, description = "SSE event stream"),
    ),
    tag = "events"
)]
pub async fn events_stream(
    State(state): State<AppState>,
    Query(query): Query<EventsQuery>,
    headers: axum::http::HeaderMap,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let project_id = query.project_id;
    let last_event_id = headers
        .get("Last-Event-ID")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<Uuid>().ok());

    let buffer = Arc::clone(&state.event_buffer);
    let buffer_for_live = Arc::clone(&buffer);

    let rx = state.event_bus.subscribe();

    let missed_events: Vec<_> = match last_event_id {
        Some(event_id) => buffer
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .events_after(event_id)
            .into_iter()
            .filter(|e| matches_project(e, project_id.as_deref()))
            .collect(),
        None => vec![],
    };

    let missed_stream =
        futures::stream::iter(missed_events.into_iter().map(|e| envelope_to_sse_event(&e)));

    let live_stream = live_events(rx, project_id, buffer_for_live);

    let stream = missed_stream.chain(live_stream);

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use events::EventEnvelope;

    fn started(project_id: &str) -> EventEnvelope {
        EventEnvelope::new(events::Event::GenerationStarted {
            project_id: project_id.to_string(),
        })
    }

    #[test]
    fn test_event_buffer_events_after() {
        let mut buffer = EventBuffer::new(3);
        let e1 = started("p1");
        let e2 = started("p2");
        let e3 = started("p3");

        buffer.push(e1.clone());
        buffer.push(e2.clone());
        buffer.push(e3.clone());

        let after = buffer.events_after(e1.id);
        assert_eq!(after.len(), 2);
        assert_eq!(after[0].id, e2.id);
        assert!(buffer.events_after(e3.id).is_empty());
        assert!(buffer.events_after(Uuid::new_v4()).is_empty());
    }

    #[test]
    fn test_event_buffer_evicts_oldest() {
        let mut buffer = EventBuffer::new(2);
        let e1 = started("p1");
        buffer.push(e1.clone());
        buffer.push(started("p2"));
        buffer.push(started("p3"));

        assert_eq!(buffer.len(), 2);
        assert!(buffer.events_after(e1.id).is_empty());
    }

    #[test]
    fn test_event_buffer_ignores_duplicates() {
        let mut buffer = EventBuffer::new(5);
        let e1 = started("p1");
        buffer.push(e1.clone());
        buffer.push(e1);
        assert_eq!(buffer.len(), 1);
    }

    #[tokio::test]
    async fn test_live_events_filter_and_buffer() {
        let bus = events::EventBus::new();
        let buffer: SharedEventBuffer = Arc::new(RwLock::new(EventBuffer::new(10)));
        let stream = live_events(bus.subscribe(), Some("p1".to_string()), Arc::clone(&buffer));
        futures::pin_mut!(stream);

        bus.publish(started("p2"));
        bus.publish(started("p1"));

        assert!(stream.next().await.is_some());
        // the skipped event is still kept for replay
        assert_eq!(buffer.read().unwrap().len(), 2);
    }

    #[test]
    fn test_project_filter() {
        let event = started("p1");
        assert!(matches_project(&event, None));
        assert!(matches_project(&event, Some("p1")));
        assert!(!matches_project(&event, Some("p2")));

        let error = EventEnvelope::new(events::Event::Error {
            message: "boom".to_string(),
            context: None,
        });
        assert!(matches_project(&error, Some("p1")));
    }
}
