use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};
use tracing::{debug, warn};

use crate::cafe::repo_types::CafeStatus;
use crate::orders::dto::{NewOrderNotice, OrderReadyNotice, PickedUpNotice};
use crate::state::AppState;

/// Something connected observers (admin screens, order boards) care about.
#[derive(Debug, Clone, PartialEq)]
pub enum CafeEvent {
    NewOrder(NewOrderNotice),
    OrderReady(OrderReadyNotice),
    OrderPickedUp(PickedUpNotice),
    CafeStatus(CafeStatus),
    StockUpdated(StockChange),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockChange {
    pub item_name: String,
    pub is_available: bool,
}

impl CafeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CafeEvent::NewOrder(_) => "newOrder",
            CafeEvent::OrderReady(_) => "orderReady",
            CafeEvent::OrderPickedUp(_) => "orderPickedUp",
            CafeEvent::CafeStatus(_) => "cafeStatus",
            CafeEvent::StockUpdated(_) => "stockUpdated",
        }
    }

    fn to_sse(&self) -> Result<Event, axum::Error> {
        let event = Event::default().event(self.name());
        match self {
            CafeEvent::NewOrder(n) => event.json_data(n),
            CafeEvent::OrderReady(n) => event.json_data(n),
            CafeEvent::OrderPickedUp(n) => event.json_data(n),
            CafeEvent::CafeStatus(s) => event.json_data(s),
            CafeEvent::StockUpdated(c) => event.json_data(c),
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CafeEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Fire and forget; having no listeners is normal.
    pub fn publish(&self, event: CafeEvent) {
        let name = event.name();
        let receivers = self.tx.send(event).unwrap_or(0);
        debug!(event = name, receivers, "event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CafeEvent> {
        self.tx.subscribe()
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/events", get(stream_events))
}

pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.events.subscribe()).filter_map(|msg| match msg {
        Ok(event) => match event.to_sse() {
            Ok(sse) => Some(Ok(sse)),
            Err(e) => {
                warn!(error = %e, event = event.name(), "event encoding failed");
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            warn!(skipped, "event subscriber lagged");
            None
        }
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}
