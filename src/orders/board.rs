use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::AppError;
use crate::events::{CafeEvent, EventBus};

use super::dto::{OrderReadyNotice, PickedUpNotice};

/// Orders that are ready and waiting at the counter, as shown on the pickup screen.
///
/// Lives in memory only; a restart clears the screen, not the order archive.
#[derive(Clone)]
pub struct ReadyBoard {
    entries: Arc<RwLock<Vec<OrderReadyNotice>>>,
    events: EventBus,
}

impl ReadyBoard {
    pub fn new(events: EventBus) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            events,
        }
    }

    /// Oldest first.
    pub async fn list(&self) -> Vec<OrderReadyNotice> {
        self.entries.read().await.clone()
    }

    pub async fn post(&self, notice: OrderReadyNotice) {
        let mut entries = self.entries.write().await;
        if entries.iter().all(|e| e.id != notice.id) {
            entries.push(notice);
        }
    }

    /// Takes an order off the screen once the customer has collected it.
    pub async fn pick_up(&self, order_id: &str) -> Result<OrderReadyNotice, AppError> {
        let mut entries = self.entries.write().await;
        let Some(pos) = entries.iter().position(|e| e.id == order_id) else {
            return Err(AppError::NotFound(format!("order {order_id} is not waiting for pickup")));
        };
        let taken = entries.remove(pos);
        drop(entries);

        info!(order_id, order_number = taken.order_number, "order picked up");
        self.events.publish(CafeEvent::OrderPickedUp(PickedUpNotice {
            id: taken.id.clone(),
        }));
        Ok(taken)
    }
}
