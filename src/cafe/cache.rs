use std::{collections::BTreeMap, sync::Arc};

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::clock::LocalClock;
use crate::error::AppError;
use crate::events::{CafeEvent, EventBus, StockChange};
use crate::store::{self, DocRef, DocumentStore, StoreResult, CAFE_STATUS, STOCK_STATUS};

use super::dto::CafeStatusUpdate;
use super::repo_types::{CafeStatus, StockDoc};

fn status_doc() -> DocRef {
    DocRef::new(CAFE_STATUS, "current")
}

fn stock_doc() -> DocRef {
    DocRef::new(STOCK_STATUS, "current")
}

/// In-memory copy of the café's open/closed state and stock flags.
///
/// Loaded once on start, written through to the store on every change, and
/// broadcast to observers after each successful write. Readers may see a
/// value that is a moment stale.
#[derive(Clone)]
pub struct CafeCache {
    store: Arc<dyn DocumentStore>,
    clock: LocalClock,
    events: EventBus,
    status: Arc<RwLock<CafeStatus>>,
    stock: Arc<RwLock<BTreeMap<String, bool>>>,
}

impl CafeCache {
    /// Starts from defaults (open, everything in stock) and then reads the store.
    pub async fn load(store: Arc<dyn DocumentStore>, clock: LocalClock, events: EventBus) -> Self {
        let cache = Self {
            status: Arc::new(RwLock::new(CafeStatus::open_since(clock.now_utc()))),
            stock: Arc::new(RwLock::new(BTreeMap::new())),
            store,
            clock,
            events,
        };
        if let Err(e) = cache.refresh().await {
            warn!(error = %e, "cafe cache load failed; keeping defaults");
        }
        cache
    }

    pub async fn refresh(&self) -> StoreResult<()> {
        if let Some(status) = store::load::<CafeStatus>(self.store.as_ref(), &status_doc()).await? {
            *self.status.write().await = status;
        }
        if let Some(doc) = store::load::<StockDoc>(self.store.as_ref(), &stock_doc()).await? {
            *self.stock.write().await = doc.items;
        }
        Ok(())
    }

    pub async fn status(&self) -> CafeStatus {
        self.status.read().await.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.status.read().await.is_open
    }

    pub async fn update_status(&self, update: CafeStatusUpdate) -> Result<CafeStatus, AppError> {
        let prayer_info = match update.closure_reason.as_deref() {
            Some("prayer") => update.prayer_info,
            _ => None,
        };
        let next = CafeStatus {
            is_open: update.is_open,
            last_updated: self.clock.now_utc(),
            closure_reason: update.closure_reason,
            custom_message: update.custom_message,
            custom_detail: update.custom_detail,
            prayer_info,
            saturday_menu_active: update.saturday_menu_active,
            saturday_menu_items: update.saturday_menu_items,
        };

        let mut current = self.status.write().await;
        store::save(self.store.as_ref(), &status_doc(), &next).await?;
        *current = next.clone();
        drop(current);

        info!(
            is_open = next.is_open,
            reason = next.closure_reason.as_deref().unwrap_or("manual"),
            "cafe status changed"
        );
        self.events.publish(CafeEvent::CafeStatus(next.clone()));
        Ok(next)
    }

    pub async fn stock(&self) -> BTreeMap<String, bool> {
        self.stock.read().await.clone()
    }

    pub async fn is_available(&self, item: &str) -> bool {
        self.stock.read().await.get(item).copied().unwrap_or(true)
    }

    pub async fn set_stock(&self, item: &str, available: bool) -> Result<(), AppError> {
        let mut stock = self.stock.write().await;
        let mut items = stock.clone();
        items.insert(item.to_string(), available);
        let doc = StockDoc {
            items,
            last_updated: self.clock.now_utc(),
        };
        store::save(self.store.as_ref(), &stock_doc(), &doc).await?;
        *stock = doc.items;
        drop(stock);

        info!(item, available, "stock updated");
        self.events.publish(CafeEvent::StockUpdated(StockChange {
            item_name: item.to_string(),
            is_available: available,
        }));
        Ok(())
    }
}
