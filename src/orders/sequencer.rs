use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::clock::format_date;
use crate::store::{self, DocRef, DocumentStore, StoreResult, Transaction, DAILY_COUNTERS};

use super::repo_types::DailyCounter;

fn counter_doc(date: Date) -> DocRef {
    DocRef::new(DAILY_COUNTERS, format_date(date))
}

/// Next order number for `date`, starting at 1. The counter stays locked
/// until `tx` commits, so concurrent callers never share a number.
pub async fn next_order_number_tx(
    tx: &mut dyn Transaction,
    date: Date,
    now: OffsetDateTime,
) -> StoreResult<u32> {
    let doc = counter_doc(date);
    let current: Option<DailyCounter> = store::load_tx(tx, &doc).await?;
    let next = current.map(|c| c.last_order_number).unwrap_or(0) + 1;
    store::save_tx(
        tx,
        &doc,
        &DailyCounter {
            last_order_number: next,
            date,
            last_updated: now,
        },
    )
    .await?;
    debug!(date = %format_date(date), order_number = next, "order number assigned");
    Ok(next)
}

pub async fn next_order_number(
    store: &dyn DocumentStore,
    date: Date,
    now: OffsetDateTime,
) -> StoreResult<u32> {
    let mut tx = store.begin().await?;
    let next = next_order_number_tx(tx.as_mut(), date, now).await?;
    tx.commit().await?;
    Ok(next)
}
