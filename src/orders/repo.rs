use time::Date;

use crate::clock::{format_date, parse_date};
use crate::store::{
    self, decode_all, DocRef, DocumentStore, FieldFilter, StoreResult, Transaction, ACTIVE_ORDERS,
    DAILY_ORDERS,
};

use super::repo_types::{ActiveOrder, ArchiveMarker, CompletedOrder};

pub fn active_doc(order_id: &str) -> DocRef {
    DocRef::new(ACTIVE_ORDERS, order_id)
}

pub fn archive_collection(date: Date) -> String {
    format!("{DAILY_ORDERS}/{}/orders", format_date(date))
}

fn archive_marker(date: Date) -> DocRef {
    DocRef::new(DAILY_ORDERS, format_date(date))
}

pub async fn insert_active_tx(tx: &mut dyn Transaction, order: &ActiveOrder) -> StoreResult<()> {
    store::save_tx(tx, &active_doc(&order.order_id), order).await
}

pub async fn get_active_tx(tx: &mut dyn Transaction, order_id: &str) -> StoreResult<Option<ActiveOrder>> {
    store::load_tx(tx, &active_doc(order_id)).await
}

/// Moves an order into the archive of the day it was placed.
pub async fn archive_tx(tx: &mut dyn Transaction, done: &CompletedOrder) -> StoreResult<()> {
    let date = done.order.date;
    let doc = DocRef::new(archive_collection(date), done.order.order_id.as_str());
    store::save_tx(tx, &doc, done).await?;
    store::save_tx(tx, &archive_marker(date), &ArchiveMarker { date }).await?;
    tx.delete(&active_doc(&done.order.order_id)).await
}

/// Active orders placed on `date`, oldest first.
pub async fn list_active(store: &dyn DocumentStore, date: Date) -> StoreResult<Vec<ActiveOrder>> {
    let filter = FieldFilter::eq("date", format_date(date));
    let docs = store
        .query(ACTIVE_ORDERS, Some(&filter), Some("createdAt"))
        .await?;
    decode_all(docs)
}

/// Archived orders of `date`, in completion order.
pub async fn list_completed(store: &dyn DocumentStore, date: Date) -> StoreResult<Vec<CompletedOrder>> {
    let docs = store
        .query(&archive_collection(date), None, Some("completedAt"))
        .await?;
    decode_all(docs)
}

/// Every date with at least one archived order, ascending.
pub async fn list_archive_dates(store: &dyn DocumentStore) -> StoreResult<Vec<Date>> {
    let docs = store.query(DAILY_ORDERS, None, None).await?;
    let mut dates: Vec<Date> = docs
        .iter()
        .filter_map(|d| parse_date(&d.id).ok())
        .collect();
    dates.sort();
    Ok(dates)
}
