//! Document store the ledger and order book persist into.
//!
//! Documents are JSON objects addressed by `(collection, id)`. Collections
//! may be nested by path, e.g. `dailyOrders/2025-01-16/orders`.

use std::fmt;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub const ORDER_RIGHTS: &str = "orderRights";
pub const DEVICE_USAGE: &str = "dailyDeviceUsage";
pub const ACTIVE_ORDERS: &str = "activeOrders";
pub const DAILY_ORDERS: &str = "dailyOrders";
pub const DAILY_COUNTERS: &str = "dailyCounters";
pub const ITEM_RATINGS: &str = "itemRatings";
pub const CAFE_STATUS: &str = "cafeStatus";
pub const STOCK_STATUS: &str = "stockStatus";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("document {0} does not exist")]
    Missing(DocRef),

    #[error("malformed document: {0}")]
    Codec(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocRef {
    pub collection: String,
    pub id: String,
}

impl DocRef {
    pub fn new(collection: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            id: id.into(),
        }
    }
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

/// Equality filter on a top-level field.
#[derive(Debug, Clone)]
pub struct FieldFilter {
    pub field: String,
    pub equals: Value,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, equals: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            equals: equals.into(),
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Value>>;
    async fn set(&self, doc: &DocRef, value: Value) -> StoreResult<()>;
    /// Shallow-merges `fields` into an existing document.
    async fn update(&self, doc: &DocRef, fields: Map<String, Value>) -> StoreResult<()>;
    async fn delete(&self, doc: &DocRef) -> StoreResult<()>;
    /// Documents of one collection, optionally filtered, ascending by `order_by` (else by id).
    async fn query(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
        order_by: Option<&str>,
    ) -> StoreResult<Vec<Document>>;
    /// Starts a read-then-write transaction. Every document read through it
    /// stays locked until commit or drop; dropping discards its writes.
    async fn begin(&self) -> StoreResult<Box<dyn Transaction>>;
}

#[async_trait]
pub trait Transaction: Send {
    async fn get(&mut self, doc: &DocRef) -> StoreResult<Option<Value>>;
    async fn set(&mut self, doc: &DocRef, value: Value) -> StoreResult<()>;
    async fn delete(&mut self, doc: &DocRef) -> StoreResult<()>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
}

pub async fn load<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    doc: &DocRef,
) -> StoreResult<Option<T>> {
    match store.get(doc).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save<T: Serialize>(store: &dyn DocumentStore, doc: &DocRef, record: &T) -> StoreResult<()> {
    store.set(doc, serde_json::to_value(record)?).await
}

pub async fn load_tx<T: DeserializeOwned>(
    tx: &mut dyn Transaction,
    doc: &DocRef,
) -> StoreResult<Option<T>> {
    match tx.get(doc).await? {
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
        None => Ok(None),
    }
}

pub async fn save_tx<T: Serialize>(
    tx: &mut dyn Transaction,
    doc: &DocRef,
    record: &T,
) -> StoreResult<()> {
    tx.set(doc, serde_json::to_value(record)?).await
}

/// Decodes every document of a query result.
pub fn decode_all<T: DeserializeOwned>(docs: Vec<Document>) -> StoreResult<Vec<T>> {
    docs.into_iter()
        .map(|d| serde_json::from_value(d.data).map_err(StoreError::from))
        .collect()
}
