use std::{cmp::Ordering, collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{DocRef, Document, DocumentStore, FieldFilter, StoreError, StoreResult, Transaction};

type Docs = BTreeMap<DocRef, Value>;

/// Process-local store. Transactions hold the whole map, so they are serializable.
#[derive(Clone, Default)]
pub struct MemoryStore {
    docs: Arc<Mutex<Docs>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, doc: &DocRef) -> StoreResult<Option<Value>> {
        Ok(self.docs.lock().await.get(doc).cloned())
    }

    async fn set(&self, doc: &DocRef, value: Value) -> StoreResult<()> {
        self.docs.lock().await.insert(doc.clone(), value);
        Ok(())
    }

    async fn update(&self, doc: &DocRef, fields: Map<String, Value>) -> StoreResult<()> {
        let mut docs = self.docs.lock().await;
        match docs.get_mut(doc) {
            Some(Value::Object(existing)) => {
                existing.extend(fields);
                Ok(())
            }
            Some(other) => {
                *other = Value::Object(fields);
                Ok(())
            }
            None => Err(StoreError::Missing(doc.clone())),
        }
    }

    async fn delete(&self, doc: &DocRef) -> StoreResult<()> {
        self.docs.lock().await.remove(doc);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        filter: Option<&FieldFilter>,
        order_by: Option<&str>,
    ) -> StoreResult<Vec<Document>> {
        let docs = self.docs.lock().await;
        let mut found: Vec<Document> = docs
            .iter()
            .filter(|(key, _)| key.collection == collection)
            .filter(|(_, data)| match filter {
                Some(f) => data.get(&f.field) == Some(&f.equals),
                None => true,
            })
            .map(|(key, data)| Document {
                id: key.id.clone(),
                data: data.clone(),
            })
            .collect();
        drop(docs);

        if let Some(field) = order_by {
            found.sort_by(|a, b| compare_fields(a.data.get(field), b.data.get(field)));
        }
        Ok(found)
    }

    async fn begin(&self) -> StoreResult<Box<dyn Transaction>> {
        let guard = self.docs.clone().lock_owned().await;
        Ok(Box::new(MemoryTransaction {
            guard,
            writes: BTreeMap::new(),
        }))
    }
}

struct MemoryTransaction {
    guard: OwnedMutexGuard<Docs>,
    // None marks a delete.
    writes: BTreeMap<DocRef, Option<Value>>,
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn get(&mut self, doc: &DocRef) -> StoreResult<Option<Value>> {
        if let Some(pending) = self.writes.get(doc) {
            return Ok(pending.clone());
        }
        Ok(self.guard.get(doc).cloned())
    }

    async fn set(&mut self, doc: &DocRef, value: Value) -> StoreResult<()> {
        self.writes.insert(doc.clone(), Some(value));
        Ok(())
    }

    async fn delete(&mut self, doc: &DocRef) -> StoreResult<()> {
        self.writes.insert(doc.clone(), None);
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { mut guard, writes } = *self;
        for (doc, value) in writes {
            match value {
                Some(value) => {
                    guard.insert(doc, value);
                }
                None => {
                    guard.remove(&doc);
                }
            }
        }
        Ok(())
    }
}

fn rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(_) => 4,
    }
}

fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}
