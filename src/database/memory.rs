use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::document::{
    with_id, DeleteResult, Document, Filter, InsertOneResult, Projection, UpdateResult, ID_FIELD,
};
use super::store::{DocumentStore, StoreError};

type Collection = Vec<(Uuid, Document)>;

/// In-process document store. Collections keep insertion order.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Collection>>,
    operations: AtomicUsize,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations served so far (seeding excluded)
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Insert documents directly, keeping an `_id` when it is a valid UUID
    pub async fn seed(&self, collection: &str, docs: Vec<Document>) -> Vec<Uuid> {
        let mut collections = self.collections.write().await;
        let entries = collections.entry(collection.to_string()).or_default();

        docs.into_iter()
            .map(|mut doc| {
                let id = doc
                    .remove(ID_FIELD)
                    .and_then(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()))
                    .unwrap_or_else(Uuid::new_v4);
                entries.push((id, doc));
                id
            })
            .collect()
    }

    /// Load a JSON file shaped `{ "<collection>": [ {...}, ... ] }`
    pub async fn seed_from_file(&self, path: &Path) -> anyhow::Result<usize> {
        let raw = tokio::fs::read_to_string(path).await?;
        let parsed: HashMap<String, Vec<Value>> = serde_json::from_str(&raw)?;

        let mut total = 0;
        for (collection, values) in parsed {
            let docs: Vec<Document> = values
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(map) => Some(map),
                    _ => None,
                })
                .collect();
            total += docs.len();
            info!("Seeded {} documents into {}", docs.len(), collection);
            self.seed(&collection, docs).await;
        }
        Ok(total)
    }

    fn record_operation(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        projection: Option<&Projection>,
    ) -> Result<Vec<Document>, StoreError> {
        self.record_operation();
        let collections = self.collections.read().await;

        let Some(entries) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        Ok(entries
            .iter()
            .filter(|(id, doc)| filter.matches(id, doc))
            .map(|(id, doc)| {
                let doc = with_id(*id, doc.clone());
                match projection {
                    Some(p) => p.apply(doc),
                    None => doc,
                }
            })
            .collect())
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Document>, StoreError> {
        self.record_operation();
        let collections = self.collections.read().await;

        Ok(collections.get(collection).and_then(|entries| {
            entries
                .iter()
                .find(|(id, doc)| filter.matches(id, doc))
                .map(|(id, doc)| with_id(*id, doc.clone()))
        }))
    }

    async fn insert_one(&self, collection: &str, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        self.record_operation();
        doc.remove(ID_FIELD);

        let id = Uuid::new_v4();
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push((id, doc));

        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id: id,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        set: Document,
    ) -> Result<UpdateResult, StoreError> {
        self.record_operation();
        let mut collections = self.collections.write().await;

        let target = collections.get_mut(collection).and_then(|entries| {
            entries
                .iter_mut()
                .find(|(id, doc)| filter.matches(id, doc))
        });

        let Some((_, doc)) = target else {
            return Ok(UpdateResult {
                acknowledged: true,
                matched_count: 0,
                modified_count: 0,
            });
        };

        let mut modified = false;
        for (field, value) in set {
            if field == ID_FIELD {
                continue;
            }
            if doc.get(&field) != Some(&value) {
                doc.insert(field, value);
                modified = true;
            }
        }

        Ok(UpdateResult {
            acknowledged: true,
            matched_count: 1,
            modified_count: u64::from(modified),
        })
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, StoreError> {
        self.record_operation();
        let mut collections = self.collections.write().await;

        let deleted = match collections.get_mut(collection) {
            Some(entries) => match entries.iter().position(|(id, doc)| filter.matches(id, doc)) {
                Some(index) => {
                    entries.remove(index);
                    1
                }
                None => 0,
            },
            None => 0,
        };

        Ok(DeleteResult {
            acknowledged: true,
            deleted_count: deleted,
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn close(&self) {
        info!("Closed in-memory document store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[tokio::test]
    async fn insert_then_find_by_field() {
        let store = MemoryDocumentStore::new();
        store
            .insert_one("bookings", doc(json!({"email": "a@x.com", "status": "pending"})))
            .await
            .unwrap();
        store
            .insert_one("bookings", doc(json!({"email": "b@x.com", "status": "pending"})))
            .await
            .unwrap();

        let found = store
            .find("bookings", &Filter::all().eq("email", "a@x.com"), None)
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["email"], "a@x.com");
        assert!(found[0].contains_key(ID_FIELD));
    }

    #[tokio::test]
    async fn insert_ignores_client_id() {
        let store = MemoryDocumentStore::new();
        let result = store
            .insert_one("bookings", doc(json!({"_id": "client-chosen", "email": "a@x.com"})))
            .await
            .unwrap();

        let found = store.find_one("bookings", &Filter::by_id(result.inserted_id)).await.unwrap();
        assert_eq!(found.unwrap()[ID_FIELD], result.inserted_id.to_string());
    }

    #[tokio::test]
    async fn update_reports_matched_and_modified() {
        let store = MemoryDocumentStore::new();
        let id = store
            .insert_one("bookings", doc(json!({"email": "a@x.com", "status": "pending"})))
            .await
            .unwrap()
            .inserted_id;

        let set = doc(json!({"status": "confirmed"}));
        let first = store.update_one("bookings", &Filter::by_id(id), set.clone()).await.unwrap();
        assert_eq!((first.matched_count, first.modified_count), (1, 1));

        let again = store.update_one("bookings", &Filter::by_id(id), set).await.unwrap();
        assert_eq!((again.matched_count, again.modified_count), (1, 0));

        let missing = store
            .update_one("bookings", &Filter::by_id(Uuid::new_v4()), doc(json!({"status": "x"})))
            .await
            .unwrap();
        assert_eq!((missing.matched_count, missing.modified_count), (0, 0));
    }

    #[tokio::test]
    async fn delete_missing_is_zero() {
        let store = MemoryDocumentStore::new();
        let result = store.delete_one("bookings", &Filter::by_id(Uuid::new_v4())).await.unwrap();
        assert_eq!(result.deleted_count, 0);
        assert_eq!(store.operations(), 1);
    }

    #[tokio::test]
    async fn seed_keeps_uuid_ids() {
        let store = MemoryDocumentStore::new();
        let id = Uuid::new_v4();
        let ids = store
            .seed(
                "services",
                vec![
                    doc(json!({"_id": id.to_string(), "title": "Oil change"})),
                    doc(json!({"_id": "01", "title": "Brakes"})),
                ],
            )
            .await;

        assert_eq!(ids[0], id);
        assert_ne!(ids[1].to_string(), "01");
        assert_eq!(store.operations(), 0);
    }
}
