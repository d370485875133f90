//! MongoDB storage backend.

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::{Bson, Document, doc};
use mongodb::options::ReturnDocument;
use mongodb::{Client, Collection};
use serde_json::Value;

use super::{DefaultKeyBuilder, KeyBuilder, StateData, Storage};
use crate::error::StorageResult;
use crate::key::StorageKey;

/// Database used when the connection string names none.
pub const DEFAULT_DATABASE: &str = "colloquy_fsm";
/// Collection holding the context records.
pub const DEFAULT_COLLECTION: &str = "records";

/// Storage backed by a MongoDB collection.
///
/// Each context lives in a single document keyed by the builder-derived
/// `_id`, with optional `state` and `data` fields. Clearing a field
/// unsets it, and a document left with neither field is deleted so the
/// collection only ever holds live contexts.
#[derive(Clone)]
pub struct MongoStorage {
    collection: Collection<Document>,
    key_builder: Arc<dyn KeyBuilder>,
}

impl MongoStorage {
    /// Connects using a `mongodb://` connection string.
    ///
    /// The database named in the connection string is used when
    /// present, [`DEFAULT_DATABASE`] otherwise.
    pub async fn from_url(url: &str) -> StorageResult<Self> {
        let client = Client::with_uri_str(url).await?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(DEFAULT_DATABASE));
        Ok(Self::new(database.collection(DEFAULT_COLLECTION)))
    }

    /// Wraps an existing collection.
    pub fn new(collection: Collection<Document>) -> Self {
        Self {
            collection,
            key_builder: Arc::new(DefaultKeyBuilder::new()),
        }
    }

    /// Replaces the key builder.
    pub fn with_key_builder(mut self, key_builder: impl KeyBuilder + 'static) -> Self {
        self.key_builder = Arc::new(key_builder);
        self
    }

    /// Builds the document `_id` for a context. No part suffix: the
    /// whole record is one document.
    fn document_id(&self, key: &StorageKey) -> StorageResult<String> {
        self.key_builder.build(key, None)
    }

    async fn find_projected(
        &self,
        key: &StorageKey,
        projection: Document,
    ) -> StorageResult<Option<Document>> {
        let id = self.document_id(key)?;
        Ok(self
            .collection
            .find_one(doc! { "_id": id })
            .projection(projection)
            .await?)
    }

    /// Unsets one field and deletes the document once neither `state`
    /// nor `data` remains.
    async fn unset_field(&self, key: &StorageKey, field: &str) -> StorageResult<()> {
        let id = self.document_id(key)?;
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": &id }, doc! { "$unset": { field: "" } })
            .return_document(ReturnDocument::After)
            .await?;

        if let Some(updated) = updated
            && !updated.contains_key("state")
            && !updated.contains_key("data")
        {
            // Filter on absence again so a concurrent write wins.
            self.collection
                .delete_one(doc! {
                    "_id": id,
                    "state": { "$exists": false },
                    "data": { "$exists": false },
                })
                .await?;
        }
        Ok(())
    }

    fn data_from_document(document: Option<Document>) -> StorageResult<StateData> {
        match document.and_then(|mut doc| doc.remove("data")) {
            Some(Bson::Document(data)) => {
                Ok(mongodb::bson::from_bson(Bson::Document(data))?)
            }
            _ => Ok(StateData::new()),
        }
    }
}

#[async_trait]
impl Storage for MongoStorage {
    async fn get_state(&self, key: &StorageKey) -> StorageResult<Option<String>> {
        let found = self.find_projected(key, doc! { "state": 1 }).await?;
        Ok(found.and_then(|doc| doc.get_str("state").ok().map(str::to_owned)))
    }

    async fn set_state(&self, key: &StorageKey, state: Option<&str>) -> StorageResult<()> {
        match state {
            Some(state) => {
                let id = self.document_id(key)?;
                self.collection
                    .update_one(doc! { "_id": id }, doc! { "$set": { "state": state } })
                    .upsert(true)
                    .await?;
                Ok(())
            }
            None => self.unset_field(key, "state").await,
        }
    }

    async fn get_data(&self, key: &StorageKey) -> StorageResult<StateData> {
        let found = self.find_projected(key, doc! { "data": 1 }).await?;
        Self::data_from_document(found)
    }

    async fn set_data(&self, key: &StorageKey, data: StateData) -> StorageResult<()> {
        if data.is_empty() {
            return self.unset_field(key, "data").await;
        }
        let id = self.document_id(key)?;
        let data = mongodb::bson::to_bson(&data)?;
        self.collection
            .update_one(doc! { "_id": id }, doc! { "$set": { "data": data } })
            .upsert(true)
            .await?;
        Ok(())
    }

    /// Merges server-side with a single dotted-path `$set`, so two
    /// concurrent updates to different fields both land.
    async fn update_data(&self, key: &StorageKey, data: StateData) -> StorageResult<StateData> {
        if data.is_empty() {
            return self.get_data(key).await;
        }
        let id = self.document_id(key)?;
        let mut sets = Document::new();
        for (field, value) in &data {
            sets.insert(format!("data.{field}"), mongodb::bson::to_bson(value)?);
        }
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": sets })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .projection(doc! { "data": 1 })
            .await?;
        Self::data_from_document(updated)
    }

    async fn get_value(&self, key: &StorageKey, field: &str) -> StorageResult<Option<Value>> {
        let mut projection = Document::new();
        projection.insert(format!("data.{field}"), 1);
        let found = self.find_projected(key, projection).await?;
        let value = found
            .and_then(|mut doc| doc.remove("data"))
            .and_then(|data| match data {
                Bson::Document(mut data) => data.remove(field),
                _ => None,
            });
        match value {
            Some(value) => Ok(Some(mongodb::bson::from_bson(value)?)),
            None => Ok(None),
        }
    }

    async fn close(&self) -> StorageResult<()> {
        // Connections are pooled by the client and shut down with it.
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const TEST_URL: &str = "mongodb://127.0.0.1:27017/colloquy_fsm_test";

    fn key(user_id: i64) -> StorageKey {
        StorageKey::new(7, -42, user_id)
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB server"]
    async fn test_mongo_state_round_trip() {
        let storage = MongoStorage::from_url(TEST_URL).await.unwrap();
        let key = key(2001);

        storage.set_state(&key, None).await.unwrap();
        assert_eq!(storage.get_state(&key).await.unwrap(), None);

        storage.set_state(&key, Some("A:x")).await.unwrap();
        assert_eq!(
            storage.get_state(&key).await.unwrap(),
            Some("A:x".to_string())
        );

        storage.set_state(&key, None).await.unwrap();
        assert_eq!(storage.get_state(&key).await.unwrap(), None);
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB server"]
    async fn test_mongo_update_merges_fields() {
        let storage = MongoStorage::from_url(TEST_URL).await.unwrap();
        let key = key(2002);

        storage.set_data(&key, StateData::new()).await.unwrap();
        let mut first = StateData::new();
        first.insert("name".to_string(), json!("alice"));
        storage.set_data(&key, first).await.unwrap();

        let mut patch = StateData::new();
        patch.insert("age".to_string(), json!(30));
        let merged = storage.update_data(&key, patch).await.unwrap();
        assert_eq!(merged["name"], json!("alice"));
        assert_eq!(merged["age"], json!(30));

        assert_eq!(
            storage.get_value(&key, "age").await.unwrap(),
            Some(json!(30))
        );
        assert_eq!(storage.get_value(&key, "missing").await.unwrap(), None);

        storage.set_data(&key, StateData::new()).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires a running MongoDB server"]
    async fn test_mongo_document_removed_when_both_cleared() {
        let storage = MongoStorage::from_url(TEST_URL).await.unwrap();
        let key = key(2003);

        storage.set_state(&key, Some("A:x")).await.unwrap();
        let mut data = StateData::new();
        data.insert("n".to_string(), json!(1));
        storage.set_data(&key, data).await.unwrap();

        storage.set_state(&key, None).await.unwrap();
        assert_eq!(storage.get_data(&key).await.unwrap()["n"], json!(1));

        storage.set_data(&key, StateData::new()).await.unwrap();
        let id = storage.document_id(&key).unwrap();
        let found = storage
            .collection
            .find_one(doc! { "_id": id })
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
