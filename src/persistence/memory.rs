//! In-process document store.
//!
//! Keeps documents in insertion order per user and collection. Collections
//! can be marked unavailable to exercise partial-failure loads.

use super::{Document, PersistenceError, PersistenceProvider};
use crate::records::types::RecordId;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

type CollectionKey = (String, String);

/// Document store living entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryProvider {
    documents: RwLock<HashMap<CollectionKey, Vec<(RecordId, Document)>>>,
    unavailable: RwLock<HashSet<String>>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation on `collection` fail until healed.
    pub async fn fail_collection(&self, collection: &str) {
        self.unavailable.write().await.insert(collection.to_string());
    }

    pub async fn heal_collection(&self, collection: &str) {
        self.unavailable.write().await.remove(collection);
    }

    /// Number of documents stored for a user's collection.
    pub async fn document_count(&self, user_id: &str, collection: &str) -> usize {
        self.documents
            .read()
            .await
            .get(&key(user_id, collection))
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn check_available(&self, collection: &str) -> Result<(), PersistenceError> {
        if self.unavailable.read().await.contains(collection) {
            return Err(PersistenceError::Unavailable {
                collection: collection.to_string(),
            });
        }
        Ok(())
    }
}

fn key(user_id: &str, collection: &str) -> CollectionKey {
    (user_id.to_string(), collection.to_string())
}

#[async_trait]
impl PersistenceProvider for MemoryProvider {
    async fn load_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, PersistenceError> {
        self.check_available(collection).await?;
        let documents = self.documents.read().await;
        Ok(documents
            .get(&key(user_id, collection))
            .map(|docs| docs.iter().map(|(_, doc)| doc.clone()).collect())
            .unwrap_or_default())
    }

    async fn save_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<(), PersistenceError> {
        self.check_available(collection).await?;
        let mut documents = self.documents.write().await;
        let docs = documents.entry(key(user_id, collection)).or_default();
        match docs.iter_mut().find(|(existing, _)| *existing == id) {
            Some(slot) => slot.1 = document,
            None => docs.push((id, document)),
        }
        Ok(())
    }

    async fn delete_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
    ) -> Result<(), PersistenceError> {
        self.check_available(collection).await?;
        if let Some(docs) = self.documents.write().await.get_mut(&key(user_id, collection)) {
            docs.retain(|(existing, _)| *existing != id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_save_replaces_by_id_and_keeps_order() {
        let provider = MemoryProvider::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        provider.save_record("u", "meals", a, json!({"n": 1})).await.unwrap();
        provider.save_record("u", "meals", b, json!({"n": 2})).await.unwrap();
        provider.save_record("u", "meals", a, json!({"n": 3})).await.unwrap();

        let docs = provider.load_collection("u", "meals").await.unwrap();
        assert_eq!(docs, vec![json!({"n": 3}), json!({"n": 2})]);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let provider = MemoryProvider::new();
        provider
            .save_record("alice", "meals", Uuid::new_v4(), json!({}))
            .await
            .unwrap();

        assert_eq!(provider.document_count("alice", "meals").await, 1);
        assert!(provider.load_collection("bob", "meals").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_collection_fails_until_healed() {
        let provider = MemoryProvider::new();
        let id = Uuid::new_v4();
        provider.fail_collection("weights").await;

        assert!(provider.save_record("u", "weights", id, json!({})).await.is_err());
        assert!(provider.load_collection("u", "meals").await.is_ok());

        provider.heal_collection("weights").await;
        provider.save_record("u", "weights", id, json!({})).await.unwrap();
        provider.delete_record("u", "weights", id).await.unwrap();
        assert_eq!(provider.document_count("u", "weights").await, 0);
    }
}
