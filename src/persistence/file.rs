//! JSON file document store.
//!
//! Layout: `<root>/users/<user_id>/<collection>.json`, each file holding a
//! JSON array of documents in insertion order.

use super::{check_segment, Document, PersistenceError, PersistenceProvider};
use crate::records::types::RecordId;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Document store backed by one JSON file per user collection.
#[derive(Debug)]
pub struct JsonFileProvider {
    root: PathBuf,
    // Serializes read-modify-write cycles on the collection files.
    write_lock: Mutex<()>,
}

impl JsonFileProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing a user's collection.
    pub fn collection_path(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<PathBuf, PersistenceError> {
        check_segment("user id", user_id)?;
        check_segment("collection", collection)?;
        Ok(self
            .root
            .join("users")
            .join(user_id)
            .join(format!("{collection}.json")))
    }

    async fn read_documents(path: &Path) -> Result<Vec<Document>, PersistenceError> {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(PersistenceError::Io(format!("{}: {e}", path.display()))),
        };
        serde_json::from_str(&content).map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    async fn write_documents(path: &Path, documents: &[Document]) -> Result<(), PersistenceError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| PersistenceError::Io(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(documents)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        // Write then rename so readers never see a half-written file.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content)
            .await
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .map_err(|e| PersistenceError::Io(e.to_string()))?;
        Ok(())
    }
}

fn document_id(document: &Document) -> Option<RecordId> {
    document
        .get("id")
        .and_then(|id| id.as_str())
        .and_then(|id| id.parse().ok())
}

#[async_trait]
impl PersistenceProvider for JsonFileProvider {
    async fn load_collection(
        &self,
        user_id: &str,
        collection: &str,
    ) -> Result<Vec<Document>, PersistenceError> {
        let path = self.collection_path(user_id, collection)?;
        Self::read_documents(&path).await
    }

    async fn save_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
        document: Document,
    ) -> Result<(), PersistenceError> {
        let path = self.collection_path(user_id, collection)?;
        let _guard = self.write_lock.lock().await;

        let mut documents = Self::read_documents(&path).await?;
        match documents.iter_mut().find(|d| document_id(d) == Some(id)) {
            Some(slot) => *slot = document,
            None => documents.push(document),
        }
        Self::write_documents(&path, &documents).await
    }

    async fn delete_record(
        &self,
        user_id: &str,
        collection: &str,
        id: RecordId,
    ) -> Result<(), PersistenceError> {
        let path = self.collection_path(user_id, collection)?;
        let _guard = self.write_lock.lock().await;

        let mut documents = Self::read_documents(&path).await?;
        let before = documents.len();
        documents.retain(|d| document_id(d) != Some(id));
        if documents.len() == before {
            return Ok(());
        }
        Self::write_documents(&path, &documents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_missing_file_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path());
        assert!(provider.load_collection("u1", "meals").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path());
        let id = Uuid::new_v4();

        provider
            .save_record("u1", "meals", id, json!({"id": id, "name": "Oats"}))
            .await
            .unwrap();
        provider
            .save_record("u1", "meals", id, json!({"id": id, "name": "Eggs"}))
            .await
            .unwrap();

        let docs = provider.load_collection("u1", "meals").await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["name"], "Eggs");
        assert!(dir.path().join("users/u1/meals.json").exists());

        provider.delete_record("u1", "meals", id).await.unwrap();
        assert!(provider.load_collection("u1", "meals").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let provider = JsonFileProvider::new(dir.path());
        let path = provider.collection_path("u1", "hydration").unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let err = provider.load_collection("u1", "hydration").await.unwrap_err();
        assert!(matches!(err, PersistenceError::Serialization(_)));
    }

    #[test]
    fn test_path_traversal_rejected() {
        let provider = JsonFileProvider::new("/tmp/progress");
        assert!(provider.collection_path("../other", "meals").is_err());
    }
}
