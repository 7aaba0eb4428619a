//! In-memory file storage for tests and the memory backend.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use super::ticket::TicketSigner;
use crate::domain::traits::{FileStorage, UploadUrl};
use crate::shared::error::AppError;

struct StoredFile {
    data: Vec<u8>,
    /// Uploader until the file is claimed, then `None`
    unclaimed_by: Option<i64>,
}

/// [`FileStorage`] that keeps blobs in a map.
pub struct MemoryFileStorage {
    files: DashMap<String, StoredFile>,
    public_url: String,
    signer: TicketSigner,
}

impl MemoryFileStorage {
    pub fn new(public_url: &str, signer: TicketSigner) -> Self {
        Self {
            files: DashMap::new(),
            public_url: public_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    /// Number of stored files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl FileStorage for MemoryFileStorage {
    async fn generate_upload_url(&self, owner_id: i64) -> Result<UploadUrl, AppError> {
        let (ticket, expires_at) = self.signer.issue(owner_id, Utc::now())?;
        Ok(UploadUrl {
            url: format!("{}/api/v1/storage/upload/{}", self.public_url, ticket),
            expires_at,
        })
    }

    async fn store(&self, ticket: &str, data: Vec<u8>) -> Result<String, AppError> {
        let owner_id = self.signer.redeem(ticket, Utc::now())?;
        let file_id = Uuid::new_v4().simple().to_string();
        self.files.insert(
            file_id.clone(),
            StoredFile {
                data,
                unclaimed_by: Some(owner_id),
            },
        );
        Ok(file_id)
    }

    async fn claim(&self, file_id: &str, owner_id: i64) -> Result<bool, AppError> {
        let Some(mut file) = self.files.get_mut(file_id) else {
            return Ok(false);
        };
        if file.unclaimed_by != Some(owner_id) {
            return Ok(false);
        }
        file.unclaimed_by = None;
        Ok(true)
    }

    async fn get_url(&self, file_id: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .files
            .contains_key(file_id)
            .then(|| format!("{}/files/{}", self.public_url, file_id)))
    }

    async fn read(&self, file_id: &str) -> Result<Option<Vec<u8>>, AppError> {
        Ok(self.files.get(file_id).map(|file| file.data.clone()))
    }

    async fn delete(&self, file_id: &str) -> Result<(), AppError> {
        self.files.remove(file_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn upload(storage: &MemoryFileStorage, owner_id: i64) -> String {
        let upload = storage.generate_upload_url(owner_id).await.unwrap();
        let ticket = upload.url.rsplit('/').next().unwrap();
        storage.store(ticket, b"png".to_vec()).await.unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_resolve_url() {
        let storage = MemoryFileStorage::new("http://localhost:3000/", TicketSigner::new("k", 60));
        let file_id = upload(&storage, 1).await;

        assert_eq!(
            storage.get_url(&file_id).await.unwrap(),
            Some(format!("http://localhost:3000/files/{}", file_id))
        );

        storage.delete(&file_id).await.unwrap();
        assert!(storage.is_empty());
        assert_eq!(storage.get_url(&file_id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_claim_is_uploader_only_and_once() {
        let storage = MemoryFileStorage::new("http://localhost:3000", TicketSigner::new("k", 60));
        let file_id = upload(&storage, 7).await;

        assert!(!storage.claim(&file_id, 8).await.unwrap());
        assert!(storage.claim(&file_id, 7).await.unwrap());
        assert!(!storage.claim(&file_id, 7).await.unwrap());
        assert!(!storage.claim("missing", 7).await.unwrap());
    }
}
