//! Local-directory file storage.
//!
//! Each file is stored flat at `{files_dir}/{file_id}` where the id is a
//! UUID. Uploads go through signed tickets. Until a file is claimed its
//! uploader's id sits next to it in `{file_id}.owner`.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use tokio::fs;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::ticket::TicketSigner;
use crate::domain::traits::{FileStorage, UploadUrl};
use crate::shared::error::AppError;

/// Disk-backed [`FileStorage`].
pub struct LocalFileStorage {
    dir: PathBuf,
    public_url: String,
    signer: TicketSigner,
}

impl LocalFileStorage {
    #[instrument(skip(signer))]
    pub async fn new(
        dir: PathBuf,
        public_url: &str,
        signer: TicketSigner,
    ) -> Result<Self, AppError> {
        fs::create_dir_all(&dir).await?;
        info!("File storage directory: {}", dir.display());
        Ok(Self {
            dir,
            public_url: public_url.trim_end_matches('/').to_string(),
            signer,
        })
    }

    /// Path for a file id; ids that are not UUIDs never map to a path.
    fn file_path(&self, file_id: &str) -> Option<PathBuf> {
        Uuid::parse_str(file_id)
            .ok()
            .map(|id| self.dir.join(id.simple().to_string()))
    }

    fn owner_path(&self, file_id: &str) -> Option<PathBuf> {
        Uuid::parse_str(file_id)
            .ok()
            .map(|id| self.dir.join(format!("{}.owner", id.simple())))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
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
        fs::write(self.dir.join(&file_id), &data).await?;
        fs::write(
            self.dir.join(format!("{}.owner", file_id)),
            owner_id.to_string(),
        )
        .await?;

        debug!(file_id = %file_id, owner_id, bytes = data.len(), "Stored file");
        Ok(file_id)
    }

    async fn claim(&self, file_id: &str, owner_id: i64) -> Result<bool, AppError> {
        let Some(owner_path) = self.owner_path(file_id) else {
            return Ok(false);
        };
        let uploader = match fs::read_to_string(&owner_path).await {
            Ok(contents) => contents.trim().parse::<i64>().ok(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        if uploader != Some(owner_id) {
            return Ok(false);
        }

        // Removing the marker is the claim; only one caller can win it.
        match fs::remove_file(&owner_path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_url(&self, file_id: &str) -> Result<Option<String>, AppError> {
        let Some(path) = self.file_path(file_id) else {
            return Ok(None);
        };
        if !fs::try_exists(&path).await? {
            return Ok(None);
        }
        Ok(Some(format!("{}/files/{}", self.public_url, file_id)))
    }

    async fn read(&self, file_id: &str) -> Result<Option<Vec<u8>>, AppError> {
        let Some(path) = self.file_path(file_id) else {
            return Ok(None);
        };
        match fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, file_id: &str) -> Result<(), AppError> {
        let (Some(path), Some(owner_path)) = (self.file_path(file_id), self.owner_path(file_id))
        else {
            return Ok(());
        };
        for path in [path, owner_path] {
            match fs::remove_file(&path).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_claim_consumes_owner_marker() {
        let dir = std::env::temp_dir().join(format!("chat-files-{}", Uuid::new_v4().simple()));
        let signer = TicketSigner::new("k", 60);
        let storage = LocalFileStorage::new(dir.clone(), "http://localhost", signer)
            .await
            .unwrap();
        let upload = storage.generate_upload_url(5).await.unwrap();
        let ticket = upload.url.rsplit('/').next().unwrap();
        let file_id = storage.store(ticket, b"icon".to_vec()).await.unwrap();

        assert!(!storage.claim(&file_id, 6).await.unwrap());
        assert!(storage.claim(&file_id, 5).await.unwrap());
        assert!(!storage.claim(&file_id, 5).await.unwrap());
        assert_eq!(storage.read(&file_id).await.unwrap(), Some(b"icon".to_vec()));

        storage.delete(&file_id).await.unwrap();
        assert_eq!(storage.read(&file_id).await.unwrap(), None);
        let _ = std::fs::remove_dir_all(dir);
    }
}
