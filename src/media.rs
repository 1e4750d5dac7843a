use async_trait::async_trait;
use chrono::Utc;
use mockall::automock;
use std::path::PathBuf;

/// Media collaborator: takes image bytes, returns an opaque reference. The
/// engine stores only the reference and never touches the bytes again.
#[automock]
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String>;
}

/// Local-disk media storage; files land under `root` with a millisecond
/// timestamp prefix so repeated uploads of the same name never collide.
pub struct DiskMedia {
    root: PathBuf,
}

impl DiskMedia {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DiskMedia { root: root.into() }
    }
}

#[async_trait]
impl MediaStore for DiskMedia {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, String> {
        let stamped = format!("{}-{}", Utc::now().timestamp_millis(), filename);
        let path = self.root.join(&stamped);
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| e.to_string())?;
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| e.to_string())?;
        Ok(format!("/uploads/{}", stamped))
    }
}
