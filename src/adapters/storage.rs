use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::{Path, PathBuf};

/// 本機檔案系統存儲；相對路徑以 `base_path` 為根，絕對路徑原樣使用
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(Path::new(path))
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.resolve(path);
        tracing::debug!("Reading {}", full_path.display());
        let data = tokio::fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&full_path, data).await?;
        tracing::debug!("Wrote {} bytes to {}", data.len(), full_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::TriageError;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());

        storage
            .write_file("output/nested/result.json", b"[]")
            .await
            .unwrap();

        let data = storage.read_file("output/nested/result.json").await.unwrap();
        assert_eq!(data, b"[]");
    }

    #[tokio::test]
    async fn test_absolute_paths_ignore_base() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("terms.csv");
        std::fs::write(&file, "搜索字词\npcb").unwrap();

        let storage = LocalStorage::new("/nonexistent-base");
        let data = storage.read_file(file.to_str().unwrap()).await.unwrap();
        assert_eq!(String::from_utf8(data).unwrap(), "搜索字词\npcb");
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(dir.path());
        let err = storage.read_file("missing.csv").await.unwrap_err();
        assert!(matches!(err, TriageError::IoError(_)));
    }
}
