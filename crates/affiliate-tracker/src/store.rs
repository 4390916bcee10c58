//! Flat-file click storage.
//!
//! Every click lives in a single JSON array file. Reads and writes are
//! serialized through one async mutex, and each write lands in a sibling
//! temporary file that is renamed over the original, so readers never see
//! a half-written array.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use affiliate_types::CustomClick;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::TrackerError;

/// The click file and the lock serializing access to it.
#[derive(Debug)]
pub struct ClickFile {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ClickFile {
    /// Wrap the file at `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Location of the click file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `click` and persist the whole array.
    pub async fn append(&self, click: CustomClick) -> Result<CustomClick, TrackerError> {
        let _guard = self.lock.lock().await;
        let mut clicks = self.read_locked().await?;
        clicks.push(click.clone());
        self.write_locked(&clicks).await?;
        debug!(total = clicks.len(), "custom click stored");
        Ok(click)
    }

    /// Every stored click, oldest first. A missing file reads as empty.
    pub async fn all(&self) -> Result<Vec<CustomClick>, TrackerError> {
        let _guard = self.lock.lock().await;
        self.read_locked().await
    }

    async fn read_locked(&self) -> Result<Vec<CustomClick>, TrackerError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        match serde_json::from_slice(&bytes) {
            Ok(clicks) => Ok(clicks),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "click file is unreadable, replacing it with an empty array"
                );
                self.write_locked(&[]).await?;
                Ok(Vec::new())
            }
        }
    }

    async fn write_locked(&self, clicks: &[CustomClick]) -> Result<(), TrackerError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(clicks)?;
        let tmp = self.tmp_path();
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::indexing_slicing)]

    use chrono::Utc;
    use uuid::Uuid;

    use super::*;

    fn click(banner_id: &str) -> CustomClick {
        CustomClick {
            id: Uuid::now_v7(),
            banner_id: banner_id.to_owned(),
            user_agent: Some("test".to_owned()),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ClickFile::new(dir.path().join("clicks.json"));
        assert!(store.all().await.unwrap().is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn appends_persist_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("clicks.json");
        let store = ClickFile::new(&path);
        store.append(click("a")).await.unwrap();
        store.append(click("b")).await.unwrap();

        let reopened = ClickFile::new(&path);
        let all = reopened.all().await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].banner_id, "a");
        assert_eq!(all[1].banner_id, "b");
        assert!(!path.with_file_name("clicks.json.tmp").exists());
    }

    #[tokio::test]
    async fn corrupt_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clicks.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = ClickFile::new(&path);
        assert!(store.all().await.unwrap().is_empty());
        assert_eq!(std::fs::read_to_string(&path).unwrap().trim(), "[]");

        store.append(click("a")).await.unwrap();
        assert_eq!(store.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(ClickFile::new(dir.path().join("clicks.json")));
        let mut handles = Vec::new();
        for i in 0..20 {
            let store = std::sync::Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.append(click(&format!("banner-{i}"))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.all().await.unwrap().len(), 20);
    }
}
