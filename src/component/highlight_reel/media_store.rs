//! 工作階段範圍的媒體資源表
//!
//! 預覽與最終輸出都以 `MediaHandle` 對外發布。被取代的資源必須明確釋放，
//! 否則會一直佔用記憶體直到工作階段結束。

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// 已發布資源的參照
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    pub id: Uuid,
    pub file_name: String,
    pub size: usize,
}

#[derive(Debug)]
struct StoredMedia {
    file_name: String,
    bytes: Arc<[u8]>,
}

#[derive(Debug, Clone, Default)]
pub struct MediaStore {
    entries: Arc<Mutex<HashMap<Uuid, StoredMedia>>>,
}

impl MediaStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, StoredMedia>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 發布一份新的資源，傳入 `Arc<[u8]>` 時不複製內容
    pub fn publish(
        &self,
        bytes: impl Into<Arc<[u8]>>,
        file_name: impl Into<String>,
    ) -> MediaHandle {
        let bytes: Arc<[u8]> = bytes.into();
        let file_name = file_name.into();
        let handle = MediaHandle {
            id: Uuid::new_v4(),
            file_name: file_name.clone(),
            size: bytes.len(),
        };

        debug!("發布資源 {} ({} bytes)", handle.id, handle.size);
        self.lock()
            .insert(handle.id, StoredMedia { file_name, bytes });
        handle
    }

    /// 釋放資源，回傳資源是否仍存在
    pub fn release(&self, handle: &MediaHandle) -> bool {
        let removed = self.lock().remove(&handle.id).is_some();
        if removed {
            debug!("釋放資源 {}", handle.id);
        }
        removed
    }

    #[must_use]
    pub fn contains(&self, handle: &MediaHandle) -> bool {
        self.lock().contains_key(&handle.id)
    }

    #[must_use]
    pub fn bytes(&self, handle: &MediaHandle) -> Option<Arc<[u8]>> {
        self.lock().get(&handle.id).map(|m| Arc::clone(&m.bytes))
    }

    /// 將資源寫到指定路徑（下載）
    pub fn export(&self, handle: &MediaHandle, destination: &Path) -> io::Result<()> {
        let bytes = self.bytes(handle).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("資源已釋放: {}", handle.file_name),
            )
        })?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(destination, &bytes)
    }

    /// 目前仍存活的資源數量
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// 資源原始檔名
    #[must_use]
    pub fn file_name(&self, handle: &MediaHandle) -> Option<String> {
        self.lock().get(&handle.id).map(|m| m.file_name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_publish_and_release() {
        let store = MediaStore::new();
        let handle = store.publish(vec![1u8, 2, 3], "out.mp4");

        assert_eq!(handle.size, 3);
        assert!(store.contains(&handle));
        assert_eq!(store.live_count(), 1);

        assert!(store.release(&handle));
        assert!(!store.release(&handle));
        assert!(!store.contains(&handle));
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_publish_shared_bytes_without_copy() {
        let store = MediaStore::new();
        let shared: Arc<[u8]> = Arc::from(vec![1u8; 32]);
        let handle = store.publish(Arc::clone(&shared), "source.mp4");

        let stored = store.bytes(&handle).unwrap();
        assert!(Arc::ptr_eq(&stored, &shared));
    }

    #[test]
    fn test_clones_share_entries() {
        let store = MediaStore::new();
        let clone = store.clone();
        let handle = clone.publish(vec![9u8; 16], "a.mp4");

        assert_eq!(store.bytes(&handle).map(|b| b.len()), Some(16));
        assert_eq!(store.file_name(&handle).as_deref(), Some("a.mp4"));
    }

    #[test]
    fn test_export_writes_bytes() {
        let temp = TempDir::new().unwrap();
        let store = MediaStore::new();
        let handle = store.publish(b"video".to_vec(), "v.mp4");

        let dest = temp.path().join("nested").join("v.mp4");
        store.export(&handle, &dest).unwrap();
        assert_eq!(fs::read(&dest).unwrap(), b"video");

        store.release(&handle);
        let err = store.export(&handle, &dest).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
