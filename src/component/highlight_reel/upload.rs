//! 媒體庫上傳
//!
//! 上傳失敗只記錄日誌，不影響精華剪輯流程。

use crate::component::highlight_reel::error::UploadError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// 媒體庫中的識別碼
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaId(pub String);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub trait MediaUploader: Send + Sync {
    fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        tags: &[String],
    ) -> Result<MediaId, UploadError>;
}

/// 標籤資料（與影片同名的 `.json`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LibraryEntry {
    pub id: MediaId,
    pub original_name: String,
    pub size: u64,
    pub tags: Vec<String>,
    pub uploaded_at: u64,
}

/// 以內容雜湊命名，存放到本機資料夾的媒體庫
///
/// 相同內容只會存一份，標籤資料每次上傳都會更新。
#[derive(Debug, Clone)]
pub struct LibraryDirectoryUploader {
    root: PathBuf,
}

impl LibraryDirectoryUploader {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 讀取已上傳項目的標籤資料
    pub fn entry(&self, id: &MediaId) -> Result<LibraryEntry, UploadError> {
        let content = fs::read_to_string(self.root.join(format!("{}.json", id.0)))?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl MediaUploader for LibraryDirectoryUploader {
    fn upload(
        &self,
        bytes: &[u8],
        file_name: &str,
        tags: &[String],
    ) -> Result<MediaId, UploadError> {
        if bytes.is_empty() {
            return Err(UploadError::NothingToUpload);
        }

        fs::create_dir_all(&self.root)?;

        let hash = blake3::hash(bytes).to_hex().to_string();
        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_else(|| "bin".to_string());

        let media_path = self.root.join(format!("{hash}.{extension}"));
        if media_path.exists() {
            debug!("媒體庫已有相同內容: {}", media_path.display());
        } else {
            fs::write(&media_path, bytes)?;
        }

        let id = MediaId(hash);
        let entry = LibraryEntry {
            id: id.clone(),
            original_name: file_name.to_string(),
            size: bytes.len() as u64,
            tags: tags.to_vec(),
            uploaded_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_or(0, |d| d.as_secs()),
        };
        let sidecar = self.root.join(format!("{}.json", id.0));
        fs::write(&sidecar, serde_json::to_string_pretty(&entry)?)?;

        info!("已加入媒體庫: {file_name} -> {id}");
        Ok(id)
    }
}
