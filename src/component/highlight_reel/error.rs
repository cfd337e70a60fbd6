//! 精華剪輯管線的錯誤類型

use crate::component::highlight_reel::types::{
    MAX_MANUAL_SCENES, MAX_TARGET_DURATION_SECS, MIN_MANUAL_SCENES, MIN_TARGET_DURATION_SECS,
};
use thiserror::Error;

pub type PipelineResult<T> = Result<T, PipelineError>;

/// 請求送出前就能發現的輸入錯誤
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error(
        "目標長度 {0:.1} 秒超出範圍（{min}-{max} 秒）",
        min = MIN_TARGET_DURATION_SECS,
        max = MAX_TARGET_DURATION_SECS
    )]
    TargetDurationOutOfRange(f64),

    #[error("場景數 {0} 超出範圍（{min}-{max}）", min = MIN_MANUAL_SCENES, max = MAX_MANUAL_SCENES)]
    SceneCountOutOfRange(u32),

    #[error("請輸入要尋找的片段描述")]
    EmptyPrompt,
}

/// 片段偵測服務的錯誤，在邊界一次解碼為明確的類型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    #[error("偵測逾時（{seconds} 秒）")]
    Timeout { seconds: u64 },

    #[error("偵測服務無法使用: {0}")]
    Unavailable(String),

    #[error("偵測服務拒絕請求: {}", .messages.join("; "))]
    Rejected { messages: Vec<String> },

    #[error("偵測回應格式錯誤: {0}")]
    InvalidResponse(String),
}

impl DetectionError {
    /// 是否值得稍後重試
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable(_))
    }
}

/// 單一媒體操作（寫入、裁切、串接、讀取）的錯誤
#[derive(Debug, Error)]
pub enum MediaOpError {
    #[error("ffmpeg 執行失敗: {0}")]
    Command(String),

    #[error("找不到輸出檔案: {0}")]
    MissingOutput(String),

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
}

/// 組合引擎的致命錯誤
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("無法載入媒體處理環境: {0}")]
    RuntimeUnavailable(String),

    #[error("無法寫入來源影片: {0}")]
    Workspace(String),

    #[error("沒有可組合的片段")]
    NothingToAssemble,

    #[error("所有片段裁切失敗")]
    NoSurvivingSegments,

    #[error("無法讀取輸出影片: {0}")]
    Output(String),
}

/// 媒體庫上傳錯誤，不影響主要流程
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("上傳失敗: {0}")]
    Io(#[from] std::io::Error),

    #[error("無法寫入標籤資料: {0}")]
    Metadata(#[from] serde_json::Error),

    #[error("沒有設定媒體庫")]
    NotConfigured,

    #[error("沒有可上傳的內容")]
    NothingToUpload,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("片段偵測失敗: {0}")]
    Detection(#[from] DetectionError),

    #[error("找不到可用的候選片段")]
    AllocationEmpty,

    #[error("精華影片組合失敗: {0}")]
    AssemblyFailed(#[from] AssemblyError),

    #[error("尚未載入來源影片")]
    NoSource,

    #[error("工作已被較新的請求取代（generation {0}）")]
    Superseded(u64),

    #[error("尚未產生精華影片")]
    NoHighlight,

    #[error("IO 錯誤: {0}")]
    Io(#[from] std::io::Error),
}
