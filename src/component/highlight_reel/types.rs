//! 精華剪輯管線的資料模型

use crate::component::highlight_reel::media_store::MediaHandle;
use crate::tools::get_video_info;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// 目標長度下限（秒）
pub const MIN_TARGET_DURATION_SECS: f64 = 10.0;
/// 目標長度上限（秒）
pub const MAX_TARGET_DURATION_SECS: f64 = 1800.0;
/// 手動場景數下限
pub const MIN_MANUAL_SCENES: u32 = 1;
/// 手動場景數上限
pub const MAX_MANUAL_SCENES: u32 = 20;
/// stream copy 裁切會對齊到前一個關鍵幀，實際長度允許的誤差（秒）
pub const KEYFRAME_TOLERANCE_SECS: f64 = 2.0;

/// 來源影片：由目前的工作階段獨佔，重新上傳時整個替換
#[derive(Debug, Clone)]
pub struct SourceMedia {
    name: String,
    extension: String,
    bytes: Arc<[u8]>,
    duration_seconds: f64,
    origin: Option<PathBuf>,
}

impl SourceMedia {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        extension: impl Into<String>,
        bytes: Vec<u8>,
        duration_seconds: f64,
    ) -> Self {
        Self {
            name: name.into(),
            extension: extension.into().trim_start_matches('.').to_lowercase(),
            bytes: Arc::from(bytes),
            duration_seconds,
            origin: None,
        }
    }

    /// 從檔案讀取來源影片，長度由 ffprobe 取得
    pub fn from_path(path: &Path) -> Result<Self> {
        let info = get_video_info(path)
            .with_context(|| format!("無法讀取影片資訊: {}", path.display()))?;
        let bytes =
            fs::read(path).with_context(|| format!("無法讀取影片檔案: {}", path.display()))?;

        let name = path
            .file_stem()
            .map_or_else(|| "source".to_string(), |s| s.to_string_lossy().to_string());
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("mp4")
            .to_string();

        let mut media = Self::new(name, extension, bytes, info.duration_seconds);
        media.origin = Some(path.to_path_buf());
        Ok(media)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// 共用的內容參照，不複製資料
    #[must_use]
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.name, self.extension)
    }

    #[must_use]
    pub const fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    /// 來源檔案在磁碟上的位置（若是從檔案載入）
    #[must_use]
    pub fn origin(&self) -> Option<&Path> {
        self.origin.as_deref()
    }

    /// 寫入工作目錄時使用的檔名，保留副檔名讓 ffmpeg 判斷容器格式
    #[must_use]
    pub fn workspace_file_name(&self) -> String {
        format!("source.{}", self.extension)
    }
}

/// 場景數模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "count", rename_all = "lowercase")]
pub enum SceneCountMode {
    /// 由分配器依目標長度決定
    #[default]
    Auto,
    Manual(u32),
}

impl fmt::Display for SceneCountMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Manual(n) => write!(f, "manual({n})"),
        }
    }
}

/// 交給偵測服務的剪輯風格
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HighlightStyle {
    #[default]
    Balanced,
    Action,
    Narrative,
}

impl fmt::Display for HighlightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Balanced => "balanced",
            Self::Action => "action",
            Self::Narrative => "narrative",
        };
        write!(f, "{s}")
    }
}

impl HighlightStyle {
    pub const ALL: [Self; 3] = [Self::Balanced, Self::Action, Self::Narrative];

    /// 選單顯示用
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Balanced => "平衡",
            Self::Action => "動作",
            Self::Narrative => "敘事",
        }
    }
}

/// 使用者的精華剪輯請求
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightRequest {
    pub prompt_text: String,
    pub target_duration_secs: f64,
    pub scene_count: SceneCountMode,
    pub style: HighlightStyle,
    pub include_captions: bool,
    pub cost_optimize: bool,
}

impl HighlightRequest {
    #[must_use]
    pub fn new(prompt_text: impl Into<String>, target_duration_secs: f64) -> Self {
        Self {
            prompt_text: prompt_text.into(),
            target_duration_secs,
            scene_count: SceneCountMode::Auto,
            style: HighlightStyle::default(),
            include_captions: false,
            cost_optimize: false,
        }
    }

    #[must_use]
    pub const fn with_scene_count(mut self, scene_count: SceneCountMode) -> Self {
        self.scene_count = scene_count;
        self
    }

    #[must_use]
    pub const fn with_style(mut self, style: HighlightStyle) -> Self {
        self.style = style;
        self
    }

    #[must_use]
    pub const fn with_captions(mut self, include_captions: bool) -> Self {
        self.include_captions = include_captions;
        self
    }

    #[must_use]
    pub const fn with_cost_optimize(mut self, cost_optimize: bool) -> Self {
        self.cost_optimize = cost_optimize;
        self
    }
}

/// 偵測服務提出的候選片段
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSegment {
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub score: f64,
}

impl CandidateSegment {
    #[must_use]
    pub fn new(start_time: f64, end_time: f64, score: f64) -> Self {
        Self {
            start_time,
            end_time,
            description: String::new(),
            confidence: score,
            score,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub const fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// 被選入精華的片段，可能因預算而被截短
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentClip {
    pub segment: CandidateSegment,
    pub start_time: f64,
    pub end_time: f64,
    /// 依分數排序後的名次，0 為最佳
    pub rank: usize,
    pub truncated: bool,
}

impl SegmentClip {
    #[must_use]
    pub fn from_candidate(segment: &CandidateSegment, rank: usize) -> Self {
        Self {
            segment: segment.clone(),
            start_time: segment.start_time,
            end_time: segment.end_time,
            rank,
            truncated: false,
        }
    }

    /// 截短到指定長度：`end = start + max_duration`
    #[must_use]
    pub fn truncated_to(segment: &CandidateSegment, rank: usize, max_duration: f64) -> Self {
        Self {
            segment: segment.clone(),
            start_time: segment.start_time,
            end_time: segment.start_time + max_duration,
            rank,
            truncated: true,
        }
    }

    #[must_use]
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// 半開區間 `[start, end)` 是否重疊
    #[must_use]
    pub fn overlaps(&self, start_time: f64, end_time: f64) -> bool {
        self.start_time < end_time && start_time < self.end_time
    }
}

/// 處理階段，用於記錄各階段成本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Detection,
    Allocation,
    WriteSource,
    Trim,
    Concat,
    ReadOutput,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Detection => "detection",
            Self::Allocation => "allocation",
            Self::WriteSource => "write_source",
            Self::Trim => "trim",
            Self::Concat => "concat",
            Self::ReadOutput => "read_output",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageCost {
    pub stage: Stage,
    pub elapsed_ms: u64,
}

impl StageCost {
    /// 從 `started` 到現在的耗時
    #[must_use]
    pub fn since(stage: Stage, started: Instant) -> Self {
        Self {
            stage,
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighlightMetadata {
    pub processing_time_ms: u64,
    pub fallback_used: bool,
    pub stage_costs: Vec<StageCost>,
}

impl HighlightMetadata {
    #[must_use]
    pub fn cost_of(&self, stage: Stage) -> Option<u64> {
        self.stage_costs
            .iter()
            .find(|c| c.stage == stage)
            .map(|c| c.elapsed_ms)
    }
}

/// 組合完成的精華影片
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledHighlight {
    /// 依來源時間排序的片段
    pub clips: Vec<SegmentClip>,
    pub output: MediaHandle,
    pub realized_duration_secs: f64,
    pub metadata: HighlightMetadata,
    /// SRT 字幕內容（僅在請求字幕時產生）
    pub captions: Option<String>,
    /// 裁切失敗或超出長度上限而被捨棄的片段（以排序後的索引表示）
    pub dropped_clips: Vec<usize>,
}
