//! 精華剪輯元件
//!
//! 依描述文字從來源影片挑出片段並組合成一支精華影片：
//! A. 正規化長度與場景數設定
//! B. 向偵測服務取得候選片段
//! C. 在長度與場景數預算內挑選片段
//! D. 發布佔位預覽後於背景裁切、串接
//! E. 以最終輸出取代佔位預覽

pub mod allocator;
pub mod assembly;
pub mod captions;
pub mod detector;
pub mod error;
mod ffmpeg_command;
pub mod lifecycle;
mod main;
pub mod media_store;
pub mod normalizer;
pub mod runtime;
pub mod scene_detector;
pub mod types;
pub mod upload;

pub use allocator::{Allocation, AllocationOutcome, allocate, rank_candidates};
pub use assembly::{Assembler, AssemblyEngine, AssemblyOptions};
pub use detector::{
    CommandDetector, DetectionRequest, DetectionResponse, FallbackDetector, SegmentDetector,
    decode_response,
};
pub use error::{
    AssemblyError, DetectionError, MediaOpError, PipelineError, PipelineResult, UploadError,
    ValidationError,
};
pub use ffmpeg_command::FfmpegCommand;
pub use lifecycle::{
    FailureKind, HighlightSession, JobOutcome, JobTicket, PreviewContent, PreviewHandle,
    ProcessingState, SessionEvent, SessionSnapshot,
};
pub use main::HighlightReelGenerator;
pub use media_store::{MediaHandle, MediaStore};
pub use normalizer::{format_mmss, normalize_duration_input, parse_mmss, validate_request};
pub use runtime::{ArtifactRef, ConcatManifest, FfmpegLoader, MediaRuntime, RuntimeLoader};
pub use scene_detector::{SceneChangeDetector, SceneDetectorConfig};
pub use types::{
    AssembledHighlight, CandidateSegment, HighlightMetadata, HighlightRequest, HighlightStyle,
    KEYFRAME_TOLERANCE_SECS, MAX_MANUAL_SCENES, MAX_TARGET_DURATION_SECS, MIN_MANUAL_SCENES,
    MIN_TARGET_DURATION_SECS, SceneCountMode, SegmentClip, SourceMedia, Stage, StageCost,
};
pub use upload::{LibraryDirectoryUploader, MediaId, MediaUploader};
