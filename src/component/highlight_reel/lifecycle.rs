//! 精華剪輯工作階段
//!
//! 狀態流程：
//! `Idle → SourceLoaded → Requesting → Allocating → PlaceholderReady → Assembling → Ready | Failed`
//!
//! 每次載入來源或送出新請求都會遞增 generation。背景組合完成時，
//! 只有 generation 仍相同才會發布結果，否則結果直接丟棄並釋放。

use crate::component::highlight_reel::allocator::{AllocationOutcome, allocate};
use crate::component::highlight_reel::assembly::{Assembler, AssemblyOptions};
use crate::component::highlight_reel::detector::{DetectionRequest, SegmentDetector};
use crate::component::highlight_reel::error::{
    AssemblyError, DetectionError, PipelineError, PipelineResult, UploadError,
};
use crate::component::highlight_reel::media_store::{MediaHandle, MediaStore};
use crate::component::highlight_reel::normalizer::validate_request;
use crate::component::highlight_reel::types::{
    AssembledHighlight, HighlightRequest, SegmentClip, SourceMedia, Stage, StageCost,
};
use crate::component::highlight_reel::upload::{MediaId, MediaUploader};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    Detection(DetectionError),
    AllocationEmpty,
    Assembly(AssemblyError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProcessingState {
    #[default]
    Idle,
    SourceLoaded,
    Requesting,
    Allocating,
    PlaceholderReady,
    Assembling,
    Ready,
    Failed(FailureKind),
}

impl ProcessingState {
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(
            self,
            Self::Requesting | Self::Allocating | Self::PlaceholderReady | Self::Assembling
        )
    }
}

/// 預覽內容：組合完成前指向來源的片段範圍，完成後指向輸出
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewContent {
    SourceRange {
        media: MediaHandle,
        start_time: f64,
        end_time: f64,
    },
    Rendered(MediaHandle),
}

/// 對外的預覽參照，從佔位到完成都維持同一個 id
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewHandle {
    pub id: Uuid,
    pub generation: u64,
    pub content: PreviewContent,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    PlaceholderPublished {
        generation: u64,
        preview: PreviewHandle,
    },
    FinalPublished {
        generation: u64,
        preview: PreviewHandle,
    },
    /// 工作完成時已被較新的請求取代
    JobDiscarded { generation: u64 },
    JobFailed {
        generation: u64,
        error: AssemblyError,
    },
}

/// 背景組合的結果
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    Published(AssembledHighlight),
    Discarded,
    Failed(AssemblyError),
}

pub struct JobTicket {
    generation: u64,
    handle: JoinHandle<JobOutcome>,
}

impl JobTicket {
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// 等待背景組合結束
    pub fn wait(self) -> JobOutcome {
        self.handle.join().unwrap_or_else(|_| {
            JobOutcome::Failed(AssemblyError::Output("組合執行緒異常結束".to_string()))
        })
    }
}

/// 某個時間點的工作階段狀態
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub generation: u64,
    pub state: ProcessingState,
    pub source_name: Option<String>,
    pub source_media_id: Option<MediaId>,
    pub preview: Option<PreviewHandle>,
    pub final_highlight: Option<AssembledHighlight>,
}

#[derive(Debug, Default)]
struct SessionState {
    generation: u64,
    state: ProcessingState,
    source: Option<Arc<SourceMedia>>,
    source_media_id: Option<MediaId>,
    preview: Option<PreviewHandle>,
    final_highlight: Option<AssembledHighlight>,
}

impl SessionState {
    /// 釋放目前發布中的預覽與輸出
    fn retire_outputs(&mut self, store: &MediaStore) {
        if let Some(preview) = self.preview.take() {
            if let PreviewContent::SourceRange { media, .. } = &preview.content {
                store.release(media);
            }
        }
        if let Some(highlight) = self.final_highlight.take() {
            store.release(&highlight.output);
        }
    }
}

#[derive(Clone)]
pub struct HighlightSession {
    detector: Arc<dyn SegmentDetector>,
    assembler: Arc<dyn Assembler>,
    uploader: Option<Arc<dyn MediaUploader>>,
    store: MediaStore,
    inner: Arc<Mutex<SessionState>>,
    events: Option<Sender<SessionEvent>>,
}

impl HighlightSession {
    #[must_use]
    pub fn new(detector: Arc<dyn SegmentDetector>, assembler: Arc<dyn Assembler>) -> Self {
        Self {
            detector,
            assembler,
            uploader: None,
            store: MediaStore::new(),
            inner: Arc::new(Mutex::new(SessionState::default())),
            events: None,
        }
    }

    #[must_use]
    pub fn with_uploader(mut self, uploader: Arc<dyn MediaUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: Sender<SessionEvent>) -> Self {
        self.events = Some(events);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &MediaStore {
        &self.store
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(events) = &self.events {
            // 接收端已關閉時不需要通知
            let _ = events.send(event);
        }
    }

    fn fail_if_current(&self, generation: u64, failure: FailureKind) {
        let mut state = self.lock();
        if state.generation == generation {
            state.state = ProcessingState::Failed(failure);
        }
    }

    /// 載入（或替換）來源影片，進行中的工作一律作廢
    pub fn load_source(&self, source: SourceMedia) -> u64 {
        let source = Arc::new(source);

        let generation = {
            let mut state = self.lock();
            state.generation += 1;
            state.retire_outputs(&self.store);
            state.source = Some(Arc::clone(&source));
            state.source_media_id = None;
            state.state = ProcessingState::SourceLoaded;
            state.generation
        };

        info!(
            "[{generation}] 載入來源影片: {} ({:.1}s)",
            source.file_name(),
            source.duration_seconds()
        );

        if let Some(uploader) = &self.uploader {
            match uploader.upload(source.bytes(), &source.file_name(), &["source".to_string()]) {
                Ok(id) => {
                    let mut state = self.lock();
                    if state
                        .source
                        .as_ref()
                        .is_some_and(|current| Arc::ptr_eq(current, &source))
                    {
                        state.source_media_id = Some(id);
                    }
                }
                Err(e) => warn!("來源影片上傳失敗，僅保留本機副本: {e}"),
            }
        }

        generation
    }

    /// 送出精華剪輯請求
    ///
    /// 偵測與分配在呼叫端執行緒完成，佔位預覽發布後組合交給背景執行緒。
    /// 偵測失敗或沒有候選片段時直接回傳錯誤，不會啟動組合。
    pub fn request_highlight(&self, request: HighlightRequest) -> PipelineResult<JobTicket> {
        validate_request(&request)?;

        let (generation, source) = {
            let mut state = self.lock();
            let source = state.source.clone().ok_or(PipelineError::NoSource)?;
            state.generation += 1;
            state.retire_outputs(&self.store);
            state.state = ProcessingState::Requesting;
            (state.generation, source)
        };

        info!(
            "[{generation}] 偵測片段（{}）: {}",
            self.detector.name(),
            request.prompt_text
        );
        let detection_started = Instant::now();
        let wire = DetectionRequest::new(&request, &source);
        let response = match self.detector.detect(&wire, &source) {
            Ok(response) => response,
            Err(e) => {
                warn!("[{generation}] 片段偵測失敗: {e}");
                self.fail_if_current(generation, FailureKind::Detection(e.clone()));
                return Err(e.into());
            }
        };
        let detection_cost = StageCost::since(Stage::Detection, detection_started);

        let allocation_started = Instant::now();
        self.advance(generation, ProcessingState::Allocating)?;

        let candidates = response.into_candidates(source.duration_seconds());
        let clips = match allocate(&candidates, request.target_duration_secs, request.scene_count)
        {
            AllocationOutcome::Selected(allocation) if !allocation.clips.is_empty() => {
                info!(
                    "[{generation}] 選出 {} 個片段，共 {:.1}s",
                    allocation.clips.len(),
                    allocation.total_duration()
                );
                allocation.clips
            }
            _ => {
                warn!("[{generation}] 找不到可用的候選片段");
                self.fail_if_current(generation, FailureKind::AllocationEmpty);
                return Err(PipelineError::AllocationEmpty);
            }
        };
        let allocation_cost = StageCost::since(Stage::Allocation, allocation_started);

        self.publish_placeholder(generation, &source, &clips)?;
        self.advance(generation, ProcessingState::Assembling)?;

        let session = self.clone();
        let options = AssemblyOptions {
            include_captions: request.include_captions,
            target_duration_secs: Some(request.target_duration_secs),
        };
        let spawned = thread::Builder::new()
            .name(format!("highlight-job-{generation}"))
            .spawn(move || {
                session.run_assembly(
                    generation,
                    &source,
                    &clips,
                    options,
                    vec![detection_cost, allocation_cost],
                )
            });

        match spawned {
            Ok(handle) => Ok(JobTicket { generation, handle }),
            Err(e) => {
                let failure = AssemblyError::RuntimeUnavailable(e.to_string());
                self.fail_if_current(generation, FailureKind::Assembly(failure));
                Err(PipelineError::Io(e))
            }
        }
    }

    /// generation 仍相同時才推進狀態
    fn advance(&self, generation: u64, next: ProcessingState) -> PipelineResult<()> {
        let mut state = self.lock();
        if state.generation != generation {
            return Err(PipelineError::Superseded(generation));
        }
        state.state = next;
        Ok(())
    }

    fn publish_placeholder(
        &self,
        generation: u64,
        source: &SourceMedia,
        clips: &[SegmentClip],
    ) -> PipelineResult<()> {
        let first = clips.first().ok_or(PipelineError::AllocationEmpty)?;
        let media = self.store.publish(source.shared_bytes(), source.file_name());
        let preview = PreviewHandle {
            id: Uuid::new_v4(),
            generation,
            content: PreviewContent::SourceRange {
                media: media.clone(),
                start_time: first.start_time,
                end_time: first.end_time,
            },
        };

        {
            let mut state = self.lock();
            if state.generation != generation {
                self.store.release(&media);
                return Err(PipelineError::Superseded(generation));
            }
            state.preview = Some(preview.clone());
            state.state = ProcessingState::PlaceholderReady;
        }

        self.emit(SessionEvent::PlaceholderPublished {
            generation,
            preview,
        });
        Ok(())
    }

    fn run_assembly(
        &self,
        generation: u64,
        source: &SourceMedia,
        clips: &[SegmentClip],
        options: AssemblyOptions,
        upfront_costs: Vec<StageCost>,
    ) -> JobOutcome {
        info!("[{generation}] 開始組合 {} 個片段", clips.len());
        let result = self
            .assembler
            .assemble(source, clips, options, &self.store);

        let mut state = self.lock();
        if state.generation != generation {
            drop(state);
            if let Ok(highlight) = &result {
                self.store.release(&highlight.output);
            }
            info!("[{generation}] 工作已被取代，丟棄結果");
            self.emit(SessionEvent::JobDiscarded { generation });
            return JobOutcome::Discarded;
        }

        match result {
            Ok(mut highlight) => {
                let upfront_ms: u64 = upfront_costs.iter().map(|c| c.elapsed_ms).sum();
                let mut stage_costs = upfront_costs;
                stage_costs.append(&mut highlight.metadata.stage_costs);
                highlight.metadata.stage_costs = stage_costs;
                highlight.metadata.processing_time_ms =
                    highlight.metadata.processing_time_ms.saturating_add(upfront_ms);

                let rendered = PreviewContent::Rendered(highlight.output.clone());
                let preview = match state.preview.take() {
                    Some(mut preview) => {
                        if let PreviewContent::SourceRange { media, .. } = &preview.content {
                            self.store.release(media);
                        }
                        preview.content = rendered;
                        preview
                    }
                    None => PreviewHandle {
                        id: Uuid::new_v4(),
                        generation,
                        content: rendered,
                    },
                };

                state.preview = Some(preview.clone());
                state.final_highlight = Some(highlight.clone());
                state.state = ProcessingState::Ready;
                drop(state);

                info!(
                    "[{generation}] 精華影片完成（{:.1}s）",
                    highlight.realized_duration_secs
                );
                self.emit(SessionEvent::FinalPublished {
                    generation,
                    preview,
                });
                JobOutcome::Published(highlight)
            }
            Err(e) => {
                state.retire_outputs(&self.store);
                state.state = ProcessingState::Failed(FailureKind::Assembly(e.clone()));
                drop(state);

                warn!("[{generation}] 組合失敗: {e}");
                self.emit(SessionEvent::JobFailed {
                    generation,
                    error: e.clone(),
                });
                JobOutcome::Failed(e)
            }
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.lock();
        SessionSnapshot {
            generation: state.generation,
            state: state.state.clone(),
            source_name: state.source.as_ref().map(|s| s.file_name()),
            source_media_id: state.source_media_id.clone(),
            preview: state.preview.clone(),
            final_highlight: state.final_highlight.clone(),
        }
    }

    #[must_use]
    pub fn state(&self) -> ProcessingState {
        self.lock().state.clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().state.is_busy()
    }

    #[must_use]
    pub fn preview(&self) -> Option<PreviewHandle> {
        self.lock().preview.clone()
    }

    #[must_use]
    pub fn final_highlight(&self) -> Option<AssembledHighlight> {
        self.lock().final_highlight.clone()
    }

    /// 將最終輸出寫到檔案，有字幕時一併寫出同名 `.srt`
    pub fn export_final(&self, destination: &Path) -> PipelineResult<PathBuf> {
        let highlight = self.final_highlight().ok_or(PipelineError::NoHighlight)?;
        self.store.export(&highlight.output, destination)?;

        if let Some(captions) = &highlight.captions {
            let srt_path = destination.with_extension("srt");
            fs::write(&srt_path, captions)?;
            info!("字幕已輸出: {}", srt_path.display());
        }

        info!("精華影片已輸出: {}", destination.display());
        Ok(destination.to_path_buf())
    }

    /// 將最終輸出加入媒體庫
    pub fn add_to_library(&self, tags: &[String]) -> Result<MediaId, UploadError> {
        let uploader = self.uploader.as_ref().ok_or(UploadError::NotConfigured)?;
        let highlight = self
            .final_highlight()
            .ok_or(UploadError::NothingToUpload)?;
        let bytes = self
            .store
            .bytes(&highlight.output)
            .ok_or(UploadError::NothingToUpload)?;

        uploader.upload(&bytes, &highlight.output.file_name, tags)
    }

    /// 結束工作階段：作廢進行中的工作並釋放所有資源
    pub fn close(&self) {
        let mut state = self.lock();
        state.generation += 1;
        state.retire_outputs(&self.store);
        state.source = None;
        state.source_media_id = None;
        state.state = ProcessingState::Idle;
    }
}
