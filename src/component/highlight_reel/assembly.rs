//! 精華影片組合引擎
//!
//! 組合流程：
//! 1. 載入媒體處理環境（結束時自動釋放）
//! 2. 來源寫入工作目錄一次
//! 3. 平行裁切每個片段（失敗時調整範圍重試一次，仍失敗則捨棄）
//! 4. 量測每個片段的實際長度，超出目標加關鍵幀誤差時捨棄名次最低的片段
//! 5. 依播放順序建立清單並串接
//! 6. 讀取輸出並發布到媒體資源表
//!
//! 串接失敗時改用名次最高的單一片段，不視為錯誤。

use crate::component::highlight_reel::captions::build_srt;
use crate::component::highlight_reel::error::AssemblyError;
use crate::component::highlight_reel::media_store::MediaStore;
use crate::component::highlight_reel::runtime::{
    ArtifactRef, ConcatManifest, FfmpegLoader, MediaRuntime, RuntimeLoader,
};
use crate::component::highlight_reel::types::{
    AssembledHighlight, HighlightMetadata, KEYFRAME_TOLERANCE_SECS, SegmentClip, SourceMedia,
    Stage, StageCost,
};
use log::{debug, error, info, warn};
use rayon::prelude::*;
use std::time::Instant;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AssemblyOptions {
    pub include_captions: bool,
    /// 設定時，輸出長度不得超過目標加上 `KEYFRAME_TOLERANCE_SECS`
    pub target_duration_secs: Option<f64>,
}

pub trait Assembler: Send + Sync {
    /// `clips` 應已依來源時間排序
    fn assemble(
        &self,
        source: &SourceMedia,
        clips: &[SegmentClip],
        options: AssemblyOptions,
        store: &MediaStore,
    ) -> Result<AssembledHighlight, AssemblyError>;
}

pub struct AssemblyEngine {
    loader: Box<dyn RuntimeLoader>,
}

impl AssemblyEngine {
    #[must_use]
    pub fn new(loader: Box<dyn RuntimeLoader>) -> Self {
        Self { loader }
    }

    #[must_use]
    pub fn with_ffmpeg(program: &str) -> Self {
        Self::new(Box::new(FfmpegLoader::new(program)))
    }
}

/// 將範圍限制在 `[0, source_duration]` 內
#[must_use]
pub fn clamp_to_source(start: f64, end: f64, source_duration: f64) -> (f64, f64) {
    let limit = source_duration.max(0.0);
    let start = start.clamp(0.0, limit);
    let end = end.clamp(start, limit);
    (start, end)
}

fn trim_clip(
    runtime: &dyn MediaRuntime,
    source: &ArtifactRef,
    clip: &SegmentClip,
    index: usize,
    source_duration: f64,
    extension: &str,
) -> Option<ArtifactRef> {
    let output_name = format!("clip_{index:03}.{extension}");

    match runtime.trim(source, clip.start_time, clip.duration(), &output_name) {
        Ok(artifact) => return Some(artifact),
        Err(e) => warn!("片段 {index} 裁切失敗，調整範圍後重試: {e}"),
    }

    let (start, end) = clamp_to_source(clip.start_time, clip.end_time, source_duration);
    if end <= start {
        error!("片段 {index} 不在來源範圍內，捨棄");
        return None;
    }

    match runtime.trim(source, start, end - start, &output_name) {
        Ok(artifact) => Some(artifact),
        Err(e) => {
            error!("片段 {index} 重試仍失敗，捨棄: {e}");
            None
        }
    }
}

/// 裁切成功的片段與它在工作目錄中的實際長度
struct TrimmedClip {
    index: usize,
    clip: SegmentClip,
    artifact: ArtifactRef,
    actual_secs: f64,
}

fn measure(runtime: &dyn MediaRuntime, artifact: &ArtifactRef, clip: &SegmentClip) -> f64 {
    runtime
        .probe_duration(artifact)
        .unwrap_or_else(|| clip.duration())
}

fn total_secs(trimmed: &[TrimmedClip]) -> f64 {
    trimmed.iter().map(|t| t.actual_secs).sum()
}

/// 關鍵幀對齊讓每個片段都可能比預計長，累加後超出上限時：
/// 先依名次由低到高捨棄片段，只剩一個仍超出則縮短結尾重新裁切
fn fit_to_budget(
    runtime: &dyn MediaRuntime,
    source: &ArtifactRef,
    survivors: &mut Vec<TrimmedClip>,
    dropped_clips: &mut Vec<usize>,
    target: f64,
    extension: &str,
) {
    let limit = target + KEYFRAME_TOLERANCE_SECS;

    while survivors.len() > 1 && total_secs(survivors) > limit {
        let Some(worst) = survivors
            .iter()
            .enumerate()
            .max_by_key(|(_, t)| t.clip.rank)
            .map(|(position, _)| position)
        else {
            break;
        };
        let removed = survivors.remove(worst);
        warn!(
            "實際長度 {:.2}s 超過上限 {limit:.2}s，捨棄名次 {} 的片段 {}",
            total_secs(survivors) + removed.actual_secs,
            removed.clip.rank,
            removed.index
        );
        dropped_clips.push(removed.index);
    }

    let [only] = survivors.as_mut_slice() else {
        return;
    };
    if only.actual_secs <= limit {
        return;
    }

    let shortened = only.clip.duration() - (only.actual_secs - target);
    if shortened <= 0.0 {
        warn!("片段 {} 的關鍵幀前導超過目標長度，無法縮短", only.index);
        return;
    }

    let output_name = format!("clip_{:03}_fit.{extension}", only.index);
    match runtime.trim(source, only.clip.start_time, shortened, &output_name) {
        Ok(artifact) => {
            only.clip.end_time = only.clip.start_time + shortened;
            only.clip.truncated = true;
            only.actual_secs = measure(runtime, &artifact, &only.clip);
            only.artifact = artifact;
            info!(
                "片段 {} 縮短為 {shortened:.2}s，實際 {:.2}s",
                only.index, only.actual_secs
            );
        }
        Err(e) => warn!("片段 {} 縮短重新裁切失敗: {e}", only.index),
    }
}

impl Assembler for AssemblyEngine {
    fn assemble(
        &self,
        source: &SourceMedia,
        clips: &[SegmentClip],
        options: AssemblyOptions,
        store: &MediaStore,
    ) -> Result<AssembledHighlight, AssemblyError> {
        let started = Instant::now();

        if clips.is_empty() {
            return Err(AssemblyError::NothingToAssemble);
        }

        let mut ordered = clips.to_vec();
        ordered.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

        let runtime = self
            .loader
            .load()
            .map_err(|e| AssemblyError::RuntimeUnavailable(e.to_string()))?;

        let mut stage_costs = Vec::with_capacity(4);
        let extension = source.extension();

        let stage = Instant::now();
        let source_ref = runtime
            .write_source(&source.workspace_file_name(), source.bytes())
            .map_err(|e| AssemblyError::Workspace(e.to_string()))?;
        stage_costs.push(StageCost::since(Stage::WriteSource, stage));

        let stage = Instant::now();
        let trimmed: Vec<Option<ArtifactRef>> = ordered
            .par_iter()
            .enumerate()
            .map(|(index, clip)| {
                trim_clip(
                    runtime.as_ref(),
                    &source_ref,
                    clip,
                    index,
                    source.duration_seconds(),
                    extension,
                )
            })
            .collect();
        stage_costs.push(StageCost::since(Stage::Trim, stage));

        let mut survivors: Vec<TrimmedClip> = Vec::with_capacity(ordered.len());
        let mut dropped_clips = Vec::new();
        for (index, (clip, artifact)) in ordered.into_iter().zip(trimmed).enumerate() {
            match artifact {
                Some(artifact) => {
                    let actual_secs = measure(runtime.as_ref(), &artifact, &clip);
                    survivors.push(TrimmedClip {
                        index,
                        clip,
                        artifact,
                        actual_secs,
                    });
                }
                None => dropped_clips.push(index),
            }
        }

        if survivors.is_empty() {
            return Err(AssemblyError::NoSurvivingSegments);
        }

        if let Some(target) = options.target_duration_secs {
            fit_to_budget(
                runtime.as_ref(),
                &source_ref,
                &mut survivors,
                &mut dropped_clips,
                target,
                extension,
            );
        }
        dropped_clips.sort_unstable();

        info!(
            "裁切完成：{} 個保留，{} 個捨棄",
            survivors.len(),
            dropped_clips.len()
        );

        let stage = Instant::now();
        let output_name = format!("highlight.{extension}");
        let (output_ref, kept, fallback_used) = if survivors.len() == 1 {
            let only = survivors.remove(0);
            (only.artifact.clone(), vec![only], false)
        } else {
            let manifest =
                ConcatManifest::new(survivors.iter().map(|t| t.artifact.clone()).collect());
            debug!("串接清單:\n{}", manifest.render());

            match runtime.concat(&manifest, &output_name) {
                Ok(artifact) => (artifact, survivors, false),
                Err(e) => {
                    warn!("串接失敗，改用最佳單一片段: {e}");
                    let best = survivors
                        .into_iter()
                        .min_by_key(|t| t.clip.rank)
                        .ok_or(AssemblyError::NoSurvivingSegments)?;
                    (best.artifact.clone(), vec![best], true)
                }
            }
        };
        stage_costs.push(StageCost::since(Stage::Concat, stage));

        let stage = Instant::now();
        let bytes = runtime
            .read(&output_ref)
            .map_err(|e| AssemblyError::Output(e.to_string()))?;
        if bytes.is_empty() {
            return Err(AssemblyError::Output(format!(
                "{} 是空檔案",
                output_ref.name()
            )));
        }

        let clip_secs: Vec<f64> = kept.iter().map(|t| t.actual_secs).collect();
        let final_clips: Vec<SegmentClip> = kept.into_iter().map(|t| t.clip).collect();
        let realized_duration_secs = runtime
            .probe_duration(&output_ref)
            .unwrap_or_else(|| clip_secs.iter().sum());
        stage_costs.push(StageCost::since(Stage::ReadOutput, stage));

        let captions = options
            .include_captions
            .then(|| build_srt(&final_clips, &clip_secs));
        let output = store.publish(bytes, output_name);

        let processing_time_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        info!(
            "精華影片完成：{} 個片段，{realized_duration_secs:.2}s，耗時 {processing_time_ms}ms",
            final_clips.len()
        );

        Ok(AssembledHighlight {
            clips: final_clips,
            output,
            realized_duration_secs,
            metadata: HighlightMetadata {
                processing_time_ms,
                fallback_used,
                stage_costs,
            },
            captions,
            dropped_clips,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::highlight_reel::error::MediaOpError;
    use crate::component::highlight_reel::types::CandidateSegment;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// 記憶體內的假環境：裁切產生 `start..end` 的文字，串接合併內容
    #[derive(Default)]
    struct FakeState {
        files: Mutex<HashMap<String, Vec<u8>>>,
        lengths: Mutex<HashMap<String, f64>>,
        trim_calls: AtomicUsize,
        concat_calls: AtomicUsize,
        writes: AtomicUsize,
        dropped: AtomicUsize,
    }

    struct FakeRuntime {
        state: Arc<FakeState>,
        fail_trim_at: Option<f64>,
        fail_concat: bool,
        keyframe_interval: Option<f64>,
    }

    impl Drop for FakeRuntime {
        fn drop(&mut self) {
            self.state.dropped.fetch_add(1, Ordering::SeqCst);
        }
    }

    impl MediaRuntime for FakeRuntime {
        fn write_source(&self, name: &str, bytes: &[u8]) -> Result<ArtifactRef, MediaOpError> {
            self.state.writes.fetch_add(1, Ordering::SeqCst);
            self.state
                .files
                .lock()
                .unwrap()
                .insert(name.to_string(), bytes.to_vec());
            Ok(ArtifactRef::new(name))
        }

        fn trim(
            &self,
            _input: &ArtifactRef,
            start: f64,
            duration: f64,
            output_name: &str,
        ) -> Result<ArtifactRef, MediaOpError> {
            self.state.trim_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_trim_at == Some(start) {
                return Err(MediaOpError::Command("invalid seek".to_string()));
            }
            let content = format!("{start}..{}", start + duration);
            self.state
                .files
                .lock()
                .unwrap()
                .insert(output_name.to_string(), content.into_bytes());

            // stream copy 從前一個關鍵幀開始
            if let Some(interval) = self.keyframe_interval {
                let lead_in = start - (start / interval).floor() * interval;
                self.state
                    .lengths
                    .lock()
                    .unwrap()
                    .insert(output_name.to_string(), lead_in + duration);
            }
            Ok(ArtifactRef::new(output_name))
        }

        fn concat(
            &self,
            manifest: &ConcatManifest,
            output_name: &str,
        ) -> Result<ArtifactRef, MediaOpError> {
            self.state.concat_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_concat {
                return Err(MediaOpError::Command("non-monotonic dts".to_string()));
            }
            let mut files = self.state.files.lock().unwrap();
            let joined: Vec<String> = manifest
                .entries()
                .iter()
                .map(|e| String::from_utf8(files[e.name()].clone()).unwrap())
                .collect();
            files.insert(output_name.to_string(), joined.join("|").into_bytes());

            let mut lengths = self.state.lengths.lock().unwrap();
            let total: Option<f64> = manifest
                .entries()
                .iter()
                .map(|e| lengths.get(e.name()).copied())
                .sum();
            if let Some(total) = total {
                lengths.insert(output_name.to_string(), total);
            }
            Ok(ArtifactRef::new(output_name))
        }

        fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, MediaOpError> {
            self.state
                .files
                .lock()
                .unwrap()
                .get(artifact.name())
                .cloned()
                .ok_or_else(|| MediaOpError::MissingOutput(artifact.name().to_string()))
        }

        fn probe_duration(&self, artifact: &ArtifactRef) -> Option<f64> {
            self.state.lengths.lock().unwrap().get(artifact.name()).copied()
        }
    }

    struct FakeLoader {
        state: Arc<FakeState>,
        fail_trim_at: Option<f64>,
        fail_concat: bool,
        unavailable: bool,
        keyframe_interval: Option<f64>,
    }

    impl FakeLoader {
        fn new(state: &Arc<FakeState>) -> Self {
            Self {
                state: Arc::clone(state),
                fail_trim_at: None,
                fail_concat: false,
                unavailable: false,
                keyframe_interval: None,
            }
        }
    }

    impl RuntimeLoader for FakeLoader {
        fn load(&self) -> Result<Box<dyn MediaRuntime>, MediaOpError> {
            if self.unavailable {
                return Err(MediaOpError::Command("no ffmpeg".to_string()));
            }
            Ok(Box::new(FakeRuntime {
                state: Arc::clone(&self.state),
                fail_trim_at: self.fail_trim_at,
                fail_concat: self.fail_concat,
                keyframe_interval: self.keyframe_interval,
            }))
        }
    }

    fn source() -> SourceMedia {
        SourceMedia::new("match", "mp4", vec![7; 64], 120.0)
    }

    fn clips() -> Vec<SegmentClip> {
        // 名次與時間順序不同
        [(10.0, 20.0, 2), (40.0, 50.0, 0), (70.0, 80.0, 1)]
            .into_iter()
            .map(|(s, e, rank)| SegmentClip::from_candidate(&CandidateSegment::new(s, e, 0.5), rank))
            .collect()
    }

    fn text(store: &MediaStore, highlight: &AssembledHighlight) -> String {
        String::from_utf8(store.bytes(&highlight.output).unwrap().to_vec()).unwrap()
    }

    #[test]
    fn test_concat_in_timeline_order() {
        let state = Arc::new(FakeState::default());
        let engine = AssemblyEngine::new(Box::new(FakeLoader::new(&state)));
        let store = MediaStore::new();

        let highlight = engine
            .assemble(&source(), &clips(), AssemblyOptions::default(), &store)
            .unwrap();

        assert_eq!(text(&store, &highlight), "10..20|40..50|70..80");
        assert!(!highlight.metadata.fallback_used);
        assert!((highlight.realized_duration_secs - 30.0).abs() < 1e-9);
        assert_eq!(state.writes.load(Ordering::SeqCst), 1);
        assert_eq!(state.trim_calls.load(Ordering::SeqCst), 3);
        assert_eq!(state.dropped.load(Ordering::SeqCst), 1);
        assert!(highlight.captions.is_none());
        for stage in [Stage::WriteSource, Stage::Trim, Stage::Concat, Stage::ReadOutput] {
            assert!(highlight.metadata.cost_of(stage).is_some(), "{stage}");
        }
    }

    #[test]
    fn test_concat_failure_falls_back_to_best_clip() {
        let state = Arc::new(FakeState::default());
        let mut loader = FakeLoader::new(&state);
        loader.fail_concat = true;
        let engine = AssemblyEngine::new(Box::new(loader));
        let store = MediaStore::new();

        let highlight = engine
            .assemble(&source(), &clips(), AssemblyOptions::default(), &store)
            .unwrap();

        assert_eq!(state.trim_calls.load(Ordering::SeqCst), 3);
        assert!(highlight.metadata.fallback_used);
        assert_eq!(highlight.clips.len(), 1);
        assert_eq!(highlight.clips[0].rank, 0);
        assert_eq!(text(&store, &highlight), "40..50");
    }

    #[test]
    fn test_trim_retried_with_clamped_range() {
        let state = Arc::new(FakeState::default());
        let mut loader = FakeLoader::new(&state);
        loader.fail_trim_at = Some(115.0);
        let engine = AssemblyEngine::new(Box::new(loader));
        let store = MediaStore::new();

        let overrun = SegmentClip::from_candidate(&CandidateSegment::new(115.0, 125.0, 0.5), 0);
        let err = engine
            .assemble(&source(), &[overrun], AssemblyOptions::default(), &store)
            .unwrap_err();

        // 重試時起點仍是 115，同樣失敗
        assert_eq!(err, AssemblyError::NoSurvivingSegments);
        assert_eq!(state.trim_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_negative_start_recovers_on_retry() {
        let state = Arc::new(FakeState::default());
        let mut loader = FakeLoader::new(&state);
        loader.fail_trim_at = Some(-2.0);
        let engine = AssemblyEngine::new(Box::new(loader));
        let store = MediaStore::new();

        let early = SegmentClip::from_candidate(&CandidateSegment::new(-2.0, 6.0, 0.5), 0);
        let highlight = engine
            .assemble(&source(), &[early], AssemblyOptions::default(), &store)
            .unwrap();

        assert_eq!(text(&store, &highlight), "0..6");
        assert!(highlight.dropped_clips.is_empty());
    }

    #[test]
    fn test_failing_clip_dropped_others_kept() {
        let state = Arc::new(FakeState::default());
        let mut loader = FakeLoader::new(&state);
        loader.fail_trim_at = Some(40.0);
        let engine = AssemblyEngine::new(Box::new(loader));
        let store = MediaStore::new();

        let highlight = engine
            .assemble(&source(), &clips(), AssemblyOptions::default(), &store)
            .unwrap();

        assert_eq!(highlight.dropped_clips, vec![1]);
        assert_eq!(text(&store, &highlight), "10..20|70..80");
        assert!(!highlight.metadata.fallback_used);
    }

    #[test]
    fn test_hard_failures() {
        let store = MediaStore::new();
        let state = Arc::new(FakeState::default());

        let mut unavailable = FakeLoader::new(&state);
        unavailable.unavailable = true;
        let engine = AssemblyEngine::new(Box::new(unavailable));
        assert!(matches!(
            engine.assemble(&source(), &clips(), AssemblyOptions::default(), &store),
            Err(AssemblyError::RuntimeUnavailable(_))
        ));

        let engine = AssemblyEngine::new(Box::new(FakeLoader::new(&state)));
        assert_eq!(
            engine.assemble(&source(), &[], AssemblyOptions::default(), &store),
            Err(AssemblyError::NothingToAssemble)
        );
        assert_eq!(store.live_count(), 0);
    }

    #[test]
    fn test_captions_follow_final_clips() {
        let state = Arc::new(FakeState::default());
        let engine = AssemblyEngine::new(Box::new(FakeLoader::new(&state)));
        let store = MediaStore::new();

        let highlight = engine
            .assemble(
                &source(),
                &clips(),
                AssemblyOptions {
                    include_captions: true,
                    ..AssemblyOptions::default()
                },
                &store,
            )
            .unwrap();

        let captions = highlight.captions.unwrap();
        assert!(captions.contains("00:00:20,000 --> 00:00:30,000"));
    }

    /// 來源每 4 秒一個關鍵幀，片段起點都不在關鍵幀上
    fn drifting_engine(state: &Arc<FakeState>) -> AssemblyEngine {
        let mut loader = FakeLoader::new(state);
        loader.keyframe_interval = Some(4.0);
        AssemblyEngine::new(Box::new(loader))
    }

    fn ranked(ranges: &[(f64, f64)]) -> Vec<SegmentClip> {
        ranges
            .iter()
            .enumerate()
            .map(|(rank, &(s, e))| SegmentClip::from_candidate(&CandidateSegment::new(s, e, 0.5), rank))
            .collect()
    }

    #[test]
    fn test_keyframe_drift_drops_lowest_ranked_clip() {
        let state = Arc::new(FakeState::default());
        let engine = drifting_engine(&state);
        let store = MediaStore::new();

        // 預計 8 + 8 + 4 = 20 秒，實際 11.5 + 8.5 + 4.5 = 24.5 秒
        let clips = ranked(&[(3.5, 11.5), (20.5, 28.5), (40.5, 44.5)]);
        let highlight = engine
            .assemble(
                &source(),
                &clips,
                AssemblyOptions {
                    include_captions: true,
                    target_duration_secs: Some(20.0),
                },
                &store,
            )
            .unwrap();

        assert_eq!(highlight.clips.len(), 2);
        assert!(highlight.clips.iter().all(|c| c.rank < 2));
        assert_eq!(highlight.dropped_clips, vec![2]);
        assert!((highlight.realized_duration_secs - 20.0).abs() < 1e-9);
        assert!(highlight.realized_duration_secs <= 20.0 + KEYFRAME_TOLERANCE_SECS);
        assert_eq!(text(&store, &highlight), "3.5..11.5|20.5..28.5");

        let captions = highlight.captions.unwrap();
        assert!(captions.contains("00:00:11,500 --> 00:00:20,000"));
    }

    #[test]
    fn test_keyframe_drift_on_single_clip_retrims_shorter() {
        let state = Arc::new(FakeState::default());
        let engine = drifting_engine(&state);
        let store = MediaStore::new();

        // 前導 3.5 秒讓 20 秒的片段變成 23.5 秒
        let clips = ranked(&[(3.5, 23.5)]);
        let highlight = engine
            .assemble(
                &source(),
                &clips,
                AssemblyOptions {
                    include_captions: false,
                    target_duration_secs: Some(20.0),
                },
                &store,
            )
            .unwrap();

        assert_eq!(state.trim_calls.load(Ordering::SeqCst), 2);
        assert!((highlight.realized_duration_secs - 20.0).abs() < 1e-9);
        assert!((highlight.clips[0].end_time - 20.0).abs() < 1e-9);
        assert!(highlight.clips[0].truncated);
        assert!(highlight.dropped_clips.is_empty());
    }

    #[test]
    fn test_drift_within_tolerance_keeps_all_clips() {
        let state = Arc::new(FakeState::default());
        let engine = drifting_engine(&state);
        let store = MediaStore::new();

        // 實際 8.5 + 9.0 = 17.5 秒，仍在 16 + 2 之內
        let clips = ranked(&[(4.5, 12.5), (21.0, 29.0)]);
        let highlight = engine
            .assemble(
                &source(),
                &clips,
                AssemblyOptions {
                    include_captions: false,
                    target_duration_secs: Some(16.0),
                },
                &store,
            )
            .unwrap();

        assert_eq!(highlight.clips.len(), 2);
        assert!(highlight.dropped_clips.is_empty());
        assert!((highlight.realized_duration_secs - 17.5).abs() < 1e-9);
    }

    #[test]
    fn test_clamp_to_source() {
        assert_eq!(clamp_to_source(-2.0, 5.0, 120.0), (0.0, 5.0));
        assert_eq!(clamp_to_source(115.0, 125.0, 120.0), (115.0, 120.0));
        assert_eq!(clamp_to_source(130.0, 140.0, 120.0), (120.0, 120.0));
    }
}
