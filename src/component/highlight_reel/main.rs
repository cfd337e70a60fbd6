use super::assembly::AssemblyEngine;
use super::detector::{CommandDetector, FallbackDetector, SegmentDetector};
use super::error::PipelineError;
use super::lifecycle::{HighlightSession, JobOutcome, PreviewContent, SessionEvent};
use super::normalizer::{format_mmss, normalize_duration_input, parse_mmss};
use super::scene_detector::SceneChangeDetector;
use super::types::{
    AssembledHighlight, HighlightRequest, KEYFRAME_TOLERANCE_SECS, MAX_MANUAL_SCENES,
    MIN_MANUAL_SCENES, SceneCountMode, SourceMedia, Stage,
};
use super::upload::LibraryDirectoryUploader;
use crate::config::save::{add_recent_path, save_settings};
use crate::config::{Config, DetectorSettings};
use crate::tools::{
    ensure_directory_exists, highlight_output_path, scan_video_files, validate_source_file,
};
use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

const FFMPEG_PROGRAM: &str = "ffmpeg";
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(200);
const SCAN_DEPTH: usize = 2;

/// 精華影片產生器
///
/// 互動流程：選擇來源 → 輸入描述、長度、場景數 → 偵測與分配 →
/// 背景組合（顯示進度）→ 輸出檔案與字幕 → 選擇是否加入媒體庫
pub struct HighlightReelGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl HighlightReelGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 執行完成後回傳更新過的設定（最近使用的路徑）
    pub fn run(mut self) -> Result<Config> {
        println!("{}", style("=== 精華影片產生 ===").cyan().bold());
        // 上一次的中斷不影響這次
        self.shutdown_signal.store(false, Ordering::SeqCst);

        let Some(source_path) = self.prompt_source_path()? else {
            return Ok(self.config);
        };

        println!("{}", style("讀取影片中...").dim());
        let source = SourceMedia::from_path(&source_path)?;
        println!(
            "  {} ({})",
            source.file_name(),
            format_mmss(source.duration_seconds())
        );

        let request = self.prompt_request(&source)?;
        let target = request.target_duration_secs;

        let (sender, receiver) = mpsc::channel();
        let session = self.build_session().with_events(sender);
        session.load_source(source.clone());

        add_recent_path(&mut self.config.settings, &source_path.to_string_lossy());
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存設定: {e}");
        }

        let Some(highlight) = self.generate(&session, &receiver, request)? else {
            return Ok(self.config);
        };

        Self::print_summary(&highlight, target);
        self.export(&session, &source, &source_path)?;
        self.offer_library_upload(&session)?;

        session.close();
        Ok(self.config)
    }

    fn prompt_source_path(&self) -> Result<Option<PathBuf>> {
        let recent_paths = &self.config.settings.recent_paths;

        let input = if recent_paths.is_empty() {
            Self::prompt_path_text()?
        } else {
            let mut options: Vec<String> = recent_paths
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let indicator = if Path::new(p).exists() { "✓" } else { "✗" };
                    format!("{} [{}] {}", i + 1, indicator, p)
                })
                .collect();
            options.push("輸入新路徑...".to_string());

            println!("{}", style("(按 ESC 返回主選單)").dim());

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt("請選擇來源影片")
                .items(&options)
                .default(0)
                .interact_opt()?;

            match selection {
                None => return Ok(None),
                Some(idx) if idx < recent_paths.len() => recent_paths[idx].clone(),
                Some(_) => Self::prompt_path_text()?,
            }
        };

        let path = PathBuf::from(input);
        if path.is_dir() {
            return Self::pick_from_directory(&path);
        }

        validate_source_file(&path)?;
        Ok(Some(path))
    }

    fn prompt_path_text() -> Result<String> {
        let path: String = Input::new()
            .with_prompt("請輸入影片檔案或資料夾路徑")
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    fn pick_from_directory(directory: &Path) -> Result<Option<PathBuf>> {
        println!("{}", style("掃描影片檔案中...").dim());
        let videos: Vec<_> = scan_video_files(directory, SCAN_DEPTH)?
            .into_iter()
            .filter(|v| v.duration_seconds.is_some())
            .collect();

        if videos.is_empty() {
            println!("{}", style("找不到任何影片檔案").yellow());
            return Ok(None);
        }

        let items: Vec<String> = videos
            .iter()
            .map(|v| {
                format!(
                    "{} ({}, {:.1} MB)",
                    v.path.file_name().unwrap_or_default().to_string_lossy(),
                    format_mmss(v.duration_seconds.unwrap_or_default()),
                    v.size as f64 / 1024.0 / 1024.0
                )
            })
            .collect();

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇來源影片")
            .items(&items)
            .default(0)
            .interact_opt()?;

        Ok(selection.map(|idx| videos[idx].path.clone()))
    }

    fn prompt_request(&self, source: &SourceMedia) -> Result<HighlightRequest> {
        let defaults = &self.config.settings.highlight;

        let prompt_text: String = Input::new()
            .with_prompt("想找什麼樣的片段？")
            .validate_with(|input: &String| -> Result<(), &str> {
                if input.trim().is_empty() {
                    Err("描述不能是空白")
                } else {
                    Ok(())
                }
            })
            .interact_text()?;

        let target_text: String = Input::new()
            .with_prompt(format!(
                "精華長度 (mm:ss，來源 {})",
                format_mmss(source.duration_seconds())
            ))
            .default(format_mmss(defaults.target_duration_secs))
            .validate_with(|input: &String| -> Result<(), &str> {
                parse_mmss(input).map(|_| ()).ok_or("格式錯誤，例如 00:30")
            })
            .interact_text()?;
        let target = normalize_duration_input(&target_text).context("長度格式錯誤")?;
        if parse_mmss(&target_text).map(f64::from) != Some(target) {
            println!(
                "{}",
                style(format!("精華長度已調整為 {}", format_mmss(target))).yellow()
            );
        }

        let scene_count = Self::prompt_scene_count(defaults.scene_count)?;

        let request = defaults
            .to_request(prompt_text.trim())
            .with_scene_count(scene_count);
        let request = HighlightRequest {
            target_duration_secs: target,
            ..request
        };

        if request.target_duration_secs > source.duration_seconds() {
            println!(
                "{}",
                style("精華長度超過來源長度，實際輸出會較短").yellow()
            );
        }

        Ok(request)
    }

    fn prompt_scene_count(current: SceneCountMode) -> Result<SceneCountMode> {
        let items = ["自動", "手動指定"];
        let default_index = usize::from(matches!(current, SceneCountMode::Manual(_)));

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("場景數")
            .items(&items)
            .default(default_index)
            .interact()?;

        if selection == 0 {
            return Ok(SceneCountMode::Auto);
        }

        let default_count = match current {
            SceneCountMode::Manual(n) => n,
            SceneCountMode::Auto => 5,
        };
        let count: u32 = Input::new()
            .with_prompt(format!("場景數 ({MIN_MANUAL_SCENES}-{MAX_MANUAL_SCENES})"))
            .default(default_count)
            .validate_with(|n: &u32| -> Result<(), String> {
                SceneCountMode::manual(*n).map(|_| ()).map_err(|e| e.to_string())
            })
            .interact_text()?;

        Ok(SceneCountMode::manual(count)?)
    }

    fn build_detector(settings: &DetectorSettings) -> Arc<dyn SegmentDetector> {
        let Some(command) = settings
            .command
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
        else {
            info!("未設定偵測程式，使用本機場景偵測");
            return Arc::new(SceneChangeDetector::new());
        };

        let primary = CommandDetector::new(
            command,
            settings.args.clone(),
            Duration::from_secs(settings.timeout_secs.max(1)),
        );

        if settings.fallback_to_scene_detection {
            Arc::new(FallbackDetector::new(
                Box::new(primary),
                Box::new(SceneChangeDetector::new()),
            ))
        } else {
            Arc::new(primary)
        }
    }

    fn build_session(&self) -> HighlightSession {
        let settings = &self.config.settings;
        let session = HighlightSession::new(
            Self::build_detector(&settings.detector),
            Arc::new(AssemblyEngine::with_ffmpeg(FFMPEG_PROGRAM)),
        );

        match &settings.library_directory {
            Some(dir) if !dir.trim().is_empty() => {
                session.with_uploader(Arc::new(LibraryDirectoryUploader::new(dir.trim())))
            }
            _ => session,
        }
    }

    fn generate(
        &self,
        session: &HighlightSession,
        receiver: &Receiver<SessionEvent>,
        request: HighlightRequest,
    ) -> Result<Option<AssembledHighlight>> {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .expect("Invalid progress bar template"),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner.set_message("偵測片段中...");

        let ticket = match session.request_highlight(request) {
            Ok(ticket) => ticket,
            Err(PipelineError::AllocationEmpty) => {
                spinner.finish_and_clear();
                println!("{}", style("找不到符合描述的片段，請換個描述再試一次").yellow());
                return Ok(None);
            }
            Err(e) => {
                spinner.abandon_with_message("偵測失敗");
                return Err(e.into());
            }
        };

        loop {
            if self.shutdown_signal.load(Ordering::SeqCst) {
                spinner.abandon_with_message("操作已中斷");
                warn!("收到中斷訊號，停止等待精華影片");
                return Ok(None);
            }

            match receiver.recv_timeout(EVENT_POLL_INTERVAL) {
                Ok(SessionEvent::PlaceholderPublished { preview, .. }) => {
                    if let PreviewContent::SourceRange {
                        start_time,
                        end_time,
                        ..
                    } = preview.content
                    {
                        spinner.set_message(format!(
                            "組合中...（預覽 {} - {}）",
                            format_mmss(start_time),
                            format_mmss(end_time)
                        ));
                    }
                }
                Ok(_) | Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => thread::sleep(EVENT_POLL_INTERVAL),
            }

            if ticket.is_finished() {
                break;
            }
        }

        match ticket.wait() {
            JobOutcome::Published(highlight) => {
                spinner.finish_with_message("精華影片完成");
                Ok(Some(highlight))
            }
            JobOutcome::Discarded => {
                spinner.finish_and_clear();
                Ok(None)
            }
            JobOutcome::Failed(e) => {
                spinner.abandon_with_message("組合失敗");
                bail!(PipelineError::AssemblyFailed(e))
            }
        }
    }

    fn print_summary(highlight: &AssembledHighlight, target: f64) {
        println!();
        println!("{}", style("=== 精華影片摘要 ===").cyan().bold());
        for (index, clip) in highlight.clips.iter().enumerate() {
            let marker = if clip.truncated { " (截短)" } else { "" };
            println!(
                "  {}. {} - {}{} {}",
                index + 1,
                format_mmss(clip.start_time),
                format_mmss(clip.end_time),
                marker,
                style(&clip.segment.description).dim()
            );
        }
        println!(
            "  長度: {:.1}s",
            style(highlight.realized_duration_secs).green()
        );

        if !highlight.dropped_clips.is_empty() {
            println!(
                "  捨棄: {} 個片段",
                style(highlight.dropped_clips.len()).yellow()
            );
        }
        if highlight.metadata.fallback_used {
            println!("  {}", style("串接失敗，只輸出最佳片段").yellow());
        }
        if highlight.realized_duration_secs > target + KEYFRAME_TOLERANCE_SECS {
            warn!(
                "輸出長度 {:.1}s 超過目標 {target:.1}s",
                highlight.realized_duration_secs
            );
        }

        let costs: Vec<String> = [
            Stage::Detection,
            Stage::Allocation,
            Stage::WriteSource,
            Stage::Trim,
            Stage::Concat,
            Stage::ReadOutput,
        ]
        .iter()
        .filter_map(|&stage| {
            highlight
                .metadata
                .cost_of(stage)
                .map(|ms| format!("{stage}={ms}ms"))
        })
        .collect();
        println!(
            "  耗時: {}ms ({})",
            highlight.metadata.processing_time_ms,
            costs.join(", ")
        );

        info!(
            "精華影片完成 - 片段: {}, 長度: {:.1}s, fallback: {}",
            highlight.clips.len(),
            highlight.realized_duration_secs,
            highlight.metadata.fallback_used
        );
    }

    fn export(
        &self,
        session: &HighlightSession,
        source: &SourceMedia,
        source_path: &Path,
    ) -> Result<()> {
        let output_dir = self
            .config
            .settings
            .output_directory
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map_or_else(
                || source_path.parent().unwrap_or(Path::new(".")).to_path_buf(),
                PathBuf::from,
            );
        ensure_directory_exists(&output_dir)?;

        let destination = highlight_output_path(&output_dir, source.name(), source.extension());
        let written = session.export_final(&destination)?;
        println!(
            "  {} 已輸出: {}",
            style("✓").green(),
            written.display()
        );

        if session
            .final_highlight()
            .is_some_and(|h| h.captions.is_some())
        {
            println!(
                "  {} 字幕: {}",
                style("✓").green(),
                written.with_extension("srt").display()
            );
        }

        Ok(())
    }

    fn offer_library_upload(&self, session: &HighlightSession) -> Result<()> {
        if self.config.settings.library_directory.is_none() {
            return Ok(());
        }

        let confirm = Confirm::new()
            .with_prompt("要加入媒體庫嗎？")
            .default(false)
            .interact()?;
        if !confirm {
            return Ok(());
        }

        let style_tag = format!("style:{}", self.config.settings.highlight.style);
        match session.add_to_library(&["highlight".to_string(), style_tag]) {
            Ok(id) => println!("  {} 已加入媒體庫: {id}", style("✓").green()),
            Err(e) => {
                warn!("加入媒體庫失敗: {e}");
                println!("  {} 加入媒體庫失敗: {}", style("✗").red(), e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detector_without_command_is_local() {
        let detector = HighlightReelGenerator::build_detector(&DetectorSettings::default());
        assert_eq!(detector.name(), "scdet");
    }

    #[test]
    fn test_detector_with_command() {
        let settings = DetectorSettings {
            command: Some(" my-detector ".to_string()),
            fallback_to_scene_detection: false,
            ..DetectorSettings::default()
        };
        let detector = HighlightReelGenerator::build_detector(&settings);
        assert_eq!(detector.name(), "my-detector");

        let blank = DetectorSettings {
            command: Some("   ".to_string()),
            ..DetectorSettings::default()
        };
        assert_eq!(HighlightReelGenerator::build_detector(&blank).name(), "scdet");
    }
}
