//! 本機場景變換偵測（偵測服務無法使用時的備援）
//!
//! 使用 ffmpeg `scdet` 濾鏡找出場景切換點，切點之間的區段即為候選片段，
//! 分數取自切換強度。描述文字不參與判斷。

use crate::component::highlight_reel::detector::{
    DetectionRequest, DetectionResponse, SegmentDetector,
};
use crate::component::highlight_reel::error::DetectionError;
use crate::component::highlight_reel::normalizer::format_mmss;
use crate::component::highlight_reel::types::{CandidateSegment, SourceMedia};
use log::debug;
use regex::Regex;
use serde_json::json;
use std::io::Write;
use std::path::Path;
use std::process::Command;
use std::sync::LazyLock;

static SCDET_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\bt:|lavfi\.scd\.time[=:]\s*)([0-9.]+)").expect("Invalid regex")
});
static SCDET_SCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"lavfi\.scd\.score[=:]\s*([0-9.]+)").expect("Invalid regex"));

/// 第一個場景沒有切點可以評分，給予中間值
const OPENING_SCENE_SCORE: f64 = 0.5;

/// 場景變換點資訊
#[derive(Debug, Clone, PartialEq)]
pub struct SceneChange {
    pub timestamp: f64,
    /// scdet 分數（0-100）
    pub score: f64,
}

/// 場景偵測設定
#[derive(Debug, Clone)]
pub struct SceneDetectorConfig {
    /// 場景變換閾值 (0-100)，越低越敏感
    pub threshold: f64,
    /// 分析用的 FPS，越低越快但可能漏掉短鏡頭
    pub analyze_fps: f64,
    /// 縮放到的寬度（加速分析）
    pub scale_width: u32,
    /// 單一候選片段的最大長度，較長的場景會切成多段
    pub max_window_secs: f64,
    /// 短於此長度的場景不列入候選
    pub min_scene_secs: f64,
}

impl Default for SceneDetectorConfig {
    fn default() -> Self {
        Self {
            threshold: 12.0,
            analyze_fps: 2.0,
            scale_width: 320,
            max_window_secs: 8.0,
            min_scene_secs: 1.0,
        }
    }
}

impl SceneDetectorConfig {
    /// 根據影片長度調整分析 FPS
    #[must_use]
    pub fn for_duration(duration_seconds: f64) -> Self {
        let analyze_fps = if duration_seconds > 7200.0 {
            0.5
        } else if duration_seconds > 3600.0 {
            1.0
        } else {
            2.0
        };

        Self {
            analyze_fps,
            ..Self::default()
        }
    }
}

/// 使用 ffmpeg scdet 濾鏡偵測場景變換
pub fn detect_scene_changes(
    path: &Path,
    duration_seconds: f64,
    config: &SceneDetectorConfig,
) -> Result<Vec<SceneChange>, DetectionError> {
    debug!(
        "場景偵測設定: threshold={}, analyze_fps={}, scale_width={}",
        config.threshold, config.analyze_fps, config.scale_width
    );

    let filter = format!(
        "scale={}:-1,fps={},scdet=s=1:t={}",
        config.scale_width, config.analyze_fps, config.threshold
    );

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-nostdin", "-i"])
        .arg(path)
        .args([
            "-an", "-sn", "-dn", "-threads", "1", "-vf", &filter, "-f", "null", "-",
        ])
        .output()
        .map_err(|e| DetectionError::Unavailable(format!("無法執行 ffmpeg 場景偵測: {e}")))?;

    // scdet 輸出在 stderr
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let last_line = stderr.lines().last().unwrap_or_default().trim().to_string();
        return Err(DetectionError::Unavailable(format!(
            "ffmpeg 場景偵測失敗: {last_line}"
        )));
    }

    Ok(parse_scdet_output(&stderr, duration_seconds))
}

/// 解析 ffmpeg scdet 輸出
///
/// 例如：`[Parsed_scdet_2 @ 0x...] lavfi.scd.score: 41.240, lavfi.scd.time: 12.345`
fn parse_scdet_output(output: &str, duration: f64) -> Vec<SceneChange> {
    let mut scenes: Vec<SceneChange> = output
        .lines()
        .filter_map(|line| {
            let timestamp = SCDET_TIME
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .filter(|&t| t > 0.0 && t < duration)?;

            let score = SCDET_SCORE
                .captures(line)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<f64>().ok())
                .unwrap_or(100.0);

            Some(SceneChange { timestamp, score })
        })
        .collect();

    // 去重並排序
    scenes.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
    scenes.dedup_by(|a, b| (a.timestamp - b.timestamp).abs() < 0.1);

    debug!("偵測到 {} 個場景變換點", scenes.len());
    scenes
}

/// 以切點分割整部影片，每個場景再依最大長度切成候選片段
///
/// 場景的第一段沿用切點分數，後續段落分數減半，讓切換瞬間排在前面。
#[must_use]
pub fn candidates_from_scene_changes(
    changes: &[SceneChange],
    duration_seconds: f64,
    config: &SceneDetectorConfig,
) -> Vec<CandidateSegment> {
    let mut boundaries: Vec<(f64, f64)> = Vec::with_capacity(changes.len() + 1);
    boundaries.push((0.0, OPENING_SCENE_SCORE));
    boundaries.extend(
        changes
            .iter()
            .map(|c| (c.timestamp, (c.score / 100.0).clamp(0.0, 1.0))),
    );

    let window = config.max_window_secs.max(1.0);
    let mut candidates = Vec::new();

    for (index, &(start, score)) in boundaries.iter().enumerate() {
        let end = boundaries
            .get(index + 1)
            .map_or(duration_seconds, |&(next, _)| next);

        if end - start < config.min_scene_secs {
            continue;
        }

        let mut window_start = start;
        let mut first = true;
        while end - window_start >= config.min_scene_secs {
            let window_end = (window_start + window).min(end);
            let window_score = if first { score } else { score / 2.0 };

            candidates.push(
                CandidateSegment::new(window_start, window_end, window_score).with_description(
                    format!("場景 {} @ {}", index + 1, format_mmss(window_start)),
                ),
            );

            window_start = window_end;
            first = false;
        }
    }

    candidates
}

/// 以 ffmpeg scdet 實作的偵測服務
pub struct SceneChangeDetector {
    config: Option<SceneDetectorConfig>,
}

impl SceneChangeDetector {
    #[must_use]
    pub const fn new() -> Self {
        Self { config: None }
    }

    #[must_use]
    pub const fn with_config(config: SceneDetectorConfig) -> Self {
        Self {
            config: Some(config),
        }
    }

    fn detect_at(
        &self,
        path: &Path,
        duration_seconds: f64,
    ) -> Result<DetectionResponse, DetectionError> {
        let config = self
            .config
            .clone()
            .unwrap_or_else(|| SceneDetectorConfig::for_duration(duration_seconds));

        let changes = detect_scene_changes(path, duration_seconds, &config)?;
        let segments = candidates_from_scene_changes(&changes, duration_seconds, &config);

        let mut response = DetectionResponse::new(duration_seconds, segments);
        response.generation_metadata = json!({
            "detector": "scdet",
            "sceneChanges": changes.len(),
            "threshold": config.threshold,
        });
        Ok(response)
    }
}

impl Default for SceneChangeDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SegmentDetector for SceneChangeDetector {
    fn name(&self) -> &str {
        "scdet"
    }

    fn detect(
        &self,
        request: &DetectionRequest,
        source: &SourceMedia,
    ) -> Result<DetectionResponse, DetectionError> {
        debug!("本機場景偵測不使用描述文字: {}", request.prompt_text);
        let duration = source.duration_seconds();

        if let Some(path) = source.origin() {
            return self.detect_at(path, duration);
        }

        // 來源只在記憶體中，先寫到暫存檔
        let mut temp = tempfile::Builder::new()
            .prefix("highlight_scdet_")
            .suffix(&format!(".{}", source.extension()))
            .tempfile()
            .map_err(|e| DetectionError::Unavailable(format!("無法建立暫存檔: {e}")))?;
        temp.write_all(source.bytes())
            .and_then(|()| temp.flush())
            .map_err(|e| DetectionError::Unavailable(format!("無法寫入暫存檔: {e}")))?;

        self.detect_at(temp.path(), duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scdet_output_with_scores() {
        let output = r"
[Parsed_scdet_2 @ 0x7f9b8c] lavfi.scd.score: 41.240, lavfi.scd.time: 12.345
[Parsed_scdet_2 @ 0x7f9b8c] lavfi.scd.score: 18.000, lavfi.scd.time: 25.678
";
        let scenes = parse_scdet_output(output, 100.0);
        assert_eq!(scenes.len(), 2);
        assert!((scenes[0].timestamp - 12.345).abs() < 0.001);
        assert!((scenes[0].score - 41.24).abs() < 0.001);
        assert!((scenes[1].score - 18.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_scdet_output_t_format() {
        let output = "[scdet] t:12.345 pts_time:12.345\n[scdet] t:12.40 pts_time:12.40\n";
        let scenes = parse_scdet_output(output, 100.0);
        // 間隔小於 0.1 秒視為同一個切點
        assert_eq!(scenes.len(), 1);
        assert!((scenes[0].score - 100.0).abs() < 0.001);
    }

    #[test]
    fn test_parse_scdet_output_filters_out_of_range() {
        let output = "lavfi.scd.time=0.0\nlavfi.scd.time=50.0\nlavfi.scd.time=150.0\n";
        let scenes = parse_scdet_output(output, 100.0);
        assert_eq!(scenes.len(), 1);
        assert!((scenes[0].timestamp - 50.0).abs() < 0.001);
    }

    #[test]
    fn test_candidates_between_cuts() {
        let changes = vec![
            SceneChange {
                timestamp: 5.0,
                score: 80.0,
            },
            SceneChange {
                timestamp: 5.5,
                score: 30.0,
            },
            SceneChange {
                timestamp: 20.0,
                score: 40.0,
            },
        ];
        let config = SceneDetectorConfig::default();
        let candidates = candidates_from_scene_changes(&changes, 24.0, &config);

        // [0,5) 開場、[5,5.5) 太短略過、[5.5,20) 切成 8s + 6.5s、[20,24)
        let ranges: Vec<(f64, f64)> = candidates
            .iter()
            .map(|c| (c.start_time, c.end_time))
            .collect();
        assert_eq!(
            ranges,
            vec![(0.0, 5.0), (5.5, 13.5), (13.5, 20.0), (20.0, 24.0)]
        );

        assert!((candidates[0].score - 0.5).abs() < 1e-9);
        assert!((candidates[1].score - 0.3).abs() < 1e-9);
        assert!((candidates[2].score - 0.15).abs() < 1e-9);
        assert!((candidates[3].score - 0.4).abs() < 1e-9);
        assert!(candidates[1].description.starts_with("場景 3"));
    }

    #[test]
    fn test_no_cuts_yields_windows_over_whole_video() {
        let config = SceneDetectorConfig::default();
        let candidates = candidates_from_scene_changes(&[], 20.0, &config);

        assert_eq!(candidates.len(), 3);
        assert!((candidates[2].end_time - 20.0).abs() < 1e-9);
        for pair in candidates.windows(2) {
            assert!(pair[0].end_time <= pair[1].start_time);
        }
    }

    #[test]
    fn test_config_for_duration() {
        assert!((SceneDetectorConfig::for_duration(600.0).analyze_fps - 2.0).abs() < 0.01);
        assert!((SceneDetectorConfig::for_duration(7500.0).analyze_fps - 0.5).abs() < 0.01);
    }
}
