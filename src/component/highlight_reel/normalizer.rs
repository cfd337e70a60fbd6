//! 長度與場景數正規化
//!
//! 介面上的長度以 `mm:ss` 表示，管線內部一律使用秒數。
//! 格式錯誤時回傳 `None`，讓呼叫端直接忽略這次輸入。

use crate::component::highlight_reel::error::ValidationError;
use crate::component::highlight_reel::types::{
    HighlightRequest, MAX_MANUAL_SCENES, MAX_TARGET_DURATION_SECS, MIN_MANUAL_SCENES,
    MIN_TARGET_DURATION_SECS, SceneCountMode,
};
use regex::Regex;
use std::sync::LazyLock;

static MMSS_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,3}):(\d{1,2})$").expect("Invalid regex"));

/// 解析 `mm:ss` 為秒數，秒數超過 59 或含非數字時回傳 `None`
#[must_use]
pub fn parse_mmss(input: &str) -> Option<u32> {
    let caps = MMSS_PATTERN.captures(input.trim())?;
    let minutes: u32 = caps.get(1)?.as_str().parse().ok()?;
    let seconds: u32 = caps.get(2)?.as_str().parse().ok()?;

    if seconds > 59 {
        return None;
    }

    Some(minutes * 60 + seconds)
}

/// 將秒數格式化為 `mm:ss`（四捨五入到整秒）
#[must_use]
pub fn format_mmss(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.round() as u64
    } else {
        0
    };
    format!("{:02}:{:02}", total / 60, total % 60)
}

/// 將目標長度限制在允許範圍內
#[must_use]
pub fn clamp_target_duration(seconds: f64) -> f64 {
    if seconds.is_nan() {
        return MIN_TARGET_DURATION_SECS;
    }
    seconds.clamp(MIN_TARGET_DURATION_SECS, MAX_TARGET_DURATION_SECS)
}

/// 介面輸入的長度：解析後再限制範圍
#[must_use]
pub fn normalize_duration_input(input: &str) -> Option<f64> {
    parse_mmss(input).map(|secs| clamp_target_duration(f64::from(secs)))
}

impl SceneCountMode {
    /// 建立手動場景數，超出範圍回傳錯誤
    pub fn manual(count: u32) -> Result<Self, ValidationError> {
        if count < MIN_MANUAL_SCENES || count > MAX_MANUAL_SCENES {
            return Err(ValidationError::SceneCountOutOfRange(count));
        }
        Ok(Self::Manual(count))
    }
}

/// 將手動場景數限制在允許範圍內
#[must_use]
pub fn clamp_manual_scene_count(count: u32) -> u32 {
    count.clamp(MIN_MANUAL_SCENES, MAX_MANUAL_SCENES)
}

/// 在送出偵測請求之前檢查整個請求
pub fn validate_request(request: &HighlightRequest) -> Result<(), ValidationError> {
    if request.prompt_text.trim().is_empty() {
        return Err(ValidationError::EmptyPrompt);
    }

    let target = request.target_duration_secs;
    if !(MIN_TARGET_DURATION_SECS..=MAX_TARGET_DURATION_SECS).contains(&target) {
        return Err(ValidationError::TargetDurationOutOfRange(target));
    }

    if let SceneCountMode::Manual(count) = request.scene_count {
        SceneCountMode::manual(count)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mmss_valid() {
        assert_eq!(parse_mmss("00:30"), Some(30));
        assert_eq!(parse_mmss("1:05"), Some(65));
        assert_eq!(parse_mmss(" 30:00 "), Some(1800));
        assert_eq!(parse_mmss("0:7"), Some(7));
    }

    #[test]
    fn test_parse_mmss_rejects_malformed() {
        assert_eq!(parse_mmss("00:60"), None);
        assert_eq!(parse_mmss("ab:cd"), None);
        assert_eq!(parse_mmss("1:2:3"), None);
        assert_eq!(parse_mmss("90"), None);
        assert_eq!(parse_mmss(""), None);
        assert_eq!(parse_mmss("-1:30"), None);
    }

    #[test]
    fn test_format_mmss() {
        assert_eq!(format_mmss(30.0), "00:30");
        assert_eq!(format_mmss(65.4), "01:05");
        assert_eq!(format_mmss(1800.0), "30:00");
        assert_eq!(format_mmss(-3.0), "00:00");
    }

    #[test]
    fn test_mmss_round_trip_for_ui_values() {
        for secs in [10, 45, 90, 600, 1800] {
            let text = format_mmss(f64::from(secs));
            assert_eq!(parse_mmss(&text), Some(secs), "{text}");
        }
    }

    #[test]
    fn test_clamp_target_duration() {
        assert!((clamp_target_duration(5.0) - 10.0).abs() < f64::EPSILON);
        assert!((clamp_target_duration(3600.0) - 1800.0).abs() < f64::EPSILON);
        assert!((clamp_target_duration(45.0) - 45.0).abs() < f64::EPSILON);
        assert!((clamp_target_duration(f64::NAN) - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_normalize_duration_input() {
        assert_eq!(normalize_duration_input("00:05"), Some(10.0));
        assert_eq!(normalize_duration_input("45:00"), Some(1800.0));
        assert_eq!(normalize_duration_input("01:99"), None);
    }

    #[test]
    fn test_manual_scene_count_bounds() {
        assert_eq!(SceneCountMode::manual(1), Ok(SceneCountMode::Manual(1)));
        assert_eq!(SceneCountMode::manual(20), Ok(SceneCountMode::Manual(20)));
        assert_eq!(
            SceneCountMode::manual(0),
            Err(ValidationError::SceneCountOutOfRange(0))
        );
        assert_eq!(
            SceneCountMode::manual(21),
            Err(ValidationError::SceneCountOutOfRange(21))
        );
        assert_eq!(clamp_manual_scene_count(0), 1);
        assert_eq!(clamp_manual_scene_count(99), 20);
    }

    #[test]
    fn test_validate_request() {
        let ok = HighlightRequest::new("goals", 30.0).with_scene_count(SceneCountMode::Manual(4));
        assert!(validate_request(&ok).is_ok());

        let too_short = HighlightRequest::new("goals", 5.0);
        assert_eq!(
            validate_request(&too_short),
            Err(ValidationError::TargetDurationOutOfRange(5.0))
        );

        let too_many =
            HighlightRequest::new("goals", 30.0).with_scene_count(SceneCountMode::Manual(40));
        assert_eq!(
            validate_request(&too_many),
            Err(ValidationError::SceneCountOutOfRange(40))
        );

        let empty = HighlightRequest::new("   ", 30.0);
        assert_eq!(validate_request(&empty), Err(ValidationError::EmptyPrompt));
    }
}
