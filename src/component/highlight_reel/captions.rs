//! SRT 字幕：每個片段一則，時間軸為輸出影片的時間

use crate::component::highlight_reel::types::SegmentClip;
use std::fmt::Write;

/// `HH:MM:SS,mmm`
#[must_use]
pub fn format_srt_timestamp(seconds: f64) -> String {
    let total_ms = if seconds.is_finite() && seconds > 0.0 {
        (seconds * 1000.0).round() as u64
    } else {
        0
    };

    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// 依片段順序累加時間產生字幕，沒有描述的片段以時間範圍代替
///
/// `output_secs` 是每個片段在輸出中的實際長度，缺少時使用預計長度。
#[must_use]
pub fn build_srt(clips: &[SegmentClip], output_secs: &[f64]) -> String {
    let mut srt = String::new();
    let mut cursor = 0.0;

    for (index, clip) in clips.iter().enumerate() {
        let length = output_secs
            .get(index)
            .copied()
            .unwrap_or_else(|| clip.duration());
        let start = cursor;
        let end = cursor + length.max(0.0);
        cursor = end;

        let text = if clip.segment.description.trim().is_empty() {
            format!(
                "{} - {}",
                format_srt_timestamp(clip.start_time),
                format_srt_timestamp(clip.end_time)
            )
        } else {
            clip.segment.description.trim().to_string()
        };

        let _ = writeln!(
            srt,
            "{}\n{} --> {}\n{}\n",
            index + 1,
            format_srt_timestamp(start),
            format_srt_timestamp(end),
            text
        );
    }

    srt
}
