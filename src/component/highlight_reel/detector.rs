//! 片段偵測服務的邊界
//!
//! 偵測模型本身不在這個 crate 內，這裡只定義：
//! - 請求／回應的 JSON 格式（camelCase）
//! - 各種錯誤格式一次解碼成 `DetectionError`
//! - 回應中的候選片段依來源長度驗證
//! - 外部程式（stdin/stdout JSON）的實作與逾時處理

use crate::component::highlight_reel::error::DetectionError;
use crate::component::highlight_reel::types::{
    CandidateSegment, HighlightRequest, HighlightStyle, SceneCountMode, SourceMedia,
};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// 送給偵測服務的請求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionRequest {
    pub target_duration: f64,
    pub scene_count_mode: SceneCountMode,
    pub style: HighlightStyle,
    pub prompt_text: String,
    pub source_duration: f64,
    pub cost_optimize: bool,
    pub include_captions: bool,
    /// 來源影片在本機的路徑，外部程式可直接讀取
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl DetectionRequest {
    #[must_use]
    pub fn new(request: &HighlightRequest, source: &SourceMedia) -> Self {
        Self {
            target_duration: request.target_duration_secs,
            scene_count_mode: request.scene_count,
            style: request.style,
            prompt_text: request.prompt_text.trim().to_string(),
            source_duration: source.duration_seconds(),
            cost_optimize: request.cost_optimize,
            include_captions: request.include_captions,
            source_path: source.origin().map(|p| p.to_string_lossy().to_string()),
        }
    }
}

/// 偵測服務的回應
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResponse {
    #[serde(default)]
    pub duration: f64,
    pub segments: Vec<CandidateSegment>,
    #[serde(default)]
    pub generation_metadata: Value,
}

impl DetectionResponse {
    #[must_use]
    pub const fn new(duration: f64, segments: Vec<CandidateSegment>) -> Self {
        Self {
            duration,
            segments,
            generation_metadata: Value::Null,
        }
    }

    /// 依來源長度驗證候選片段
    ///
    /// 起點小於 0 的拉回 0、終點超出來源長度的截到來源長度，
    /// 修正後長度不為正的片段直接捨棄。分數與信心度限制在 `[0, 1]`。
    #[must_use]
    pub fn into_candidates(self, source_duration: f64) -> Vec<CandidateSegment> {
        let total = self.segments.len();

        let candidates: Vec<CandidateSegment> = self
            .segments
            .into_iter()
            .filter_map(|mut segment| {
                if !segment.start_time.is_finite() || !segment.end_time.is_finite() {
                    return None;
                }

                segment.start_time = segment.start_time.max(0.0);
                if source_duration > 0.0 {
                    segment.end_time = segment.end_time.min(source_duration);
                }
                if segment.end_time <= segment.start_time {
                    return None;
                }

                segment.score = clamp_unit(segment.score);
                segment.confidence = clamp_unit(segment.confidence);
                Some(segment)
            })
            .collect();

        let dropped = total - candidates.len();
        if dropped > 0 {
            warn!("捨棄 {dropped} 個無效的候選片段（共 {total} 個）");
        }

        candidates
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

/// 偵測服務
pub trait SegmentDetector: Send + Sync {
    /// 用於日誌顯示
    fn name(&self) -> &str;

    fn detect(
        &self,
        request: &DetectionRequest,
        source: &SourceMedia,
    ) -> Result<DetectionResponse, DetectionError>;
}

/// 解碼偵測服務的回應內容
///
/// 支援的錯誤格式：
/// - `{"error": "msg"}`
/// - `{"error": ["a", "b"]}`
/// - `{"errors": [{"message": "a"}, ...]}`
pub fn decode_response(body: &str) -> Result<DetectionResponse, DetectionError> {
    let value: Value = serde_json::from_str(body.trim())
        .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;

    if let Some(messages) = error_messages(&value) {
        return Err(DetectionError::Rejected { messages });
    }

    serde_json::from_value(value).map_err(|e| DetectionError::InvalidResponse(e.to_string()))
}

fn error_messages(value: &Value) -> Option<Vec<String>> {
    let object = value.as_object()?;
    let raw = object.get("error").or_else(|| object.get("errors"))?;

    let messages: Vec<String> = match raw {
        Value::Null => return None,
        Value::Array(items) => items.iter().filter_map(message_of).collect(),
        Value::String(_) | Value::Object(_) => message_of(raw).into_iter().collect(),
        other => vec![other.to_string()],
    };

    if messages.is_empty() {
        Some(vec!["未提供錯誤訊息".to_string()])
    } else {
        Some(messages)
    }
}

fn message_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

/// 透過外部程式偵測：請求 JSON 寫入 stdin，回應 JSON 從 stdout 讀取
pub struct CommandDetector {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

struct CommandOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl CommandDetector {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args,
            timeout,
        }
    }

    fn run(&self, payload: &[u8]) -> Result<CommandOutput, DetectionError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| DetectionError::Unavailable(format!("無法啟動 {}: {e}", self.program)))?;

        let (Some(mut stdin), Some(mut stdout), Some(mut stderr)) =
            (child.stdin.take(), child.stdout.take(), child.stderr.take())
        else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(DetectionError::Unavailable("無法連接偵測程式的標準輸入輸出".to_string()));
        };

        let stdout_reader = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stdout.read_to_string(&mut buf);
            buf
        });
        let stderr_reader = thread::spawn(move || {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf);
            buf
        });

        // 請求大於管線緩衝區時，程式不讀取 stdin 會讓寫入卡住，逾時必須照常生效
        let payload = payload.to_vec();
        let stdin_writer = thread::spawn(move || {
            // 程式可能不讀取 stdin 就結束，寫入失敗不視為錯誤
            if let Err(e) = stdin.write_all(&payload) {
                debug!("寫入偵測請求失敗: {e}");
            }
        });

        let started = Instant::now();
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if started.elapsed() >= self.timeout => {
                    warn!("偵測程式逾時，終止 {}", self.program);
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(DetectionError::Timeout {
                        seconds: self.timeout.as_secs(),
                    });
                }
                Ok(None) => thread::sleep(POLL_INTERVAL),
                Err(e) => return Err(DetectionError::Unavailable(e.to_string())),
            }
        };

        let _ = stdin_writer.join();
        Ok(CommandOutput {
            status,
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
        })
    }
}

impl SegmentDetector for CommandDetector {
    fn name(&self) -> &str {
        &self.program
    }

    fn detect(
        &self,
        request: &DetectionRequest,
        _source: &SourceMedia,
    ) -> Result<DetectionResponse, DetectionError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| DetectionError::InvalidResponse(e.to_string()))?;

        debug!("執行偵測程式: {} {:?}", self.program, self.args);
        let output = self.run(&payload)?;

        if !output.status.success() {
            // 失敗時若 stdout 仍是錯誤格式，視為服務拒絕
            if let Err(rejected @ DetectionError::Rejected { .. }) = decode_response(&output.stdout)
            {
                return Err(rejected);
            }
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() {
                format!("{} 結束代碼 {}", self.program, output.status)
            } else {
                stderr.to_string()
            };
            return Err(DetectionError::Unavailable(detail));
        }

        let response = decode_response(&output.stdout)?;
        info!("偵測程式回傳 {} 個候選片段", response.segments.len());
        Ok(response)
    }
}

/// 主要偵測服務暫時無法使用時改用備援
pub struct FallbackDetector {
    primary: Box<dyn SegmentDetector>,
    fallback: Box<dyn SegmentDetector>,
}

impl FallbackDetector {
    #[must_use]
    pub fn new(primary: Box<dyn SegmentDetector>, fallback: Box<dyn SegmentDetector>) -> Self {
        Self { primary, fallback }
    }
}

impl SegmentDetector for FallbackDetector {
    fn name(&self) -> &str {
        self.primary.name()
    }

    fn detect(
        &self,
        request: &DetectionRequest,
        source: &SourceMedia,
    ) -> Result<DetectionResponse, DetectionError> {
        match self.primary.detect(request, source) {
            Err(e) if e.is_retryable() => {
                warn!(
                    "{} 無法使用（{e}），改用 {}",
                    self.primary.name(),
                    self.fallback.name()
                );
                self.fallback.detect(request, source)
            }
            other => other,
        }
    }
}
