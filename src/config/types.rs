use crate::component::highlight_reel::normalizer::clamp_target_duration;
use crate::component::highlight_reel::{HighlightRequest, HighlightStyle, SceneCountMode};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const SETTINGS_FILE: &str = "settings.json";
pub const MAX_RECENT_PATHS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "en-US")]
    EnUs,
    #[serde(rename = "zh-TW")]
    ZhTw,
}

impl Language {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::ZhTw => "zh-TW",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::EnUs => "English",
            Self::ZhTw => "繁體中文",
        };
        write!(f, "{s}")
    }
}

/// 精華剪輯的預設值，每次產生時可以再調整
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightSettings {
    pub target_duration_secs: f64,
    pub scene_count: SceneCountMode,
    pub style: HighlightStyle,
    pub include_captions: bool,
    pub cost_optimize: bool,
}

impl Default for HighlightSettings {
    fn default() -> Self {
        Self {
            target_duration_secs: 30.0,
            scene_count: SceneCountMode::Auto,
            style: HighlightStyle::Balanced,
            include_captions: false,
            cost_optimize: false,
        }
    }
}

impl HighlightSettings {
    /// 以目前的預設值建立請求
    #[must_use]
    pub fn to_request(&self, prompt_text: impl Into<String>) -> HighlightRequest {
        HighlightRequest::new(prompt_text, clamp_target_duration(self.target_duration_secs))
            .with_scene_count(self.scene_count)
            .with_style(self.style)
            .with_captions(self.include_captions)
            .with_cost_optimize(self.cost_optimize)
    }
}

/// 外部偵測程式設定，沒有設定指令時只使用本機場景偵測
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorSettings {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub timeout_secs: u64,
    pub fallback_to_scene_detection: bool,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            timeout_secs: 120,
            fallback_to_scene_detection: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub language: Language,
    pub highlight: HighlightSettings,
    pub detector: DetectorSettings,
    /// 未設定時輸出到來源影片所在資料夾
    pub output_directory: Option<String>,
    /// 未設定時停用「加入媒體庫」
    pub library_directory: Option<String>,
    pub recent_paths: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: UserSettings,
}
