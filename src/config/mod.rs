pub mod load;
pub mod save;
pub mod types;

pub use types::{
    Config, DetectorSettings, HighlightSettings, Language, MAX_RECENT_PATHS, SETTINGS_FILE,
    UserSettings,
};
