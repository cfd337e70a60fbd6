use crate::config::types::{MAX_RECENT_PATHS, SETTINGS_FILE, UserSettings};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn save_settings(settings: &UserSettings) -> Result<()> {
    save_settings_to(settings, Path::new(SETTINGS_FILE))
}

pub fn save_settings_to(settings: &UserSettings, path: &Path) -> Result<()> {
    let content = serde_json::to_string_pretty(settings).context("Failed to serialize settings")?;

    fs::write(path, content)
        .with_context(|| format!("Failed to write settings to {}", path.display()))?;

    Ok(())
}

/// 更新最近使用的來源影片
/// 將新路徑加入最前面，去重並限制數量
pub fn add_recent_path(settings: &mut UserSettings, path: &str) {
    settings.recent_paths.retain(|p| p != path);
    settings.recent_paths.insert(0, path.to_string());
    settings.recent_paths.truncate(MAX_RECENT_PATHS);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::Config;
    use tempfile::TempDir;

    #[test]
    fn test_add_recent_path_dedup_and_limit() {
        let mut settings = UserSettings::default();
        for i in 0..12 {
            add_recent_path(&mut settings, &format!("/videos/{i}.mp4"));
        }
        add_recent_path(&mut settings, "/videos/5.mp4");

        assert_eq!(settings.recent_paths.len(), MAX_RECENT_PATHS);
        assert_eq!(settings.recent_paths[0], "/videos/5.mp4");
        assert_eq!(
            settings
                .recent_paths
                .iter()
                .filter(|p| *p == "/videos/5.mp4")
                .count(),
            1
        );
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("settings.json");

        let mut settings = UserSettings::default();
        settings.highlight.target_duration_secs = 90.0;
        settings.library_directory = Some("/media/library".to_string());
        save_settings_to(&settings, &path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.settings, settings);
    }
}
