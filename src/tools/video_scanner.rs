use crate::tools::get_video_info;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 可以 stream copy 裁切的常見容器
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mov", "mkv", "webm", "ts", "avi"];

#[derive(Debug, Clone)]
pub struct VideoFileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub duration_seconds: Option<f64>,
}

#[must_use]
pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| VIDEO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// 掃描資料夾內的影片，依修改時間由新到舊排序
///
/// 長度無法取得的檔案仍會列出，由呼叫端決定是否略過。
pub fn scan_video_files(directory: &Path, max_depth: usize) -> Result<Vec<VideoFileInfo>> {
    let mut entries: Vec<(VideoFileInfo, std::time::SystemTime)> = WalkDir::new(directory)
        .follow_links(false)
        .max_depth(max_depth)
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| is_video_file(entry.path()))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            let modified = metadata.modified().unwrap_or(std::time::UNIX_EPOCH);
            let duration_seconds = get_video_info(entry.path())
                .ok()
                .map(|info| info.duration_seconds);

            Some((
                VideoFileInfo {
                    path: entry.into_path(),
                    size: metadata.len(),
                    duration_seconds,
                },
                modified,
            ))
        })
        .collect();

    entries.sort_by(|a, b| b.1.cmp(&a.1));
    Ok(entries.into_iter().map(|(info, _)| info).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("/a/match.MP4")));
        assert!(is_video_file(Path::new("clip.mkv")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("no_extension")));
    }

    #[test]
    fn test_scan_filters_non_video_and_respects_depth() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.mp4"), b"not really a video").unwrap();
        fs::write(temp.path().join("b.txt"), b"text").unwrap();
        let nested = temp.path().join("deep");
        fs::create_dir(&nested).unwrap();
        fs::write(nested.join("c.mov"), b"x").unwrap();

        let shallow = scan_video_files(temp.path(), 1).unwrap();
        assert_eq!(shallow.len(), 1);
        assert!(shallow[0].path.ends_with("a.mp4"));
        // 內容不是影片，ffprobe 取不到長度
        assert!(shallow[0].duration_seconds.is_none());

        let deep = scan_video_files(temp.path(), 2).unwrap();
        assert_eq!(deep.len(), 2);
    }
}
