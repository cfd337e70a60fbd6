use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};

/// 來源影片必須是存在的檔案
pub fn validate_source_file(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("路徑不存在: {}", path.display());
    }
    if !path.is_file() {
        bail!("路徑不是檔案: {}", path.display());
    }
    Ok(())
}

pub fn ensure_directory_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("無法建立資料夾: {}", path.display()))?;
    } else if !path.is_dir() {
        bail!("路徑不是資料夾: {}", path.display());
    }
    Ok(())
}

/// 輸出檔名：`{來源檔名}_highlight.{副檔名}`，已存在時加上序號
#[must_use]
pub fn highlight_output_path(output_dir: &Path, source_name: &str, extension: &str) -> PathBuf {
    let first = output_dir.join(format!("{source_name}_highlight.{extension}"));
    if !first.exists() {
        return first;
    }

    (2..)
        .map(|n| output_dir.join(format!("{source_name}_highlight_{n}.{extension}")))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_source_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.mp4");
        fs::write(&file, b"x").unwrap();

        assert!(validate_source_file(&file).is_ok());
        assert!(validate_source_file(temp.path()).is_err());
        assert!(validate_source_file(&temp.path().join("missing.mp4")).is_err());
    }

    #[test]
    fn test_ensure_directory_exists_creates_nested() {
        let temp = TempDir::new().unwrap();
        let nested = temp.path().join("out").join("reels");

        ensure_directory_exists(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn test_highlight_output_path_avoids_overwrite() {
        let temp = TempDir::new().unwrap();
        let first = highlight_output_path(temp.path(), "match", "mp4");
        assert_eq!(first, temp.path().join("match_highlight.mp4"));

        fs::write(&first, b"x").unwrap();
        let second = highlight_output_path(temp.path(), "match", "mp4");
        assert_eq!(second, temp.path().join("match_highlight_2.mp4"));
    }
}
