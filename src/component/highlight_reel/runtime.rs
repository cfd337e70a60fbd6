//! 媒體處理環境
//!
//! 組合引擎只透過 `MediaRuntime` 操作檔案，每次組合載入一個獨立的環境，
//! 環境被 drop 時工作目錄一併刪除。

use crate::component::highlight_reel::error::MediaOpError;
use crate::component::highlight_reel::ffmpeg_command::FfmpegCommand;
use crate::tools::get_video_info;
use log::debug;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// 工作目錄內的檔案參照
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactRef {
    name: String,
}

impl ArtifactRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// concat demuxer 的清單，依最終播放順序排列
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatManifest {
    entries: Vec<ArtifactRef>,
}

impl ConcatManifest {
    #[must_use]
    pub const fn new(entries: Vec<ArtifactRef>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn entries(&self) -> &[ArtifactRef] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 輸出 `file '<name>'` 格式，單引號依 concat 語法跳脫
    #[must_use]
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|entry| format!("file '{}'\n", entry.name().replace('\'', r"'\''")))
            .collect()
    }
}

pub trait MediaRuntime: Send + Sync {
    /// 將來源寫入工作目錄
    fn write_source(&self, name: &str, bytes: &[u8]) -> Result<ArtifactRef, MediaOpError>;

    /// stream copy 裁切 `[start, start + duration)`
    fn trim(
        &self,
        input: &ArtifactRef,
        start: f64,
        duration: f64,
        output_name: &str,
    ) -> Result<ArtifactRef, MediaOpError>;

    fn concat(
        &self,
        manifest: &ConcatManifest,
        output_name: &str,
    ) -> Result<ArtifactRef, MediaOpError>;

    fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, MediaOpError>;

    /// 實際輸出長度，無法取得時回傳 `None`
    fn probe_duration(&self, _artifact: &ArtifactRef) -> Option<f64> {
        None
    }
}

pub trait RuntimeLoader: Send + Sync {
    fn load(&self) -> Result<Box<dyn MediaRuntime>, MediaOpError>;
}

/// 使用系統 ffmpeg 的環境載入器
#[derive(Debug, Clone)]
pub struct FfmpegLoader {
    program: String,
}

impl FfmpegLoader {
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for FfmpegLoader {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

impl RuntimeLoader for FfmpegLoader {
    fn load(&self) -> Result<Box<dyn MediaRuntime>, MediaOpError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .output()
            .map_err(|e| MediaOpError::Command(format!("找不到 {}: {e}", self.program)))?;

        if !output.status.success() {
            return Err(MediaOpError::Command(format!(
                "{} -version 執行失敗",
                self.program
            )));
        }

        let workspace = tempfile::Builder::new()
            .prefix("highlight_reel_")
            .tempdir()?;
        debug!("建立工作目錄: {}", workspace.path().display());

        Ok(Box::new(FfmpegRuntime {
            program: self.program.clone(),
            workspace,
        }))
    }
}

pub struct FfmpegRuntime {
    program: String,
    workspace: TempDir,
}

impl FfmpegRuntime {
    /// 只接受單純檔名，避免寫到工作目錄以外
    fn resolve(&self, name: &str) -> Result<PathBuf, MediaOpError> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(MediaOpError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("無效的檔名: {name}"),
            )));
        }
        Ok(self.workspace.path().join(name))
    }

    fn execute(&self, command: &FfmpegCommand) -> Result<ArtifactRef, MediaOpError> {
        debug!("ffmpeg {}", command.args().join(" "));

        let output = command.build_command().output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaOpError::Command(stderr.trim().to_string()));
        }

        let destination = command.destination_path();
        let has_content = fs::metadata(destination).is_ok_and(|m| m.len() > 0);
        if !has_content {
            return Err(MediaOpError::MissingOutput(destination.display().to_string()));
        }

        let name = destination
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(ArtifactRef::new(name))
    }
}

impl MediaRuntime for FfmpegRuntime {
    fn write_source(&self, name: &str, bytes: &[u8]) -> Result<ArtifactRef, MediaOpError> {
        let path = self.resolve(name)?;
        fs::write(&path, bytes)?;
        Ok(ArtifactRef::new(name))
    }

    fn trim(
        &self,
        input: &ArtifactRef,
        start: f64,
        duration: f64,
        output_name: &str,
    ) -> Result<ArtifactRef, MediaOpError> {
        let command = FfmpegCommand::trim(
            &self.program,
            &self.resolve(input.name())?,
            start,
            duration,
            &self.resolve(output_name)?,
        );
        self.execute(&command)
    }

    fn concat(
        &self,
        manifest: &ConcatManifest,
        output_name: &str,
    ) -> Result<ArtifactRef, MediaOpError> {
        let manifest_path = self.resolve(&format!("{output_name}.txt"))?;
        fs::write(&manifest_path, manifest.render())?;

        let command = FfmpegCommand::concat(&self.program, &manifest_path, &self.resolve(output_name)?);
        self.execute(&command)
    }

    fn read(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, MediaOpError> {
        Ok(fs::read(self.resolve(artifact.name())?)?)
    }

    fn probe_duration(&self, artifact: &ArtifactRef) -> Option<f64> {
        let path = self.resolve(artifact.name()).ok()?;
        get_video_info(&path).ok().map(|info| info.duration_seconds)
    }
}

impl Drop for FfmpegRuntime {
    fn drop(&mut self) {
        debug!("釋放工作目錄: {}", self.workspace.path().display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manifest_render_escapes_quotes() {
        let manifest = ConcatManifest::new(vec![
            ArtifactRef::new("clip_000.mp4"),
            ArtifactRef::new("it's.mp4"),
        ]);
        assert_eq!(
            manifest.render(),
            "file 'clip_000.mp4'\nfile 'it'\\''s.mp4'\n"
        );
    }

    #[test]
    fn test_loader_with_missing_binary() {
        let loader = FfmpegLoader::new("/nonexistent/ffmpeg-binary");
        assert!(matches!(loader.load(), Err(MediaOpError::Command(_))));
    }
}
