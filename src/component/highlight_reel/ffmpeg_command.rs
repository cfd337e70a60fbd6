//! 精華組合使用的 ffmpeg 指令
//!
//! 兩種操作都是 stream copy，不重新編碼：
//! - 裁切：`-ss` 放在 `-i` 前，起點會對齊到前一個關鍵幀
//! - 串接：concat demuxer 讀取清單檔依序接合

use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq)]
enum Operation {
    Trim { start: f64, duration: f64 },
    Concat,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FfmpegCommand {
    program: String,
    operation: Operation,
    input_path: PathBuf,
    destination_path: PathBuf,
}

impl FfmpegCommand {
    /// 裁切 `[start, start + duration)`
    #[must_use]
    pub fn trim(
        program: &str,
        input_path: &Path,
        start: f64,
        duration: f64,
        destination_path: &Path,
    ) -> Self {
        Self {
            program: program.to_string(),
            operation: Operation::Trim { start, duration },
            input_path: input_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
        }
    }

    /// 依清單檔串接
    #[must_use]
    pub fn concat(program: &str, manifest_path: &Path, destination_path: &Path) -> Self {
        Self {
            program: program.to_string(),
            operation: Operation::Concat,
            input_path: manifest_path.to_path_buf(),
            destination_path: destination_path.to_path_buf(),
        }
    }

    #[must_use]
    pub fn destination_path(&self) -> &Path {
        &self.destination_path
    }

    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["-hide_banner", "-nostdin", "-loglevel", "error"]
            .iter()
            .map(ToString::to_string)
            .collect();

        match self.operation {
            Operation::Trim { start, duration } => {
                args.extend([
                    "-ss".to_string(),
                    format!("{:.3}", start.max(0.0)),
                    "-i".to_string(),
                    format!("file:{}", self.input_path.display()),
                    "-t".to_string(),
                    format!("{:.3}", duration.max(0.0)),
                    "-threads".to_string(),
                    "1".to_string(),
                    "-map".to_string(),
                    "0:v:0".to_string(),
                    "-map".to_string(),
                    "0:a:0?".to_string(),
                    "-c".to_string(),
                    "copy".to_string(),
                    "-avoid_negative_ts".to_string(),
                    "make_zero".to_string(),
                    "-map_metadata".to_string(),
                    "-1".to_string(),
                ]);
            }
            Operation::Concat => {
                args.extend([
                    "-f".to_string(),
                    "concat".to_string(),
                    "-safe".to_string(),
                    "0".to_string(),
                    "-i".to_string(),
                    self.input_path.display().to_string(),
                    "-c".to_string(),
                    "copy".to_string(),
                ]);
            }
        }

        args.extend([
            "-y".to_string(),
            self.destination_path.display().to_string(),
        ]);
        args
    }

    #[must_use]
    pub fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args());
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trim_seeks_before_input() {
        let cmd = FfmpegCommand::trim(
            "ffmpeg",
            Path::new("/work/source.mp4"),
            12.5,
            4.25,
            Path::new("/work/clip_000.mp4"),
        );
        let args = cmd.args();

        let ss = args.iter().position(|a| a == "-ss").unwrap();
        let input = args.iter().position(|a| a == "-i").unwrap();
        assert!(ss < input);
        assert_eq!(args[ss + 1], "12.500");
        assert_eq!(args[input + 1], "file:/work/source.mp4");

        let t = args.iter().position(|a| a == "-t").unwrap();
        assert_eq!(args[t + 1], "4.250");
        assert!(args.windows(2).any(|w| w[0] == "-threads" && w[1] == "1"));
        assert!(args.windows(2).any(|w| w[0] == "-c" && w[1] == "copy"));
        assert!(
            args.windows(2)
                .any(|w| w[0] == "-avoid_negative_ts" && w[1] == "make_zero")
        );
        assert_eq!(args.last().map(String::as_str), Some("/work/clip_000.mp4"));
    }

    #[test]
    fn test_trim_never_emits_negative_times() {
        let args = FfmpegCommand::trim(
            "ffmpeg",
            Path::new("in.mp4"),
            -3.0,
            -1.0,
            Path::new("out.mp4"),
        )
        .args();
        assert!(args.contains(&"0.000".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-3")));
    }

    #[test]
    fn test_concat_uses_demuxer() {
        let cmd = FfmpegCommand::concat(
            "ffmpeg",
            Path::new("/work/concat.txt"),
            Path::new("/work/highlight.mp4"),
        );
        let args = cmd.args();

        assert!(args.windows(2).any(|w| w[0] == "-f" && w[1] == "concat"));
        assert!(args.windows(2).any(|w| w[0] == "-safe" && w[1] == "0"));
        assert!(args.windows(2).any(|w| w[0] == "-i" && w[1] == "/work/concat.txt"));
        assert_eq!(cmd.destination_path(), Path::new("/work/highlight.mp4"));
    }
}
