mod ffprobe_info;
mod path_validator;
mod video_scanner;

pub use ffprobe_info::{VideoInfo, get_video_info};
pub use path_validator::{ensure_directory_exists, highlight_output_path, validate_source_file};
pub use video_scanner::{VIDEO_EXTENSIONS, VideoFileInfo, is_video_file, scan_video_files};
