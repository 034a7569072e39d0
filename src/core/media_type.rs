//! Declared media-type classification for accepted files.
//!
//! Native file drops carry no MIME header, so the declared type of a file
//! comes from its extension, the same signal the picker filter uses.

use std::path::Path;

/// Extensions offered by the video picker filter. Must stay in sync with the
/// video arm of [`declared_media_type`].
pub const VIDEO_EXTENSIONS: &[&str] = &[
    "mp4", "m4v", "webm", "mkv", "mov", "avi", "ogv", "ts", "mpg", "mpeg", "wmv", "flv", "3gp",
];

/// Map a path's extension to a declared MIME type.
pub fn declared_media_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        // Video
        "mp4" | "m4v"  => "video/mp4",
        "webm"         => "video/webm",
        "mkv"          => "video/x-matroska",
        "mov"          => "video/quicktime",
        "avi"          => "video/x-msvideo",
        "ogv"          => "video/ogg",
        "ts"           => "video/mp2t",
        "mpg" | "mpeg" => "video/mpeg",
        "wmv"          => "video/x-ms-wmv",
        "flv"          => "video/x-flv",
        "3gp"          => "video/3gpp",

        // Non-video kinds people drop by accident, kept distinct so the log
        // says what the file actually was
        "jpg" | "jpeg" => "image/jpeg",
        "png"          => "image/png",
        "gif"          => "image/gif",
        "webp"         => "image/webp",
        "mp3"          => "audio/mpeg",
        "ogg"          => "audio/ogg",
        "wav"          => "audio/wav",
        "flac"         => "audio/flac",
        "m4a"          => "audio/mp4",
        "txt"          => "text/plain",
        "pdf"          => "application/pdf",
        "json"         => "application/json",

        _              => "application/octet-stream",
    }
}

/// Whether a declared MIME type is for video.
pub fn is_video(mime: &str) -> bool {
    mime.starts_with("video/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_detects_mp4() {
        assert_eq!(declared_media_type(&PathBuf::from("clip.mp4")), "video/mp4");
    }

    #[test]
    fn test_detects_matroska() {
        assert_eq!(declared_media_type(&PathBuf::from("rec.mkv")), "video/x-matroska");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        assert_eq!(declared_media_type(&PathBuf::from("CLIP.MOV")), "video/quicktime");
    }

    #[test]
    fn test_unknown_extension_fallback() {
        assert_eq!(declared_media_type(&PathBuf::from("file.xyz")), "application/octet-stream");
    }

    #[test]
    fn test_missing_extension_fallback() {
        assert_eq!(declared_media_type(&PathBuf::from("video")), "application/octet-stream");
    }

    #[test]
    fn test_video_types_pass_the_gate() {
        for ext in VIDEO_EXTENSIONS {
            let path = PathBuf::from(format!("sample.{ext}"));
            assert!(
                is_video(declared_media_type(&path)),
                "{ext} should classify as video"
            );
        }
    }

    #[test]
    fn test_non_video_types_fail_the_gate() {
        for name in ["photo.png", "notes.txt", "speech.mp3", "file.xyz", "video"] {
            assert!(
                !is_video(declared_media_type(&PathBuf::from(name))),
                "{name} should not classify as video"
            );
        }
    }
}
