use chrono::Utc;
use std::path::PathBuf;

/// Lifecycle of the selected media, from acceptance to an extracted frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Metadata probe in flight; extraction not available yet.
    Loading,
    /// Metadata known; extraction available.
    Ready,
    /// Last-frame extraction in flight; trigger and file acceptance locked.
    Extracting,
    /// The decoder could not load this file; extraction stays unavailable
    /// until a new file replaces the session.
    LoadFailed,
}

/// Probed properties of the selected media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoMetadata {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// The media currently bound to the decoder. Accepting a new file replaces
/// the whole session, dropping the previous frame and artifact with it.
#[derive(Debug, Clone)]
pub struct MediaSession {
    pub id: String,
    pub path: PathBuf,
    pub media_type: &'static str,
    pub phase: SessionPhase,
    pub metadata: Option<VideoMetadata>,
    pub position_secs: f64, // playback position; extraction moves it to the end
}

impl MediaSession {
    pub fn new(path: PathBuf, media_type: &'static str) -> Self {
        MediaSession {
            id: uuid::Uuid::new_v4().to_string(),
            path,
            media_type,
            phase: SessionPhase::Loading,
            metadata: None,
            position_secs: 0.0,
        }
    }

    pub fn metadata_loaded(&mut self, metadata: VideoMetadata) {
        self.metadata = Some(metadata);
        self.phase = SessionPhase::Ready;
    }

    pub fn load_failed(&mut self) {
        self.metadata = None;
        self.phase = SessionPhase::LoadFailed;
    }

    /// Whether the extract trigger is enabled right now.
    pub fn can_extract(&self) -> bool {
        self.phase == SessionPhase::Ready && self.metadata.is_some()
    }

    /// Move the playback position to the total duration and enter the
    /// extracting phase. Returns the metadata the decode will use, or None
    /// when the session is not ready.
    pub fn begin_extraction(&mut self) -> Option<VideoMetadata> {
        if !self.can_extract() {
            return None;
        }
        let metadata = self.metadata?;
        self.position_secs = metadata.duration_secs;
        self.phase = SessionPhase::Extracting;
        Some(metadata)
    }

    /// Extraction resolved, successfully or not; the session is interactive
    /// again.
    pub fn finish_extraction(&mut self) {
        if self.phase == SessionPhase::Extracting {
            self.phase = SessionPhase::Ready;
        }
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// A decoded frame at the media's native dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>, // tightly packed RGB24, row-major
}

impl RenderedFrame {
    pub fn byte_len(width: u32, height: u32) -> usize {
        width as usize * height as usize * 3
    }
}

/// The encoded PNG together with its suggested download filename.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub png_bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Download filename stamped with the current unix epoch in milliseconds.
    pub fn suggested_file_name() -> String {
        format!("last_frame_{}.png", Utc::now().timestamp_millis())
    }
}

/// Human-readable duration for the session info line.
pub fn format_duration(secs: f64) -> String {
    let total = secs.max(0.0);
    let minutes = (total / 60.0).floor() as u64;
    let seconds = total - minutes as f64 * 60.0;
    if minutes > 0 {
        format!("{minutes}:{seconds:04.1}")
    } else {
        format!("{seconds:.1}s")
    }
}
