//! Media metadata via ffprobe.

use std::path::Path;
use std::process::Command;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::core::VideoMetadata;
use crate::video::{decoder, ExtractError};

/// Probe the duration and display dimensions of a media file.
///
/// Everything that makes a file unloadable (unreadable container, no video
/// stream, unknown duration) comes back as [`ExtractError::DecodeLoad`], so
/// the caller only distinguishes "metadata ready" from "load failed".
/// Setting `cancel` kills ffprobe and resolves with
/// [`ExtractError::Cancelled`].
pub fn probe_metadata(
    ffprobe: &Path,
    media_path: &Path,
    cancel: &Arc<AtomicBool>,
) -> Result<VideoMetadata, ExtractError> {
    let mut command = Command::new(ffprobe);
    command
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg("-show_streams")
        .arg(media_path);

    let (stdout, status, stderr) = decoder::run_tool_output(&mut command, cancel)?;

    if !status.success() {
        return Err(ExtractError::DecodeLoad {
            reason: format!("ffprobe exited with {}: {}", status, stderr.trim()),
        });
    }

    let info: serde_json::Value = serde_json::from_slice(&stdout)
        .map_err(|e| ExtractError::DecodeLoad {
            reason: format!("unparseable ffprobe output: {}", e),
        })?;

    parse_metadata(&info)
}

fn parse_metadata(info: &serde_json::Value) -> Result<VideoMetadata, ExtractError> {
    let empty_vec = vec![];
    let streams = info["streams"].as_array().unwrap_or(&empty_vec);

    let video_stream = streams
        .iter()
        .find(|stream| stream["codec_type"].as_str() == Some("video"))
        .ok_or_else(|| ExtractError::DecodeLoad {
            reason: "no video stream".to_string(),
        })?;

    let width = video_stream["width"]
        .as_u64()
        .filter(|w| *w > 0)
        .ok_or_else(|| ExtractError::DecodeLoad {
            reason: "video stream has no width".to_string(),
        })? as u32;

    let height = video_stream["height"]
        .as_u64()
        .filter(|h| *h > 0)
        .ok_or_else(|| ExtractError::DecodeLoad {
            reason: "video stream has no height".to_string(),
        })? as u32;

    // Orientation comes from the display matrix; a quarter turn swaps the
    // presented dimensions relative to the coded ones
    let rotation = stream_rotation(video_stream);
    let (width, height) = if rotation.rem_euclid(180) == 90 {
        (height, width)
    } else {
        (width, height)
    };

    // Stream duration when present, container duration otherwise; ffprobe
    // reports both as strings
    let duration_secs = video_stream["duration"]
        .as_str()
        .or_else(|| info["format"]["duration"].as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| ExtractError::DecodeLoad {
            reason: "unknown duration".to_string(),
        })?;

    Ok(VideoMetadata {
        duration_secs,
        width,
        height,
    })
}

/// Rotation in degrees from the stream's display matrix, falling back to
/// the legacy rotate tag older muxers write.
fn stream_rotation(stream: &serde_json::Value) -> i64 {
    let empty_vec = vec![];
    let side_data = stream["side_data_list"].as_array().unwrap_or(&empty_vec);
    let from_matrix = side_data.iter().find_map(|entry| {
        entry["rotation"]
            .as_i64()
            .or_else(|| entry["rotation"].as_f64().map(|r| r.round() as i64))
    });

    from_matrix
        .or_else(|| stream["tags"]["rotate"].as_str().and_then(|r| r.parse::<i64>().ok()))
        .unwrap_or(0)
}
