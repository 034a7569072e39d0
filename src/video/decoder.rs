//! Raw frame decoding over an ffmpeg pipe.
//!
//! The last-frame decode enters the stream a short window before the end and
//! keeps the final complete frame that arrives on stdout. Decoding runs in a
//! child process, so abandoning an attempt means killing the child; the
//! cancel flag is polled while the pipe drains.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::core::{RenderedFrame, VideoMetadata};
use crate::video::ExtractError;

/// How far back from the end of the media the last-frame decode starts.
/// Wide enough to cover sparse keyframes near the tail, short enough to stay
/// cheap on long files.
const TAIL_WINDOW_SECS: f64 = 3.0;

/// Widest the poster preview gets; height follows the aspect ratio.
pub const POSTER_MAX_WIDTH: u32 = 480;

/// How often the decode loop checks the child and the cancel flag.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

struct TailDecode {
    last_frame: Option<Vec<u8>>,
    frames_read: u64,
}

/// Decode the final presentable frame at the media's native dimensions.
///
/// ffmpeg starts a short window back from the end of the stream and emits
/// every remaining frame as raw RGB24; the last complete frame is what the
/// media presents at its total duration. Setting `cancel` kills the child
/// and resolves the call with [`ExtractError::Cancelled`].
pub fn decode_last_frame(
    ffmpeg: &Path,
    media_path: &Path,
    metadata: &VideoMetadata,
    cancel: &Arc<AtomicBool>,
) -> Result<RenderedFrame, ExtractError> {
    // Autorotation is left on, so rotated streams arrive already at the
    // display geometry the probe reported
    let frame_len = RenderedFrame::byte_len(metadata.width, metadata.height);

    let mut command = Command::new(ffmpeg);
    command
        .arg("-v").arg("error")     // Only real errors on stderr
        .arg("-nostdin");
    if metadata.duration_secs > TAIL_WINDOW_SECS {
        // Enter the stream near the end instead of decoding the whole file
        command.arg("-sseof").arg(format!("-{:.3}", TAIL_WINDOW_SECS));
    }
    command
        .arg("-i").arg(media_path)
        .arg("-map").arg("0:v:0")   // First video stream only
        .arg("-f").arg("rawvideo")
        .arg("-pix_fmt").arg("rgb24")
        .arg("-");                  // Output to stdout

    let (decoded, status, stderr) = run_frame_pipe(&mut command, frame_len, cancel)?;

    match decoded.last_frame {
        Some(pixels) => {
            if !status.success() {
                log::warn!(
                    "ffmpeg exited with {} after {} frames, keeping the last one",
                    status,
                    decoded.frames_read
                );
            }
            log::debug!(
                "kept frame {} of the tail window ({}x{})",
                decoded.frames_read,
                metadata.width,
                metadata.height
            );
            Ok(RenderedFrame {
                width: metadata.width,
                height: metadata.height,
                pixels,
            })
        }
        None if !status.success() => Err(ExtractError::Seek {
            reason: decode_failure_reason(status, &stderr),
        }),
        None => Err(ExtractError::Seek {
            reason: "decoder produced no frame near the end of the stream".to_string(),
        }),
    }
}

/// Decode one scaled frame from the start of the media for the preview.
pub fn decode_poster_frame(
    ffmpeg: &Path,
    media_path: &Path,
    metadata: &VideoMetadata,
    cancel: &Arc<AtomicBool>,
) -> Result<RenderedFrame, ExtractError> {
    let (width, height) = poster_dimensions(metadata.width, metadata.height);
    let frame_len = RenderedFrame::byte_len(width, height);

    let mut command = Command::new(ffmpeg);
    command
        .arg("-v").arg("error")
        .arg("-nostdin")
        .arg("-i").arg(media_path)
        .arg("-map").arg("0:v:0")
        .arg("-vframes").arg("1")   // First frame only
        .arg("-vf").arg(format!("scale={}:{}", width, height))
        .arg("-f").arg("rawvideo")
        .arg("-pix_fmt").arg("rgb24")
        .arg("-");

    let (stdout, status, stderr) = run_tool_output(&mut command, cancel)?;

    if !status.success() {
        return Err(ExtractError::DecodeLoad {
            reason: decode_failure_reason(status, &stderr),
        });
    }

    if stdout.len() != frame_len {
        return Err(ExtractError::DecodeLoad {
            reason: format!(
                "unexpected poster frame size: {} (expected {})",
                stdout.len(),
                frame_len
            ),
        });
    }

    Ok(RenderedFrame {
        width,
        height,
        pixels: stdout,
    })
}

/// Preview dimensions: native size up to [`POSTER_MAX_WIDTH`], scaled down
/// preserving aspect ratio beyond it.
pub fn poster_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= POSTER_MAX_WIDTH {
        return (width, height);
    }
    let scaled_height = (height as u64 * POSTER_MAX_WIDTH as u64 / width as u64).max(1) as u32;
    (POSTER_MAX_WIDTH, scaled_height)
}

/// Spawn the decoder and drain whole frames off its stdout until it exits,
/// keeping only the most recent one. The spawning thread watches the child
/// and the cancel flag while a reader thread owns the pipe, so a stuck
/// decoder never wedges the caller.
fn run_frame_pipe(
    command: &mut Command,
    frame_len: usize,
    cancel: &Arc<AtomicBool>,
) -> Result<(TailDecode, ExitStatus, String), ExtractError> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()?;

    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ExtractError::Seek {
            reason: "decoder stdout unavailable".to_string(),
        });
    };

    let reader = thread::spawn(move || {
        let mut decoded = TailDecode {
            last_frame: None,
            frames_read: 0,
        };
        let mut buffer = vec![0u8; frame_len];
        loop {
            match read_full_frame(&mut stdout, &mut buffer) {
                Ok(true) => {
                    decoded.frames_read += 1;
                    match decoded.last_frame.as_mut() {
                        Some(previous) => previous.copy_from_slice(&buffer),
                        None => decoded.last_frame = Some(buffer.clone()),
                    }
                }
                // Clean EOF on a frame boundary
                Ok(false) => break,
                // Short read or broken pipe; keep what already arrived
                Err(_) => break,
            }
        }
        decoded
    });

    let status = wait_with_cancel(&mut child, cancel)?;

    // The pipe closed with the child, so the reader is done or about to be
    let decoded = reader.join().unwrap_or(TailDecode {
        last_frame: None,
        frames_read: 0,
    });

    let stderr_text = drain_stderr(&mut child);

    Ok((decoded, status, stderr_text))
}

/// Run a tool to completion under the same supervision as the frame pipe,
/// collecting everything it writes to stdout.
pub(crate) fn run_tool_output(
    command: &mut Command,
    cancel: &Arc<AtomicBool>,
) -> Result<(Vec<u8>, ExitStatus, String), ExtractError> {
    let mut child = command
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null())
        .spawn()?;

    let Some(mut stdout) = child.stdout.take() else {
        let _ = child.kill();
        let _ = child.wait();
        return Err(ExtractError::Extraction {
            reason: "tool stdout unavailable".to_string(),
        });
    };

    let reader = thread::spawn(move || {
        let mut bytes = Vec::new();
        let _ = stdout.read_to_end(&mut bytes);
        bytes
    });

    let status = wait_with_cancel(&mut child, cancel)?;
    let stdout_bytes = reader.join().unwrap_or_default();
    let stderr_text = drain_stderr(&mut child);

    Ok((stdout_bytes, status, stderr_text))
}

/// Poll the child until it exits, killing it when the cancel flag flips.
fn wait_with_cancel(child: &mut Child, cancel: &Arc<AtomicBool>) -> Result<ExitStatus, ExtractError> {
    loop {
        if cancel.load(Ordering::Relaxed) {
            log::debug!("decode cancelled, killing the child process");
            let _ = child.kill();
            let _ = child.wait();
            return Err(ExtractError::Cancelled);
        }
        match child.try_wait()? {
            Some(status) => return Ok(status),
            None => thread::sleep(POLL_INTERVAL),
        }
    }
}

fn drain_stderr(child: &mut Child) -> String {
    let mut text = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut text);
    }
    text
}

/// Fill `buffer` with exactly one frame. Ok(false) means EOF fell on a frame
/// boundary; EOF inside a frame is an error.
fn read_full_frame(reader: &mut impl Read, buffer: &mut [u8]) -> std::io::Result<bool> {
    let mut filled = 0;
    while filled < buffer.len() {
        let n = reader.read(&mut buffer[filled..])?;
        if n == 0 {
            return if filled == 0 {
                Ok(false)
            } else {
                Err(std::io::ErrorKind::UnexpectedEof.into())
            };
        }
        filled += n;
    }
    Ok(true)
}

fn decode_failure_reason(status: ExitStatus, stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        format!("ffmpeg exited with {}", status)
    } else {
        // Last stderr line carries the actual failure
        trimmed.lines().last().unwrap_or(trimmed).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_poster_dimensions_keep_small_frames() {
        assert_eq!(poster_dimensions(320, 240), (320, 240));
        assert_eq!(poster_dimensions(480, 270), (480, 270));
    }

    #[test]
    fn test_poster_dimensions_scale_down_wide_frames() {
        assert_eq!(poster_dimensions(1920, 1080), (480, 270));
        assert_eq!(poster_dimensions(3840, 2160), (480, 270));
        // Portrait video scales by width as well
        assert_eq!(poster_dimensions(1080, 1920), (480, 853));
    }

    #[test]
    fn test_poster_dimensions_never_collapse_to_zero() {
        let (_, height) = poster_dimensions(10_000, 2);
        assert!(height >= 1);
    }

    #[test]
    fn test_read_full_frame_reads_exact_chunks() {
        let data: Vec<u8> = (0u8..12).collect();
        let mut cursor = Cursor::new(data);
        let mut buffer = [0u8; 6];

        assert!(read_full_frame(&mut cursor, &mut buffer).unwrap());
        assert_eq!(buffer, [0, 1, 2, 3, 4, 5]);
        assert!(read_full_frame(&mut cursor, &mut buffer).unwrap());
        assert_eq!(buffer, [6, 7, 8, 9, 10, 11]);
        // Clean EOF on the boundary
        assert!(!read_full_frame(&mut cursor, &mut buffer).unwrap());
    }

    #[test]
    fn test_read_full_frame_rejects_truncated_tail() {
        let data: Vec<u8> = (0u8..8).collect();
        let mut cursor = Cursor::new(data);
        let mut buffer = [0u8; 6];

        assert!(read_full_frame(&mut cursor, &mut buffer).unwrap());
        let err = read_full_frame(&mut cursor, &mut buffer).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_decode_failure_reason_prefers_stderr() {
        let status = exit_status(1);
        let reason = decode_failure_reason(status, "header line\nActual error: moov atom not found\n");
        assert_eq!(reason, "Actual error: moov atom not found");

        let fallback = decode_failure_reason(status, "   ");
        assert!(fallback.contains("ffmpeg exited with"));
    }

    #[cfg(unix)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(code << 8)
    }

    #[cfg(windows)]
    fn exit_status(code: i32) -> ExitStatus {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(code as u32)
    }
}
