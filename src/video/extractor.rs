use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::core::{ExportArtifact, RenderedFrame, VideoMetadata};
use crate::video::{decoder, probe, ExtractError};

/// How long a seek may run before the attempt resolves as timed out.
pub const SEEK_TIMEOUT: Duration = Duration::from_secs(10);

/// Liveness guard for the probe and poster children; a wedged tool must
/// not stall the job queue.
pub const TOOL_TIMEOUT: Duration = Duration::from_secs(10);

/// Locations of the media tool binaries the worker shells out to.
#[derive(Debug, Clone)]
pub struct MediaTools {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

/// A unit of work for the extraction worker
#[derive(Debug, Clone)]
pub struct JobRequest {
    /// Ties the result back to the session that asked for it
    pub generation: u64,
    pub kind: JobKind,
}

#[derive(Debug, Clone)]
pub enum JobKind {
    /// Load metadata for a newly accepted file
    Probe { path: PathBuf },
    /// Decode the scaled preview frame shown with the file info
    Poster { path: PathBuf, metadata: VideoMetadata },
    /// Seek to the end of the media and decode the final frame
    LastFrame { path: PathBuf, metadata: VideoMetadata },
    /// Encode a rendered frame to PNG
    EncodePng { frame: RenderedFrame },
}

/// Outcome of one job, tagged with the generation of its request
#[derive(Debug)]
pub struct JobResult {
    pub generation: u64,
    pub outcome: JobOutcome,
}

#[derive(Debug)]
pub enum JobOutcome {
    Metadata(Result<VideoMetadata, ExtractError>),
    Poster(Result<RenderedFrame, ExtractError>),
    LastFrame(Result<RenderedFrame, ExtractError>),
    Artifact(Result<ExportArtifact, ExtractError>),
}

/// Background worker that runs media jobs off the UI thread.
///
/// One OS thread owns a tokio runtime and processes jobs strictly in order,
/// so at most one decoder child exists at a time and results come back in
/// submission order.
pub struct ExtractionWorker {
    job_sender: mpsc::UnboundedSender<JobRequest>,
    result_receiver: Arc<Mutex<mpsc::UnboundedReceiver<JobResult>>>,
}

impl ExtractionWorker {
    pub fn spawn(tools: MediaTools) -> Self {
        let (job_tx, mut job_rx) = mpsc::unbounded_channel::<JobRequest>();
        let (result_tx, result_rx) = mpsc::unbounded_channel::<JobResult>();

        thread::spawn(move || {
            let rt = tokio::runtime::Runtime::new().expect("Failed to create async runtime");

            rt.block_on(async {
                while let Some(request) = job_rx.recv().await {
                    let generation = request.generation;
                    let outcome = run_job(&tools, request.kind).await;

                    if result_tx.send(JobResult { generation, outcome }).is_err() {
                        break; // UI side is gone
                    }
                }
            });

            log::debug!("extraction worker stopped");
        });

        Self {
            job_sender: job_tx,
            result_receiver: Arc::new(Mutex::new(result_rx)),
        }
    }

    /// Queue a job for the worker (non-blocking)
    pub fn request(&self, request: JobRequest) {
        if let Err(e) = self.job_sender.send(request) {
            log::error!("Failed to send extraction job: {}", e);
        }
    }

    /// Get completed job results (non-blocking)
    pub fn completed_results(&self) -> Vec<JobResult> {
        let mut results = Vec::new();

        if let Ok(mut receiver) = self.result_receiver.lock() {
            while let Ok(result) = receiver.try_recv() {
                results.push(result);
            }
        }

        results
    }
}

async fn run_job(tools: &MediaTools, kind: JobKind) -> JobOutcome {
    match kind {
        JobKind::Probe { path } => {
            log::debug!("Probing metadata for: {:?}", path);
            let ffprobe = tools.ffprobe.clone();
            let outcome = run_with_kill_switch(
                TOOL_TIMEOUT,
                move |cancel| probe::probe_metadata(&ffprobe, &path, cancel),
                || ExtractError::DecodeLoad {
                    reason: format!("ffprobe did not respond within {}s", TOOL_TIMEOUT.as_secs()),
                },
            )
            .await;
            JobOutcome::Metadata(outcome)
        }
        JobKind::Poster { path, metadata } => {
            let ffmpeg = tools.ffmpeg.clone();
            let outcome = run_with_kill_switch(
                TOOL_TIMEOUT,
                move |cancel| decoder::decode_poster_frame(&ffmpeg, &path, &metadata, cancel),
                || ExtractError::DecodeLoad {
                    reason: format!("ffmpeg did not respond within {}s", TOOL_TIMEOUT.as_secs()),
                },
            )
            .await;
            JobOutcome::Poster(outcome)
        }
        JobKind::LastFrame { path, metadata } => {
            log::debug!("Seeking to the end of: {:?}", path);
            let ffmpeg = tools.ffmpeg.clone();
            let outcome = run_with_kill_switch(
                SEEK_TIMEOUT,
                move |cancel| decoder::decode_last_frame(&ffmpeg, &path, &metadata, cancel),
                || ExtractError::SeekTimeout {
                    timeout: SEEK_TIMEOUT,
                },
            )
            .await;
            JobOutcome::LastFrame(outcome)
        }
        JobKind::EncodePng { frame } => {
            let joined = tokio::task::spawn_blocking(move || encode_png(frame)).await;
            JobOutcome::Artifact(flatten(joined))
        }
    }
}

/// Race a cancel-aware blocking task against a deadline; whichever
/// resolves first wins. When the deadline wins, the kill switch makes the
/// task reap its child, and the late outcome dies with the abandoned task.
async fn run_with_kill_switch<T, F>(
    deadline: Duration,
    task: F,
    on_timeout: impl FnOnce() -> ExtractError,
) -> Result<T, ExtractError>
where
    T: Send + 'static,
    F: FnOnce(&Arc<AtomicBool>) -> Result<T, ExtractError> + Send + 'static,
{
    let cancel = Arc::new(AtomicBool::new(false));
    let task_handle = tokio::task::spawn_blocking({
        let cancel = Arc::clone(&cancel);
        move || task(&cancel)
    });

    match tokio::time::timeout(deadline, task_handle).await {
        Ok(joined) => flatten(joined),
        Err(_) => {
            cancel.store(true, Ordering::Relaxed);
            let error = on_timeout();
            log::warn!("{}; abandoning the attempt", error);
            Err(error)
        }
    }
}

fn flatten<T>(
    joined: Result<Result<T, ExtractError>, tokio::task::JoinError>,
) -> Result<T, ExtractError> {
    match joined {
        Ok(result) => result,
        Err(e) => Err(ExtractError::Extraction {
            reason: format!("worker task failed: {}", e),
        }),
    }
}

/// Encode a rendered frame to PNG and stamp its download filename.
fn encode_png(frame: RenderedFrame) -> Result<ExportArtifact, ExtractError> {
    let RenderedFrame {
        width,
        height,
        pixels,
    } = frame;

    let image = image::RgbImage::from_raw(width, height, pixels).ok_or_else(|| {
        ExtractError::Extraction {
            reason: format!("frame buffer does not match {}x{}", width, height),
        }
    })?;

    let mut png_bytes = Vec::new();
    image::DynamicImage::ImageRgb8(image).write_to(
        &mut std::io::Cursor::new(&mut png_bytes),
        image::ImageFormat::Png,
    )?;

    Ok(ExportArtifact {
        file_name: ExportArtifact::suggested_file_name(),
        png_bytes,
    })
}
