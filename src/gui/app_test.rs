#[cfg(test)]
mod tests {

    use std::path::PathBuf;
    use std::time::Duration;

    use eframe::egui;

    use crate::core::{AppConfig, ExportArtifact, RenderedFrame, SessionPhase, VideoMetadata};
    use crate::gui::app::{
        LastFrameApp, MSG_EXTRACTION_FAILED, MSG_INVALID_FILE_TYPE, MSG_LOAD_FAILED,
    };
    use crate::video::{
        ExtractError, ExtractionWorker, JobOutcome, JobResult, MediaTools,
    };

    // Test helper to create a minimal app instance for testing. The worker
    // points at tools that cannot exist, so no real decode ever runs.
    fn create_test_app() -> LastFrameApp {
        let worker = ExtractionWorker::spawn(MediaTools {
            ffmpeg: PathBuf::from("/nonexistent/ffmpeg"),
            ffprobe: PathBuf::from("/nonexistent/ffprobe"),
        });

        LastFrameApp {
            config: AppConfig::default(),
            worker,
            session: None,
            generation: 0,
            jobs_in_flight: 0,
            preview_texture: None,
            frame_texture: None,
            artifact: None,
            error_message: None,
            status_message: String::new(),
            show_result: false,
            scroll_to_result: false,
        }
    }

    fn test_metadata() -> VideoMetadata {
        VideoMetadata {
            duration_secs: 8.0,
            width: 4,
            height: 2,
        }
    }

    fn test_frame() -> RenderedFrame {
        RenderedFrame {
            width: 4,
            height: 2,
            pixels: vec![128; 24],
        }
    }

    fn test_artifact(stamp: u64) -> ExportArtifact {
        ExportArtifact {
            file_name: format!("last_frame_{}.png", stamp),
            png_bytes: vec![stamp as u8],
        }
    }

    fn metadata_result(app: &LastFrameApp) -> JobResult {
        JobResult {
            generation: app.generation,
            outcome: JobOutcome::Metadata(Ok(test_metadata())),
        }
    }

    // App with a video accepted and its metadata already applied
    fn ready_app(ctx: &egui::Context) -> LastFrameApp {
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("clip.mp4"));
        let result = metadata_result(&app);
        app.apply_result(ctx, result);
        app
    }

    #[test]
    fn test_accepting_a_video_starts_a_loading_session() {
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("clip.mp4"));

        let session = app.session.as_ref().expect("session should exist");
        assert_eq!(session.path, PathBuf::from("clip.mp4"));
        assert_eq!(session.media_type, "video/mp4");
        assert_eq!(session.phase, SessionPhase::Loading);
        assert_eq!(app.generation, 1);
        assert!(!app.can_extract());
        assert!(app.error_message.is_none());
    }

    #[test]
    fn test_non_video_files_are_rejected_without_touching_the_session() {
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("clip.mp4"));

        app.accept_file(PathBuf::from("notes.txt"));

        // The previous session keeps its media
        let session = app.session.as_ref().expect("session should survive");
        assert_eq!(session.path, PathBuf::from("clip.mp4"));
        assert_eq!(app.generation, 1);
        assert_eq!(app.error_message.as_deref(), Some(MSG_INVALID_FILE_TYPE));
    }

    #[test]
    fn test_extraction_stays_disabled_until_metadata_loads() {
        let ctx = egui::Context::default();
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("clip.mp4"));
        assert!(!app.can_extract());

        // Triggering early must not start anything
        app.trigger_extraction();
        assert_eq!(
            app.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Loading)
        );

        let result = metadata_result(&app);
        app.apply_result(&ctx, result);
        assert!(app.can_extract());
        assert_eq!(
            app.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Ready)
        );
    }

    #[test]
    fn test_load_failure_disables_extraction_until_a_new_file() {
        let ctx = egui::Context::default();
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("broken.mp4"));

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Metadata(Err(ExtractError::DecodeLoad {
                    reason: "no video stream".to_string(),
                })),
            },
        );

        assert_eq!(app.error_message.as_deref(), Some(MSG_LOAD_FAILED));
        assert_eq!(
            app.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::LoadFailed)
        );
        assert!(!app.can_extract());

        app.trigger_extraction();
        assert!(!app.is_extracting());

        // A new file clears the failure
        app.accept_file(PathBuf::from("fine.mp4"));
        assert!(app.error_message.is_none());
        assert_eq!(
            app.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Loading)
        );
    }

    #[test]
    fn test_successful_extraction_reveals_the_result_at_native_size() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);

        app.trigger_extraction();
        assert!(app.is_extracting());
        assert!(!app.show_result);
        assert!(app.artifact.is_none());
        assert_eq!(
            app.session.as_ref().map(|s| s.position_secs),
            Some(8.0)
        );

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );

        // Busy indicator gone, result revealed, frame kept at native size
        assert!(!app.is_extracting());
        assert!(app.show_result);
        assert!(app.scroll_to_result);
        assert!(app.error_message.is_none());
        let texture = app.frame_texture.as_ref().expect("texture should exist");
        assert_eq!(texture.size(), [4, 2]);

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Ok(test_artifact(1))),
            },
        );
        assert!(app.artifact.is_some());
        assert!(app.error_message.is_none());
    }

    #[test]
    fn test_failed_extraction_shows_one_generic_message() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);
        app.trigger_extraction();

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Err(ExtractError::SeekTimeout {
                    timeout: Duration::from_secs(10),
                })),
            },
        );

        assert_eq!(app.error_message.as_deref(), Some(MSG_EXTRACTION_FAILED));
        assert!(!app.show_result);
        assert!(app.artifact.is_none());
        // The session is interactive again after the timeout
        assert!(!app.is_extracting());
        assert!(app.can_extract());
    }

    #[test]
    fn test_encoding_failure_counts_as_extraction_failure() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);
        app.trigger_extraction();
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Err(ExtractError::Extraction {
                    reason: "frame buffer does not match 4x2".to_string(),
                })),
            },
        );

        assert_eq!(app.error_message.as_deref(), Some(MSG_EXTRACTION_FAILED));
        assert!(!app.show_result);
        assert!(app.artifact.is_none());
    }

    #[test]
    fn test_a_new_extraction_replaces_the_previous_artifact() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);

        app.trigger_extraction();
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Ok(test_artifact(1))),
            },
        );
        let first = app.artifact.clone().expect("first artifact");

        // Triggering again clears the previous artifact before the new one
        app.trigger_extraction();
        assert!(app.artifact.is_none());

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Ok(test_artifact(2))),
            },
        );

        let second = app.artifact.clone().expect("second artifact");
        assert_ne!(first, second);
        assert_eq!(second.file_name, "last_frame_2.png");
    }

    #[test]
    fn test_exports_from_a_superseded_attempt_are_discarded() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);

        // First attempt decodes; its PNG encode is still pending when the
        // user triggers again
        app.trigger_extraction();
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );
        app.trigger_extraction();
        assert!(app.is_extracting());

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Ok(test_artifact(1))),
            },
        );
        // The first attempt's export must not resurface under the new attempt
        assert!(app.artifact.is_none());

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Ok(test_artifact(2))),
            },
        );
        assert_eq!(
            app.artifact.as_ref().map(|a| a.file_name.as_str()),
            Some("last_frame_2.png")
        );
    }

    #[test]
    fn test_a_superseded_encode_failure_does_not_mark_the_new_attempt() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);

        app.trigger_extraction();
        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::LastFrame(Ok(test_frame())),
            },
        );
        app.trigger_extraction();

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Artifact(Err(ExtractError::Extraction {
                    reason: "png writer failed".to_string(),
                })),
            },
        );

        // The in-flight attempt keeps its clean slate
        assert!(app.is_extracting());
        assert!(app.error_message.is_none());
        assert!(!app.show_result);
    }

    #[test]
    fn test_results_from_replaced_sessions_are_discarded() {
        let ctx = egui::Context::default();
        let mut app = create_test_app();
        app.accept_file(PathBuf::from("first.mp4"));
        let stale = metadata_result(&app);

        app.accept_file(PathBuf::from("second.mp4"));
        app.apply_result(&ctx, stale);

        // The stale metadata must not promote the new session
        assert_eq!(
            app.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Loading)
        );
        assert!(!app.can_extract());
    }

    #[test]
    fn test_files_are_ignored_while_extracting() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);
        app.trigger_extraction();

        app.accept_file(PathBuf::from("other.mp4"));

        let session = app.session.as_ref().expect("session should survive");
        assert_eq!(session.path, PathBuf::from("clip.mp4"));
        assert_eq!(session.phase, SessionPhase::Extracting);
        assert_eq!(app.generation, 1);
    }

    #[test]
    fn test_poster_failure_keeps_the_session_usable() {
        let ctx = egui::Context::default();
        let mut app = ready_app(&ctx);

        app.apply_result(
            &ctx,
            JobResult {
                generation: app.generation,
                outcome: JobOutcome::Poster(Err(ExtractError::DecodeLoad {
                    reason: "scale filter rejected".to_string(),
                })),
            },
        );

        assert!(app.preview_texture.is_none());
        assert!(app.error_message.is_none());
        assert!(app.can_extract());
    }
}
