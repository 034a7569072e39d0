use eframe::egui;

use crate::core::{
    format_duration, media_type, AppConfig, ExportArtifact, MediaSession, RenderedFrame,
    SessionPhase,
};
use crate::video::{
    ExtractError, ExtractionWorker, JobKind, JobOutcome, JobRequest, JobResult, MediaTools,
    POSTER_MAX_WIDTH,
};
use std::path::{Path, PathBuf};

pub(crate) const MSG_INVALID_FILE_TYPE: &str = "Please select a video file.";
pub(crate) const MSG_LOAD_FAILED: &str = "Failed to load the video file.";
pub(crate) const MSG_EXTRACTION_FAILED: &str =
    "Frame extraction failed; please verify the video file.";

pub struct LastFrameApp {
    pub config: AppConfig,
    pub worker: ExtractionWorker,
    pub session: Option<MediaSession>,
    /// Bumped whenever a new file is accepted; worker results carrying an
    /// older generation belong to a replaced session and are discarded
    pub generation: u64,
    pub jobs_in_flight: usize,
    pub preview_texture: Option<egui::TextureHandle>,
    pub frame_texture: Option<egui::TextureHandle>,
    pub artifact: Option<ExportArtifact>,
    pub error_message: Option<String>,
    pub status_message: String,
    pub show_result: bool,
    pub scroll_to_result: bool,
}

impl LastFrameApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> anyhow::Result<Self> {
        // Set global text color to white
        let mut visuals = egui::Visuals::dark();
        visuals.override_text_color = Some(egui::Color32::WHITE);
        cc.egui_ctx.set_visuals(visuals);

        let config = AppConfig::load()?;
        config.ensure_directories()?;

        let tools = MediaTools {
            ffmpeg: config.ffmpeg(),
            ffprobe: config.ffprobe(),
        };
        log::info!(
            "Media tools: ffmpeg={}, ffprobe={}",
            tools.ffmpeg.display(),
            tools.ffprobe.display()
        );
        let worker = ExtractionWorker::spawn(tools);

        Ok(Self {
            config,
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
        })
    }

    pub fn is_extracting(&self) -> bool {
        matches!(
            self.session.as_ref().map(|s| s.phase),
            Some(SessionPhase::Extracting)
        )
    }

    pub fn can_extract(&self) -> bool {
        self.session
            .as_ref()
            .map(|s| s.can_extract())
            .unwrap_or(false)
    }

    /// Bind a file to the decoder. Non-video files are rejected without
    /// touching the current session; during an extraction every file is
    /// ignored so the attempt in flight keeps its media.
    pub fn accept_file(&mut self, path: PathBuf) {
        if self.is_extracting() {
            log::debug!(
                "Ignoring file while an extraction is in flight: {}",
                path.display()
            );
            return;
        }

        let media_type = media_type::declared_media_type(&path);
        if !media_type::is_video(media_type) {
            let error = ExtractError::InvalidFileType {
                path,
                media_type: media_type.to_string(),
            };
            log::warn!("Rejected file: {}", error);
            self.error_message = Some(MSG_INVALID_FILE_TYPE.to_string());
            return;
        }

        // The whole session is replaced; the previous frame, artifact and
        // textures drop with it
        let session = MediaSession::new(path.clone(), media_type);
        log::info!(
            "Accepted {} ({}) as session {}",
            path.display(),
            media_type,
            session.id
        );
        self.generation += 1;
        self.session = Some(session);
        self.preview_texture = None;
        self.frame_texture = None;
        self.artifact = None;
        self.error_message = None;
        self.show_result = false;
        self.scroll_to_result = false;

        self.submit_job(JobKind::Probe { path });
    }

    /// Move the session to the end of its media and queue the last-frame
    /// decode. Does nothing unless the session is ready.
    pub fn trigger_extraction(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let Some(metadata) = session.begin_extraction() else {
            log::debug!("Extraction trigger ignored in phase {:?}", session.phase);
            return;
        };
        let path = session.path.clone();
        log::info!(
            "Extracting the last frame of session {} at {:.3}s",
            session.id,
            session.position_secs
        );

        self.error_message = None;
        self.show_result = false;
        self.scroll_to_result = false;
        self.frame_texture = None;
        self.artifact = None;

        self.submit_job(JobKind::LastFrame { path, metadata });
    }

    /// Fold one worker result into the UI state. Results tagged with an
    /// older generation are dropped; their session no longer exists.
    pub fn apply_result(&mut self, ctx: &egui::Context, result: JobResult) {
        self.jobs_in_flight = self.jobs_in_flight.saturating_sub(1);

        if result.generation != self.generation {
            log::debug!(
                "Discarding result from replaced session (generation {} != {})",
                result.generation,
                self.generation
            );
            return;
        }

        match result.outcome {
            JobOutcome::Metadata(Ok(metadata)) => {
                let Some(session) = self.session.as_mut() else {
                    return;
                };
                session.metadata_loaded(metadata);
                let path = session.path.clone();
                log::info!(
                    "Metadata ready for session {}: {}x{}, {:.3}s",
                    session.id,
                    metadata.width,
                    metadata.height,
                    metadata.duration_secs
                );
                self.submit_job(JobKind::Poster { path, metadata });
            }
            JobOutcome::Metadata(Err(e)) => {
                if let Some(session) = self.session.as_mut() {
                    session.load_failed();
                }
                log::error!("Metadata probe failed: {}", e);
                self.error_message = Some(MSG_LOAD_FAILED.to_string());
            }
            JobOutcome::Poster(Ok(frame)) => {
                self.preview_texture = Some(load_frame_texture(ctx, "poster_frame", &frame));
            }
            JobOutcome::Poster(Err(e)) => {
                // The preview is decoration; the session stays usable
                log::debug!("Poster decode failed: {}", e);
            }
            JobOutcome::LastFrame(Ok(frame)) => {
                if let Some(session) = self.session.as_mut() {
                    session.finish_extraction();
                }
                log::info!("Last frame decoded at {}x{}", frame.width, frame.height);
                self.frame_texture = Some(load_frame_texture(ctx, "last_frame", &frame));
                self.error_message = None;
                self.show_result = true;
                self.scroll_to_result = true;
                self.submit_job(JobKind::EncodePng { frame });
            }
            JobOutcome::LastFrame(Err(e)) => {
                if let Some(session) = self.session.as_mut() {
                    session.finish_extraction();
                }
                log::error!("Frame extraction failed: {}", e);
                self.error_message = Some(MSG_EXTRACTION_FAILED.to_string());
                self.show_result = false;
            }
            JobOutcome::Artifact(outcome) => {
                if self.is_extracting() {
                    // A fresh attempt owns the display now; this export belongs
                    // to the frame it replaced
                    log::debug!("Discarding export from a superseded attempt");
                    return;
                }
                match outcome {
                    Ok(artifact) => {
                        log::info!(
                            "Export ready: {} ({} bytes)",
                            artifact.file_name,
                            artifact.png_bytes.len()
                        );
                        self.artifact = Some(artifact);
                    }
                    Err(e) => {
                        log::error!("PNG encoding failed: {}", e);
                        self.error_message = Some(MSG_EXTRACTION_FAILED.to_string());
                        self.show_result = false;
                        self.frame_texture = None;
                        self.artifact = None;
                    }
                }
            }
        }
    }

    fn submit_job(&mut self, kind: JobKind) {
        self.jobs_in_flight += 1;
        self.worker.request(JobRequest {
            generation: self.generation,
            kind,
        });
    }

    fn process_worker_results(&mut self, ctx: &egui::Context) {
        for result in self.worker.completed_results() {
            self.apply_result(ctx, result);
        }
    }

    fn process_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        if dropped.is_empty() {
            return;
        }
        // Like the picker, only the first dropped file counts
        if let Some(path) = dropped.into_iter().find_map(|file| file.path) {
            self.remember_browse_directory(&path);
            self.accept_file(path);
        }
    }

    fn open_file_dialog(&mut self) {
        if self.is_extracting() {
            return;
        }

        let mut dialog = rfd::FileDialog::new()
            .set_title("Select a video file")
            .add_filter("Video files", media_type::VIDEO_EXTENSIONS)
            .add_filter("All files", &["*"]);
        if let Some(directory) = self.browse_directory() {
            dialog = dialog.set_directory(directory);
        }

        if let Some(path) = dialog.pick_file() {
            self.remember_browse_directory(&path);
            self.accept_file(path);
        }
    }

    fn browse_directory(&self) -> Option<PathBuf> {
        self.config
            .last_browse_directory
            .clone()
            .filter(|directory| directory.exists())
    }

    fn remember_browse_directory(&mut self, file: &Path) {
        if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.config.last_browse_directory = Some(parent.to_path_buf());
            if let Err(e) = self.config.save() {
                log::error!("Failed to save config: {}", e);
            }
        }
    }

    fn choose_output_directory(&mut self) {
        let selected = rfd::FileDialog::new()
            .set_title("Select the output directory")
            .set_directory(&self.config.output_directory)
            .pick_folder();

        if let Some(directory) = selected {
            log::info!("Output directory set to {}", directory.display());
            self.status_message = format!("Output directory: {}", directory.display());
            self.config.output_directory = directory;
            if let Err(e) = self.config.save() {
                log::error!("Failed to save config: {}", e);
            }
        }
    }

    fn save_artifact(&mut self) {
        let Some(artifact) = self.artifact.clone() else {
            return;
        };

        let target = rfd::FileDialog::new()
            .set_title("Save frame as PNG")
            .set_directory(&self.config.output_directory)
            .set_file_name(&artifact.file_name)
            .add_filter("PNG image", &["png"])
            .save_file();

        let Some(target) = target else {
            log::debug!("Save dialog dismissed");
            return;
        };

        match std::fs::write(&target, &artifact.png_bytes) {
            Ok(()) => {
                log::info!(
                    "Saved {} ({} bytes)",
                    target.display(),
                    artifact.png_bytes.len()
                );
                self.status_message = format!("Saved {}", target.display());
                if let Some(parent) = target.parent() {
                    if parent != self.config.output_directory {
                        self.config.output_directory = parent.to_path_buf();
                        if let Err(e) = self.config.save() {
                            log::error!("Failed to save config: {}", e);
                        }
                    }
                }
            }
            Err(e) => {
                log::error!("Failed to save {}: {}", target.display(), e);
                self.status_message = format!("Save failed: {}", e);
            }
        }
    }
}

impl eframe::App for LastFrameApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process events
        self.process_worker_results(ctx);
        self.process_dropped_files(ctx);
        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui
                        .add_enabled(!self.is_extracting(), egui::Button::new("Open Video..."))
                        .clicked()
                    {
                        ui.close_menu();
                        self.open_file_dialog();
                    }
                    if ui.button("Set Output Directory...").clicked() {
                        ui.close_menu();
                        self.choose_output_directory();
                    }

                    ui.separator();

                    if ui.button("Exit").clicked() {
                        std::process::exit(0);
                    }
                });

                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.status_message =
                            format!("Last Frame {}", env!("CARGO_PKG_VERSION"));
                        ui.close_menu();
                    }
                });

                // Show the loaded file on the right
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    match &self.session {
                        Some(session) => {
                            ui.label(format!("📁 {}", session.file_name()));
                        }
                        None => {
                            ui.label("❌ No video loaded");
                        }
                    }
                });
            });
        });

        // Status bar at bottom
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label("Status:");
                if self.status_message.is_empty() {
                    ui.label("Ready");
                } else {
                    ui.label(&self.status_message);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(format!("Output: {}", self.config.output_directory.display()));
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_extractor(ui, hovering_files);
                });
        });

        // Keep painting while the worker is busy so results surface promptly
        if self.jobs_in_flight > 0 {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

impl LastFrameApp {
    fn show_extractor(&mut self, ui: &mut egui::Ui, hovering_files: bool) {
        ui.add_space(8.0);
        ui.vertical_centered(|ui| {
            ui.heading("Video Last Frame Extractor");
            ui.label("Load a video, jump to its final frame, and save it as a PNG.");
        });
        ui.add_space(8.0);

        self.show_drop_zone(ui, hovering_files);

        if self.session.is_some() {
            self.show_session_info(ui);
        }

        if let Some(message) = self.error_message.clone() {
            ui.add_space(8.0);
            ui.colored_label(ui.visuals().error_fg_color, message);
        }

        ui.add_space(8.0);
        if ui
            .add_enabled(self.can_extract(), egui::Button::new("Extract Last Frame"))
            .clicked()
        {
            self.trigger_extraction();
        }

        if self.is_extracting() {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.spinner();
                ui.label("Extracting the last frame...");
            });
        }

        if self.show_result {
            self.show_result_area(ui);
        }
    }

    fn show_drop_zone(&mut self, ui: &mut egui::Ui, hovering_files: bool) {
        let locked = self.is_extracting();
        let highlight = hovering_files && !locked;

        let desired = egui::vec2(ui.available_width(), 110.0);
        let (rect, response) = ui.allocate_exact_size(desired, egui::Sense::click());

        let visuals = ui.visuals();
        let mut fill = visuals.extreme_bg_color;
        let mut stroke = egui::Stroke::new(1.0, visuals.widgets.inactive.bg_stroke.color);
        if highlight {
            let mut hover_fill = visuals.selection.bg_fill;
            hover_fill[3] = (hover_fill[3] as f32 * 0.4) as u8;
            fill = hover_fill;
            stroke = egui::Stroke::new(2.0, visuals.selection.stroke.color);
        }
        let text_color = visuals.text_color();

        ui.painter().rect_filled(rect, 8.0, fill);
        ui.painter().rect_stroke(rect, 8.0, stroke);

        let text = if locked {
            "Extraction in progress..."
        } else if highlight {
            "Drop the video to load it"
        } else {
            "📁 Drag & drop a video here, or click to browse"
        };
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            text,
            egui::TextStyle::Body.resolve(ui.style()),
            text_color,
        );

        if response.clicked() && !locked {
            self.open_file_dialog();
        }
    }

    fn show_session_info(&self, ui: &mut egui::Ui) {
        let Some(session) = &self.session else {
            return;
        };

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            ui.label(format!("📁 {}", session.file_name()));
            ui.small(session.media_type);
        });

        match session.phase {
            SessionPhase::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.small("Loading metadata...");
                });
            }
            SessionPhase::Ready | SessionPhase::Extracting => {
                if let Some(metadata) = session.metadata {
                    ui.small(format!(
                        "{}x{}, {}",
                        metadata.width,
                        metadata.height,
                        format_duration(metadata.duration_secs)
                    ));
                }
            }
            // The error label below the drop zone covers this
            SessionPhase::LoadFailed => {}
        }

        if let Some(texture) = &self.preview_texture {
            ui.add_space(4.0);
            let max_width = ui.available_width().min(POSTER_MAX_WIDTH as f32);
            ui.add(egui::Image::new(texture).max_width(max_width));
        }
    }

    fn show_result_area(&mut self, ui: &mut egui::Ui) {
        ui.add_space(12.0);
        ui.separator();

        let artifact_name = self.artifact.as_ref().map(|a| a.file_name.clone());
        let mut save_clicked = false;

        let response = ui
            .vertical(|ui| {
                ui.heading("Extracted Frame");
                if let Some(texture) = &self.frame_texture {
                    let size = texture.size();
                    ui.small(format!("{}x{} (native size)", size[0], size[1]));
                    let max_size = egui::vec2(ui.available_width(), 420.0);
                    ui.add(egui::Image::new(texture).max_size(max_size));
                }
                ui.add_space(4.0);
                match artifact_name {
                    Some(name) => {
                        if ui.button(format!("💾 Save {}", name)).clicked() {
                            save_clicked = true;
                        }
                    }
                    None => {
                        ui.add_enabled(false, egui::Button::new("💾 Encoding PNG..."));
                    }
                }
            })
            .response;

        if self.scroll_to_result {
            response.scroll_to_me(Some(egui::Align::Center));
            self.scroll_to_result = false;
        }

        if save_clicked {
            self.save_artifact();
        }
    }
}

fn load_frame_texture(
    ctx: &egui::Context,
    name: &str,
    frame: &RenderedFrame,
) -> egui::TextureHandle {
    let image = egui::ColorImage::from_rgb(
        [frame.width as usize, frame.height as usize],
        &frame.pixels,
    );
    ctx.load_texture(name, image, egui::TextureOptions::default())
}
