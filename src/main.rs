mod core;
mod gui;
mod video;

use eframe::egui;
use gui::LastFrameApp;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([900.0, 720.0])
            .with_title("Last Frame - Video Frame Extractor")
            .with_drag_and_drop(true),
        ..Default::default()
    };

    eframe::run_native(
        "Last Frame",
        options,
        Box::new(|cc| {
            match LastFrameApp::new(cc) {
                Ok(app) => {
                    log::info!("Last Frame ready");
                    Ok(Box::new(app))
                }
                Err(e) => {
                    eprintln!("Failed to initialize app: {}", e);
                    std::process::exit(1);
                }
            }
        }),
    ).map_err(|e| anyhow::anyhow!("Failed to run app: {}", e))?;

    Ok(())
}
