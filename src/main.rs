mod app;
mod app_types;
mod checkpoints;
mod compose;
mod driver;
mod mask;
mod mode;
mod points;
mod render;
mod renderer;
mod session;
mod settings;
mod ui;

fn main() -> eframe::Result<()> {
    env_logger::init();

    // configure Rayon's global thread pool once at startup so worker threads get nice names like "rayon-0".
    let _ = rayon::ThreadPoolBuilder::new()
        .thread_name(|i| format!("rayon-{i}"))
        .build_global();

    let native_options = eframe::NativeOptions::default();
    eframe::run_native(
        "LatentDrag",
        native_options,
        Box::new(|cc| {
            Ok::<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>(
                Box::new(crate::app::DragApp::new(cc))
            )
        }),

    )

}
