use eframe::egui;

use crate::mode::EditingMode;
use crate::session::SessionState;

/// Render the bottom status bar panel
pub fn render_status_bar(
    ctx: &egui::Context,
    session: &SessionState,
    step_display: usize,
    running: bool,
) {
    egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let mode = match session.mode {
                EditingMode::AddPoints => "add points",
                EditingMode::AddMask => "paint flexible area",
                EditingMode::RemoveMask => "paint fixed area",
                EditingMode::Running => "optimizing",
            };
            ui.label(format!("Mode: {mode}"));
            ui.separator();
            ui.label(format!("Points: {}", session.points.len()));
            ui.separator();
            if running {
                ui.spinner();
                ui.label(format!("Step {step_display}"));
            } else {
                ui.label(format!(
                    "Checkpoint: {} (seed {})",
                    session.checkpoint, session.params.seed
                ));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let (w, h) = session.image_raw.dimensions();
                if w > 1 {
                    ui.label(format!("{w}×{h} px"));
                }
            });
        });
    });
}
