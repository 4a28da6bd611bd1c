use eframe::egui;

use crate::app_types::ControlStates;
use crate::checkpoints::CheckpointMap;
use crate::renderer::LatentSpace;
use crate::session::SessionState;

/// user intents collected from one frame of the tool panel; the app applies
/// them after all panels have rendered, so no handler runs mid-layout
#[derive(Default)]
pub struct ToolActions {
    pub select_checkpoint: Option<String>,
    pub pick_cache_dir: bool,
    pub seed: Option<u64>,
    pub lr: Option<f32>,
    pub latent_space: Option<LatentSpace>,
    pub lambda: Option<f32>,
    pub r1: Option<f32>,
    pub r2: Option<f32>,
    pub reset_image: bool,
    pub add_points: bool,
    pub reset_points: bool,
    pub add_mask: bool,
    pub remove_mask: bool,
    pub reset_mask: bool,
    pub show_mask: Option<bool>,
    pub start: bool,
    pub stop: bool,
}

/// Render the left tool panel (checkpoint, latent, drag, mask sections)
pub fn render_tool_panel(
    ctx: &egui::Context,
    session: &SessionState,
    checkpoints: &CheckpointMap,
    controls: ControlStates,
    step_display: usize,
    actions: &mut ToolActions,
) {
    egui::SidePanel::left("tools")
        .resizable(false)
        .default_width(230.0)
        .show(ctx, |ui| {
            ui.add_space(4.0);
            ui.label(egui::RichText::new("Pickle").strong());
            ui.add_enabled_ui(controls.checkpoint, |ui| {
                egui::ComboBox::from_id_salt("checkpoint")
                    .width(200.0)
                    .selected_text(&session.checkpoint)
                    .show_ui(ui, |ui| {
                        for name in checkpoints.keys() {
                            if ui
                                .selectable_label(*name == session.checkpoint, name)
                                .clicked()
                            {
                                actions.select_checkpoint = Some(name.clone());
                            }
                        }
                    });
                if ui.button("Cache Dir…").clicked() {
                    actions.pick_cache_dir = true;
                }
            });

            ui.separator();
            ui.label(egui::RichText::new("Latent").strong());
            ui.add_enabled_ui(controls.seed, |ui| {
                let mut seed = session.params.seed;
                ui.horizontal(|ui| {
                    ui.label("Seed");
                    if ui.add(egui::DragValue::new(&mut seed).speed(1)).changed() {
                        actions.seed = Some(seed);
                    }
                });
            });
            ui.add_enabled_ui(controls.lr, |ui| {
                let mut lr = session.params.lr;
                ui.horizontal(|ui| {
                    ui.label("Step Size");
                    if ui
                        .add(egui::DragValue::new(&mut lr).speed(0.0005).max_decimals(4))
                        .changed()
                    {
                        actions.lr = Some(lr);
                    }
                });
            });
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(controls.reset_image, egui::Button::new("Reset Image"))
                    .clicked()
                {
                    actions.reset_image = true;
                }
            });
            ui.add_enabled_ui(controls.latent_space, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Space");
                    let mut space = session.params.latent_space;
                    for choice in [LatentSpace::W, LatentSpace::WPlus] {
                        if ui.radio_value(&mut space, choice, choice.label()).changed() {
                            actions.latent_space = Some(space);
                        }
                    }
                });
            });

            ui.separator();
            ui.label(egui::RichText::new("Drag").strong());
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(controls.add_points, egui::Button::new("Add Points"))
                    .clicked()
                {
                    actions.add_points = true;
                }
                if ui
                    .add_enabled(controls.reset_points, egui::Button::new("Reset Points"))
                    .clicked()
                {
                    actions.reset_points = true;
                }
            });
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(controls.start, egui::Button::new("▶ Start"))
                    .clicked()
                {
                    actions.start = true;
                }
                if ui
                    .add_enabled(controls.stop, egui::Button::new("⏹ Stop"))
                    .clicked()
                {
                    actions.stop = true;
                }
            });
            ui.horizontal(|ui| {
                ui.label("Steps");
                ui.monospace(format!("{step_display}"));
            });

            ui.separator();
            ui.label(egui::RichText::new("Mask").strong());
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(controls.add_mask, egui::Button::new("Flexible Area"))
                    .on_hover_text("Paint the region that is free to move")
                    .clicked()
                {
                    actions.add_mask = true;
                }
                if ui
                    .add_enabled(controls.remove_mask, egui::Button::new("Fixed Area"))
                    .on_hover_text("Paint to remove from the flexible region")
                    .clicked()
                {
                    actions.remove_mask = true;
                }
            });
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(controls.reset_mask, egui::Button::new("Reset Mask"))
                    .clicked()
                {
                    actions.reset_mask = true;
                }
                ui.add_enabled_ui(controls.show_mask, |ui| {
                    let mut show = session.show_mask;
                    if ui.checkbox(&mut show, "Show Mask").changed() {
                        actions.show_mask = Some(show);
                    }
                });
            });
            ui.add_enabled_ui(controls.lambda, |ui| {
                let mut lambda = session.params.motion_lambda;
                ui.horizontal(|ui| {
                    ui.label("Lambda");
                    if ui.add(egui::DragValue::new(&mut lambda).speed(1.0)).changed() {
                        actions.lambda = Some(lambda);
                    }
                });
                let mut r1 = session.params.r1_in_pixels;
                let mut r2 = session.params.r2_in_pixels;
                ui.horizontal(|ui| {
                    ui.label("r1");
                    if ui.add(egui::DragValue::new(&mut r1).speed(0.5)).changed() {
                        actions.r1 = Some(r1);
                    }
                    ui.label("r2");
                    if ui.add(egui::DragValue::new(&mut r2).speed(0.5)).changed() {
                        actions.r2 = Some(r2);
                    }
                });
            });
        });
}
