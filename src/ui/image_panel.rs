use eframe::egui::{self, Image, TextureHandle};

use crate::mask::MaskBuffer;
use crate::mode::EditingMode;
use crate::points::Coord;

/// interactions captured from the image view this frame
#[derive(Default)]
pub struct ImageActions {
    /// point-entry click, in image pixel coordinates
    pub clicked: Option<Coord>,
}

/// Draw a texture scaled to fit preserving aspect ratio, with click and
/// drag sensing (returns response and the display scale)
fn aspect_fit_interactive(ui: &mut egui::Ui, tex: &TextureHandle) -> (egui::Response, f32) {
    let avail = ui.available_size();
    let tex_size = tex.size_vec2();
    let scale = (avail.x / tex_size.x).min(avail.y / tex_size.y).max(0.0);
    let draw_size = tex_size * scale;
    let response = ui.add(
        Image::new(tex)
            .fit_to_exact_size(draw_size)
            .sense(egui::Sense::click_and_drag()),
    );
    (response, scale)
}

/// Render the central image view. clicks in point-entry mode are reported
/// back; brush strokes in a mask mode are painted straight into the pending
/// brush buffer.
pub fn render_image_panel(
    ctx: &egui::Context,
    tex: Option<&TextureHandle>,
    mode: EditingMode,
    brush_radius: f32,
    pending_brush: &mut Option<MaskBuffer>,
) -> ImageActions {
    let mut actions = ImageActions::default();
    egui::CentralPanel::default().show(ctx, |ui| {
        let Some(tex) = tex else {
            ui.centered_and_justified(|ui| {
                ui.label("Generating…");
            });
            return;
        };
        ui.vertical_centered(|ui| {
            let (response, scale) = aspect_fit_interactive(ui, tex);
            if scale <= 0.0 {
                return;
            }
            let to_image = |pos: egui::Pos2| -> Coord {
                let rect = response.rect;
                [(pos.x - rect.min.x) / scale, (pos.y - rect.min.y) / scale]
            };

            if mode.is_mask_edit() {
                // brush cursor ring
                if let Some(hover) = response.hover_pos() {
                    ui.painter().circle_stroke(
                        hover,
                        brush_radius,
                        egui::Stroke::new(1.5, egui::Color32::from_rgb(255, 255, 255)),
                    );
                }
                let painting = response.dragged_by(egui::PointerButton::Primary)
                    || response.clicked_by(egui::PointerButton::Primary);
                if painting {
                    if let (Some(pos), Some(brush)) =
                        (response.interact_pointer_pos(), pending_brush.as_mut())
                    {
                        let p = to_image(pos);
                        brush.paint_circle(p[0], p[1], brush_radius / scale);
                    }
                }
            } else if response.clicked_by(egui::PointerButton::Primary) {
                if let Some(pos) = response.interact_pointer_pos() {
                    actions.clicked = Some(to_image(pos));
                }
            }
        });
    });
    actions
}
