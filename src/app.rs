use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use std::sync::mpsc::Receiver;
use std::thread;

use crate::app_types::{ControlStates, DragEvent};
use crate::checkpoints::{self, CheckpointMap};
use crate::driver;
use crate::mask::MaskBuffer;
use crate::mode::EditingMode;
use crate::points::Coord;
use crate::render::BlobRenderer;
use crate::renderer::Renderer;
use crate::session::SessionState;
use crate::settings::AppSettings;
use crate::ui::image_panel::ImageActions;
use crate::ui::tool_panel::ToolActions;

pub struct DragApp {
    settings: AppSettings,
    session: SessionState,
    /// the generator resource; absent while a drag run owns it
    renderer: Option<Box<dyn Renderer + Send>>,
    checkpoints: CheckpointMap,

    // latest state from the driver
    controls: ControlStates,
    step_display: usize,

    // communication with the drag thread
    drag_rx: Option<Receiver<DragEvent>>,
    drag_thread: Option<thread::JoinHandle<()>>,

    // display texture
    tex: Option<TextureHandle>,
    tex_dirty: bool,

    /// brush stroke being painted, committed on the next mode change or start
    pending_brush: Option<MaskBuffer>,

    error_banner: Option<String>,
}

impl DragApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let settings = AppSettings::load();
        let checkpoints = checkpoints::discover(&settings.cache_dir);
        let (name, path) = checkpoints
            .iter()
            .next()
            .map(|(n, p)| (n.clone(), p.clone()))
            .unwrap_or_default();

        let mut renderer: Box<dyn Renderer + Send> = Box::new(BlobRenderer::new());
        let mut session = SessionState::new(&settings, name, path);
        let mut error_banner = None;
        if let Err(e) = session.init_images(renderer.as_mut()) {
            log::error!("initial generation failed: {e}");
            error_banner = Some(e.to_string());
        }
        session.redraw();

        Self {
            settings,
            session,
            renderer: Some(renderer),
            checkpoints,
            controls: ControlStates::idle(),
            step_display: 0,
            drag_rx: None,
            drag_thread: None,
            tex: None,
            tex_dirty: true,
            pending_brush: None,
            error_banner,
        }
    }

    /// Stage field changes and re-init the generator; a load failure leaves
    /// the session untouched (staged fields included) and raises the banner.
    fn reinit_images(&mut self, stage: impl FnOnce(&mut SessionState)) {
        profiling::scope!("reinit_images");
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        match self.session.reinit_with(renderer.as_mut(), stage) {
            Ok(()) => {
                self.pending_brush = None;
                self.tex_dirty = true;
            }
            Err(e) => {
                log::error!("{e}");
                self.error_banner = Some(e.to_string());
            }
        }
    }

    fn on_click_image(&mut self, coord: Coord) {
        if !self.session.mode.allows_point_clicks() {
            // ignored, display re-emitted unchanged
            log::info!("in {:?} state, do not add points", self.session.mode);
            return;
        }
        self.session.points.register_click(coord);
        self.session.redraw();
        self.tex_dirty = true;
    }

    fn enter_mode(&mut self, next: EditingMode) {
        if !self.session.mode.user_can_switch_to(next) {
            log::info!("cannot switch to {next:?} from {:?}", self.session.mode);
            return;
        }
        let brush = self.pending_brush.take();
        self.session.enter_mode(next, brush.as_ref());
        if next.is_mask_edit() {
            let (w, h) = self.session.image_raw.dimensions();
            self.pending_brush = Some(MaskBuffer::new_empty(w, h));
        }
        self.session.redraw();
        self.tex_dirty = true;
    }

    fn on_start(&mut self, ctx: &egui::Context) {
        let Some(renderer) = self.renderer.take() else {
            return;
        };
        // commit any half-painted mask before the run
        let brush = self.pending_brush.take();
        self.session.flush_brush(brush.as_ref());

        self.controls = ControlStates::running();
        let (rx, handle) = driver::spawn_drag(
            self.session.clone(),
            renderer,
            self.settings.max_step,
            ctx.clone(),
        );
        self.drag_rx = Some(rx);
        self.drag_thread = Some(handle);
    }

    fn on_stop(&mut self) {
        self.session.request_stop();
        // disable the stop button; the terminal snapshot re-enables the rest
        self.controls.stop = false;
    }

    /// Drain driver events: every snapshot replaces the session wholesale
    /// (the stop flag is shared through the Arc, so a stop request still
    /// reaches the loop), and the terminal event returns the renderer.
    fn poll_drag_events(&mut self) {
        profiling::scope!("poll_drag_events");
        let Some(rx) = &self.drag_rx else {
            return;
        };
        let mut returned: Option<Box<dyn Renderer + Send>> = None;
        while let Ok(event) = rx.try_recv() {
            match event {
                DragEvent::Snapshot(snap) => {
                    self.session = snap.session;
                    self.controls = snap.controls;
                    self.step_display = snap.step_idx;
                    self.tex_dirty = true;
                }
                DragEvent::Finished { renderer } => returned = Some(renderer),
            }
        }
        if let Some(renderer) = returned {
            self.renderer = Some(renderer);
            self.drag_rx = None;
            if let Some(handle) = self.drag_thread.take() {
                let _ = handle.join();
            }
        }
    }

    fn upload_texture(&mut self, ctx: &egui::Context) {
        if !self.tex_dirty {
            return;
        }
        profiling::scope!("upload_texture");
        let img = &self.session.image_show;
        let (w, h) = img.dimensions();
        let color = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], img.as_raw());
        if let Some(tex) = self.tex.as_mut() {
            tex.set(color, TextureOptions::LINEAR);
        } else {
            self.tex = Some(ctx.load_texture("display", color, TextureOptions::LINEAR));
        }
        self.tex_dirty = false;
    }

    fn apply_tool_actions(&mut self, actions: ToolActions, ctx: &egui::Context) {
        if let Some(name) = actions.select_checkpoint {
            let path = self.checkpoints.get(&name).cloned().flatten();
            self.reinit_images(move |s| {
                s.checkpoint = name;
                s.checkpoint_path = path;
            });
        }
        if actions.pick_cache_dir {
            if let Some(dir) = rfd::FileDialog::new().pick_folder() {
                self.settings.cache_dir = dir;
                self.checkpoints = checkpoints::discover(&self.settings.cache_dir);
            }
        }
        if let Some(seed) = actions.seed {
            self.reinit_images(move |s| s.params.seed = seed);
        }
        if let Some(lr) = actions.lr {
            if lr == 0.0 {
                log::info!("lr is 0, do nothing");
            } else {
                self.session.params.lr = lr;
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.update_learning_rate(lr);
                }
            }
        }
        if let Some(space) = actions.latent_space {
            self.reinit_images(move |s| s.params.latent_space = space);
        }
        if let Some(lambda) = actions.lambda {
            self.session.params.motion_lambda = lambda;
        }
        if let Some(r1) = actions.r1 {
            self.session.params.r1_in_pixels = r1;
        }
        if let Some(r2) = actions.r2 {
            self.session.params.r2_in_pixels = r2;
        }
        if actions.reset_image {
            self.reinit_images(|_| {});
        }
        if actions.add_points {
            self.enter_mode(EditingMode::AddPoints);
        }
        if actions.add_mask {
            self.enter_mode(EditingMode::AddMask);
        }
        if actions.remove_mask {
            self.enter_mode(EditingMode::RemoveMask);
        }
        if actions.reset_points {
            self.session.clear_points();
            if let Some(renderer) = self.renderer.as_mut() {
                renderer.reset_feature_refs();
            }
            self.session.redraw();
            self.tex_dirty = true;
        }
        if actions.reset_mask {
            self.session.clear_mask();
            let (w, h) = self.session.image_raw.dimensions();
            self.pending_brush = self
                .pending_brush
                .as_ref()
                .map(|_| MaskBuffer::new_empty(w, h));
            self.session.redraw();
            self.tex_dirty = true;
        }
        if let Some(show) = actions.show_mask {
            self.session.show_mask = show;
            self.session.redraw();
            self.tex_dirty = true;
        }
        if actions.start {
            self.on_start(ctx);
        }
        if actions.stop {
            self.on_stop();
        }
    }

    fn render_error_banner(&mut self, ctx: &egui::Context) {
        let Some(msg) = self.error_banner.clone() else {
            return;
        };
        egui::TopBottomPanel::top("error_banner").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.colored_label(
                    egui::Color32::from_rgb(255, 90, 90),
                    format!("⚠ {msg}"),
                );
                if ui.button("Dismiss").clicked() {
                    self.error_banner = None;
                }
            });
        });
    }

    /// write the session's live parameters back so they persist
    fn sync_settings(&mut self) {
        let p = &self.session.params;
        self.settings.seed = p.seed;
        self.settings.lr = p.lr;
        self.settings.latent_space = p.latent_space;
        self.settings.motion_lambda = p.motion_lambda;
        self.settings.r1_in_pixels = p.r1_in_pixels;
        self.settings.r2_in_pixels = p.r2_in_pixels;
        self.settings.show_mask = self.session.show_mask;
    }
}

impl eframe::App for DragApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        profiling::scope!("app_update");
        self.poll_drag_events();
        self.render_error_banner(ctx);

        let mut actions = ToolActions::default();
        crate::ui::tool_panel::render_tool_panel(
            ctx,
            &self.session,
            &self.checkpoints,
            self.controls,
            self.step_display,
            &mut actions,
        );

        crate::ui::status_bar::render_status_bar(
            ctx,
            &self.session,
            self.step_display,
            self.drag_rx.is_some(),
        );

        self.upload_texture(ctx);
        let ImageActions { clicked } = crate::ui::image_panel::render_image_panel(
            ctx,
            self.tex.as_ref(),
            self.session.mode,
            self.settings.brush_radius,
            &mut self.pending_brush,
        );
        if let Some(coord) = clicked {
            self.on_click_image(coord);
        }

        self.apply_tool_actions(actions, ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // a run still owns the renderer; ask it to wind down before exit
        if self.drag_rx.is_some() {
            self.session.request_stop();
            if let Some(handle) = self.drag_thread.take() {
                let _ = handle.join();
            }
        }
        self.sync_settings();
        if let Err(e) = self.settings.save() {
            log::warn!("failed to save settings: {e}");
        }
    }
}
