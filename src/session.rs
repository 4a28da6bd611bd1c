// the single unit of ownership for one editing session
//
// every operation receives the session, mutates it, and hands it on; no
// component keeps state between calls except through this struct. clones are
// cheap (images are Arc'd), so each progress snapshot carries a full copy.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use image::RgbaImage;

use crate::compose;
use crate::mask::MaskBuffer;
use crate::mode::EditingMode;
use crate::points::PointRegistry;
use crate::renderer::{GeneratorParams, InitSpec, LatentSpace, Renderer, RendererError};
use crate::settings::AppSettings;

/// drag optimization hyperparameters, mirrored from the tool panel
#[derive(Clone, Debug)]
pub struct DragParams {
    pub seed: u64,
    pub lr: f32,
    pub motion_lambda: f32,
    pub r1_in_pixels: f32,
    pub r2_in_pixels: f32,
    pub trunc_psi: f32,
    pub trunc_cutoff: Option<u32>,
    pub latent_space: LatentSpace,
}

#[derive(Clone)]
pub struct SessionState {
    pub points: PointRegistry,
    pub mask: MaskBuffer,
    pub mode: EditingMode,
    /// user stop request, observed by the driver at the top of each
    /// iteration; shared across clones so the UI can signal a running loop
    pub stop: Arc<AtomicBool>,
    pub params: DragParams,
    /// opaque model state; exclusively owned by the driver while running
    pub generator: GeneratorParams,
    pub checkpoint: String,
    pub checkpoint_path: Option<std::path::PathBuf>,
    pub show_mask: bool,
    pub draw_interval: usize,
    /// base image as generated, before any optimization
    pub image_orig: Arc<RgbaImage>,
    /// current optimization result, no overlays
    pub image_raw: Arc<RgbaImage>,
    /// composited image on screen: raw + markers + mask overlay + watermark
    pub image_show: Arc<RgbaImage>,
}

impl SessionState {
    pub fn new(
        settings: &AppSettings,
        checkpoint: String,
        checkpoint_path: Option<std::path::PathBuf>,
    ) -> Self {
        let blank = Arc::new(RgbaImage::new(1, 1));
        Self {
            points: PointRegistry::new(),
            mask: MaskBuffer::new_full(1, 1),
            mode: EditingMode::AddPoints,
            stop: Arc::new(AtomicBool::new(false)),
            params: settings.to_drag_params(),
            generator: GeneratorParams::default(),
            checkpoint,
            checkpoint_path,
            show_mask: settings.show_mask,
            draw_interval: settings.draw_interval,
            image_orig: blank.clone(),
            image_raw: blank.clone(),
            image_show: blank,
        }
    }

    pub fn init_spec(&self) -> InitSpec {
        InitSpec {
            checkpoint: self.checkpoint.clone(),
            path: self.checkpoint_path.clone(),
            seed: self.params.seed,
            latent_space: self.params.latent_space,
            trunc_psi: self.params.trunc_psi,
            trunc_cutoff: self.params.trunc_cutoff,
            lr: self.params.lr,
        }
    }

    /// re-init the generator and regenerate the base image. on success the
    /// image triple is replaced and the mask reset to the placeholder; on
    /// error nothing is mutated, so the caller keeps its last-good session.
    pub fn init_images(&mut self, renderer: &mut dyn Renderer) -> Result<(), RendererError> {
        profiling::scope!("init_images");
        let mut generator = renderer.init(&self.init_spec())?;
        renderer.render(&mut generator)?;

        let init_image = generator.image.clone();
        let (w, h) = init_image.dimensions();
        self.generator = generator;
        self.image_orig = init_image.clone();
        self.image_raw = init_image.clone();
        self.image_show = Arc::new(compose::watermark((*init_image).clone()));
        self.mask.reset_to_full(w, h);
        Ok(())
    }

    /// stage field changes (checkpoint, seed, latent space) and re-init the
    /// generator against a scratch clone. the live session is replaced only
    /// when the load succeeds, so a failed re-init commits nothing, staged
    /// fields included.
    pub fn reinit_with(
        &mut self,
        renderer: &mut dyn Renderer,
        stage: impl FnOnce(&mut SessionState),
    ) -> Result<(), RendererError> {
        let mut next = self.clone();
        stage(&mut next);
        next.init_images(renderer)?;
        next.clear_points();
        renderer.reset_feature_refs();
        next.redraw();
        *self = next;
        Ok(())
    }

    pub fn clear_points(&mut self) {
        self.points.clear();
        log::info!("clear points state");
    }

    pub fn clear_mask(&mut self) {
        let (w, h) = self.image_raw.dimensions();
        self.mask.reset_to_full(w, h);
        log::info!("clear mask state");
    }

    /// commit any pending brush stroke against the current mode, then switch.
    /// a switch from add-mask to remove-mask therefore lands the add before
    /// the remove starts.
    pub fn enter_mode(&mut self, next: EditingMode, pending_brush: Option<&MaskBuffer>) {
        self.flush_brush(pending_brush);
        self.mode = next;
    }

    /// fold a pending brush stroke into the mask without changing mode
    pub fn flush_brush(&mut self, pending_brush: Option<&MaskBuffer>) {
        if let Some(brush) = pending_brush {
            if brush.any_set() {
                self.mask.apply_edit(brush, self.mode);
            }
        }
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// recompose the display image from the raw frame, markers, the mask
    /// overlay (only when visible and non-uniform) and the watermark
    pub fn redraw(&mut self) {
        profiling::scope!("session_redraw");
        let mut img = compose::overlay_points(&self.image_raw, &self.points);
        if self.show_mask && !self.mask.is_uniform() {
            img = compose::overlay_mask(&img, &self.mask);
        }
        self.image_show = Arc::new(compose::watermark(img));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::BlobRenderer;

    fn ready_session() -> (SessionState, BlobRenderer) {
        let settings = AppSettings::default();
        let mut renderer = BlobRenderer::new();
        let mut session = SessionState::new(&settings, "builtin_faces".to_owned(), None);
        session.init_images(&mut renderer).unwrap();
        (session, renderer)
    }

    #[test]
    fn test_failed_reinit_keeps_last_good_session() {
        let (mut session, mut renderer) = ready_session();
        let image_before = session.image_orig.clone();
        session.points.register_click([10.0, 10.0]);

        let result = session.reinit_with(&mut renderer, |s| {
            s.checkpoint = "missing".to_owned();
            s.checkpoint_path = Some(std::path::PathBuf::from("/nonexistent/missing.pkl"));
        });

        assert!(result.is_err());
        // nothing committed: not the staged fields, not the images, not the
        // point or mask state
        assert_eq!(session.checkpoint, "builtin_faces");
        assert_eq!(session.checkpoint_path, None);
        assert_eq!(session.image_orig, image_before);
        assert_eq!(session.points.len(), 1);
    }

    #[test]
    fn test_successful_reinit_commits_staged_fields() {
        let (mut session, mut renderer) = ready_session();
        session.points.register_click([5.0, 5.0]);

        session
            .reinit_with(&mut renderer, |s| s.params.seed = 42)
            .unwrap();

        assert_eq!(session.params.seed, 42);
        assert!(session.points.is_empty());
        assert!(session.mask.is_placeholder());
    }

    #[test]
    fn test_mode_switch_flushes_brush_against_previous_mode() {
        let (mut session, _renderer) = ready_session();
        assert!(session.mask.is_placeholder());
        session.mode = EditingMode::AddMask;

        let (w, h) = session.image_raw.dimensions();
        let mut brush = MaskBuffer::new_empty(w, h);
        brush.paint_circle(30.0, 30.0, 10.0);

        session.enter_mode(EditingMode::RemoveMask, Some(&brush));

        // the stroke landed under add semantics before the switch took effect
        assert_eq!(session.mode, EditingMode::RemoveMask);
        assert!(!session.mask.is_placeholder());
        assert_eq!(session.mask.get(30, 30), 1);
        assert_eq!(session.mask.get(w - 1, h - 1), 0);
    }

    #[test]
    fn test_empty_brush_does_not_touch_mask() {
        let (mut session, _renderer) = ready_session();
        session.mode = EditingMode::AddMask;
        let (w, h) = session.image_raw.dimensions();
        let brush = MaskBuffer::new_empty(w, h);

        session.enter_mode(EditingMode::AddPoints, Some(&brush));

        assert!(session.mask.is_placeholder());
    }
}
