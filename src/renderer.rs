// contract between the editing session and the generative model
//
// the session never looks inside the model: it hands over latent parameters,
// exported point pairs, the drag-region mask and hyperparameters, and gets
// back an updated image plus a "converged, stop" signal.

use std::path::PathBuf;
use std::sync::Arc;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::mask::MaskBuffer;
use crate::points::Coord;

/// which latent space the drag optimization runs in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LatentSpace {
    W,
    #[default]
    WPlus,
}

impl LatentSpace {
    pub fn label(self) -> &'static str {
        match self {
            LatentSpace::W => "w",
            LatentSpace::WPlus => "w+",
        }
    }
}

/// everything a generator needs to (re)build its initial state
#[derive(Clone, Debug)]
pub struct InitSpec {
    /// checkpoint name, keyed by file stem; `path` is None for the built-in
    /// procedural presets
    pub checkpoint: String,
    pub path: Option<PathBuf>,
    pub seed: u64,
    pub latent_space: LatentSpace,
    pub trunc_psi: f32,
    pub trunc_cutoff: Option<u32>,
    pub lr: f32,
}

/// model-owned optimization state: latent code plus the current frame.
/// opaque to the session, mutated in place by every step. `stop` is the
/// generator's internal convergence flag.
#[derive(Clone, Debug)]
pub struct GeneratorParams {
    pub latent: Vec<f32>,
    pub image: Arc<RgbaImage>,
    pub stop: bool,
}

impl Default for GeneratorParams {
    fn default() -> Self {
        Self {
            latent: Vec::new(),
            image: Arc::new(RgbaImage::new(1, 1)),
            stop: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to load checkpoint '{name}': {reason}")]
    ResourceInit { name: String, reason: String },
    #[error("generator used before initialization")]
    Uninitialized,
}

/// one generative model with a per-step drag optimization primitive.
///
/// implementations must not leave partial state behind when `init` fails;
/// the caller rolls the session back to its last known-good state on error.
pub trait Renderer: Send {
    /// build fresh generator parameters and render the base image
    fn init(&mut self, spec: &InitSpec) -> Result<GeneratorParams, RendererError>;

    /// non-drag render: regenerate `params.image` from the current latent
    fn render(&mut self, params: &mut GeneratorParams) -> Result<(), RendererError>;

    /// one gradient step. `sources`/`targets` are (row, col) coordinates and
    /// are advanced in place so markers can follow the optimization;
    /// `drag_mask` is the inverted editable-region mask, 1 where pixels must
    /// stay fixed. returns the generator's "should stop" signal (also
    /// mirrored in `params.stop`).
    #[allow(clippy::too_many_arguments)]
    fn step(
        &mut self,
        params: &mut GeneratorParams,
        sources: &mut [Coord],
        targets: &mut [Coord],
        drag_mask: &MaskBuffer,
        motion_lambda: f32,
        r1: f32,
        r2: f32,
        trunc_psi: f32,
    ) -> Result<bool, RendererError>;

    /// swap the optimizer's learning rate without touching the latent
    fn update_learning_rate(&mut self, lr: f32);

    /// drop cached motion feature references so the next run re-anchors
    /// against the current image (called when points are reset)
    fn reset_feature_refs(&mut self);
}
