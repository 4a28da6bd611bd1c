/// application settings for LatentDrag
/// these can be modified at runtime through the tool panel
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::renderer::LatentSpace;
use crate::session::DragParams;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    // latent / generation
    pub seed: u64,
    /// optimizer step size; zero is rejected at the handler level
    pub lr: f32,
    pub latent_space: LatentSpace,
    pub trunc_psi: f32,
    pub trunc_cutoff: Option<u32>,

    // drag optimization
    /// weight of the motion term against the fixed-region term
    pub motion_lambda: f32,
    /// radius of the feature patch moved per step (pixels)
    pub r1_in_pixels: f32,
    /// radius of the search region around each target (pixels)
    pub r2_in_pixels: f32,
    /// hard cap on optimization steps per run
    pub max_step: usize,
    /// recompose and publish the display image every N steps
    pub draw_interval: usize,

    // mask editing
    pub show_mask: bool,
    pub brush_radius: f32,

    // checkpoints
    pub cache_dir: PathBuf,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            seed: 0,
            lr: 0.001,
            latent_space: LatentSpace::WPlus,
            trunc_psi: 0.7,
            trunc_cutoff: None,
            motion_lambda: 20.0,
            r1_in_pixels: 3.0,
            r2_in_pixels: 12.0,
            max_step: 500,
            draw_interval: 1,
            show_mask: true,
            brush_radius: 20.0,
            cache_dir: PathBuf::from("./checkpoints"),
        }
    }
}

impl AppSettings {
    /// save settings to JSON file
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write("settings.json", json)?;
        Ok(())
    }

    /// load settings from JSON file, or return defaults if file doesn't exist
    pub fn load() -> Self {
        match std::fs::read_to_string("settings.json") {
            Ok(json) => match serde_json::from_str::<Self>(&json) {
                Ok(mut settings) => {
                    // a hand-edited interval of 0 would suppress every frame
                    settings.draw_interval = settings.draw_interval.max(1);
                    settings
                }
                Err(e) => {
                    log::warn!("failed to parse settings.json: {e}. using defaults.");
                    Self::default()
                }
            },
            Err(_) => {
                // file doesn't exist or can't be read - use defaults
                Self::default()
            }
        }
    }

    /// hyperparameter bundle threaded through the session
    pub fn to_drag_params(&self) -> DragParams {
        DragParams {
            seed: self.seed,
            lr: self.lr,
            motion_lambda: self.motion_lambda,
            r1_in_pixels: self.r1_in_pixels,
            r2_in_pixels: self.r2_in_pixels,
            trunc_psi: self.trunc_psi,
            trunc_cutoff: self.trunc_cutoff,
            latent_space: self.latent_space,
        }
    }
}
