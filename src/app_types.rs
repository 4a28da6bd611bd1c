use std::sync::Arc;

use image::RgbaImage;

use crate::renderer::Renderer;
use crate::session::SessionState;

/// which UI controls should currently accept input. the driver publishes
/// this with every snapshot: everything but Stop is frozen while a drag is
/// running, everything but Stop is live once it terminates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlStates {
    pub checkpoint: bool,
    pub seed: bool,
    pub lr: bool,
    pub latent_space: bool,
    pub lambda: bool,
    pub reset_image: bool,
    pub add_points: bool,
    pub reset_points: bool,
    pub add_mask: bool,
    pub remove_mask: bool,
    pub reset_mask: bool,
    pub show_mask: bool,
    pub start: bool,
    pub stop: bool,
}

impl ControlStates {
    /// all interactive, stop disabled: the idle / terminated state
    pub fn idle() -> Self {
        Self {
            checkpoint: true,
            seed: true,
            lr: true,
            latent_space: true,
            lambda: true,
            reset_image: true,
            add_points: true,
            reset_points: true,
            add_mask: true,
            remove_mask: true,
            reset_mask: true,
            show_mask: true,
            start: true,
            stop: false,
        }
    }

    /// everything frozen except stop: the mid-run state
    pub fn running() -> Self {
        Self {
            checkpoint: false,
            seed: false,
            lr: false,
            latent_space: false,
            lambda: false,
            reset_image: false,
            add_points: false,
            reset_points: false,
            add_mask: false,
            remove_mask: false,
            reset_mask: false,
            show_mask: false,
            start: false,
            stop: true,
        }
    }
}

/// one published unit of progress: full session state, the step index, the
/// composited display frame, and the control-enablement vector. the terminal
/// snapshot of a run carries step index 0 to signal "idle" to observers.
pub struct Snapshot {
    pub session: SessionState,
    pub step_idx: usize,
    pub image_show: Arc<RgbaImage>,
    pub controls: ControlStates,
}

/// messages from the drag driver thread to the UI
pub enum DragEvent {
    Snapshot(Snapshot),
    /// the run is over; the generator resource comes back to the UI thread
    Finished { renderer: Box<dyn Renderer + Send> },
}
