// built-in procedural generator
//
// a deterministic CPU stand-in for a real generative model so the app runs
// end to end without external weights: the latent code is a seeded field of
// soft color blobs, a drag step advances each source point toward its target
// and carries nearby blobs along the same motion, and convergence is reached
// when every point sits within r1 of its target. everything derives from
// (checkpoint, seed, latent space, truncation), so identical inits produce
// identical frames.

use std::sync::Arc;

use image::RgbaImage;
use rand::Rng;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use rayon::prelude::*;

use crate::mask::MaskBuffer;
use crate::points::Coord;
use crate::renderer::{GeneratorParams, InitSpec, LatentSpace, Renderer, RendererError};

/// floats per blob in the latent vector: row, col, radius, r, g, b
const BLOB_STRIDE: usize = 6;
const RESOLUTION: u32 = 256;

pub struct BlobRenderer {
    resolution: u32,
    lr: f32,
    /// anchor positions captured at the first step of a run; masked-fixed
    /// blobs are pulled back toward these, and a points reset drops them
    feat_refs: Option<Vec<[f32; 2]>>,
}

impl Default for BlobRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobRenderer {
    pub fn new() -> Self {
        Self {
            resolution: RESOLUTION,
            lr: 0.001,
            feat_refs: None,
        }
    }

    fn blob_count(space: LatentSpace) -> usize {
        match space {
            LatentSpace::W => 16,
            // per-layer codes give the field more degrees of freedom
            LatentSpace::WPlus => 32,
        }
    }

    /// stable seed contribution from the checkpoint name (FNV-1a)
    fn checkpoint_hash(name: &str) -> u64 {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for b in name.bytes() {
            hash ^= b as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
        hash
    }

    fn rasterize(&self, latent: &[f32]) -> RgbaImage {
        profiling::scope!("blob_rasterize");
        let res = self.resolution;
        let mut img = RgbaImage::new(res, res);
        let rows: Vec<&mut [u8]> = img.chunks_mut((res * 4) as usize).collect();
        rows.into_par_iter().enumerate().for_each(|(y, row)| {
            for x in 0..res as usize {
                // dim vertical gradient background
                let mut acc = [
                    20.0 + 40.0 * (y as f32 / res as f32),
                    20.0,
                    30.0 + 30.0 * (y as f32 / res as f32),
                ];
                for blob in latent.chunks_exact(BLOB_STRIDE) {
                    let dr = y as f32 - blob[0];
                    let dc = x as f32 - blob[1];
                    let sigma = blob[2].max(4.0);
                    let w = (-(dr * dr + dc * dc) / (2.0 * sigma * sigma)).exp();
                    acc[0] += blob[3] * 255.0 * w;
                    acc[1] += blob[4] * 255.0 * w;
                    acc[2] += blob[5] * 255.0 * w;
                }
                let px = &mut row[x * 4..x * 4 + 4];
                px[0] = acc[0].min(255.0) as u8;
                px[1] = acc[1].min(255.0) as u8;
                px[2] = acc[2].min(255.0) as u8;
                px[3] = 255;
            }
        });
        img
    }
}

impl Renderer for BlobRenderer {
    fn init(&mut self, spec: &InitSpec) -> Result<GeneratorParams, RendererError> {
        profiling::scope!("blob_init");
        if let Some(path) = &spec.path {
            // checkpoint contents are opaque; existence is the load contract
            if !path.is_file() {
                return Err(RendererError::ResourceInit {
                    name: spec.checkpoint.clone(),
                    reason: format!("{} is not a readable file", path.display()),
                });
            }
        }

        let mut rng = Pcg64::seed_from_u64(spec.seed ^ Self::checkpoint_hash(&spec.checkpoint));
        let n = Self::blob_count(spec.latent_space);
        let res = self.resolution as f32;
        let mut latent = Vec::with_capacity(n * BLOB_STRIDE);
        for _ in 0..n {
            latent.push(rng.gen_range(0.0..res)); // row
            latent.push(rng.gen_range(0.0..res)); // col
            latent.push(rng.gen_range(8.0..40.0)); // radius
            latent.push(rng.gen_range(0.0..1.0)); // r
            latent.push(rng.gen_range(0.0..1.0)); // g
            latent.push(rng.gen_range(0.0..1.0)); // b
        }

        // truncation pulls codes toward the field center; the cutoff limits
        // how many blobs it applies to
        let cutoff = spec
            .trunc_cutoff
            .map(|c| c as usize)
            .unwrap_or(n)
            .min(n);
        for blob in latent.chunks_exact_mut(BLOB_STRIDE).take(cutoff) {
            blob[0] = res * 0.5 + spec.trunc_psi * (blob[0] - res * 0.5);
            blob[1] = res * 0.5 + spec.trunc_psi * (blob[1] - res * 0.5);
        }

        self.lr = spec.lr;
        self.feat_refs = None;
        let image = Arc::new(self.rasterize(&latent));
        Ok(GeneratorParams {
            latent,
            image,
            stop: false,
        })
    }

    fn render(&mut self, params: &mut GeneratorParams) -> Result<(), RendererError> {
        if params.latent.is_empty() {
            return Err(RendererError::Uninitialized);
        }
        params.image = Arc::new(self.rasterize(&params.latent));
        Ok(())
    }

    fn step(
        &mut self,
        params: &mut GeneratorParams,
        sources: &mut [Coord],
        targets: &mut [Coord],
        drag_mask: &MaskBuffer,
        motion_lambda: f32,
        r1: f32,
        r2: f32,
        _trunc_psi: f32,
    ) -> Result<bool, RendererError> {
        profiling::scope!("blob_step");
        if params.latent.is_empty() {
            return Err(RendererError::Uninitialized);
        }

        if self.feat_refs.is_none() {
            self.feat_refs = Some(
                params
                    .latent
                    .chunks_exact(BLOB_STRIDE)
                    .map(|b| [b[0], b[1]])
                    .collect(),
            );
        }
        let refs = self.feat_refs.as_ref().unwrap().clone();

        // step magnitude scales with the optimizer learning rate
        let step_px = (self.lr * 500.0).clamp(0.25, 8.0);
        let uniform_mask = drag_mask.is_uniform();
        let (mw, mh) = drag_mask.dimensions();

        let mut converged = true;
        for (src, tgt) in sources.iter_mut().zip(targets.iter()) {
            let dr = tgt[0] - src[0];
            let dc = tgt[1] - src[1];
            let dist = (dr * dr + dc * dc).sqrt();
            if dist > r1 {
                converged = false;
            }
            if dist <= f32::EPSILON {
                continue;
            }
            let advance = step_px.min(dist);
            let mr = dr / dist * advance;
            let mc = dc / dist * advance;
            src[0] += mr;
            src[1] += mc;

            // carry blobs within the search radius along the same motion;
            // blobs outside the drag region relax back to their anchors
            let reach = r2.max(1.0) * 4.0;
            for (bi, blob) in params.latent.chunks_exact_mut(BLOB_STRIDE).enumerate() {
                let br = blob[0] - src[0];
                let bc = blob[1] - src[1];
                let w = (-(br * br + bc * bc) / (2.0 * reach * reach)).exp();
                let col = (blob[1].max(0.0) as u32).min(mw.saturating_sub(1));
                let row = (blob[0].max(0.0) as u32).min(mh.saturating_sub(1));
                let movable = uniform_mask || drag_mask.get(col, row) == 0;
                if movable {
                    blob[0] += mr * w;
                    blob[1] += mc * w;
                } else {
                    // fixed-region pull, stronger for larger lambda
                    let k = (motion_lambda / 20.0).clamp(0.0, 1.0) * 0.5;
                    blob[0] += (refs[bi][0] - blob[0]) * k;
                    blob[1] += (refs[bi][1] - blob[1]) * k;
                }
            }
        }

        params.image = Arc::new(self.rasterize(&params.latent));
        params.stop = converged;
        Ok(converged)
    }

    fn update_learning_rate(&mut self, lr: f32) {
        self.lr = lr;
    }

    fn reset_feature_refs(&mut self) {
        self.feat_refs = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> InitSpec {
        InitSpec {
            checkpoint: "builtin_lions".to_owned(),
            path: None,
            seed: 7,
            latent_space: LatentSpace::WPlus,
            trunc_psi: 0.7,
            trunc_cutoff: None,
            lr: 0.001,
        }
    }

    #[test]
    fn test_init_is_deterministic() {
        let mut r = BlobRenderer::new();
        let a = r.init(&spec()).unwrap();
        let b = r.init(&spec()).unwrap();
        assert_eq!(a.latent, b.latent);
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn test_different_seed_different_latent() {
        let mut r = BlobRenderer::new();
        let a = r.init(&spec()).unwrap();
        let mut other = spec();
        other.seed = 8;
        let b = r.init(&other).unwrap();
        assert_ne!(a.latent, b.latent);
    }

    #[test]
    fn test_missing_checkpoint_file_fails() {
        let mut r = BlobRenderer::new();
        let mut s = spec();
        s.path = Some(std::path::PathBuf::from("/nonexistent/model.pkl"));
        assert!(matches!(
            r.init(&s),
            Err(RendererError::ResourceInit { .. })
        ));
    }

    #[test]
    fn test_step_converges_within_r1() {
        let mut r = BlobRenderer::new();
        let mut params = r.init(&spec()).unwrap();
        r.update_learning_rate(0.01); // 5 px per step

        let mask = MaskBuffer::new_full(RESOLUTION, RESOLUTION);
        let drag = mask.invert_for_drag();
        let mut sources = vec![[100.0, 100.0]];
        let mut targets = vec![[100.0, 120.0]];

        let mut stopped = false;
        for _ in 0..20 {
            if r.step(&mut params, &mut sources, &mut targets, &drag, 20.0, 3.0, 12.0, 0.7)
                .unwrap()
            {
                stopped = true;
                break;
            }
        }
        assert!(stopped, "drag of 20 px at 5 px/step must converge");
        let d = (targets[0][1] - sources[0][1]).abs();
        assert!(d <= 3.0, "source ended {d} px from target");
    }

    #[test]
    fn test_step_mutates_image() {
        let mut r = BlobRenderer::new();
        let mut params = r.init(&spec()).unwrap();
        let before = params.image.clone();
        r.update_learning_rate(0.05); // clamped to the 8 px max step

        let drag = MaskBuffer::new_full(RESOLUTION, RESOLUTION).invert_for_drag();
        let mut sources = vec![[64.0, 64.0]];
        let mut targets = vec![[64.0, 200.0]];
        r.step(&mut params, &mut sources, &mut targets, &drag, 20.0, 3.0, 12.0, 0.7)
            .unwrap();
        assert_ne!(params.image, before);
    }

    #[test]
    fn test_uninitialized_params_rejected() {
        let mut r = BlobRenderer::new();
        let mut params = GeneratorParams::default();
        assert!(matches!(
            r.render(&mut params),
            Err(RendererError::Uninitialized)
        ));
    }
}
