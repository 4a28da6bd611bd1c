// binary edit-region mask
//
// one cell per pixel of the base image, values in {0,1}: 1 = free to edit,
// 0 = must stay fixed. freshly initialized to all ones whenever the base
// image changes; brush strokes are folded in against the mode they were
// painted under.

use crate::mode::EditingMode;

#[derive(Clone, Debug, PartialEq)]
pub struct MaskBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl MaskBuffer {
    /// all-ones mask, the placeholder state after an image (re)init
    pub fn new_full(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![1; (width * height) as usize],
        }
    }

    /// all-zeros buffer, used for capturing brush strokes
    pub fn new_empty(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; (width * height) as usize],
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y * self.width + x) as usize]
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// re-initialize to all ones at the given size; called whenever the
    /// base image is replaced
    pub fn reset_to_full(&mut self, width: u32, height: u32) {
        *self = Self::new_full(width, height);
    }

    /// untouched all-ones state
    pub fn is_placeholder(&self) -> bool {
        self.data.iter().all(|&v| v == 1)
    }

    pub fn any_set(&self) -> bool {
        self.data.iter().any(|&v| v != 0)
    }

    /// all zero or all one; a uniform mask carries no region worth overlaying
    pub fn is_uniform(&self) -> bool {
        self.data.iter().all(|&v| v == 0) || self.is_placeholder()
    }

    /// fold a captured brush stroke into the mask under the given mode:
    /// add = union, remove = saturating difference, anything else = no-op.
    /// a placeholder mask is seeded from the stroke directly; combining
    /// against an untouched full mask would be degenerate.
    pub fn apply_edit(&mut self, brush: &MaskBuffer, mode: EditingMode) {
        if !matches!(mode, EditingMode::AddMask | EditingMode::RemoveMask) {
            log::info!("last editing mode is {mode:?}, do nothing to mask");
            return;
        }
        debug_assert_eq!((self.width, self.height), (brush.width, brush.height));

        if self.is_placeholder() {
            self.data.copy_from_slice(&brush.data);
            log::info!("mask seeded from brush stroke ({mode:?})");
            return;
        }

        match mode {
            EditingMode::AddMask => {
                for (m, b) in self.data.iter_mut().zip(&brush.data) {
                    *m = (*m + *b).min(1);
                }
                log::info!("last editing mode is add_mask, do add");
            }
            EditingMode::RemoveMask => {
                for (m, b) in self.data.iter_mut().zip(&brush.data) {
                    *m = m.saturating_sub(*b);
                }
                log::info!("last editing mode is remove_mask, do remove");
            }
            _ => unreachable!(),
        }
    }

    /// complement handed to the drag optimizer: 1 where pixels must stay
    /// fixed, 0 over the editable region
    pub fn invert_for_drag(&self) -> MaskBuffer {
        MaskBuffer {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| 1 - v).collect(),
        }
    }

    /// stamp a filled circle of ones, clipped to the buffer bounds
    pub fn paint_circle(&mut self, cx: f32, cy: f32, radius: f32) {
        let r2 = radius * radius;
        let x0 = (cx - radius).floor().max(0.0) as u32;
        let y0 = (cy - radius).floor().max(0.0) as u32;
        let x1 = ((cx + radius).ceil() as u32).min(self.width.saturating_sub(1));
        let y1 = ((cy + radius).ceil() as u32).min(self.height.saturating_sub(1));
        for y in y0..=y1 {
            for x in x0..=x1 {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= r2 {
                    self.data[(y * self.width + x) as usize] = 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stroke_10x10(w: u32, h: u32) -> MaskBuffer {
        let mut brush = MaskBuffer::new_empty(w, h);
        for y in 20..30 {
            for x in 40..50 {
                brush.data[(y * w + x) as usize] = 1;
            }
        }
        brush
    }

    #[test]
    fn test_placeholder_seeded_from_stroke() {
        let mut mask = MaskBuffer::new_full(100, 100);
        let brush = stroke_10x10(100, 100);
        mask.apply_edit(&brush, EditingMode::AddMask);
        // seeded, not unioned with the all-ones placeholder
        assert_eq!(mask, brush);
        assert_eq!(mask.data.iter().map(|&v| v as u32).sum::<u32>(), 100);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut mask = MaskBuffer::new_full(100, 100);
        let brush = stroke_10x10(100, 100);
        mask.apply_edit(&brush, EditingMode::AddMask);
        let once = mask.clone();
        mask.apply_edit(&brush, EditingMode::AddMask);
        assert_eq!(mask, once);
    }

    #[test]
    fn test_add_then_remove_same_region() {
        let mut mask = MaskBuffer::new_empty(100, 100);
        let brush = stroke_10x10(100, 100);
        mask.apply_edit(&brush, EditingMode::AddMask);
        assert!(mask.any_set());
        mask.apply_edit(&brush, EditingMode::RemoveMask);
        assert!(!mask.any_set());
    }

    #[test]
    fn test_other_modes_are_noops() {
        let mut mask = MaskBuffer::new_empty(50, 50);
        let brush = MaskBuffer::new_full(50, 50);
        mask.apply_edit(&brush, EditingMode::AddPoints);
        mask.apply_edit(&brush, EditingMode::Running);
        assert!(!mask.any_set());
    }

    #[test]
    fn test_invert_round_trip() {
        let mut mask = MaskBuffer::new_full(64, 64);
        let brush = stroke_10x10(64, 64);
        mask.apply_edit(&brush, EditingMode::AddMask);
        assert_eq!(mask.invert_for_drag().invert_for_drag(), mask);
    }

    #[test]
    fn test_invert_values() {
        let mask = MaskBuffer::new_full(4, 4);
        let drag = mask.invert_for_drag();
        assert!(drag.data.iter().all(|&v| v == 0));
    }

    #[test]
    fn test_uniform_detection() {
        let mut mask = MaskBuffer::new_full(8, 8);
        assert!(mask.is_uniform());
        mask.data[3] = 0;
        assert!(!mask.is_uniform());
    }

    #[test]
    fn test_paint_circle_clips_to_bounds() {
        let mut brush = MaskBuffer::new_empty(20, 20);
        brush.paint_circle(0.0, 0.0, 5.0);
        assert!(brush.any_set());
        assert_eq!(brush.get(0, 0), 1);
        assert_eq!(brush.get(19, 19), 0);
    }
}
