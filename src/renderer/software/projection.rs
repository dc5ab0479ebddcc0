use crate::engine::types::Screen;

/// Vertical extent of one wall column (or billboard) on screen.
///
/// `top`/`bottom` are the unclipped projected edges; `draw_start..draw_end`
/// is the visible, rounded, half-open row span.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WallSlab {
    pub top: f32,
    pub bottom: f32,
    pub draw_start: usize,
    pub draw_end: usize,
}

impl WallSlab {
    /// Project a unit-tall surface `distance` ray-units away.
    ///
    /// ```text
    /// top    = vs + (zH − H) / d + H/2
    /// bottom = vs +  zH      / d + H/2
    /// ```
    /// with `z` the eye height and `vs` the vertical look offset in pixels.
    pub fn project(distance: f32, eye_height: f32, vertical_offset: f32, screen: &Screen) -> Self {
        let h = screen.h as f32;
        let zh = eye_height * h;
        let top = vertical_offset + (zh - h) / distance + screen.half_h;
        let bottom = vertical_offset + zh / distance + screen.half_h;

        // f32::max/min drop a NaN operand, so d == 0 still yields a valid span
        let draw_start = top.max(0.0).min(h).round() as usize;
        let draw_end = bottom.min(h).max(0.0).round() as usize;
        Self {
            top,
            bottom,
            draw_start,
            draw_end: draw_end.max(draw_start),
        }
    }

    /// Collapse to nothing at the floor line.
    #[inline]
    pub fn collapse(&mut self) {
        self.draw_start = self.draw_end;
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    /// Texture `v` of screen row `y`.
    #[inline]
    pub fn v_at(&self, y: usize) -> f32 {
        let span = self.height();
        if span.is_finite() && span > 0.0 {
            ((y as f32 + 0.5 - self.top) / span).clamp(0.0, 0.999_999)
        } else {
            0.0
        }
    }
}
