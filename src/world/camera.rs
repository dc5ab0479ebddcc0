use glam::Vec2;

/// Player view-point on the grid.
///
/// * `pos` is continuous grid space (cell `(x, y)` covers `[x, x+1) × [y, y+1)`).
/// * `yaw` 0 faces +X; positive turns toward +Y, which is screen-right.
/// * `look` in `[-1, 1]` slides the horizon by half a screen height.
/// * `height` is eye height as a fraction of the wall height.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pos: Vec2,
    yaw: f32,
    look: f32,
    height: f32,
}

impl Camera {
    pub const DEFAULT_HEIGHT: f32 = 0.6;

    /// Create a camera at `pos`, facing `yaw`, level look, default eye height.
    pub fn new(pos: Vec2, yaw: f32) -> Self {
        Self {
            pos,
            yaw,
            look: 0.0,
            height: Self::DEFAULT_HEIGHT,
        }
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    #[inline]
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn yaw(&self) -> f32 {
        self.yaw
    }

    #[inline]
    pub fn look(&self) -> f32 {
        self.look
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.height
    }

    /// Vertical look, clamped to `[-1, 1]`.
    pub fn set_look(&mut self, look: f32) {
        self.look = look.clamp(-1.0, 1.0);
    }

    /// Transform a world point into camera-local coords:
    ///  .x = depth along the forward axis
    ///  .y = lateral offset (+ right)
    #[inline]
    pub fn to_cam(&self, p: Vec2) -> Vec2 {
        Vec2::from_angle(-self.yaw).rotate(p - self.pos)
    }

    /*──────────────────────── derived vectors ───────────────────────*/

    /// Unit vector pointing where the camera looks.
    #[inline(always)]
    pub fn forward(self) -> Vec2 {
        Vec2::from_angle(self.yaw)
    }

    /// Unit vector pointing to the camera's right.
    #[inline(always)]
    pub fn right(self) -> Vec2 {
        self.forward().perp()
    }

    /*──────────────────────── movement helpers ──────────────────────*/

    /// World displacement for `forward` units ahead and `side` to the right.
    #[inline]
    pub fn step_delta(self, forward: f32, side: f32) -> Vec2 {
        self.forward() * forward + self.right() * side
    }

    /// Move by an already resolved world delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.pos += delta;
    }

    /// Rotate (positive = turn right).
    pub fn turn(&mut self, delta_yaw: f32) {
        self.yaw = (self.yaw + delta_yaw).rem_euclid(std::f32::consts::TAU);
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn forward_and_right_are_orthonormal() {
        let cam = Camera::new(Vec2::ZERO, 0.3);
        let f = cam.forward();
        let r = cam.right();
        assert!((f.length() - 1.0).abs() < 1e-5);
        assert!((r.length() - 1.0).abs() < 1e-5);
        assert!((f.dot(r)).abs() < 1e-5);
    }

    #[test]
    fn to_cam_axes_align() {
        let cam = Camera::new(Vec2::ZERO, 0.0);
        // straight ahead at (10, 0) → (depth=10, lateral=0)
        assert!((cam.to_cam(Vec2::new(10.0, 0.0)) - Vec2::new(10.0, 0.0)).length() < 1e-5);
        // to the right at (0, 5) → (depth=0, lateral=5)
        assert!((cam.to_cam(Vec2::new(0.0, 5.0)) - Vec2::new(0.0, 5.0)).length() < 1e-5);
    }

    #[test]
    fn to_cam_rotated_yaw() {
        let cam = Camera::new(Vec2::new(1.0, 1.0), FRAC_PI_2);
        // yaw = 90°: forward is +Y
        assert!((cam.to_cam(Vec2::new(1.0, 11.0)) - Vec2::new(10.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn turn_wraps_and_look_clamps() {
        let mut cam = Camera::new(Vec2::ZERO, 6.0);
        cam.turn(1.0);
        assert!((0.0..std::f32::consts::TAU).contains(&cam.yaw()));
        cam.set_look(3.0);
        assert_eq!(cam.look(), 1.0);
    }

    #[test]
    fn step_delta_follows_heading() {
        let cam = Camera::new(Vec2::ZERO, FRAC_PI_2);
        let d = cam.step_delta(2.0, 0.0);
        assert!((d - Vec2::new(0.0, 2.0)).length() < 1e-5);
        let s = cam.step_delta(0.0, 1.0);
        assert!((s - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }
}
