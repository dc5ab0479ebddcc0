use glam::Vec2;

/// Constants that depend on the *frame-buffer*, not on the map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Screen {
    pub w: usize,
    pub h: usize,
    pub half_h: f32, // pre-derived for speed
    pub half_w: f32, // pre-derived for speed
}

impl Screen {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            half_w: w as f32 * 0.5,
            half_h: h as f32 * 0.5,
        }
    }

    #[inline]
    pub fn pixels(&self) -> usize {
        self.w * self.h
    }
}

/// Perspective constants shipped with every draw request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
    /// Width / height of the output.
    pub aspect_ratio: f32,
    /// Forward length of every column ray; larger is a narrower field of view.
    pub projection_length: f32,
}

impl Projection {
    pub const DEFAULT_LENGTH: f32 = 0.8;

    pub fn for_screen(screen: &Screen, projection_length: f32) -> Self {
        Self {
            aspect_ratio: screen.w as f32 / screen.h.max(1) as f32,
            projection_length,
        }
    }

    /// Camera-space direction of column `x`, rotated by `yaw`.
    ///
    /// ```text
    /// dir = rotate((P, A · (x − W/2) / W), yaw)
    /// ```
    #[inline]
    pub fn column_ray(&self, screen: &Screen, x: usize, yaw: f32) -> Vec2 {
        let base = Vec2::new(
            self.projection_length,
            self.aspect_ratio * ((x as f32 - screen.half_w) / screen.w as f32),
        );
        Vec2::from_angle(yaw).rotate(base)
    }

    /// One direction per screen column, written into `out`.
    pub fn screen_rays(&self, screen: &Screen, yaw: f32, out: &mut Vec<Vec2>) {
        out.clear();
        out.extend((0..screen.w).map(|x| self.column_ray(screen, x, yaw)));
    }

    /// Camera-space depth divided into ray distance units.
    #[inline]
    pub fn ray_distance(&self, depth: f32) -> f32 {
        depth / self.projection_length
    }
}
