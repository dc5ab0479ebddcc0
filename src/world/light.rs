use glam::{IVec2, Vec2, Vec3};

/// Index into [`crate::world::Grid::lights`].
pub type LightId = u16;

/// A point light.
///
/// Lights are *multipliers*: an `rgb` of `(1, 1, 1)` doubles a texel that is
/// already lit by ambient 1.0.  Contribution falls linearly from `rgb` at the
/// light to zero at `radius`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Light {
    pub pos: Vec2,
    pub rgb: Vec3,
    pub radius: f32,
    /// Shadowed lights are tested per surface; the rest are baked.
    pub casts_shadows: bool,
}

impl Light {
    pub fn new(pos: Vec2, rgb: Vec3, radius: f32, casts_shadows: bool) -> Self {
        Self {
            pos,
            rgb,
            radius,
            casts_shadows,
        }
    }

    /// Cell the light sits in.
    #[inline]
    pub fn cell(&self) -> IVec2 {
        self.pos.floor().as_ivec2()
    }

    /// Linear falloff factor at `distance`: 1 at the light, 0 at or past `radius`.
    #[inline]
    pub fn falloff(&self, distance: f32) -> f32 {
        if self.radius <= 0.0 {
            return 0.0;
        }
        (1.0 - distance / self.radius).max(0.0)
    }

    /// `rgb * falloff(distance)`.
    #[inline]
    pub fn contribution(&self, distance: f32) -> Vec3 {
        self.rgb * self.falloff(distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contribution_spans_full_to_zero() {
        let l = Light::new(Vec2::new(3.5, 3.5), Vec3::new(0.2, 0.4, 0.8), 4.0, false);
        assert_eq!(l.contribution(0.0), l.rgb);
        assert_eq!(l.contribution(4.0), Vec3::ZERO);
        assert_eq!(l.contribution(9.0), Vec3::ZERO);
        assert!((l.contribution(2.0) - l.rgb * 0.5).length() < 1e-6);
    }

    #[test]
    fn cell_is_floor_of_position() {
        let l = Light::new(Vec2::new(7.9, 0.1), Vec3::ONE, 1.0, true);
        assert_eq!(l.cell(), IVec2::new(7, 0));
    }
}
