use glam::{IVec2, Vec2};

use crate::world::texture::TextureId;

/// Camera-facing billboard standing on the floor, one cell wide.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    pub pos: Vec2,
    pub texture: TextureId,
}

impl Sprite {
    pub fn new(pos: Vec2, texture: TextureId) -> Self {
        Self { pos, texture }
    }
}

/// A push-wall in transit: a 1×1 obstacle sliding between two cells.
///
/// It is not part of the grid while it moves; rays and collision test it
/// separately.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PushBlock {
    pub from: IVec2,
    pub to: IVec2,
    /// 0 at `from`, 1 at `to`.
    pub progress: f32,
    pub texture: TextureId,
}

impl PushBlock {
    pub fn new(from: IVec2, to: IVec2, texture: TextureId) -> Self {
        Self {
            from,
            to,
            progress: 0.0,
            texture,
        }
    }

    /// Current top-left corner.
    #[inline]
    pub fn corner(&self) -> Vec2 {
        self.from.as_vec2().lerp(self.to.as_vec2(), self.progress.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn arrived(&self) -> bool {
        self.progress >= 1.0
    }

    /// Every cell the footprint currently overlaps (one or two).
    pub fn cells(&self) -> [IVec2; 2] {
        if self.progress <= 0.0 {
            [self.from, self.from]
        } else if self.arrived() {
            [self.to, self.to]
        } else {
            [self.from, self.to]
        }
    }
}
