pub mod lighting;
pub mod ray;
pub mod types;

pub use lighting::{AdaptiveSampler, BakedLightField, light_at};
pub use ray::{
    CastOptions, RayResult, Surface, Tile, TileMap, back_off, cap_ray, cast, cast_with, slide_ray,
};
pub use types::{Projection, Screen};
