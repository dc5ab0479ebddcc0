pub mod builder;
pub mod camera;
pub mod demo;
pub mod grid;
pub mod light;
pub mod sprite;
pub mod texture;

pub use builder::GridBuilder;
pub use camera::Camera;
pub use demo::{DemoLevel, DemoOptions};
pub use grid::{Cell, CellDelta, CellKind, Door, Grid, GridError, LightList};
pub use light::{Light, LightId};
pub use sprite::{PushBlock, Sprite};
pub use texture::{
    FALLBACK_COLOR, NO_TEXTURE, TRANSPARENT_KEY, Texture, TextureBank, TextureError, TextureId,
};
