//! Rendering abstraction layer.
//!
//! *Game logic never touches a pixel buffer directly.*
//! It describes the frame as a [`Scene`] (a read-only snapshot) and hands it
//! to a type that implements [`Renderer`].
//!
//! * The frame worker owns a back-end and feeds it one scene per request.
//! * A helper blanket-impl [`RendererExt`] adds `draw_frame` so call-sites
//!   stay short.

use glam::Vec3;

use crate::{
    config::EngineConfig,
    engine::types::Projection,
    world::{Camera, Grid, PushBlock, Sprite, texture::TextureBank},
};

/// Pixel format of the frame-buffer: **RGBA**, 4 bytes per pixel, row-major.
pub type Rgba = [u8; 4];

/// Everything one frame reads.  Nothing in here is mutated while drawing.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    pub grid: &'a Grid,
    pub bank: &'a TextureBank,
    pub sprites: &'a [Sprite],
    pub camera: &'a Camera,
    pub projection: Projection,
    pub push_block: Option<&'a PushBlock>,
    /// Floor rows between two lighting evaluations (1 = every row).
    pub row_step: u32,
    pub ambient: Vec3,
    pub sky_rgb: [u8; 3],
}

impl<'a> Scene<'a> {
    /// Scene with lighting/sky constants taken from `cfg`.
    pub fn new(
        grid: &'a Grid,
        bank: &'a TextureBank,
        sprites: &'a [Sprite],
        camera: &'a Camera,
        projection: Projection,
        cfg: &EngineConfig,
    ) -> Self {
        Self {
            grid,
            bank,
            sprites,
            camera,
            projection,
            push_block: None,
            row_step: 1,
            ambient: cfg.ambient,
            sky_rgb: cfg.sky_rgb,
        }
    }
}

/// A renderer that owns an internal scratch buffer for the whole frame.
///
/// `end_frame` hands the finished buffer to a user-supplied closure.
pub trait Renderer {
    /// (Re)allocate internal scratch for the requested resolution and clear it.
    fn begin_frame(&mut self, width: usize, height: usize);

    /// Walls, floor and sky for every column, then the sprites.
    fn draw_scene(&mut self, scene: &Scene<'_>);

    /// Finish the frame and **loan** the finished buffer to `submit`.
    ///
    /// * `submit(&[u8], w, h)` is run exactly once per frame.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[u8], usize, usize);
}

/// Convenience blanket-impl with a one-liner `draw_frame` adaptor.
pub trait RendererExt: Renderer {
    fn draw_frame<F>(&mut self, width: usize, height: usize, scene: &Scene<'_>, submit: F)
    where
        F: FnOnce(&[u8], usize, usize),
    {
        self.begin_frame(width, height);
        self.draw_scene(scene);
        self.end_frame(submit);
    }
}
impl<T: Renderer + ?Sized> RendererExt for T {}

pub mod software;

pub use software::Software;
