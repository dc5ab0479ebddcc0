//! Messages exchanged between the primary thread and the frame worker.
//!
//! Everything is sent by value; the only shared data is the texture bank,
//! which is immutable once loaded and travels as an `Arc`.

use std::{sync::Arc, time::Duration};

use crate::{
    config::EngineConfig,
    engine::types::Projection,
    world::{Camera, CellDelta, Grid, PushBlock, Sprite, TextureBank},
};

/// Primary → worker.
#[derive(Debug)]
pub enum Request {
    /// Replace the worker's world copy and output size.  Answered by
    /// [`Response::Ready`].
    Init(Box<InitPayload>),
    /// Apply `deltas`, then render one frame.  Answered by
    /// [`Response::Frame`] (or [`Response::Rejected`] before `Init`).
    Draw(DrawRequest),
    Shutdown,
}

#[derive(Debug)]
pub struct InitPayload {
    pub grid: Grid,
    pub bank: Arc<TextureBank>,
    pub sprites: Vec<Sprite>,
    pub width: usize,
    pub height: usize,
    pub cfg: EngineConfig,
}

#[derive(Clone, Debug)]
pub struct DrawRequest {
    pub frame: u64,
    pub camera: Camera,
    pub projection: Projection,
    /// Cells changed since the previous draw, one entry per coordinate.
    pub deltas: Vec<CellDelta>,
    pub push_block: Option<PushBlock>,
    pub row_step: u32,
}

/// Worker → primary.
#[derive(Debug)]
pub enum Response {
    Ready,
    Frame(FrameOutput),
    Rejected { frame: u64 },
}

/// A finished frame plus the statistics that drive adaptive sampling.
#[derive(Debug)]
pub struct FrameOutput {
    pub frame: u64,
    /// RGBA, row-major, `width * height * 4` bytes.
    pub pixels: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub rays_cast: u32,
    /// Floor-lighting row step the frame was drawn with.
    pub row_step: u32,
    pub render_time: Duration,
}
