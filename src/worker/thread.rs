//! Worker-side loop: owns a world copy and a [`Software`] render context.

use std::{sync::Arc, time::Instant};

use crossbeam_channel::{Receiver, Sender};
use tracing::{debug, info};

use super::protocol::{DrawRequest, FrameOutput, InitPayload, Request, Response};
use crate::{
    config::EngineConfig,
    renderer::{RendererExt, Scene, Software},
    world::{Grid, Sprite, TextureBank},
};

struct WorldCopy {
    grid: Grid,
    bank: Arc<TextureBank>,
    sprites: Vec<Sprite>,
    width: usize,
    height: usize,
    cfg: EngineConfig,
}

impl From<InitPayload> for WorldCopy {
    fn from(p: InitPayload) -> Self {
        Self {
            grid: p.grid,
            bank: p.bank,
            sprites: p.sprites,
            width: p.width,
            height: p.height,
            cfg: p.cfg,
        }
    }
}

/// Runs until `Shutdown`, or until either channel end is dropped.
pub(super) fn run(requests: Receiver<Request>, responses: Sender<Response>) {
    let mut world: Option<WorldCopy> = None;
    let mut ctx = Software::default();

    while let Ok(req) = requests.recv() {
        let reply = match req {
            Request::Init(payload) => {
                let copy = WorldCopy::from(*payload);
                debug!(
                    size = copy.grid.size(),
                    width = copy.width,
                    height = copy.height,
                    "worker world replaced"
                );
                world = Some(copy);
                Response::Ready
            }
            Request::Draw(draw) => match world.as_mut() {
                Some(w) => Response::Frame(render(w, &mut ctx, draw)),
                None => Response::Rejected { frame: draw.frame },
            },
            Request::Shutdown => break,
        };
        if responses.send(reply).is_err() {
            break;
        }
    }
    info!("frame worker stopped");
}

fn render(world: &mut WorldCopy, ctx: &mut Software, draw: DrawRequest) -> FrameOutput {
    let start = Instant::now();
    for delta in &draw.deltas {
        world.grid.apply(delta);
    }

    let mut scene = Scene::new(
        &world.grid,
        &world.bank,
        &world.sprites,
        &draw.camera,
        draw.projection,
        &world.cfg,
    );
    scene.push_block = draw.push_block.as_ref();
    scene.row_step = draw.row_step;

    let mut pixels = Vec::new();
    ctx.draw_frame(world.width, world.height, &scene, |fb, _, _| {
        pixels.extend_from_slice(fb);
    });

    FrameOutput {
        frame: draw.frame,
        pixels,
        width: world.width,
        height: world.height,
        rays_cast: ctx.rays_cast(),
        row_step: draw.row_step,
        render_time: start.elapsed(),
    }
}
