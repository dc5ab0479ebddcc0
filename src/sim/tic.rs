use std::time::{Duration, Instant};

use glam::IVec2;
use tracing::debug;

use super::{InputCmd, collision, doors, push};
use crate::{
    config::EngineConfig,
    engine::ray::cast,
    world::{Camera, CellDelta, CellKind, Grid, PushBlock},
};

pub const SIM_FPS: u32 = 60;
pub const TIC_MS: f32 = 1000.0 / SIM_FPS as f32;
const TIC: Duration = Duration::from_micros(1_000_000 / SIM_FPS as u64);

/// What the use action found in front of the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UseOutcome {
    Nothing,
    Door(IVec2),
    Push(IVec2),
}

/// Primary-side game state: the authoritative grid plus the player.
pub struct Game {
    grid: Grid,
    camera: Camera,
    push: Option<PushBlock>,
    cfg: EngineConfig,
    /// Cells modified since the last [`Game::take_deltas`].
    dirty: Vec<IVec2>,
}

impl Game {
    pub fn new(grid: Grid, camera: Camera, cfg: EngineConfig) -> Self {
        Self {
            grid,
            camera,
            push: None,
            cfg,
            dirty: Vec::new(),
        }
    }

    #[inline]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    #[inline]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    pub fn push_block(&self) -> Option<&PushBlock> {
        self.push.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// One simulation step of `dt_ms`: turn, move, use, doors, push-wall.
    pub fn tick(&mut self, input: &InputCmd, dt_ms: f32) {
        let cfg = &self.cfg;

        self.camera.turn(input.turn() * cfg.turn_speed_per_ms * dt_ms);
        self.camera.set_look(input.look());

        let wish = self.camera.step_delta(
            input.forward() * cfg.move_speed_per_ms * dt_ms,
            input.strafe() * cfg.move_speed_per_ms * dt_ms,
        );
        if wish != glam::Vec2::ZERO {
            let applied = collision::resolve_movement(
                &self.grid,
                self.camera.pos(),
                wish,
                self.push.as_ref(),
                cfg,
            );
            self.camera.translate(applied);
        }

        if input.use_act() {
            self.use_action();
        }

        let here = self.camera.pos().floor().as_ivec2();
        doors::update(&mut self.grid, dt_ms, &[here], &self.cfg, &mut self.dirty);

        if let Some(block) = self.push.as_mut() {
            if push::advance(block, &mut self.grid, dt_ms, &self.cfg) {
                self.dirty.push(block.to);
                self.push = None;
            }
        }
    }

    /// Open a door or start a push-wall directly ahead, within reach.
    pub fn use_action(&mut self) -> UseOutcome {
        let facing = self.camera.forward();
        let ray = cast(&self.grid, self.camera.pos(), facing, None);
        let Some(at) = ray.last_cell() else {
            return UseOutcome::Nothing;
        };
        if ray.distance >= self.cfg.use_reach {
            return UseOutcome::Nothing;
        }
        let kind = self.grid.cell(at).map(|c| c.kind);
        match kind {
            Some(k) if k.is_door() => {
                doors::trigger(&mut self.grid, at);
                debug!(%at, "door used");
                UseOutcome::Door(at)
            }
            Some(CellKind::PushableWall) if self.push.is_none() => {
                match push::try_push(&mut self.grid, at, facing) {
                    Some(block) => {
                        self.dirty.push(at);
                        self.push = Some(block);
                        UseOutcome::Push(at)
                    }
                    None => UseOutcome::Nothing,
                }
            }
            _ => UseOutcome::Nothing,
        }
    }

    /// Drain modified cells as by-value deltas, one per coordinate.
    pub fn take_deltas(&mut self) -> Vec<CellDelta> {
        let mut seen = Vec::with_capacity(self.dirty.len());
        for at in self.dirty.drain(..) {
            if !seen.contains(&at) {
                seen.push(at);
            }
        }
        seen.into_iter().filter_map(|at| self.grid.delta(at)).collect()
    }
}

/// Drives [`Game`] at a fixed tick rate from wall-clock time.
pub struct TicRunner {
    game: Game,
    last: Instant,
}

impl TicRunner {
    pub fn new(game: Game) -> Self {
        Self {
            game,
            last: Instant::now(),
        }
    }

    #[inline]
    pub fn game(&self) -> &Game {
        &self.game
    }

    #[inline]
    pub fn game_mut(&mut self) -> &mut Game {
        &mut self.game
    }

    /// Advance enough tics to synchronise simulation with real time.
    /// `USE` is honoured on the first tic only.  Returns the tics run.
    pub fn pump(&mut self, input: &InputCmd) -> u32 {
        let mut cmd = *input;
        let mut tics = 0;
        while self.last.elapsed() >= TIC {
            self.game.tick(&cmd, TIC_MS);
            cmd.held.remove(super::Buttons::USE);
            self.last += TIC;
            tics += 1;
        }
        tics
    }
}
