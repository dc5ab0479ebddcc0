//! Procedural session map: random rubble inside a solid border, a walled
//! room with four doors at the centre, a few push-walls, lights and props.
//!
//! Deterministic for a given seed.

use glam::{IVec2, Vec2, Vec3};
use tracing::info;

use crate::{
    config::EngineConfig,
    world::{
        Camera, Cell, CellKind, Grid, GridBuilder, GridError, Light, Sprite, Texture,
        TextureBank, TextureError, TextureId,
    },
};

const TEX_SIZE: usize = 64;
/// Chance for a cell to flip between wall and floor.
const FLIP_CHANCE: f32 = 0.15;
/// Fraction of random walls that turn out to be push-walls.
const PUSH_CHANCE: f32 = 0.1;

#[derive(Clone, Debug)]
pub struct DemoOptions {
    pub size: i32,
    pub seed: u64,
    pub lights: usize,
    pub sprites: usize,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            size: 32,
            seed: 1,
            lights: 6,
            sprites: 8,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Everything a session starts from.
#[derive(Debug)]
pub struct DemoLevel {
    pub grid: Grid,
    pub bank: TextureBank,
    pub sprites: Vec<Sprite>,
    pub spawn: Camera,
}

struct Palette {
    wall: TextureId,
    floor: TextureId,
    leaf: TextureId,
    frame: TextureId,
    push: TextureId,
    prop: TextureId,
}

pub fn generate(opts: &DemoOptions, cfg: &EngineConfig) -> Result<DemoLevel, DemoError> {
    let mut rng = fastrand::Rng::with_seed(opts.seed);
    let mut bank = TextureBank::new();
    let pal = textures(&mut bank, &mut rng)?;

    let size = opts.size;
    let mut b = GridBuilder::new(size)?;
    b.fill_textures(pal.wall, pal.floor);

    let half = size / 2;
    for x in 0..size {
        for y in 0..size {
            let at = IVec2::new(x, y);
            let d = (at - IVec2::splat(half)).as_vec2().length();
            let edge = x == 0 || y == 0 || x == size - 1 || y == size - 1;
            let mut solid = edge;
            if rng.f32() < FLIP_CHANCE {
                solid = !solid;
            }
            if d < 4.0 {
                solid = false;
            }

            let kind = if d < 3.0 {
                central_room(at - IVec2::splat(half))
            } else if solid && !edge && rng.f32() < PUSH_CHANCE {
                CellKind::PushableWall
            } else if solid {
                CellKind::Wall
            } else {
                CellKind::Empty
            };

            match kind {
                CellKind::DoorAlongX | CellKind::DoorAlongY => {
                    b.door(at, kind, pal.leaf, pal.frame)?;
                }
                CellKind::PushableWall => {
                    b.set(at, Cell::new(kind, pal.push, pal.floor))?;
                }
                _ => {
                    b.set_kind(at, kind)?;
                }
            }
        }
    }
    b.border(CellKind::Wall, pal.wall, pal.floor);

    for _ in 0..opts.lights {
        let Some(at) = random_empty(&b, &mut rng) else { break };
        let rgb = Vec3::new(rng.f32(), rng.f32(), rng.f32());
        let radius = rng.f32() * 7.0 + 1.0;
        let shadows = rng.bool();
        b.light(Light::new(at.as_vec2() + 0.5, rgb, radius, shadows))?;
    }

    let mut sprites = Vec::with_capacity(opts.sprites);
    for _ in 0..opts.sprites {
        let Some(at) = random_empty(&b, &mut rng) else { break };
        if (at - IVec2::splat(half)).as_vec2().length() < 3.0 {
            continue;
        }
        sprites.push(Sprite::new(at.as_vec2() + 0.5, pal.prop));
    }

    let grid = b.build(cfg)?;
    info!(
        size,
        seed = opts.seed,
        sprites = sprites.len(),
        textures = bank.len(),
        "demo level generated"
    );
    Ok(DemoLevel {
        grid,
        bank,
        sprites,
        spawn: Camera::new(Vec2::splat(half as f32 + 0.5), 0.0),
    })
}

/// Ring wall two cells out from the centre with a door on each axis.
fn central_room(rel: IVec2) -> CellKind {
    let (ax, ay) = (rel.x.abs(), rel.y.abs());
    if ax == 2 && ay == 0 {
        CellKind::DoorAlongY
    } else if ax == 0 && ay == 2 {
        CellKind::DoorAlongX
    } else if ax == 2 || ay == 2 {
        CellKind::Wall
    } else {
        CellKind::Empty
    }
}

fn random_empty(b: &GridBuilder, rng: &mut fastrand::Rng) -> Option<IVec2> {
    (0..100).find_map(|_| {
        let at = IVec2::new(rng.i32(0..b.size()), rng.i32(0..b.size()));
        b.cell(at)
            .filter(|c| c.kind == CellKind::Empty)
            .map(|_| at)
    })
}

/*──────────────────────── procedural textures ─────────────────────────*/

fn textures(bank: &mut TextureBank, rng: &mut fastrand::Rng) -> Result<Palette, TextureError> {
    Ok(Palette {
        wall: bank.insert("BRICK", bricks([150, 70, 50], rng))?,
        floor: bank.insert("FLAGSTONE", tiles([90, 90, 100], 4, rng))?,
        leaf: bank.insert("DOOR", planks([120, 80, 40], rng))?,
        frame: bank.insert("DOORFRAME", tiles([70, 70, 80], 8, rng))?,
        push: bank.insert("PUSHWALL", bricks([110, 90, 60], rng))?,
        prop: bank.insert("PILLAR", pillar([180, 180, 170]))?,
    })
}

fn jitter(base: [u8; 3], rng: &mut fastrand::Rng, amount: i32) -> [u8; 4] {
    let mut j = |c: u8| (c as i32 + rng.i32(-amount..=amount)).clamp(0, 255) as u8;
    [j(base[0]), j(base[1]), j(base[2]), 255]
}

fn paint(mut f: impl FnMut(usize, usize) -> [u8; 4]) -> Texture {
    let mut px = Vec::with_capacity(TEX_SIZE * TEX_SIZE * 4);
    for y in 0..TEX_SIZE {
        for x in 0..TEX_SIZE {
            px.extend_from_slice(&f(x, y));
        }
    }
    Texture {
        w: TEX_SIZE,
        h: TEX_SIZE,
        pixels: px,
    }
}

fn bricks(base: [u8; 3], rng: &mut fastrand::Rng) -> Texture {
    paint(|x, y| {
        let row = y / 8;
        let shift = if row % 2 == 0 { 0 } else { 8 };
        if y % 8 == 0 || (x + shift) % 16 == 0 {
            [60, 60, 60, 255]
        } else {
            jitter(base, rng, 12)
        }
    })
}

fn tiles(base: [u8; 3], cells: usize, rng: &mut fastrand::Rng) -> Texture {
    let pitch = TEX_SIZE / cells;
    paint(|x, y| {
        if x % pitch == 0 || y % pitch == 0 {
            [40, 40, 45, 255]
        } else {
            jitter(base, rng, 8)
        }
    })
}

fn planks(base: [u8; 3], rng: &mut fastrand::Rng) -> Texture {
    paint(|x, _| {
        if x % 16 == 0 {
            [50, 30, 15, 255]
        } else {
            jitter(base, rng, 6)
        }
    })
}

/// Round column on the transparent key.
fn pillar(base: [u8; 3]) -> Texture {
    paint(|x, _| {
        let d = (x as f32 + 0.5 - TEX_SIZE as f32 / 2.0).abs() / (TEX_SIZE as f32 / 4.0);
        if d > 1.0 {
            [152, 0, 136, 255]
        } else {
            let k = 1.0 - 0.5 * d * d;
            let c = |v: u8| (v as f32 * k) as u8;
            [c(base[0]), c(base[1]), c(base[2]), 255]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(seed: u64) -> DemoLevel {
        let opts = DemoOptions {
            size: 24,
            seed,
            ..DemoOptions::default()
        };
        generate(&opts, &EngineConfig::default()).unwrap()
    }

    #[test]
    fn same_seed_same_map() {
        let a = level(7);
        let b = level(7);
        for y in 0..24 {
            for x in 0..24 {
                let at = IVec2::new(x, y);
                assert_eq!(a.grid.cell(at).map(|c| c.kind), b.grid.cell(at).map(|c| c.kind));
            }
        }
        assert_eq!(a.sprites, b.sprites);
    }

    #[test]
    fn border_is_solid_and_spawn_is_open() {
        let l = level(3);
        for i in 0..24 {
            for at in [IVec2::new(i, 0), IVec2::new(0, i), IVec2::new(i, 23), IVec2::new(23, i)] {
                assert_eq!(l.grid.cell(at).unwrap().kind, CellKind::Wall, "{at}");
            }
        }
        assert_eq!(l.grid.cell_at(l.spawn.pos()).unwrap().kind, CellKind::Empty);
    }

    #[test]
    fn central_room_has_four_doors() {
        let l = level(11);
        assert_eq!(l.grid.doors().len(), 4);
        assert_eq!(l.grid.cell(IVec2::new(14, 12)).unwrap().kind, CellKind::DoorAlongY);
        assert_eq!(l.grid.cell(IVec2::new(12, 10)).unwrap().kind, CellKind::DoorAlongX);
        assert_eq!(l.grid.cell(IVec2::new(14, 14)).unwrap().kind, CellKind::Wall);
    }

    #[test]
    fn pillar_edges_are_keyed() {
        let t = pillar([200, 200, 200]);
        assert_eq!(t.texel(0, 0), [152, 0, 136, 255]);
        assert_ne!(t.texel(32, 0), [152, 0, 136, 255]);
    }
}
