//! Top-down debug overlay drawn straight into a finished RGBA frame.

use glam::{IVec2, Vec2};

use crate::{
    renderer::Rgba,
    world::{Camera, CellKind, Grid, PushBlock},
};

#[derive(Clone, Copy, Debug)]
pub struct MinimapStyle {
    /// Pixels per grid cell.
    pub cell_px: usize,
    /// Top-left corner of the map on screen.
    pub offset: (usize, usize),
    pub wall: Rgba,
    pub door: Rgba,
    pub player: Rgba,
}

impl Default for MinimapStyle {
    fn default() -> Self {
        Self {
            cell_px: 4,
            offset: (4, 4),
            wall: [160, 160, 160, 255],
            door: [200, 140, 40, 255],
            player: [255, 255, 0, 255],
        }
    }
}

/// Borrowed frame with bounds-checked plotting.
struct Canvas<'a> {
    buf: &'a mut [u8],
    w: usize,
    h: usize,
}

impl Canvas<'_> {
    #[inline]
    fn put(&mut self, x: i32, y: i32, c: Rgba) {
        if (0..self.w as i32).contains(&x) && (0..self.h as i32).contains(&y) {
            let i = (y as usize * self.w + x as usize) * 4;
            if let Some(dst) = self.buf.get_mut(i..i + 4) {
                dst.copy_from_slice(&c);
            }
        }
    }

    fn rect(&mut self, x: i32, y: i32, size: i32, c: Rgba) {
        for dy in 0..size {
            for dx in 0..size {
                self.put(x + dx, y + dy, c);
            }
        }
    }

    /// Bresenham.
    fn line(&mut self, mut x0: i32, mut y0: i32, x1: i32, y1: i32, c: Rgba) {
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put(x0, y0, c);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }
}

fn lerp_rgba(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    [mix(a[0], b[0]), mix(a[1], b[1]), mix(a[2], b[2]), 255]
}

/// Walls, doors (fading toward the floor colour as they open), lights, the
/// in-flight push-block and the player with a facing line.
pub fn draw_minimap(
    buf: &mut [u8],
    w: usize,
    h: usize,
    grid: &Grid,
    camera: &Camera,
    push: Option<&PushBlock>,
    style: &MinimapStyle,
) {
    let mut canvas = Canvas { buf, w, h };
    let px = style.cell_px.max(1) as i32;
    let (ox, oy) = (style.offset.0 as i32, style.offset.1 as i32);
    let to_screen = |p: Vec2| {
        (
            ox + (p.x * px as f32) as i32,
            oy + (p.y * px as f32) as i32,
        )
    };

    for y in 0..grid.size() {
        for x in 0..grid.size() {
            let at = IVec2::new(x, y);
            let Some(cell) = grid.cell(at) else { continue };
            let c = match cell.kind {
                CellKind::Empty => continue,
                CellKind::Wall | CellKind::PushableWall => style.wall,
                CellKind::DoorAlongX | CellKind::DoorAlongY => {
                    lerp_rgba(style.door, [0, 0, 0, 255], cell.openness)
                }
            };
            canvas.rect(ox + x * px, oy + y * px, px, c);
        }
    }

    for light in grid.lights() {
        let (sx, sy) = to_screen(light.pos);
        let c = light.rgb.clamp(glam::Vec3::ZERO, glam::Vec3::ONE) * 255.0;
        canvas.rect(sx - 1, sy - 1, 2, [c.x as u8, c.y as u8, c.z as u8, 255]);
    }

    if let Some(block) = push {
        let (sx, sy) = to_screen(block.corner());
        canvas.rect(sx, sy, px, style.wall);
    }

    let (sx, sy) = to_screen(camera.pos());
    let (fx, fy) = to_screen(camera.pos() + camera.forward());
    canvas.line(sx, sy, fx, fy, style.player);
    canvas.rect(sx - 1, sy - 1, 3, style.player);
}
