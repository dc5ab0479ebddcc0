use glam::Vec2;

use crate::{
    engine::types::Screen,
    renderer::{
        Scene,
        software::{Software, WallSlab, shade},
    },
    world::{TRANSPARENT_KEY, TextureId},
};

/// A sprite projected to screen space, ready to be clipped and drawn.
#[derive(Clone, Copy, Debug)]
pub struct VisSprite {
    pub left: f32,  // unclipped screen X of the left edge
    pub right: f32, // unclipped screen X of the right edge
    pub slab: WallSlab,
    pub dist: f32, // ray-unit distance, compared against the depth buffer
    pub tex: TextureId,
    pub pos: Vec2, // world position, for the baked light lookup
}

#[inline]
fn is_transparent(texel: [u8; 4]) -> bool {
    texel[3] == 0 || texel[..3] == TRANSPARENT_KEY
}

impl Software {
    /// Billboards, farthest first, each column clipped by the wall depth.
    pub(super) fn draw_sprites(&mut self, scene: &Scene<'_>) {
        if scene.sprites.is_empty() {
            return;
        }
        let Some(screen) = self.screen else { return };
        let cam_pos = scene.camera.pos();

        let mut order = std::mem::take(&mut self.order);
        order.clear();
        order.extend(
            scene
                .sprites
                .iter()
                .enumerate()
                .map(|(i, s)| ((s.pos - cam_pos).length_squared(), i)),
        );
        order.sort_by(|a, b| b.0.total_cmp(&a.0));

        for &(_, i) in &order {
            if let Some(vis) = project_sprite(scene, &screen, i) {
                self.draw_vis_sprite(scene, &screen, &vis);
            }
        }
        self.order = order;
    }

    fn draw_vis_sprite(&mut self, scene: &Scene<'_>, screen: &Screen, vis: &VisSprite) {
        let x0 = vis.left.floor().max(0.0) as usize;
        let x1 = (vis.right.ceil().max(0.0) as usize).min(screen.w);
        let width = vis.right - vis.left;
        if x0 >= x1 || width <= 0.0 {
            return;
        }

        // one lighting value for the whole billboard
        let light = scene.ambient / (vis.dist + 1.0) + scene.grid.baked().sample(vis.pos);

        for x in x0..x1 {
            if self.depth[x] <= vis.dist {
                continue;
            }
            let u = (x as f32 + 0.5 - vis.left) / width;
            for y in vis.slab.draw_start..vis.slab.draw_end {
                let texel = scene.bank.sample(vis.tex, u, vis.slab.v_at(y));
                if is_transparent(texel) {
                    continue;
                }
                self.put(x, y, shade(texel, light));
            }
        }
    }
}

/// Camera-space projection of sprite `i`; `None` when behind the camera or
/// entirely off-screen.
fn project_sprite(scene: &Scene<'_>, screen: &Screen, i: usize) -> Option<VisSprite> {
    let sprite = scene.sprites.get(i)?;
    let cam = scene.camera;
    let proj = scene.projection;

    // camera space -------------------------------------------------------
    let rel = cam.to_cam(sprite.pos);
    if rel.x <= 0.0 {
        return None;
    }
    let dist = proj.ray_distance(rel.x);

    // screen space -------------------------------------------------------
    let scale = screen.w as f32 / (dist * proj.aspect_ratio);
    let centre = screen.half_w + rel.y * scale;
    let half = 0.5 * scale;
    let (left, right) = (centre - half, centre + half);
    if right < 0.0 || left >= screen.w as f32 {
        return None;
    }

    let vs = screen.half_h * cam.look();
    Some(VisSprite {
        left,
        right,
        slab: WallSlab::project(dist, cam.height(), vs, screen),
        dist,
        tex: sprite.texture,
        pos: sprite.pos,
    })
}

/*──────────────────────────────── Tests ───────────────────────────────*/
