//! Grid DDA ray intersector.
//!
//! Rays walk the grid one cell at a time, always stepping along whichever
//! axis reaches its next grid line first (ties step Y).  Distances are
//! *parametric*: a ray with direction of length `L` that stops at `distance`
//! has travelled `distance * L` world units.  Collision code relies on this to
//! express "one frame of movement" as `distance == 1`.
//!
//! Every function here is total: zero direction components use an infinite
//! crossing distance, origins outside the grid yield a zero-length edge hit,
//! and runaway walks are cut off after [`MAX_RAY_STEPS`].

use glam::{IVec2, Vec2};
use smallvec::{SmallVec, smallvec};

use crate::config::{DOOR_PLANE_OFFSET, MAX_RAY_STEPS};
use crate::world::CellKind;

/// Everything the intersector needs to know about one cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub kind: CellKind,
    pub openness: f32,
}

impl Tile {
    pub const EMPTY: Tile = Tile {
        kind: CellKind::Empty,
        openness: 0.0,
    };
    pub const WALL: Tile = Tile {
        kind: CellKind::Wall,
        openness: 0.0,
    };
}

/// Anything a ray can walk: the world grid, or the collision resolver's
/// supersampled local grid.
pub trait TileMap {
    /// Width/height in cells.
    fn dims(&self) -> IVec2;

    /// Tile at `at`; only called for in-bounds coordinates.
    fn tile(&self, at: IVec2) -> Tile;

    #[inline]
    fn in_bounds(&self, at: IVec2) -> bool {
        let d = self.dims();
        at.x >= 0 && at.y >= 0 && at.x < d.x && at.y < d.y
    }
}

/// What stopped the ray.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Surface {
    /// Entered a solid cell.
    Wall,
    /// Struck the closed part of a door leaf.
    Door,
    /// Struck the dynamic push-block.
    PushBlock,
    /// Left the grid, started outside it, or exceeded the step cap.
    Edge,
    /// Reached `max_distance` (or had no direction) without hitting anything.
    Open,
}

/// Traversed cells, front-to-back from the origin.
pub type Cells = SmallVec<[IVec2; 32]>;

#[derive(Clone, Debug, PartialEq)]
pub struct RayResult {
    pub origin: Vec2,
    pub dir: Vec2,
    /// Parametric distance (direction-vector units).
    pub distance: f32,
    pub hit: Vec2,
    /// Position along the struck face, in `[0, 1)`.
    pub tex_u: f32,
    /// `true` when the struck face lies on a line of constant X.
    pub x_side: bool,
    pub hit_map_edge: bool,
    pub surface: Surface,
    pub cells: Cells,
}

impl RayResult {
    fn degenerate(origin: Vec2, dir: Vec2, surface: Surface) -> Self {
        Self {
            origin,
            dir,
            distance: 0.0,
            hit: origin,
            tex_u: 0.0,
            x_side: false,
            hit_map_edge: surface == Surface::Edge,
            surface,
            cells: SmallVec::new(),
        }
    }

    /// Cell the ray ended in (the wall itself for [`Surface::Wall`]).
    #[inline]
    pub fn last_cell(&self) -> Option<IVec2> {
        self.cells.last().copied()
    }

    /// Cell entered just before [`Self::last_cell`].
    #[inline]
    pub fn second_last_cell(&self) -> Option<IVec2> {
        let n = self.cells.len();
        if n >= 2 { Some(self.cells[n - 2]) } else { None }
    }

    /// Open cell in front of the struck surface; lighting is looked up here.
    pub fn lit_cell(&self) -> Option<IVec2> {
        match self.surface {
            Surface::Wall | Surface::Edge => self.second_last_cell().or(self.last_cell()),
            Surface::Door | Surface::PushBlock | Surface::Open => self.last_cell(),
        }
    }

    /// Drop trailing cells so the list ends in the cell containing `p`.
    fn truncate_to(&mut self, p: Vec2) {
        let at = p.floor().as_ivec2();
        while self.cells.len() > 1 && self.cells.last() != Some(&at) {
            self.cells.pop();
        }
    }
}

/// Optional behaviour switches for [`cast_with`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CastOptions {
    /// Stop walking once this parametric distance has been reached.
    pub max_distance: Option<f32>,
    /// Ignore door leaves entirely.
    pub walls_only: bool,
    /// Top-left corner of a dynamic 1×1 obstacle that is not in the grid.
    pub push_block: Option<Vec2>,
}

/// Cast with default options and an optional distance cap.
pub fn cast(map: &impl TileMap, origin: Vec2, dir: Vec2, max_distance: Option<f32>) -> RayResult {
    cast_with(
        map,
        origin,
        dir,
        &CastOptions {
            max_distance,
            ..Default::default()
        },
    )
}

pub fn cast_with(map: &impl TileMap, origin: Vec2, dir: Vec2, opts: &CastOptions) -> RayResult {
    let mut cell = origin.floor().as_ivec2();
    if !map.in_bounds(cell) || !origin.is_finite() {
        return RayResult::degenerate(origin, dir, Surface::Edge);
    }
    if dir == Vec2::ZERO || !dir.is_finite() {
        let mut r = RayResult::degenerate(origin, dir, Surface::Open);
        r.cells.push(cell);
        return r;
    }

    let step = IVec2::new(
        if dir.x > 0.0 { 1 } else { -1 },
        if dir.y > 0.0 { 1 } else { -1 },
    );
    // next grid line on each axis
    let mut next = Vec2::new(
        if step.x > 0 { cell.x as f32 + 1.0 } else { cell.x as f32 },
        if step.y > 0 { cell.y as f32 + 1.0 } else { cell.y as f32 },
    );
    let max = opts.max_distance.unwrap_or(f32::INFINITY);

    let mut cur = origin;
    let mut length = 0.0_f32;
    let mut x_side = false;
    let mut surface = Surface::Open;
    let mut cells: Cells = smallvec![cell];
    let mut tile = map.tile(cell);
    let mut steps = 0;

    while length < max {
        /* -- door leaf inside the current cell ------------------------ */
        if !opts.walls_only {
            if let Some(door) = door_hit(origin, dir, cell, tile, step) {
                let mut r = RayResult {
                    origin,
                    dir,
                    distance: door.t,
                    hit: door.point,
                    tex_u: door.u,
                    x_side: door.x_side,
                    hit_map_edge: false,
                    surface: Surface::Door,
                    cells,
                };
                apply_push_block(&mut r, opts.push_block);
                return r;
            }
        }

        /* -- advance to the nearest grid line ------------------------- */
        let dist_x = if dir.x == 0.0 {
            f32::INFINITY
        } else {
            ((next.x - cur.x) / dir.x).max(0.0)
        };
        let dist_y = if dir.y == 0.0 {
            f32::INFINITY
        } else {
            ((next.y - cur.y) / dir.y).max(0.0)
        };

        x_side = dist_x < dist_y;
        if x_side {
            length += dist_x;
            cur = Vec2::new(next.x, origin.y + dir.y * length);
            next.x += step.x as f32;
            cell.x += step.x;
        } else {
            length += dist_y;
            cur = Vec2::new(origin.x + dir.x * length, next.y);
            next.y += step.y as f32;
            cell.y += step.y;
        }
        steps += 1;

        if !map.in_bounds(cell) {
            surface = Surface::Edge;
            break;
        }
        tile = map.tile(cell);
        cells.push(cell);
        if tile.kind.is_solid() {
            surface = Surface::Wall;
            break;
        }
        if steps >= MAX_RAY_STEPS {
            surface = Surface::Edge;
            break;
        }
    }

    let u = if x_side {
        cur.y * step.x as f32
    } else {
        -cur.x * step.y as f32
    };

    let mut r = RayResult {
        origin,
        dir,
        distance: length,
        hit: cur,
        tex_u: u - u.floor(),
        x_side,
        hit_map_edge: surface == Surface::Edge,
        surface,
        cells,
    };
    apply_push_block(&mut r, opts.push_block);
    r
}

/// Clamp a ray to one unit of parametric length.  Idempotent.
pub fn cap_ray(mut r: RayResult) -> RayResult {
    r.distance = r.distance.min(1.0);
    r.hit = r.origin + r.dir * r.distance;
    r
}

/// Hit point pulled back toward the origin by `amount` map units, never past
/// the origin itself.
pub fn back_off(r: &RayResult, amount: f32) -> Vec2 {
    let len = r.dir.length();
    if len == 0.0 || !len.is_finite() {
        return r.hit;
    }
    let pull = amount.min(r.distance * len).max(0.0);
    r.hit - r.dir / len * pull
}

/// Continue a blocked movement ray along the struck wall.
///
/// Starts `backoff` map units behind the hit, keeps only the part of the
/// remaining movement parallel to the struck face, and stops at one unit.
pub fn slide_ray(map: &impl TileMap, r: &RayResult, backoff: f32) -> RayResult {
    let origin = back_off(r, backoff);
    let mut dir = r.dir * (1.0 - r.distance).max(0.0);
    if r.x_side {
        dir.x = 0.0;
    } else {
        dir.y = 0.0;
    }
    cast(map, origin, dir, Some(1.0))
}

/*──────────────────────── surface tests ──────────────────────────────*/

struct FaceHit {
    t: f32,
    point: Vec2,
    u: f32,
    x_side: bool,
}

/// Intersect the closed part of a door leaf.
///
/// A `DoorAlongX` leaf lies on the cell's horizontal mid-line and covers
/// `x ∈ [cell.x + openness, cell.x + 1]`; `DoorAlongY` is the same rotated.
/// The plane is nudged toward the ray origin by [`DOOR_PLANE_OFFSET`].
fn door_hit(origin: Vec2, dir: Vec2, cell: IVec2, tile: Tile, step: IVec2) -> Option<FaceHit> {
    match tile.kind {
        CellKind::DoorAlongX => {
            if dir.y == 0.0 {
                return None;
            }
            let off = if step.y > 0 { -DOOR_PLANE_OFFSET } else { DOOR_PLANE_OFFSET };
            let wall_y = cell.y as f32 + 0.5 + off;
            let t = (wall_y - origin.y) / dir.y;
            let hx = origin.x + dir.x * t;
            let x1 = cell.x as f32 + tile.openness;
            let x2 = cell.x as f32 + 1.0;
            (t > 0.0 && hx >= x1 && hx <= x2).then(|| FaceHit {
                t,
                point: Vec2::new(hx, wall_y),
                u: (hx - x1).clamp(0.0, 1.0 - f32::EPSILON),
                x_side: false,
            })
        }
        CellKind::DoorAlongY => {
            if dir.x == 0.0 {
                return None;
            }
            let off = if step.x > 0 { -DOOR_PLANE_OFFSET } else { DOOR_PLANE_OFFSET };
            let wall_x = cell.x as f32 + 0.5 + off;
            let t = (wall_x - origin.x) / dir.x;
            let hy = origin.y + dir.y * t;
            let y1 = cell.y as f32 + tile.openness;
            let y2 = cell.y as f32 + 1.0;
            (t > 0.0 && hy >= y1 && hy <= y2).then(|| FaceHit {
                t,
                point: Vec2::new(wall_x, hy),
                u: (hy - y1).clamp(0.0, 1.0 - f32::EPSILON),
                x_side: true,
            })
        }
        _ => None,
    }
}

/// Nearest of the four faces of the 1×1 block at `corner`, if closer than `limit`.
fn push_block_hit(origin: Vec2, dir: Vec2, corner: Vec2, limit: f32) -> Option<FaceHit> {
    let far = corner + Vec2::ONE;
    let mut best: Option<FaceHit> = None;
    let mut best_t = limit;

    if dir.y != 0.0 {
        for (edge_y, flip) in [(corner.y, true), (far.y, false)] {
            let t = (edge_y - origin.y) / dir.y;
            let hx = origin.x + dir.x * t;
            if hx >= corner.x && hx <= far.x && t > 0.0 && t < best_t {
                let u = hx - corner.x;
                best_t = t;
                best = Some(FaceHit {
                    t,
                    point: Vec2::new(hx, edge_y),
                    u: if flip { 1.0 - u } else { u },
                    x_side: false,
                });
            }
        }
    }
    if dir.x != 0.0 {
        for (edge_x, flip) in [(corner.x, false), (far.x, true)] {
            let t = (edge_x - origin.x) / dir.x;
            let hy = origin.y + dir.y * t;
            if hy >= corner.y && hy <= far.y && t > 0.0 && t < best_t {
                let u = hy - corner.y;
                best_t = t;
                best = Some(FaceHit {
                    t,
                    point: Vec2::new(edge_x, hy),
                    u: if flip { 1.0 - u } else { u },
                    x_side: true,
                });
            }
        }
    }
    best
}

fn apply_push_block(r: &mut RayResult, block: Option<Vec2>) {
    let Some(corner) = block else { return };
    let Some(face) = push_block_hit(r.origin, r.dir, corner, r.distance) else {
        return;
    };
    r.distance = face.t;
    r.hit = face.point;
    r.tex_u = face.u.clamp(0.0, 1.0 - f32::EPSILON);
    r.x_side = face.x_side;
    r.hit_map_edge = false;
    r.surface = Surface::PushBlock;
    // stop the traversal in front of the block
    r.truncate_to(face.point - r.dir * 1e-4);
}

/*──────────────────────────────── Tests ───────────────────────────────*/
#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Tiny ASCII map: `#` wall, `.` empty, `-` door along X, `|` door along Y.
    /// First string is row `y = 0`.
    pub(crate) struct Ascii {
        w: i32,
        h: i32,
        tiles: Vec<Tile>,
    }

    impl Ascii {
        pub(crate) fn parse(rows: &[&str]) -> Self {
            let h = rows.len() as i32;
            let w = rows[0].len() as i32;
            let mut tiles = vec![Tile::EMPTY; (w * h) as usize];
            for (y, row) in rows.iter().enumerate() {
                for (x, ch) in row.chars().enumerate() {
                    let kind = match ch {
                        '#' => CellKind::Wall,
                        '-' => CellKind::DoorAlongX,
                        '|' => CellKind::DoorAlongY,
                        _ => CellKind::Empty,
                    };
                    tiles[y * w as usize + x] = Tile {
                        kind,
                        openness: 0.0,
                    };
                }
            }
            Self { w, h, tiles }
        }

        pub(crate) fn set_openness(&mut self, at: IVec2, openness: f32) {
            self.tiles[(at.y * self.w + at.x) as usize].openness = openness;
        }
    }

    impl TileMap for Ascii {
        fn dims(&self) -> IVec2 {
            IVec2::new(self.w, self.h)
        }
        fn tile(&self, at: IVec2) -> Tile {
            self.tiles[(at.y * self.w + at.x) as usize]
        }
    }

    fn boxed(n: usize) -> Vec<String> {
        (0..n)
            .map(|y| {
                (0..n)
                    .map(|x| {
                        if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
                            '#'
                        } else {
                            '.'
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn bordered(n: usize) -> Ascii {
        let rows = boxed(n);
        let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
        Ascii::parse(&refs)
    }

    #[test]
    fn straight_ray_hits_far_wall() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(1.5, 1.5), Vec2::X, None);
        assert_eq!(r.surface, Surface::Wall);
        assert!(!r.hit_map_edge);
        assert!((r.distance - 5.5).abs() < 1e-5);
        assert!(r.x_side);
        assert!((r.tex_u - 0.5).abs() < 1e-5);
        assert_eq!(r.cells.first(), Some(&IVec2::new(1, 1)));
        assert_eq!(r.last_cell(), Some(IVec2::new(7, 1)));
        assert_eq!(r.lit_cell(), Some(IVec2::new(6, 1)));
        assert_eq!(r.cells.len(), 7);
    }

    #[test]
    fn zero_component_is_never_crossed() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(2.5, 1.5), Vec2::new(0.0, 1.0), None);
        assert!((r.distance - 5.5).abs() < 1e-5);
        assert!(!r.x_side);
        assert!((r.hit.x - 2.5).abs() < 1e-6);
    }

    #[test]
    fn distance_is_in_direction_units() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(1.5, 1.5), Vec2::new(2.0, 0.0), None);
        assert!((r.distance - 2.75).abs() < 1e-5);
        assert!((r.hit.x - 7.0).abs() < 1e-5);
    }

    #[test]
    fn origin_outside_grid_is_degenerate() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(-0.5, 3.0), Vec2::X, None);
        assert_eq!(r.distance, 0.0);
        assert!(r.hit_map_edge);
        assert!(r.cells.is_empty());
        assert_eq!(r.hit, r.origin);
    }

    #[test]
    fn zero_direction_is_total() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(3.5, 3.5), Vec2::ZERO, None);
        assert_eq!(r.distance, 0.0);
        assert!(!r.hit_map_edge);
        assert_eq!(r.surface, Surface::Open);
    }

    #[test]
    fn open_map_reports_edge() {
        let map = Ascii::parse(&["....", "....", "....", "...."]);
        let r = cast(&map, Vec2::new(0.5, 0.5), Vec2::new(1.0, 0.3), None);
        assert!(r.hit_map_edge);
        assert!(r.distance.is_finite());
    }

    #[test]
    fn bordered_grid_never_reports_edge_from_inside() {
        let map = bordered(12);
        for i in 0..360 {
            let a = (i as f32).to_radians();
            let dir = Vec2::new(a.cos(), a.sin());
            for origin in [Vec2::new(5.5, 5.5), Vec2::new(1.01, 9.99), Vec2::new(6.0, 6.0)] {
                let r = cast(&map, origin, dir, None);
                assert!(r.distance.is_finite(), "angle {i}");
                assert!(!r.hit_map_edge, "angle {i} from {origin}");
                assert_eq!(r.surface, Surface::Wall);
                assert!((0.0..1.0).contains(&r.tex_u));
            }
        }
    }

    #[test]
    fn max_distance_stops_walk() {
        let map = bordered(16);
        let r = cast(&map, Vec2::new(1.5, 1.5), Vec2::new(0.4, 0.0), Some(1.0));
        assert_eq!(r.surface, Surface::Open);
        assert!(!r.hit_map_edge);
        assert!(r.distance >= 1.0);
        assert!(r.distance < 14.0 / 0.4);
    }

    #[test]
    fn cap_ray_is_idempotent() {
        let map = bordered(16);
        let r = cast(&map, Vec2::new(1.5, 1.5), Vec2::new(0.3, 0.2), Some(1.0));
        let once = cap_ray(r);
        let twice = cap_ray(once.clone());
        assert_eq!(once.hit, twice.hit);
        assert_eq!(once.distance, twice.distance);
        assert!(once.distance <= 1.0);
        assert!((once.hit - Vec2::new(1.8, 1.7)).length() < 1e-5);
    }

    #[test]
    fn closed_door_blocks_open_door_passes() {
        let mut map = Ascii::parse(&[
            "#######", //
            "#.....#", //
            "#..|..#", //
            "#.....#", //
            "#######",
        ]);
        let door = IVec2::new(3, 2);
        let closed = cast(&map, Vec2::new(1.5, 2.5), Vec2::X, None);
        assert_eq!(closed.surface, Surface::Door);
        assert!((closed.hit.x - (3.5 - DOOR_PLANE_OFFSET)).abs() < 1e-5);
        assert!(closed.x_side);
        assert_eq!(closed.last_cell(), Some(door));

        map.set_openness(door, 1.0);
        let open = cast(&map, Vec2::new(1.5, 2.5), Vec2::X, None);
        assert_eq!(open.surface, Surface::Wall);
        assert!((open.hit.x - 6.0).abs() < 1e-5);
        assert!(open.cells.contains(&door));
    }

    #[test]
    fn half_open_door_blocks_only_the_closed_part() {
        let mut map = Ascii::parse(&["#####", "#.-.#", "#...#", "#####"]);
        map.set_openness(IVec2::new(2, 1), 0.5);
        // passes through the open half (x < 2.5)
        let through = cast(&map, Vec2::new(2.25, 2.5), Vec2::new(0.0, -1.0), None);
        assert_eq!(through.surface, Surface::Wall);
        // strikes the closed half (x ≥ 2.5)
        let blocked = cast(&map, Vec2::new(2.75, 2.5), Vec2::new(0.0, -1.0), None);
        assert_eq!(blocked.surface, Surface::Door);
        assert!((blocked.tex_u - 0.25).abs() < 1e-5);
        assert!(!blocked.x_side);
    }

    #[test]
    fn door_leaf_tex_u_stays_below_one() {
        let map = Ascii::parse(&["#####", "#.-.#", "#...#", "#####"]);
        let mut hits = 0;
        // sweep across the far edge of the closed leaf at x = 3
        for i in 0..=2000 {
            let dx = 0.40 + i as f32 * 0.0001;
            let r = cast(&map, Vec2::new(2.5, 2.5), Vec2::new(dx, -1.0), None);
            if r.surface == Surface::Door {
                hits += 1;
                assert!((0.0..1.0).contains(&r.tex_u), "dx {dx}: u {}", r.tex_u);
            }
        }
        assert!(hits > 0);
    }

    #[test]
    fn back_off_never_passes_the_origin() {
        let map = bordered(8);
        let r = cast(&map, Vec2::new(6.5, 3.5), Vec2::new(2.0, 0.0), Some(1.0));
        assert!((r.hit.x - 7.0).abs() < 1e-5);
        assert!((back_off(&r, 0.01).x - 6.99).abs() < 1e-5);
        // pulling back further than the ray travelled stops at the origin
        assert!((back_off(&r, 5.0) - r.origin).length() < 1e-5);
    }

    #[test]
    fn walls_only_ignores_doors() {
        let map = Ascii::parse(&["#####", "#.|.#", "#####"]);
        let opts = CastOptions {
            walls_only: true,
            ..Default::default()
        };
        let r = cast_with(&map, Vec2::new(1.5, 1.5), Vec2::X, &opts);
        assert_eq!(r.surface, Surface::Wall);
        assert!((r.hit.x - 4.0).abs() < 1e-5);
    }

    #[test]
    fn push_block_overrides_farther_wall() {
        let map = bordered(10);
        let opts = CastOptions {
            push_block: Some(Vec2::new(4.0, 1.0)),
            ..Default::default()
        };
        let r = cast_with(&map, Vec2::new(1.5, 1.5), Vec2::X, &opts);
        assert_eq!(r.surface, Surface::PushBlock);
        assert!((r.distance - 2.5).abs() < 1e-5);
        assert!(r.x_side);
        assert_eq!(r.last_cell(), Some(IVec2::new(3, 1)));

        // a block behind the wall never wins
        let behind = CastOptions {
            push_block: Some(Vec2::new(12.0, 1.0)),
            ..Default::default()
        };
        let r = cast_with(&map, Vec2::new(1.5, 1.5), Vec2::X, &behind);
        assert_eq!(r.surface, Surface::Wall);
    }

    #[test]
    fn slide_ray_keeps_parallel_component() {
        let map = bordered(8);
        // moving diagonally into the east wall from close by
        let first = cap_ray(cast(&map, Vec2::new(6.5, 3.5), Vec2::new(1.0, 0.5), Some(1.0)));
        assert!(first.distance < 1.0);
        assert!(first.x_side);
        let slide = cap_ray(slide_ray(&map, &first, 0.01));
        assert_eq!(slide.dir.x, 0.0);
        assert!(slide.hit.y > first.hit.y);
        assert!(slide.hit.x < 7.0);
    }
}
