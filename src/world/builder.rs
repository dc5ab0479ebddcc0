use std::time::Instant;

use glam::IVec2;
use tracing::{debug, info};

use crate::{
    config::{EngineConfig, MAX_GRID_SIZE},
    engine::lighting::{self, BakedLightField},
    world::{
        grid::{Cell, CellKind, Door, Grid, GridError},
        light::{Light, LightId},
        texture::TextureId,
    },
};

/// Mutable staging area for a [`Grid`].
///
/// Map generators poke cells and lights in any order; [`GridBuilder::build`]
/// then registers doors, bakes the ambient field and runs the shadow pass.
#[derive(Clone, Debug)]
pub struct GridBuilder {
    size: i32,
    cells: Vec<Cell>,
    lights: Vec<Light>,
}

impl GridBuilder {
    pub fn new(size: i32) -> Result<Self, GridError> {
        if !(1..=MAX_GRID_SIZE).contains(&size) {
            return Err(GridError::BadSize(size));
        }
        Ok(Self {
            size,
            cells: vec![Cell::default(); (size * size) as usize],
            lights: Vec::new(),
        })
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    fn index(&self, at: IVec2) -> Result<usize, GridError> {
        if at.x < 0 || at.y < 0 || at.x >= self.size || at.y >= self.size {
            return Err(GridError::OutOfBounds(at, self.size));
        }
        Ok((at.y * self.size + at.x) as usize)
    }

    pub fn cell(&self, at: IVec2) -> Option<&Cell> {
        self.index(at).ok().map(|i| &self.cells[i])
    }

    /// Paint every cell's wall and floor texture without touching kinds.
    pub fn fill_textures(&mut self, wall_tex: TextureId, floor_tex: TextureId) -> &mut Self {
        for c in &mut self.cells {
            c.wall_tex = wall_tex;
            c.inner_wall_tex = wall_tex;
            c.floor_tex = floor_tex;
        }
        self
    }

    pub fn set(&mut self, at: IVec2, cell: Cell) -> Result<&mut Self, GridError> {
        let i = self.index(at)?;
        self.cells[i] = cell;
        Ok(self)
    }

    /// Change a cell's kind, keeping its textures.
    pub fn set_kind(&mut self, at: IVec2, kind: CellKind) -> Result<&mut Self, GridError> {
        let i = self.index(at)?;
        self.cells[i].kind = kind;
        Ok(self)
    }

    pub fn set_floor(&mut self, at: IVec2, floor_tex: TextureId) -> Result<&mut Self, GridError> {
        let i = self.index(at)?;
        self.cells[i].floor_tex = floor_tex;
        Ok(self)
    }

    /// Force the outer ring of cells to `kind`.
    pub fn border(&mut self, kind: CellKind, wall_tex: TextureId, floor_tex: TextureId) -> &mut Self {
        let n = self.size;
        for y in 0..n {
            for x in 0..n {
                if x == 0 || y == 0 || x == n - 1 || y == n - 1 {
                    let c = &mut self.cells[(y * n + x) as usize];
                    *c = Cell::new(kind, wall_tex, floor_tex);
                }
            }
        }
        self
    }

    /// Place a closed door.  `leaf_tex` is drawn on the leaf itself,
    /// `frame_tex` on the walls seen through the open doorway.
    pub fn door(
        &mut self,
        at: IVec2,
        kind: CellKind,
        leaf_tex: TextureId,
        frame_tex: TextureId,
    ) -> Result<&mut Self, GridError> {
        debug_assert!(kind.is_door());
        let i = self.index(at)?;
        let c = &mut self.cells[i];
        c.kind = kind;
        c.wall_tex = leaf_tex;
        c.inner_wall_tex = frame_tex;
        c.openness = 0.0;
        Ok(self)
    }

    pub fn light(&mut self, light: Light) -> Result<LightId, GridError> {
        let id = self.lights.len();
        if id >= LightId::MAX as usize {
            return Err(GridError::TooManyLights(id + 1));
        }
        self.index(light.cell())
            .map_err(|_| GridError::LightOutside { id, pos: light.pos })?;
        self.lights.push(light);
        Ok(id as LightId)
    }

    /// Freeze the layout and run both lighting passes.
    pub fn build(self, cfg: &EngineConfig) -> Result<Grid, GridError> {
        let Self {
            size,
            mut cells,
            lights,
        } = self;

        let mut doors = Vec::new();
        for (i, c) in cells.iter_mut().enumerate() {
            c.lights.clear();
            if c.kind.is_door() {
                c.openness = c.openness.clamp(0.0, 1.0);
                let i = i as i32;
                doors.push(Door::new(IVec2::new(i % size, i / size)));
            } else {
                c.openness = 0.0;
            }
        }

        let mut grid = Grid {
            size,
            cells,
            doors,
            lights,
            baked: BakedLightField::empty(size),
        };

        let t0 = Instant::now();
        grid.baked = BakedLightField::bake(&grid, &grid.lights);
        let baked_ms = t0.elapsed().as_secs_f64() * 1000.0;

        let t1 = Instant::now();
        let links = lighting::trace_visibility(&mut grid, cfg.shadow_companion_angle);
        debug!(links, "shadow pass linked lights to cells");
        let shadow_ms = t1.elapsed().as_secs_f64() * 1000.0;

        info!(
            size,
            doors = grid.doors.len(),
            lights = grid.lights.len(),
            baked_ms,
            shadow_ms,
            "grid built"
        );
        Ok(grid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec2, Vec3};

    #[test]
    fn out_of_range_sizes_rejected() {
        assert_eq!(GridBuilder::new(0).unwrap_err(), GridError::BadSize(0));
        assert_eq!(
            GridBuilder::new(MAX_GRID_SIZE + 1).unwrap_err(),
            GridError::BadSize(MAX_GRID_SIZE + 1)
        );
        assert_eq!(GridBuilder::new(46_341).unwrap_err(), GridError::BadSize(46_341));
    }

    #[test]
    fn out_of_bounds_set_is_an_error() {
        let mut b = GridBuilder::new(4).unwrap();
        let err = b.set_kind(IVec2::new(4, 0), CellKind::Wall).unwrap_err();
        assert_eq!(err, GridError::OutOfBounds(IVec2::new(4, 0), 4));
    }

    #[test]
    fn light_outside_rejected() {
        let mut b = GridBuilder::new(4).unwrap();
        let err = b
            .light(Light::new(Vec2::new(4.5, 1.0), Vec3::ONE, 3.0, false))
            .unwrap_err();
        assert!(matches!(err, GridError::LightOutside { id: 0, .. }));
    }

    #[test]
    fn build_registers_doors_in_scan_order() {
        let mut b = GridBuilder::new(8).unwrap();
        b.border(CellKind::Wall, 0, 0);
        b.door(IVec2::new(5, 2), CellKind::DoorAlongX, 1, 2).unwrap();
        b.door(IVec2::new(2, 4), CellKind::DoorAlongY, 1, 2).unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        let cells: Vec<IVec2> = g.doors().iter().map(|d| d.cell).collect();
        assert_eq!(cells, vec![IVec2::new(5, 2), IVec2::new(2, 4)]);
        assert!(g.doors().iter().all(|d| !d.is_opening));
        assert_eq!(g.cell(IVec2::new(5, 2)).unwrap().inner_wall_tex, 2);
    }

    #[test]
    fn shadow_light_is_listed_in_its_own_cell() {
        let mut b = GridBuilder::new(8).unwrap();
        b.border(CellKind::Wall, 0, 0);
        let id = b
            .light(Light::new(Vec2::new(3.5, 3.5), Vec3::ONE, 4.0, true))
            .unwrap();
        let g = b.build(&EngineConfig::default()).unwrap();
        assert!(g.cell(IVec2::new(3, 3)).unwrap().lights.contains(&id));
    }
}
