//! Engine tunables.
//!
//! Everything the simulation and the renderer treat as a "magic number" lives
//! here so a front-end can override it in one place.  [`EngineConfig::default`]
//! reproduces the reference behaviour.

use glam::Vec3;

/// Hard cap on DDA steps for one ray; exceeding it counts as an edge hit.
pub const MAX_RAY_STEPS: u32 = 1000;

/// Largest accepted grid side; keeps cell and vertex counts inside `i32`.
pub const MAX_GRID_SIZE: i32 = 4096;

/// Offset applied to door leaves toward the ray origin so shadow rays that
/// graze a door resolve the same way as camera rays.
pub const DOOR_PLANE_OFFSET: f32 = 0.01;

/// A shadow ray that reaches this fraction of its target counts as unoccluded.
pub const SHADOW_REACH: f32 = 0.999;

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /* doors ------------------------------------------------------------ */
    /// How long a door stays open after its last trigger.
    pub door_open_ms: f32,
    /// Openness change per millisecond, both directions.
    pub door_speed_per_ms: f32,
    /// Openness at or above which a door is walkable.
    pub passability_threshold: f32,
    /// Max distance of the "use" ray for doors and push-walls.
    pub use_reach: f32,

    /* collision -------------------------------------------------------- */
    /// Sub-cells per grid cell along each axis in the local collision grid.
    pub collision_scale: i32,
    /// Extra solid sub-cells grown around every solid parent cell.
    pub collision_padding: i32,
    /// How far the slide ray backs off from the first hit (direction units).
    pub slide_backoff: f32,

    /* movement --------------------------------------------------------- */
    pub move_speed_per_ms: f32,
    pub turn_speed_per_ms: f32,
    /// Push-block travel speed in cells per millisecond.
    pub push_speed_per_ms: f32,

    /* lighting --------------------------------------------------------- */
    /// Inverse-distance ambient term numerator.
    pub ambient: Vec3,
    /// Angular offset (radians) of the two companion rays in the shadow pass.
    pub shadow_companion_angle: f32,

    /* adaptive shadow sampling ----------------------------------------- */
    /// Below this many rays per frame the floor row step shrinks.
    pub rays_low_water: u32,
    /// Above this many rays per frame the floor row step grows.
    pub rays_high_water: u32,
    pub max_row_step: u32,

    /* presentation ----------------------------------------------------- */
    /// Sky base colour; scaled by screen position to form the gradient.
    pub sky_rgb: [u8; 3],
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            door_open_ms: 5000.0,
            door_speed_per_ms: 0.001,
            passability_threshold: 0.5,
            use_reach: 1.25,

            collision_scale: 4,
            collision_padding: 1,
            slide_backoff: 0.01,

            move_speed_per_ms: 0.0025,
            turn_speed_per_ms: 0.0025,
            push_speed_per_ms: 0.0005,

            ambient: Vec3::ONE,
            shadow_companion_angle: 0.002,

            rays_low_water: 20_000,
            rays_high_water: 60_000,
            max_row_step: 8,

            sky_rgb: [96, 128, 128],
        }
    }
}
