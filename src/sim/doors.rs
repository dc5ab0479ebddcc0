//! Door state machine.
//!
//! Open:   openness rises toward 1, the timer counts up.
//! Closed: openness falls toward 0.
//! An occupied door, or one that is *used*, re-enters Open with a fresh
//! timer; Open lapses into Closed once the timer passes `door_open_ms`.

use glam::IVec2;

use crate::{config::EngineConfig, world::Grid};

/// Re-open the door at `at` and restart its timer.  `false` if there is none.
pub fn trigger(grid: &mut Grid, at: IVec2) -> bool {
    match grid.door_index(at) {
        Some(i) => {
            let door = &mut grid.doors_mut()[i];
            door.is_opening = true;
            door.time_opened_ms = 0.0;
            true
        }
        None => false,
    }
}

/// Advance every door by `dt_ms`.
///
/// `occupied` lists the cells agents stand in.  Coordinates whose openness
/// moved are appended to `changed`.
pub fn update(
    grid: &mut Grid,
    dt_ms: f32,
    occupied: &[IVec2],
    cfg: &EngineConfig,
    changed: &mut Vec<IVec2>,
) {
    let dt_ms = dt_ms.max(0.0);
    let step = cfg.door_speed_per_ms * dt_ms;

    for i in 0..grid.doors().len() {
        let door = &mut grid.doors_mut()[i];
        if occupied.contains(&door.cell) {
            door.is_opening = true;
            door.time_opened_ms = 0.0;
        } else if door.is_opening {
            door.time_opened_ms += dt_ms;
            if door.time_opened_ms > cfg.door_open_ms {
                door.is_opening = false;
            }
        }
        let target = if door.is_opening { 1.0 } else { 0.0 };
        let at = door.cell;

        let Some(current) = grid.cell(at).map(|c| c.openness) else {
            continue;
        };
        let next = approach(current, target, step);
        if next != current {
            grid.set_openness(at, next);
            changed.push(at);
        }
    }
}

/// Move `from` toward `to` by at most `step`, never past it.
#[inline]
fn approach(from: f32, to: f32, step: f32) -> f32 {
    if from < to {
        (from + step).min(to)
    } else {
        (from - step).max(to)
    }
    .clamp(0.0, 1.0)
}
