pub mod collision;
mod components;
pub mod doors;
pub mod push;
mod tic;

pub use collision::{LocalGrid, resolve_movement};
pub use components::{Buttons, InputCmd};
pub use tic::{Game, SIM_FPS, TIC_MS, TicRunner, UseOutcome};
