//! Tile-grid raycasting renderer.
//!
//! * [`world`]    – grid, lights, textures, camera (the data a frame is made of)
//! * [`engine`]   – ray intersector and the two-tier lighting model
//! * [`renderer`] – CPU column/sprite rasteriser
//! * [`sim`]      – per-tick game logic: collision, doors, push-blocks
//! * [`worker`]   – background frame worker and its message protocol

pub mod config;
pub mod engine;
pub mod renderer;
pub mod sim;
pub mod worker;
pub mod world;

pub use config::EngineConfig;
