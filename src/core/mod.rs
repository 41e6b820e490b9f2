//! Core engine module
//!
//! Configuration, timing, the scene manager and the frame driver.

mod config;
mod debug;
mod engine;
mod scene_manager;
mod time;

pub use config::{ConfigError, EngineConfig};
pub use debug::FrameStats;
pub use engine::{Engine, EngineError, FrameReport};
pub use scene_manager::SceneManager;
pub use time::{FixedTimestep, Time};
