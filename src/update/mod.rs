//! Update pass
//!
//! Depth-first walk over the active scene that advances every enabled
//! component once per frame.

mod commands;
mod context;
mod module;

pub use commands::{CommandQueue, SceneCommand};
pub use context::UpdateContext;
pub use module::{UpdateModule, UpdateStats};
