//! Input handling module
//!
//! Backend-agnostic key and mouse state. The host feeds events in; components
//! poll it through [`UpdateContext::input`](crate::update::UpdateContext::input).

mod state;

pub use state::{ButtonState, Input, Key, MouseButton};
