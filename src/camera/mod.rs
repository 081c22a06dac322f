//! Camera: viewport pose, input-driven control, motion tasks and focus.
//!
//! The viewport pose is owned by [`CameraController`] and advanced once per
//! frame by the host's repaint loop. Focus/recenter helpers compute target
//! poses and hand them to the controller's animator; they never mutate the
//! pose directly.

pub mod controller;
pub mod focus;
pub mod motion;
pub mod viewport;

pub use controller::{CameraConfig, CameraController};
pub use viewport::Viewport;
