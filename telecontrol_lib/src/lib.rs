//! # Telecontrol Library
//!
//! Shared types and building blocks for the haptic glove telecontrol node:
//! body-part configuration, control-board device interfaces, the body-part
//! controller and the glove vibration/hand-reading ports.

pub mod control;
pub mod device;
pub mod types;
pub mod utils;

// Re-export everything for convenience
pub use control::*;
pub use device::*;
pub use types::*;
pub use utils::*;
