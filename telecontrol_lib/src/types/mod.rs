pub mod body_part;
pub mod config;
pub mod glove_types;
pub mod ports;
pub mod telecontrol_command;
pub mod telemetry;

pub use body_part::*;
pub use config::*;
pub use glove_types::*;
pub use ports::*;
pub use telecontrol_command::*;
pub use telemetry::*;
