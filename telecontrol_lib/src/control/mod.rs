pub mod adapter;
pub mod controller;
pub mod glove_ports;

pub use adapter::*;
pub use controller::*;
pub use glove_ports::*;
