//! Operator surfaces. Implement InputPort.

pub mod headless;
pub mod tui;

pub use headless::{HeadlessInputPort, run_monitor};
pub use tui::TuiInputPort;
