pub mod controller;
mod loop_worker;
mod session;
pub mod state;

pub use controller::DetectionController;
pub use state::{SessionState, SessionStatus};
