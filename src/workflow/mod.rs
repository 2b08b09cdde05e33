pub mod poll_controller;
pub mod poll_session;

pub use poll_controller::PollController;
pub use poll_session::{PollSession, PollState};
