//! Command handlers for the Enrollment CLI

pub mod reassign;
pub mod roster;

pub use reassign::handle_reassign_command;
pub use roster::handle_roster_command;
