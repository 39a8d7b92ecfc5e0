//! Command-line front end for the ideaflow note service.
mod app;
mod main;

pub use app::App;
pub use main::Cli;
