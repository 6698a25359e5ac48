//! Core functionalities.
mod backend;
mod config;
mod handler;
mod state;
pub use backend::Backend;
pub use config::HandlerConfig;
pub use handler::{Handler, HandlerRole, ReproParams};
pub use state::{EpisodeTimes, HandlerState, Stage};
