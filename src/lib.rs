pub mod config;
pub mod domain;
pub mod infra;
pub mod services;
pub mod state;
pub mod transport;

pub use state::AppState;
