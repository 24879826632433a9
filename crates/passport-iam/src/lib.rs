//! Passport IAM: the HTTP service that issues challenge and stamp
//! credentials.

pub mod api;
pub mod config;
pub mod providers;
pub mod scorer;
pub mod state;

pub use api::build_router;
pub use config::IamConfig;
pub use state::AppState;
