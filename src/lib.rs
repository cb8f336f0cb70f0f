//! ScissHER - state engine and local bridge for the ScissHER dating app
//!
//! The screens of the app are modelled as explicit state machines under
//! [`core`]; [`services`] runs their side effects against device and network
//! ports, and [`routes`] exposes everything to the webview shell over HTTP.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{obscurity_at, Action, BlindSession, Decision, Effect, RevealConfig, SessionPhase};
pub use crate::routes::{configure_routes, AppState, Ports};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = RevealConfig::default();
        assert_eq!(obscurity_at(&config, config.duration_secs), config.initial_obscurity);
        assert_eq!(BlindSession::new(config).phase(), SessionPhase::Idle);
    }
}
