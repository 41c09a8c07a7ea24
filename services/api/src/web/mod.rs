pub mod auth;
pub mod error;
pub mod middleware;
pub mod posts;
pub mod rest;
pub mod router;
pub mod state;
pub mod validation;

// Re-export the router builder so binaries and tests can mount the whole API.
pub use router::build_router;
pub use state::AppState;
