pub mod rest;
pub mod router;
pub mod state;

// Re-export the router builder so the binary and tests can construct the
// full application in one call.
pub use router::create_router;
pub use state::AppState;
