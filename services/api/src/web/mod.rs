pub mod admin;
pub mod auth;
pub mod extract;
pub mod feedbacks;
pub mod guard;
pub mod materials;
pub mod middleware;
pub mod notes;
pub mod payments;
pub mod rest;
pub mod router;
pub mod sessions;
pub mod state;
pub mod tutors;
pub mod types;

// Re-export the router builder so the binary and the integration tests
// share one definition of the HTTP surface.
pub use router::build_router;
