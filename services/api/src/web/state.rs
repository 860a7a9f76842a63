//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use tutoring_core::ports::{DatabaseService, IdentityVerifier, PaymentProcessor};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
/// `db` is the process-wide store handle; it lives until the server shuts down.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub payments: Arc<dyn PaymentProcessor>,
}
