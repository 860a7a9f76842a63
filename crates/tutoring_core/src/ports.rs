//! crates/tutoring_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the document store, the identity provider and the payment
//! processor.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    Feedback, Material, MaterialFilter, NewFeedback, NewMaterial, NewNote, NewPayment,
    NewTutorApplication, NewUser, Note, Payment, PaymentIntent, Role, SessionFilter,
    SessionStatus, TutorApplication, TutorStatus, TutoringSession, User, VerifiedIdentity,
};
use serde_json::{Map, Value};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Inserts the user unless one with the same email exists. Returns the stored
    /// record and whether it was inserted by this call.
    async fn upsert_user(&self, user: NewUser) -> PortResult<(User, bool)>;

    async fn get_user_by_id(&self, id: Uuid) -> PortResult<User>;

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;

    async fn set_user_role(&self, id: Uuid, role: Role) -> PortResult<()>;

    /// Counts users whose name or email contains `search` (case-insensitive).
    async fn count_users(&self, search: Option<&str>) -> PortResult<u64>;

    /// Fetches one slice of the users matching `search`, newest first.
    async fn list_users(&self, search: Option<&str>, offset: u64, limit: u64)
        -> PortResult<Vec<User>>;

    // --- Admins ---
    async fn is_admin(&self, email: &str) -> PortResult<bool>;

    /// Returns `true` if the admin record was created by this call.
    async fn add_admin(&self, email: &str) -> PortResult<bool>;

    /// Returns `true` if an admin record existed and was removed.
    async fn remove_admin(&self, email: &str) -> PortResult<bool>;

    async fn admin_emails(&self) -> PortResult<Vec<String>>;

    // --- Tutor Applications ---
    async fn create_tutor_application(
        &self,
        application: NewTutorApplication,
    ) -> PortResult<TutorApplication>;

    async fn find_tutor_application_by_email(
        &self,
        email: &str,
    ) -> PortResult<Option<TutorApplication>>;

    async fn list_tutor_applications(
        &self,
        status: Option<TutorStatus>,
    ) -> PortResult<Vec<TutorApplication>>;

    /// Sets the status (and feedback) of an application and stamps `updated_at`.
    async fn update_tutor_application_status(
        &self,
        id: Uuid,
        status: TutorStatus,
        feedback: Option<String>,
    ) -> PortResult<TutorApplication>;

    /// Overwrites the name and avatar of an application and reopens it as pending.
    async fn reopen_tutor_application(
        &self,
        id: Uuid,
        name: &str,
        photo_url: Option<&str>,
    ) -> PortResult<TutorApplication>;

    async fn delete_tutor_application(&self, id: Uuid) -> PortResult<()>;

    async fn has_approved_application(&self, email: &str) -> PortResult<bool>;

    async fn approved_tutor_emails(&self) -> PortResult<Vec<String>>;

    // --- Tutoring Sessions ---
    async fn create_session(
        &self,
        tutor_email: &str,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession>;

    async fn get_session(&self, id: Uuid) -> PortResult<TutoringSession>;

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<TutoringSession>>;

    async fn update_session_details(
        &self,
        id: Uuid,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession>;

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        feedback: Option<String>,
    ) -> PortResult<TutoringSession>;

    async fn delete_session(&self, id: Uuid) -> PortResult<()>;

    // --- Materials ---
    async fn create_material(&self, material: NewMaterial) -> PortResult<Material>;

    async fn get_material(&self, id: Uuid) -> PortResult<Material>;

    async fn list_materials(&self, filter: MaterialFilter) -> PortResult<Vec<Material>>;

    async fn list_materials_for_sessions(&self, session_ids: &[Uuid])
        -> PortResult<Vec<Material>>;

    /// Writes every mutable field of `material` back to the store.
    async fn update_material(&self, material: &Material) -> PortResult<()>;

    async fn delete_material(&self, id: Uuid) -> PortResult<()>;

    // --- Payments ---
    async fn create_payment(&self, payment: NewPayment) -> PortResult<Payment>;

    async fn list_payments_by_email(&self, email: &str) -> PortResult<Vec<Payment>>;

    async fn has_payment(&self, email: &str, session_id: Uuid) -> PortResult<bool>;

    // --- Feedbacks ---
    async fn create_feedback(&self, feedback: NewFeedback) -> PortResult<Feedback>;

    async fn get_feedback(&self, id: Uuid) -> PortResult<Feedback>;

    async fn list_feedbacks(&self, session_id: Option<Uuid>) -> PortResult<Vec<Feedback>>;

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<()>;

    // --- Notes ---
    async fn create_note(&self, note: NewNote) -> PortResult<Note>;

    async fn get_note(&self, id: Uuid) -> PortResult<Note>;

    async fn list_notes_by_email(&self, email: &str) -> PortResult<Vec<Note>>;

    async fn update_note(&self, note: &Note) -> PortResult<()>;

    async fn delete_note(&self, id: Uuid) -> PortResult<()>;
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Validates an opaque bearer credential. Any failure is `PortError::Unauthorized`.
    async fn verify(&self, credential: &str) -> PortResult<VerifiedIdentity>;
}

#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Opens a payment intent for `amount_minor` units of `currency`.
    async fn create_payment_intent(
        &self,
        amount_minor: i64,
        currency: &str,
    ) -> PortResult<PaymentIntent>;
}
