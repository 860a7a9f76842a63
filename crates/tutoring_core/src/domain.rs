//! crates/tutoring_core/src/domain.rs
//!
//! Defines the pure, core data structures for the tutoring marketplace.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

//=========================================================================================
// Roles and Lifecycle States
//=========================================================================================

/// The effective role of a caller. Always derived, never read from a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Student,
    Tutor,
    Admin,
}

impl Role {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "student" => Some(Self::Student),
            "tutor" => Some(Self::Tutor),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Tutor => "tutor",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a tutor application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TutorStatus {
    Pending,
    Approved,
    Cancelled,
    Removed,
}

impl TutorStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "cancelled" | "rejected" => Some(Self::Cancelled),
            "removed" => Some(Self::Removed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
            Self::Removed => "removed",
        }
    }

    /// Whether an application in this state blocks a fresh self-service application.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for TutorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a tutoring session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionStatus {
    Pending,
    Approved,
    Cancelled,
}

impl SessionStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "cancelled" | "rejected" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//=========================================================================================
// Identity
//=========================================================================================

/// The claims produced by successfully validating a bearer credential.
/// `email` is the trust anchor for every authorization decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub subject: Option<String>,
    pub name: Option<String>,
}

//=========================================================================================
// Role Store Records
//=========================================================================================

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub uid: Option<String>,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    /// Display-only cache of the last assigned role. Never used for access control,
    /// except by the student-only guard.
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Payload of a user sync from the identity provider.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub uid: Option<String>,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TutorApplication {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status: TutorStatus,
    /// Only meaningful when `status` is `Cancelled`.
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTutorApplication {
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status: TutorStatus,
}

//=========================================================================================
// Resource Records
//=========================================================================================

#[derive(Debug, Clone)]
pub struct TutoringSession {
    pub id: Uuid,
    pub tutor_email: String,
    pub status: SessionStatus,
    pub feedback: Option<String>,
    /// Tutor-supplied scheduling fields (title, dates, fee, ...), opaque to the core.
    pub details: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub status: Option<SessionStatus>,
    pub tutor_email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Material {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub title: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub session_id: Uuid,
    pub tutor_email: String,
    pub title: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub session_id: Option<Uuid>,
    pub tutor_email: Option<String>,
}

/// Presence of a payment for `(email, session_id)` is the access grant for that
/// session's materials.
#[derive(Debug, Clone)]
pub struct Payment {
    pub id: Uuid,
    pub email: String,
    pub amount: f64,
    pub transaction_id: String,
    pub session_id: Option<Uuid>,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPayment {
    pub email: String,
    pub amount: f64,
    pub transaction_id: String,
    pub session_id: Option<Uuid>,
}

/// A payment intent opened with the payment processor.
#[derive(Debug, Clone)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub session_id: Uuid,
    pub student_email: String,
    pub rating: u8,
    pub comment: String,
}

/// A personal note kept by a student.
#[derive(Debug, Clone)]
pub struct Note {
    pub id: Uuid,
    pub email: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub email: String,
    pub title: String,
    pub description: String,
}

//=========================================================================================
// Aggregates
//=========================================================================================

/// A user annotated with their derived role.
#[derive(Debug, Clone)]
pub struct UserWithRole {
    pub user: User,
    pub role: Role,
}

/// One page of the admin user listing.
#[derive(Debug, Clone)]
pub struct UserPage {
    pub users: Vec<UserWithRole>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

impl UserPage {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        self.total.div_ceil(self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("admin"), Some(Role::Admin));
        assert_eq!(Role::parse(" Tutor "), Some(Role::Tutor));
        assert_eq!(Role::parse("student"), Some(Role::Student));
        assert_eq!(Role::parse("owner"), None);
    }

    #[test]
    fn test_tutor_status_open_states() {
        assert!(TutorStatus::Pending.is_open());
        assert!(TutorStatus::Approved.is_open());
        assert!(!TutorStatus::Cancelled.is_open());
        assert!(!TutorStatus::Removed.is_open());
        assert_eq!(TutorStatus::parse("rejected"), Some(TutorStatus::Cancelled));
    }

    #[test]
    fn test_total_pages() {
        let page = UserPage { users: vec![], total: 21, page: 1, limit: 10 };
        assert_eq!(page.total_pages(), 3);

        let empty = UserPage { users: vec![], total: 0, page: 1, limit: 10 };
        assert_eq!(empty.total_pages(), 0);
    }
}
