//! services/api/src/web/types.rs
//!
//! Request and response payloads of the REST API, and their conversions from
//! the core domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tutoring_core::domain::{
    Feedback, Material, Note, Payment, Role, TutorApplication, TutoringSession, User, UserPage,
};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

//=========================================================================================
// Users, Roles and Sessions of the Identity Provider
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SyncUserRequest {
    pub uid: Option<String>,
    pub email: String,
    pub name: Option<String>,
    #[serde(alias = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SyncUserResponse {
    pub success: bool,
    pub message: String,
    pub user: UserResponse,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct LoginRequest {
    /// Identity credential. Falls back to the `Authorization` header when absent.
    pub token: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub email: String,
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct RoleResponse {
    pub email: String,
    pub role: String,
}

#[derive(Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub uid: Option<String>,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    /// The role to display. In listings this is the derived role.
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            uid: user.uid,
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            role: user.role.to_string(),
            created_at: user.created_at,
        }
    }
}

impl UserResponse {
    pub fn with_role(user: User, role: Role) -> Self {
        Self {
            role: role.to_string(),
            ..Self::from(user)
        }
    }
}

#[derive(Deserialize, IntoParams)]
pub struct UserListQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct UserPageResponse {
    pub users: Vec<UserResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl From<UserPage> for UserPageResponse {
    fn from(page: UserPage) -> Self {
        let total_pages = page.total_pages();
        Self {
            users: page
                .users
                .into_iter()
                .map(|entry| UserResponse::with_role(entry.user, entry.role))
                .collect(),
            total: page.total,
            page: page.page,
            limit: page.limit,
            total_pages,
        }
    }
}

//=========================================================================================
// Tutor Applications
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct TutorApplicationRequest {
    pub name: Option<String>,
    #[serde(alias = "photoURL")]
    pub photo_url: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct TutorStatusRequest {
    pub status: String,
    pub feedback: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct TutorApplicationResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub photo_url: Option<String>,
    pub status: String,
    pub feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TutorApplication> for TutorApplicationResponse {
    fn from(t: TutorApplication) -> Self {
        Self {
            id: t.id,
            email: t.email,
            name: t.name,
            photo_url: t.photo_url,
            status: t.status.to_string(),
            feedback: t.feedback,
            created_at: t.created_at,
            updated_at: t.updated_at,
        }
    }
}

//=========================================================================================
// Tutoring Sessions
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct SessionDetailsRequest {
    /// Scheduling fields, stored as given.
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
}

#[derive(Deserialize, ToSchema)]
pub struct SessionStatusRequest {
    pub status: String,
    pub feedback: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct SessionListQuery {
    pub status: Option<String>,
    pub tutor_email: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub tutor_email: String,
    pub status: String,
    pub feedback: Option<String>,
    #[schema(value_type = Object)]
    pub details: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TutoringSession> for SessionResponse {
    fn from(s: TutoringSession) -> Self {
        Self {
            id: s.id,
            tutor_email: s.tutor_email,
            status: s.status.to_string(),
            feedback: s.feedback,
            details: s.details,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

//=========================================================================================
// Materials
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateMaterialRequest {
    pub session_id: Uuid,
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateMaterialRequest {
    pub title: Option<String>,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct MaterialResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub tutor_email: String,
    pub title: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Material> for MaterialResponse {
    fn from(m: Material) -> Self {
        Self {
            id: m.id,
            session_id: m.session_id,
            tutor_email: m.tutor_email,
            title: m.title,
            image_url: m.image_url,
            link: m.link,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

//=========================================================================================
// Payments
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct PaymentIntentRequest {
    /// Amount in major currency units, e.g. `12.50`.
    pub amount: f64,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

#[derive(Deserialize, ToSchema)]
pub struct StorePaymentRequest {
    pub amount: f64,
    pub transaction_id: Option<String>,
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct PaymentResponse {
    pub id: Uuid,
    pub email: String,
    pub amount: f64,
    pub transaction_id: String,
    pub session_id: Option<Uuid>,
    pub paid_at: DateTime<Utc>,
}

impl From<Payment> for PaymentResponse {
    fn from(p: Payment) -> Self {
        Self {
            id: p.id,
            email: p.email,
            amount: p.amount,
            transaction_id: p.transaction_id,
            session_id: p.session_id,
            paid_at: p.paid_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaymentCheckResponse {
    pub session_id: Uuid,
    pub paid: bool,
}

//=========================================================================================
// Feedbacks
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateFeedbackRequest {
    pub session_id: Uuid,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateFeedbackRequest {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

#[derive(Deserialize, IntoParams)]
pub struct FeedbackListQuery {
    pub session_id: Option<Uuid>,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub session_id: Uuid,
    pub student_email: String,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Feedback> for FeedbackResponse {
    fn from(f: Feedback) -> Self {
        Self {
            id: f.id,
            session_id: f.session_id,
            student_email: f.student_email,
            rating: f.rating,
            comment: f.comment,
            created_at: f.created_at,
            updated_at: f.updated_at,
        }
    }
}

//=========================================================================================
// Notes
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
}

#[derive(Deserialize, ToSchema, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct NoteResponse {
    pub id: Uuid,
    pub email: String,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteResponse {
    fn from(n: Note) -> Self {
        Self {
            id: n.id,
            email: n.email,
            title: n.title,
            description: n.description,
            created_at: n.created_at,
            updated_at: n.updated_at,
        }
    }
}

//=========================================================================================
// Shared
//=========================================================================================

#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Trims `value` and rejects it when empty.
pub fn required(value: Option<String>, field: &str) -> Result<String, crate::error::ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| crate::error::ApiError::validation(format!("{} is required", field)))
}

/// Lowercased, trimmed email used as the store key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
