//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::{types::Json, FromRow, PgPool};
use tutoring_core::domain::{
    Feedback, Material, MaterialFilter, NewFeedback, NewMaterial, NewNote, NewPayment,
    NewTutorApplication, NewUser, Note, Payment, Role, SessionFilter, SessionStatus,
    TutorApplication, TutorStatus, TutoringSession, User,
};
use tutoring_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps `RowNotFound` to `NotFound(what)`, and unique violations to `Conflict`.
fn lookup_error(what: String) -> impl FnOnce(sqlx::Error) -> PortError {
    move |e| match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what),
        sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
            PortError::Conflict(format!("{} already exists", what))
        }
        _ => unexpected(e),
    }
}

fn require_affected(rows: u64, what: String) -> PortResult<()> {
    if rows == 0 {
        Err(PortError::NotFound(what))
    } else {
        Ok(())
    }
}

fn parse_column<T>(value: &str, column: &str, parse: fn(&str) -> Option<T>) -> PortResult<T> {
    parse(value).ok_or_else(|| {
        PortError::Unexpected(format!("Unrecognised {} value '{}' in store", column, value))
    })
}

/// `%term%` with LIKE wildcards in the term escaped.
fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|term| {
        let escaped = term
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    uid: Option<String>,
    email: String,
    name: String,
    photo_url: Option<String>,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            uid: self.uid,
            email: self.email,
            name: self.name,
            photo_url: self.photo_url,
            role: parse_column(&self.role, "role", Role::parse)?,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct TutorApplicationRecord {
    id: Uuid,
    email: String,
    name: String,
    photo_url: Option<String>,
    status: String,
    feedback: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl TutorApplicationRecord {
    fn to_domain(self) -> PortResult<TutorApplication> {
        Ok(TutorApplication {
            id: self.id,
            email: self.email,
            name: self.name,
            photo_url: self.photo_url,
            status: parse_column(&self.status, "status", TutorStatus::parse)?,
            feedback: self.feedback,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    tutor_email: String,
    status: String,
    feedback: Option<String>,
    details: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<TutoringSession> {
        Ok(TutoringSession {
            id: self.id,
            tutor_email: self.tutor_email,
            status: parse_column(&self.status, "status", SessionStatus::parse)?,
            feedback: self.feedback,
            details: self.details.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct MaterialRecord {
    id: Uuid,
    session_id: Uuid,
    tutor_email: String,
    title: String,
    image_url: Option<String>,
    link: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl MaterialRecord {
    fn to_domain(self) -> Material {
        Material {
            id: self.id,
            session_id: self.session_id,
            tutor_email: self.tutor_email,
            title: self.title,
            image_url: self.image_url,
            link: self.link,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PaymentRecord {
    id: Uuid,
    email: String,
    amount: f64,
    transaction_id: String,
    session_id: Option<Uuid>,
    paid_at: DateTime<Utc>,
}
impl PaymentRecord {
    fn to_domain(self) -> Payment {
        Payment {
            id: self.id,
            email: self.email,
            amount: self.amount,
            transaction_id: self.transaction_id,
            session_id: self.session_id,
            paid_at: self.paid_at,
        }
    }
}

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    session_id: Uuid,
    student_email: String,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl FeedbackRecord {
    fn to_domain(self) -> PortResult<Feedback> {
        let rating = u8::try_from(self.rating)
            .map_err(|_| PortError::Unexpected(format!("Invalid rating {} in store", self.rating)))?;
        Ok(Feedback {
            id: self.id,
            session_id: self.session_id,
            student_email: self.student_email,
            rating,
            comment: self.comment,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct NoteRecord {
    id: Uuid,
    email: String,
    title: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl NoteRecord {
    fn to_domain(self) -> Note {
        Note {
            id: self.id,
            email: self.email,
            title: self.title,
            description: self.description,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, uid, email, name, photo_url, role, created_at";
const TUTOR_COLUMNS: &str = "id, email, name, photo_url, status, feedback, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, tutor_email, status, feedback, details, created_at, updated_at";
const MATERIAL_COLUMNS: &str =
    "id, session_id, tutor_email, title, image_url, link, created_at, updated_at";
const PAYMENT_COLUMNS: &str = "id, email, amount, transaction_id, session_id, paid_at";
const FEEDBACK_COLUMNS: &str =
    "id, session_id, student_email, rating, comment, created_at, updated_at";
const NOTE_COLUMNS: &str = "id, email, title, description, created_at, updated_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    // --- Users ---

    async fn upsert_user(&self, user: NewUser) -> PortResult<(User, bool)> {
        let inserted = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, uid, email, name, photo_url, role) \
             VALUES ($1, $2, $3, $4, $5, 'student') \
             ON CONFLICT (email) DO NOTHING RETURNING {}",
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.uid)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.photo_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        if let Some(record) = inserted {
            return Ok((record.to_domain()?, true));
        }

        let existing = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("User {}", user.email)))?;

        Ok((existing.to_domain()?, false))
    }

    async fn get_user_by_id(&self, id: Uuid) -> PortResult<User> {
        sqlx::query_as::<_, UserRecord>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(lookup_error(format!("User {}", id)))?
            .to_domain()
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(UserRecord::to_domain)
        .transpose()
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> PortResult<()> {
        let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2")
            .bind(role.as_str())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("User {}", id))
    }

    async fn count_users(&self, search: Option<&str>) -> PortResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1)",
        )
        .bind(like_pattern(search))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(count.max(0) as u64)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {} FROM users \
             WHERE ($1::text IS NULL OR name ILIKE $1 OR email ILIKE $1) \
             ORDER BY created_at DESC, email ASC LIMIT $3 OFFSET $2",
            USER_COLUMNS
        ))
        .bind(like_pattern(search))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(UserRecord::to_domain).collect()
    }

    // --- Admins ---

    async fn is_admin(&self, email: &str) -> PortResult<bool> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM admins WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn add_admin(&self, email: &str) -> PortResult<bool> {
        let result = sqlx::query("INSERT INTO admins (email) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_admin(&self, email: &str) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM admins WHERE email = $1")
            .bind(email)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn admin_emails(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar("SELECT email FROM admins")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)
    }

    // --- Tutor Applications ---

    async fn create_tutor_application(
        &self,
        application: NewTutorApplication,
    ) -> PortResult<TutorApplication> {
        sqlx::query_as::<_, TutorApplicationRecord>(&format!(
            "INSERT INTO tutor_applications (id, email, name, photo_url, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            TUTOR_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&application.email)
        .bind(&application.name)
        .bind(&application.photo_url)
        .bind(application.status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Tutor application for {}", application.email)))?
        .to_domain()
    }

    async fn find_tutor_application_by_email(
        &self,
        email: &str,
    ) -> PortResult<Option<TutorApplication>> {
        sqlx::query_as::<_, TutorApplicationRecord>(&format!(
            "SELECT {} FROM tutor_applications WHERE email = $1",
            TUTOR_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(TutorApplicationRecord::to_domain)
        .transpose()
    }

    async fn list_tutor_applications(
        &self,
        status: Option<TutorStatus>,
    ) -> PortResult<Vec<TutorApplication>> {
        let records = sqlx::query_as::<_, TutorApplicationRecord>(&format!(
            "SELECT {} FROM tutor_applications \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at ASC",
            TUTOR_COLUMNS
        ))
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(TutorApplicationRecord::to_domain).collect()
    }

    async fn update_tutor_application_status(
        &self,
        id: Uuid,
        status: TutorStatus,
        feedback: Option<String>,
    ) -> PortResult<TutorApplication> {
        sqlx::query_as::<_, TutorApplicationRecord>(&format!(
            "UPDATE tutor_applications SET status = $1, feedback = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            TUTOR_COLUMNS
        ))
        .bind(status.as_str())
        .bind(feedback)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Tutor application {}", id)))?
        .to_domain()
    }

    async fn reopen_tutor_application(
        &self,
        id: Uuid,
        name: &str,
        photo_url: Option<&str>,
    ) -> PortResult<TutorApplication> {
        sqlx::query_as::<_, TutorApplicationRecord>(&format!(
            "UPDATE tutor_applications \
             SET name = $1, photo_url = $2, status = 'pending', feedback = NULL, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            TUTOR_COLUMNS
        ))
        .bind(name)
        .bind(photo_url)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Tutor application {}", id)))?
        .to_domain()
    }

    async fn delete_tutor_application(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tutor_applications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Tutor application {}", id))
    }

    async fn has_approved_application(&self, email: &str) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM tutor_applications WHERE email = $1 AND status = 'approved')",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    async fn approved_tutor_emails(&self) -> PortResult<Vec<String>> {
        sqlx::query_scalar("SELECT email FROM tutor_applications WHERE status = 'approved'")
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)
    }

    // --- Tutoring Sessions ---

    async fn create_session(
        &self,
        tutor_email: &str,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession> {
        sqlx::query_as::<_, SessionRecord>(&format!(
            "INSERT INTO tutoring_sessions (id, tutor_email, status, details) \
             VALUES ($1, $2, 'pending', $3) RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(tutor_email)
        .bind(Json(details))
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn get_session(&self, id: Uuid) -> PortResult<TutoringSession> {
        sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM tutoring_sessions WHERE id = $1",
            SESSION_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Session {}", id)))?
        .to_domain()
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<TutoringSession>> {
        let records = sqlx::query_as::<_, SessionRecord>(&format!(
            "SELECT {} FROM tutoring_sessions \
             WHERE ($1::text IS NULL OR status = $1) AND ($2::text IS NULL OR tutor_email = $2) \
             ORDER BY created_at DESC",
            SESSION_COLUMNS
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.tutor_email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(SessionRecord::to_domain).collect()
    }

    async fn update_session_details(
        &self,
        id: Uuid,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession> {
        sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE tutoring_sessions SET details = $1, updated_at = NOW() \
             WHERE id = $2 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Json(details))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Session {}", id)))?
        .to_domain()
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        feedback: Option<String>,
    ) -> PortResult<TutoringSession> {
        sqlx::query_as::<_, SessionRecord>(&format!(
            "UPDATE tutoring_sessions SET status = $1, feedback = $2, updated_at = NOW() \
             WHERE id = $3 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(status.as_str())
        .bind(feedback)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Session {}", id)))?
        .to_domain()
    }

    async fn delete_session(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM tutoring_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Session {}", id))
    }

    // --- Materials ---

    async fn create_material(&self, material: NewMaterial) -> PortResult<Material> {
        let record = sqlx::query_as::<_, MaterialRecord>(&format!(
            "INSERT INTO materials (id, session_id, tutor_email, title, image_url, link) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            MATERIAL_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(material.session_id)
        .bind(&material.tutor_email)
        .bind(&material.title)
        .bind(&material.image_url)
        .bind(&material.link)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_material(&self, id: Uuid) -> PortResult<Material> {
        let record = sqlx::query_as::<_, MaterialRecord>(&format!(
            "SELECT {} FROM materials WHERE id = $1",
            MATERIAL_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Material {}", id)))?;
        Ok(record.to_domain())
    }

    async fn list_materials(&self, filter: MaterialFilter) -> PortResult<Vec<Material>> {
        let records = sqlx::query_as::<_, MaterialRecord>(&format!(
            "SELECT {} FROM materials \
             WHERE ($1::uuid IS NULL OR session_id = $1) AND ($2::text IS NULL OR tutor_email = $2) \
             ORDER BY created_at ASC",
            MATERIAL_COLUMNS
        ))
        .bind(filter.session_id)
        .bind(filter.tutor_email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(MaterialRecord::to_domain).collect())
    }

    async fn list_materials_for_sessions(
        &self,
        session_ids: &[Uuid],
    ) -> PortResult<Vec<Material>> {
        let records = sqlx::query_as::<_, MaterialRecord>(&format!(
            "SELECT {} FROM materials WHERE session_id = ANY($1) ORDER BY created_at ASC",
            MATERIAL_COLUMNS
        ))
        .bind(session_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(MaterialRecord::to_domain).collect())
    }

    async fn update_material(&self, material: &Material) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE materials SET title = $1, image_url = $2, link = $3, updated_at = $4 \
             WHERE id = $5",
        )
        .bind(&material.title)
        .bind(&material.image_url)
        .bind(&material.link)
        .bind(material.updated_at)
        .bind(material.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Material {}", material.id))
    }

    async fn delete_material(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Material {}", id))
    }

    // --- Payments ---

    async fn create_payment(&self, payment: NewPayment) -> PortResult<Payment> {
        let record = sqlx::query_as::<_, PaymentRecord>(&format!(
            "INSERT INTO payments (id, email, amount, transaction_id, session_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            PAYMENT_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&payment.email)
        .bind(payment.amount)
        .bind(&payment.transaction_id)
        .bind(payment.session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_payments_by_email(&self, email: &str) -> PortResult<Vec<Payment>> {
        let records = sqlx::query_as::<_, PaymentRecord>(&format!(
            "SELECT {} FROM payments WHERE email = $1 ORDER BY paid_at DESC",
            PAYMENT_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(PaymentRecord::to_domain).collect())
    }

    async fn has_payment(&self, email: &str, session_id: Uuid) -> PortResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payments WHERE email = $1 AND session_id = $2)",
        )
        .bind(email)
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)
    }

    // --- Feedbacks ---

    async fn create_feedback(&self, feedback: NewFeedback) -> PortResult<Feedback> {
        sqlx::query_as::<_, FeedbackRecord>(&format!(
            "INSERT INTO feedbacks (id, session_id, student_email, rating, comment) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            FEEDBACK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(feedback.session_id)
        .bind(&feedback.student_email)
        .bind(i16::from(feedback.rating))
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?
        .to_domain()
    }

    async fn get_feedback(&self, id: Uuid) -> PortResult<Feedback> {
        sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {} FROM feedbacks WHERE id = $1",
            FEEDBACK_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Feedback {}", id)))?
        .to_domain()
    }

    async fn list_feedbacks(&self, session_id: Option<Uuid>) -> PortResult<Vec<Feedback>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(&format!(
            "SELECT {} FROM feedbacks WHERE ($1::uuid IS NULL OR session_id = $1) \
             ORDER BY created_at DESC",
            FEEDBACK_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(FeedbackRecord::to_domain).collect()
    }

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE feedbacks SET rating = $1, comment = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(i16::from(feedback.rating))
        .bind(&feedback.comment)
        .bind(feedback.updated_at)
        .bind(feedback.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Feedback {}", feedback.id))
    }

    // --- Notes ---

    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "INSERT INTO notes (id, email, title, description) VALUES ($1, $2, $3, $4) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&note.email)
        .bind(&note.title)
        .bind(&note.description)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn get_note(&self, id: Uuid) -> PortResult<Note> {
        let record = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE id = $1",
            NOTE_COLUMNS
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(lookup_error(format!("Note {}", id)))?;
        Ok(record.to_domain())
    }

    async fn list_notes_by_email(&self, email: &str) -> PortResult<Vec<Note>> {
        let records = sqlx::query_as::<_, NoteRecord>(&format!(
            "SELECT {} FROM notes WHERE email = $1 ORDER BY created_at DESC",
            NOTE_COLUMNS
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(NoteRecord::to_domain).collect())
    }

    async fn update_note(&self, note: &Note) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE notes SET title = $1, description = $2, updated_at = $3 WHERE id = $4",
        )
        .bind(&note.title)
        .bind(&note.description)
        .bind(note.updated_at)
        .bind(note.id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Note {}", note.id))
    }

    async fn delete_note(&self, id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        require_affected(result.rows_affected(), format!("Note {}", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern(Some("ann")), Some("%ann%".to_string()));
        assert_eq!(like_pattern(Some("50%_off")), Some("%50\\%\\_off%".to_string()));
        assert_eq!(like_pattern(None), None);
    }
}
