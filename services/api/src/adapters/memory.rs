//! services/api/src/adapters/memory.rs
//!
//! An in-process implementation of the `DatabaseService` port. Used by the test
//! suite and by development runs started with `DATABASE_URL=memory://`.
//! Mirrors the postgres adapter's semantics, including the unique email on
//! tutor applications.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tutoring_core::domain::{
    Feedback, Material, MaterialFilter, NewFeedback, NewMaterial, NewNote, NewPayment,
    NewTutorApplication, NewUser, Note, Payment, Role, SessionFilter, SessionStatus,
    TutorApplication, TutorStatus, TutoringSession, User,
};
use tutoring_core::ports::{DatabaseService, PortError, PortResult};
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    users: HashMap<Uuid, User>,
    admins: HashSet<String>,
    tutors: HashMap<Uuid, TutorApplication>,
    sessions: HashMap<Uuid, TutoringSession>,
    materials: HashMap<Uuid, Material>,
    payments: Vec<Payment>,
    feedbacks: HashMap<Uuid, Feedback>,
    notes: HashMap<Uuid, Note>,
}

/// A store that keeps every collection in memory behind one lock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn not_found(what: &str, id: Uuid) -> PortError {
    PortError::NotFound(format!("{} {}", what, id))
}

fn matches_search(user: &User, needle: Option<&str>) -> bool {
    match needle {
        None => true,
        Some(needle) => {
            let needle = needle.to_lowercase();
            user.name.to_lowercase().contains(&needle) || user.email.to_lowercase().contains(&needle)
        }
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    // --- Users ---

    async fn upsert_user(&self, user: NewUser) -> PortResult<(User, bool)> {
        let mut inner = self.inner.write().await;
        if let Some(existing) = inner.users.values().find(|u| u.email == user.email) {
            return Ok((existing.clone(), false));
        }
        let record = User {
            id: Uuid::new_v4(),
            uid: user.uid,
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            role: Role::Student,
            created_at: Utc::now(),
        };
        inner.users.insert(record.id, record.clone());
        Ok((record, true))
    }

    async fn get_user_by_id(&self, id: Uuid) -> PortResult<User> {
        let inner = self.inner.read().await;
        inner.users.get(&id).cloned().ok_or_else(|| not_found("User", id))
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or_else(|| not_found("User", id))?;
        user.role = role;
        Ok(())
    }

    async fn count_users(&self, search: Option<&str>) -> PortResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().filter(|u| matches_search(u, search)).count() as u64)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        offset: u64,
        limit: u64,
    ) -> PortResult<Vec<User>> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|u| matches_search(u, search))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.email.cmp(&b.email)));
        Ok(users
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    // --- Admins ---

    async fn is_admin(&self, email: &str) -> PortResult<bool> {
        Ok(self.inner.read().await.admins.contains(email))
    }

    async fn add_admin(&self, email: &str) -> PortResult<bool> {
        Ok(self.inner.write().await.admins.insert(email.to_string()))
    }

    async fn remove_admin(&self, email: &str) -> PortResult<bool> {
        Ok(self.inner.write().await.admins.remove(email))
    }

    async fn admin_emails(&self) -> PortResult<Vec<String>> {
        Ok(self.inner.read().await.admins.iter().cloned().collect())
    }

    // --- Tutor Applications ---

    async fn create_tutor_application(
        &self,
        application: NewTutorApplication,
    ) -> PortResult<TutorApplication> {
        let mut inner = self.inner.write().await;
        if inner.tutors.values().any(|t| t.email == application.email) {
            return Err(PortError::Conflict(format!(
                "Tutor application for {} already exists",
                application.email
            )));
        }
        let now = Utc::now();
        let record = TutorApplication {
            id: Uuid::new_v4(),
            email: application.email,
            name: application.name,
            photo_url: application.photo_url,
            status: application.status,
            feedback: None,
            created_at: now,
            updated_at: now,
        };
        inner.tutors.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_tutor_application_by_email(
        &self,
        email: &str,
    ) -> PortResult<Option<TutorApplication>> {
        let inner = self.inner.read().await;
        Ok(inner.tutors.values().find(|t| t.email == email).cloned())
    }

    async fn list_tutor_applications(
        &self,
        status: Option<TutorStatus>,
    ) -> PortResult<Vec<TutorApplication>> {
        let inner = self.inner.read().await;
        let mut applications: Vec<TutorApplication> = inner
            .tutors
            .values()
            .filter(|t| status.map_or(true, |s| t.status == s))
            .cloned()
            .collect();
        applications.sort_by_key(|t| t.created_at);
        Ok(applications)
    }

    async fn update_tutor_application_status(
        &self,
        id: Uuid,
        status: TutorStatus,
        feedback: Option<String>,
    ) -> PortResult<TutorApplication> {
        let mut inner = self.inner.write().await;
        let application = inner
            .tutors
            .get_mut(&id)
            .ok_or_else(|| not_found("Tutor application", id))?;
        application.status = status;
        application.feedback = feedback;
        application.updated_at = Utc::now();
        Ok(application.clone())
    }

    async fn reopen_tutor_application(
        &self,
        id: Uuid,
        name: &str,
        photo_url: Option<&str>,
    ) -> PortResult<TutorApplication> {
        let mut inner = self.inner.write().await;
        let application = inner
            .tutors
            .get_mut(&id)
            .ok_or_else(|| not_found("Tutor application", id))?;
        application.name = name.to_string();
        application.photo_url = photo_url.map(str::to_string);
        application.status = TutorStatus::Pending;
        application.feedback = None;
        application.updated_at = Utc::now();
        Ok(application.clone())
    }

    async fn delete_tutor_application(&self, id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .tutors
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Tutor application", id))
    }

    async fn has_approved_application(&self, email: &str) -> PortResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .tutors
            .values()
            .any(|t| t.email == email && t.status == TutorStatus::Approved))
    }

    async fn approved_tutor_emails(&self) -> PortResult<Vec<String>> {
        let inner = self.inner.read().await;
        Ok(inner
            .tutors
            .values()
            .filter(|t| t.status == TutorStatus::Approved)
            .map(|t| t.email.clone())
            .collect())
    }

    // --- Tutoring Sessions ---

    async fn create_session(
        &self,
        tutor_email: &str,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession> {
        let now = Utc::now();
        let session = TutoringSession {
            id: Uuid::new_v4(),
            tutor_email: tutor_email.to_string(),
            status: SessionStatus::Pending,
            feedback: None,
            details,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&self, id: Uuid) -> PortResult<TutoringSession> {
        let inner = self.inner.read().await;
        inner.sessions.get(&id).cloned().ok_or_else(|| not_found("Session", id))
    }

    async fn list_sessions(&self, filter: SessionFilter) -> PortResult<Vec<TutoringSession>> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<TutoringSession> = inner
            .sessions
            .values()
            .filter(|s| filter.status.map_or(true, |status| s.status == status))
            .filter(|s| {
                filter
                    .tutor_email
                    .as_deref()
                    .map_or(true, |email| s.tutor_email == email)
            })
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(sessions)
    }

    async fn update_session_details(
        &self,
        id: Uuid,
        details: Map<String, Value>,
    ) -> PortResult<TutoringSession> {
        let mut inner = self.inner.write().await;
        let session = inner.sessions.get_mut(&id).ok_or_else(|| not_found("Session", id))?;
        session.details = details;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn update_session_status(
        &self,
        id: Uuid,
        status: SessionStatus,
        feedback: Option<String>,
    ) -> PortResult<TutoringSession> {
        let mut inner = self.inner.write().await;
        let session = inner.sessions.get_mut(&id).ok_or_else(|| not_found("Session", id))?;
        session.status = status;
        session.feedback = feedback;
        session.updated_at = Utc::now();
        Ok(session.clone())
    }

    async fn delete_session(&self, id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .sessions
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Session", id))
    }

    // --- Materials ---

    async fn create_material(&self, material: NewMaterial) -> PortResult<Material> {
        let now = Utc::now();
        let record = Material {
            id: Uuid::new_v4(),
            session_id: material.session_id,
            tutor_email: material.tutor_email,
            title: material.title,
            image_url: material.image_url,
            link: material.link,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.materials.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_material(&self, id: Uuid) -> PortResult<Material> {
        let inner = self.inner.read().await;
        inner.materials.get(&id).cloned().ok_or_else(|| not_found("Material", id))
    }

    async fn list_materials(&self, filter: MaterialFilter) -> PortResult<Vec<Material>> {
        let inner = self.inner.read().await;
        let mut materials: Vec<Material> = inner
            .materials
            .values()
            .filter(|m| filter.session_id.map_or(true, |id| m.session_id == id))
            .filter(|m| {
                filter
                    .tutor_email
                    .as_deref()
                    .map_or(true, |email| m.tutor_email == email)
            })
            .cloned()
            .collect();
        materials.sort_by_key(|m| m.created_at);
        Ok(materials)
    }

    async fn list_materials_for_sessions(
        &self,
        session_ids: &[Uuid],
    ) -> PortResult<Vec<Material>> {
        let inner = self.inner.read().await;
        let mut materials: Vec<Material> = inner
            .materials
            .values()
            .filter(|m| session_ids.contains(&m.session_id))
            .cloned()
            .collect();
        materials.sort_by_key(|m| m.created_at);
        Ok(materials)
    }

    async fn update_material(&self, material: &Material) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .materials
            .get_mut(&material.id)
            .ok_or_else(|| not_found("Material", material.id))?;
        *stored = material.clone();
        Ok(())
    }

    async fn delete_material(&self, id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        inner
            .materials
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Material", id))
    }

    // --- Payments ---

    async fn create_payment(&self, payment: NewPayment) -> PortResult<Payment> {
        let record = Payment {
            id: Uuid::new_v4(),
            email: payment.email,
            amount: payment.amount,
            transaction_id: payment.transaction_id,
            session_id: payment.session_id,
            paid_at: Utc::now(),
        };
        self.inner.write().await.payments.push(record.clone());
        Ok(record)
    }

    async fn list_payments_by_email(&self, email: &str) -> PortResult<Vec<Payment>> {
        let inner = self.inner.read().await;
        let mut payments: Vec<Payment> = inner
            .payments
            .iter()
            .filter(|p| p.email == email)
            .cloned()
            .collect();
        payments.sort_by(|a, b| b.paid_at.cmp(&a.paid_at));
        Ok(payments)
    }

    async fn has_payment(&self, email: &str, session_id: Uuid) -> PortResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .payments
            .iter()
            .any(|p| p.email == email && p.session_id == Some(session_id)))
    }

    // --- Feedbacks ---

    async fn create_feedback(&self, feedback: NewFeedback) -> PortResult<Feedback> {
        let now = Utc::now();
        let record = Feedback {
            id: Uuid::new_v4(),
            session_id: feedback.session_id,
            student_email: feedback.student_email,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.feedbacks.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_feedback(&self, id: Uuid) -> PortResult<Feedback> {
        let inner = self.inner.read().await;
        inner.feedbacks.get(&id).cloned().ok_or_else(|| not_found("Feedback", id))
    }

    async fn list_feedbacks(&self, session_id: Option<Uuid>) -> PortResult<Vec<Feedback>> {
        let inner = self.inner.read().await;
        let mut feedbacks: Vec<Feedback> = inner
            .feedbacks
            .values()
            .filter(|f| session_id.map_or(true, |id| f.session_id == id))
            .cloned()
            .collect();
        feedbacks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(feedbacks)
    }

    async fn update_feedback(&self, feedback: &Feedback) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .feedbacks
            .get_mut(&feedback.id)
            .ok_or_else(|| not_found("Feedback", feedback.id))?;
        *stored = feedback.clone();
        Ok(())
    }

    // --- Notes ---

    async fn create_note(&self, note: NewNote) -> PortResult<Note> {
        let now = Utc::now();
        let record = Note {
            id: Uuid::new_v4(),
            email: note.email,
            title: note.title,
            description: note.description,
            created_at: now,
            updated_at: now,
        };
        self.inner.write().await.notes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_note(&self, id: Uuid) -> PortResult<Note> {
        let inner = self.inner.read().await;
        inner.notes.get(&id).cloned().ok_or_else(|| not_found("Note", id))
    }

    async fn list_notes_by_email(&self, email: &str) -> PortResult<Vec<Note>> {
        let inner = self.inner.read().await;
        let mut notes: Vec<Note> = inner
            .notes
            .values()
            .filter(|n| n.email == email)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn update_note(&self, note: &Note) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .notes
            .get_mut(&note.id)
            .ok_or_else(|| not_found("Note", note.id))?;
        *stored = note.clone();
        Ok(())
    }

    async fn delete_note(&self, id: Uuid) -> PortResult<()> {
        let mut inner = self.inner.write().await;
        inner.notes.remove(&id).map(|_| ()).ok_or_else(|| not_found("Note", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutoring_core::domain::VerifiedIdentity;
    use tutoring_core::guards::{authorize, Guard, TUTOR_OR_ADMIN};
    use tutoring_core::roles::{change_role, list_users_with_roles, resolve_role, UserQuery};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            uid: None,
            email: email.to_string(),
            name: "Uma".to_string(),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_user_is_idempotent() {
        let store = MemoryStore::new();
        let (first, inserted) = store.upsert_user(new_user("uma@x.com")).await.unwrap();
        let (second, inserted_again) = store.upsert_user(new_user("uma@x.com")).await.unwrap();

        assert!(inserted);
        assert!(!inserted_again);
        assert_eq!(first.id, second.id);
        assert_eq!(store.count_users(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_admin_record_outranks_approved_application() {
        let store = MemoryStore::new();
        store
            .create_tutor_application(NewTutorApplication {
                email: "ada@x.com".to_string(),
                name: "Ada".to_string(),
                photo_url: None,
                status: TutorStatus::Approved,
            })
            .await
            .unwrap();
        store.add_admin("ada@x.com").await.unwrap();
        assert_eq!(resolve_role(&store, "ada@x.com").await.unwrap(), Role::Admin);

        // Demoted from admin, still an approved tutor.
        store.remove_admin("ada@x.com").await.unwrap();
        assert_eq!(resolve_role(&store, "ada@x.com").await.unwrap(), Role::Tutor);
    }

    #[tokio::test]
    async fn test_pending_application_is_still_student() {
        let store = MemoryStore::new();
        store
            .create_tutor_application(NewTutorApplication {
                email: "pat@x.com".to_string(),
                name: "Pat".to_string(),
                photo_url: None,
                status: TutorStatus::Pending,
            })
            .await
            .unwrap();
        assert_eq!(resolve_role(&store, "pat@x.com").await.unwrap(), Role::Student);
    }

    #[tokio::test]
    async fn test_change_role_is_repeatable() {
        let store = MemoryStore::new();
        let (user, _) = store.upsert_user(new_user("uma@x.com")).await.unwrap();

        change_role(&store, user.id, Role::Admin).await.unwrap();
        change_role(&store, user.id, Role::Admin).await.unwrap();
        assert_eq!(store.admin_emails().await.unwrap(), vec!["uma@x.com".to_string()]);

        change_role(&store, user.id, Role::Student).await.unwrap();
        assert!(!store.is_admin("uma@x.com").await.unwrap());
        assert!(store.find_tutor_application_by_email("uma@x.com").await.unwrap().is_none());
        assert_eq!(resolve_role(&store, "uma@x.com").await.unwrap(), Role::Student);
    }

    #[tokio::test]
    async fn test_change_role_unknown_user_is_not_found() {
        let store = MemoryStore::new();
        let result = change_role(&store, Uuid::new_v4(), Role::Tutor).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    fn identity(email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            email: email.to_string(),
            subject: None,
            name: None,
        }
    }

    #[tokio::test]
    async fn test_empty_guard_list_denies() {
        let store = MemoryStore::new();
        store.add_admin("ada@x.com").await.unwrap();
        let result = authorize(&store, &identity("ada@x.com"), &[], &[]).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_guards_short_circuit_in_order() {
        let store = MemoryStore::new();
        store.add_admin("ada@x.com").await.unwrap();
        let params = vec![("email".to_string(), "bob@x.com".to_string())];

        // Admin passes, self-access then rejects
        let guards = &[Guard::Admin, Guard::SelfAccess("email")];
        let result = authorize(&store, &identity("ada@x.com"), guards, &params).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));

        let result = authorize(&store, &identity("BOB@x.com"), &[Guard::SelfAccess("email")], &params)
            .await;
        assert!(result.is_ok());

        // A misnamed parameter never passes
        let result = authorize(&store, &identity("bob@x.com"), &[Guard::SelfAccess("id")], &params)
            .await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_tutor_or_admin_accepts_either() {
        let store = MemoryStore::new();
        store.add_admin("ada@x.com").await.unwrap();
        store
            .create_tutor_application(NewTutorApplication {
                email: "tina@x.com".to_string(),
                name: "Tina".to_string(),
                photo_url: None,
                status: TutorStatus::Approved,
            })
            .await
            .unwrap();

        for email in ["ada@x.com", "tina@x.com"] {
            assert!(authorize(&store, &identity(email), TUTOR_OR_ADMIN, &[]).await.is_ok());
        }
        let result = authorize(&store, &identity("sam@x.com"), TUTOR_OR_ADMIN, &[]).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_student_guard_needs_a_user_record() {
        let store = MemoryStore::new();
        let result = authorize(&store, &identity("ghost@x.com"), &[Guard::Student], &[]).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));

        store.upsert_user(new_user("uma@x.com")).await.unwrap();
        assert!(authorize(&store, &identity("uma@x.com"), &[Guard::Student], &[]).await.is_ok());
    }

    #[tokio::test]
    async fn test_nested_any_of_denies() {
        let store = MemoryStore::new();
        store.add_admin("ada@x.com").await.unwrap();

        let nested = &[Guard::AnyOf(&[Guard::AnyOf(&[Guard::Admin])])];
        let result = authorize(&store, &identity("ada@x.com"), nested, &[]).await;
        assert!(matches!(result, Err(PortError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_listing_far_past_the_end_is_empty() {
        let store = MemoryStore::new();
        store.upsert_user(new_user("uma@x.com")).await.unwrap();

        let query = UserQuery {
            search: None,
            page: Some(u64::MAX),
            limit: Some(10),
        };
        let page = list_users_with_roles(&store, &query).await.unwrap();
        assert!(page.users.is_empty());
        assert_eq!(page.total, 1);
        assert_eq!(page.page, u64::MAX);
    }

    //=====================================================================================
    // Store outages during guard evaluation
    //=====================================================================================

    /// Fails every call, as a store whose connection is gone would.
    struct UnavailableStore;

    fn offline<T>() -> PortResult<T> {
        Err(PortError::Unexpected("store offline".to_string()))
    }

    #[async_trait]
    impl DatabaseService for UnavailableStore {
        async fn upsert_user(&self, _: NewUser) -> PortResult<(User, bool)> {
            offline()
        }
        async fn get_user_by_id(&self, _: Uuid) -> PortResult<User> {
            offline()
        }
        async fn find_user_by_email(&self, _: &str) -> PortResult<Option<User>> {
            offline()
        }
        async fn set_user_role(&self, _: Uuid, _: Role) -> PortResult<()> {
            offline()
        }
        async fn count_users(&self, _: Option<&str>) -> PortResult<u64> {
            offline()
        }
        async fn list_users(&self, _: Option<&str>, _: u64, _: u64) -> PortResult<Vec<User>> {
            offline()
        }
        async fn is_admin(&self, _: &str) -> PortResult<bool> {
            offline()
        }
        async fn add_admin(&self, _: &str) -> PortResult<bool> {
            offline()
        }
        async fn remove_admin(&self, _: &str) -> PortResult<bool> {
            offline()
        }
        async fn admin_emails(&self) -> PortResult<Vec<String>> {
            offline()
        }
        async fn create_tutor_application(
            &self,
            _: NewTutorApplication,
        ) -> PortResult<TutorApplication> {
            offline()
        }
        async fn find_tutor_application_by_email(
            &self,
            _: &str,
        ) -> PortResult<Option<TutorApplication>> {
            offline()
        }
        async fn list_tutor_applications(
            &self,
            _: Option<TutorStatus>,
        ) -> PortResult<Vec<TutorApplication>> {
            offline()
        }
        async fn update_tutor_application_status(
            &self,
            _: Uuid,
            _: TutorStatus,
            _: Option<String>,
        ) -> PortResult<TutorApplication> {
            offline()
        }
        async fn reopen_tutor_application(
            &self,
            _: Uuid,
            _: &str,
            _: Option<&str>,
        ) -> PortResult<TutorApplication> {
            offline()
        }
        async fn delete_tutor_application(&self, _: Uuid) -> PortResult<()> {
            offline()
        }
        async fn has_approved_application(&self, _: &str) -> PortResult<bool> {
            offline()
        }
        async fn approved_tutor_emails(&self) -> PortResult<Vec<String>> {
            offline()
        }
        async fn create_session(
            &self,
            _: &str,
            _: Map<String, Value>,
        ) -> PortResult<TutoringSession> {
            offline()
        }
        async fn get_session(&self, _: Uuid) -> PortResult<TutoringSession> {
            offline()
        }
        async fn list_sessions(&self, _: SessionFilter) -> PortResult<Vec<TutoringSession>> {
            offline()
        }
        async fn update_session_details(
            &self,
            _: Uuid,
            _: Map<String, Value>,
        ) -> PortResult<TutoringSession> {
            offline()
        }
        async fn update_session_status(
            &self,
            _: Uuid,
            _: SessionStatus,
            _: Option<String>,
        ) -> PortResult<TutoringSession> {
            offline()
        }
        async fn delete_session(&self, _: Uuid) -> PortResult<()> {
            offline()
        }
        async fn create_material(&self, _: NewMaterial) -> PortResult<Material> {
            offline()
        }
        async fn get_material(&self, _: Uuid) -> PortResult<Material> {
            offline()
        }
        async fn list_materials(&self, _: MaterialFilter) -> PortResult<Vec<Material>> {
            offline()
        }
        async fn list_materials_for_sessions(&self, _: &[Uuid]) -> PortResult<Vec<Material>> {
            offline()
        }
        async fn update_material(&self, _: &Material) -> PortResult<()> {
            offline()
        }
        async fn delete_material(&self, _: Uuid) -> PortResult<()> {
            offline()
        }
        async fn create_payment(&self, _: NewPayment) -> PortResult<Payment> {
            offline()
        }
        async fn list_payments_by_email(&self, _: &str) -> PortResult<Vec<Payment>> {
            offline()
        }
        async fn has_payment(&self, _: &str, _: Uuid) -> PortResult<bool> {
            offline()
        }
        async fn create_feedback(&self, _: NewFeedback) -> PortResult<Feedback> {
            offline()
        }
        async fn get_feedback(&self, _: Uuid) -> PortResult<Feedback> {
            offline()
        }
        async fn list_feedbacks(&self, _: Option<Uuid>) -> PortResult<Vec<Feedback>> {
            offline()
        }
        async fn update_feedback(&self, _: &Feedback) -> PortResult<()> {
            offline()
        }
        async fn create_note(&self, _: NewNote) -> PortResult<Note> {
            offline()
        }
        async fn get_note(&self, _: Uuid) -> PortResult<Note> {
            offline()
        }
        async fn list_notes_by_email(&self, _: &str) -> PortResult<Vec<Note>> {
            offline()
        }
        async fn update_note(&self, _: &Note) -> PortResult<()> {
            offline()
        }
        async fn delete_note(&self, _: Uuid) -> PortResult<()> {
            offline()
        }
    }

    #[tokio::test]
    async fn test_store_errors_are_not_turned_into_forbidden() {
        let store = UnavailableStore;
        let params = vec![("email".to_string(), "bob@x.com".to_string())];

        let result = authorize(&store, &identity("bob@x.com"), &[Guard::Admin], &params).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));

        // Every member of a group errors out: the outage surfaces, not a denial
        let result = authorize(&store, &identity("bob@x.com"), TUTOR_OR_ADMIN, &params).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));

        // A rejected member is skipped; the next member's outage still surfaces
        let group = &[Guard::AnyOf(&[Guard::SelfAccess("email"), Guard::Admin])];
        let result = authorize(&store, &identity("eve@x.com"), group, &params).await;
        assert!(matches!(result, Err(PortError::Unexpected(_))));

        // The first passing member ends the group before the store is touched
        assert!(authorize(&store, &identity("bob@x.com"), group, &params).await.is_ok());
    }
}
