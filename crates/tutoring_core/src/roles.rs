//! crates/tutoring_core/src/roles.rs
//!
//! Effective role derivation, the admin role-mutation workflow and the
//! role-annotated user listing.
//!
//! A caller's role is never stored canonically. It is computed from two
//! membership facts with strict precedence:
//!
//! 1. an Admin record for the email => `Admin`
//! 2. an approved Tutor Application for the email => `Tutor`
//! 3. otherwise => `Student`
//!
//! `User.role` is a display cache written by [`change_role`] and is never
//! consulted here.

use std::collections::HashSet;

use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{NewTutorApplication, Role, TutorStatus, User, UserPage, UserWithRole};
use crate::ports::{DatabaseService, PortResult};

/// Default page size of the admin user listing.
pub const DEFAULT_PAGE_SIZE: u64 = 10;
/// Upper bound on the admin user listing page size.
pub const MAX_PAGE_SIZE: u64 = 100;

//=========================================================================================
// Pure Derivation
//=========================================================================================

/// The precedence rule itself.
pub fn derive_role(is_admin: bool, has_approved_application: bool) -> Role {
    if is_admin {
        Role::Admin
    } else if has_approved_application {
        Role::Tutor
    } else {
        Role::Student
    }
}

/// Precomputed membership sets used to annotate many users with one lookup each.
#[derive(Debug, Clone, Default)]
pub struct RoleSets {
    admins: HashSet<String>,
    approved_tutors: HashSet<String>,
}

impl RoleSets {
    pub fn new(
        admins: impl IntoIterator<Item = String>,
        approved_tutors: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            admins: admins.into_iter().collect(),
            approved_tutors: approved_tutors.into_iter().collect(),
        }
    }

    pub fn role_of(&self, email: &str) -> Role {
        derive_role(
            self.admins.contains(email),
            self.approved_tutors.contains(email),
        )
    }
}

//=========================================================================================
// Store-backed Resolution
//=========================================================================================

/// Re-queries the store on every call; the tutor query is skipped for admins.
pub async fn resolve_role(db: &dyn DatabaseService, email: &str) -> PortResult<Role> {
    if db.is_admin(email).await? {
        return Ok(Role::Admin);
    }
    let approved = db.has_approved_application(email).await?;
    Ok(derive_role(false, approved))
}

/// Applies an admin's role decision to the target user.
///
/// The steps span three collections and are not atomic. Each step is idempotent,
/// so a failed call is repaired by calling again with the same target role.
pub async fn change_role(db: &dyn DatabaseService, user_id: Uuid, role: Role) -> PortResult<User> {
    // 1. Target must exist.
    let user = db.get_user_by_id(user_id).await?;

    // 2. Admin membership.
    if role == Role::Admin {
        if db.add_admin(&user.email).await? {
            info!("Granted admin to {}", user.email);
        }
    } else if db.remove_admin(&user.email).await? {
        info!("Revoked admin from {}", user.email);
    }

    // 3. Tutor application.
    let existing = db.find_tutor_application_by_email(&user.email).await?;
    match (role, existing) {
        (Role::Tutor, None) => {
            db.create_tutor_application(NewTutorApplication {
                email: user.email.clone(),
                name: user.name.clone(),
                photo_url: user.photo_url.clone(),
                status: TutorStatus::Approved,
            })
            .await?;
            info!("Synthesized approved tutor application for {}", user.email);
        }
        (Role::Tutor, Some(application)) => {
            if application.status != TutorStatus::Approved {
                db.update_tutor_application_status(application.id, TutorStatus::Approved, None)
                    .await?;
            }
        }
        (_, Some(application)) => {
            if application.status != TutorStatus::Removed {
                db.update_tutor_application_status(application.id, TutorStatus::Removed, None)
                    .await?;
                info!("Tutor application of {} marked removed", user.email);
            }
        }
        (_, None) => {}
    }

    // 4. Display cache.
    db.set_user_role(user.id, role).await.map_err(|e| {
        warn!("Role of {} applied but display role not updated: {}", user.email, e);
        e
    })?;

    Ok(User { role, ..user })
}

/// Normalised paging input for [`list_users_with_roles`].
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl UserQuery {
    pub fn page(&self) -> u64 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Rows to skip. Saturates, and never exceeds what a signed 64-bit offset
    /// can carry.
    pub fn offset(&self) -> u64 {
        self.page()
            .saturating_sub(1)
            .saturating_mul(self.limit())
            .min(i64::MAX as u64)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Counts the matches, fetches the page, then annotates every row against two
/// batch-fetched membership sets.
pub async fn list_users_with_roles(
    db: &dyn DatabaseService,
    query: &UserQuery,
) -> PortResult<UserPage> {
    let (page, limit, search) = (query.page(), query.limit(), query.search());

    let total = db.count_users(search).await?;
    let users = db.list_users(search, query.offset(), limit).await?;

    let sets = RoleSets::new(db.admin_emails().await?, db.approved_tutor_emails().await?);
    let users = users
        .into_iter()
        .map(|user| {
            let role = sets.role_of(&user.email);
            UserWithRole { user, role }
        })
        .collect();

    Ok(UserPage { users, total, page, limit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_outranks_everything() {
        assert_eq!(derive_role(true, true), Role::Admin);
        assert_eq!(derive_role(true, false), Role::Admin);
    }

    #[test]
    fn test_approved_tutor_without_admin() {
        assert_eq!(derive_role(false, true), Role::Tutor);
    }

    #[test]
    fn test_default_is_student() {
        assert_eq!(derive_role(false, false), Role::Student);
    }

    #[test]
    fn test_role_sets_precedence() {
        let sets = RoleSets::new(
            vec!["root@x.com".to_string()],
            vec!["root@x.com".to_string(), "tina@x.com".to_string()],
        );
        assert_eq!(sets.role_of("root@x.com"), Role::Admin);
        assert_eq!(sets.role_of("tina@x.com"), Role::Tutor);
        assert_eq!(sets.role_of("sam@x.com"), Role::Student);
    }

    #[test]
    fn test_user_query_defaults_and_clamps() {
        let query = UserQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), DEFAULT_PAGE_SIZE);
        assert_eq!(query.search(), None);

        let query = UserQuery {
            search: Some("  ".to_string()),
            page: Some(0),
            limit: Some(10_000),
        };
        assert_eq!(query.page(), 1);
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.search(), None);
    }

    #[test]
    fn test_user_query_offset_saturates() {
        let query = UserQuery {
            search: None,
            page: Some(3),
            limit: Some(10),
        };
        assert_eq!(query.offset(), 20);

        let query = UserQuery {
            search: None,
            page: Some(u64::MAX),
            limit: Some(10),
        };
        assert_eq!(query.offset(), i64::MAX as u64);
    }
}
