//! crates/tutoring_core/src/guards.rs
//!
//! Composable access-control predicates evaluated after identity verification
//! and before a handler runs.
//!
//! A route declares an ordered slice of guards. The slice is evaluated left to
//! right and stops at the first rejection. An empty slice rejects: every
//! guarded route must name what it allows.

use tracing::debug;

use crate::domain::{Role, VerifiedIdentity};
use crate::ports::{DatabaseService, PortError, PortResult};
use crate::roles::resolve_role;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Derived role must be admin.
    Admin,
    /// Caller must hold an approved tutor application.
    ApprovedTutor,
    /// Caller's user record must carry the student role.
    Student,
    /// The named path parameter must equal the caller's email.
    SelfAccess(&'static str),
    /// At least one of the listed guards must pass. Members may not nest.
    AnyOf(&'static [Guard]),
}

pub const ADMIN_ONLY: &[Guard] = &[Guard::Admin];
pub const TUTOR_OR_ADMIN: &[Guard] = &[Guard::AnyOf(&[Guard::ApprovedTutor, Guard::Admin])];
pub const STUDENT_ONLY: &[Guard] = &[Guard::Student];

/// Evaluates `guards` in order for `identity`. `params` are the matched path
/// parameters of the request.
pub async fn authorize(
    db: &dyn DatabaseService,
    identity: &VerifiedIdentity,
    guards: &[Guard],
    params: &[(String, String)],
) -> PortResult<()> {
    if guards.is_empty() {
        return Err(PortError::Forbidden("route has no guard configured".to_string()));
    }

    for guard in guards {
        match guard {
            Guard::AnyOf(members) => {
                let mut passed = false;
                for member in members.iter() {
                    match check(db, identity, member, params).await {
                        Ok(()) => {
                            passed = true;
                            break;
                        }
                        Err(PortError::Forbidden(reason)) => {
                            debug!("Guard {:?} rejected {}: {}", member, identity.email, reason);
                        }
                        Err(e) => return Err(e),
                    }
                }
                if !passed {
                    return Err(PortError::Forbidden("insufficient role".to_string()));
                }
            }
            leaf => check(db, identity, leaf, params).await?,
        }
    }
    Ok(())
}

async fn check(
    db: &dyn DatabaseService,
    identity: &VerifiedIdentity,
    guard: &Guard,
    params: &[(String, String)],
) -> PortResult<()> {
    let allowed = match guard {
        Guard::Admin => resolve_role(db, &identity.email).await? == Role::Admin,
        Guard::ApprovedTutor => db.has_approved_application(&identity.email).await?,
        Guard::Student => matches!(
            db.find_user_by_email(&identity.email).await?,
            Some(user) if user.role == Role::Student
        ),
        Guard::SelfAccess(name) => {
            let value = params
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.as_str())
                .ok_or_else(|| PortError::Forbidden(format!("missing path parameter {}", name)))?;
            same_email(value, &identity.email)
        }
        Guard::AnyOf(_) => {
            return Err(PortError::Forbidden("nested guard groups are not allowed".to_string()))
        }
    };

    if allowed {
        Ok(())
    } else {
        Err(PortError::Forbidden(denial_reason(guard).to_string()))
    }
}

fn denial_reason(guard: &Guard) -> &'static str {
    match guard {
        Guard::Admin => "admin role required",
        Guard::ApprovedTutor => "approved tutor required",
        Guard::Student => "student role required",
        Guard::SelfAccess(_) => "access to another user's resource",
        Guard::AnyOf(_) => "insufficient role",
    }
}

/// Email comparison used for self-access and ownership checks.
pub fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

//=========================================================================================
// Ownership-gated Mutation
//=========================================================================================

/// Rejects unless `owner` is the caller.
pub fn ensure_owner(owner: &str, identity: &VerifiedIdentity) -> PortResult<()> {
    if same_email(owner, &identity.email) {
        Ok(())
    } else {
        Err(PortError::Forbidden("not the owner of this resource".to_string()))
    }
}

/// Rejects unless `owner` is the caller or the caller resolves to admin.
pub async fn ensure_owner_or_admin(
    db: &dyn DatabaseService,
    owner: &str,
    identity: &VerifiedIdentity,
) -> PortResult<()> {
    if same_email(owner, &identity.email) {
        return Ok(());
    }
    if resolve_role(db, &identity.email).await? == Role::Admin {
        return Ok(());
    }
    Err(PortError::Forbidden("not the owner of this resource".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> VerifiedIdentity {
        VerifiedIdentity {
            email: email.to_string(),
            subject: None,
            name: None,
        }
    }

    #[test]
    fn test_same_email_ignores_case_and_padding() {
        assert!(same_email("Carol@X.com", " carol@x.com"));
        assert!(!same_email("carol@x.com", "bob@x.com"));
    }

    #[test]
    fn test_ensure_owner() {
        assert!(ensure_owner("carol@x.com", &identity("carol@x.com")).is_ok());
        assert!(matches!(
            ensure_owner("carol@x.com", &identity("dave@x.com")),
            Err(PortError::Forbidden(_))
        ));
    }

    #[test]
    fn test_route_guard_sets() {
        assert_eq!(ADMIN_ONLY, &[Guard::Admin]);
        assert!(matches!(TUTOR_OR_ADMIN[0], Guard::AnyOf(members) if members.len() == 2));
    }
}
