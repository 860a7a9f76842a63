pub mod domain;
pub mod guards;
pub mod patch;
pub mod ports;
pub mod roles;

pub use domain::{
    Feedback, Material, Note, Payment, Role, SessionStatus, TutorApplication, TutorStatus,
    TutoringSession, User, VerifiedIdentity,
};
pub use guards::{authorize, ensure_owner, ensure_owner_or_admin, Guard};
pub use ports::{DatabaseService, IdentityVerifier, PaymentProcessor, PortError, PortResult};
pub use roles::{change_role, derive_role, list_users_with_roles, resolve_role, RoleSets};
