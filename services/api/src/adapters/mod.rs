pub mod db;
pub mod identity;
pub mod memory;
pub mod stripe;

pub use db::DbAdapter;
pub use identity::JwtIdentityVerifier;
pub use memory::MemoryStore;
pub use stripe::StripePaymentAdapter;
