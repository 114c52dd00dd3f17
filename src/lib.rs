pub mod app;
pub mod crypto;
pub mod domain;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::{PharmacyService, ServiceError, VerificationService, VerificationSettings, WebhookOutcome};
pub use crypto::{compute_signature, verify_signature};
pub use domain::verification::{ProgressView, VerificationStatus};
pub use infra::config::AppConfig;
pub use storage::{MemoryStore, PostgresStore};
