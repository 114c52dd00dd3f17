pub mod error;
pub mod pharmacy_service;
pub mod verification_service;

pub use error::ServiceError;
pub use pharmacy_service::PharmacyService;
pub use verification_service::{VerificationService, VerificationSettings, WebhookOutcome};
