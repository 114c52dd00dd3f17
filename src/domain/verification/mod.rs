//! Identity-verification session lifecycle.

pub mod session;
pub mod status;

pub use session::{ProgressView, SessionUpdate, VerificationSession};
pub use status::{UnknownStatus, VerificationStatus};
