pub mod signature;

pub use signature::{compute_signature, verify_signature, SignatureError, DEFAULT_TOLERANCE_SECS};
