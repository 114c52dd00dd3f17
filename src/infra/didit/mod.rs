pub mod client;

pub use client::{
    CreateSession, CreatedSession, DiditClient, ProviderError, SessionDecision, VerificationProvider,
};
