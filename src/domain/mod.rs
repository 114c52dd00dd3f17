pub mod pharmacy;
pub mod verification;
pub mod webhook;
