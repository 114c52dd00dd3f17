pub mod config;
pub mod didit;
pub mod logging;
