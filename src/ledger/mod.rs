//! Per-user identity records and login accounting.

pub mod models;
pub mod service;

pub use models::{HwidPolicy, ProviderProfile, UserRecord};
pub use service::{IdentityLedger, LoginError};
