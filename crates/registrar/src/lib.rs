//! Derivative IP registration coordinator
//!
//! Ties the pinning, chain gateway and timeline clients together: a
//! staged workflow that pins content to IPFS and registers it as a
//! derivative IP asset, plus a scheduled discovery job that turns
//! keyword-matching timeline posts into registrations.

pub mod asset_lock;
pub mod config;
pub mod discovery;
pub mod error;
pub mod logging;
pub mod metadata;
pub mod processed;
pub mod record;
pub mod setup;
pub mod workflow;

pub use config::{AppConfig, ConfigError, WatchConfig};
pub use error::{RegistrarError, Result};
pub use record::RegistrationRecord;
pub use workflow::{DerivativeSubmission, ImageData, Workflow, WorkflowOptions, WorkflowStatus};
