//! Form controller core for the Quickstart configuration wizard.
//!
//! Everything here is plain state plus the backend calls each wizard page
//! makes. The `quickstart-frontend` crate reads the DOM into these models,
//! runs them, and writes the results back.

pub mod accordion;
pub mod api;
pub mod config;
pub mod credentials;
pub mod editors;
pub mod error;
pub mod flags;
pub mod images;
pub mod libraries;
pub mod navigation;
pub mod oauth;
pub mod separator;
pub mod settings;
pub mod storage;
pub mod webhooks;

pub use api::{MediaKind, Reply, Transport};
pub use config::WizardConfig;
pub use error::{Result, WizardError};
pub use flags::{StatusMessage, Tone};
