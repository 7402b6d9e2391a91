//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the tour guide core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Error taxonomy shared by every component
//! - The user-facing error presentation hook
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that other modules depend on.
//! It establishes the logging conventions, the fail-fast configuration
//! builder, and the single path through which failures reach the user.

pub mod config;
pub mod error;
pub mod logging;
pub mod notify;

pub use error::{Error, ErrorKind, Result, UserFacingError};
pub use notify::{ErrorPresenter, LogNotifier, Notice, Notifier};
