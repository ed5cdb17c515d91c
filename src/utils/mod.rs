//! Utility Functions and Diagnostics
//!
//! Session diagnostics and user-friendly error formatting.
//!
//! ## Diagnostics
//!
//! The [`diagnostics`] module describes the desktop session:
//!
//! ```rust
//! use monitor_toggle::utils::SessionInfo;
//!
//! let session = SessionInfo::gather();
//! if !session.is_gnome() {
//!     println!("Not a GNOME session");
//! }
//! ```
//!
//! ## Error Formatting
//!
//! The [`errors`] module turns failures into messages with troubleshooting
//! steps:
//!
//! ```rust
//! use monitor_toggle::utils::format_user_error;
//!
//! let error = anyhow::anyhow!("Failed to call GetCurrentState");
//! eprintln!("{}", format_user_error(&error));
//! ```
//!
//! Error categories with context-aware help:
//! - D-Bus errors → session bus and GNOME session checks
//! - Rejected layouts → stale state, unsupported modes
//! - Planning refusals → what was refused, nothing changed
//! - Config errors → syntax and value ranges

pub mod diagnostics;
pub mod errors;

// Re-export key types
pub use diagnostics::{detect_desktop, log_startup_diagnostics, SessionInfo};
pub use errors::format_user_error;
