//! Common error handling for ClaimTrack
//!
//! Each library crate keeps its own `thiserror` enum; the binaries convert those into
//! [`ClaimTrackError`], which carries a stable code from [`codes`] so operators and API
//! clients can tell a missing file from a malformed one without parsing messages.
//!
//! # Example
//!
//! ```rust
//! use error_common::{codes, ClaimTrackError};
//!
//! let err = ClaimTrackError::import(codes::import::UNKNOWN_FORMAT, "Cannot determine file format");
//! assert_eq!(err.code(), "IMPORT_1002");
//! ```

pub mod codes;
pub mod types;

pub use types::*;
