//! Foundation types for exword.
//!
//! Shared by every exword crate: the error enum, device response codes and
//! the on-disk configuration.

pub mod config;
pub mod error;
pub mod response;

pub use config::ExwordConfig;
pub use error::{AuthKeyError, ExwordError, Result};
pub use response::ResponseCode;
