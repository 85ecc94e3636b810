//! Error types for exword.
//!
//! Most variants render as the exact line the shell prints, so a handler can
//! bail out with `?` and the loop reports the error verbatim.

use std::io;

use crate::response::ResponseCode;

/// Errors produced by the exword shell and its device boundary.
#[derive(Debug, thiserror::Error)]
pub enum ExwordError {
    /// Malformed or missing user input, detected before any device call.
    #[error("{0}")]
    Usage(String),

    /// The device answered with a non-success response code.
    #[error("{0}")]
    Device(ResponseCode),

    /// `open` found no device.
    #[error("device not found")]
    DeviceNotFound,

    /// The connect handshake was refused.
    #[error("connect failed")]
    ConnectFailed(ResponseCode),

    #[error("Authentication failed.")]
    AuthFailed(ResponseCode),

    #[error("Not connected.")]
    NotConnected,

    #[error("Only available in library mode.")]
    WrongMode,

    #[error("Not authenticated.")]
    NotAuthenticated,

    #[error("SD card not inserted.")]
    SdNotInserted,

    #[error("Unknown command")]
    UnknownCommand,

    #[error("{0}")]
    AuthKey(#[from] AuthKeyError),

    #[error("config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("line editor error: {0}")]
    Readline(String),
}

impl From<ResponseCode> for ExwordError {
    fn from(code: ResponseCode) -> Self {
        Self::Device(code)
    }
}

/// Rejections of a `0x<40 hex digits>` authentication key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthKeyError {
    #[error("Invalid character in authkey.")]
    InvalidCharacter,

    #[error("Authkey wrong length. Must be 20 bytes.")]
    WrongLength,
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ExwordError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_error_display_is_verbatim() {
        let e = ExwordError::Usage("No file specified".into());
        assert_eq!(format!("{e}"), "No file specified");
    }

    #[test]
    fn device_error_displays_response_text() {
        let e = ExwordError::Device(ResponseCode::NOT_FOUND);
        assert_eq!(format!("{e}"), "Not Found");
    }

    #[test]
    fn response_code_converts_into_device_error() {
        let e: ExwordError = ResponseCode::FORBIDDEN.into();
        assert!(matches!(e, ExwordError::Device(code) if code == ResponseCode::FORBIDDEN));
    }

    #[test]
    fn precondition_messages() {
        assert_eq!(format!("{}", ExwordError::NotConnected), "Not connected.");
        assert_eq!(format!("{}", ExwordError::NotAuthenticated), "Not authenticated.");
        assert_eq!(format!("{}", ExwordError::SdNotInserted), "SD card not inserted.");
        assert_eq!(
            format!("{}", ExwordError::WrongMode),
            "Only available in library mode."
        );
    }

    #[test]
    fn connect_failures_hide_the_code() {
        assert_eq!(format!("{}", ExwordError::DeviceNotFound), "device not found");
        let e = ExwordError::ConnectFailed(ResponseCode::UNAVAILABLE);
        assert_eq!(format!("{e}"), "connect failed");
        let e = ExwordError::AuthFailed(ResponseCode::UNAUTHORIZED);
        assert_eq!(format!("{e}"), "Authentication failed.");
    }

    #[test]
    fn auth_key_errors_are_distinct() {
        let bad_char: ExwordError = AuthKeyError::InvalidCharacter.into();
        let bad_len: ExwordError = AuthKeyError::WrongLength.into();
        assert_eq!(format!("{bad_char}"), "Invalid character in authkey.");
        assert_eq!(format!("{bad_len}"), "Authkey wrong length. Must be 20 bytes.");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "gone");
        let e: ExwordError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("gone"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let bad_toml = "this is [[[not valid toml";
        let toml_err = toml::from_str::<toml::Value>(bad_toml).unwrap_err();
        let e: ExwordError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn result_alias_err() {
        let r: Result<i32> = Err(ExwordError::UnknownCommand);
        assert!(r.is_err());
    }
}
