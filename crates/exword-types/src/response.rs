//! Device response codes.

/// Numeric status returned by every device call.
///
/// Only [`ResponseCode::SUCCESS`] carries meaning for the shell; every other
/// value is a failure rendered through `Display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResponseCode(pub u8);

impl ResponseCode {
    pub const SUCCESS: Self = Self(0x20);
    pub const BAD_REQUEST: Self = Self(0x40);
    pub const UNAUTHORIZED: Self = Self(0x41);
    pub const FORBIDDEN: Self = Self(0x43);
    pub const NOT_FOUND: Self = Self(0x44);
    pub const TOO_LARGE: Self = Self(0x4d);
    pub const INTERNAL_ERROR: Self = Self(0x50);
    pub const NOT_IMPLEMENTED: Self = Self(0x51);
    pub const UNAVAILABLE: Self = Self(0x53);
}

impl std::fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::SUCCESS => write!(f, "OK, Success"),
            Self::BAD_REQUEST => write!(f, "Bad Request"),
            Self::UNAUTHORIZED => write!(f, "Unauthorized"),
            Self::FORBIDDEN => write!(f, "Forbidden"),
            Self::NOT_FOUND => write!(f, "Not Found"),
            Self::TOO_LARGE => write!(f, "Request Entity Too Large"),
            Self::INTERNAL_ERROR => write!(f, "Internal Server Error"),
            Self::NOT_IMPLEMENTED => write!(f, "Not Implemented"),
            Self::UNAVAILABLE => write!(f, "Service Unavailable"),
            Self(other) => write!(f, "Unknown response (0x{other:02x})"),
        }
    }
}
