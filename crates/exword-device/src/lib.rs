//! Device boundary for exword.
//!
//! The shell talks to an attached dictionary exclusively through the
//! [`Connector`] and [`Device`] traits. Every call answers with a response
//! code; non-success codes surface as `Err(ResponseCode)` and are never
//! interpreted beyond "failed".

pub mod sim;

use exword_types::ResponseCode;

pub use sim::{Call, SimulatedConnector, SimulatedDevice};

/// Result of a device call: the payload on success, the raw code otherwise.
pub type Response<T> = std::result::Result<T, ResponseCode>;

/// Top of the device file system.
pub const ROOT: &str = "\\";
/// Internal memory storage root.
pub const INTERNAL_MEM: &str = "\\_INTERNAL_00";
/// SD card storage root.
pub const SD_CARD: &str = "\\_SD_00";
/// Name of the root entry that marks an inserted SD card.
pub const SD_MARKER: &str = "_SD_00";

/// Raw authentication key for the add-on dictionary sub-protocol.
pub type AuthKey = [u8; 20];

// ---------------------------------------------------------------------------
// Open options
// ---------------------------------------------------------------------------

/// Operating personality the device presents for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// CASIO Library (add-on dictionaries, general files).
    #[default]
    Library,
    /// Textloader.
    Text,
    /// CDLoader.
    Cd,
}

impl OpenMode {
    /// Parse the mode name used by `connect`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "library" => Some(Self::Library),
            "text" => Some(Self::Text),
            "cd" => Some(Self::Cd),
            _ => None,
        }
    }

    /// Open-flag bits for this mode.
    pub fn bits(self) -> u16 {
        match self {
            Self::Library => 0x0000,
            Self::Text => 0x0100,
            Self::Cd => 0x0200,
        }
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Library => write!(f, "library"),
            Self::Text => write!(f, "text"),
            Self::Cd => write!(f, "cd"),
        }
    }
}

/// Regional variant announced at connect time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Locale {
    #[default]
    Ja,
    Kr,
    Cn,
    De,
    Es,
    Fr,
    Ru,
}

impl Locale {
    /// Parse the locale name used by `connect`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ja" => Some(Self::Ja),
            "kr" => Some(Self::Kr),
            "cn" => Some(Self::Cn),
            "de" => Some(Self::De),
            "es" => Some(Self::Es),
            "fr" => Some(Self::Fr),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }

    /// Open-flag bits for this locale.
    pub fn bits(self) -> u16 {
        match self {
            Self::Ja => 0x20,
            Self::Kr => 0x40,
            Self::Cn => 0x60,
            Self::De => 0x80,
            Self::Es => 0xa0,
            Self::Fr => 0xc0,
            Self::Ru => 0xe0,
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Ja => "ja",
            Self::Kr => "kr",
            Self::Cn => "cn",
            Self::De => "de",
            Self::Es => "es",
            Self::Fr => "fr",
            Self::Ru => "ru",
        };
        f.write_str(name)
    }
}

/// Flags passed to [`Connector::open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    pub mode: OpenMode,
    pub locale: Locale,
}

impl OpenOptions {
    /// Combined open-flag word.
    pub fn bits(self) -> u16 {
        self.mode.bits() | self.locale.bits()
    }
}

// ---------------------------------------------------------------------------
// Wire value types
// ---------------------------------------------------------------------------

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Raw name bytes; UTF-16LE when [`DirEntry::UNICODE`] is set.
    pub name: Vec<u8>,
    pub flags: u8,
    /// Raw entry size as reported by the device (name length + 3).
    pub size: u16,
}

/// Record size for a name of `name_len` bytes, saturating at `u16::MAX`.
fn entry_size(name_len: usize) -> u16 {
    u16::try_from(name_len + 3).unwrap_or(u16::MAX)
}

impl DirEntry {
    pub const DIR: u8 = 0x01;
    pub const UNICODE: u8 = 0x02;

    /// Build an entry from a plain (non-unicode) name.
    pub fn plain(name: &str, is_dir: bool) -> Self {
        let bytes = name.as_bytes().to_vec();
        Self {
            size: entry_size(bytes.len()),
            name: bytes,
            flags: if is_dir { Self::DIR } else { 0 },
        }
    }

    /// Build an entry whose name is sent as UTF-16LE.
    pub fn unicode(name: &str, is_dir: bool) -> Self {
        let bytes: Vec<u8> = name.encode_utf16().flat_map(u16::to_le_bytes).collect();
        let mut flags = Self::UNICODE;
        if is_dir {
            flags |= Self::DIR;
        }
        Self {
            size: entry_size(bytes.len()),
            name: bytes,
            flags,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.flags & Self::DIR != 0
    }

    pub fn is_unicode(&self) -> bool {
        self.flags & Self::UNICODE != 0
    }

    /// Name decoded for display.
    pub fn display_name(&self) -> String {
        if self.is_unicode() {
            let len = usize::from(self.size.saturating_sub(3)).min(self.name.len());
            let units: Vec<u16> = self.name[..len]
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        } else {
            String::from_utf8_lossy(&self.name).into_owned()
        }
    }

    /// Whether this entry's decoded name equals `name`.
    pub fn is_named(&self, name: &str) -> bool {
        self.display_name() == name
    }
}

/// Model information reported by the device.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Model {
    pub model: String,
    pub sub_model: String,
    pub ext_model: String,
    pub capabilities: u8,
}

impl Model {
    pub const CAP_SW: u8 = 0x01;
    pub const CAP_P: u8 = 0x02;
    pub const CAP_F: u8 = 0x04;
    pub const CAP_C: u8 = 0x08;
    pub const CAP_EXT: u8 = 0x10;

    pub fn has(&self, cap: u8) -> bool {
        self.capabilities & cap != 0
    }
}

/// Storage capacity of the current medium.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacity {
    pub total: u32,
    pub free: u32,
}

/// An installed add-on dictionary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddonDictionary {
    /// Five-character content id.
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Boundary traits
// ---------------------------------------------------------------------------

/// Opens handles to an attached dictionary.
pub trait Connector {
    /// Open the device with the given flags. `None` means no device answered.
    fn open(&self, options: OpenOptions) -> Option<Box<dyn Device>>;
}

/// An open device handle. Dropping the handle closes it.
pub trait Device {
    /// Protocol handshake.
    fn connect(&mut self) -> Response<()>;

    /// End the session; the handle should be dropped afterwards.
    fn disconnect(&mut self);

    /// Set the transport's own debug verbosity (0-5).
    fn set_debug(&mut self, level: u8);

    fn model(&mut self) -> Response<Model>;

    fn capacity(&mut self) -> Response<Capacity>;

    fn sd_format(&mut self) -> Response<()>;

    /// List the device's current directory.
    fn list(&mut self) -> Response<Vec<DirEntry>>;

    /// Change the device's current directory, optionally creating it.
    fn setpath(&mut self, path: &str, mkdir: bool) -> Response<()>;

    fn send_file(&mut self, name: &str, data: &[u8]) -> Response<()>;

    fn get_file(&mut self, name: &str) -> Response<Vec<u8>>;

    fn remove_file(&mut self, name: &str, unicode: bool) -> Response<()>;

    /// List add-on dictionaries installed under `root`.
    fn dict_list(&mut self, root: &str) -> Response<Vec<AddonDictionary>>;

    /// Reset authentication info for `user`, wiping installed add-ons.
    /// Answers with the key issued for later keyed authentication.
    fn dict_reset(&mut self, user: &str) -> Response<AuthKey>;

    /// Authenticate as `user`, with or without an explicit key.
    fn dict_auth(&mut self, user: &str, key: Option<&AuthKey>) -> Response<()>;

    fn dict_decrypt(&mut self, root: &str, id: &str) -> Response<()>;

    fn dict_remove(&mut self, root: &str, id: &str) -> Response<()>;

    fn dict_install(&mut self, root: &str, id: &str) -> Response<()>;
}
