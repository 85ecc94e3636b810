//! Shell session state: the open device handle, current path, mode,
//! authentication and user options.

use exword_device::{Connector, Device, INTERNAL_MEM, OpenMode, OpenOptions, ROOT, SD_MARKER};
use exword_types::error::{ExwordError, Result};

use crate::path::device_path;

/// User-configurable options (`set debug`, `set mkdir`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Options {
    /// Device debug verbosity, 0-5.
    pub debug: u8,
    /// Create missing directories when changing path.
    pub auto_mkdir: bool,
}

/// The single mutable context handed to every command.
///
/// `device` is `Some` exactly while connected, and `cwd` then holds the
/// last path the device accepted.
pub struct Session {
    connector: Box<dyn Connector>,
    device: Option<Box<dyn Device>>,
    mode: OpenMode,
    cwd: Option<String>,
    authenticated: bool,
    sd_present: bool,
    options: Options,
    running: bool,
}

impl Session {
    pub fn new(connector: Box<dyn Connector>, options: Options) -> Self {
        Self {
            connector,
            device: None,
            mode: OpenMode::default(),
            cwd: None,
            authenticated: false,
            sd_present: false,
            options,
            running: false,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.device.is_some()
    }

    /// Mode the current connection was opened with.
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    /// Current device path; `None` while disconnected.
    pub fn cwd(&self) -> Option<&str> {
        self.cwd.as_deref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub(crate) fn set_authenticated(&mut self, authenticated: bool) {
        if authenticated != self.authenticated {
            log::info!("authenticated: {authenticated}");
        }
        self.authenticated = authenticated;
    }

    /// Whether the root listing showed an SD card at connect time.
    pub fn sd_present(&self) -> bool {
        self.sd_present
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub(crate) fn start(&mut self) {
        self.running = true;
    }

    pub(crate) fn stop(&mut self) {
        self.running = false;
    }

    /// The open device, or `NotConnected`.
    pub fn device(&mut self) -> Result<&mut Box<dyn Device>> {
        self.device.as_mut().ok_or(ExwordError::NotConnected)
    }

    /// Open, configure and handshake with the device, then move to the
    /// internal memory root (creating it if needed).
    ///
    /// On failure the handle is dropped and the session stays disconnected.
    pub fn connect(&mut self, options: OpenOptions) -> Result<()> {
        if self.is_connected() {
            return Ok(());
        }
        log::debug!("open flags {:#06x}", options.bits());
        let mut device = self
            .connector
            .open(options)
            .ok_or(ExwordError::DeviceNotFound)?;
        device.set_debug(self.options.debug);
        device.connect().map_err(|code| {
            log::info!("connect handshake refused: {code}");
            ExwordError::ConnectFailed(code)
        })?;

        self.device = Some(device);
        self.mode = options.mode;
        self.authenticated = false;
        self.cwd = None;
        self.sd_present = false;
        match self.change_path(ROOT, "", false) {
            Ok(()) => self.sd_present = self.detect_sd_card(),
            Err(e) => log::debug!("device root unavailable: {e}"),
        }
        if let Err(e) = self.change_path(INTERNAL_MEM, "/", true) {
            log::warn!("could not enter internal memory: {e}");
        }
        log::info!(
            "connected ({}, {}), sd card: {}",
            options.mode,
            options.locale,
            self.sd_present
        );
        Ok(())
    }

    /// Disconnect and close the device. Returns `false` when there was
    /// nothing to disconnect.
    pub fn disconnect(&mut self) -> bool {
        let Some(mut device) = self.device.take() else {
            return false;
        };
        device.disconnect();
        drop(device);
        self.cwd = None;
        self.authenticated = false;
        log::info!("disconnected");
        true
    }

    /// Point the device at `prefix` joined with `path`, canonicalized.
    ///
    /// This is the only place `cwd` changes while connected, and it changes
    /// only when the device accepts the path.
    pub fn change_path(&mut self, prefix: &str, path: &str, mkdir: bool) -> Result<()> {
        let target = device_path(prefix, path);
        log::debug!("setpath {target} (mkdir: {mkdir})");
        self.device()?.setpath(&target, mkdir)?;
        self.cwd = Some(target);
        Ok(())
    }

    /// Best effort: move the device back to the session's path.
    pub fn restore_path(&mut self) -> Result<()> {
        let Some(cwd) = self.cwd.clone() else {
            return Ok(());
        };
        self.device()?.setpath(&cwd, false).map_err(|code| {
            log::warn!("could not restore device path {cwd}: {code}");
            ExwordError::Device(code)
        })
    }

    /// Store a new debug level, forwarding it to the device if connected.
    pub fn set_debug(&mut self, level: u8) {
        self.options.debug = level;
        if let Some(device) = self.device.as_mut() {
            device.set_debug(level);
        }
    }

    pub fn set_auto_mkdir(&mut self, on: bool) {
        self.options.auto_mkdir = on;
    }

    /// Look for the SD card marker in a listing of the current directory.
    fn detect_sd_card(&mut self) -> bool {
        let Some(device) = self.device.as_mut() else {
            return false;
        };
        match device.list() {
            Ok(entries) => entries.iter().any(|entry| entry.is_named(SD_MARKER)),
            Err(code) => {
                log::debug!("root listing failed: {code}");
                false
            },
        }
    }
}
