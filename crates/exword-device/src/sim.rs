//! In-memory simulated dictionary.
//!
//! Implements the full device contract over a `BTreeMap` file tree keyed by
//! canonical backslash paths. Handles opened from one [`SimulatedConnector`]
//! share its state, so a test (or the shell's demo mode) can seed files,
//! inject failure codes and inspect the journal of every boundary call.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use exword_types::ResponseCode;
use exword_types::config::SimulatorConfig;

use crate::{
    AddonDictionary, AuthKey, Capacity, Connector, DirEntry, Device, INTERNAL_MEM, Model,
    OpenOptions, ROOT, Response, SD_CARD,
};

const INTERNAL_TOTAL: u32 = 100_000_000;
const SD_TOTAL: u32 = 2_000_000_000;
const USER_DIR: &str = "_USER";

/// A boundary call recorded by the simulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Open(OpenOptions),
    Connect,
    Disconnect,
    Close,
    SetDebug(u8),
    Model,
    Capacity,
    SdFormat,
    List,
    SetPath { path: String, mkdir: bool },
    SendFile { name: String, len: usize },
    GetFile(String),
    RemoveFile { name: String, unicode: bool },
    DictList(String),
    DictReset(String),
    DictAuth { user: String, key: Option<AuthKey> },
    DictDecrypt { root: String, id: String },
    DictRemove { root: String, id: String },
    DictInstall { root: String, id: String },
}

impl Call {
    /// Operation name used for failure injection.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Open(_) => "open",
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Close => "close",
            Self::SetDebug(_) => "set_debug",
            Self::Model => "model",
            Self::Capacity => "capacity",
            Self::SdFormat => "sd_format",
            Self::List => "list",
            Self::SetPath { .. } => "setpath",
            Self::SendFile { .. } => "send_file",
            Self::GetFile(_) => "get_file",
            Self::RemoveFile { .. } => "remove_file",
            Self::DictList(_) => "dict_list",
            Self::DictReset(_) => "dict_reset",
            Self::DictAuth { .. } => "dict_auth",
            Self::DictDecrypt { .. } => "dict_decrypt",
            Self::DictRemove { .. } => "dict_remove",
            Self::DictInstall { .. } => "dict_install",
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
}

#[derive(Debug)]
struct SimState {
    present: bool,
    connected: bool,
    model: String,
    debug: u8,
    cwd: String,
    nodes: BTreeMap<String, Node>,
    users: HashMap<String, AuthKey>,
    session_user: Option<String>,
    /// Installed add-ons keyed by (storage root, id).
    installed: BTreeMap<(String, String), AddonDictionary>,
    failures: HashMap<&'static str, ResponseCode>,
    journal: Vec<Call>,
}

impl SimState {
    /// Record a call and return any failure injected for it.
    fn record(&mut self, call: Call) -> Response<()> {
        if self.debug > 0 {
            log::debug!("sim <- {call:?}");
        }
        let injected = self.failures.get(call.name()).copied();
        self.journal.push(call);
        match injected {
            Some(code) => Err(code),
            None => Ok(()),
        }
    }

    fn require_connected(&self) -> Response<()> {
        if self.connected {
            Ok(())
        } else {
            Err(ResponseCode::BAD_REQUEST)
        }
    }

    /// Storage root (`\_INTERNAL_00` or `\_SD_00`) containing `path`.
    fn storage_root(&self, path: &str) -> Option<&'static str> {
        [INTERNAL_MEM, SD_CARD].into_iter().find(|root| {
            self.nodes.contains_key(*root)
                && (path == *root || path.starts_with(&format!("{root}\\")))
        })
    }

    fn mkdir_all(&mut self, path: &str) {
        let mut current = String::new();
        for part in path.split('\\').filter(|p| !p.is_empty()) {
            current.push('\\');
            current.push_str(part);
            self.nodes.entry(current.clone()).or_insert(Node::Dir);
        }
    }

    fn remove_tree(&mut self, path: &str) {
        let prefix = format!("{path}\\");
        self.nodes
            .retain(|key, _| key != path && !key.starts_with(&prefix));
    }

    fn used_bytes(&self, root: &str) -> u64 {
        let prefix = format!("{root}\\");
        self.nodes
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, node)| match node {
                Node::File(data) => data.len() as u64,
                Node::Dir => 0,
            })
            .sum()
    }

    /// Validate a dictionary root argument and return its canonical key.
    fn dict_root(&self, root: &str) -> Response<String> {
        let root = canonical(root);
        if (root == INTERNAL_MEM || root == SD_CARD) && self.nodes.contains_key(&root) {
            Ok(root)
        } else {
            Err(ResponseCode::NOT_FOUND)
        }
    }

    fn require_user(&self) -> Response<()> {
        if self.session_user.is_some() {
            Ok(())
        } else {
            Err(ResponseCode::UNAUTHORIZED)
        }
    }

    /// Leave the device positioned inside the add-on storage of `root`.
    fn enter_user_dir(&mut self, root: &str) {
        let dir = join(root, USER_DIR);
        self.mkdir_all(&dir);
        self.cwd = dir;
    }
}

/// Canonical simulator key: backslash separated, single separators, leading
/// backslash, no trailing backslash except for the top level.
fn canonical(path: &str) -> String {
    let mut out = String::with_capacity(path.len() + 1);
    out.push('\\');
    for ch in path.chars() {
        let ch = if ch == '/' { '\\' } else { ch };
        if ch == '\\' && out.ends_with('\\') {
            continue;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('\\') {
        out.pop();
    }
    out
}

fn join(dir: &str, name: &str) -> String {
    if dir == ROOT {
        format!("\\{name}")
    } else {
        format!("{dir}\\{name}")
    }
}

/// Deterministic per-user key handed out by `dict_reset`.
fn derive_key(user: &str) -> AuthKey {
    let mut key = [0u8; 20];
    let bytes = user.as_bytes();
    for (i, b) in key.iter_mut().enumerate() {
        let seed = if bytes.is_empty() { 0 } else { bytes[i % bytes.len()] };
        *b = seed ^ (i as u8).wrapping_mul(0x1f);
    }
    key
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

/// Connector for the simulated dictionary.
///
/// Cloning shares the underlying state.
#[derive(Debug, Clone)]
pub struct SimulatedConnector {
    state: Rc<RefCell<SimState>>,
}

impl SimulatedConnector {
    /// A dictionary reporting `model`, optionally with an SD card inserted.
    pub fn new(model: &str, sd_card: bool) -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(ROOT.to_string(), Node::Dir);
        nodes.insert(INTERNAL_MEM.to_string(), Node::Dir);
        if sd_card {
            nodes.insert(SD_CARD.to_string(), Node::Dir);
        }
        Self {
            state: Rc::new(RefCell::new(SimState {
                present: true,
                connected: false,
                model: model.to_string(),
                debug: 0,
                cwd: ROOT.to_string(),
                nodes,
                users: HashMap::new(),
                session_user: None,
                installed: BTreeMap::new(),
                failures: HashMap::new(),
                journal: Vec::new(),
            })),
        }
    }

    pub fn from_config(config: &SimulatorConfig) -> Self {
        Self::new(&config.model, config.sd_card)
    }

    /// Simulate the device being plugged in or not.
    pub fn set_present(&self, present: bool) {
        self.state.borrow_mut().present = present;
    }

    /// Register a user whose auth key is already known to the device.
    pub fn add_user(&self, user: &str, key: AuthKey) {
        self.state.borrow_mut().users.insert(user.to_string(), key);
    }

    /// Key the device holds for `user`, if any.
    pub fn user_key(&self, user: &str) -> Option<AuthKey> {
        self.state.borrow().users.get(user).copied()
    }

    /// Make every future call of operation `op` answer with `code`.
    pub fn fail(&self, op: &'static str, code: ResponseCode) {
        self.state.borrow_mut().failures.insert(op, code);
    }

    /// Every call made so far, oldest first.
    pub fn journal(&self) -> Vec<Call> {
        self.state.borrow().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.borrow_mut().journal.clear();
    }

    /// Place a file on the device, creating parent directories.
    pub fn add_file(&self, path: &str, data: &[u8]) {
        let mut st = self.state.borrow_mut();
        let key = canonical(path);
        if let Some((parent, _)) = key.rsplit_once('\\') {
            st.mkdir_all(parent);
        }
        st.nodes.insert(key, Node::File(data.to_vec()));
    }

    /// Create a directory, including parents.
    pub fn add_dir(&self, path: &str) {
        self.state.borrow_mut().mkdir_all(&canonical(path));
    }

    pub fn file(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.borrow().nodes.get(&canonical(path)) {
            Some(Node::File(data)) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.borrow().nodes.contains_key(&canonical(path))
    }

    /// The device-side current directory.
    pub fn device_cwd(&self) -> String {
        self.state.borrow().cwd.clone()
    }

    /// Ids of add-ons installed under `root`.
    pub fn installed(&self, root: &str) -> Vec<String> {
        let root = canonical(root);
        self.state
            .borrow()
            .installed
            .keys()
            .filter(|(r, _)| *r == root)
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn debug_level(&self) -> u8 {
        self.state.borrow().debug
    }
}

impl Default for SimulatedConnector {
    fn default() -> Self {
        Self::from_config(&SimulatorConfig::default())
    }
}

impl Connector for SimulatedConnector {
    fn open(&self, options: OpenOptions) -> Option<Box<dyn Device>> {
        let mut st = self.state.borrow_mut();
        if st.record(Call::Open(options)).is_err() || !st.present {
            return None;
        }
        st.connected = false;
        st.session_user = None;
        st.cwd = ROOT.to_string();
        drop(st);
        Some(Box::new(SimulatedDevice {
            state: Rc::clone(&self.state),
        }))
    }
}

// ---------------------------------------------------------------------------
// Device
// ---------------------------------------------------------------------------

/// An open handle to the simulated dictionary.
#[derive(Debug)]
pub struct SimulatedDevice {
    state: Rc<RefCell<SimState>>,
}

impl Drop for SimulatedDevice {
    fn drop(&mut self) {
        let mut st = self.state.borrow_mut();
        st.journal.push(Call::Close);
        st.connected = false;
        st.session_user = None;
    }
}

impl Device for SimulatedDevice {
    fn connect(&mut self) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::Connect)?;
        st.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut st = self.state.borrow_mut();
        let _ = st.record(Call::Disconnect);
        st.connected = false;
        st.session_user = None;
    }

    fn set_debug(&mut self, level: u8) {
        let mut st = self.state.borrow_mut();
        let _ = st.record(Call::SetDebug(level));
        st.debug = level;
    }

    fn model(&mut self) -> Response<Model> {
        let mut st = self.state.borrow_mut();
        st.record(Call::Model)?;
        st.require_connected()?;
        Ok(Model {
            model: st.model.clone(),
            sub_model: "0102".to_string(),
            ext_model: String::new(),
            capabilities: Model::CAP_SW | Model::CAP_P | Model::CAP_C,
        })
    }

    fn capacity(&mut self) -> Response<Capacity> {
        let mut st = self.state.borrow_mut();
        st.record(Call::Capacity)?;
        st.require_connected()?;
        let root = st.storage_root(&st.cwd).unwrap_or(INTERNAL_MEM);
        let total = if root == SD_CARD { SD_TOTAL } else { INTERNAL_TOTAL };
        let used = u32::try_from(st.used_bytes(root)).unwrap_or(u32::MAX);
        Ok(Capacity {
            total,
            free: total.saturating_sub(used),
        })
    }

    fn sd_format(&mut self) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::SdFormat)?;
        st.require_connected()?;
        if !st.nodes.contains_key(SD_CARD) {
            return Err(ResponseCode::NOT_FOUND);
        }
        st.remove_tree(SD_CARD);
        st.nodes.insert(SD_CARD.to_string(), Node::Dir);
        st.installed.retain(|(root, _), _| root != SD_CARD);
        if !st.nodes.contains_key(&st.cwd) {
            st.cwd = SD_CARD.to_string();
        }
        Ok(())
    }

    fn list(&mut self) -> Response<Vec<DirEntry>> {
        let mut st = self.state.borrow_mut();
        st.record(Call::List)?;
        st.require_connected()?;
        let prefix = join(&st.cwd, "");
        let mut entries = Vec::new();
        for (key, node) in st.nodes.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            let rest = &key[prefix.len()..];
            if rest.is_empty() || rest.contains('\\') {
                continue;
            }
            let is_dir = matches!(node, Node::Dir);
            entries.push(if rest.is_ascii() {
                DirEntry::plain(rest, is_dir)
            } else {
                DirEntry::unicode(rest, is_dir)
            });
        }
        Ok(entries)
    }

    fn setpath(&mut self, path: &str, mkdir: bool) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::SetPath {
            path: path.to_string(),
            mkdir,
        })?;
        st.require_connected()?;
        let key = canonical(path);
        let is_dir = st.nodes.get(&key).map(|node| matches!(node, Node::Dir));
        match is_dir {
            Some(true) => {},
            Some(false) => return Err(ResponseCode::FORBIDDEN),
            None if mkdir && st.storage_root(&key).is_some() => st.mkdir_all(&key),
            None => return Err(ResponseCode::NOT_FOUND),
        }
        st.cwd = key;
        Ok(())
    }

    fn send_file(&mut self, name: &str, data: &[u8]) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::SendFile {
            name: name.to_string(),
            len: data.len(),
        })?;
        st.require_connected()?;
        if st.cwd == ROOT {
            return Err(ResponseCode::FORBIDDEN);
        }
        let key = join(&st.cwd, name);
        if matches!(st.nodes.get(&key), Some(Node::Dir)) {
            return Err(ResponseCode::FORBIDDEN);
        }
        st.nodes.insert(key, Node::File(data.to_vec()));
        Ok(())
    }

    fn get_file(&mut self, name: &str) -> Response<Vec<u8>> {
        let mut st = self.state.borrow_mut();
        st.record(Call::GetFile(name.to_string()))?;
        st.require_connected()?;
        match st.nodes.get(&join(&st.cwd, name)) {
            Some(Node::File(data)) => Ok(data.clone()),
            _ => Err(ResponseCode::NOT_FOUND),
        }
    }

    fn remove_file(&mut self, name: &str, unicode: bool) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::RemoveFile {
            name: name.to_string(),
            unicode,
        })?;
        st.require_connected()?;
        let key = join(&st.cwd, name);
        let is_dir = st.nodes.get(&key).map(|node| matches!(node, Node::Dir));
        match is_dir {
            Some(false) => {
                st.nodes.remove(&key);
                Ok(())
            },
            Some(true) => Err(ResponseCode::FORBIDDEN),
            None => Err(ResponseCode::NOT_FOUND),
        }
    }

    fn dict_list(&mut self, root: &str) -> Response<Vec<AddonDictionary>> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictList(root.to_string()))?;
        st.require_connected()?;
        let root = st.dict_root(root)?;
        st.enter_user_dir(&root);
        Ok(st
            .installed
            .iter()
            .filter(|((r, _), _)| *r == root)
            .map(|(_, dict)| dict.clone())
            .collect())
    }

    fn dict_reset(&mut self, user: &str) -> Response<AuthKey> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictReset(user.to_string()))?;
        st.require_connected()?;
        let key = derive_key(user);
        st.users.clear();
        st.users.insert(user.to_string(), key);
        st.installed.clear();
        for root in [INTERNAL_MEM, SD_CARD] {
            st.remove_tree(&join(root, USER_DIR));
        }
        st.session_user = Some(user.to_string());
        log::info!("sim: authentication info reset for {user}");
        Ok(key)
    }

    fn dict_auth(&mut self, user: &str, key: Option<&AuthKey>) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictAuth {
            user: user.to_string(),
            key: key.copied(),
        })?;
        st.require_connected()?;
        let accepted = match (st.users.get(user), key) {
            (Some(_), None) => true,
            (Some(stored), Some(given)) => stored == given,
            (None, _) => false,
        };
        if accepted {
            st.session_user = Some(user.to_string());
            Ok(())
        } else {
            st.session_user = None;
            Err(ResponseCode::UNAUTHORIZED)
        }
    }

    fn dict_decrypt(&mut self, root: &str, id: &str) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictDecrypt {
            root: root.to_string(),
            id: id.to_string(),
        })?;
        st.require_connected()?;
        st.require_user()?;
        let root = st.dict_root(root)?;
        if !st.installed.contains_key(&(root.clone(), id.to_string())) {
            return Err(ResponseCode::NOT_FOUND);
        }
        st.mkdir_all(&join(&root, id));
        st.enter_user_dir(&root);
        Ok(())
    }

    fn dict_remove(&mut self, root: &str, id: &str) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictRemove {
            root: root.to_string(),
            id: id.to_string(),
        })?;
        st.require_connected()?;
        st.require_user()?;
        let root = st.dict_root(root)?;
        if st.installed.remove(&(root.clone(), id.to_string())).is_none() {
            return Err(ResponseCode::NOT_FOUND);
        }
        let installed_dir = join(&join(&root, USER_DIR), id);
        st.remove_tree(&installed_dir);
        st.enter_user_dir(&root);
        Ok(())
    }

    fn dict_install(&mut self, root: &str, id: &str) -> Response<()> {
        let mut st = self.state.borrow_mut();
        st.record(Call::DictInstall {
            root: root.to_string(),
            id: id.to_string(),
        })?;
        st.require_connected()?;
        st.require_user()?;
        let root = st.dict_root(root)?;
        let staged = join(&root, id);
        if !matches!(st.nodes.get(&staged), Some(Node::Dir)) {
            return Err(ResponseCode::NOT_FOUND);
        }
        st.remove_tree(&staged);
        st.mkdir_all(&join(&join(&root, USER_DIR), id));
        st.installed.insert(
            (root.clone(), id.to_string()),
            AddonDictionary {
                id: id.to_string(),
                name: format!("Add-on dictionary {id}"),
            },
        );
        st.enter_user_dir(&root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open(conn: &SimulatedConnector) -> Box<dyn Device> {
        let mut dev = conn.open(OpenOptions::default()).unwrap();
        dev.connect().unwrap();
        dev
    }

    #[test]
    fn canonical_collapses_and_converts() {
        assert_eq!(canonical("\\_INTERNAL_00\\"), "\\_INTERNAL_00");
        assert_eq!(canonical("/_SD_00//a/b"), "\\_SD_00\\a\\b");
        assert_eq!(canonical("\\"), "\\");
        assert_eq!(canonical(""), "\\");
    }

    #[test]
    fn unplugged_device_does_not_open() {
        let conn = SimulatedConnector::new("XD", false);
        conn.set_present(false);
        assert!(conn.open(OpenOptions::default()).is_none());
        assert_eq!(conn.journal(), vec![Call::Open(OpenOptions::default())]);
    }

    #[test]
    fn root_listing_shows_storage_roots() {
        let conn = SimulatedConnector::new("XD", true);
        let mut dev = open(&conn);
        dev.setpath(ROOT, false).unwrap();
        let names: Vec<String> = dev.list().unwrap().iter().map(DirEntry::display_name).collect();
        assert_eq!(names, vec!["_INTERNAL_00", "_SD_00"]);
    }

    #[test]
    fn setpath_without_mkdir_requires_existing_dir() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        assert_eq!(
            dev.setpath("\\_INTERNAL_00\\new", false),
            Err(ResponseCode::NOT_FOUND)
        );
        dev.setpath("\\_INTERNAL_00\\new", true).unwrap();
        assert_eq!(conn.device_cwd(), "\\_INTERNAL_00\\new");
    }

    #[test]
    fn mkdir_refused_outside_storage_roots() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        assert_eq!(dev.setpath("\\_SD_00\\x", true), Err(ResponseCode::NOT_FOUND));
        assert_eq!(dev.setpath("\\other", true), Err(ResponseCode::NOT_FOUND));
    }

    #[test]
    fn send_get_remove_roundtrip() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        dev.setpath("\\_INTERNAL_00", false).unwrap();
        dev.send_file("a.txt", b"hello").unwrap();
        assert_eq!(dev.get_file("a.txt").unwrap(), b"hello");
        dev.remove_file("a.txt", false).unwrap();
        assert_eq!(dev.get_file("a.txt"), Err(ResponseCode::NOT_FOUND));
    }

    #[test]
    fn send_to_device_root_is_forbidden() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        dev.setpath(ROOT, false).unwrap();
        assert_eq!(dev.send_file("a", b"x"), Err(ResponseCode::FORBIDDEN));
    }

    #[test]
    fn non_ascii_names_list_as_unicode() {
        let conn = SimulatedConnector::new("XD", false);
        conn.add_file("\\_INTERNAL_00\\辞書.txt", b"x");
        let mut dev = open(&conn);
        dev.setpath(INTERNAL_MEM, false).unwrap();
        let entries = dev.list().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_unicode());
        assert_eq!(entries[0].display_name(), "辞書.txt");
    }

    #[test]
    fn capacity_accounts_for_files() {
        let conn = SimulatedConnector::new("XD", false);
        conn.add_file("\\_INTERNAL_00\\f", &[0u8; 1000]);
        let mut dev = open(&conn);
        dev.setpath(INTERNAL_MEM, false).unwrap();
        let cap = dev.capacity().unwrap();
        assert_eq!(cap.total, INTERNAL_TOTAL);
        assert_eq!(cap.free, INTERNAL_TOTAL - 1000);
    }

    #[test]
    fn sd_format_clears_card() {
        let conn = SimulatedConnector::new("XD", true);
        conn.add_file("\\_SD_00\\f", b"x");
        let mut dev = open(&conn);
        dev.sd_format().unwrap();
        assert!(!conn.exists("\\_SD_00\\f"));
        assert!(conn.exists(SD_CARD));
    }

    #[test]
    fn sd_format_without_card_fails() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        assert_eq!(dev.sd_format(), Err(ResponseCode::NOT_FOUND));
    }

    #[test]
    fn injected_failure_is_returned_and_journaled() {
        let conn = SimulatedConnector::new("XD", false);
        conn.fail("connect", ResponseCode::INTERNAL_ERROR);
        let mut dev = conn.open(OpenOptions::default()).unwrap();
        assert_eq!(dev.connect(), Err(ResponseCode::INTERNAL_ERROR));
        drop(dev);
        assert_eq!(
            conn.journal(),
            vec![Call::Open(OpenOptions::default()), Call::Connect, Call::Close]
        );
    }

    #[test]
    fn reset_then_keyed_auth() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        let key = dev.dict_reset("bob").unwrap();
        assert_eq!(conn.user_key("bob"), Some(key));
        assert!(dev.dict_auth("bob", Some(&key)).is_ok());
        assert_eq!(
            dev.dict_auth("bob", Some(&[0xaa; 20])),
            Err(ResponseCode::UNAUTHORIZED)
        );
        assert_eq!(dev.dict_auth("alice", None), Err(ResponseCode::UNAUTHORIZED));
    }

    #[test]
    fn install_requires_staged_dir_and_auth() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        assert_eq!(
            dev.dict_install("\\_INTERNAL_00\\", "GX001"),
            Err(ResponseCode::UNAUTHORIZED)
        );
        dev.dict_reset("bob").unwrap();
        assert_eq!(
            dev.dict_install("\\_INTERNAL_00\\", "GX001"),
            Err(ResponseCode::NOT_FOUND)
        );
        conn.add_dir("\\_INTERNAL_00\\GX001");
        dev.dict_install("\\_INTERNAL_00\\", "GX001").unwrap();
        assert_eq!(conn.installed("\\_INTERNAL_00\\"), vec!["GX001".to_string()]);
        assert_eq!(conn.device_cwd(), "\\_INTERNAL_00\\_USER");
        let listed = dev.dict_list("\\_INTERNAL_00\\").unwrap();
        assert_eq!(listed[0].id, "GX001");
        dev.dict_decrypt("\\_INTERNAL_00\\", "GX001").unwrap();
        dev.dict_remove("\\_INTERNAL_00\\", "GX001").unwrap();
        assert!(conn.installed("\\_INTERNAL_00\\").is_empty());
    }

    #[test]
    fn dict_on_missing_sd_root_fails() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        assert_eq!(dev.dict_list("\\_SD_00\\"), Err(ResponseCode::NOT_FOUND));
    }

    #[test]
    fn set_debug_is_recorded() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = open(&conn);
        dev.set_debug(4);
        assert_eq!(conn.debug_level(), 4);
        assert!(conn.journal().contains(&Call::SetDebug(4)));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn canonical_keys_are_stable(path in "[/\\\\A-Z0-9_]{0,40}") {
                let key = canonical(&path);
                prop_assert!(key.starts_with('\\'));
                prop_assert!(!key.contains('/'));
                prop_assert!(!key.contains("\\\\"));
                prop_assert_eq!(canonical(&key), key.clone());
            }
        }
    }

    #[test]
    fn calls_before_handshake_are_rejected() {
        let conn = SimulatedConnector::new("XD", false);
        let mut dev = conn.open(OpenOptions::default()).unwrap();
        assert_eq!(dev.list(), Err(ResponseCode::BAD_REQUEST));
    }
}
