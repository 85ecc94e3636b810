//! Add-on dictionary commands (`dict list|reset|auth|decrypt|remove|install`).
//!
//! The storage medium is taken from the session's current path. Every
//! sub-operation that reached the device is followed by a path restore, since
//! the device may be left inside its add-on storage.

use exword_device::{AuthKey, OpenMode};
use exword_types::error::{AuthKeyError, ExwordError, Result};

use crate::commands::status;
use crate::interpreter::{ArgQueue, Command, CommandOutput};
use crate::path::Medium;
use crate::session::Session;

/// Length of an add-on content id.
const ID_LEN: usize = 5;

/// A validated `dict` sub-command.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DictRequest {
    List,
    Reset(String),
    Auth { user: String, key: Option<AuthKey> },
    Decrypt(String),
    Remove(String),
    Install(String),
}

impl DictRequest {
    /// Consume the sub-function and its arguments. Fails without touching
    /// the device.
    fn parse(args: &mut ArgQueue) -> Result<Self> {
        let sub = args
            .dequeue()
            .ok_or_else(|| usage("No sub-function specified."))?;
        match sub.as_str() {
            "list" => Ok(Self::List),
            "reset" => Ok(Self::Reset(user_arg(args)?)),
            "auth" => {
                let user = user_arg(args)?;
                let key = args.dequeue().map(|k| parse_auth_key(&k)).transpose()?;
                Ok(Self::Auth { user, key })
            },
            "decrypt" => Ok(Self::Decrypt(id_arg(args)?)),
            "remove" => Ok(Self::Remove(id_arg(args)?)),
            "install" => Ok(Self::Install(id_arg(args)?)),
            _ => Err(usage("Unknown subfunction")),
        }
    }

    fn needs_auth(&self) -> bool {
        matches!(self, Self::Decrypt(_) | Self::Remove(_) | Self::Install(_))
    }
}

fn usage(msg: &str) -> ExwordError {
    ExwordError::Usage(msg.to_string())
}

fn user_arg(args: &mut ArgQueue) -> Result<String> {
    args.dequeue().ok_or_else(|| usage("No username specified."))
}

fn id_arg(args: &mut ArgQueue) -> Result<String> {
    let id = args.dequeue().ok_or_else(|| usage("No id specified."))?;
    if id.chars().count() != ID_LEN {
        return Err(usage("Id must be 5 characters long."));
    }
    Ok(id)
}

/// Decode `0x` followed by exactly 40 hex digits (either case) into a key.
pub fn parse_auth_key(arg: &str) -> std::result::Result<AuthKey, AuthKeyError> {
    let digits = arg
        .strip_prefix("0x")
        .filter(|d| !d.is_empty())
        .ok_or(AuthKeyError::InvalidCharacter)?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AuthKeyError::InvalidCharacter);
    }
    let mut key = [0u8; 20];
    if digits.len() != key.len() * 2 {
        return Err(AuthKeyError::WrongLength);
    }
    hex::decode_to_slice(digits, &mut key).map_err(|_| AuthKeyError::InvalidCharacter)?;
    Ok(key)
}

pub(crate) struct DictCmd;
impl Command for DictCmd {
    fn name(&self) -> &str {
        "dict"
    }
    fn usage(&self) -> Option<&str> {
        Some("dict <sub-function>")
    }
    fn description(&self) -> &str {
        "add-on dictionary commands"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Manages add-on dictionaries on the storage medium of the current\n\
             path. The reset sub-function WILL delete all installed dictionaries.\n\n\
             Sub-functions:\n\
             reset <user>      - resets authentication info\n\
             auth <user> [key] - authenticate to dictionary\n\
             list              - list installed add-on dictionaries\n\
             decrypt <id>      - decrypts specified add-on dictionary\n\
             remove <id>       - removes specified add-on dictionary\n\
             install <id>      - installs specified add-on dictionary",
        )
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        session.device()?;
        if session.mode() != OpenMode::Library {
            return Err(ExwordError::WrongMode);
        }
        let medium = Medium::of_path(session.cwd().unwrap_or_default());
        let request = DictRequest::parse(args)?;
        if request.needs_auth() && !session.is_authenticated() {
            return Err(ExwordError::NotAuthenticated);
        }
        let result = run(&request, medium.root(), session);
        if session.restore_path().is_err() {
            if let Err(e) = session.change_path(medium.root(), "/", false) {
                log::warn!("could not return to {}: {e}", medium.root());
            }
        }
        result
    }
}

fn run(request: &DictRequest, root: &str, session: &mut Session) -> Result<CommandOutput> {
    let device = session.device()?;
    match request {
        DictRequest::List => {
            let dicts = device.dict_list(root)?;
            let lines: Vec<String> = dicts
                .iter()
                .map(|dict| format!("{}: {}", dict.id, dict.name))
                .collect();
            Ok(if lines.is_empty() {
                CommandOutput::None
            } else {
                CommandOutput::Text(lines.join("\n"))
            })
        },
        DictRequest::Reset(user) => match device.dict_reset(user) {
            Ok(key) => {
                session.set_authenticated(true);
                Ok(CommandOutput::Text(format!(
                    "Username: {user}\nAuthkey: 0x{}",
                    hex::encode(key)
                )))
            },
            Err(code) => {
                session.set_authenticated(false);
                Err(ExwordError::Device(code))
            },
        },
        DictRequest::Auth { user, key } => match device.dict_auth(user, key.as_ref()) {
            Ok(()) => {
                session.set_authenticated(true);
                Ok(CommandOutput::text("Authentication successful."))
            },
            Err(code) => {
                session.set_authenticated(false);
                Err(ExwordError::AuthFailed(code))
            },
        },
        DictRequest::Decrypt(id) => {
            let rsp = status(&device.dict_decrypt(root, id));
            Ok(CommandOutput::Text(format!("decrypting {id}...{rsp}")))
        },
        DictRequest::Remove(id) => {
            let rsp = status(&device.dict_remove(root, id));
            Ok(CommandOutput::Text(format!("removing {id}...{rsp}")))
        },
        DictRequest::Install(id) => {
            let rsp = status(&device.dict_install(root, id));
            Ok(CommandOutput::Text(format!("installing {id}...{rsp}")))
        },
    }
}
