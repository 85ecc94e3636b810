//! Built-in commands for the exword shell.

use std::fs;
use std::path::Path;

use exword_device::{Locale, Model, OpenMode, OpenOptions, Response};
use exword_types::ResponseCode;
use exword_types::error::{ExwordError, Result};

use crate::dict_commands::DictCmd;
use crate::interpreter::{ArgQueue, Command, CommandOutput, CommandRegistry};
use crate::path::{Medium, parse_uri};
use crate::session::Session;

/// Register all built-in commands into a registry, in `help` order.
pub fn register_builtins(reg: &mut CommandRegistry) {
    reg.register(Box::new(ConnectCmd));
    reg.register(Box::new(DisconnectCmd));
    reg.register(Box::new(ModelCmd));
    reg.register(Box::new(CapacityCmd));
    reg.register(Box::new(FormatCmd));
    reg.register(Box::new(ListCmd));
    reg.register(Box::new(DeleteCmd));
    reg.register(Box::new(SendCmd));
    reg.register(Box::new(GetCmd));
    reg.register(Box::new(SetPathCmd));
    reg.register(Box::new(DictCmd));
    reg.register(Box::new(SetCmd));
    reg.register(Box::new(ExitCmd));
}

/// Response code of a finished boundary call, success included.
pub(crate) fn status<T>(result: &Response<T>) -> ResponseCode {
    match result {
        Ok(_) => ResponseCode::SUCCESS,
        Err(code) => *code,
    }
}

fn usage(msg: &str) -> ExwordError {
    ExwordError::Usage(msg.to_string())
}

/// Final component of a local path, or the path itself.
fn base_name(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
}

// ---------------------------------------------------------------------------
// connect / disconnect
// ---------------------------------------------------------------------------

struct ConnectCmd;
impl Command for ConnectCmd {
    fn name(&self) -> &str {
        "connect"
    }
    fn usage(&self) -> Option<&str> {
        Some("connect [mode] [region]")
    }
    fn description(&self) -> &str {
        "connect to attached dictionary"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Connects to device.\n\n\
             Region selects the locale of the device (default: ja).\n\
             Mode is one of:\n\
             library - connect as CASIO Library (default)\n\
             text    - connect as Textloader\n\
             cd      - connect as CDLoader",
        )
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        if session.is_connected() {
            return Ok(CommandOutput::None);
        }
        let mut options = OpenOptions::default();
        if let Some(mode) = args.dequeue() {
            options.mode = OpenMode::parse(&mode)
                .ok_or_else(|| ExwordError::Usage(format!("Unknown 'type': {mode}")))?;
            if let Some(locale) = args.dequeue() {
                options.locale = Locale::parse(&locale)
                    .ok_or_else(|| ExwordError::Usage(format!("Unknown 'locale': {locale}")))?;
            }
        }
        match session.connect(options) {
            Ok(()) => Ok(CommandOutput::text("connecting to device...done")),
            Err(e @ (ExwordError::DeviceNotFound | ExwordError::ConnectFailed(_))) => {
                Ok(CommandOutput::Text(format!("connecting to device...{e}")))
            },
            Err(e) => Err(e),
        }
    }
}

struct DisconnectCmd;
impl Command for DisconnectCmd {
    fn name(&self) -> &str {
        "disconnect"
    }
    fn usage(&self) -> Option<&str> {
        Some("disconnect")
    }
    fn description(&self) -> &str {
        "disconnect from dictionary"
    }
    fn help(&self) -> Option<&str> {
        Some("Disconnects from device.")
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        Ok(disconnect_output(session))
    }
}

fn disconnect_output(session: &mut Session) -> CommandOutput {
    if session.disconnect() {
        CommandOutput::text("disconnecting...done")
    } else {
        CommandOutput::None
    }
}

// ---------------------------------------------------------------------------
// model / capacity / format
// ---------------------------------------------------------------------------

struct ModelCmd;
impl Command for ModelCmd {
    fn name(&self) -> &str {
        "model"
    }
    fn usage(&self) -> Option<&str> {
        Some("model")
    }
    fn description(&self) -> &str {
        "display model information"
    }
    fn help(&self) -> Option<&str> {
        Some("Displays model information of device.")
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let model = session.device()?.model()?;
        Ok(CommandOutput::Text(format_model(&model)))
    }
}

fn format_model(model: &Model) -> String {
    let mut lines = vec![
        format!("Model: {}", model.model),
        format!("Sub: {}", model.sub_model),
    ];
    if model.has(Model::CAP_EXT) {
        lines.push(format!("Extended: {}", model.ext_model));
    }
    let caps: Vec<&str> = [
        (Model::CAP_SW, "SW"),
        (Model::CAP_P, "P"),
        (Model::CAP_F, "F"),
        (Model::CAP_C, "C"),
    ]
    .into_iter()
    .filter(|&(bit, _)| model.has(bit))
    .map(|(_, label)| label)
    .collect();
    if !caps.is_empty() {
        lines.push(format!("Capabilities: {}", caps.join(" ")));
    }
    lines.join("\n")
}

struct CapacityCmd;
impl Command for CapacityCmd {
    fn name(&self) -> &str {
        "capacity"
    }
    fn usage(&self) -> Option<&str> {
        Some("capacity")
    }
    fn description(&self) -> &str {
        "display medium capacity"
    }
    fn help(&self) -> Option<&str> {
        Some("Displays capacity of current storage medium.")
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let cap = session.device()?.capacity()?;
        Ok(CommandOutput::Text(format!(
            "Capacity: {} / {}",
            cap.total, cap.free
        )))
    }
}

struct FormatCmd;
impl Command for FormatCmd {
    fn name(&self) -> &str {
        "format"
    }
    fn usage(&self) -> Option<&str> {
        Some("format")
    }
    fn description(&self) -> &str {
        "format SD card"
    }
    fn help(&self) -> Option<&str> {
        Some("Formats the inserted SD card. Everything on it is erased.")
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let rsp = status(&session.device()?.sd_format());
        Ok(CommandOutput::Text(format!("Formatting SD Card...{rsp}")))
    }
}

// ---------------------------------------------------------------------------
// list / delete / send / get
// ---------------------------------------------------------------------------

struct ListCmd;
impl Command for ListCmd {
    fn name(&self) -> &str {
        "list"
    }
    fn usage(&self) -> Option<&str> {
        Some("list")
    }
    fn description(&self) -> &str {
        "list files"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Lists files and directories under the current path.\n\n\
             Directories are enclosed in <>.\n\
             Names beginning with * were returned as unicode.",
        )
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let result = session.device()?.list();
        let mut lines = Vec::new();
        if let Ok(entries) = &result {
            for entry in entries {
                let marker = if entry.is_unicode() { "*" } else { "" };
                let name = entry.display_name();
                lines.push(if entry.is_directory() {
                    format!("<{marker}{name}>")
                } else {
                    format!("{marker}{name}")
                });
            }
        }
        lines.push(status(&result).to_string());
        Ok(CommandOutput::Text(lines.join("\n")))
    }
}

struct DeleteCmd;
impl Command for DeleteCmd {
    fn name(&self) -> &str {
        "delete"
    }
    fn usage(&self) -> Option<&str> {
        Some("delete <filename>")
    }
    fn description(&self) -> &str {
        "delete a file"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Deletes a file from the dictionary.\n\n\
             Prefix the name with * to delete a file listed as unicode.",
        )
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let device = session.device()?;
        let name = args.peek().ok_or_else(|| usage("No file specified"))?;
        let rsp = match name.strip_prefix('*') {
            Some(unicode_name) => status(&device.remove_file(unicode_name, true)),
            None => status(&device.remove_file(name, false)),
        };
        Ok(CommandOutput::Text(format!("deleting file...{rsp}")))
    }
}

struct SendCmd;
impl Command for SendCmd {
    fn name(&self) -> &str {
        "send"
    }
    fn usage(&self) -> Option<&str> {
        Some("send <filename>")
    }
    fn description(&self) -> &str {
        "upload a file"
    }
    fn help(&self) -> Option<&str> {
        Some("Uploads a local file to the current path on the dictionary.")
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let device = session.device()?;
        let local = args.peek().ok_or_else(|| usage("No file specified"))?;
        let data = fs::read(local)?;
        let rsp = status(&device.send_file(base_name(local), &data));
        Ok(CommandOutput::Text(format!("uploading...{rsp}")))
    }
}

struct GetCmd;
impl Command for GetCmd {
    fn name(&self) -> &str {
        "get"
    }
    fn usage(&self) -> Option<&str> {
        Some("get <filename>")
    }
    fn description(&self) -> &str {
        "download a file"
    }
    fn help(&self) -> Option<&str> {
        Some("Downloads a file from the current path on the dictionary.")
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let auto_mkdir = session.options().auto_mkdir;
        let device = session.device()?;
        let target = args.peek().ok_or_else(|| usage("No file specified"))?;
        let result = device.get_file(base_name(target));
        if let Ok(data) = &result {
            let target = Path::new(target);
            if auto_mkdir {
                if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent)?;
                }
            }
            fs::write(target, data)?;
        }
        Ok(CommandOutput::Text(format!(
            "downloading...{}",
            status(&result)
        )))
    }
}

// ---------------------------------------------------------------------------
// setpath
// ---------------------------------------------------------------------------

struct SetPathCmd;
impl Command for SetPathCmd {
    fn name(&self) -> &str {
        "setpath"
    }
    fn usage(&self) -> Option<&str> {
        Some("setpath <path>")
    }
    fn description(&self) -> &str {
        "changes directory on dictionary"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Changes to the specified path.\n\n\
             <path> has the form (sd|mem)://<path>\n\
             Example: mem:/// - sets path to root of internal memory",
        )
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        session.device()?;
        let uri = args.peek().ok_or_else(|| usage("No path specified"))?;
        let (medium, path) =
            parse_uri(uri).ok_or_else(|| usage("Invalid argument. Format (sd|mem)://<path>"))?;
        if medium == Medium::Sd && !session.sd_present() {
            return Err(ExwordError::SdNotInserted);
        }
        let path = path.to_string();
        let mkdir = session.options().auto_mkdir;
        if let Err(e) = session.change_path(medium.prefix(), &path, mkdir) {
            if let Err(restore) = session.restore_path() {
                log::debug!("setpath {path} failed ({e}), restore failed too: {restore}");
            }
            return Err(e);
        }
        Ok(CommandOutput::None)
    }
}

// ---------------------------------------------------------------------------
// set / exit
// ---------------------------------------------------------------------------

struct SetCmd;
impl Command for SetCmd {
    fn name(&self) -> &str {
        "set"
    }
    fn usage(&self) -> Option<&str> {
        Some("set <option> [value]")
    }
    fn description(&self) -> &str {
        "sets program options"
    }
    fn help(&self) -> Option<&str> {
        Some(
            "Sets <option> to [value]; without a value shows the current one.\n\n\
             Available options:\n\
             debug <level>  - sets debug level (0-5)\n\
             mkdir <on|off> - whether setpath should create directories",
        )
    }
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let opt = args.dequeue().ok_or_else(|| usage("No option specified"))?;
        match opt.as_str() {
            "debug" => {
                let Some(value) = args.peek() else {
                    return Ok(CommandOutput::Text(format!(
                        "Debug Level: {}",
                        session.options().debug
                    )));
                };
                let level: u8 = value.parse().map_err(|_| usage("Invalid value"))?;
                if level > 5 {
                    return Err(usage("Value should be between 0 and 5"));
                }
                session.set_debug(level);
                Ok(CommandOutput::None)
            },
            "mkdir" => {
                let Some(value) = args.peek() else {
                    let state = if session.options().auto_mkdir { "on" } else { "off" };
                    return Ok(CommandOutput::Text(format!("Mkdir: {state}")));
                };
                match value {
                    "on" | "yes" | "true" => session.set_auto_mkdir(true),
                    "off" | "no" | "false" => session.set_auto_mkdir(false),
                    _ => return Err(usage("Invalid value")),
                }
                Ok(CommandOutput::None)
            },
            _ => Err(ExwordError::Usage(format!("Unknown option {opt}"))),
        }
    }
}

struct ExitCmd;
impl Command for ExitCmd {
    fn name(&self) -> &str {
        "exit"
    }
    fn usage(&self) -> Option<&str> {
        Some("exit")
    }
    fn description(&self) -> &str {
        "exits program"
    }
    fn help(&self) -> Option<&str> {
        Some("Exits program and disconnects from device.")
    }
    fn execute(&self, _args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        session.stop();
        Ok(disconnect_output(session))
    }
}
