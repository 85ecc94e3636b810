//! Command trait, argument queue, registry and dispatch logic.
//!
//! Input lines split on spaces and tabs with no quoting. The first token
//! selects a command by exact, case-sensitive name; the handler then consumes
//! further tokens from the front of the queue. Leftover tokens are ignored.

use std::collections::{HashMap, VecDeque};

use exword_types::error::{ExwordError, Result};

use crate::session::Session;

/// Output produced by a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutput {
    /// Text to print (may span several lines).
    Text(String),
    /// Command produced no visible output.
    None,
}

impl CommandOutput {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

// ---------------------------------------------------------------------------
// Argument queue
// ---------------------------------------------------------------------------

/// Tokens of one input line, consumed front to back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgQueue {
    args: VecDeque<String>,
}

impl ArgQueue {
    /// Tokenize a line on spaces and tabs, dropping empty tokens.
    pub fn parse(line: &str) -> Self {
        Self {
            args: line
                .split([' ', '\t'])
                .filter(|token| !token.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    /// First remaining token.
    pub fn peek(&self) -> Option<&str> {
        self.args.front().map(String::as_str)
    }

    /// Remove the first token, returning it.
    pub fn dequeue(&mut self) -> Option<String> {
        self.args.pop_front()
    }

    pub fn clear(&mut self) {
        self.args.clear();
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

/// A single executable command.
pub trait Command {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// Usage string for the `help` listing (e.g. "get <filename>"). Commands
    /// without one are left out of the listing.
    fn usage(&self) -> Option<&str> {
        None
    }

    /// One-line description for `help`.
    fn description(&self) -> &str {
        ""
    }

    /// Long help for `help <name>`.
    fn help(&self) -> Option<&str> {
        None
    }

    /// Execute the command with the remaining arguments and session.
    fn execute(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput>;
}

/// Name of the help command, handled by the registry itself.
const HELP: &str = "help";

/// Registry of available commands with dispatch.
///
/// Commands are listed by `help` in registration order.
pub struct CommandRegistry {
    commands: Vec<Box<dyn Command>>,
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name,
    /// keeping its position.
    pub fn register(&mut self, cmd: Box<dyn Command>) {
        match self.index.get(cmd.name()) {
            Some(&slot) => self.commands[slot] = cmd,
            None => {
                self.index.insert(cmd.name().to_string(), self.commands.len());
                self.commands.push(cmd);
            },
        }
    }

    /// Look up a command by exact name.
    pub fn get(&self, name: &str) -> Option<&dyn Command> {
        self.index.get(name).map(|&slot| self.commands[slot].as_ref())
    }

    /// Dispatch the first queued token to its command.
    ///
    /// The command name is consumed before the handler runs. An empty queue
    /// is a no-op.
    pub fn dispatch(&self, args: &mut ArgQueue, session: &mut Session) -> Result<CommandOutput> {
        let Some(name) = args.peek() else {
            return Ok(CommandOutput::None);
        };
        if name == HELP {
            args.dequeue();
            return Ok(self.execute_help(args.peek()));
        }
        let cmd = self.get(name).ok_or(ExwordError::UnknownCommand)?;
        log::debug!("dispatch {name}");
        args.dequeue();
        cmd.execute(args, session)
    }

    /// Parse and execute a whole input line.
    pub fn execute(&self, line: &str, session: &mut Session) -> Result<CommandOutput> {
        let mut args = ArgQueue::parse(line);
        let result = self.dispatch(&mut args, session);
        args.clear();
        result
    }

    fn execute_help(&self, topic: Option<&str>) -> CommandOutput {
        let Some(name) = topic else {
            let lines: Vec<String> = self
                .commands
                .iter()
                .filter_map(|cmd| {
                    cmd.usage()
                        .map(|usage| format!("{usage:<24}- {}", cmd.description()))
                })
                .collect();
            return CommandOutput::Text(lines.join("\n"));
        };
        if name == HELP {
            return CommandOutput::Text(format!("No help available for {name}"));
        }
        match self.get(name) {
            Some(cmd) => match cmd.help() {
                Some(text) => CommandOutput::text(text),
                None => CommandOutput::Text(format!("No help available for {name}")),
            },
            None => CommandOutput::Text(format!("{name} is not a command")),
        }
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::offline_session;

    struct EchoCmd;
    impl Command for EchoCmd {
        fn name(&self) -> &str {
            "echo"
        }
        fn usage(&self) -> Option<&str> {
            Some("echo <word>")
        }
        fn description(&self) -> &str {
            "print one word"
        }
        fn help(&self) -> Option<&str> {
            Some("Prints its first argument.")
        }
        fn execute(&self, args: &mut ArgQueue, _: &mut Session) -> Result<CommandOutput> {
            Ok(CommandOutput::Text(args.dequeue().unwrap_or_default()))
        }
    }

    struct QuietCmd;
    impl Command for QuietCmd {
        fn name(&self) -> &str {
            "quiet"
        }
        fn execute(&self, _: &mut ArgQueue, _: &mut Session) -> Result<CommandOutput> {
            Ok(CommandOutput::None)
        }
    }

    fn registry() -> CommandRegistry {
        let mut reg = CommandRegistry::new();
        reg.register(Box::new(EchoCmd));
        reg.register(Box::new(QuietCmd));
        reg
    }

    #[test]
    fn tokenizes_on_spaces_and_tabs() {
        let mut args = ArgQueue::parse("  connect\tlibrary   ja \t");
        assert_eq!(args.len(), 3);
        assert_eq!(args.peek(), Some("connect"));
        args.dequeue();
        assert_eq!(args.dequeue().as_deref(), Some("library"));
        assert_eq!(args.peek(), Some("ja"));
        args.clear();
        assert!(args.is_empty());
        assert_eq!(args.peek(), None);
        assert_eq!(args.dequeue(), None);
    }

    #[test]
    fn no_quoting_support() {
        let args = ArgQueue::parse("send \"my file\"");
        assert_eq!(args.len(), 3);
    }

    #[test]
    fn dispatch_consumes_name_and_runs_handler() {
        let (mut session, _) = offline_session();
        let out = registry().execute("echo hello world", &mut session).unwrap();
        assert_eq!(out, CommandOutput::text("hello"));
    }

    #[test]
    fn dispatch_is_case_sensitive() {
        let (mut session, _) = offline_session();
        let err = registry().execute("ECHO hi", &mut session).unwrap_err();
        assert!(matches!(err, ExwordError::UnknownCommand));
        assert_eq!(err.to_string(), "Unknown command");
    }

    #[test]
    fn empty_line_is_noop() {
        let (mut session, _) = offline_session();
        assert_eq!(
            registry().execute(" \t ", &mut session).unwrap(),
            CommandOutput::None
        );
    }

    #[test]
    fn help_lists_short_help_in_registration_order() {
        let (mut session, _) = offline_session();
        match registry().execute("help", &mut session).unwrap() {
            CommandOutput::Text(s) => {
                assert_eq!(s.lines().count(), 1);
                assert!(s.starts_with("echo <word>"));
                assert!(s.ends_with("- print one word"));
            },
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn help_topic_variants() {
        let (mut session, _) = offline_session();
        let reg = registry();
        assert_eq!(
            reg.execute("help echo", &mut session).unwrap(),
            CommandOutput::text("Prints its first argument.")
        );
        assert_eq!(
            reg.execute("help quiet", &mut session).unwrap(),
            CommandOutput::text("No help available for quiet")
        );
        assert_eq!(
            reg.execute("help help", &mut session).unwrap(),
            CommandOutput::text("No help available for help")
        );
        assert_eq!(
            reg.execute("help frob", &mut session).unwrap(),
            CommandOutput::text("frob is not a command")
        );
    }

    #[test]
    fn register_replaces_in_place() {
        struct Echo2;
        impl Command for Echo2 {
            fn name(&self) -> &str {
                "echo"
            }
            fn execute(&self, _: &mut ArgQueue, _: &mut Session) -> Result<CommandOutput> {
                Ok(CommandOutput::text("v2"))
            }
        }
        let mut reg = registry();
        reg.register(Box::new(Echo2));
        let (mut session, _) = offline_session();
        assert_eq!(
            reg.execute("echo x", &mut session).unwrap(),
            CommandOutput::text("v2")
        );
        assert_eq!(
            reg.execute("help", &mut session).unwrap(),
            CommandOutput::text("")
        );
        assert_eq!(
            reg.execute("quiet", &mut session).unwrap(),
            CommandOutput::None
        );
    }
}
