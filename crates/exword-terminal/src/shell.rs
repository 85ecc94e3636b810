//! The read, dispatch, print loop.

use std::io::Write;

use exword_types::error::Result;

use crate::interpreter::{CommandOutput, CommandRegistry};
use crate::session::Session;

/// Printed once when the shell starts.
pub const BANNER: &str = "Exword dictionary tool.\nType 'help' for a list of commands.";

/// Line typed on the user's behalf at end of input.
const EXIT_LINE: &str = "exit";

/// Where the shell reads its input from.
pub trait LineSource {
    /// Read one line. `Ok(None)` means end of input or interrupt.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;

    /// Record a line in the history.
    fn add_history(&mut self, line: &str);

    /// Persist the history. Called once when the loop ends, however it ends.
    fn save_history(&mut self) -> Result<()> {
        Ok(())
    }
}

/// An interactive shell over one session.
pub struct Shell {
    registry: CommandRegistry,
    session: Session,
}

impl Shell {
    pub fn new(registry: CommandRegistry, session: Session) -> Self {
        Self { registry, session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// `<cwd> >> `, or `>> ` without a path.
    pub fn prompt(&self) -> String {
        match self.session.cwd() {
            Some(cwd) => format!("{cwd} >> "),
            None => ">> ".to_string(),
        }
    }

    /// Execute one line, returning whatever should be printed.
    pub fn execute_line(&mut self, line: &str) -> Option<String> {
        match self.registry.execute(line, &mut self.session) {
            Ok(CommandOutput::Text(text)) => Some(text),
            Ok(CommandOutput::None) => None,
            Err(e) => {
                log::debug!("command failed: {e:?}");
                Some(e.to_string())
            },
        }
    }

    /// Run until `exit` (typed, or implied by end of input), then save the
    /// history. An input or output error ends the loop after the save.
    pub fn run(&mut self, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<()> {
        let result = self.run_loop(input, out);
        if let Err(e) = input.save_history() {
            log::warn!("could not save history: {e}");
        }
        result
    }

    fn run_loop(&mut self, input: &mut dyn LineSource, out: &mut dyn Write) -> Result<()> {
        writeln!(out, "{BANNER}")?;
        self.session.start();
        while self.session.is_running() {
            let line = match input.read_line(&self.prompt())? {
                Some(line) => line,
                None => EXIT_LINE.to_string(),
            };
            if line.trim().is_empty() {
                continue;
            }
            input.add_history(&line);
            if let Some(text) = self.execute_line(&line) {
                writeln!(out, "{text}")?;
            }
            out.flush()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use exword_device::Call;
    use exword_types::error::ExwordError;

    use super::*;
    use crate::test_utils::{builtins, offline_session};

    /// Scripted input that records prompts and history.
    #[derive(Default)]
    struct Script {
        lines: VecDeque<String>,
        prompts: Vec<String>,
        history: Vec<String>,
        broken_after_script: bool,
        saved: Vec<Vec<String>>,
    }

    impl Script {
        fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| l.to_string()).collect(),
                ..Self::default()
            }
        }
    }

    impl LineSource for Script {
        fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
            self.prompts.push(prompt.to_string());
            match self.lines.pop_front() {
                None if self.broken_after_script => {
                    Err(ExwordError::Readline("terminal gone".into()))
                },
                line => Ok(line),
            }
        }
        fn add_history(&mut self, line: &str) {
            self.history.push(line.to_string());
        }
        fn save_history(&mut self) -> Result<()> {
            self.saved.push(self.history.clone());
            Ok(())
        }
    }

    fn shell() -> (Shell, exword_device::SimulatedConnector) {
        let (session, conn) = offline_session();
        (Shell::new(builtins(), session), conn)
    }

    #[test]
    fn end_of_input_exits() {
        let (mut shell, _) = shell();
        let mut script = Script::new(&[]);
        let mut out = Vec::<u8>::new();
        shell.run(&mut script, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), format!("{BANNER}\n"));
        assert_eq!(script.prompts, vec![">> "]);
        assert_eq!(script.history, vec!["exit"]);
        assert_eq!(script.saved, vec![vec!["exit".to_string()]]);
        assert!(!shell.session().is_running());
    }

    #[test]
    fn input_error_still_saves_history() {
        let (mut shell, _) = shell();
        let mut script = Script::new(&["set mkdir on", "set debug 2"]);
        script.broken_after_script = true;
        let err = shell.run(&mut script, &mut Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, ExwordError::Readline(_)));
        assert_eq!(script.saved, vec![vec![
            "set mkdir on".to_string(),
            "set debug 2".to_string(),
        ]]);
    }

    #[test]
    fn session_roundtrip() {
        let (mut shell, conn) = shell();
        let mut script = Script::new(&["connect", "", "   ", "bogus", "exit", "model"]);
        let mut out = Vec::<u8>::new();
        shell.run(&mut script, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            format!(
                "{BANNER}\nconnecting to device...done\nUnknown command\ndisconnecting...done\n"
            )
        );
        assert_eq!(script.history, vec!["connect", "bogus", "exit"]);
        assert_eq!(script.prompts, vec![
            ">> ",
            "\\_INTERNAL_00\\ >> ",
            "\\_INTERNAL_00\\ >> ",
            "\\_INTERNAL_00\\ >> ",
            "\\_INTERNAL_00\\ >> ",
        ]);
        assert!(!conn.journal().contains(&Call::Model));
        assert_eq!(script.lines.len(), 1);
    }

    #[test]
    fn end_of_input_disconnects() {
        let (mut shell, conn) = shell();
        let mut script = Script::new(&["connect"]);
        shell.run(&mut script, &mut Vec::<u8>::new()).unwrap();
        assert!(!shell.session().is_connected());
        assert_eq!(conn.journal().last(), Some(&Call::Close));
    }

    #[test]
    fn execute_line_renders_errors() {
        let (mut shell, _) = shell();
        assert_eq!(shell.execute_line("list").as_deref(), Some("Not connected."));
        assert_eq!(shell.execute_line("set mkdir on"), None);
    }
}
