//! Line editing with persisted history, backed by rustyline.

use std::path::{Path, PathBuf};

use exword_terminal::LineSource;
use exword_types::error::{ExwordError, Result};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor};

fn editor_error(e: ReadlineError) -> ExwordError {
    match e {
        ReadlineError::Io(io) => ExwordError::Io(io),
        other => ExwordError::Readline(other.to_string()),
    }
}

/// Terminal input with a history file that survives restarts.
pub struct ReadlineSource {
    editor: DefaultEditor,
    history_path: Option<PathBuf>,
}

impl ReadlineSource {
    /// Create the editor and load history from `history_path`, if given and
    /// present. At most `history_size` entries are kept.
    pub fn new(history_path: Option<PathBuf>, history_size: usize) -> Result<Self> {
        let config = Config::builder()
            .max_history_size(history_size)
            .map_err(editor_error)?
            .auto_add_history(false)
            .build();
        let mut editor = DefaultEditor::with_config(config).map_err(editor_error)?;
        if let Some(path) = history_path.as_deref().filter(|p| p.is_file()) {
            match editor.load_history(path) {
                Ok(()) => log::debug!("loaded history from {}", path.display()),
                Err(e) => log::warn!("could not load history {}: {e}", path.display()),
            }
        }
        Ok(Self {
            editor,
            history_path,
        })
    }

}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => Ok(std::fs::create_dir_all(dir)?),
        _ => Ok(()),
    }
}

impl LineSource for ReadlineSource {
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
            Err(e) => Err(editor_error(e)),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            log::warn!("could not record history: {e}");
        }
    }

    /// Write the history file, creating its directory if needed.
    fn save_history(&mut self) -> Result<()> {
        let Some(path) = self.history_path.as_deref() else {
            return Ok(());
        };
        ensure_parent(path)?;
        self.editor.save_history(path).map_err(editor_error)?;
        log::debug!("saved history to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_parent_creates_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("history");
        ensure_parent(&path).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
    }

    #[test]
    fn ensure_parent_accepts_bare_file_name() {
        ensure_parent(Path::new("history")).unwrap();
    }

    #[test]
    fn readline_errors_keep_io_source() {
        let e = editor_error(ReadlineError::Io(std::io::Error::other("tty gone")));
        assert!(matches!(e, ExwordError::Io(_)));
        let e = editor_error(ReadlineError::Interrupted);
        assert!(matches!(e, ExwordError::Readline(_)));
    }
}
