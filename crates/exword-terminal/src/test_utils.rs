//! Shared test utilities for exword-terminal tests.
//!
//! Sessions are built over a [`SimulatedConnector`]; the returned connector
//! shares state with the session's device, so tests can seed files and
//! assert on the journal of boundary calls.

use exword_device::{OpenOptions, SimulatedConnector};

use crate::commands::register_builtins;
use crate::interpreter::{CommandOutput, CommandRegistry};
use crate::session::{Options, Session};

pub const MODEL: &str = "XD-SP6600";

/// A session over `conn` with the given options.
pub fn session_with(conn: &SimulatedConnector, options: Options) -> Session {
    Session::new(Box::new(conn.clone()), options)
}

/// A disconnected session over a simulated device with an SD card.
pub fn offline_session() -> (Session, SimulatedConnector) {
    let conn = SimulatedConnector::new(MODEL, true);
    (session_with(&conn, Options::default()), conn)
}

/// A session connected in library mode, with an empty journal.
pub fn connected_session() -> (Session, SimulatedConnector) {
    let (mut session, conn) = offline_session();
    session
        .connect(OpenOptions::default())
        .expect("simulated connect");
    conn.clear_journal();
    (session, conn)
}

/// Registry holding every built-in command.
pub fn builtins() -> CommandRegistry {
    let mut reg = CommandRegistry::new();
    register_builtins(&mut reg);
    reg
}

/// Run one line and render its outcome the way the shell prints it.
pub fn run(reg: &CommandRegistry, session: &mut Session, line: &str) -> String {
    match reg.execute(line, session) {
        Ok(CommandOutput::Text(text)) => text,
        Ok(CommandOutput::None) => String::new(),
        Err(e) => e.to_string(),
    }
}
