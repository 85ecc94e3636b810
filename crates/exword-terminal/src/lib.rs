//! Command interpreter for the exword dictionary shell.
//!
//! Input lines are split into an [`ArgQueue`]; the [`CommandRegistry`]
//! dispatches the first token to a [`Command`], which consumes the rest and
//! acts on the [`Session`]. [`Shell`] drives the loop over a [`LineSource`].

mod commands;
mod dict_commands;
mod interpreter;
pub mod path;
mod session;
mod shell;

#[cfg(test)]
pub(crate) mod test_utils;

/// Register all built-in commands into a registry.
pub use commands::register_builtins;
/// Decode a `0x`-prefixed 40 digit authentication key.
pub use dict_commands::parse_auth_key;
/// Tokens of one input line.
pub use interpreter::ArgQueue;
/// A single executable command trait.
pub use interpreter::Command;
/// Output produced by a command.
pub use interpreter::CommandOutput;
/// Registry of available commands with dispatch.
pub use interpreter::CommandRegistry;
/// Session state and user options.
pub use session::{Options, Session};
/// The interactive loop and its input abstraction.
pub use shell::{BANNER, LineSource, Shell};
