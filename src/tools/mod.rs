/// MCP tools for habit management
///
/// Each tool is a thin wrapper over one `HabitStorage` operation: it parses
/// plain arguments, calls the storage contract on behalf of the signed-in
/// user, and hands back the resulting `Outcome` untouched.

pub mod check_ins;
pub mod habits;

pub use check_ins::*;
pub use habits::*;
