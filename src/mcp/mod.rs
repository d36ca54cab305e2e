/// Model Context Protocol transport
///
/// Line-delimited JSON-RPC over stdin/stdout, routing `tools/call` requests
/// to the habit tools.

pub mod protocol;
pub mod server;

pub use server::McpServer;
