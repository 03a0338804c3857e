//! vaisto Language Server Protocol implementation.
//!
//! - **Diagnostics**: parse errors and type errors, pushed on open/change/save
//! - **Hover**: the inferred scheme of a top-level function or process name
//! - **Go-to-definition**: navigate to a top-level declaration
//! - **Document symbols**: functions, types, classes, instances, processes
//!
//! Communicates over stdin/stdout via JSON-RPC, powered by `tower-lsp`.

pub mod analysis;
pub mod definition;
pub mod server;

use tower_lsp::{LspService, Server};

use server::VaistoBackend;

/// Run the vaisto LSP server on stdin/stdout until the client disconnects.
/// The entry point called by `vaistoc lsp`.
pub async fn run_stdio() {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(VaistoBackend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}
