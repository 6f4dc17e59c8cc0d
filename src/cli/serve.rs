//! The `serve` command: run the Unix-domain-socket front end.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use crate::constants::{DEFAULT_MAX_CONNECTIONS, DEFAULT_SOCKET_PATH};
use crate::server;

/// Listen on a Unix domain socket and serve render requests.
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Path of the socket to listen on.
    #[arg(long, default_value = DEFAULT_SOCKET_PATH)]
    pub socket: PathBuf,

    /// Maximum number of connections serviced concurrently.
    #[arg(long, default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: usize,
}

impl ServeCommand {
    /// Bind the listener and serve until it fails.
    pub async fn execute(self) -> Result<()> {
        server::serve(&self.socket, self.max_connections).await?;
        Ok(())
    }
}
