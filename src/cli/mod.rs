//! Command-line interface for wikify.
//!
//! Two entry points share the resolution core:
//! - `render` - one-shot: resolve a document's closure and print the output.
//! - `serve` - long-running: accept render requests over a Unix domain
//!   socket (Unix only).
//!
//! Global `--verbose`/`--quiet` flags control the tracing filter; an
//! explicit `RUST_LOG` always wins.

mod render;
#[cfg(unix)]
mod serve;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Top-level argument parser.
#[derive(Parser)]
#[command(
    name = "wikify",
    about = "Render remote wiki documents by resolving their dependency closure",
    version,
    author
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and render one document to stdout.
    Render(render::RenderCommand),

    /// Serve render requests over a Unix domain socket.
    #[cfg(unix)]
    Serve(serve::ServeCommand),
}

impl Cli {
    /// Initialize logging and dispatch to the selected command.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();
        match self.command {
            Commands::Render(cmd) => cmd.execute().await,
            #[cfg(unix)]
            Commands::Serve(cmd) => cmd.execute().await,
        }
    }

    fn init_logging(&self) {
        let default_level = if self.quiet {
            "error"
        } else if self.verbose {
            "debug"
        } else {
            "info"
        };
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));
        // Logs go to stderr so rendered output on stdout stays clean.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_parses_positional_arguments() {
        let cli = Cli::try_parse_from([
            "wikify",
            "render",
            "HelloThere",
            "http://wiki.example/tiddlers",
            "session=abc",
        ])
        .unwrap();
        let Commands::Render(cmd) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(cmd.title, "HelloThere");
        assert_eq!(cmd.endpoint, "http://wiki.example/tiddlers");
        assert_eq!(cmd.auth_token, "session=abc");
    }

    #[test]
    fn auth_token_defaults_to_empty() {
        let cli =
            Cli::try_parse_from(["wikify", "render", "Title", "http://wiki.example"]).unwrap();
        let Commands::Render(cmd) = cli.command else {
            panic!("expected render command");
        };
        assert_eq!(cmd.auth_token, "");
    }

    #[test]
    fn render_requires_an_endpoint() {
        assert!(Cli::try_parse_from(["wikify", "render", "Title"]).is_err());
    }

    #[test]
    fn verbose_and_quiet_conflict() {
        assert!(
            Cli::try_parse_from(["wikify", "-v", "-q", "render", "T", "http://e"]).is_err()
        );
    }

    #[cfg(unix)]
    #[test]
    fn serve_defaults() {
        let cli = Cli::try_parse_from(["wikify", "serve"]).unwrap();
        let Commands::Serve(cmd) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(cmd.socket, std::path::PathBuf::from("/tmp/wikify.sock"));
        assert_eq!(cmd.max_connections, 20);
    }
}
