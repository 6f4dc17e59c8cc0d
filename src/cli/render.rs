//! The `render` command: resolve and render one document to stdout.
//!
//! Mirrors the one-shot invocation shape the service has always had:
//! positional `title`, `endpoint`, and optional `auth_token`. The rendered
//! output goes to stdout; logging and errors go to stderr so the output
//! stays pipeable.

use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::remote::RemoteClient;
use crate::resolver::render_document;
use crate::store::{MarkupEngine, WikiTextEngine};

/// Render a remote document and print the result.
#[derive(Args, Debug)]
pub struct RenderCommand {
    /// Title of the document to render.
    pub title: String,

    /// Content service endpoint, e.g. `http://wiki.example/bags/common/tiddlers`.
    pub endpoint: String,

    /// Auth token sent as the session cookie; omit for anonymous access.
    #[arg(default_value = "")]
    pub auth_token: String,
}

impl RenderCommand {
    /// Run one resolution session and print its output.
    pub async fn execute(self) -> Result<()> {
        tracing::info!("attempting render of '{}' in {}", self.title, self.endpoint);

        let client = RemoteClient::new(&self.endpoint, &self.auth_token)?;
        let engine: Arc<dyn MarkupEngine> = Arc::new(WikiTextEngine::new());
        let report = render_document(&client, engine, &self.title).await?;

        if let Some(reason) = &report.bulk_failure {
            tracing::warn!("rendered without the full corpus listing: {reason}");
        }
        if !report.failed.is_empty() {
            tracing::warn!(
                "rendered with {} missing dependencies: {:?}",
                report.failed.len(),
                report.failed
            );
        }
        tracing::debug!(
            "resolved {} documents, skipped {} external titles",
            report.resolved,
            report.external.len()
        );

        println!("{}", report.output);
        Ok(())
    }
}
