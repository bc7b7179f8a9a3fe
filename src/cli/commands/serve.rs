//! psearch serve - Run the search worker over stdio
//!
//! Reads one JSON request per line from stdin and writes one JSON response
//! per line to stdout, in request order. Logs go to stderr.

use clap::Args;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

use crate::app::AppContext;
use crate::error::Result;
use crate::worker::{Envelope, SearchWorker, WorkerResponse, decode_request};

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Do not load the native hasher; always use pure n-gram hashing
    #[arg(long)]
    pub no_native: bool,
}

pub async fn run(ctx: &AppContext, args: &ServeArgs) -> Result<()> {
    let mut config = ctx.config.clone();
    if args.no_native {
        config.native.enabled = false;
    }

    let mut worker = SearchWorker::from_config(&config).spawn();
    info!(native = config.native.enabled, "search worker serving on stdio");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        debug!(request = line, "<-");

        let response = match decode_request(line) {
            Ok(request) => worker.call(request).await?,
            Err(reply) => {
                warn!(request = line, "rejected malformed request");
                reply
            }
        };

        let encoded = encode_response(&response);
        debug!(response = %encoded, "->");
        stdout.write_all(encoded.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed; shutting down");
    worker.shutdown().await;
    Ok(())
}

fn encode_response(response: &Envelope<WorkerResponse>) -> String {
    serde_json::to_string(response).unwrap_or_else(|err| {
        let fallback = response.reply(WorkerResponse::Error {
            error: format!("failed to serialize response: {err}"),
        });
        serde_json::to_string(&fallback)
            .unwrap_or_else(|_| r#"{"type":"error","error":"serialization failed"}"#.to_string())
    })
}
