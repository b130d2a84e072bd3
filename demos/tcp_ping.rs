//! # Example: tcp_ping
//!
//! A small TCP server wrapped in a service. Every connection receives
//! `Hi there!`. The server stops on SIGINT/SIGTERM (Ctrl-C) and lifecycle
//! events are logged by the built-in [`LogWriter`].
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example tcp_ping --features logging
//! # in another terminal
//! nc 127.0.0.1 8080
//! ```

use std::sync::Arc;

use servd::{BoxError, Config, HandleFn, LogWriter, Servd, Subscribe};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let handler = HandleFn::arc(serve);

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let d = Servd::builder(Config::named("tcp-ping"))
        .with_handler(handler)
        .with_subscribers(subs)
        .build();

    d.run_until_signal().await?;
    Ok(())
}

async fn serve(ctx: CancellationToken) -> Result<(), BoxError> {
    let listener = TcpListener::bind("127.0.0.1:8080").await?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    loop {
        tokio::select! {
            // stop accepting once shutdown is requested
            _ = ctx.cancelled() => return Ok(()),
            accepted = listener.accept() => {
                let (mut conn, peer) = accepted?;
                tokio::spawn(async move {
                    if let Err(e) = conn.write_all(b"Hi there!\n").await {
                        tracing::warn!(%peer, error = %e, "write failed");
                    }
                });
            }
        }
    }
}
