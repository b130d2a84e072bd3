//! # Example: lifecycle
//!
//! Runs a handler in the background, waits for it to be running, stops it and
//! waits for it to be stopped.
//!
//! ## Flow
//! ```text
//! Servd::run() (spawned)
//!     ├─► Created → Running            wait_for_status(Running) returns
//!     ├─► handler awaits ctx.cancelled()
//! Servd::stop()
//!     ├─► token cancelled
//!     └─► handler returns → Stopped    wait_for_status(Stopped) returns
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example lifecycle
//! ```

use std::sync::Arc;
use std::time::Duration;

use servd::{BoxError, HandleFn, Servd, Status, WaitContext};
use tokio_util::sync::CancellationToken;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Construct the service
    let d = Arc::new(Servd::new(HandleFn::arc(|ctx: CancellationToken| async move {
        // wait until shutdown initiated
        ctx.cancelled().await;
        Ok::<_, BoxError>(())
    })));

    // 2. Run it in the background
    let runner = tokio::spawn({
        let d = Arc::clone(&d);
        async move { d.run().await }
    });

    // 3. Wait for Running, at most one second
    let status = d
        .wait_for_status(&WaitContext::with_timeout(Duration::from_secs(1)), Status::Running)
        .await?;
    println!("Status: {status}");

    // 4. Stop and wait for Stopped
    if !d.stop() {
        println!("already stopped");
    }
    let status = d
        .wait_for_status(&WaitContext::with_timeout(Duration::from_secs(1)), Status::Stopped)
        .await?;
    println!("Status: {status}");

    runner.await??;
    Ok(())
}
