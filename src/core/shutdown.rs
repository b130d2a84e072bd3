//! # Cross-platform OS signal handling.
//!
//! [`wait_for_shutdown_signal`] completes with the name of the first
//! termination signal the process receives. [`Servd::run_until_signal`](crate::Servd::run_until_signal)
//! turns that into a `stop()` and a `ShutdownSignal` event carrying the name.
//!
//! | Platform | Signals                         |
//! |----------|---------------------------------|
//! | unix     | `SIGINT`, `SIGTERM`, `SIGQUIT`  |
//! | other    | Ctrl-C                          |

/// Waits for a termination signal and returns its name.
///
/// Listeners are installed on every call. Fails only if installation fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    let name = tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        _ = sigquit.recv() => "SIGQUIT",
    };
    Ok(name)
}

/// Waits for Ctrl-C and returns its name.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("ctrl-c")
}
