//! Maps OS signals onto the shutdown token.
//!
//! SIGINT and SIGTERM cancel the token with the signal number as exit
//! status. SIGUSR1 and SIGUSR2 are logged and otherwise ignored. The
//! listener runs on its own thread with a current-thread tokio runtime so it
//! works whether or not the embedding program has a runtime of its own.

use crate::shutdown::ShutdownToken;
use std::io;
use std::thread::JoinHandle;

/// Human-readable signal name for log lines.
pub fn signal_name(sig: i32) -> &'static str {
    #[cfg(unix)]
    {
        match sig {
            libc::SIGINT => "SIGINT",
            libc::SIGTERM => "SIGTERM",
            libc::SIGSEGV => "SIGSEGV",
            libc::SIGUSR1 => "SIGUSR1",
            libc::SIGUSR2 => "SIGUSR2",
            _ => "UNKNOWN",
        }
    }
    #[cfg(not(unix))]
    {
        match sig {
            2 => "SIGINT",
            15 => "SIGTERM",
            _ => "UNKNOWN",
        }
    }
}

/// Spawn the signal listener thread.
///
/// The thread exits after the first termination signal, or when `token` is
/// cancelled by someone else.
pub fn install(token: ShutdownToken) -> io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    std::thread::Builder::new()
        .name("vdp-signals".into())
        .spawn(move || runtime.block_on(listen(token)))
}

#[cfg(unix)]
async fn listen(token: ShutdownToken) {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::{error, info};

    let streams = (|| {
        Ok::<_, io::Error>((
            signal(SignalKind::interrupt())?,
            signal(SignalKind::terminate())?,
            signal(SignalKind::user_defined1())?,
            signal(SignalKind::user_defined2())?,
        ))
    })();
    let (mut int, mut term, mut usr1, mut usr2) = match streams {
        Ok(streams) => streams,
        Err(e) => {
            error!("failed to install signal handlers: {e}");
            return;
        }
    };

    let mut poll = tokio::time::interval(std::time::Duration::from_millis(50));
    loop {
        let sig = tokio::select! {
            _ = int.recv() => libc::SIGINT,
            _ = term.recv() => libc::SIGTERM,
            _ = usr1.recv() => libc::SIGUSR1,
            _ = usr2.recv() => libc::SIGUSR2,
            _ = poll.tick() => {
                if token.is_cancelled() {
                    info!("signal listener stopping");
                    return;
                }
                continue;
            }
        };

        error!("signal {} - {sig} caught", signal_name(sig));
        if sig != libc::SIGUSR1 && sig != libc::SIGUSR2 {
            token.cancel(sig);
            return;
        }
    }
}

#[cfg(not(unix))]
async fn listen(token: ShutdownToken) {
    use tracing::error;

    let mut poll = tokio::time::interval(std::time::Duration::from_millis(50));
    loop {
        tokio::select! {
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    error!("signal {} - 2 caught", signal_name(2));
                    token.cancel(2);
                }
                return;
            }
            _ = poll.tick() => {
                if token.is_cancelled() {
                    return;
                }
            }
        }
    }
}
