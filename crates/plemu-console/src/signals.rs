//! Console signal flags.
//!
//! SIGINT cancels a running workload (or leaves the menu when idle), SIGTERM
//! requests shutdown, and SIGHUP asks for the configuration file to be
//! reloaded before the next command. The console polls the flags between
//! operations and while waiting on stdin.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default)]
struct Pending {
    shutdown: AtomicBool,
    reload: AtomicBool,
    interrupt: AtomicBool,
}

/// Cloneable handle to the console's pending signal requests.
#[derive(Debug, Clone, Default)]
pub struct SignalHandler {
    pending: Arc<Pending>,
}

impl SignalHandler {
    /// Create a handle fed by SIGINT, SIGTERM and SIGHUP.
    ///
    /// Off Unix the handle only sees requests made through its methods.
    pub fn new() -> std::io::Result<Self> {
        let handler = Self::detached();

        #[cfg(unix)]
        os::install(handler.clone())?;

        Ok(handler)
    }

    /// Create a handle with no OS signals attached.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn shutdown_requested(&self) -> bool {
        self.pending.shutdown.load(Ordering::Relaxed)
    }

    /// Consume a pending reload request.
    #[inline]
    pub fn take_reload_request(&self) -> bool {
        self.pending.reload.swap(false, Ordering::Relaxed)
    }

    /// Consume a pending interrupt.
    #[inline]
    pub fn take_interrupt(&self) -> bool {
        self.pending.interrupt.swap(false, Ordering::Relaxed)
    }

    /// Ask the console to exit.
    pub fn request_shutdown(&self) {
        info!("Shutdown requested");
        self.pending.shutdown.store(true, Ordering::Relaxed);
    }

    /// Ask for the configuration file to be reloaded.
    pub fn request_reload(&self) {
        self.pending.reload.store(true, Ordering::Relaxed);
    }

    /// Interrupt the running workload or the idle prompt.
    pub fn request_interrupt(&self) {
        self.pending.interrupt.store(true, Ordering::Relaxed);
    }
}

#[cfg(unix)]
#[allow(unsafe_code)]
mod os {
    use super::SignalHandler;
    use std::os::raw::c_int;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tracing::{debug, info};

    const SIGNALS: [(c_int, &str); 3] = [
        (libc::SIGINT, "SIGINT"),
        (libc::SIGTERM, "SIGTERM"),
        (libc::SIGHUP, "SIGHUP"),
    ];

    /// Raised flags, indexed like `SIGNALS`.
    static RAISED: [AtomicBool; 3] = [
        AtomicBool::new(false),
        AtomicBool::new(false),
        AtomicBool::new(false),
    ];

    const FORWARD_INTERVAL: Duration = Duration::from_millis(10);

    extern "C" fn on_signal(signo: c_int) {
        if let Some(i) = SIGNALS.iter().position(|(s, _)| *s == signo) {
            RAISED[i].store(true, Ordering::Relaxed);
        }
    }

    /// Start the forwarding thread, then point the signals at `on_signal`.
    pub(super) fn install(handler: SignalHandler) -> std::io::Result<()> {
        std::thread::Builder::new()
            .name("plemu-signals".into())
            .spawn(move || forward(&handler))?;

        for (signo, _) in SIGNALS {
            // SAFETY: `on_signal` only stores to static atomics.
            unsafe {
                libc::signal(signo, on_signal as libc::sighandler_t);
            }
        }

        debug!("Signal handlers installed");
        Ok(())
    }

    /// Move raised flags into `handler` until shutdown.
    fn forward(handler: &SignalHandler) {
        while !handler.shutdown_requested() {
            for ((signo, name), raised) in SIGNALS.iter().zip(&RAISED) {
                if !raised.swap(false, Ordering::Relaxed) {
                    continue;
                }
                info!(signal = *name, "Signal received");
                match *signo {
                    libc::SIGINT => handler.request_interrupt(),
                    libc::SIGHUP => handler.request_reload(),
                    _ => handler.request_shutdown(),
                }
            }
            std::thread::sleep(FORWARD_INTERVAL);
        }
    }
}
